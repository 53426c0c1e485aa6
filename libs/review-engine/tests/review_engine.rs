//! Scoring reviews through the study service.

mod common;

use pretty_assertions::assert_eq;
use review_engine::store::CardRepository;
use review_engine::{EngineError, Inspect, SubmitAction};
use srs_core::{CoreError, ReviewStage, Score};
use uuid::Uuid;

use common::fixtures::{id, ids};
use common::{TestContext, LANG};

fn day(ctx: &TestContext) -> String {
    ctx.service.today(ctx.uid, LANG).unwrap().day_session.to_string()
}

#[test]
fn correcting_a_score_updates_the_same_row() {
    let ctx = TestContext::new(2).with_catalog(2);
    ctx.service.build_today(ctx.uid, LANG).unwrap();
    let day = day(&ctx);

    let first = ctx.service.review(ctx.uid, LANG, &day, id(2), Some(2)).unwrap();
    let second = ctx.service.review(ctx.uid, LANG, &day, id(2), Some(4)).unwrap();

    assert_eq!(first.action, SubmitAction::Inserted);
    assert_eq!(second.action, SubmitAction::Corrected);
    let snapshot = ctx.store.snapshot().unwrap();
    let rows = snapshot.reviews_for(id(2), first.review.day_session);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, first.review.id);
    assert_eq!(rows[0].created_at, first.review.created_at);
    assert_eq!(rows[0].score, Score::Easy);
    assert!(rows[0].day_first_review);
}

#[test]
fn same_score_twice_is_a_no_op() {
    let ctx = TestContext::new(1).with_catalog(1);
    ctx.service.build_today(ctx.uid, LANG).unwrap();
    let day = day(&ctx);

    ctx.service.review(ctx.uid, LANG, &day, id(1), Some(3)).unwrap();
    let before = ctx.store.snapshot().unwrap();
    let repeat = ctx.service.review(ctx.uid, LANG, &day, id(1), Some(3)).unwrap();

    assert_eq!(repeat.action, SubmitAction::Unchanged);
    assert_eq!(ctx.store.snapshot().unwrap(), before);
}

#[test]
fn day_progresses_through_checkpoint_to_complete() {
    let ctx = TestContext::new(3).with_catalog(3);
    let outcome = ctx.service.build_today(ctx.uid, LANG).unwrap();
    assert_eq!(outcome.manifest.manifest, ids(&[3, 2, 1]));
    let day = day(&ctx);

    ctx.service.review(ctx.uid, LANG, &day, id(3), Some(1)).unwrap();
    let skipped = ctx.service.review(ctx.uid, LANG, &day, id(1), Some(3)).unwrap();
    assert_eq!(skipped.stats.stage, ReviewStage::SkippedPass);
    assert_eq!(skipped.stats.index, 1);

    let checkpoint = ctx.service.review(ctx.uid, LANG, &day, id(2), Some(3)).unwrap();
    assert_eq!(checkpoint.stats.stage, ReviewStage::Checkpoint);
    assert_eq!(checkpoint.stats.again, 1);
    assert_eq!(checkpoint.stats.index, 0);

    let again = ctx.service.begin_again_pass(ctx.uid, LANG, &day).unwrap();
    assert_eq!(again.stage, ReviewStage::AgainPass);
    assert_eq!(again.index, 0);

    let retry = ctx.service.review(ctx.uid, LANG, &day, id(3), Some(3)).unwrap();
    assert_eq!(retry.action, SubmitAction::ReReviewed);
    assert_eq!(retry.stats.stage, ReviewStage::Complete);
    assert_eq!(retry.stats.index, 3);

    let stats = ctx.service.stats(ctx.uid, LANG, &day).unwrap();
    assert_eq!(stats, retry.stats);
    let snapshot = ctx.store.snapshot().unwrap();
    let rows = snapshot.reviews_for(id(3), retry.review.day_session);
    assert_eq!(rows.len(), 2);
    assert_eq!((rows[0].day_first_review, rows[1].day_first_review), (true, false));
}

#[test]
fn again_pass_keeps_retrying_cards() {
    let ctx = TestContext::new(2).with_catalog(2);
    ctx.service.build_today(ctx.uid, LANG).unwrap();
    let day = day(&ctx);

    ctx.service.review(ctx.uid, LANG, &day, id(2), Some(1)).unwrap();
    ctx.service.review(ctx.uid, LANG, &day, id(1), Some(1)).unwrap();
    ctx.service.begin_again_pass(ctx.uid, LANG, &day).unwrap();
    let retry = ctx.service.review(ctx.uid, LANG, &day, id(2), Some(3)).unwrap();

    assert_eq!(retry.stats.stage, ReviewStage::AgainPass);
    assert_eq!(retry.stats.re_reviewed, 1);
    assert_eq!(retry.stats.index, 1);
}

#[test]
fn last_card_of_the_day_can_be_corrected() {
    let ctx = TestContext::new(2).with_catalog(2);
    ctx.service.build_today(ctx.uid, LANG).unwrap();
    let day = day(&ctx);

    ctx.service.review(ctx.uid, LANG, &day, id(2), Some(3)).unwrap();
    let last = ctx.service.review(ctx.uid, LANG, &day, id(1), Some(1)).unwrap();
    assert_eq!(last.stats.stage, ReviewStage::Checkpoint);

    let fixed = ctx.service.review(ctx.uid, LANG, &day, id(1), Some(3)).unwrap();

    assert_eq!(fixed.action, SubmitAction::Corrected);
    assert_eq!(fixed.review.id, last.review.id);
    assert_eq!(fixed.stats.stage, ReviewStage::Complete);
    assert_eq!(fixed.stats.again, 0);
    let snapshot = ctx.store.snapshot().unwrap();
    assert_eq!(snapshot.reviews.len(), 2);
    assert_eq!(snapshot.reviews_for(id(1), last.review.day_session)[0].score, Score::Good);
}

#[test]
fn corrected_score_matches_scoring_it_directly() {
    let corrected = TestContext::new(1).with_catalog(1);
    let direct = TestContext::new(1).with_catalog(1);
    for ctx in [&corrected, &direct] {
        ctx.service.build_today(ctx.uid, LANG).unwrap();
        ctx.service.review(ctx.uid, LANG, &day(ctx), id(1), Some(3)).unwrap();
        ctx.advance_days(7);
        ctx.service.build_today(ctx.uid, LANG).unwrap();
    }

    corrected
        .service
        .review(corrected.uid, LANG, &day(&corrected), id(1), Some(1))
        .unwrap();
    let fixed = corrected
        .service
        .review(corrected.uid, LANG, &day(&corrected), id(1), Some(4))
        .unwrap();
    let expected = direct
        .service
        .review(direct.uid, LANG, &day(&direct), id(1), Some(4))
        .unwrap();

    assert_eq!(fixed.action, SubmitAction::Corrected);
    assert_eq!(fixed.forecast, expected.forecast);
    let card = corrected.store.get_card(corrected.uid, id(1)).unwrap().unwrap();
    let reference = direct.store.get_card(direct.uid, id(1)).unwrap().unwrap();
    assert_eq!(card.stability(), reference.stability());
    assert_eq!(card.difficulty(), reference.difficulty());
}

#[test]
fn again_pass_waits_for_the_checkpoint() {
    let ctx = TestContext::new(2).with_catalog(2);
    ctx.service.build_today(ctx.uid, LANG).unwrap();
    let day = day(&ctx);
    ctx.service.review(ctx.uid, LANG, &day, id(2), Some(1)).unwrap();

    let err = ctx.service.begin_again_pass(ctx.uid, LANG, &day).unwrap_err();

    assert!(matches!(
        err,
        EngineError::NotAtCheckpoint { stage: ReviewStage::FirstPass, .. }
    ));
    assert!(err.is_invalid_input());
}

#[test]
fn review_on_a_later_day_uses_elapsed_time() {
    let ctx = TestContext::new(1).with_catalog(1);
    ctx.service.build_today(ctx.uid, LANG).unwrap();
    let first = ctx
        .service
        .review(ctx.uid, LANG, &day(&ctx), id(1), Some(3))
        .unwrap();
    let first_forecast = first.forecast.unwrap();
    assert_eq!(first_forecast.retrievability, None);
    assert!((first_forecast.stability - 3.173).abs() < 1e-9);

    ctx.advance_days(10);
    let later = ctx.service.build_today(ctx.uid, LANG).unwrap();
    assert_eq!(later.manifest.manifest, ids(&[1]));
    assert_eq!(later.breakdown.unwrap().due, 1);

    let second = ctx
        .service
        .review(ctx.uid, LANG, &day(&ctx), id(1), Some(3))
        .unwrap();
    assert_eq!(second.action, SubmitAction::Inserted);
    let forecast = second.forecast.unwrap();
    let retrievability = forecast.retrievability.unwrap();
    assert!(retrievability > 0.7 && retrievability < 0.8, "{retrievability}");
    assert!(forecast.stability > first_forecast.stability);

    let card = ctx.store.get_card(ctx.uid, id(1)).unwrap().unwrap();
    assert_eq!(card.stability(), Some(forecast.stability));
    assert_eq!(card.last_reviewed_at, Some(ctx.now()));
}

#[test]
fn malformed_input_is_rejected() {
    let ctx = TestContext::new(1).with_catalog(1);
    ctx.service.build_today(ctx.uid, LANG).unwrap();
    let day = day(&ctx);

    let missing = ctx.service.review(ctx.uid, LANG, &day, id(1), None).unwrap_err();
    assert!(matches!(missing, EngineError::Core(CoreError::MissingScore)));

    let out_of_range = ctx.service.review(ctx.uid, LANG, &day, id(1), Some(7)).unwrap_err();
    assert!(matches!(out_of_range, EngineError::Core(CoreError::InvalidScore(7))));

    let bad_day = ctx
        .service
        .review(ctx.uid, LANG, "2025-13-01", id(1), Some(3))
        .unwrap_err();
    assert!(matches!(bad_day, EngineError::Core(CoreError::InvalidDaySession(_))));

    let bad_lang = ctx.service.review(ctx.uid, "Hindi", &day, id(1), Some(3)).unwrap_err();
    assert!(matches!(bad_lang, EngineError::Core(CoreError::InvalidLanguage(_))));

    for err in [missing, out_of_range, bad_day, bad_lang] {
        assert!(err.is_invalid_input());
    }
    assert!(ctx.store.snapshot().unwrap().reviews.is_empty());
}

#[test]
fn reviews_need_a_manifest() {
    let ctx = TestContext::new(1).with_catalog(2);
    let err = ctx
        .service
        .review(ctx.uid, LANG, "2025-03-01", id(1), Some(3))
        .unwrap_err();
    assert!(matches!(err, EngineError::NoSession(_)));

    ctx.service.build_today(ctx.uid, LANG).unwrap();
    let err = ctx
        .service
        .review(ctx.uid, LANG, "2025-03-01", id(1), Some(3))
        .unwrap_err();
    assert!(matches!(err, EngineError::PhraseNotInManifest(p) if p == id(1)));

    let err = ctx
        .service
        .review(Uuid::new_v4(), LANG, "2025-03-01", id(2), Some(3))
        .unwrap_err();
    assert!(matches!(err, EngineError::NoSession(_)));
}
