//! FSRS (Free Spaced Repetition Scheduler) algorithm.
//!
//! Forecasts memory with the DSR model:
//! - Difficulty (D): Card difficulty 1-10
//! - Stability (S): Days until retrievability decays to 90%
//! - Retrievability (R): Probability of recall
//!
//! Uses the pre-trained FSRS v5 weights. Every function is pure, so the
//! same inputs always produce bit-identical outputs.

use super::{Forecast, ForecastInput, ForecastModel, PreviousReview};
use crate::error::Result;
use crate::types::{validate_retention, Score};
use chrono::{DateTime, Duration, Utc};

/// Forgetting curve factor, chosen so that R(S) = 0.9.
pub const DECAY_FACTOR: f64 = 19.0 / 81.0;
/// Forgetting curve exponent.
pub const DECAY: f64 = -0.5;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// FSRS model with its weights.
#[derive(Debug, Clone)]
pub struct Fsrs {
    /// FSRS v5 parameters (17 weights).
    pub w: [f64; 17],
}

impl Default for Fsrs {
    fn default() -> Self {
        Self {
            w: [
                0.40255, 1.18385, 3.173, 15.69105, // w[0-3]: initial stability for Again, Hard, Good, Easy
                7.1949,  // w[4]: initial difficulty base
                0.5345,  // w[5]: initial difficulty modifier
                1.4604,  // w[6]: difficulty delta
                0.0046,  // w[7]: mean reversion weight
                1.54575, // w[8]: stability exp base
                0.1192,  // w[9]: stability decay
                1.01925, // w[10]: retrievability effect
                1.9395,  // w[11]: forget stability base
                0.11,    // w[12]: difficulty on forget
                0.29605, // w[13]: stability on forget
                2.2698,  // w[14]: retrievability on forget
                0.2315,  // w[15]: hard penalty
                2.9898,  // w[16]: easy bonus
            ],
        }
    }
}

impl ForecastModel for Fsrs {
    fn name(&self) -> &'static str {
        "fsrs"
    }

    fn forecast(&self, input: &ForecastInput) -> Result<Forecast> {
        validate_retention(input.desired_retention)?;

        let score = f64::from(input.score.to_value());
        let previous = input
            .previous
            .and_then(|p| p.memory.map(|memory| (memory, p.reviewed_at)));

        let (difficulty, stability, retrievability) = match previous {
            None => (
                self.initial_difficulty(score),
                self.initial_stability(input.score),
                None,
            ),
            Some((memory, reviewed_at)) => {
                let elapsed = elapsed_days(reviewed_at, input.now);
                let r = self.retrievability(elapsed, memory.stability);
                let d = self.next_difficulty(memory.difficulty, score);
                let s = if input.score.is_again() {
                    self.next_stability_forget(memory.difficulty, memory.stability, r)
                } else {
                    self.next_stability_recall(memory.difficulty, memory.stability, r, input.score)
                };
                (d, s, Some(r))
            }
        };

        let interval_days = self.next_interval(stability, input.desired_retention);
        let scheduled_for = input.now + Duration::days(interval_days.round() as i64);

        Ok(Forecast {
            difficulty,
            stability,
            retrievability,
            interval_days,
            scheduled_for,
        })
    }

    /// Calculate retrievability (probability of recall).
    /// R = (1 + F * t / S)^C
    fn retrievability(&self, elapsed_days: f64, stability: f64) -> f64 {
        if stability <= 0.0 {
            return 0.0;
        }
        (1.0 + DECAY_FACTOR * elapsed_days.max(0.0) / stability).powf(DECAY)
    }
}

impl Fsrs {
    /// Interval for every score, Again to Easy, for labelling answer buttons.
    pub fn intervals(
        &self,
        previous: Option<PreviousReview>,
        now: DateTime<Utc>,
        desired_retention: f64,
    ) -> Result<[f64; 4]> {
        let mut out = [0.0; 4];
        for (slot, score) in out.iter_mut().zip(Score::ALL) {
            let input = ForecastInput {
                score,
                previous,
                now,
                desired_retention,
            };
            *slot = self.forecast(&input)?.interval_days;
        }
        Ok(out)
    }

    /// Days until recall probability falls to `desired_retention`, at least one.
    /// I = (S / F) * (R^(1/C) - 1)
    pub fn next_interval(&self, stability: f64, desired_retention: f64) -> f64 {
        let interval = (stability / DECAY_FACTOR) * (desired_retention.powf(1.0 / DECAY) - 1.0);
        interval.max(1.0)
    }

    /// S0(G) = w[G-1]
    fn initial_stability(&self, score: Score) -> f64 {
        self.w[usize::from(score.to_value()) - 1]
    }

    /// D0(G) = w[4] - e^(w[5] * (G - 1)) + 1
    fn initial_difficulty(&self, score: f64) -> f64 {
        (self.w[4] - (self.w[5] * (score - 1.0)).exp() + 1.0).clamp(1.0, 10.0)
    }

    /// Linear damping pulls the delta toward zero near D = 10, then mean
    /// reversion blends toward D0(Easy).
    /// D' = D - w[6] * (G - 3) * (10 - D) / 9
    /// D'' = w[7] * D0(4) + (1 - w[7]) * D'
    fn next_difficulty(&self, difficulty: f64, score: f64) -> f64 {
        let delta = -self.w[6] * (score - 3.0);
        let damped = difficulty + delta * ((10.0 - difficulty) / 9.0);
        let reverted = self.w[7] * self.initial_difficulty(4.0) + (1.0 - self.w[7]) * damped;
        reverted.clamp(1.0, 10.0)
    }

    /// S' = S * (1 + (11 - D) * S^(-w[9]) * (e^(w[10]*(1-R)) - 1) * h * b * e^(w[8]))
    fn next_stability_recall(
        &self,
        difficulty: f64,
        stability: f64,
        retrievability: f64,
        score: Score,
    ) -> f64 {
        let d_factor = 11.0 - difficulty;
        let s_decay = stability.powf(-self.w[9]);
        let r_factor = (self.w[10] * (1.0 - retrievability)).exp() - 1.0;
        let hard_penalty = if score == Score::Hard { self.w[15] } else { 1.0 };
        let easy_bonus = if score == Score::Easy { self.w[16] } else { 1.0 };

        let growth = d_factor * s_decay * r_factor * hard_penalty * easy_bonus * self.w[8].exp();
        stability * (1.0 + growth)
    }

    /// S' = w[11] * D^(-w[12]) * ((S+1)^w[13] - 1) * e^(w[14]*(1-R))
    fn next_stability_forget(&self, difficulty: f64, stability: f64, retrievability: f64) -> f64 {
        let d_factor = difficulty.powf(-self.w[12]);
        let s_factor = (stability + 1.0).powf(self.w[13]) - 1.0;
        let r_factor = (self.w[14] * (1.0 - retrievability)).exp();

        // Never exceed previous stability on lapse
        (self.w[11] * d_factor * s_factor * r_factor).min(stability)
    }
}

/// Fractional days between two instants, never negative.
pub fn elapsed_days(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let millis = to.signed_duration_since(from).num_milliseconds() as f64;
    (millis / 1000.0 / SECONDS_PER_DAY).max(0.0)
}
