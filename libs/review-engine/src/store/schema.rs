//! SQLite schema definitions.

/// Current schema version for migrations.
pub const SCHEMA_VERSION: i32 = 1;

/// Complete schema for the review database.
pub const SCHEMA: &str = r#"
-- Phrase catalog (read-only for the engine)
CREATE TABLE IF NOT EXISTS phrases (
    id BLOB PRIMARY KEY,
    lang TEXT NOT NULL,
    text TEXT NOT NULL,
    translations TEXT NOT NULL DEFAULT '[]',
    count_cards INTEGER NOT NULL DEFAULT 0,
    avg_difficulty REAL,
    created_at TEXT NOT NULL
);

-- Learner decks
CREATE TABLE IF NOT EXISTS decks (
    uid BLOB NOT NULL,
    lang TEXT NOT NULL,
    daily_review_goal INTEGER,
    desired_retention REAL,
    PRIMARY KEY (uid, lang)
);

-- Languages each learner reads
CREATE TABLE IF NOT EXISTS languages_spoken (
    uid BLOB PRIMARY KEY,
    languages TEXT NOT NULL DEFAULT '[]'
);

-- Cards, one per learner and phrase
CREATE TABLE IF NOT EXISTS cards (
    id BLOB PRIMARY KEY,
    uid BLOB NOT NULL,
    lang TEXT NOT NULL,
    phrase_id BLOB NOT NULL,
    status TEXT NOT NULL DEFAULT 'active',
    difficulty REAL,
    stability REAL,
    last_reviewed_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (uid, phrase_id),
    CHECK ((difficulty IS NULL) = (stability IS NULL))
);

-- Review rows
CREATE TABLE IF NOT EXISTS reviews (
    id BLOB PRIMARY KEY,
    uid BLOB NOT NULL,
    lang TEXT NOT NULL,
    phrase_id BLOB NOT NULL,
    day_session TEXT NOT NULL,
    score INTEGER NOT NULL CHECK (score BETWEEN 1 AND 4),
    difficulty REAL NOT NULL,
    stability REAL NOT NULL,
    review_time_retrievability REAL,
    day_first_review INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT
);

-- Daily manifests, frozen once written
CREATE TABLE IF NOT EXISTS daily_manifests (
    uid BLOB NOT NULL,
    lang TEXT NOT NULL,
    day_session TEXT NOT NULL,
    manifest TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (uid, lang, day_session)
);

-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_phrases_lang ON phrases(lang);
CREATE INDEX IF NOT EXISTS idx_cards_deck ON cards(uid, lang);
CREATE INDEX IF NOT EXISTS idx_reviews_day ON reviews(uid, lang, day_session);
CREATE INDEX IF NOT EXISTS idx_reviews_phrase ON reviews(uid, phrase_id, day_session);
CREATE UNIQUE INDEX IF NOT EXISTS idx_reviews_first_of_day
    ON reviews(uid, phrase_id, day_session) WHERE day_first_review = 1;
"#;
