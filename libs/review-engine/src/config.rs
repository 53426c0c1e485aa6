//! Engine configuration from the environment.

use std::path::PathBuf;
use std::str::FromStr;

use srs_core::ReviewSettings;

use crate::error::ConfigError;

pub const DATABASE_PATH: &str = "SUNLO_DATABASE_PATH";
pub const NEW_CARDS_PER_DAY: &str = "SUNLO_NEW_CARDS_PER_DAY";
pub const DESIRED_RETENTION: &str = "SUNLO_DESIRED_RETENTION";
pub const DUE_THRESHOLD: &str = "SUNLO_DUE_THRESHOLD";
pub const DAY_RESET_HOUR: &str = "SUNLO_DAY_RESET_HOUR";

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub database_path: PathBuf,
    pub settings: ReviewSettings,
}

impl EngineConfig {
    /// Read configuration from the process environment, loading `.env` first.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`; unset variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_path = match lookup(DATABASE_PATH) {
            Some(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => default_database_path()?,
        };

        let defaults = ReviewSettings::default();
        let settings = ReviewSettings {
            new_cards_per_day: parse_or(&lookup, NEW_CARDS_PER_DAY, defaults.new_cards_per_day)?,
            desired_retention: parse_or(&lookup, DESIRED_RETENTION, defaults.desired_retention)?,
            due_threshold: parse_or(&lookup, DUE_THRESHOLD, defaults.due_threshold)?,
            day_reset_hour: parse_or(&lookup, DAY_RESET_HOUR, defaults.day_reset_hour)?,
            ..defaults
        };
        settings.validate()?;

        Ok(Self {
            database_path,
            settings,
        })
    }
}

fn default_database_path() -> Result<PathBuf, ConfigError> {
    dirs::data_local_dir()
        .map(|dir| dir.join("sunlo").join("reviews.db"))
        .ok_or(ConfigError::NoDataDir)
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                name,
                value: raw.clone(),
                reason: e.to_string(),
            }),
    }
}
