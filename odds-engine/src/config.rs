//! Configuration types for the odds engine.

use crate::error::EngineError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default number of opportunities a ranking pass returns.
pub const DEFAULT_MAX_RESULTS: usize = 30;

/// Configuration for odds aggregation and opportunity detection.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Bookmakers whose untagged quotes are promotional-only (SO)
    pub so_bookmakers: Vec<String>,
    /// Also treat a bookmaker as SO when its name contains a listed keyword
    pub legacy_substring_match: bool,
    /// How a winning free bet pays out
    pub freebet_payout: FreebetPayout,
    /// Total stake used for surebet allocation when the caller gives none
    pub default_total_stake: Decimal,
    /// Maximum number of ranked opportunities returned
    pub max_results: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            so_bookmakers: Vec::new(),
            legacy_substring_match: false,
            freebet_payout: FreebetPayout::default(),
            default_total_stake: Decimal::ONE_HUNDRED,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        serde_json::from_str(json).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Create from environment variables.
    ///
    /// Unset variables fall back to defaults:
    /// - `ODDS_SO_BOOKMAKERS` (comma separated, default: empty)
    /// - `ODDS_LEGACY_SUBSTRING_MATCH` (default: false)
    /// - `ODDS_FREEBET_STAKE_RETURNED` (default: false)
    /// - `ODDS_DEFAULT_TOTAL_STAKE` (default: 100)
    /// - `ODDS_MAX_RESULTS` (default: 30)
    pub fn from_env() -> Result<Self, EngineError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, EngineError> {
        let mut config = Self::default();

        if let Some(list) = lookup("ODDS_SO_BOOKMAKERS") {
            config.so_bookmakers = list
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(value) = lookup("ODDS_LEGACY_SUBSTRING_MATCH") {
            config.legacy_substring_match = parse_flag("ODDS_LEGACY_SUBSTRING_MATCH", &value)?;
        }

        if let Some(value) = lookup("ODDS_FREEBET_STAKE_RETURNED") {
            config.freebet_payout = if parse_flag("ODDS_FREEBET_STAKE_RETURNED", &value)? {
                FreebetPayout::StakeReturned
            } else {
                FreebetPayout::StakeNotReturned
            };
        }

        if let Some(value) = lookup("ODDS_DEFAULT_TOTAL_STAKE") {
            let stake = Decimal::from_str(value.trim()).map_err(|e| {
                EngineError::Config(format!("ODDS_DEFAULT_TOTAL_STAKE={value}: {e}"))
            })?;
            if stake <= Decimal::ZERO {
                return Err(EngineError::InvalidStake(stake));
            }
            config.default_total_stake = stake;
        }

        if let Some(value) = lookup("ODDS_MAX_RESULTS") {
            config.max_results = value
                .trim()
                .parse()
                .map_err(|e| EngineError::Config(format!("ODDS_MAX_RESULTS={value}: {e}")))?;
        }

        Ok(config)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, EngineError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(EngineError::Config(format!("{key}={other}: expected a boolean"))),
    }
}

/// Payout convention of a winning free bet.
///
/// Whether the promotional stake itself is returned on a win varies by
/// provider, so it is a policy choice rather than a constant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FreebetPayout {
    /// A win pays `value * (odd - 1)`. The usual non-refundable convention.
    #[default]
    StakeNotReturned,
    /// A win pays `value * odd`.
    StakeReturned,
}

impl FreebetPayout {
    /// Cash received when a free bet of `value` at `odd` wins, or `None` if
    /// it does not fit in a [`Decimal`].
    pub fn payout(&self, value: Decimal, odd: Decimal) -> Option<Decimal> {
        match self {
            FreebetPayout::StakeNotReturned => value.checked_mul(odd - Decimal::ONE),
            FreebetPayout::StakeReturned => value.checked_mul(odd),
        }
    }
}
