//! Error taxonomy for odds evaluation.

use crate::quote::Outcome;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur when evaluating a match.
///
/// An unprofitable market is not an error, and neither is a match without a
/// promotional draw price in freebet extraction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid odd {odd} for {outcome}: odds must be greater than 1")]
    InvalidOdds { outcome: Outcome, odd: Decimal },

    #[error("insufficient data: no valid quote for {outcome}")]
    InsufficientData { outcome: Outcome },

    #[error("invalid freebet value {0}: must be greater than 0")]
    InvalidFreebetValue(Decimal),

    #[error("invalid total stake {0}: must be greater than 0")]
    InvalidStake(Decimal),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl EngineError {
    /// Whether this error concerns a single match's data rather than the request.
    ///
    /// Batch scans skip matches failing with a data error and abort on anything else.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidOdds { .. } | EngineError::InsufficientData { .. }
        )
    }
}

/// Fail with [`EngineError::InvalidOdds`] unless `odd > 1`.
pub(crate) fn ensure_valid_odd(outcome: Outcome, odd: Decimal) -> Result<Decimal, EngineError> {
    if odd > Decimal::ONE {
        Ok(odd)
    } else {
        Err(EngineError::InvalidOdds { outcome, odd })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ensure_valid_odd() {
        assert_eq!(ensure_valid_odd(Outcome::Home, dec!(1.01)), Ok(dec!(1.01)));
        assert_eq!(
            ensure_valid_odd(Outcome::Draw, dec!(1)),
            Err(EngineError::InvalidOdds {
                outcome: Outcome::Draw,
                odd: dec!(1)
            })
        );
    }

    #[test]
    fn test_data_error_classification() {
        assert!(EngineError::InsufficientData { outcome: Outcome::Away }.is_data_error());
        assert!(!EngineError::InvalidStake(dec!(-5)).is_data_error());
        assert!(!EngineError::InvalidFreebetValue(dec!(0)).is_data_error());
    }

    #[test]
    fn test_error_display() {
        let err = EngineError::InvalidOdds {
            outcome: Outcome::Home,
            odd: dec!(0.95),
        };
        assert_eq!(
            err.to_string(),
            "invalid odd 0.95 for home: odds must be greater than 1"
        );
    }
}
