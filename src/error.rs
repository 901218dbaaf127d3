//! Error taxonomy
//!
//! Only intake, start guards and external boundaries can fail. Physics,
//! scoring and timer transitions are total.

use thiserror::Error;

/// Failures surfaced to the player
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    #[error("no advertisements registered yet; register an ad to start playing")]
    NoAdvertisements,
    #[error("bid ${bid:.2} is below the ${minimum:.2} minimum")]
    InvalidBid { bid: f64, minimum: f64 },
    #[error("brand name must not be empty")]
    EmptyBrandName,
    #[error("prize pool ${pool:.2} is below the ${required:.2} needed for prize mode")]
    PrizePoolTooSmall { pool: f64, required: f64 },
    #[error(transparent)]
    External(#[from] ExternalServiceError),
}

/// Failure of an opaque collaborator (verification, score submission, storage)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExternalServiceError {
    #[error("no player identity connected")]
    NotConnected,
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("request timed out")]
    TimedOut,
    #[error("storage unavailable: {0}")]
    Storage(String),
}

/// Settings that could not be parsed or do not make sense
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_bid_message() {
        let err = GameError::InvalidBid {
            bid: 0.5,
            minimum: 1.0,
        };
        assert_eq!(err.to_string(), "bid $0.50 is below the $1.00 minimum");
    }

    #[test]
    fn test_external_error_converts() {
        let err: GameError = ExternalServiceError::TimedOut.into();
        assert_eq!(err, GameError::External(ExternalServiceError::TimedOut));
        assert_eq!(err.to_string(), "request timed out");
    }
}
