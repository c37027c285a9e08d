//! Input validation errors

use thiserror::Error;

/// Caller-supplied input that is rejected before any network call or write.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Please enter a stock or crypto symbol.")]
    MissingSymbol,

    #[error("Volatility percentage must be a positive number, got {0}")]
    NonPositiveVolatility(f64),

    #[error("Quantity must be a positive number, got {0}")]
    NonPositiveQuantity(f64),

    #[error("Price must be a positive number, got {0}")]
    NonPositivePrice(f64),

    #[error("Timeframe {timeframe} is not available for {asset_class}")]
    UnsupportedTimeframe {
        asset_class: String,
        timeframe: String,
    },

    #[error("Unknown asset class: {0} (expected stock or crypto)")]
    UnknownAssetClass(String),

    #[error("Unknown timeframe: {0}")]
    UnknownTimeframe(String),

    #[error("Invalid user id: {0:?}")]
    InvalidUserId(String),
}

/// Checks that a user-entered amount is a finite number above zero.
pub(crate) fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
