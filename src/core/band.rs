//! Stop-loss and sell-point derived from a volatility percentage

use super::error::{ValidationError, is_positive};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceBand {
    pub stop_loss: f64,
    pub sell_point: f64,
}

/// Places a stop-loss and a sell-point `volatility_pct` percent below and above `price`.
///
/// Inputs are assumed valid (see [`validate_band_inputs`]). No clamping is applied, so a
/// volatility above 100% yields a negative stop-loss.
pub fn compute_band(price: f64, volatility_pct: f64) -> PriceBand {
    let delta = price * volatility_pct / 100.0;
    PriceBand {
        stop_loss: price - delta,
        sell_point: price + delta,
    }
}

/// Rejects non-finite, zero or negative price and volatility.
pub fn validate_band_inputs(price: f64, volatility_pct: f64) -> Result<(), ValidationError> {
    if !is_positive(price) {
        return Err(ValidationError::NonPositivePrice(price));
    }
    validate_volatility(volatility_pct)
}

pub fn validate_volatility(volatility_pct: f64) -> Result<(), ValidationError> {
    if !is_positive(volatility_pct) {
        return Err(ValidationError::NonPositiveVolatility(volatility_pct));
    }
    Ok(())
}
