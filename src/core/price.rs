//! Pricing abstractions and core types

use super::asset::{AssetRef, Timeframe};
use super::error::ValidationError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The latest price of an asset at a given granularity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub asset: AssetRef,
    pub timeframe: Timeframe,
    pub price: f64,
    /// Series key (date or timestamp) the price was taken from, when the API reports one.
    pub as_of: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PriceError {
    #[error("Invalid symbol or API limit reached.")]
    InvalidSymbolOrRateLimited,

    #[error("Could not fetch data. The symbol might be invalid or there is no recent data.")]
    NoData,

    /// The detail is kept for logs and never shown to the user.
    #[error("Failed to fetch data. Please check your internet connection.")]
    TransportFailure(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[async_trait]
pub trait PriceResolver: Send + Sync {
    /// Fetches the most recent price of `asset` for `timeframe`.
    async fn resolve_price(
        &self,
        asset: &AssetRef,
        timeframe: Timeframe,
    ) -> Result<PriceQuote, PriceError>;
}
