//! Core business logic abstractions

pub mod asset;
pub mod band;
pub mod config;
pub mod error;
pub mod insight;
pub mod log;
pub mod portfolio;
pub mod price;
pub mod session;
pub mod valuation;

// Re-export main types for cleaner imports
pub use asset::{AssetClass, AssetRef, Timeframe};
pub use band::{PriceBand, compute_band};
pub use error::ValidationError;
pub use insight::{InsightError, InsightProvider};
pub use portfolio::{Document, ItemId, NewPortfolioItem, PortfolioItem, WatchlistItem};
pub use price::{PriceError, PriceQuote, PriceResolver};
pub use session::{Session, UserId};
pub use valuation::{PortfolioValuation, ValuationResult, valuate};
