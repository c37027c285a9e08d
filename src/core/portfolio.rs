//! Portfolio and watchlist documents owned by a single user

use super::asset::{AssetClass, AssetRef, normalize_symbol};
use super::error::{ValidationError, is_positive};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt::Display;

/// Opaque handle assigned by the document store on create.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new() -> Self {
        ItemId(uuid::Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        ItemId(s.trim().to_string())
    }
}

impl Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored record. Documents are created from a draft and never mutated in place.
pub trait Document: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    type Draft: Send;

    /// Collection name inside the per-user store.
    const COLLECTION: &'static str;

    fn from_draft(id: ItemId, created_at: DateTime<Utc>, draft: Self::Draft) -> Self;

    fn id(&self) -> &ItemId;

    fn created_at(&self) -> DateTime<Utc>;
}

/// A held position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioItem {
    pub id: ItemId,
    pub symbol: String,
    pub asset_class: AssetClass,
    pub quantity: f64,
    pub purchase_price: f64,
    pub created_at: DateTime<Utc>,
}

impl PortfolioItem {
    pub fn asset(&self) -> AssetRef {
        AssetRef {
            symbol: self.symbol.clone(),
            asset_class: self.asset_class,
        }
    }

    pub fn cost_basis(&self) -> f64 {
        self.purchase_price * self.quantity
    }
}

/// Validated input for a new portfolio item.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPortfolioItem {
    pub symbol: String,
    pub asset_class: AssetClass,
    pub quantity: f64,
    pub purchase_price: f64,
}

impl NewPortfolioItem {
    pub fn new(
        symbol: &str,
        asset_class: AssetClass,
        quantity: f64,
        purchase_price: f64,
    ) -> Result<Self, ValidationError> {
        let symbol = normalize_symbol(symbol)?;
        if !is_positive(quantity) {
            return Err(ValidationError::NonPositiveQuantity(quantity));
        }
        if !is_positive(purchase_price) {
            return Err(ValidationError::NonPositivePrice(purchase_price));
        }
        Ok(Self {
            symbol,
            asset_class,
            quantity,
            purchase_price,
        })
    }
}

impl Document for PortfolioItem {
    type Draft = NewPortfolioItem;

    const COLLECTION: &'static str = "portfolio";

    fn from_draft(id: ItemId, created_at: DateTime<Utc>, draft: NewPortfolioItem) -> Self {
        PortfolioItem {
            id,
            symbol: draft.symbol,
            asset_class: draft.asset_class,
            quantity: draft.quantity,
            purchase_price: draft.purchase_price,
            created_at,
        }
    }

    fn id(&self) -> &ItemId {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// A symbol tracked without a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistItem {
    pub id: ItemId,
    pub symbol: String,
    pub asset_class: AssetClass,
    pub created_at: DateTime<Utc>,
}

impl WatchlistItem {
    pub fn asset(&self) -> AssetRef {
        AssetRef {
            symbol: self.symbol.clone(),
            asset_class: self.asset_class,
        }
    }
}

impl Document for WatchlistItem {
    type Draft = AssetRef;

    const COLLECTION: &'static str = "watchlist";

    fn from_draft(id: ItemId, created_at: DateTime<Utc>, draft: AssetRef) -> Self {
        WatchlistItem {
            id,
            symbol: draft.symbol,
            asset_class: draft.asset_class,
            created_at,
        }
    }

    fn id(&self) -> &ItemId {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
