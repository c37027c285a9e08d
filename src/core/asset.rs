//! Asset identity and quote granularity

use super::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Stock,
    Crypto,
}

impl Display for AssetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                AssetClass::Stock => "stock",
                AssetClass::Crypto => "crypto",
            }
        )
    }
}

impl FromStr for AssetClass {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stock" => Ok(AssetClass::Stock),
            "crypto" => Ok(AssetClass::Crypto),
            _ => Err(ValidationError::UnknownAssetClass(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Timeframe {
    Realtime,
    Intraday1m,
    Intraday5m,
    Intraday15m,
    Daily,
    Weekly,
    Monthly,
}

impl Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Timeframe::Realtime => "realtime",
                Timeframe::Intraday1m => "1min",
                Timeframe::Intraday5m => "5min",
                Timeframe::Intraday15m => "15min",
                Timeframe::Daily => "daily",
                Timeframe::Weekly => "weekly",
                Timeframe::Monthly => "monthly",
            }
        )
    }
}

impl FromStr for Timeframe {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "realtime" => Ok(Timeframe::Realtime),
            "1min" => Ok(Timeframe::Intraday1m),
            "5min" => Ok(Timeframe::Intraday5m),
            "15min" => Ok(Timeframe::Intraday15m),
            "daily" => Ok(Timeframe::Daily),
            "weekly" => Ok(Timeframe::Weekly),
            "monthly" => Ok(Timeframe::Monthly),
            _ => Err(ValidationError::UnknownTimeframe(s.to_string())),
        }
    }
}

impl Timeframe {
    /// Timeframes offered for an asset class. Crypto has no realtime or intraday data.
    pub fn available_for(asset_class: AssetClass) -> &'static [Timeframe] {
        match asset_class {
            AssetClass::Stock => &[
                Timeframe::Realtime,
                Timeframe::Intraday1m,
                Timeframe::Intraday5m,
                Timeframe::Intraday15m,
                Timeframe::Daily,
                Timeframe::Weekly,
                Timeframe::Monthly,
            ],
            AssetClass::Crypto => &[Timeframe::Daily, Timeframe::Weekly, Timeframe::Monthly],
        }
    }

    /// The freshest timeframe for an asset class, used as its "current" price.
    pub fn current_for(asset_class: AssetClass) -> Timeframe {
        match asset_class {
            AssetClass::Stock => Timeframe::Realtime,
            AssetClass::Crypto => Timeframe::Daily,
        }
    }

    pub fn is_available_for(&self, asset_class: AssetClass) -> bool {
        Self::available_for(asset_class).contains(self)
    }

    /// Rejects a timeframe the asset class does not offer.
    pub fn check_for(self, asset_class: AssetClass) -> Result<Timeframe, ValidationError> {
        if self.is_available_for(asset_class) {
            Ok(self)
        } else {
            Err(ValidationError::UnsupportedTimeframe {
                asset_class: asset_class.to_string(),
                timeframe: self.to_string(),
            })
        }
    }
}

/// Identity key for every price lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetRef {
    pub symbol: String,
    pub asset_class: AssetClass,
}

impl AssetRef {
    /// Normalizes the ticker (trimmed, uppercased) and rejects an empty one.
    pub fn new(symbol: &str, asset_class: AssetClass) -> Result<Self, ValidationError> {
        let symbol = normalize_symbol(symbol)?;
        Ok(Self {
            symbol,
            asset_class,
        })
    }
}

impl Display for AssetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.symbol, self.asset_class)
    }
}

pub(crate) fn normalize_symbol(symbol: &str) -> Result<String, ValidationError> {
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(ValidationError::MissingSymbol);
    }
    Ok(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_ref_normalizes_symbol() {
        let asset = AssetRef::new("  aapl ", AssetClass::Stock).unwrap();
        assert_eq!(asset.symbol, "AAPL");
        assert_eq!(asset.to_string(), "AAPL (stock)");

        assert_eq!(
            AssetRef::new("   ", AssetClass::Crypto),
            Err(ValidationError::MissingSymbol)
        );
    }

    #[test]
    fn test_timeframe_parsing() {
        assert_eq!("1min".parse::<Timeframe>().unwrap(), Timeframe::Intraday1m);
        assert_eq!("Daily".parse::<Timeframe>().unwrap(), Timeframe::Daily);
        assert!("hourly".parse::<Timeframe>().is_err());

        for tf in Timeframe::available_for(AssetClass::Stock) {
            assert_eq!(tf.to_string().parse::<Timeframe>().unwrap(), *tf);
        }
    }

    #[test]
    fn test_crypto_has_no_intraday() {
        assert!(!Timeframe::Realtime.is_available_for(AssetClass::Crypto));
        assert!(!Timeframe::Intraday5m.is_available_for(AssetClass::Crypto));
        assert!(Timeframe::Weekly.is_available_for(AssetClass::Crypto));

        let err = Timeframe::Realtime.check_for(AssetClass::Crypto).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Timeframe realtime is not available for crypto"
        );
    }

    #[test]
    fn test_current_timeframe_per_class() {
        assert_eq!(Timeframe::current_for(AssetClass::Stock), Timeframe::Realtime);
        assert_eq!(Timeframe::current_for(AssetClass::Crypto), Timeframe::Daily);
    }

    #[test]
    fn test_asset_class_parsing() {
        assert_eq!("Crypto".parse::<AssetClass>().unwrap(), AssetClass::Crypto);
        assert_eq!(
            "bond".parse::<AssetClass>(),
            Err(ValidationError::UnknownAssetClass("bond".to_string()))
        );
    }
}
