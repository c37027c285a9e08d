//! AI generated news summaries

use super::asset::AssetRef;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InsightError {
    #[error("No insights found. The symbol may be invalid.")]
    NoInsight,

    /// The detail is kept for logs and never shown to the user.
    #[error("Failed to fetch insights. Please try again.")]
    TransportFailure(String),
}

/// The natural-language request sent for `asset`. Only the symbol varies.
pub fn insight_prompt(asset: &AssetRef) -> String {
    format!(
        "Provide a concise, single-paragraph summary of recent news for the stock or crypto market for {}.",
        asset.symbol
    )
}

#[async_trait]
pub trait InsightProvider: Send + Sync {
    /// Returns a one-paragraph news summary for `asset`.
    async fn request_insight(&self, asset: &AssetRef) -> Result<String, InsightError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::asset::AssetClass;

    #[test]
    fn test_prompt_mentions_symbol() {
        let asset = AssetRef::new("nvda", AssetClass::Stock).unwrap();
        assert_eq!(
            insight_prompt(&asset),
            "Provide a concise, single-paragraph summary of recent news for the stock or crypto market for NVDA."
        );
    }

    #[test]
    fn test_transport_failure_hides_detail() {
        let err = InsightError::TransportFailure("Malformed response body: expected value".into());
        assert_eq!(err.to_string(), "Failed to fetch insights. Please try again.");
    }
}
