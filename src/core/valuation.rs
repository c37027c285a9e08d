//! Values portfolio holdings against their current prices.
use super::asset::{AssetRef, Timeframe};
use super::portfolio::PortfolioItem;
use super::price::{PriceError, PriceResolver};
use futures::future::join_all;
use std::collections::HashMap;
use tracing::debug;

/// The current worth of a single holding.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuationResult {
    pub item: PortfolioItem,
    /// Resolved price, or the purchase price when resolution failed.
    pub current_price: f64,
    pub current_value: f64,
    pub profit_loss: f64,
    /// Why the purchase price was substituted, if it was.
    pub price_error: Option<PriceError>,
}

impl ValuationResult {
    pub fn is_fallback(&self) -> bool {
        self.price_error.is_some()
    }
}

/// A fully settled valuation of a portfolio. Totals are only available once every
/// holding has a current price or its fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioValuation {
    pub results: Vec<ValuationResult>,
    pub total_value: f64,
    pub total_cost: f64,
}

impl PortfolioValuation {
    pub fn total_profit_loss(&self) -> f64 {
        self.total_value - self.total_cost
    }
}

/// Values `item` at `resolved` or, when resolution failed, at its purchase price.
pub fn value_item(item: &PortfolioItem, resolved: Result<f64, PriceError>) -> ValuationResult {
    let (current_price, price_error) = match resolved {
        Ok(price) => (price, None),
        Err(e) => {
            debug!(
                "Falling back to purchase price for {}: {}",
                item.symbol, e
            );
            (item.purchase_price, Some(e))
        }
    };
    let current_value = current_price * item.quantity;
    ValuationResult {
        item: item.clone(),
        current_price,
        current_value,
        profit_loss: current_value - item.cost_basis(),
        price_error,
    }
}

/// The assets `valuate` looks up, one per distinct (symbol, asset class), in holding order.
pub fn distinct_assets(items: &[PortfolioItem]) -> Vec<AssetRef> {
    let mut assets: Vec<AssetRef> = Vec::new();
    for item in items {
        let asset = item.asset();
        if !assets.contains(&asset) {
            assets.push(asset);
        }
    }
    assets
}

/// Resolves the current price of every holding concurrently and values the portfolio.
///
/// Stocks are priced at their realtime quote, crypto at the latest daily close. Each
/// distinct asset is fetched once. A failed lookup never fails the batch: the holding is
/// valued at its purchase price instead. Progress is reported through `update_callback`
/// once per settled lookup, so `distinct_assets(items).len()` times in total.
pub async fn valuate(
    items: &[PortfolioItem],
    resolver: &(dyn PriceResolver + Send + Sync),
    update_callback: &(dyn Fn() + Sync),
) -> PortfolioValuation {
    let price_futures = distinct_assets(items).into_iter().map(|asset| async move {
        let timeframe = Timeframe::current_for(asset.asset_class);
        let res = resolver
            .resolve_price(&asset, timeframe)
            .await
            .map(|quote| quote.price);
        update_callback();
        (asset, res)
    });
    let prices: HashMap<AssetRef, Result<f64, PriceError>> =
        join_all(price_futures).await.into_iter().collect();

    let results: Vec<ValuationResult> = items
        .iter()
        .map(|item| {
            let resolved = prices
                .get(&item.asset())
                .cloned()
                .unwrap_or(Err(PriceError::NoData));
            value_item(item, resolved)
        })
        .collect();

    let total_value = results.iter().map(|r| r.current_value).sum();
    let total_cost = items.iter().map(PortfolioItem::cost_basis).sum();

    PortfolioValuation {
        results,
        total_value,
        total_cost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::asset::AssetClass;
    use crate::core::portfolio::{Document, ItemId, NewPortfolioItem};
    use crate::core::price::PriceQuote;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Barrier;

    struct MockResolver {
        prices: HashMap<String, f64>,
        calls: AtomicUsize,
        settled: Arc<AtomicUsize>,
        barrier: Option<Barrier>,
    }

    impl MockResolver {
        fn new(prices: &[(&str, f64)]) -> Self {
            Self {
                prices: prices.iter().map(|(s, p)| (s.to_string(), *p)).collect(),
                calls: AtomicUsize::new(0),
                settled: Arc::new(AtomicUsize::new(0)),
                barrier: None,
            }
        }
    }

    #[async_trait]
    impl PriceResolver for MockResolver {
        async fn resolve_price(
            &self,
            asset: &AssetRef,
            timeframe: Timeframe,
        ) -> Result<PriceQuote, PriceError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(barrier) = &self.barrier {
                barrier.wait().await;
            }
            // Later calls settle first.
            tokio::time::sleep(Duration::from_millis(30 - 10 * (n as u64 % 3))).await;
            self.settled.fetch_add(1, Ordering::SeqCst);
            match self.prices.get(&asset.symbol) {
                Some(price) => Ok(PriceQuote {
                    asset: asset.clone(),
                    timeframe,
                    price: *price,
                    as_of: None,
                }),
                None => Err(PriceError::InvalidSymbolOrRateLimited),
            }
        }
    }

    fn item(symbol: &str, asset_class: AssetClass, quantity: f64, price: f64) -> PortfolioItem {
        let draft = NewPortfolioItem::new(symbol, asset_class, quantity, price).unwrap();
        PortfolioItem::from_draft(ItemId::new(), Utc::now(), draft)
    }

    #[tokio::test]
    async fn test_failed_lookup_falls_back_to_purchase_price() {
        let resolver = MockResolver::new(&[("AAA", 15.0)]);
        let items = vec![
            item("AAA", AssetClass::Stock, 2.0, 10.0),
            item("BBB", AssetClass::Stock, 1.0, 50.0),
        ];

        let valuation = valuate(&items, &resolver, &|| {}).await;

        assert_eq!(valuation.total_value, 80.0);
        assert_eq!(valuation.total_cost, 70.0);
        assert_eq!(valuation.total_profit_loss(), 10.0);

        let first = &valuation.results[0];
        assert_eq!(first.current_price, 15.0);
        assert_eq!(first.current_value, 30.0);
        assert_eq!(first.profit_loss, 10.0);
        assert!(!first.is_fallback());

        let second = &valuation.results[1];
        assert_eq!(second.current_price, 50.0);
        assert_eq!(second.profit_loss, 0.0);
        assert_eq!(
            second.price_error,
            Some(PriceError::InvalidSymbolOrRateLimited)
        );
    }

    #[tokio::test]
    async fn test_total_published_after_all_lookups_settle() {
        let mut resolver = MockResolver::new(&[("AAA", 1.0), ("BBB", 2.0), ("CCC", 3.0)]);
        // Every lookup must be in flight at once to pass the barrier.
        resolver.barrier = Some(Barrier::new(4));
        let settled = Arc::clone(&resolver.settled);
        let items = vec![
            item("AAA", AssetClass::Stock, 1.0, 1.0),
            item("BBB", AssetClass::Stock, 1.0, 1.0),
            item("CCC", AssetClass::Crypto, 1.0, 1.0),
            item("DDD", AssetClass::Crypto, 1.0, 7.0),
        ];
        let progress = AtomicUsize::new(0);

        let valuation = tokio::time::timeout(
            Duration::from_secs(5),
            valuate(&items, &resolver, &|| {
                progress.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .await
        .expect("lookups did not run concurrently");

        assert_eq!(settled.load(Ordering::SeqCst), 4);
        assert_eq!(progress.load(Ordering::SeqCst), 4);
        assert_eq!(valuation.results.len(), 4);
        assert_eq!(valuation.total_value, 1.0 + 2.0 + 3.0 + 7.0);
    }

    #[tokio::test]
    async fn test_duplicate_assets_fetched_once() {
        let resolver = MockResolver::new(&[("BTC", 100.0)]);
        let items = vec![
            item("BTC", AssetClass::Crypto, 1.0, 80.0),
            item("btc", AssetClass::Crypto, 0.5, 120.0),
        ];

        let valuation = valuate(&items, &resolver, &|| {}).await;

        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
        assert_eq!(valuation.total_value, 150.0);
        assert_eq!(valuation.results[1].profit_loss, -10.0);
    }

    #[tokio::test]
    async fn test_progress_counts_distinct_assets() {
        let resolver = MockResolver::new(&[("BTC", 100.0), ("AAPL", 10.0)]);
        let items = vec![
            item("BTC", AssetClass::Crypto, 1.0, 80.0),
            item("AAPL", AssetClass::Stock, 2.0, 9.0),
            item("btc", AssetClass::Crypto, 0.5, 120.0),
            item("BTC", AssetClass::Stock, 1.0, 5.0),
        ];
        let progress = AtomicUsize::new(0);

        let expected = distinct_assets(&items);
        assert_eq!(expected.len(), 3);
        assert_eq!(expected[0].symbol, "BTC");
        assert_eq!(expected[2].asset_class, AssetClass::Stock);

        valuate(&items, &resolver, &|| {
            progress.fetch_add(1, Ordering::SeqCst);
        })
        .await;
        assert_eq!(progress.load(Ordering::SeqCst), expected.len());
    }

    #[tokio::test]
    async fn test_empty_portfolio() {
        let resolver = MockResolver::new(&[]);
        let valuation = valuate(&[], &resolver, &|| {}).await;
        assert!(valuation.results.is_empty());
        assert_eq!(valuation.total_value, 0.0);
    }
}
