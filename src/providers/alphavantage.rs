use crate::core::asset::{AssetClass, AssetRef, Timeframe};
use crate::core::error::ValidationError;
use crate::core::price::{PriceError, PriceQuote, PriceResolver};
use crate::providers::util::{redact_url, with_retry};
use async_trait::async_trait;
use reqwest::Url;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

/// Top-level keys the API uses to report a bad symbol, an exhausted quota or throttling.
const ERROR_KEYS: &[&str] = &["Error Message", "Note", "Information"];

const STOCK_CLOSE: &[&str] = &["4. close"];
// Older responses carry the market-suffixed field, current ones the plain close.
const CRYPTO_CLOSE: &[&str] = &["4b. close (USD)", "4. close"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// A single quote object.
    Quote,
    /// An object of entries keyed by date or timestamp.
    Series,
}

/// How to query one (asset class, timeframe) pair and where its price sits in the response.
#[derive(Debug)]
pub struct Endpoint {
    function: &'static str,
    interval: Option<&'static str>,
    market: Option<&'static str>,
    container: &'static str,
    shape: Shape,
    fields: &'static [&'static str],
}

const fn series(
    function: &'static str,
    interval: Option<&'static str>,
    market: Option<&'static str>,
    container: &'static str,
    fields: &'static [&'static str],
) -> Endpoint {
    Endpoint {
        function,
        interval,
        market,
        container,
        shape: Shape::Series,
        fields,
    }
}

static ENDPOINTS: &[(AssetClass, Timeframe, Endpoint)] = &[
    (
        AssetClass::Stock,
        Timeframe::Realtime,
        Endpoint {
            function: "GLOBAL_QUOTE",
            interval: None,
            market: None,
            container: "Global Quote",
            shape: Shape::Quote,
            fields: &["05. price"],
        },
    ),
    (
        AssetClass::Stock,
        Timeframe::Intraday1m,
        series("TIME_SERIES_INTRADAY", Some("1min"), None, "Time Series (1min)", STOCK_CLOSE),
    ),
    (
        AssetClass::Stock,
        Timeframe::Intraday5m,
        series("TIME_SERIES_INTRADAY", Some("5min"), None, "Time Series (5min)", STOCK_CLOSE),
    ),
    (
        AssetClass::Stock,
        Timeframe::Intraday15m,
        series("TIME_SERIES_INTRADAY", Some("15min"), None, "Time Series (15min)", STOCK_CLOSE),
    ),
    (
        AssetClass::Stock,
        Timeframe::Daily,
        series("TIME_SERIES_DAILY", None, None, "Time Series (Daily)", STOCK_CLOSE),
    ),
    (
        AssetClass::Stock,
        Timeframe::Weekly,
        series("TIME_SERIES_WEEKLY", None, None, "Time Series (Weekly)", STOCK_CLOSE),
    ),
    (
        AssetClass::Stock,
        Timeframe::Monthly,
        series("TIME_SERIES_MONTHLY", None, None, "Time Series (Monthly)", STOCK_CLOSE),
    ),
    (
        AssetClass::Crypto,
        Timeframe::Daily,
        series(
            "DIGITAL_CURRENCY_DAILY",
            None,
            Some("USD"),
            "Time Series (Digital Currency Daily)",
            CRYPTO_CLOSE,
        ),
    ),
    (
        AssetClass::Crypto,
        Timeframe::Weekly,
        series(
            "DIGITAL_CURRENCY_WEEKLY",
            None,
            Some("USD"),
            "Time Series (Digital Currency Weekly)",
            CRYPTO_CLOSE,
        ),
    ),
    (
        AssetClass::Crypto,
        Timeframe::Monthly,
        series(
            "DIGITAL_CURRENCY_MONTHLY",
            None,
            Some("USD"),
            "Time Series (Digital Currency Monthly)",
            CRYPTO_CLOSE,
        ),
    ),
];

/// Looks up the endpoint for a pair; pairs missing from the table are unsupported.
pub fn endpoint_for(
    asset_class: AssetClass,
    timeframe: Timeframe,
) -> Result<&'static Endpoint, ValidationError> {
    ENDPOINTS
        .iter()
        .find(|(class, tf, _)| *class == asset_class && *tf == timeframe)
        .map(|(_, _, endpoint)| endpoint)
        .ok_or_else(|| ValidationError::UnsupportedTimeframe {
            asset_class: asset_class.to_string(),
            timeframe: timeframe.to_string(),
        })
}

/// Parses a price attribute, which the API sends as a decimal string.
fn field_price(entry: &Map<String, Value>, fields: &[&str]) -> Result<f64, PriceError> {
    let raw = fields
        .iter()
        .find_map(|field| entry.get(*field))
        .ok_or(PriceError::NoData)?;
    let price = match raw {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    price
        .filter(|p| p.is_finite() && *p > 0.0)
        .ok_or(PriceError::NoData)
}

/// Extracts the latest price, and the date it refers to, from a decoded response.
fn extract_price(endpoint: &Endpoint, body: &Value) -> Result<(f64, Option<String>), PriceError> {
    let body = body.as_object().ok_or(PriceError::NoData)?;

    if let Some(key) = ERROR_KEYS.iter().find(|key| body.contains_key(**key)) {
        let message = body.get(*key).map(Value::to_string).unwrap_or_default();
        debug!("API reported {}: {}", key, message);
        return Err(PriceError::InvalidSymbolOrRateLimited);
    }

    let container = body
        .get(endpoint.container)
        .and_then(Value::as_object)
        .ok_or(PriceError::NoData)?;

    match endpoint.shape {
        Shape::Quote => {
            let price = field_price(container, endpoint.fields)?;
            let as_of = container
                .get("07. latest trading day")
                .and_then(Value::as_str)
                .map(str::to_string);
            Ok((price, as_of))
        }
        Shape::Series => {
            // Keys are ISO dates or timestamps, so the greatest one is the newest entry.
            let (latest, entry) = container
                .iter()
                .max_by(|a, b| a.0.cmp(b.0))
                .ok_or(PriceError::NoData)?;
            let entry = entry.as_object().ok_or(PriceError::NoData)?;
            let price = field_price(entry, endpoint.fields)?;
            Ok((price, Some(latest.clone())))
        }
    }
}

fn transport_failure(e: reqwest::Error) -> PriceError {
    let detail = e.without_url().to_string();
    debug!("Transport failure: {}", detail);
    PriceError::TransportFailure(detail)
}

/// Resolves prices from the Alpha Vantage query API.
pub struct AlphaVantageProvider {
    base_url: String,
    api_key: String,
    retries: usize,
}

impl AlphaVantageProvider {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        AlphaVantageProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            retries: 0,
        }
    }

    /// Retries transport failures `retries` more times. API-level failures are never retried.
    pub fn with_retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }

    fn request_url(&self, endpoint: &Endpoint, asset: &AssetRef) -> Result<Url, PriceError> {
        let mut params = vec![
            ("function", endpoint.function),
            ("symbol", asset.symbol.as_str()),
        ];
        if let Some(interval) = endpoint.interval {
            params.push(("interval", interval));
        }
        if let Some(market) = endpoint.market {
            params.push(("market", market));
        }
        params.push(("apikey", self.api_key.as_str()));

        Url::parse_with_params(&format!("{}/query", self.base_url), &params)
            .map_err(|e| {
                warn!("Invalid market data URL {}: {}", self.base_url, e);
                PriceError::TransportFailure(format!("Invalid market data URL: {e}"))
            })
    }
}

#[async_trait]
impl PriceResolver for AlphaVantageProvider {
    #[instrument(
        name = "AlphaVantagePriceFetch",
        skip(self, asset),
        fields(symbol = %asset.symbol, timeframe = %timeframe)
    )]
    async fn resolve_price(
        &self,
        asset: &AssetRef,
        timeframe: Timeframe,
    ) -> Result<PriceQuote, PriceError> {
        let endpoint = endpoint_for(asset.asset_class, timeframe)?;
        let url = self.request_url(endpoint, asset)?;
        debug!("Requesting price data from {}", redact_url(&url));

        let client = reqwest::Client::builder()
            .user_agent("pricewatch/1.0")
            .build()
            .map_err(transport_failure)?;
        let response = with_retry(|| client.get(url.clone()).send(), self.retries, 500)
            .await
            .map_err(|e| {
                let e = e.without_url();
                warn!("Request failed for {}: {}", asset.symbol, e);
                transport_failure(e)
            })?;

        // Error payloads are reported with any status code, so the body decides.
        debug!(status = %response.status(), "Received Alpha Vantage response");
        let text = response.text().await.map_err(transport_failure)?;
        let body: Value = serde_json::from_str(&text).map_err(|e| {
            warn!("Malformed response for {}: {}", asset.symbol, e);
            PriceError::TransportFailure(format!("Malformed response body: {e}"))
        })?;

        let (price, as_of) = extract_price(endpoint, &body).inspect_err(|e| {
            warn!("No price for {} ({}): {}", asset.symbol, timeframe, e);
        })?;

        Ok(PriceQuote {
            asset: asset.clone(),
            timeframe,
            price,
            as_of,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_mock_server(function: &str, status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/query"))
            .and(query_param("function", function))
            .and(query_param("apikey", "test-key"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;

        mock_server
    }

    fn stock(symbol: &str) -> AssetRef {
        AssetRef::new(symbol, AssetClass::Stock).unwrap()
    }

    fn crypto(symbol: &str) -> AssetRef {
        AssetRef::new(symbol, AssetClass::Crypto).unwrap()
    }

    #[test]
    fn test_every_offered_timeframe_has_an_endpoint() {
        for class in [AssetClass::Stock, AssetClass::Crypto] {
            for tf in Timeframe::available_for(class) {
                assert!(endpoint_for(class, *tf).is_ok(), "{class} {tf}");
            }
        }
        assert!(endpoint_for(AssetClass::Crypto, Timeframe::Realtime).is_err());
        assert!(endpoint_for(AssetClass::Crypto, Timeframe::Intraday1m).is_err());
    }

    #[tokio::test]
    async fn test_realtime_quote() {
        let body = r#"{
            "Global Quote": {
                "01. symbol": "IBM",
                "05. price": "189.9800",
                "07. latest trading day": "2025-01-10"
            }
        }"#;
        let mock_server = create_mock_server("GLOBAL_QUOTE", 200, body).await;

        let provider = AlphaVantageProvider::new(&mock_server.uri(), "test-key");
        let quote = provider
            .resolve_price(&stock("ibm"), Timeframe::Realtime)
            .await
            .unwrap();
        assert_eq!(quote.price, 189.98);
        assert_eq!(quote.asset.symbol, "IBM");
        assert_eq!(quote.as_of.as_deref(), Some("2025-01-10"));
    }

    #[tokio::test]
    async fn test_intraday_uses_interval_and_newest_entry() {
        let mock_server = MockServer::start().await;
        let body = r#"{
            "Meta Data": {"1. Information": "Intraday (5min)"},
            "Time Series (5min)": {
                "2025-01-10 19:55:00": {"1. open": "1.0", "4. close": "101.5"},
                "2025-01-10 19:50:00": {"1. open": "1.0", "4. close": "100.0"}
            }
        }"#;
        Mock::given(method("GET"))
            .and(path("/query"))
            .and(query_param("function", "TIME_SERIES_INTRADAY"))
            .and(query_param("symbol", "MSFT"))
            .and(query_param("interval", "5min"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = AlphaVantageProvider::new(&mock_server.uri(), "test-key");
        let quote = provider
            .resolve_price(&stock("MSFT"), Timeframe::Intraday5m)
            .await
            .unwrap();
        assert_eq!(quote.price, 101.5);
        assert_eq!(quote.as_of.as_deref(), Some("2025-01-10 19:55:00"));
    }

    #[tokio::test]
    async fn test_daily_picks_latest_date_regardless_of_order() {
        let body = r#"{
            "Time Series (Daily)": {
                "2025-01-08": {"4. close": "10.0"},
                "2025-01-10": {"4. close": "12.5"},
                "2025-01-09": {"4. close": "11.0"}
            }
        }"#;
        let mock_server = create_mock_server("TIME_SERIES_DAILY", 200, body).await;

        let provider = AlphaVantageProvider::new(&mock_server.uri(), "test-key");
        let quote = provider
            .resolve_price(&stock("AAPL"), Timeframe::Daily)
            .await
            .unwrap();
        assert_eq!(quote.price, 12.5);
        assert_eq!(quote.as_of.as_deref(), Some("2025-01-10"));
    }

    #[tokio::test]
    async fn test_crypto_daily_close_usd() {
        let mock_server = MockServer::start().await;
        let body = r#"{
            "Time Series (Digital Currency Daily)": {
                "2025-01-10": {"4a. close (EUR)": "90000.0", "4b. close (USD)": "94500.25"}
            }
        }"#;
        Mock::given(method("GET"))
            .and(path("/query"))
            .and(query_param("function", "DIGITAL_CURRENCY_DAILY"))
            .and(query_param("symbol", "BTC"))
            .and(query_param("market", "USD"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&mock_server)
            .await;

        let provider = AlphaVantageProvider::new(&mock_server.uri(), "test-key");
        let quote = provider
            .resolve_price(&crypto("btc"), Timeframe::Daily)
            .await
            .unwrap();
        assert_eq!(quote.price, 94500.25);
    }

    #[tokio::test]
    async fn test_crypto_monthly_plain_close() {
        let body = r#"{
            "Time Series (Digital Currency Monthly)": {
                "2025-01-31": {"4. close": "3300.10"}
            }
        }"#;
        let mock_server = create_mock_server("DIGITAL_CURRENCY_MONTHLY", 200, body).await;

        let provider = AlphaVantageProvider::new(&mock_server.uri(), "test-key");
        let quote = provider
            .resolve_price(&crypto("ETH"), Timeframe::Monthly)
            .await
            .unwrap();
        assert_eq!(quote.price, 3300.1);
    }

    #[tokio::test]
    async fn test_error_payloads_are_classified() {
        let payloads = [
            r#"{"Error Message": "Invalid API call."}"#,
            r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."}"#,
            r#"{"Information": "We have detected your API key and our standard API rate limit is 25 requests per day."}"#,
            r#"{"Note": "limit", "Time Series (Weekly)": {"2025-01-10": {"4. close": "5.0"}}}"#,
        ];
        for body in payloads {
            let mock_server = create_mock_server("TIME_SERIES_WEEKLY", 200, body).await;
            let provider = AlphaVantageProvider::new(&mock_server.uri(), "test-key");
            let result = provider
                .resolve_price(&stock("NOPE"), Timeframe::Weekly)
                .await;
            assert_eq!(result, Err(PriceError::InvalidSymbolOrRateLimited), "{body}");
        }
    }

    #[tokio::test]
    async fn test_error_payload_with_http_error_status() {
        let body = r#"{"Error Message": "Invalid API call."}"#;
        let mock_server = create_mock_server("GLOBAL_QUOTE", 429, body).await;

        let provider = AlphaVantageProvider::new(&mock_server.uri(), "test-key");
        let result = provider
            .resolve_price(&stock("XYZ"), Timeframe::Realtime)
            .await;
        assert_eq!(result, Err(PriceError::InvalidSymbolOrRateLimited));
    }

    #[tokio::test]
    async fn test_missing_or_unusable_data() {
        let cases = [
            ("GLOBAL_QUOTE", Timeframe::Realtime, r#"{"Global Quote": {}}"#),
            ("GLOBAL_QUOTE", Timeframe::Realtime, r#"{"Global Quote": {"05. price": "0.0000"}}"#),
            ("GLOBAL_QUOTE", Timeframe::Realtime, r#"{"Global Quote": {"05. price": "n/a"}}"#),
            ("TIME_SERIES_DAILY", Timeframe::Daily, r#"{}"#),
            ("TIME_SERIES_DAILY", Timeframe::Daily, r#"{"Time Series (Daily)": {}}"#),
            ("TIME_SERIES_DAILY", Timeframe::Daily, r#"{"Time Series (Daily)": []}"#),
            ("TIME_SERIES_DAILY", Timeframe::Daily, r#"{"Time Series (Daily)": {"2025-01-10": {"1. open": "3.0"}}}"#),
            ("TIME_SERIES_DAILY", Timeframe::Daily, r#"{"Time Series (Daily)": {"2025-01-10": "12.0"}}"#),
            ("TIME_SERIES_DAILY", Timeframe::Daily, r#"{"Time Series (Daily)": {"2025-01-10": {"4. close": "-4.0"}}}"#),
            ("TIME_SERIES_DAILY", Timeframe::Daily, r#"[1, 2, 3]"#),
            ("TIME_SERIES_MONTHLY", Timeframe::Monthly, r#"{"Time Series (Daily)": {"2025-01-10": {"4. close": "12.0"}}}"#),
        ];
        for (function, timeframe, body) in cases {
            let mock_server = create_mock_server(function, 200, body).await;
            let provider = AlphaVantageProvider::new(&mock_server.uri(), "test-key");
            let result = provider.resolve_price(&stock("AAPL"), timeframe).await;
            assert_eq!(result, Err(PriceError::NoData), "{body}");
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_transport_failure() {
        let mock_server = create_mock_server("GLOBAL_QUOTE", 200, "<html>oops</html>").await;

        let provider = AlphaVantageProvider::new(&mock_server.uri(), "test-key");
        let result = provider
            .resolve_price(&stock("AAPL"), Timeframe::Realtime)
            .await;
        assert!(matches!(result, Err(PriceError::TransportFailure(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_failure() {
        let provider = AlphaVantageProvider::new("http://127.0.0.1:9", "secret-key");
        let result = provider
            .resolve_price(&stock("AAPL"), Timeframe::Realtime)
            .await;
        match result {
            Err(PriceError::TransportFailure(msg)) => assert!(!msg.contains("secret-key")),
            other => panic!("expected transport failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unsupported_timeframe_makes_no_request() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let provider = AlphaVantageProvider::new(&mock_server.uri(), "test-key");
        let result = provider
            .resolve_price(&crypto("BTC"), Timeframe::Realtime)
            .await;
        assert!(matches!(
            result,
            Err(PriceError::Validation(
                ValidationError::UnsupportedTimeframe { .. }
            ))
        ));
    }
}
