use crate::core::asset::AssetRef;
use crate::core::insight::{InsightError, InsightProvider, insight_prompt};
use crate::providers::util::{redact_url, with_retry};
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize, Debug)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Deserialize, Debug)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiError {
    message: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, skipping empty parts.
    fn first_text(self) -> Option<String> {
        self.candidates?
            .into_iter()
            .next()?
            .content?
            .parts?
            .into_iter()
            .filter_map(|part| part.text)
            .map(|text| text.trim().to_string())
            .find(|text| !text.is_empty())
    }
}

fn transport_failure(e: reqwest::Error) -> InsightError {
    let detail = e.without_url().to_string();
    debug!("Transport failure: {}", detail);
    InsightError::TransportFailure(detail)
}

/// Requests news summaries from Gemini's `generateContent` endpoint.
pub struct GeminiProvider {
    base_url: String,
    model: String,
    api_key: String,
    retries: usize,
}

impl GeminiProvider {
    pub fn new(base_url: &str, model: &str, api_key: &str) -> Self {
        GeminiProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            retries: 0,
        }
    }

    pub fn with_retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }

    fn request_url(&self) -> Result<Url, InsightError> {
        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        Url::parse_with_params(&endpoint, &[("key", self.api_key.as_str())])
            .map_err(|e| {
                warn!("Invalid insight URL {}: {}", self.base_url, e);
                InsightError::TransportFailure(format!("Invalid insight URL: {e}"))
            })
    }
}

#[async_trait]
impl InsightProvider for GeminiProvider {
    #[instrument(name = "GeminiInsight", skip(self, asset), fields(symbol = %asset.symbol))]
    async fn request_insight(&self, asset: &AssetRef) -> Result<String, InsightError> {
        let url = self.request_url()?;
        let request_body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: insight_prompt(asset),
                }],
            }],
        };
        debug!("Requesting insight from {}", redact_url(&url));

        let client = reqwest::Client::builder()
            .user_agent("pricewatch/1.0")
            .build()
            .map_err(transport_failure)?;
        let response = with_retry(
            || client.post(url.clone()).json(&request_body).send(),
            self.retries,
            500,
        )
        .await
        .map_err(|e| {
            let e = e.without_url();
            warn!("Insight request failed for {}: {}", asset.symbol, e);
            transport_failure(e)
        })?;

        let status = response.status();
        let text = response.text().await.map_err(transport_failure)?;
        let data: GenerateContentResponse = serde_json::from_str(&text).map_err(|e| {
            warn!(%status, "Malformed insight response: {}", e);
            InsightError::TransportFailure(format!("Malformed response body: {e}"))
        })?;

        if let Some(message) = data.error.as_ref().and_then(|e| e.message.as_deref()) {
            warn!(%status, "Insight API error for {}: {}", asset.symbol, message);
        }

        data.first_text().ok_or(InsightError::NoInsight)
    }
}
