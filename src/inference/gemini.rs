use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::provider::{
    Citation, Completion, CompletionProvider, CompletionRequest, InferenceError,
};

/// Client for the Gemini `generateContent` REST API.
pub struct GeminiClient {
    http: Client,
    api_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_url: &str, api_key: String, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(GeminiClient {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl CompletionProvider for GeminiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, InferenceError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_url, request.model
        );

        let mut body = serde_json::json!({
            "system_instruction": { "parts": [{ "text": request.system_instruction }] },
            "contents": [{ "role": "user", "parts": [{ "text": request.prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": request.response_schema,
            },
        });
        if request.web_search {
            body["tools"] = serde_json::json!([{ "google_search": {} }]);
        }

        debug!("Requesting completion from {} ({})", url, request.model);

        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(InferenceError::Api { status, body });
        }

        let raw: serde_json::Value = resp.json().await?;
        Ok(parse_completion(&raw))
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

// ── Parsing helpers ────────────────────────────────────────────────────────────

fn parse_completion(raw: &serde_json::Value) -> Completion {
    let candidate = &raw["candidates"][0];

    // Responses can split text across several parts; concatenate them all.
    let text = candidate["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p["text"].as_str())
                .collect::<String>()
        })
        .unwrap_or_default();

    let citations = candidate["groundingMetadata"]["groundingChunks"]
        .as_array()
        .map(|chunks| {
            chunks
                .iter()
                .filter_map(|chunk| {
                    let uri = chunk["web"]["uri"].as_str()?;
                    if Url::parse(uri).is_err() {
                        return None;
                    }
                    Some(Citation {
                        title: chunk["web"]["title"].as_str().map(str::to_string),
                        uri: uri.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Completion { text, citations }
}
