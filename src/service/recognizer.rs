//! Entity recognition collaborator.
//!
//! Sentence segmentation and named-entity recognition are provided by an
//! external NLP service; this module defines the seam and an HTTP client
//! for a spaCy-style `/analyze` endpoint.

use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const NER_BASE_URL_ENV: &str = "NER_BASE_URL";
const DEFAULT_NER_BASE_URL: &str = "http://127.0.0.1:8090";

#[derive(Debug, thiserror::Error)]
pub enum NerError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

/// One recognized entity, in sentence order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    /// Model label, e.g. `GPE`, `LOC`, `PERSON`.
    pub label: String,
}

/// One detected sentence with the entities found inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedSentence {
    pub text: String,
    #[serde(default)]
    pub entities: Vec<Entity>,
}

/// Sentence boundary detection plus per-sentence entity recognition.
#[async_trait]
pub trait EntityRecognizer: Send + Sync {
    /// Analyze a text: sentence boundaries and, per sentence, the
    /// `(entity text, label)` pairs found in that sentence.
    async fn analyze(&self, text: &str) -> Result<Vec<AnalyzedSentence>, NerError>;
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct AnalyzeResponse {
    sentences: Vec<AnalyzedSentence>,
}

/// Client for a spaCy-style NER HTTP service.
pub struct NerClient {
    client: Client,
    base_url: String,
}

impl NerClient {
    /// Create a new NER client.
    ///
    /// The base URL is resolved in this order:
    /// 1. `NER_BASE_URL` environment variable if set
    /// 2. Default local service URL
    pub fn new() -> Self {
        let resolved_url = env::var(NER_BASE_URL_ENV)
            .ok()
            .unwrap_or_else(|| DEFAULT_NER_BASE_URL.to_string());

        Self {
            client: Client::new(),
            base_url: resolved_url,
        }
    }
}

impl Default for NerClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityRecognizer for NerClient {
    async fn analyze(&self, text: &str) -> Result<Vec<AnalyzedSentence>, NerError> {
        let url = format!("{}/analyze", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&AnalyzeRequest { text })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NerError::Parse(format!(
                "Unexpected status {}: {}",
                status, body
            )));
        }

        let parsed: AnalyzeResponse = response
            .json()
            .await
            .map_err(|e| NerError::Parse(format!("Failed to deserialize NER response: {}", e)))?;

        tracing::debug!(
            sentences = parsed.sentences.len(),
            "Text analyzed by NER service"
        );

        Ok(parsed.sentences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_deserializes_with_missing_entities() {
        let json = r#"{
            "sentences": [
                {"text": "We planted trees in Bangalore.", "entities": [{"text": "Bangalore", "label": "GPE"}]},
                {"text": "It went well."}
            ]
        }"#;
        let parsed: AnalyzeResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.sentences.len(), 2);
        assert_eq!(parsed.sentences[0].entities[0].label, "GPE");
        assert!(parsed.sentences[1].entities.is_empty());
    }

    #[tokio::test]
    #[ignore] // Requires a running NER service
    async fn test_analyze_live() {
        let client = NerClient::new();
        let sentences = client
            .analyze("We initiated a reforestation project in Bangalore.")
            .await
            .unwrap();
        assert!(!sentences.is_empty());
    }
}
