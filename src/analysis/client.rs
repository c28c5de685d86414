// SPDX-License-Identifier: GPL-3.0-only

//! Gemini `generateContent` client
//!
//! One request per analysis: the captured still as inline data, the fixed
//! instruction, the fixed system role and a response schema. The model
//! answers with JSON text that is parsed into an [`AnalysisResult`].

use super::Analyzer;
use super::schema::{IDENTIFY_INSTRUCTION, SYSTEM_INSTRUCTION, response_schema};
use super::types::AnalysisResult;
use crate::config::AnalysisConfig;
use crate::errors::{AnalysisError, AppError, AppResult};
use crate::pipelines::photo::CapturedFrame;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Header carrying the static service credential
const API_KEY_HEADER: &str = "x-goog-api-key";

// Request envelope

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: serde_json::Value,
}

// Response envelope

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Build the request body for one frame
pub fn build_request(frame: &CapturedFrame) -> GenerateContentRequest {
    GenerateContentRequest {
        system_instruction: Content {
            parts: vec![Part::Text {
                text: SYSTEM_INSTRUCTION.to_string(),
            }],
        },
        contents: vec![Content {
            parts: vec![
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: frame.mime_type.clone(),
                        data: frame.base64_payload(),
                    },
                },
                Part::Text {
                    text: IDENTIFY_INSTRUCTION.to_string(),
                },
            ],
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json",
            response_schema: response_schema(),
        },
    }
}

/// Concatenated text of the first candidate
///
/// An envelope that is not JSON is a transport problem; a valid envelope
/// with no text is an empty response.
pub fn extract_text(body: &str) -> Result<String, AnalysisError> {
    let response: GenerateContentResponse = serde_json::from_str(body).map_err(|e| {
        AnalysisError::TransportError(format!("Undecodable response envelope: {}", e))
    })?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(AnalysisError::EmptyResponse);
    }
    Ok(text)
}

/// Parse a successful response body into a result
pub fn parse_response(body: &str) -> Result<AnalysisResult, AnalysisError> {
    let text = extract_text(body)?;
    AnalysisResult::from_json(&text)
}

/// Human readable cause from an error body, falling back to the raw body
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect())
}

/// Client for the Gemini REST API
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl GeminiClient {
    /// Create a client from configuration
    ///
    /// Fails when no credential is configured.
    pub fn new(config: &AnalysisConfig) -> AppResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                AppError::Config(
                    "No API key configured (set GEMINI_API_KEY or analysis.api_key)".to_string(),
                )
            })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Other(format!("Failed to build HTTP client: {}", e)))?;

        let endpoint = format!(
            "{}/{}:generateContent",
            config.api_base_url.trim_end_matches('/'),
            config.model
        );

        Ok(Self {
            http,
            api_key,
            endpoint,
            model: config.model.clone(),
        })
    }
}

impl Analyzer for GeminiClient {
    async fn analyze(&self, frame: &CapturedFrame) -> Result<AnalysisResult, AnalysisError> {
        let start = Instant::now();
        info!(
            model = %self.model,
            width = frame.width,
            height = frame.height,
            bytes = frame.data.len(),
            "Sending frame for analysis"
        );

        let request = build_request(frame);
        let response = self
            .http
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Analysis request failed");
                AnalysisError::from(e)
            })?;

        let status = response.status();
        let body = response.text().await?;
        debug!(status = %status, bytes = body.len(), "Analysis response received");

        if !status.is_success() {
            let message = api_error_message(&body);
            error!(status = %status, error = %message, "Analysis service rejected request");
            return Err(AnalysisError::TransportError(format!(
                "HTTP {}: {}",
                status, message
            )));
        }

        let result = parse_response(&body)?;
        info!(
            name = %result.name,
            category = %result.category,
            elapsed_ms = start.elapsed().as_millis(),
            "Analysis complete"
        );
        Ok(result)
    }
}
