//! services/api/src/adapters/chat_llm.rs
//!
//! This module contains the adapter for the chatbot's generative-language
//! model. It implements the `ChatService` port from the `core` crate.

const PROMPT_TEMPLATE: &str = r#"You are a helpful study assistant for students. Provide clear, educational answers.

Student Question: {question}

Please provide a helpful and educational response:"#;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use studyhub_core::ports::{ChatService, PortError, PortResult};

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ChatService` against the generative-language
/// REST API. The key is injected at construction so tests can substitute
/// the whole service behind the port.
#[derive(Clone)]
pub struct GeminiChatAdapter {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiChatAdapter {
    /// Creates a new `GeminiChatAdapter`.
    pub fn new(http: reqwest::Client, api_key: String, model: String) -> Self {
        Self {
            http,
            api_key,
            model,
        }
    }
}

fn request_error(e: reqwest::Error) -> PortError {
    if e.is_timeout() {
        PortError::External("chat service timed out".to_string())
    } else {
        PortError::External(e.to_string())
    }
}

/// Stands in for the chat service when no API key is configured. The rest
/// of the API keeps working; only the chatbot reports itself unavailable.
#[derive(Clone, Default)]
pub struct DisabledChatAdapter;

#[async_trait]
impl ChatService for DisabledChatAdapter {
    async fn reply(&self, _prompt: &str) -> PortResult<String> {
        Err(PortError::External(
            "chat service is not configured".to_string(),
        ))
    }
}

//=========================================================================================
// `ChatService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ChatService for GeminiChatAdapter {
    async fn reply(&self, prompt: &str) -> PortResult<String> {
        let url = format!(
            "{API_BASE}/{}:generateContent?key={}",
            self.model, self.api_key
        );
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: PROMPT_TEMPLATE.replace("{question}", prompt),
                }],
            }],
        };

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            return Err(PortError::External(format!(
                "chat service returned status {}",
                response.status()
            )));
        }

        let parsed: GenerateResponse = response.json().await.map_err(request_error)?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                PortError::External("chat service response contained no text".to_string())
            })?;
        Ok(text)
    }
}
