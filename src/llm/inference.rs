//! HTTP backends for structured-output model calls

use crate::config::{LlmConfig, Provider};
use crate::error::{Result, ScreenerError};
use crate::llm::prompts::ScreeningPrompt;
use crate::processing::schema::{gemini_response_schema, response_json_schema};
use log::{debug, error, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

const SCHEMA_NAME: &str = "screening_record";

/// A model endpoint that answers a prompt with a JSON document.
///
/// Implementations return the raw reply text; validation happens in the caller.
pub trait CompletionBackend {
    fn complete(&self, prompt: &ScreeningPrompt) -> impl Future<Output = Result<String>> + Send;

    fn model_name(&self) -> &str;
}

// ---- OpenAI-compatible chat completions ----

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseFormat {
    JsonSchema { json_schema: JsonSchemaDefinition },
}

#[derive(Serialize)]
struct JsonSchemaDefinition {
    name: &'static str,
    strict: bool,
    schema: Value,
}

#[derive(Deserialize, Debug)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize, Debug)]
struct ReplyMessage {
    content: Option<String>,
    refusal: Option<String>,
}

pub struct OpenAiBackend {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiBackend {
    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

impl CompletionBackend for OpenAiBackend {
    async fn complete(&self, prompt: &ScreeningPrompt) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: &prompt.system },
                ChatMessage { role: "user", content: &prompt.user },
            ],
            temperature: self.temperature,
            response_format: ResponseFormat::JsonSchema {
                json_schema: JsonSchemaDefinition {
                    name: SCHEMA_NAME,
                    strict: true,
                    schema: response_json_schema(),
                },
            },
        };

        let url = format!("{}/chat/completions", self.base_url);
        info!("Sending screening request to {} ({})", url, self.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let body = read_success_body(response).await?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&body).map_err(|e| {
            ScreenerError::SchemaValidation(format!("Unexpected chat completion payload: {}", e))
        })?;

        let message = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or(ScreenerError::EmptyResponse)?;

        if let Some(refusal) = message.refusal.filter(|r| !r.is_empty()) {
            return Err(ScreenerError::SchemaValidation(format!("Model refused: {}", refusal)));
        }

        message
            .content
            .filter(|content| !content.trim().is_empty())
            .ok_or(ScreenerError::EmptyResponse)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ---- Gemini generateContent ----

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
    temperature: f32,
}

#[derive(Deserialize, Debug)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize, Debug)]
struct CandidatePart {
    text: Option<String>,
}

pub struct GeminiBackend {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl GeminiBackend {
    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

impl CompletionBackend for GeminiBackend {
    async fn complete(&self, prompt: &ScreeningPrompt) -> Result<String> {
        let request = GenerateContentRequest {
            system_instruction: Content { role: None, parts: [Part { text: &prompt.system }] },
            contents: [Content { role: Some("user"), parts: [Part { text: &prompt.user }] }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: gemini_response_schema(),
                temperature: self.temperature,
            },
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        info!("Sending screening request to {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let body = read_success_body(response).await?;
        let parsed: GenerateContentResponse = serde_json::from_str(&body).map_err(|e| {
            ScreenerError::SchemaValidation(format!("Unexpected generateContent payload: {}", e))
        })?;

        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or(ScreenerError::EmptyResponse)?;

        let text: String = candidate
            .content
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            debug!("Gemini finish reason: {:?}", candidate.finish_reason);
            return Err(ScreenerError::EmptyResponse);
        }
        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ---- provider selection ----

/// Backend chosen from configuration.
pub enum LlmBackend {
    OpenAi(OpenAiBackend),
    Gemini(GeminiBackend),
}

impl LlmBackend {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config.api_key()?;
        Ok(match config.provider {
            Provider::OpenAi => LlmBackend::OpenAi(OpenAiBackend::new(config, api_key)?),
            Provider::Gemini => LlmBackend::Gemini(GeminiBackend::new(config, api_key)?),
        })
    }
}

impl CompletionBackend for LlmBackend {
    async fn complete(&self, prompt: &ScreeningPrompt) -> Result<String> {
        match self {
            LlmBackend::OpenAi(backend) => backend.complete(prompt).await,
            LlmBackend::Gemini(backend) => backend.complete(prompt).await,
        }
    }

    fn model_name(&self) -> &str {
        match self {
            LlmBackend::OpenAi(backend) => backend.model_name(),
            LlmBackend::Gemini(backend) => backend.model_name(),
        }
    }
}

fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ScreenerError::Configuration(format!("Failed to create HTTP client: {}", e)))
}

async fn read_success_body(response: reqwest::Response) -> Result<String> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        error!("Model service error {}: {}", status, body);
        return Err(ScreenerError::ModelStatus {
            status: status.as_u16(),
            body,
        });
    }

    debug!("Raw model response: {}", body);
    Ok(body)
}
