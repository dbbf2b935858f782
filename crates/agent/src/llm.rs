//! Chat-completion clients behind a single prompt-in, text-out seam.
//!
//! The pipeline only ever needs one completion per stage, so the trait stays
//! deliberately narrow. Client selection prefers OpenAI when both
//! credentials are configured.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sourcing_core::config::LlmConfig;

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Pick the configured model client, OpenAI first. Selection uses the same
/// blank-key-is-absent predicates validation does, so a whitespace-only key
/// never wins over a real one.
pub fn client_from_config(config: &LlmConfig) -> Result<Box<dyn LlmClient>> {
    if config.has_openai() {
        if let Some(api_key) = &config.openai_api_key {
            return Ok(Box::new(OpenAiChatClient::new(
                config.openai_base_url.clone(),
                config.openai_model.clone(),
                api_key.clone(),
                config.timeout_secs,
            )?));
        }
    }
    if config.has_google() {
        if let Some(api_key) = &config.google_api_key {
            return Ok(Box::new(GeminiClient::new(
                config.google_model.clone(),
                api_key.clone(),
                config.timeout_secs,
            )?));
        }
    }
    Err(anyhow!("no model credential configured"))
}

const COMPLETION_TEMPERATURE: f64 = 0.1;

fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()
        .context("failed to build HTTP client")
}

pub struct OpenAiChatClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: SecretString,
}

#[derive(Serialize)]
struct OpenAiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct OpenAiChatRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage<'a>>,
    temperature: f64,
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    content: String,
}

impl OpenAiChatClient {
    pub fn new(
        base_url: String,
        model: String,
        api_key: SecretString,
        timeout_secs: u64,
    ) -> Result<Self> {
        Ok(Self { http: http_client(timeout_secs)?, base_url, model, api_key })
    }
}

#[async_trait]
impl LlmClient for OpenAiChatClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        let request = OpenAiChatRequest {
            model: &self.model,
            messages: vec![OpenAiMessage { role: "user", content: prompt }],
            temperature: COMPLETION_TEMPERATURE,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .context("OpenAI request failed")?
            .error_for_status()
            .context("OpenAI returned an error status")?;

        let body: OpenAiChatResponse =
            response.json().await.context("failed to decode OpenAI response")?;
        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("OpenAI response contained no choices"))
    }
}

pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: SecretString,
}

#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GeminiGenerationConfig {
    temperature: f64,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Deserialize)]
struct GeminiCandidatePart {
    text: String,
}

impl GeminiClient {
    pub fn new(model: String, api_key: SecretString, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            http: http_client(timeout_secs)?,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model,
            api_key,
        })
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let request = GeminiRequest {
            contents: vec![GeminiContent { parts: vec![GeminiPart { text: prompt }] }],
            generation_config: GeminiGenerationConfig { temperature: COMPLETION_TEMPERATURE },
        };

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.expose_secret())])
            .json(&request)
            .send()
            .await
            .context("Gemini request failed")?
            .error_for_status()
            .context("Gemini returned an error status")?;

        let body: GeminiResponse =
            response.json().await.context("failed to decode Gemini response")?;
        body.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| anyhow!("Gemini response contained no candidates"))
    }
}
