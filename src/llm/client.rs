use crate::config::LlmConfig;
use crate::error::{AppError, Result};
use crate::llm::parse::parse_rankings;
use crate::llm::ExternalPredictor;
use crate::models::{ClinicCatalog, Prediction};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// External predictor backed by an OpenAI-compatible chat completion API
pub struct ChatCompletionPredictor {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
}

impl ChatCompletionPredictor {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            temperature,
        })
    }

    /// Build from configuration, reading the API key from the named env var
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = match &config.api_key_env {
            Some(var) => match std::env::var(var) {
                Ok(key) => Some(key),
                Err(_) => {
                    warn!(env = %var, "LLM API key variable is not set");
                    None
                }
            },
            None => None,
        };

        Self::new(
            config.endpoint.clone(),
            config.model.clone(),
            api_key,
            config.temperature,
            Duration::from_millis(config.timeout_ms),
        )
    }

    fn system_prompt(catalog: &ClinicCatalog) -> String {
        let clinics = catalog
            .labels()
            .iter()
            .map(|l| format!("- {} ({})", l.id, l.name))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "You are a hospital triage assistant. Rank the clinics below for the \
             patient's complaint. Answer with JSON only, in the form \
             {{\"rankings\":[{{\"clinic\":\"<id>\",\"confidence\":<0..1>}}]}}.\n\
             Clinics:\n{}",
            clinics
        )
    }

    async fn complete(&self, text: &str, catalog: &ClinicCatalog) -> Result<String> {
        let url = format!("{}/chat/completions", self.endpoint);
        let body = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: Self::system_prompt(catalog),
                },
                ChatMessage {
                    role: "user",
                    content: text.to_string(),
                },
            ],
        };

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(AppError::External {
                predictor: self.name().to_string(),
                message: format!("API returned error: {}", response.status()),
            });
        }

        let chat: ChatResponse = response.json().await?;
        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AppError::External {
                predictor: self.name().to_string(),
                message: "response has no message content".to_string(),
            })
    }
}

#[async_trait]
impl ExternalPredictor for ChatCompletionPredictor {
    fn name(&self) -> &str {
        "chat_completion"
    }

    async fn predict(&self, text: &str, catalog: &ClinicCatalog) -> Result<Prediction> {
        let content = self.complete(text, catalog).await?;
        debug!(model = %self.model, bytes = content.len(), "LLM answered");
        parse_rankings(&content, catalog)
    }
}
