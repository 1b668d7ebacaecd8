//! LLM service for page and transcript chat
//!
//! Thin client over an OpenAI-compatible chat-completions endpoint (Groq by
//! default). All prompts instruct the model to answer strictly from the
//! supplied context; the service never sends a question without grounding.

use crate::config::LlmSettings;
use crate::error::{PagelensError, Result};
use crate::utils::preview;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// LLM client
pub struct LlmService {
    settings: LlmSettings,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

impl LlmService {
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            settings,
            client: reqwest::Client::new(),
        }
    }

    /// Answer a question about the current page, grounded in `context`.
    pub async fn answer_about_page(&self, context: &str, question: &str) -> Result<String> {
        let prompt = format!(
            "You are an AI assistant helping user understand a webpage.\n\
             \n\
             Current Webpage Content:\n\
             ------------------------\n\
             {context}\n\
             \n\
             User Question:\n\
             {question}\n\
             \n\
             Answer clearly and accurately based ONLY on the page content.\n"
        );
        self.call_api(&prompt).await
    }

    /// Answer a question about a video, grounded in timestamped transcript
    /// excerpts.
    pub async fn answer_about_video(&self, excerpts: &str, question: &str) -> Result<String> {
        let prompt = format!(
            "You are an AI assistant answering questions about a video using its transcript.\n\
             \n\
             Transcript excerpts (each prefixed with its timestamp):\n\
             ------------------------\n\
             {excerpts}\n\
             \n\
             User Question:\n\
             {question}\n\
             \n\
             Answer based ONLY on the excerpts. Mention the relevant timestamps when helpful.\n"
        );
        self.call_api(&prompt).await
    }

    /// One door to the completions endpoint.
    async fn call_api(&self, prompt: &str) -> Result<String> {
        if self.settings.api_key.is_empty() {
            return Err(PagelensError::LlmApi(
                "GROQ_API_KEY not set; chat is unavailable".to_string(),
            ));
        }

        debug!(prompt = %preview(prompt, 120), "calling chat completions");

        let request = ChatCompletionRequest {
            model: self.settings.model.clone(),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.settings.api_base))
            .bearer_auth(&self.settings.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PagelensError::LlmApi(format!(
                "completions request failed with {}: {}",
                status,
                preview(&body, 200)
            )));
        }

        let body: ChatCompletionResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| PagelensError::LlmApi("empty completions response".to_string()))
    }
}
