use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::ai_service::InferenceClient;
use crate::models::EncodedImage;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ContentPart {
    Text {
        #[serde(rename = "type")]
        content_type: String,
        text: String,
    },
    ImageUrl {
        #[serde(rename = "type")]
        content_type: String,
        image_url: ImageData,
    },
}

#[derive(Debug, Serialize)]
struct ImageData {
    url: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    content: Option<String>,
}

/// Chat completions client for OpenAI-compatible endpoints
pub struct OpenAiService {
    api_key: Option<String>,
    model: String,
    base_url: String,
    max_tokens: Option<u32>,
    client: reqwest::Client,
}

impl OpenAiService {
    pub fn new(api_key: Option<String>, model: String, base_url: String, max_tokens: Option<u32>) -> Self {
        Self {
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_tokens,
            client: reqwest::Client::new(),
        }
    }

    fn build_request(&self, prompt: &str, image: &EncodedImage) -> ChatRequest {
        let messages = vec![ChatMessage {
            role: "user".to_string(),
            content: vec![
                ContentPart::Text {
                    content_type: "text".to_string(),
                    text: prompt.to_string(),
                },
                ContentPart::ImageUrl {
                    content_type: "image_url".to_string(),
                    image_url: ImageData {
                        url: image.data_uri(),
                    },
                },
            ],
        }];

        ChatRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.max_tokens,
        }
    }
}

#[async_trait::async_trait]
impl InferenceClient for OpenAiService {
    async fn complete(&self, prompt: &str, image: &EncodedImage) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .context("OPENAI_API_KEY is not set")?;

        let request = self.build_request(prompt, image);

        log::info!("🤖 Sending request to OpenAI with model: {}", self.model);
        log::debug!("📤 Request payload size: {} bytes", serde_json::to_string(&request)?.len());

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        log::debug!("📥 OpenAI response status: {}", status);

        if !status.is_success() {
            let error_text = response.text().await?;
            log::error!("❌ OpenAI API error response: {}", error_text);
            anyhow::bail!("OpenAI API error ({}): {}", status, error_text);
        }

        let response_text = response.text().await?;
        log::debug!("📄 Raw OpenAI response size: {} bytes", response_text.len());

        let chat_response: ChatResponse =
            serde_json::from_str(&response_text).context("malformed completion response")?;

        chat_response
            .choices
            .into_iter()
            .next()
            .context("completion response contained no choices")?
            .message
            .content
            .context("completion message had no content")
    }
}
