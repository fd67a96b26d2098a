use anyhow::Result;
use std::sync::Arc;

use crate::models::{AnalysisResult, EncodedImage, MimeLabel};

/// Instruction sent alongside every food photo
pub const FOOD_ANALYSIS_PROMPT: &str = "\
Please analyze this food image and provide:
1. List each food item and its calories
2. Total calories
3. Simple health advice

Format like this:
FOOD ITEMS:
1. [Food Item] - [Calories]
2. [Food Item] - [Calories]

TOTAL CALORIES: [Number]

HEALTH TIPS:
• [Tip 1]
• [Tip 2]
";

/// Trait for multimodal completion services (OpenAI, OpenRouter, etc.)
#[async_trait::async_trait]
pub trait InferenceClient: Send + Sync {
    /// Send the prompt and image, returning the first completion's text unmodified
    async fn complete(&self, prompt: &str, image: &EncodedImage) -> Result<String>;
}

/// Runs one analysis against an inference client and turns every failure
/// into displayable content.
pub struct Analyzer {
    client: Arc<dyn InferenceClient>,
    prompt: String,
    mime_label: MimeLabel,
}

impl Analyzer {
    pub fn new(client: Arc<dyn InferenceClient>, mime_label: MimeLabel) -> Self {
        Self {
            client,
            prompt: FOOD_ANALYSIS_PROMPT.to_string(),
            mime_label,
        }
    }

    pub fn mime_label(&self) -> MimeLabel {
        self.mime_label
    }

    pub async fn analyze(&self, image: &EncodedImage) -> AnalysisResult {
        match self.client.complete(&self.prompt, image).await {
            Ok(text) => {
                log::info!("✅ Analysis complete ({} chars)", text.len());
                AnalysisResult::Success(text)
            }
            Err(e) => {
                log::error!("❌ Analysis failed: {:#}", e);
                AnalysisResult::Failure(format!("{:#}", e))
            }
        }
    }
}
