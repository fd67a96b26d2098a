pub mod ai_service; // Inference client seam + analyzer
pub mod encoder;
pub mod openai; // OpenAI chat completions

pub use ai_service::{Analyzer, InferenceClient};
pub use encoder::prepare_image;
pub use openai::OpenAiService;
