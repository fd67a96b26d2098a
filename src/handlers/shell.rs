use chrono::{DateTime, Utc};

use crate::models::{AnalysisResult, ShellState, UploadedImage};
use crate::services::{prepare_image, Analyzer};

pub const SUCCESS_NOTICE: &str = "Analysis Complete!";
pub const MISSING_IMAGE_MESSAGE: &str = "Please upload an image first!";

/// Banner shown above the analysis output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    Success(String),
    Error(String),
}

/// Everything the page needs to render one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub image_name: Option<String>,
    pub banner: Option<Banner>,
    pub body: Option<String>,
}

/// One user's interaction with the calorie advisor: the uploaded image,
/// the last analysis and the state they put the page in.
#[derive(Debug)]
pub struct Session {
    state: ShellState,
    image: Option<UploadedImage>,
    result: Option<AnalysisResult>,
    error: Option<String>,
    last_seen: DateTime<Utc>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: ShellState::Idle,
            image: None,
            result: None,
            error: None,
            last_seen: Utc::now(),
        }
    }

    pub fn state(&self) -> ShellState {
        self.state
    }

    pub fn image(&self) -> Option<&UploadedImage> {
        self.image.as_ref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn last_seen(&self) -> DateTime<Utc> {
        self.last_seen
    }

    pub fn touch(&mut self) {
        self.last_seen = Utc::now();
    }

    /// A new upload replaces the previous image and discards any analysis.
    pub fn upload(&mut self, image: UploadedImage) {
        log::info!(
            "📸 Image uploaded: {} ({}, {} bytes)",
            image.file_name,
            image.format,
            image.bytes.len()
        );
        self.image = Some(image);
        self.result = None;
        self.error = None;
        self.state = ShellState::ImageLoaded;
        self.touch();
    }

    /// The "Calculate Calories" action. Never calls the analyzer without an image.
    pub async fn calculate_calories(&mut self, analyzer: &Analyzer) -> ShellState {
        self.touch();
        self.state = ShellState::Analyzing;

        let Some(encoded) = prepare_image(self.image.as_ref(), analyzer.mime_label()) else {
            log::warn!("⚠️ Analysis triggered without an image");
            self.result = None;
            self.error = Some(MISSING_IMAGE_MESSAGE.to_string());
            self.state = ShellState::ErrorShown;
            return self.state;
        };

        let result = analyzer.analyze(&encoded).await;
        self.state = match &result {
            AnalysisResult::Success(_) => ShellState::ResultShown,
            AnalysisResult::Failure(_) => ShellState::ErrorShown,
        };
        self.error = None;
        self.result = Some(result);
        self.touch();

        self.state
    }

    pub fn view(&self) -> SessionView {
        let (banner, body) = match (self.state, &self.result, &self.error) {
            (ShellState::ErrorShown, _, Some(message)) => (Some(Banner::Error(message.clone())), None),
            (ShellState::ErrorShown, Some(result), None) => (Some(Banner::Error(result.text())), None),
            (ShellState::ResultShown, Some(result), _) => (
                Some(Banner::Success(SUCCESS_NOTICE.to_string())),
                Some(result.text()),
            ),
            _ => (None, None),
        };

        SessionView {
            image_name: self.image.as_ref().map(|i| i.file_name.clone()),
            banner,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImageFormat, MimeLabel};
    use crate::services::ai_service::testing::FakeInferenceClient;
    use std::sync::Arc;

    fn analyzer(client: &Arc<FakeInferenceClient>) -> Analyzer {
        Analyzer::new(client.clone(), MimeLabel::Jpeg)
    }

    fn jpeg() -> UploadedImage {
        UploadedImage::new("apple.jpg", ImageFormat::Jpg, vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10])
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = Session::new();
        assert_eq!(session.state(), ShellState::Idle);
        assert_eq!(session.view().banner, None);
        assert_eq!(session.view().image_name, None);
    }

    #[tokio::test]
    async fn test_upload_without_trigger_makes_no_call() {
        let client = Arc::new(FakeInferenceClient::replying("unused"));
        let _analyzer = analyzer(&client);
        let mut session = Session::new();

        session.upload(UploadedImage::new("dummy.png", ImageFormat::Png, vec![0u8; 10]));

        assert_eq!(session.state(), ShellState::ImageLoaded);
        assert_eq!(session.view().image_name.as_deref(), Some("dummy.png"));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_successful_analysis_shows_exact_text() {
        let reply = "FOOD ITEMS:\n1. Apple - 95\nTOTAL CALORIES: 95";
        let client = Arc::new(FakeInferenceClient::replying(reply));
        let mut session = Session::new();

        session.upload(jpeg());
        let state = session.calculate_calories(&analyzer(&client)).await;

        assert_eq!(state, ShellState::ResultShown);
        let view = session.view();
        assert_eq!(view.banner, Some(Banner::Success("Analysis Complete!".to_string())));
        assert_eq!(view.body.as_deref(), Some(reply));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_connection_error_shows_error_text() {
        let client = Arc::new(FakeInferenceClient::failing("connection refused"));
        let mut session = Session::new();

        session.upload(jpeg());
        let state = session.calculate_calories(&analyzer(&client)).await;

        assert_eq!(state, ShellState::ErrorShown);
        assert_eq!(
            session.view().banner,
            Some(Banner::Error("Error: connection refused".to_string()))
        );
        assert_eq!(session.view().body, None);
    }

    #[tokio::test]
    async fn test_trigger_without_image_makes_no_call() {
        let client = Arc::new(FakeInferenceClient::replying("unused"));
        let mut session = Session::new();

        let state = session.calculate_calories(&analyzer(&client)).await;

        assert_eq!(state, ShellState::ErrorShown);
        assert_eq!(
            session.view().banner,
            Some(Banner::Error("Please upload an image first!".to_string()))
        );
        assert_eq!(session.result(), None);
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_new_upload_discards_previous_result() {
        let client = Arc::new(FakeInferenceClient::replying("TOTAL CALORIES: 95"));
        let mut session = Session::new();

        session.upload(jpeg());
        session.calculate_calories(&analyzer(&client)).await;
        assert!(session.result().is_some());

        session.upload(UploadedImage::new("pizza.png", ImageFormat::Png, vec![1, 2, 3]));

        assert_eq!(session.state(), ShellState::ImageLoaded);
        assert_eq!(session.result(), None);
        assert_eq!(session.view().banner, None);
        assert_eq!(session.image().map(|i| i.file_name.as_str()), Some("pizza.png"));
    }

    #[tokio::test]
    async fn test_retrigger_after_error_recovers() {
        let failing = Arc::new(FakeInferenceClient::failing("quota exceeded"));
        let working = Arc::new(FakeInferenceClient::replying("TOTAL CALORIES: 300"));
        let mut session = Session::new();

        session.upload(jpeg());
        assert_eq!(session.calculate_calories(&analyzer(&failing)).await, ShellState::ErrorShown);
        assert_eq!(session.calculate_calories(&analyzer(&working)).await, ShellState::ResultShown);
        assert_eq!(session.view().body.as_deref(), Some("TOTAL CALORIES: 300"));
    }

    #[tokio::test]
    async fn test_png_sent_with_jpeg_label() {
        let client = Arc::new(FakeInferenceClient::replying("ok"));
        let mut session = Session::new();

        session.upload(UploadedImage::new("salad.png", ImageFormat::Png, vec![0x89, 0x50]));
        session.calculate_calories(&analyzer(&client)).await;

        let sent = client.last_image().unwrap();
        assert!(sent.data_uri().starts_with("data:image/jpeg;base64,"));
    }
}
