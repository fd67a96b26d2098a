/// Image formats accepted by the upload control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpg,
    Jpeg,
    Png,
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ImageFormat::Jpg => "jpg",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
        };
        write!(f, "{}", s)
    }
}

impl ImageFormat {
    pub const ACCEPTED: [&'static str; 3] = ["jpg", "jpeg", "png"];

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim().to_ascii_lowercase().as_str() {
            "jpg" => Some(ImageFormat::Jpg),
            "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            _ => None,
        }
    }

    /// Format declared by a file name's extension ("lunch.PNG" -> Png)
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        Self::from_extension(ext)
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpg | ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
        }
    }
}

/// Raw bytes of the photo a user uploaded in the current session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub file_name: String,
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    pub fn new(file_name: impl Into<String>, format: ImageFormat, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            format,
            bytes,
        }
    }
}

/// How the data URI labels the image MIME type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MimeLabel {
    /// Every upload is sent as `image/jpeg`, png included
    #[default]
    Jpeg,
    /// The upload's declared format decides the label
    Declared,
}

impl std::str::FromStr for MimeLabel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpeg" => Ok(MimeLabel::Jpeg),
            "declared" => Ok(MimeLabel::Declared),
            other => anyhow::bail!("unknown image MIME label '{}' (expected 'jpeg' or 'declared')", other),
        }
    }
}

/// Base64 text of an uploaded image, ready to embed in a request payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime_type: &'static str,
    pub data: String,
}

impl EncodedImage {
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Outcome of one analysis attempt. Always displayable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisResult {
    Success(String),
    Failure(String),
}

impl AnalysisResult {
    pub const ERROR_PREFIX: &'static str = "Error: ";

    pub fn is_success(&self) -> bool {
        matches!(self, AnalysisResult::Success(_))
    }

    /// Text shown to the user: the completion verbatim, or `Error: <detail>`
    pub fn text(&self) -> String {
        match self {
            AnalysisResult::Success(text) => text.clone(),
            AnalysisResult::Failure(detail) => format!("{}{}", Self::ERROR_PREFIX, detail),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellState {
    Idle,
    ImageLoaded,
    Analyzing,
    ResultShown,
    ErrorShown,
}

impl std::fmt::Display for ShellState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ShellState::Idle => "idle",
            ShellState::ImageLoaded => "image_loaded",
            ShellState::Analyzing => "analyzing",
            ShellState::ResultShown => "result_shown",
            ShellState::ErrorShown => "error_shown",
        };
        write!(f, "{}", s)
    }
}
