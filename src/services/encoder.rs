use base64::{engine::general_purpose, Engine};

use crate::models::{EncodedImage, MimeLabel, UploadedImage};

/// Convert an uploaded image to base64 for the completion request.
/// Returns `None` when there is no image.
pub fn prepare_image(image: Option<&UploadedImage>, label: MimeLabel) -> Option<EncodedImage> {
    let image = image?;

    let mime_type = match label {
        MimeLabel::Jpeg => "image/jpeg",
        MimeLabel::Declared => image.format.mime_type(),
    };

    let data = general_purpose::STANDARD.encode(&image.bytes);
    log::debug!(
        "🔄 Encoded {} ({} bytes) to {} base64 chars as {}",
        image.file_name,
        image.bytes.len(),
        data.len(),
        mime_type
    );

    Some(EncodedImage { mime_type, data })
}
