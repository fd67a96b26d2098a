use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};
use std::sync::Arc;

use crate::handlers::SessionStore;
use crate::models::{ImageFormat, UploadedImage};
use crate::services::Analyzer;

// Page rendering
pub mod page;

/// Upload refused before it reaches a session
#[derive(Debug)]
pub struct UploadRejection {
    pub status: axum::http::StatusCode,
    pub message: String,
}

impl UploadRejection {
    fn new(status: axum::http::StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// Read the `file` field of the upload form, accepting only jpg, jpeg and png
pub async fn read_upload(
    multipart: &mut axum::extract::Multipart,
) -> Result<UploadedImage, UploadRejection> {
    use axum::http::StatusCode;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        log::error!("❌ Failed to read multipart field: {}", e);
        UploadRejection::new(e.status(), format!("Failed to read upload: {}", e.body_text()))
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        if file_name.is_empty() {
            return Err(UploadRejection::new(StatusCode::BAD_REQUEST, "Please choose an image to upload."));
        }

        let Some(format) = ImageFormat::from_file_name(&file_name) else {
            log::warn!("⚠️ Rejected upload with unsupported type: {}", file_name);
            return Err(UploadRejection::new(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                format!(
                    "'{}' is not a supported image. Please upload a jpg, jpeg, or png file.",
                    file_name
                ),
            ));
        };

        let bytes = field.bytes().await.map_err(|e| {
            log::error!("❌ Failed to read file bytes: {}", e);
            UploadRejection::new(e.status(), format!("Failed to read upload: {}", e.body_text()))
        })?;

        if bytes.is_empty() {
            return Err(UploadRejection::new(StatusCode::BAD_REQUEST, "The uploaded file is empty."));
        }

        return Ok(UploadedImage::new(file_name, format, bytes.to_vec()));
    }

    Err(UploadRejection::new(StatusCode::BAD_REQUEST, "Please choose an image to upload."))
}

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
    pub sessions: Arc<SessionStore>,
    cookie_key: Key,
}

impl AppState {
    pub fn new(analyzer: Arc<Analyzer>, sessions: Arc<SessionStore>, secret: &[u8]) -> Self {
        Self {
            analyzer,
            sessions,
            cookie_key: cookie_key(secret),
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Signing key for the session cookie. SHA-512 stretches secrets of any
/// length to the 64 bytes the key needs.
fn cookie_key(secret: &[u8]) -> Key {
    Key::from(Sha512::digest(secret).as_slice())
}

pub mod server {
    use super::*;
    use crate::handlers::{OpenSession, SESSION_COOKIE};
    use axum::{
        extract::{DefaultBodyLimit, Multipart, State},
        http::{header, StatusCode},
        response::{Html, IntoResponse, Redirect, Response},
        routing::{get, post},
        Router,
    };
    use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
    use tower_http::services::ServeDir;

    pub fn create_router(state: AppState, max_upload_bytes: usize, static_dir: &str) -> Router {
        Router::new()
            .route("/", get(index_handler))
            .route("/upload", post(upload_handler))
            .route("/analyze", post(analyze_handler))
            .route("/image", get(image_handler))
            .route("/health", get(health_check))
            .nest_service("/static", ServeDir::new(static_dir))
            .layer(DefaultBodyLimit::max(max_upload_bytes))
            .with_state(state)
    }

    /// Session named by a verified cookie; forged or missing cookies start a new one
    async fn open_session(state: &AppState, jar: SignedCookieJar) -> (SignedCookieJar, OpenSession) {
        let id = jar.get(SESSION_COOKIE).map(|cookie| cookie.value().to_owned());
        let opened = state.sessions.open(id.as_deref()).await;

        let jar = if opened.is_new {
            jar.add(
                Cookie::build((SESSION_COOKIE, opened.id.clone()))
                    .path("/")
                    .http_only(true)
                    .same_site(SameSite::Lax),
            )
        } else {
            jar
        };

        (jar, opened)
    }

    async fn index_handler(State(state): State<AppState>, jar: SignedCookieJar) -> Response {
        let (jar, opened) = open_session(&state, jar).await;
        let view = opened.session.lock().await.view();
        (jar, Html(page::render(&view, None))).into_response()
    }

    async fn upload_handler(
        State(state): State<AppState>,
        jar: SignedCookieJar,
        mut multipart: Multipart,
    ) -> Response {
        let (jar, opened) = open_session(&state, jar).await;

        match read_upload(&mut multipart).await {
            Ok(image) => {
                opened.session.lock().await.upload(image);
                (jar, Redirect::to("/")).into_response()
            }
            Err(rejection) => {
                let view = opened.session.lock().await.view();
                (
                    rejection.status,
                    jar,
                    Html(page::render(&view, Some(&rejection.message))),
                )
                    .into_response()
            }
        }
    }

    async fn analyze_handler(State(state): State<AppState>, jar: SignedCookieJar) -> Response {
        let (jar, opened) = open_session(&state, jar).await;

        // Held across the call: one analysis at a time per session
        let mut session = opened.session.lock().await;
        let outcome = session.calculate_calories(&state.analyzer).await;
        log::info!("🍽️ Calculate Calories finished in state {}", outcome);
        drop(session);

        (jar, Redirect::to("/")).into_response()
    }

    async fn image_handler(State(state): State<AppState>, jar: SignedCookieJar) -> Response {
        let (jar, opened) = open_session(&state, jar).await;
        let session = opened.session.lock().await;

        let response = match session.image() {
            Some(image) => (
                jar,
                [
                    (header::CONTENT_TYPE, image.format.mime_type()),
                    (header::CACHE_CONTROL, "no-store"),
                ],
                image.bytes.clone(),
            )
                .into_response(),
            None => (StatusCode::NOT_FOUND, jar, "No image uploaded").into_response(),
        };
        drop(session);

        response
    }

    async fn health_check() -> &'static str {
        "OK"
    }
}
