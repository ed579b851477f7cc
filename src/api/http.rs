// SPDX-License-Identifier: MPL-2.0

//! HTTP client for the gallery backend

use super::{ApiError, CaptureSession, SessionClient, SettingsSource, UploadClient};
use crate::constants::api;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Serialize)]
struct CreateSessionRequest<'a> {
    event_slug: &'a str,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
struct SettingsResponse {
    #[serde(default)]
    default_event_slug: Option<String>,
}

/// Client for the gallery backend's REST API
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-success response into [`ApiError::Status`]
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl SessionClient for BackendClient {
    async fn create_session(&self, event_slug: &str) -> Result<CaptureSession, ApiError> {
        debug!(event_slug, "Creating session");

        let response = self
            .client
            .post(self.url(api::SESSIONS_PATH))
            .json(&CreateSessionRequest { event_slug })
            .send()
            .await?;
        let session: CaptureSession = Self::check(response).await?.json().await?;

        info!(session_id = %session.id, gallery_url = %session.gallery_url, "Session created");
        Ok(session)
    }
}

#[async_trait]
impl UploadClient for BackendClient {
    async fn upload_photo(
        &self,
        data: Vec<u8>,
        filename: &str,
        session_id: Option<&str>,
    ) -> Result<String, ApiError> {
        let size = data.len();
        let part = Part::bytes(data)
            .file_name(filename.to_string())
            .mime_str(api::PHOTO_CONTENT_TYPE)
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let mut form = Form::new().part("file", part);
        if let Some(id) = session_id {
            form = form.text("session_id", id.to_string());
        }

        let response = self
            .client
            .post(self.url(api::PHOTO_UPLOAD_PATH))
            .multipart(form)
            .send()
            .await?;
        let uploaded: UploadResponse = Self::check(response).await?.json().await?;

        info!(filename, size, url = %uploaded.url, "Photo uploaded");
        Ok(uploaded.url)
    }
}

#[async_trait]
impl SettingsSource for BackendClient {
    async fn default_event_slug(&self) -> Option<String> {
        let result = async {
            let response = self.client.get(self.url(api::SETTINGS_PATH)).send().await?;
            let settings: SettingsResponse = Self::check(response).await?.json().await?;
            Ok::<_, ApiError>(settings)
        }
        .await;

        match result {
            Ok(settings) => settings.default_event_slug.filter(|s| !s.is_empty()),
            Err(e) => {
                warn!(error = %e, "Settings lookup failed");
                None
            }
        }
    }
}
