//! HTTP Solve Backend
//!
//! Talks to a solver web service.
//!
//! # Solver API
//!
//! - `POST /api/solve` - multipart form with the puzzle in field `image`.
//!   Answers `{"solvedImageUrl": string|null, "error": string|null}`, or the
//!   solved image itself with an `image/*` content type.
//! - `GET /` - used as a liveness probe.

use std::time::{Duration, Instant};

use anyhow::{anyhow, Context as _};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use super::traits::{BackendConfig, SolveBackend, SolveRequest};
use crate::image::ImageRef;

/// Body of a solver reply
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SolveResponseBody {
    #[serde(default)]
    solved_image_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP solver client
#[derive(Clone)]
pub struct HttpSolveBackend {
    /// Base URL, without trailing slash
    base_url: String,
    /// HTTP client
    http_client: reqwest::Client,
}

impl HttpSolveBackend {
    /// Create a backend for `base_url`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        })
    }

    /// Create from `BackendConfig`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &BackendConfig) -> anyhow::Result<Self> {
        Self::new(config.url.clone(), config.timeout)
    }

    /// Get the base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get solve endpoint URL
    fn solve_url(&self) -> String {
        format!("{}/api/solve", self.base_url)
    }
}

/// Whole milliseconds, saturating at `u64::MAX`
fn elapsed_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Turn a decoded reply body into the solve result
fn interpret_response(body: SolveResponseBody) -> anyhow::Result<ImageRef> {
    if let Some(error) = body.error.filter(|e| !e.is_empty()) {
        return Err(anyhow!(error));
    }
    match body.solved_image_url.filter(|u| !u.is_empty()) {
        Some(url) => Ok(ImageRef::Url(url)),
        None => Err(anyhow!("Solver returned no image")),
    }
}

#[async_trait]
impl SolveBackend for HttpSolveBackend {
    fn name(&self) -> &'static str {
        "HTTP"
    }

    async fn health_check(&self) -> bool {
        self.http_client
            .get(&self.base_url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .is_ok()
    }

    async fn solve(&self, request: &SolveRequest) -> anyhow::Result<ImageRef> {
        let start = Instant::now();
        let part = Part::bytes(request.image.to_vec())
            .file_name(request.filename.clone())
            .mime_str(request.mime_type)
            .context("Invalid image MIME type")?;
        let form = Form::new().part("image", part);

        tracing::debug!(
            url = %self.solve_url(),
            filename = %request.filename,
            bytes = request.image.len(),
            "Sending solve request"
        );

        let response = self
            .http_client
            .post(self.solve_url())
            .multipart(form)
            .send()
            .await
            .context("Failed to reach solver")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Solver returned {}: {}", status, body));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let result = match content_type {
            Some(mime) if mime.starts_with("image/") => {
                let data = response
                    .bytes()
                    .await
                    .context("Failed to read solved image")?;
                Ok(ImageRef::Bytes {
                    mime,
                    data: data.to_vec(),
                })
            }
            _ => {
                let body: SolveResponseBody = response
                    .json()
                    .await
                    .context("Failed to parse solver response")?;
                interpret_response(body)
            }
        };

        tracing::debug!(
            elapsed_ms = elapsed_ms(start.elapsed()),
            ok = result.is_ok(),
            "Solve request finished"
        );
        result
    }
}
