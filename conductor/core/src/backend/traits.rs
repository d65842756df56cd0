//! Solve Backend Traits
//!
//! Trait definitions for the puzzle solver. The Conductor only ever sees
//! `SolveBackend`; where the solving actually happens (a web service, a
//! local process, a test double) is an adapter detail.
//!
//! # Design Philosophy
//!
//! The backend is a black box with one operation: bytes in, image reference
//! or error message out. It is never asked about progress and cannot be
//! cancelled; the Conductor estimates progress on its own.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::image::{mime_from_name, ImageRef, StagedImage};

/// Default solver address
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3000";

/// A request to solve one image
#[derive(Clone, Debug)]
pub struct SolveRequest {
    /// Original file name
    pub filename: String,
    /// MIME type guessed from the file name
    pub mime_type: &'static str,
    /// Image contents
    pub image: Arc<[u8]>,
}

impl SolveRequest {
    /// Create a request for raw bytes
    pub fn new(filename: impl Into<String>, image: impl Into<Arc<[u8]>>) -> Self {
        let filename = filename.into();
        Self {
            mime_type: mime_from_name(&filename),
            filename,
            image: image.into(),
        }
    }

    /// Create a request for a staged image without copying its bytes
    #[must_use]
    pub fn from_staged(staged: &StagedImage) -> Self {
        Self {
            filename: staged.name.clone(),
            mime_type: staged.mime_type(),
            image: Arc::clone(&staged.data),
        }
    }
}

/// Solve backend trait
///
/// Implement this trait to plug in a different solver.
#[async_trait]
pub trait SolveBackend: Send + Sync {
    /// Backend name, for logs and the status bar
    fn name(&self) -> &str;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Solve a puzzle image
    ///
    /// The error's `Display` text is shown to the user verbatim, so adapters
    /// should return the solver's own message where there is one.
    async fn solve(&self, request: &SolveRequest) -> anyhow::Result<ImageRef>;
}

/// Backend connection configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendConfig {
    /// Base URL of the solver service
    pub url: String,
    /// Request timeout for a solve
    pub timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_BACKEND_URL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}
