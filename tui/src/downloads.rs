//! Saving solved images
//!
//! The Conductor only says *what* to save; writing it somewhere is the
//! surface's side effect. Inline bytes and `data:` URIs are written directly,
//! remote URLs are fetched first.

use std::path::{Path, PathBuf};

use thiserror::Error;

use sudosolve_core::{ImageDecodeError, ImageRef};

/// Why a download failed
#[derive(Debug, Error)]
pub enum SaveError {
    /// The `data:` URI could not be decoded
    #[error("invalid inline image: {0}")]
    Decode(#[from] ImageDecodeError),

    /// Only http(s) and data URLs can be saved
    #[error("unsupported image location: {0}")]
    UnsupportedUrl(String),

    /// Fetching a remote image failed
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        /// URL that was requested
        url: String,
        /// Underlying HTTP error
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with an error status
    #[error("failed to fetch {url}: server returned {status}")]
    Status {
        /// URL that was requested
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// Writing the file failed
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// Destination path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Writes solved images into a download directory
#[derive(Clone, Debug)]
pub struct ImageSaver {
    dir: PathBuf,
    http_client: reqwest::Client,
}

impl ImageSaver {
    /// Saver writing into `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Target directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save `image` as `<dir>/<filename>`, returning the written path
    pub async fn save(&self, image: &ImageRef, filename: &str) -> Result<PathBuf, SaveError> {
        let bytes = match image.inline_bytes()? {
            Some(bytes) => bytes,
            None => self.fetch(image).await?,
        };

        let path = self.dir.join(filename);
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| SaveError::Write {
                path: self.dir.clone(),
                source,
            })?;
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|source| SaveError::Write {
                path: path.clone(),
                source,
            })?;

        tracing::info!(path = %path.display(), bytes = bytes.len(), "Saved solved image");
        Ok(path)
    }

    async fn fetch(&self, image: &ImageRef) -> Result<Vec<u8>, SaveError> {
        let url = match image {
            ImageRef::Url(url) if image.is_remote() => url,
            ImageRef::Url(url) => return Err(SaveError::UnsupportedUrl(url.clone())),
            ImageRef::Bytes { .. } => return Err(SaveError::UnsupportedUrl(image.summary())),
        };

        tracing::debug!(url = %url, "Fetching solved image");
        let fetch_err = |source| SaveError::Fetch {
            url: url.clone(),
            source,
        };
        let response = self.http_client.get(url).send().await.map_err(fetch_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(SaveError::Status {
                url: url.clone(),
                status: status.as_u16(),
            });
        }
        let body = response.bytes().await.map_err(fetch_err)?;
        Ok(body.to_vec())
    }
}
