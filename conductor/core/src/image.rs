//! Image Types
//!
//! Images move through a session in two shapes: the bytes a user staged for
//! solving, and the reference the solver hands back. Neither is ever
//! inspected here; the core only stores, forwards and (for `data:` URIs)
//! decodes them.

use std::path::Path;
use std::sync::Arc;

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a single staging event
///
/// Every file selection gets a fresh id, so picking the same file twice in a
/// row is still observable as two independent stagings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UploadId(pub u64);

impl std::fmt::Display for UploadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "upload_{}", self.0)
    }
}

/// An uploaded image that has not been solved yet
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StagedImage {
    /// Staging event that produced this image
    pub id: UploadId,
    /// File name as reported by the file picker
    pub name: String,
    /// Raw file contents
    pub data: Arc<[u8]>,
}

impl StagedImage {
    /// Create a staged image
    pub fn new(id: UploadId, name: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            id,
            name: name.into(),
            data: data.into(),
        }
    }

    /// Size in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the file was empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// MIME type guessed from the file name
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        mime_from_name(&self.name)
    }
}

/// Guess an image MIME type from a file name's extension
#[must_use]
pub fn mime_from_name(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}

/// Reference to a solved image, as produced by the solver
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageRef {
    /// An http(s) URL or a `data:` URI
    Url(String),
    /// Inline image bytes
    Bytes {
        /// MIME type of the payload
        mime: String,
        /// Image contents
        data: Vec<u8>,
    },
}

/// Errors decoding an inline image reference
#[derive(Debug, Error)]
pub enum ImageDecodeError {
    /// The URI had no `,` separating header and payload
    #[error("malformed data URI")]
    MalformedDataUri,

    /// The base64 payload did not decode
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl ImageRef {
    /// Whether this is a `data:` URI
    #[must_use]
    pub fn is_data_uri(&self) -> bool {
        matches!(self, Self::Url(url) if url.starts_with("data:"))
    }

    /// Whether this is a remote http(s) URL that has to be fetched
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Url(url) if url.starts_with("http://") || url.starts_with("https://"))
    }

    /// The image bytes, when they are available without a network fetch
    ///
    /// Returns `Ok(None)` for remote URLs.
    ///
    /// # Errors
    ///
    /// Returns an error if a `data:` URI is malformed.
    pub fn inline_bytes(&self) -> Result<Option<Vec<u8>>, ImageDecodeError> {
        match self {
            Self::Bytes { data, .. } => Ok(Some(data.clone())),
            Self::Url(url) => match url.strip_prefix("data:") {
                Some(rest) => decode_data_uri(rest).map(|(_, bytes)| Some(bytes)),
                None => Ok(None),
            },
        }
    }

    /// Short one-line description for transcript rendering
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Bytes { mime, data } => format!("{mime} ({} bytes)", data.len()),
            Self::Url(url) => match url.strip_prefix("data:") {
                Some(rest) => {
                    let header = rest.split(',').next().unwrap_or_default();
                    let mime = header.split(';').next().filter(|m| !m.is_empty());
                    format!("inline {} ({} chars)", mime.unwrap_or("image"), url.len())
                }
                None => url.clone(),
            },
        }
    }
}

/// Split a `data:` URI body (without the scheme) into MIME type and bytes
fn decode_data_uri(rest: &str) -> Result<(String, Vec<u8>), ImageDecodeError> {
    let (header, payload) = rest
        .split_once(',')
        .ok_or(ImageDecodeError::MalformedDataUri)?;

    let mut params = header.split(';');
    let mime = params
        .next()
        .filter(|m| !m.is_empty())
        .unwrap_or("text/plain")
        .to_string();
    let is_base64 = params.any(|p| p.eq_ignore_ascii_case("base64"));

    let bytes = if is_base64 {
        base64::engine::general_purpose::STANDARD.decode(payload.trim())?
    } else {
        payload.as_bytes().to_vec()
    };

    Ok((mime, bytes))
}
