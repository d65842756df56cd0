//! Reading image files for upload
//!
//! The file prompt accepts any path, so the read is bounded: special files
//! such as `/dev/zero` and anything over the upload limit are refused before
//! their bytes reach memory.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::io::AsyncReadExt;

/// Why a typed path could not be uploaded
#[derive(Debug, Error)]
pub enum ReadError {
    /// Directories, devices and pipes
    #[error("{} is not a regular file", path.display())]
    NotAFile {
        /// Path that was typed
        path: PathBuf,
    },

    /// Bigger than the configured upload limit
    #[error("{} is too large ({size} bytes, limit {limit})", path.display())]
    TooLarge {
        /// Path that was typed
        path: PathBuf,
        /// Size seen so far
        size: u64,
        /// Configured limit
        limit: u64,
    },

    /// Opening or reading failed
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// Path that was typed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Read the file at `path`, refusing anything over `limit` bytes
pub async fn read_image_file(path: &Path, limit: usize) -> Result<Vec<u8>, ReadError> {
    let limit = u64::try_from(limit).unwrap_or(u64::MAX);
    let io_err = |source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    };

    let metadata = tokio::fs::metadata(path).await.map_err(io_err)?;
    if !metadata.is_file() {
        return Err(ReadError::NotAFile {
            path: path.to_path_buf(),
        });
    }
    if metadata.len() > limit {
        return Err(ReadError::TooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            limit,
        });
    }

    // The file may grow between the stat and the read
    let file = tokio::fs::File::open(path).await.map_err(io_err)?;
    let mut data = Vec::new();
    file.take(limit.saturating_add(1))
        .read_to_end(&mut data)
        .await
        .map_err(io_err)?;

    let size = u64::try_from(data.len()).unwrap_or(u64::MAX);
    if size > limit {
        return Err(ReadError::TooLarge {
            path: path.to_path_buf(),
            size,
            limit,
        });
    }
    Ok(data)
}
