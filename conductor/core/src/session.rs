//! Session State
//!
//! Tracks what the current terminal session knows: whether the user has
//! typed `start`, which image is staged for solving, the last solved image
//! and the last solver error.
//!
//! # Design Philosophy
//!
//! Session state is plain data owned by the Conductor and lent to the
//! interpreter for the duration of one command. It never talks to the solver
//! or the surface itself; it only records outcomes handed to it.

use serde::{Deserialize, Serialize};

use crate::image::{ImageRef, StagedImage, UploadId};
use crate::messages::SessionId;

/// Coarse interpreter state derived from the session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MacroState {
    /// `start` has not been typed yet
    Uninitialized,
    /// Commands are accepted
    Ready,
}

/// Mutable state of one terminal session
#[derive(Clone, Debug)]
pub struct SessionState {
    id: SessionId,
    initialized: bool,
    staged_image: Option<StagedImage>,
    last_solved_image: Option<ImageRef>,
    last_error: Option<String>,
    /// Survives resets so upload ids never repeat within a Conductor
    next_upload: u64,
}

impl SessionState {
    /// Fresh, uninitialized session
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            initialized: false,
            staged_image: None,
            last_solved_image: None,
            last_error: None,
            next_upload: 1,
        }
    }

    /// Session identifier
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Whether `start` has been typed
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether an image is waiting to be solved
    #[must_use]
    pub fn has_staged_image(&self) -> bool {
        self.staged_image.is_some()
    }

    /// Whether a solved image is available for download
    #[must_use]
    pub fn has_solved_image(&self) -> bool {
        self.last_solved_image.is_some()
    }

    /// The staged image
    #[must_use]
    pub fn staged_image(&self) -> Option<&StagedImage> {
        self.staged_image.as_ref()
    }

    /// The last solved image
    #[must_use]
    pub fn last_solved_image(&self) -> Option<&ImageRef> {
        self.last_solved_image.as_ref()
    }

    /// The last solver error
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Uninitialized or Ready
    #[must_use]
    pub fn macro_state(&self) -> MacroState {
        if self.initialized {
            MacroState::Ready
        } else {
            MacroState::Uninitialized
        }
    }

    /// Mark the session started. Idempotent.
    pub fn initialize(&mut self) {
        if !self.initialized {
            tracing::debug!(session_id = %self.id.0, "Session initialized");
        }
        self.initialized = true;
    }

    /// Issue the id for the next staging event
    pub fn next_upload_id(&mut self) -> UploadId {
        let id = UploadId(self.next_upload);
        self.next_upload += 1;
        id
    }

    /// Stage an image, discarding any previous one
    ///
    /// A new upload makes the previous solved image stale, so it is cleared.
    pub fn stage_image(&mut self, image: StagedImage) {
        if let Some(previous) = &self.staged_image {
            tracing::debug!(replaced = %previous.id, "Discarding staged image");
        }
        tracing::debug!(upload = %image.id, name = %image.name, bytes = image.len(), "Image staged");
        self.staged_image = Some(image);
        self.last_solved_image = None;
    }

    /// Record a successful solve of `solved`
    ///
    /// The staged image is only cleared when it is the one that was solved; a
    /// newer upload staged while the solve was running stays staged.
    pub fn record_solve_success(&mut self, image: ImageRef, solved: UploadId) {
        if self.staged_image.as_ref().is_some_and(|s| s.id == solved) {
            self.staged_image = None;
        }
        self.last_solved_image = Some(image);
        self.last_error = None;
    }

    /// Record a failed solve; the staged image is kept for a retry
    pub fn record_solve_failure(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    /// Return to a fresh, uninitialized session
    pub fn reset_session(&mut self) {
        tracing::debug!(session_id = %self.id.0, "Session reset");
        self.initialized = false;
        self.staged_image = None;
        self.last_solved_image = None;
        self.last_error = None;
    }

    /// Serializable summary for surfaces
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id.clone(),
            initialized: self.initialized,
            staged_image: self.staged_image.as_ref().map(|s| s.name.clone()),
            has_solved_image: self.has_solved_image(),
            last_error: self.last_error.clone(),
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// What a surface needs to show in its status bar
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Session identifier
    pub session_id: SessionId,
    /// Whether `start` has been typed
    pub initialized: bool,
    /// Name of the staged file, if any
    pub staged_image: Option<String>,
    /// Whether `download` would succeed
    pub has_solved_image: bool,
    /// Last solver error
    pub last_error: Option<String>,
}
