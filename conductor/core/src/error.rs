//! Error Types
//!
//! `CommandError` is what the user reads: its `Display` output is appended to
//! the transcript verbatim as an Error entry. None of these errors ends the
//! session.

use thiserror::Error;

use crate::tasks::TaskId;

/// A command that could not be carried out
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Anything other than `start`/`clear` before `start`
    #[error("Please type 'start' first to initialize.")]
    SessionNotInitialized,

    /// `solve` with nothing staged
    #[error("No image uploaded. Please use the 'upload' command first.")]
    NoStagedImage,

    /// `download` with nothing solved
    #[error("No solved image to download. Please '{}' a puzzle first.", if *.automatic { "upload" } else { "solve" })]
    NoSolvedImage {
        /// Solving starts on upload
        automatic: bool,
    },

    /// Unrecognized input
    #[error("Command not found: {command}. Available commands: {available}")]
    UnknownCommand {
        /// Normalized input
        command: String,
        /// Help list for the current mode
        available: String,
    },

    /// `solve` typed while solving is automatic
    #[error("The 'solve' command is no longer needed. Puzzles are solved automatically after upload.")]
    SolveCommandDeprecated,

    /// Message returned by the solver
    #[error("{0}")]
    SolveFailure(String),

    /// A solve was requested while another is pending
    #[error("A puzzle is already being solved.")]
    ConcurrentSolveRejected,

    /// The selected file had no content
    #[error("Selected file '{name}' is empty.")]
    EmptyUpload {
        /// File name
        name: String,
    },

    /// Input line over the configured limit
    #[error("Input too long ({length} characters, limit {limit}).")]
    InputTooLong {
        /// Length of the line
        length: usize,
        /// Configured limit
        limit: usize,
    },

    /// Selected file over the configured limit
    #[error("Selected file '{name}' is too large ({size} bytes, limit {limit}).")]
    UploadTooLarge {
        /// File name
        name: String,
        /// File size
        size: usize,
        /// Configured limit
        limit: usize,
    },
}

/// Broad error category, used as a tracing field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Session has not been started
    SessionNotInitialized,
    /// A command's precondition was not met
    Precondition,
    /// Input did not name a command
    UnknownCommand,
    /// The solver reported an error
    SolveFailure,
    /// Single-flight rejection
    ConcurrentSolveRejected,
    /// Input or upload failed validation
    InvalidInput,
}

impl ErrorCategory {
    /// Stable lowercase name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SessionNotInitialized => "session_not_initialized",
            Self::Precondition => "precondition",
            Self::UnknownCommand => "unknown_command",
            Self::SolveFailure => "solve_failure",
            Self::ConcurrentSolveRejected => "concurrent_solve_rejected",
            Self::InvalidInput => "invalid_input",
        }
    }
}

impl CommandError {
    /// Category of this error
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::SessionNotInitialized => ErrorCategory::SessionNotInitialized,
            Self::NoStagedImage | Self::NoSolvedImage { .. } | Self::SolveCommandDeprecated => {
                ErrorCategory::Precondition
            }
            Self::UnknownCommand { .. } => ErrorCategory::UnknownCommand,
            Self::SolveFailure(_) => ErrorCategory::SolveFailure,
            Self::ConcurrentSolveRejected => ErrorCategory::ConcurrentSolveRejected,
            Self::EmptyUpload { .. } | Self::InputTooLong { .. } | Self::UploadTooLarge { .. } => {
                ErrorCategory::InvalidInput
            }
        }
    }
}

/// Rejection from the solve orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// Only one solve may be in flight
    #[error("solve task {task_id} is already pending")]
    AlreadyPending {
        /// The task that is still running
        task_id: TaskId,
    },
}

impl From<SubmitError> for CommandError {
    fn from(_: SubmitError) -> Self {
        Self::ConcurrentSolveRejected
    }
}
