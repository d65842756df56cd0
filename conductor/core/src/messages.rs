//! Conductor Messages
//!
//! Messages sent from the Conductor to UI surfaces. These are all the ways the
//! session engine can tell a surface what to show or do.
//!
//! # Design Philosophy
//!
//! The Conductor owns the transcript, the session and the solve task. Surfaces
//! are renderers: they draw entries they are sent, show the progress value
//! they are sent, and perform the side effects they are asked to (open a file
//! picker, save an image). This keeps the engine testable headless.

use serde::{Deserialize, Serialize};

use crate::image::ImageRef;
use crate::session::SessionSnapshot;
use crate::tasks::SolveStatus;
use crate::transcript::OutputEntry;

/// Messages from Conductor to UI Surface
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ConductorMessage {
    // ============================================
    // Transcript Messages
    // ============================================
    /// A new transcript entry
    Entry {
        /// The appended entry
        entry: OutputEntry,
    },

    /// The transcript was cleared
    TranscriptReset {
        /// The welcome entry the log now holds, if any
        welcome: Option<OutputEntry>,
    },

    /// The whole transcript, sent when a surface connects
    TranscriptSnapshot {
        /// Entries in order
        entries: Vec<OutputEntry>,
    },

    // ============================================
    // Solve Messages
    // ============================================
    /// Estimated solve progress (0-100)
    Progress {
        /// Percentage
        percent: u8,
    },

    /// Solve task status changed
    SolveState {
        /// New status
        status: SolveStatus,
    },

    // ============================================
    // Side Effects
    // ============================================
    /// Ask the user for an image file
    OpenFilePicker,

    /// Save the solved image
    SaveImage {
        /// Image to save
        image: ImageRef,
        /// Suggested file name
        filename: String,
    },

    /// Clear the input line
    ClearInput,

    // ============================================
    // Control Messages
    // ============================================
    /// Conductor state changed
    State {
        /// New state
        state: ConductorState,
    },

    /// Session summary for the status bar
    SessionInfo {
        /// Snapshot of the session
        session: SessionSnapshot,
    },

    /// Out-of-band notification (not part of the transcript)
    Notify {
        /// Severity
        level: NotifyLevel,
        /// Text
        message: String,
    },

    /// Acknowledge a surface event
    Ack {
        /// The acknowledged event
        event_id: EventId,
    },

    /// Request surface to quit
    Quit {
        /// Optional goodbye message
        message: Option<String>,
    },
}

/// Event identifier (for acks)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

/// Session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a new unique session ID
    ///
    /// Uses an atomic counter combined with timestamp to ensure uniqueness
    /// even when multiple sessions are created in the same millisecond.
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        use std::time::{SystemTime, UNIX_EPOCH};

        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let count = COUNTER.fetch_add(1, Ordering::SeqCst);
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        Self(format!("session_{timestamp}_{count}"))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Notification levels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyLevel {
    /// Informational
    Info,
    /// Warning
    Warning,
    /// Error
    Error,
    /// Success
    Success,
}

/// Conductor operational states
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConductorState {
    /// Starting up, not ready
    Initializing,
    /// Accepting commands
    Ready,
    /// A solve is pending
    Solving,
    /// Shutting down
    ShuttingDown,
}

impl ConductorState {
    /// Human-readable description
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Initializing => "Starting up...",
            Self::Ready => "Ready",
            Self::Solving => "Solving puzzle...",
            Self::ShuttingDown => "Goodbye!",
        }
    }

    /// Whether input is accepted in this state
    #[must_use]
    pub fn accepts_input(&self) -> bool {
        matches!(self, Self::Ready | Self::Solving)
    }
}
