//! Surface Events
//!
//! Events sent from UI surfaces to the Conductor: typed lines, file picker
//! results, side-effect failures and connection changes.
//!
//! # Design Philosophy
//!
//! Surfaces report what happened, never what it means. A surface does not
//! know whether `solve` is legal right now; it forwards the line and renders
//! whatever the Conductor answers.

use serde::{Deserialize, Serialize};

use crate::messages::EventId;

/// Events from UI Surface to Conductor
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum SurfaceEvent {
    // ============================================
    // Connection Events
    // ============================================
    /// Surface connected to Conductor
    Connected {
        /// Event ID for acknowledgment
        event_id: EventId,
        /// Surface type identifier
        surface_type: SurfaceType,
        /// Surface capabilities
        capabilities: SurfaceCapabilities,
    },

    /// Surface disconnecting
    Disconnected {
        /// Event ID for acknowledgment
        event_id: EventId,
        /// Reason for disconnect
        reason: Option<String>,
    },

    // ============================================
    // Input Events
    // ============================================
    /// User submitted a line
    Input {
        /// Event ID for acknowledgment
        event_id: EventId,
        /// The line as typed
        line: String,
    },

    /// User picked a file after `OpenFilePicker`
    FileSelected {
        /// Event ID for acknowledgment
        event_id: EventId,
        /// File name (no directory)
        name: String,
        /// File contents
        data: Vec<u8>,
    },

    /// User dismissed the file picker
    FilePickerCancelled {
        /// Event ID for acknowledgment
        event_id: EventId,
    },

    // ============================================
    // Side-Effect Results
    // ============================================
    /// A `SaveImage` request failed
    SaveFailed {
        /// Event ID for acknowledgment
        event_id: EventId,
        /// What went wrong
        error: String,
    },

    // ============================================
    // Control Events
    // ============================================
    /// User requested quit
    QuitRequested {
        /// Event ID for acknowledgment
        event_id: EventId,
    },

    /// Surface encountered an error
    SurfaceError {
        /// Event ID for acknowledgment
        event_id: EventId,
        /// Error description
        error: String,
        /// Whether the surface can recover
        recoverable: bool,
    },
}

impl SurfaceEvent {
    /// Generate a new event ID for this event
    pub fn new_event_id() -> EventId {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        EventId(format!("evt_{id}"))
    }

    /// Get the event ID
    pub fn event_id(&self) -> &EventId {
        match self {
            Self::Connected { event_id, .. }
            | Self::Disconnected { event_id, .. }
            | Self::Input { event_id, .. }
            | Self::FileSelected { event_id, .. }
            | Self::FilePickerCancelled { event_id }
            | Self::SaveFailed { event_id, .. }
            | Self::QuitRequested { event_id }
            | Self::SurfaceError { event_id, .. } => event_id,
        }
    }

    /// Convenience constructor for a typed line
    pub fn input(line: impl Into<String>) -> Self {
        Self::Input {
            event_id: Self::new_event_id(),
            line: line.into(),
        }
    }

    /// Convenience constructor for a picked file
    pub fn file_selected(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self::FileSelected {
            event_id: Self::new_event_id(),
            name: name.into(),
            data,
        }
    }
}

/// Type of UI surface
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceType {
    /// Terminal UI
    Tui,
    /// Headless (testing, automation)
    Headless,
    /// Custom surface
    Custom(String),
}

impl SurfaceType {
    /// Display name
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Tui => "TUI",
            Self::Headless => "Headless",
            Self::Custom(name) => name,
        }
    }
}

/// What a surface can do
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct SurfaceCapabilities {
    /// Can display colored text
    pub color: bool,
    /// Can display images inline
    pub images: bool,
    /// Can prompt the user for a file
    pub file_picker: bool,
    /// Can handle keyboard input
    pub keyboard_input: bool,
}

impl SurfaceCapabilities {
    /// Capabilities of the terminal surface
    pub fn tui() -> Self {
        Self {
            color: true,
            images: false,
            file_picker: true,
            keyboard_input: true,
        }
    }

    /// Minimal capabilities for headless/testing
    pub fn headless() -> Self {
        Self {
            color: false,
            images: false,
            file_picker: true,
            keyboard_input: true,
        }
    }
}

impl Default for SurfaceCapabilities {
    fn default() -> Self {
        Self::headless()
    }
}
