//! Transcript - The Output Log
//!
//! The transcript is the append-only, ordered record of everything the user
//! sees in the terminal pane: echoed commands, responses, errors and images.
//!
//! # Design Philosophy
//!
//! Entries are immutable once appended. The only way anything leaves the log
//! is a full reset (the `clear` command). Surfaces never own the log; they
//! receive copies of entries through `ConductorMessage::Entry` and may rebuild
//! their view at any time from a `TranscriptSnapshot`.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::image::ImageRef;

/// The canonical greeting shown in a fresh log
pub const WELCOME_MESSAGE: &str = "Welcome to SudoSolve CLI. Type 'start' to begin.";

/// Kind of transcript entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// Echo of a line the user typed
    Command,
    /// Informational reply
    Response,
    /// Error reply
    Error,
    /// A solved image
    Image,
    /// A named renderable the surface knows how to draw
    Component,
}

impl EntryKind {
    /// Short lowercase label, used in logs
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Response => "response",
            Self::Error => "error",
            Self::Image => "image",
            Self::Component => "component",
        }
    }
}

/// Opaque name of a surface-side renderable (e.g. `progress`)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentHandle(pub String);

impl ComponentHandle {
    /// Create a handle
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Component name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Entry payload
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryPayload {
    /// Text for Command, Response and Error entries
    Text(String),
    /// Image reference for Image entries
    Image(ImageRef),
    /// Component handle for Component entries
    Component(ComponentHandle),
}

/// A single line of the transcript
///
/// Constructed through the kind-specific constructors so that kind and
/// payload always agree. `seq` is assigned by [`Transcript::append`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputEntry {
    kind: EntryKind,
    payload: EntryPayload,
    seq: usize,
    timestamp_ms: u64,
}

impl OutputEntry {
    fn text(kind: EntryKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            payload: EntryPayload::Text(text.into()),
            seq: 0,
            timestamp_ms: now_ms(),
        }
    }

    /// Echo of user input
    pub fn command(text: impl Into<String>) -> Self {
        Self::text(EntryKind::Command, text)
    }

    /// Informational reply
    pub fn response(text: impl Into<String>) -> Self {
        Self::text(EntryKind::Response, text)
    }

    /// Error reply
    pub fn error(text: impl Into<String>) -> Self {
        Self::text(EntryKind::Error, text)
    }

    /// Solved image
    #[must_use]
    pub fn image(image: ImageRef) -> Self {
        Self {
            kind: EntryKind::Image,
            payload: EntryPayload::Image(image),
            seq: 0,
            timestamp_ms: now_ms(),
        }
    }

    /// Named component
    #[must_use]
    pub fn component(handle: ComponentHandle) -> Self {
        Self {
            kind: EntryKind::Component,
            payload: EntryPayload::Component(handle),
            seq: 0,
            timestamp_ms: now_ms(),
        }
    }

    /// The canonical welcome entry
    #[must_use]
    pub fn welcome() -> Self {
        Self::response(WELCOME_MESSAGE)
    }

    /// Entry kind
    #[must_use]
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Entry payload
    #[must_use]
    pub fn payload(&self) -> &EntryPayload {
        &self.payload
    }

    /// Text payload, if this is a text entry
    #[must_use]
    pub fn text_content(&self) -> Option<&str> {
        match &self.payload {
            EntryPayload::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Image payload, if this is an image entry
    #[must_use]
    pub fn image_ref(&self) -> Option<&ImageRef> {
        match &self.payload {
            EntryPayload::Image(image) => Some(image),
            _ => None,
        }
    }

    /// Position in the log since the last reset
    #[must_use]
    pub fn seq(&self) -> usize {
        self.seq
    }

    /// Wall-clock append time in milliseconds since the epoch
    #[must_use]
    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Append-only ordered log of [`OutputEntry`]
#[derive(Clone, Debug)]
pub struct Transcript {
    entries: Vec<OutputEntry>,
    welcome_on_reset: bool,
}

impl Transcript {
    /// Create a log, seeded with the welcome entry when `welcome_on_reset` is set
    #[must_use]
    pub fn new(welcome_on_reset: bool) -> Self {
        let mut transcript = Self {
            entries: Vec::new(),
            welcome_on_reset,
        };
        if welcome_on_reset {
            transcript.append(OutputEntry::welcome());
        }
        transcript
    }

    /// Append an entry and return the sequence number it was given
    pub fn append(&mut self, mut entry: OutputEntry) -> usize {
        let seq = self.entries.len();
        entry.seq = seq;
        tracing::trace!(seq, kind = entry.kind.label(), "Transcript append");
        self.entries.push(entry);
        seq
    }

    /// Clear the log
    ///
    /// With `welcome` set the log is left holding exactly the welcome entry,
    /// which is returned so the caller can forward it.
    pub fn reset(&mut self, welcome: bool) -> Option<&OutputEntry> {
        self.entries.clear();
        if welcome {
            self.append(OutputEntry::welcome());
            self.entries.last()
        } else {
            None
        }
    }

    /// Whether resets re-seed the welcome entry
    #[must_use]
    pub fn welcome_on_reset(&self) -> bool {
        self.welcome_on_reset
    }

    /// All entries in append order
    #[must_use]
    pub fn entries(&self) -> &[OutputEntry] {
        &self.entries
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent entry
    #[must_use]
    pub fn last(&self) -> Option<&OutputEntry> {
        self.entries.last()
    }

    /// Entries of one kind, in order
    pub fn iter_kind(&self, kind: EntryKind) -> impl Iterator<Item = &OutputEntry> {
        self.entries.iter().filter(move |e| e.kind == kind)
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new(true)
    }
}
