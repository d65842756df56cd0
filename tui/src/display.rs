//! Display State Types
//!
//! Types that represent the current display state for the TUI.
//! These are derived from ConductorMessages and used for rendering.
//!
//! # Design Philosophy
//!
//! The TUI is a "thin client" - it just renders what the Conductor tells it to.
//! Display state is the bridge between ConductorMessages and rendering, and it
//! holds no ratatui types so it can be tested without a terminal.
//!
//! - DisplayEntry: A rendered transcript entry
//! - DisplayState: Everything the frame needs (entries, progress, status)

use sudosolve_core::{
    ConductorMessage, ConductorState, EntryKind, EntryPayload, ImageRef, NotifyLevel,
    OutputEntry, SessionSnapshot, SolveStatus,
};

/// Label shown on the progress gauge
pub const PROGRESS_LABEL: &str = "Processing...";

/// How the input line is currently used
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    /// Typing commands at the `$ ` prompt
    Command,
    /// Typing the path of an image to upload
    FilePicker,
}

impl InputMode {
    /// Prompt drawn before the input buffer
    pub fn prompt(&self) -> &'static str {
        match self {
            Self::Command => "$ ",
            Self::FilePicker => "Select image file: ",
        }
    }
}

/// A rendered transcript entry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayEntry {
    /// Entry kind (drives prefix and color)
    pub kind: EntryKind,
    /// Text to draw after the prefix
    pub content: String,
}

impl DisplayEntry {
    /// Build the display form of a transcript entry
    pub fn from_entry(entry: &OutputEntry) -> Self {
        let content = match entry.payload() {
            EntryPayload::Text(text) => text.clone(),
            EntryPayload::Image(image) => image.summary(),
            EntryPayload::Component(handle) => handle.name().to_string(),
        };
        Self {
            kind: entry.kind(),
            content,
        }
    }

    /// Prefix drawn before the content
    pub fn prefix(&self) -> &'static str {
        match self.kind {
            EntryKind::Command => "$ ",
            EntryKind::Response => "",
            EntryKind::Error => "Error: ",
            EntryKind::Image => "[image] ",
            EntryKind::Component => "[component] ",
        }
    }

    /// Wrap `prefix + content` to `width` columns
    pub fn wrapped(&self, width: usize) -> Vec<String> {
        let full = format!("{}{}", self.prefix(), self.content);
        textwrap::wrap(&full, width.max(1))
            .into_iter()
            .map(|line| line.into_owned())
            .collect()
    }
}

/// A notification to display in the status bar
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayNotification {
    /// Notification level
    pub level: NotifyLevel,
    /// Message content
    pub message: String,
}

/// Side effect the Conductor asked the surface to perform
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SurfaceRequest {
    /// Switch the input line into the file prompt
    OpenFilePicker,
    /// Write the solved image to disk
    SaveImage {
        /// Image to save
        image: ImageRef,
        /// File name inside the download directory
        filename: String,
    },
    /// Empty the input buffer
    ClearInput,
    /// Leave the event loop
    Quit {
        /// Optional goodbye message
        message: Option<String>,
    },
}

/// The full display state for the TUI
#[derive(Debug)]
pub struct DisplayState {
    /// Transcript entries in order
    pub entries: Vec<DisplayEntry>,
    /// Latest progress value (0-100)
    pub progress: u8,
    /// Latest solve status
    pub solve_status: SolveStatus,
    /// Conductor state
    pub conductor_state: ConductorState,
    /// Session summary for the status bar
    pub session: Option<SessionSnapshot>,
    /// Pending notification (if any)
    pub notification: Option<DisplayNotification>,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            progress: 0,
            solve_status: SolveStatus::Idle,
            conductor_state: ConductorState::Initializing,
            session: None,
            notification: None,
        }
    }
}

impl DisplayState {
    /// Create a new display state
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a ConductorMessage to update display state
    ///
    /// Messages that ask for a side effect rather than a redraw are handed
    /// back to the caller.
    pub fn apply_message(&mut self, msg: ConductorMessage) -> Option<SurfaceRequest> {
        match msg {
            // Transcript
            ConductorMessage::Entry { entry } => {
                self.entries.push(DisplayEntry::from_entry(&entry));
            }
            ConductorMessage::TranscriptReset { welcome } => {
                self.entries.clear();
                self.entries
                    .extend(welcome.as_ref().map(DisplayEntry::from_entry));
            }
            ConductorMessage::TranscriptSnapshot { entries } => {
                self.entries = entries.iter().map(DisplayEntry::from_entry).collect();
            }

            // Solve
            ConductorMessage::Progress { percent } => {
                self.progress = percent.min(100);
            }
            ConductorMessage::SolveState { status } => {
                self.solve_status = status;
            }

            // Side effects
            ConductorMessage::OpenFilePicker => return Some(SurfaceRequest::OpenFilePicker),
            ConductorMessage::SaveImage { image, filename } => {
                return Some(SurfaceRequest::SaveImage { image, filename });
            }
            ConductorMessage::ClearInput => return Some(SurfaceRequest::ClearInput),

            // Control
            ConductorMessage::State { state } => {
                self.conductor_state = state;
            }
            ConductorMessage::SessionInfo { session } => {
                self.session = Some(session);
            }
            ConductorMessage::Notify { level, message } => {
                self.notification = Some(DisplayNotification { level, message });
            }
            ConductorMessage::Ack { .. } => {}
            ConductorMessage::Quit { message } => return Some(SurfaceRequest::Quit { message }),
        }
        None
    }

    /// Whether the progress gauge should be drawn
    ///
    /// Shown for the whole of a pending solve, including its first tick at
    /// 0%, and afterwards while the completed value is held.
    pub fn show_progress(&self) -> bool {
        self.solve_status.is_pending() || self.progress > 0
    }

    /// Wrap every entry to `width`, one blank line between entries
    pub fn wrapped_lines(&self, width: usize) -> Vec<(String, EntryKind)> {
        let mut lines = Vec::new();
        for entry in &self.entries {
            for line in entry.wrapped(width) {
                lines.push((line, entry.kind));
            }
            lines.push((String::new(), entry.kind));
        }
        lines
    }

    /// Status bar text
    pub fn status_line(&self) -> String {
        let mut parts = vec![self.conductor_state.description().to_string()];
        match &self.session {
            Some(session) if session.initialized => {
                if let Some(name) = &session.staged_image {
                    parts.push(format!("staged: {name}"));
                }
                if session.has_solved_image {
                    parts.push("solved image ready".to_string());
                }
            }
            Some(_) => parts.push("type 'start'".to_string()),
            None => {}
        }
        if let Some(note) = &self.notification {
            parts.push(note.message.clone());
        }
        parts.join(" | ")
    }

    /// Clear the notification
    pub fn clear_notification(&mut self) {
        self.notification = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sudosolve_core::{EventId, SessionId, WELCOME_MESSAGE};

    fn snapshot(initialized: bool, staged: Option<&str>, solved: bool) -> SessionSnapshot {
        SessionSnapshot {
            session_id: SessionId("session_test".to_string()),
            initialized,
            staged_image: staged.map(str::to_string),
            has_solved_image: solved,
            last_error: None,
        }
    }

    // ========================================================================
    // DisplayEntry Tests
    // ========================================================================

    #[test]
    fn test_prefixes_by_kind() {
        let cmd = DisplayEntry::from_entry(&OutputEntry::command("start"));
        let err = DisplayEntry::from_entry(&OutputEntry::error("boom"));
        let resp = DisplayEntry::from_entry(&OutputEntry::response("ok"));
        assert_eq!(cmd.wrapped(80), vec!["$ start".to_string()]);
        assert_eq!(err.wrapped(80), vec!["Error: boom".to_string()]);
        assert_eq!(resp.wrapped(80), vec!["ok".to_string()]);
    }

    #[test]
    fn test_image_entry_shows_summary() {
        let entry = OutputEntry::image(ImageRef::Url("https://x.test/solved.png".to_string()));
        let display = DisplayEntry::from_entry(&entry);
        assert_eq!(display.kind, EntryKind::Image);
        assert_eq!(
            display.wrapped(80),
            vec!["[image] https://x.test/solved.png".to_string()]
        );
    }

    #[test]
    fn test_wrap_long_response() {
        let entry = DisplayEntry::from_entry(&OutputEntry::response("aaaa bbbb cccc dddd"));
        assert_eq!(entry.wrapped(9), vec!["aaaa bbbb", "cccc dddd"]);
    }

    // ========================================================================
    // DisplayState Tests
    // ========================================================================

    #[test]
    fn test_entry_appends() {
        let mut state = DisplayState::new();
        let req = state.apply_message(ConductorMessage::Entry {
            entry: OutputEntry::command("upload"),
        });
        assert!(req.is_none());
        assert_eq!(state.entries.len(), 1);
        assert_eq!(state.entries[0].kind, EntryKind::Command);
    }

    #[test]
    fn test_reset_keeps_only_welcome() {
        let mut state = DisplayState::new();
        state.apply_message(ConductorMessage::TranscriptSnapshot {
            entries: vec![OutputEntry::welcome(), OutputEntry::command("start")],
        });
        assert_eq!(state.entries.len(), 2);

        state.apply_message(ConductorMessage::TranscriptReset {
            welcome: Some(OutputEntry::welcome()),
        });
        assert_eq!(state.entries.len(), 1);
        assert_eq!(state.entries[0].content, WELCOME_MESSAGE);

        state.apply_message(ConductorMessage::TranscriptReset { welcome: None });
        assert!(state.entries.is_empty());
    }

    #[test]
    fn test_side_effects_returned() {
        let mut state = DisplayState::new();
        assert_eq!(
            state.apply_message(ConductorMessage::OpenFilePicker),
            Some(SurfaceRequest::OpenFilePicker)
        );
        assert_eq!(
            state.apply_message(ConductorMessage::ClearInput),
            Some(SurfaceRequest::ClearInput)
        );
        let image = ImageRef::Url("https://x.test/a.png".to_string());
        assert_eq!(
            state.apply_message(ConductorMessage::SaveImage {
                image: image.clone(),
                filename: "solved-sudoku.png".to_string(),
            }),
            Some(SurfaceRequest::SaveImage {
                image,
                filename: "solved-sudoku.png".to_string(),
            })
        );
        assert_eq!(
            state.apply_message(ConductorMessage::Quit { message: None }),
            Some(SurfaceRequest::Quit { message: None })
        );
        assert!(state
            .apply_message(ConductorMessage::Ack {
                event_id: EventId("evt_1".to_string()),
            })
            .is_none());
    }

    #[test]
    fn test_progress_visibility() {
        let mut state = DisplayState::new();
        assert!(!state.show_progress());
        state.apply_message(ConductorMessage::Progress { percent: 10 });
        assert!(state.show_progress());
        state.apply_message(ConductorMessage::Progress { percent: 100 });
        assert!(state.show_progress());
        state.apply_message(ConductorMessage::Progress { percent: 0 });
        assert!(!state.show_progress());
    }

    #[test]
    fn test_progress_shown_at_zero_while_pending() {
        let mut state = DisplayState::new();
        state.apply_message(ConductorMessage::SolveState {
            status: SolveStatus::Pending,
        });
        state.apply_message(ConductorMessage::Progress { percent: 0 });
        assert!(state.show_progress());

        // Orphaned by a reset: Idle at 0 hides the gauge
        state.apply_message(ConductorMessage::SolveState {
            status: SolveStatus::Idle,
        });
        assert!(!state.show_progress());
    }

    #[test]
    fn test_status_line() {
        let mut state = DisplayState::new();
        state.apply_message(ConductorMessage::State {
            state: ConductorState::Ready,
        });
        state.apply_message(ConductorMessage::SessionInfo {
            session: snapshot(false, None, false),
        });
        assert_eq!(state.status_line(), "Ready | type 'start'");

        state.apply_message(ConductorMessage::SessionInfo {
            session: snapshot(true, Some("puzzle.png"), true),
        });
        assert_eq!(
            state.status_line(),
            "Ready | staged: puzzle.png | solved image ready"
        );

        state.apply_message(ConductorMessage::Notify {
            level: NotifyLevel::Warning,
            message: "Solver offline".to_string(),
        });
        assert!(state.status_line().ends_with("| Solver offline"));
        state.clear_notification();
        assert!(!state.status_line().contains("Solver offline"));
    }

    #[test]
    fn test_wrapped_lines_separates_entries() {
        let mut state = DisplayState::new();
        state.apply_message(ConductorMessage::Entry {
            entry: OutputEntry::command("start"),
        });
        state.apply_message(ConductorMessage::Entry {
            entry: OutputEntry::error("nope"),
        });
        let lines = state.wrapped_lines(40);
        let text: Vec<&str> = lines.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(text, vec!["$ start", "", "Error: nope", ""]);
        assert_eq!(lines[2].1, EntryKind::Error);
    }

    #[test]
    fn test_input_mode_prompt() {
        assert_eq!(InputMode::Command.prompt(), "$ ");
        assert_eq!(InputMode::FilePicker.prompt(), "Select image file: ");
    }
}
