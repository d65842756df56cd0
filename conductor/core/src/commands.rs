//! Command Vocabulary
//!
//! The five words the terminal understands, how a line of input maps onto
//! them, and the help list quoted in "Command not found" replies.

use std::sync::OnceLock;

use serde::Serialize;

/// A parsed line of input
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Initialize the session
    Start,
    /// Ask the surface for a file
    Upload,
    /// Submit the staged image (manual mode)
    Solve,
    /// Save the solved image
    Download,
    /// Reset the transcript and session
    Clear,
    /// Anything else, lowercased and trimmed
    Unknown(String),
}

impl Command {
    /// Parse a line of input
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace. An
    /// empty line is an unknown command.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let normalized = line.trim().to_lowercase();
        match normalized.as_str() {
            "start" => Self::Start,
            "upload" => Self::Upload,
            "solve" => Self::Solve,
            "download" => Self::Download,
            "clear" => Self::Clear,
            _ => Self::Unknown(normalized),
        }
    }

    /// Command word, or the unknown text as typed (normalized)
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Start => "start",
            Self::Upload => "upload",
            Self::Solve => "solve",
            Self::Download => "download",
            Self::Clear => "clear",
            Self::Unknown(text) => text,
        }
    }

    /// Whether this is one of the known command words
    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

/// Static description of a command word
#[derive(Debug, Clone, Serialize)]
pub struct CommandSpec {
    /// Command word
    pub name: &'static str,
    /// One-line description
    pub description: &'static str,
    /// Only offered when solving is triggered by hand
    pub manual_only: bool,
}

impl CommandSpec {
    const fn new(name: &'static str, description: &'static str, manual_only: bool) -> Self {
        Self {
            name,
            description,
            manual_only,
        }
    }
}

static COMMAND_SPECS: OnceLock<Vec<CommandSpec>> = OnceLock::new();

/// All command words, in help order
pub fn command_specs() -> &'static [CommandSpec] {
    COMMAND_SPECS.get_or_init(|| {
        vec![
            CommandSpec::new("start", "Initialize the session", false),
            CommandSpec::new("upload", "Select a Sudoku image", false),
            CommandSpec::new("solve", "Solve the selected image", true),
            CommandSpec::new("download", "Save the solved image", false),
            CommandSpec::new("clear", "Clear the terminal", false),
        ]
    })
}

/// Comma-separated list of commands available in the given mode
#[must_use]
pub fn available_commands(manual_solve: bool) -> String {
    command_specs()
        .iter()
        .filter(|spec| manual_solve || !spec.manual_only)
        .map(|spec| spec.name)
        .collect::<Vec<_>>()
        .join(", ")
}
