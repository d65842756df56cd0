//! Command Interpreter
//!
//! Turns one line of input (or one file selection) into transcript entries,
//! session mutations and at most one outward [`Effect`].
//!
//! # Design Philosophy
//!
//! The interpreter is synchronous and owns nothing. The Conductor lends it
//! the session and the transcript for one call and executes whatever effect
//! comes back (spawning a solve, asking the surface to open a picker or save
//! a file). Every rule about which command is legal when lives here.
//!
//! Ordering rules:
//! - every line is echoed before anything else is appended
//! - `clear` is honored before the `start` guard, so it works in any state
//! - a rejected command never touches the staged or solved image

use crate::commands::{available_commands, Command};
use crate::config::ConductorConfig;
use crate::error::CommandError;
use crate::image::{ImageRef, StagedImage};
use crate::session::SessionState;
use crate::transcript::{OutputEntry, Transcript};

/// Reply to `start`
pub const READY_MESSAGE: &str = "SudoSolve is ready. Type 'upload' to select a Sudoku image.";
/// Reply to an accepted `solve`
pub const SOLVING_MESSAGE: &str = "Solving puzzle, please wait...";
/// Reply to `download`
pub const DOWNLOADED_MESSAGE: &str = "Solved image downloaded.";
/// Reply to a successful solve
pub const SOLVED_MESSAGE: &str = "Puzzle solved successfully! Type 'download' to save the image.";
/// Reply to a cancelled file picker
pub const NO_FILE_SELECTED_MESSAGE: &str = "No file selected.";

/// What the Conductor has to do after a command
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Nothing beyond the transcript
    None,
    /// Ask the surface for a file
    OpenFilePicker,
    /// Start solving this image
    SubmitSolve(StagedImage),
    /// Ask the surface to save the solved image
    SaveImage {
        /// The image
        image: ImageRef,
        /// Target file name
        filename: String,
    },
    /// The transcript was reset
    Cleared {
        /// The session was reset as well
        session_reset: bool,
    },
}

/// Stateless command interpreter, configured once per Conductor
#[derive(Clone, Debug)]
pub struct Interpreter {
    manual_solve: bool,
    clear_resets_session: bool,
    download_filename: String,
    max_input_length: usize,
    max_upload_bytes: usize,
}

impl Interpreter {
    /// Build from the Conductor configuration
    #[must_use]
    pub fn new(config: &ConductorConfig) -> Self {
        Self {
            manual_solve: config.manual_solve,
            clear_resets_session: config.clear_resets_session,
            download_filename: config.download_filename.clone(),
            max_input_length: config.max_input_length,
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    /// Whether `solve` has to be typed after an upload
    #[must_use]
    pub fn manual_solve(&self) -> bool {
        self.manual_solve
    }

    /// Handle one line of input
    pub fn handle_line(
        &self,
        line: &str,
        session: &mut SessionState,
        transcript: &mut Transcript,
        solve_pending: bool,
    ) -> Effect {
        let trimmed = line.trim();
        let length = trimmed.chars().count();
        if length > self.max_input_length {
            let echoed: String = trimmed.chars().take(self.max_input_length).collect();
            transcript.append(OutputEntry::command(echoed));
            reject(
                transcript,
                &CommandError::InputTooLong {
                    length,
                    limit: self.max_input_length,
                },
            );
            return Effect::None;
        }

        transcript.append(OutputEntry::command(trimmed));
        let command = Command::parse(trimmed);
        tracing::debug!(
            command = command.name(),
            initialized = session.is_initialized(),
            solve_pending,
            "Handling command"
        );

        if command == Command::Clear {
            return self.clear(session, transcript);
        }

        if !session.is_initialized() && command != Command::Start {
            reject(transcript, &CommandError::SessionNotInitialized);
            return Effect::None;
        }

        match command {
            Command::Start => {
                session.initialize();
                transcript.append(OutputEntry::response(READY_MESSAGE));
                Effect::None
            }
            Command::Upload => Effect::OpenFilePicker,
            Command::Solve => self.solve(session, transcript, solve_pending),
            Command::Download => self.download(session, transcript),
            Command::Unknown(text) => {
                reject(
                    transcript,
                    &CommandError::UnknownCommand {
                        command: text,
                        available: available_commands(self.manual_solve),
                    },
                );
                Effect::None
            }
            // Handled above
            Command::Clear => Effect::None,
        }
    }

    fn clear(&self, session: &mut SessionState, transcript: &mut Transcript) -> Effect {
        let welcome = transcript.welcome_on_reset();
        transcript.reset(welcome);
        if self.clear_resets_session {
            session.reset_session();
        }
        Effect::Cleared {
            session_reset: self.clear_resets_session,
        }
    }

    fn solve(
        &self,
        session: &SessionState,
        transcript: &mut Transcript,
        solve_pending: bool,
    ) -> Effect {
        if !self.manual_solve {
            reject(transcript, &CommandError::SolveCommandDeprecated);
            return Effect::None;
        }
        if solve_pending {
            reject(transcript, &CommandError::ConcurrentSolveRejected);
            return Effect::None;
        }
        match session.staged_image() {
            Some(staged) => {
                transcript.append(OutputEntry::response(SOLVING_MESSAGE));
                Effect::SubmitSolve(staged.clone())
            }
            None => {
                reject(transcript, &CommandError::NoStagedImage);
                Effect::None
            }
        }
    }

    fn download(&self, session: &SessionState, transcript: &mut Transcript) -> Effect {
        match session.last_solved_image() {
            Some(image) => {
                transcript.append(OutputEntry::response(DOWNLOADED_MESSAGE));
                Effect::SaveImage {
                    image: image.clone(),
                    filename: self.download_filename.clone(),
                }
            }
            None => {
                reject(
                    transcript,
                    &CommandError::NoSolvedImage {
                        automatic: !self.manual_solve,
                    },
                );
                Effect::None
            }
        }
    }

    /// Handle a file chosen in the picker
    pub fn stage_upload(
        &self,
        name: &str,
        data: Vec<u8>,
        session: &mut SessionState,
        transcript: &mut Transcript,
        solve_pending: bool,
    ) -> Effect {
        if !session.is_initialized() {
            reject(transcript, &CommandError::SessionNotInitialized);
            return Effect::None;
        }
        if data.is_empty() {
            reject(
                transcript,
                &CommandError::EmptyUpload {
                    name: name.to_string(),
                },
            );
            return Effect::None;
        }
        if data.len() > self.max_upload_bytes {
            reject(
                transcript,
                &CommandError::UploadTooLarge {
                    name: name.to_string(),
                    size: data.len(),
                    limit: self.max_upload_bytes,
                },
            );
            return Effect::None;
        }

        let staged = StagedImage::new(session.next_upload_id(), name, data);
        session.stage_image(staged.clone());

        if self.manual_solve {
            transcript.append(OutputEntry::response(format!(
                "File selected: {name}. Type 'solve' to process the image."
            )));
            Effect::None
        } else if solve_pending {
            transcript.append(OutputEntry::response(format!(
                "File selected: {name}. A puzzle is already being solved; type 'upload' again once it finishes."
            )));
            Effect::None
        } else {
            transcript.append(OutputEntry::response(format!(
                "File selected: {name}. {SOLVING_MESSAGE}"
            )));
            Effect::SubmitSolve(staged)
        }
    }

    /// Handle a dismissed file picker
    pub fn cancel_upload(&self, transcript: &mut Transcript) -> Effect {
        transcript.append(OutputEntry::response(NO_FILE_SELECTED_MESSAGE));
        Effect::None
    }
}

/// Append a rejection as an Error entry
fn reject(transcript: &mut Transcript, error: &CommandError) {
    tracing::warn!(category = error.category().as_str(), error = %error, "Command rejected");
    transcript.append(OutputEntry::error(error.to_string()));
}
