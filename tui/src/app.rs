//! Main Application
//!
//! The App struct manages the TUI lifecycle as a thin display client:
//! - Event loop (keyboard, resize)
//! - ConductorClient for the session engine
//! - DisplayState for rendering
//! - Side effects the Conductor asks for (file prompt, image download)
//!
//! The App:
//! 1. Converts key presses and file reads to SurfaceEvents
//! 2. Sends events to the embedded Conductor via ConductorClient
//! 3. Receives ConductorMessages and updates DisplayState
//! 4. Renders based on DisplayState

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crossterm::event::{self, Event, EventStream, KeyCode, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use tokio::sync::mpsc;

use sudosolve_core::{ConductorConfig, ImageRef, NotifyLevel};

use crate::conductor_client::ConductorClient;
use crate::display::{
    DisplayNotification, DisplayState, InputMode, SurfaceRequest, PROGRESS_LABEL,
};
use crate::downloads::{ImageSaver, SaveError};
use crate::theme;
use crate::uploads::read_image_file;

/// Input box height (lines, including the separator)
const INPUT_HEIGHT: u16 = 3;

/// Frame tick when no key arrives
const FRAME_DURATION: Duration = Duration::from_millis(50);

/// Quick goodbye messages
const QUICK_GOODBYES: &[&str] = &[
    "Bye bye!",
    "Happy solving!",
    "May your rows never repeat.",
    "Nine by nine, see you next time!",
    "See ya!",
    "Take care!",
    "Go fill some grids!",
];

/// Main application state
pub struct App {
    // === Core State ===
    /// Is the app still running?
    running: bool,
    /// Goodbye message to show on exit
    goodbye_message: Option<String>,

    // === Conductor Integration ===
    /// Client for communicating with the embedded Conductor
    conductor: ConductorClient,
    /// Display state derived from ConductorMessages
    display: DisplayState,

    // === Downloads ===
    /// Writes solved images to the download directory
    saver: ImageSaver,
    /// Results of spawned saves
    save_tx: mpsc::UnboundedSender<Result<PathBuf, SaveError>>,
    save_rx: mpsc::UnboundedReceiver<Result<PathBuf, SaveError>>,

    // === Uploads ===
    /// Files above this are refused before reading
    max_upload_bytes: usize,

    // === Input State ===
    /// User input buffer
    input_buffer: String,
    /// Command prompt or file prompt
    input_mode: InputMode,
    /// Scroll offset (lines from bottom, 0 = latest)
    scroll_offset: usize,
    /// Total rendered lines (for scroll bounds)
    total_lines: usize,
    /// Terminal size
    size: (u16, u16),
}

impl App {
    /// Create a new App instance
    pub fn new(config: ConductorConfig) -> anyhow::Result<Self> {
        let size = crossterm::terminal::size()?;
        let saver = ImageSaver::new(config.download_dir.clone());
        let max_upload_bytes = config.max_upload_bytes;
        let conductor = ConductorClient::new(config)?;
        let (save_tx, save_rx) = mpsc::unbounded_channel();

        Ok(Self {
            running: true,
            goodbye_message: None,
            conductor,
            display: DisplayState::new(),
            saver,
            save_tx,
            save_rx,
            max_upload_bytes,
            input_buffer: String::new(),
            input_mode: InputMode::Command,
            scroll_offset: 0,
            total_lines: 0,
            size,
        })
    }

    /// Main event loop
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        let mut event_stream = EventStream::new();

        // Render initial frame immediately so user sees UI
        self.render(terminal)?;

        if let Err(e) = self.conductor.start().await {
            tracing::warn!("Conductor start error: {}", e);
        }
        if let Err(e) = self.conductor.connect().await {
            tracing::warn!("Conductor connect error: {}", e);
        }

        while self.running {
            tokio::select! {
                biased;

                // Terminal events - highest priority
                maybe_event = event_stream.next() => {
                    match maybe_event {
                        Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                            self.handle_key(key).await;
                        }
                        Some(Ok(Event::Resize(w, h))) => self.size = (w, h),
                        Some(Ok(_)) => {}
                        Some(Err(e)) => tracing::warn!("Terminal event error: {}", e),
                        None => self.running = false,
                    }
                }

                // Finished downloads
                Some(result) = self.save_rx.recv() => {
                    self.handle_save_result(result).await;
                }

                // Frame tick
                _ = tokio::time::sleep(FRAME_DURATION) => {}
            }

            // Collect solve outcomes and progress
            self.conductor.poll_solve().await;

            // Receive and process messages from Conductor
            self.process_conductor_messages().await;

            self.render(terminal)?;
        }

        Ok(())
    }

    /// Process all pending messages from the Conductor
    async fn process_conductor_messages(&mut self) {
        loop {
            let messages = self.conductor.recv_all();
            if messages.is_empty() {
                break;
            }
            for msg in messages {
                if let Some(request) = self.display.apply_message(msg) {
                    self.handle_request(request);
                }
            }
        }
    }

    /// Perform a side effect the Conductor asked for
    fn handle_request(&mut self, request: SurfaceRequest) {
        match request {
            SurfaceRequest::OpenFilePicker => {
                self.input_buffer.clear();
                self.input_mode = InputMode::FilePicker;
            }
            SurfaceRequest::ClearInput => self.input_buffer.clear(),
            SurfaceRequest::SaveImage { image, filename } => self.spawn_save(image, filename),
            SurfaceRequest::Quit { message } => {
                if message.is_some() {
                    self.goodbye_message = message;
                } else if self.goodbye_message.is_none() {
                    self.generate_goodbye();
                }
                self.running = false;
            }
        }
    }

    fn spawn_save(&self, image: ImageRef, filename: String) {
        let saver = self.saver.clone();
        let tx = self.save_tx.clone();
        tokio::spawn(async move {
            let result = saver.save(&image, &filename).await;
            // The receiver lives as long as the App
            let _ = tx.send(result);
        });
    }

    async fn handle_save_result(&mut self, result: Result<PathBuf, SaveError>) {
        match result {
            Ok(path) => {
                self.display.notification = Some(DisplayNotification {
                    level: NotifyLevel::Success,
                    message: format!("Saved to {}", path.display()),
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "Download failed");
                let _ = self.conductor.save_failed(e.to_string()).await;
            }
        }
    }

    /// Handle keyboard input
    async fn handle_key(&mut self, key: event::KeyEvent) {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.quit().await;
            }
            KeyCode::Esc => match self.input_mode {
                InputMode::FilePicker => {
                    self.input_buffer.clear();
                    self.input_mode = InputMode::Command;
                    let _ = self.conductor.picker_cancelled().await;
                }
                InputMode::Command => self.quit().await,
            },
            KeyCode::Enter => match self.input_mode {
                InputMode::Command => {
                    let line = std::mem::take(&mut self.input_buffer);
                    self.display.clear_notification();
                    let _ = self.conductor.send_line(line).await;
                    self.scroll_offset = 0;
                }
                InputMode::FilePicker => self.submit_file_path().await,
            },
            KeyCode::Char(c) => {
                self.input_buffer.push(c);
            }
            KeyCode::Backspace => {
                self.input_buffer.pop();
            }
            // Transcript scrolling
            KeyCode::PageUp => {
                let page_size = usize::from(self.transcript_height() / 2).max(1);
                let max_scroll = self.total_lines.saturating_sub(1);
                self.scroll_offset = (self.scroll_offset + page_size).min(max_scroll);
            }
            KeyCode::PageDown => {
                let page_size = usize::from(self.transcript_height() / 2).max(1);
                self.scroll_offset = self.scroll_offset.saturating_sub(page_size);
            }
            _ => {}
        }
    }

    /// Read the typed path and hand the file to the Conductor
    ///
    /// Read errors keep the prompt open so the path can be corrected. Paths
    /// that are not regular files or exceed the upload limit are refused
    /// without reading them.
    async fn submit_file_path(&mut self) {
        let raw = self.input_buffer.trim().to_string();
        if raw.is_empty() {
            self.display.notification = Some(DisplayNotification {
                level: NotifyLevel::Info,
                message: "Type the path of an image, or press Esc to cancel".to_string(),
            });
            return;
        }

        let path = expand_tilde(&raw);
        match read_image_file(&path, self.max_upload_bytes).await {
            Ok(data) => {
                let name = path
                    .file_name()
                    .map_or_else(|| raw.clone(), |n| n.to_string_lossy().into_owned());
                tracing::debug!(path = %path.display(), bytes = data.len(), "Read image file");
                self.input_buffer.clear();
                self.input_mode = InputMode::Command;
                self.display.clear_notification();
                let _ = self.conductor.file_selected(name, data).await;
                self.scroll_offset = 0;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read image file");
                self.display.notification = Some(DisplayNotification {
                    level: NotifyLevel::Error,
                    message: format!("Upload refused: {e}"),
                });
            }
        }
    }

    async fn quit(&mut self) {
        self.generate_goodbye();
        let _ = self.conductor.request_quit().await;
        self.running = false;
    }

    fn transcript_height(&self) -> u16 {
        self.size.1.saturating_sub(INPUT_HEIGHT + 1)
    }

    /// Render the UI
    fn render(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        terminal.draw(|frame| self.draw(frame))?;
        Ok(())
    }

    fn draw(&mut self, frame: &mut Frame) {
        let gauge_height = u16::from(self.display.show_progress());
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),
                Constraint::Length(gauge_height),
                Constraint::Length(INPUT_HEIGHT),
                Constraint::Length(1),
            ])
            .split(frame.area());

        self.draw_transcript(frame, chunks[0]);
        if gauge_height > 0 {
            self.draw_progress(frame, chunks[1]);
        }
        self.draw_input(frame, chunks[2]);
        self.draw_status(frame, chunks[3]);
    }

    /// Render the transcript, bottom-anchored with scroll offset
    fn draw_transcript(&mut self, frame: &mut Frame, area: Rect) {
        let width = usize::from(area.width.saturating_sub(1));
        let height = usize::from(area.height);
        if width < 10 || height == 0 {
            return;
        }

        let all_lines = self.display.wrapped_lines(width);
        self.total_lines = all_lines.len();

        // Clamp scroll offset
        let max_scroll = self.total_lines.saturating_sub(height);
        if self.scroll_offset > max_scroll {
            self.scroll_offset = max_scroll;
        }

        let visible_end = self.total_lines.saturating_sub(self.scroll_offset);
        let visible_start = visible_end.saturating_sub(height);
        let lines: Vec<Line> = all_lines[visible_start..visible_end]
            .iter()
            .map(|(text, kind)| Line::styled(text.clone(), theme::entry_style(*kind)))
            .collect();

        frame.render_widget(Paragraph::new(lines), area);
    }

    fn draw_progress(&self, frame: &mut Frame, area: Rect) {
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(theme::PROGRESS_YELLOW))
            .percent(u16::from(self.display.progress))
            .label(PROGRESS_LABEL);
        frame.render_widget(gauge, area);
    }

    fn draw_input(&self, frame: &mut Frame, area: Rect) {
        let prompt_style = match self.input_mode {
            InputMode::Command => Style::default().fg(theme::COMMAND_GREEN),
            InputMode::FilePicker => Style::default().fg(theme::IMAGE_CYAN),
        };
        let line = Line::from(vec![
            Span::styled(self.input_mode.prompt(), prompt_style),
            Span::raw(format!("{}_", self.input_buffer)),
        ]);
        let input = Paragraph::new(line)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(theme::DIM_GRAY)),
            )
            .wrap(Wrap { trim: false });
        frame.render_widget(input, area);
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        let style = self
            .display
            .notification
            .as_ref()
            .map_or(Style::default().fg(theme::DIM_GRAY), |n| {
                theme::notify_style(n.level)
            });
        frame.render_widget(Paragraph::new(self.display.status_line()).style(style), area);
    }

    /// Pick a goodbye message
    fn generate_goodbye(&mut self) {
        let idx = rand::random::<usize>() % QUICK_GOODBYES.len();
        self.goodbye_message = Some(QUICK_GOODBYES[idx].to_string());
    }

    /// Get the goodbye message for display after TUI closes
    pub fn goodbye(&self) -> Option<&str> {
        self.goodbye_message.as_deref()
    }
}

/// Expand a leading `~/` to the home directory
fn expand_tilde(raw: &str) -> PathBuf {
    match raw.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map_or_else(|| PathBuf::from(raw), |home| home.join(rest)),
        None => Path::new(raw).to_path_buf(),
    }
}
