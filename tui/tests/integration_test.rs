//! Integration Tests for TUI + Conductor
//!
//! These tests drive the embedded Conductor through the same
//! `ConductorClient` the TUI uses, with a mock solver in place of the HTTP
//! backend.
//!
//! # Test Coverage
//!
//! 1. **Startup Flow**: Conductor starts, surface connects, welcome is shown
//! 2. **Command Rules**: echo, `start` first, unknown commands
//! 3. **Solve Flow**: upload, solve, success and failure, single flight
//! 4. **Clear**: transcript and session reset, orphaned solves, solving again
//! 5. **Progress**: capped while pending, 100 then 0 after resolution
//! 6. **Display**: the TUI's display state mirrors the transcript
//!
//! # Mock Backend
//!
//! The mock solver can:
//! - Hold every solve until the test opens its gate
//! - Fail with a fixed message
//! - Fail its health check
//! - Count requests and the most requests ever in flight at once

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use tokio::sync::Semaphore;

use sudosolve_core::interpreter::{
    DOWNLOADED_MESSAGE, NO_FILE_SELECTED_MESSAGE, SOLVED_MESSAGE, SOLVING_MESSAGE,
};
use sudosolve_core::{
    ConductorConfig, ConductorMessage, ConductorState, EntryKind, ImageRef, NotifyLevel,
    SolveBackend, SolveRequest, SolveStatus, WELCOME_MESSAGE,
};
use sudosolve_tui::{ConductorClient, DisplayState, SurfaceRequest};

// ============================================================================
// Configurable Mock Backend
// ============================================================================

/// Configuration for error injection in mock backend
#[derive(Clone, Debug, Default)]
pub struct ErrorInjectionConfig {
    /// If set, every solve fails with this message
    pub fail_with: Option<String>,
    /// If true, health check returns false
    pub health_check_fails: bool,
}

/// A configurable mock solver for integration testing
pub struct IntegrationMockBackend {
    /// Count of solve requests made
    request_count: Arc<AtomicUsize>,
    /// Solves currently running
    in_flight: Arc<AtomicUsize>,
    /// Highest value `in_flight` ever reached
    max_in_flight: Arc<AtomicUsize>,
    /// When set, each solve waits for a permit
    gate: Option<Arc<Semaphore>>,
    /// Error injection configuration
    error_config: ErrorInjectionConfig,
}

/// Handles the test keeps after the backend moves into the Conductor
#[derive(Clone)]
struct BackendHandle {
    request_count: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    gate: Arc<Semaphore>,
}

impl BackendHandle {
    fn requests(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Let one held solve finish
    fn release(&self) {
        self.gate.add_permits(1);
    }
}

impl IntegrationMockBackend {
    /// Solves immediately
    pub fn new() -> Self {
        Self {
            request_count: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            gate: None,
            error_config: ErrorInjectionConfig::default(),
        }
    }

    /// Create a mock backend with error injection
    pub fn with_error_injection(config: ErrorInjectionConfig) -> Self {
        Self {
            error_config: config,
            ..Self::new()
        }
    }

    /// Hold solves until released, returning the handle that releases them
    fn gated(self) -> (Self, BackendHandle) {
        let gate = Arc::new(Semaphore::new(0));
        let handle = BackendHandle {
            request_count: Arc::clone(&self.request_count),
            max_in_flight: Arc::clone(&self.max_in_flight),
            gate: Arc::clone(&gate),
        };
        (
            Self {
                gate: Some(gate),
                ..self
            },
            handle,
        )
    }
}

impl Default for IntegrationMockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SolveBackend for IntegrationMockBackend {
    fn name(&self) -> &str {
        "IntegrationMock"
    }

    async fn health_check(&self) -> bool {
        !self.error_config.health_check_fails
    }

    async fn solve(&self, request: &SolveRequest) -> anyhow::Result<ImageRef> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.acquire().await?.forget();
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(message) = &self.error_config.fail_with {
            anyhow::bail!("{message}");
        }
        Ok(ImageRef::Url(format!(
            "https://solver.test/solved/{}",
            request.filename
        )))
    }
}

// ============================================================================
// Test Utilities
// ============================================================================

type Client = ConductorClient<IntegrationMockBackend>;

fn manual_config() -> ConductorConfig {
    ConductorConfig::default()
}

fn auto_config() -> ConductorConfig {
    ConductorConfig {
        manual_solve: false,
        ..ConductorConfig::default()
    }
}

/// Start the Conductor and connect a surface, discarding startup messages
async fn started(backend: IntegrationMockBackend, config: ConductorConfig) -> Client {
    let mut client = ConductorClient::with_backend(backend, config);
    client.start().await.expect("Conductor should start");
    client.connect().await.expect("Surface should connect");
    client.recv_all();
    client
}

/// Type `upload` and pick a file
async fn upload(client: &mut Client, name: &str) {
    client.send_line("upload".to_string()).await.unwrap();
    client
        .file_selected(name.to_string(), vec![0x89, b'P', b'N', b'G'])
        .await
        .unwrap();
}

async fn line(client: &mut Client, text: &str) {
    client.send_line(text.to_string()).await.unwrap();
}

/// Transcript as `(kind, text)` pairs
fn log(client: &Client) -> Vec<(EntryKind, String)> {
    client
        .conductor()
        .transcript()
        .entries()
        .iter()
        .map(|e| {
            let text = match e.image_ref() {
                Some(image) => image.summary(),
                None => e.text_content().unwrap_or_default().to_string(),
            };
            (e.kind(), text)
        })
        .collect()
}

fn error_count(client: &Client) -> usize {
    client
        .conductor()
        .transcript()
        .iter_kind(EntryKind::Error)
        .count()
}

// ============================================================================
// Startup
// ============================================================================

/// The connected surface receives the welcome line and a Ready state
#[tokio::test]
async fn test_startup_and_welcome() {
    let mut client = ConductorClient::with_backend(IntegrationMockBackend::new(), manual_config());
    client.start().await.unwrap();
    client.connect().await.unwrap();

    let messages = client.recv_all();
    assert!(messages
        .iter()
        .any(|m| matches!(m, ConductorMessage::State { state: ConductorState::Ready })));

    let snapshot = messages.iter().find_map(|m| match m {
        ConductorMessage::TranscriptSnapshot { entries } => Some(entries.clone()),
        _ => None,
    });
    let snapshot = snapshot.expect("connect should send a transcript snapshot");
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].text_content(), Some(WELCOME_MESSAGE));
    assert!(client.is_ready());
}

/// An unreachable solver is reported but does not stop the session
#[tokio::test]
async fn test_unhealthy_solver_warns() {
    let backend = IntegrationMockBackend::with_error_injection(ErrorInjectionConfig {
        health_check_fails: true,
        ..Default::default()
    });
    let mut client = ConductorClient::with_backend(backend, manual_config());
    client.start().await.unwrap();

    let messages = client.recv_all();
    assert!(messages.iter().any(|m| matches!(
        m,
        ConductorMessage::Notify { level: NotifyLevel::Warning, .. }
    )));
    assert_eq!(client.state(), ConductorState::Ready);
}

// ============================================================================
// Command Rules
// ============================================================================

/// Every input adds exactly one Command entry
#[tokio::test]
async fn test_each_input_echoed_once() {
    let mut client = started(IntegrationMockBackend::new(), manual_config()).await;
    let inputs = ["download", "start", "  START  ", "foo", "solve", ""];
    for input in inputs {
        line(&mut client, input).await;
    }

    let commands: Vec<String> = log(&client)
        .into_iter()
        .filter(|(kind, _)| *kind == EntryKind::Command)
        .map(|(_, text)| text)
        .collect();
    assert_eq!(
        commands,
        vec!["download", "start", "START", "foo", "solve", ""]
    );
    assert!(client.conductor().transcript().len() >= inputs.len() + 1);
}

/// `start` twice leaves the session as one `start` did
#[tokio::test]
async fn test_start_is_idempotent() {
    let mut client = started(IntegrationMockBackend::new(), manual_config()).await;
    line(&mut client, "start").await;
    let snapshot = client.conductor().session().snapshot();
    line(&mut client, "start").await;

    assert_eq!(client.conductor().session().snapshot(), snapshot);
    assert_eq!(error_count(&client), 0);
}

/// Commands before `start` produce one error each and touch nothing
#[tokio::test]
async fn test_commands_require_start() {
    let mut client = started(IntegrationMockBackend::new(), manual_config()).await;

    for input in ["upload", "solve", "download"] {
        let before = error_count(&client);
        line(&mut client, input).await;
        assert_eq!(error_count(&client), before + 1);
        let (kind, text) = log(&client).pop().unwrap();
        assert_eq!(kind, EntryKind::Error);
        assert_eq!(text, "Please type 'start' first to initialize.");
    }

    let messages = client.recv_all();
    assert!(!messages
        .iter()
        .any(|m| matches!(m, ConductorMessage::OpenFilePicker)));
    assert!(!client.conductor().session().has_staged_image());
    assert!(!client.conductor().session().has_solved_image());
}

/// A file arriving before `start` is rejected and not staged
#[tokio::test]
async fn test_file_before_start_not_staged() {
    let mut client = started(IntegrationMockBackend::new(), manual_config()).await;
    client
        .file_selected("puzzle.png".to_string(), vec![1, 2, 3])
        .await
        .unwrap();

    assert!(!client.conductor().session().has_staged_image());
    assert_eq!(error_count(&client), 1);
}

#[tokio::test]
async fn test_unknown_command_lists_available() {
    let mut client = started(IntegrationMockBackend::new(), manual_config()).await;
    line(&mut client, "start").await;
    line(&mut client, "foo").await;

    let (kind, text) = log(&client).pop().unwrap();
    assert_eq!(kind, EntryKind::Error);
    assert!(text.starts_with("Command not found: foo. Available commands:"));
    assert!(text.contains("solve"));
}

#[tokio::test]
async fn test_download_before_solve() {
    let mut client = started(IntegrationMockBackend::new(), manual_config()).await;
    line(&mut client, "start").await;
    line(&mut client, "download").await;

    let (_, text) = log(&client).pop().unwrap();
    assert_eq!(
        text,
        "No solved image to download. Please 'solve' a puzzle first."
    );
}

#[tokio::test]
async fn test_picker_cancelled() {
    let mut client = started(IntegrationMockBackend::new(), manual_config()).await;
    line(&mut client, "start").await;
    line(&mut client, "upload").await;
    assert!(client
        .recv_all()
        .iter()
        .any(|m| matches!(m, ConductorMessage::OpenFilePicker)));

    client.picker_cancelled().await.unwrap();
    let (kind, text) = log(&client).pop().unwrap();
    assert_eq!(kind, EntryKind::Response);
    assert_eq!(text, NO_FILE_SELECTED_MESSAGE);
    assert!(!client.conductor().session().has_staged_image());
}

// ============================================================================
// Solve Flow
// ============================================================================

/// start, upload, solve, success: solved image set, staged cleared
#[tokio::test]
async fn test_manual_solve_success() {
    let mut client = started(IntegrationMockBackend::new(), manual_config()).await;
    line(&mut client, "start").await;
    upload(&mut client, "puzzle.png").await;
    assert!(client.conductor().session().has_staged_image());

    line(&mut client, "solve").await;
    let status = client.wait_for_solve().await;
    let expected = ImageRef::Url("https://solver.test/solved/puzzle.png".to_string());
    assert_eq!(status, Some(SolveStatus::Succeeded(expected.clone())));

    let session = client.conductor().session();
    assert!(session.is_initialized());
    assert!(!session.has_staged_image());
    assert_eq!(session.last_solved_image(), Some(&expected));

    let entries = log(&client);
    let tail = &entries[entries.len() - 2..];
    assert_eq!(
        tail,
        &[
            (EntryKind::Response, SOLVED_MESSAGE.to_string()),
            (EntryKind::Image, "https://solver.test/solved/puzzle.png".to_string()),
        ]
    );
}

/// Failure keeps the staged image and adds exactly one error
#[tokio::test]
async fn test_solve_failure_keeps_staged() {
    let backend = IntegrationMockBackend::with_error_injection(ErrorInjectionConfig {
        fail_with: Some("No Sudoku grid found in image".to_string()),
        ..Default::default()
    });
    let mut client = started(backend, manual_config()).await;
    line(&mut client, "start").await;
    upload(&mut client, "blurry.jpg").await;
    line(&mut client, "solve").await;

    let status = client.wait_for_solve().await;
    assert_eq!(
        status,
        Some(SolveStatus::Failed("No Sudoku grid found in image".to_string()))
    );

    let session = client.conductor().session();
    assert_eq!(
        session.staged_image().map(|s| s.name.as_str()),
        Some("blurry.jpg")
    );
    assert!(!session.has_solved_image());
    assert_eq!(session.last_error(), Some("No Sudoku grid found in image"));
    assert_eq!(error_count(&client), 1);
    assert_eq!(
        log(&client).pop(),
        Some((EntryKind::Error, "No Sudoku grid found in image".to_string()))
    );
}

/// `solve` while pending starts no second task and says why
#[tokio::test]
async fn test_single_flight() {
    let (backend, handle) = IntegrationMockBackend::new().gated();
    let mut client = started(backend, manual_config()).await;
    line(&mut client, "start").await;
    upload(&mut client, "puzzle.png").await;

    line(&mut client, "solve").await;
    line(&mut client, "solve").await;
    line(&mut client, "solve").await;
    assert_eq!(client.state(), ConductorState::Solving);
    assert_eq!(error_count(&client), 2);
    assert_eq!(
        log(&client).last(),
        Some(&(
            EntryKind::Error,
            "A puzzle is already being solved.".to_string()
        ))
    );

    handle.release();
    client.wait_for_solve().await;

    assert_eq!(handle.requests(), 1);
    assert_eq!(handle.max_in_flight(), 1);
    assert_eq!(client.state(), ConductorState::Ready);
    assert!(client.wait_for_solve().await.is_none());
}

/// A new upload replaces the staged image and drops the solved one
#[tokio::test]
async fn test_restage_discards_previous() {
    let mut client = started(IntegrationMockBackend::new(), manual_config()).await;
    line(&mut client, "start").await;
    upload(&mut client, "first.png").await;
    line(&mut client, "solve").await;
    client.wait_for_solve().await;
    assert!(client.conductor().session().has_solved_image());

    upload(&mut client, "second.png").await;
    let session = client.conductor().session();
    assert_eq!(
        session.staged_image().map(|s| s.name.as_str()),
        Some("second.png")
    );
    assert!(!session.has_solved_image());
}

/// In automatic mode the upload itself starts the solve
#[tokio::test]
async fn test_auto_solve_on_upload() {
    let mut client = started(IntegrationMockBackend::new(), auto_config()).await;
    line(&mut client, "start").await;
    upload(&mut client, "puzzle.png").await;

    assert!(matches!(
        client.wait_for_solve().await,
        Some(SolveStatus::Succeeded(_))
    ));

    line(&mut client, "solve").await;
    let (kind, text) = log(&client).pop().unwrap();
    assert_eq!(kind, EntryKind::Error);
    assert!(text.starts_with("The 'solve' command is no longer needed."));
}

/// `download` after a solve asks the surface to save the image
#[tokio::test]
async fn test_download_requests_save() {
    let mut client = started(IntegrationMockBackend::new(), manual_config()).await;
    line(&mut client, "start").await;
    upload(&mut client, "puzzle.png").await;
    line(&mut client, "solve").await;
    client.wait_for_solve().await;
    client.recv_all();

    line(&mut client, "download").await;
    let save = client.recv_all().into_iter().find_map(|m| match m {
        ConductorMessage::SaveImage { image, filename } => Some((image, filename)),
        _ => None,
    });
    let (image, filename) = save.expect("download should request a save");
    assert_eq!(
        image,
        ImageRef::Url("https://solver.test/solved/puzzle.png".to_string())
    );
    assert_eq!(filename, "solved-sudoku.png");
    assert_eq!(
        log(&client).pop(),
        Some((EntryKind::Response, DOWNLOADED_MESSAGE.to_string()))
    );
}

#[tokio::test]
async fn test_save_failure_reported() {
    let mut client = started(IntegrationMockBackend::new(), manual_config()).await;
    client
        .save_failed("permission denied".to_string())
        .await
        .unwrap();
    assert_eq!(
        log(&client).pop(),
        Some((
            EntryKind::Error,
            "Failed to save image: permission denied".to_string()
        ))
    );
}

// ============================================================================
// Clear
// ============================================================================

/// After `clear` the guards behave as in a fresh session
#[tokio::test]
async fn test_clear_resets_session() {
    let mut client = started(IntegrationMockBackend::new(), manual_config()).await;
    line(&mut client, "start").await;
    upload(&mut client, "puzzle.png").await;
    line(&mut client, "solve").await;
    client.wait_for_solve().await;

    line(&mut client, "clear").await;
    assert_eq!(
        log(&client),
        vec![(EntryKind::Response, WELCOME_MESSAGE.to_string())]
    );
    assert!(!client.conductor().session().is_initialized());

    line(&mut client, "upload").await;
    assert_eq!(
        log(&client).pop(),
        Some((
            EntryKind::Error,
            "Please type 'start' first to initialize.".to_string()
        ))
    );
}

#[tokio::test]
async fn test_clear_can_keep_session() {
    let config = ConductorConfig {
        clear_resets_session: false,
        ..ConductorConfig::default()
    };
    let mut client = started(IntegrationMockBackend::new(), config).await;
    line(&mut client, "start").await;
    upload(&mut client, "puzzle.png").await;
    line(&mut client, "clear").await;

    assert_eq!(client.conductor().transcript().len(), 1);
    assert!(client.conductor().session().is_initialized());
    assert!(client.conductor().session().has_staged_image());
}

/// A reset while pending discards the late outcome
#[tokio::test]
async fn test_clear_while_pending_discards_outcome() {
    let (backend, handle) = IntegrationMockBackend::new().gated();
    let mut client = started(backend, manual_config()).await;
    line(&mut client, "start").await;
    upload(&mut client, "puzzle.png").await;
    line(&mut client, "solve").await;

    line(&mut client, "clear").await;
    handle.release();
    assert_eq!(client.wait_for_solve().await, Some(SolveStatus::Idle));

    assert!(!client.conductor().session().has_solved_image());
    assert_eq!(client.conductor().transcript().len(), 1);
    assert_eq!(client.conductor().progress_value(), 0);
}

/// The fresh session after a reset can solve while the old task still runs
#[tokio::test]
async fn test_solve_after_clear_while_pending() {
    let (backend, handle) = IntegrationMockBackend::new().gated();
    let mut client = started(backend, manual_config()).await;
    line(&mut client, "start").await;
    upload(&mut client, "old.png").await;
    line(&mut client, "solve").await;

    line(&mut client, "clear").await;
    assert_eq!(client.state(), ConductorState::Ready);
    let mut display = DisplayState::new();
    for msg in client.recv_all() {
        display.apply_message(msg);
    }
    assert_eq!(display.solve_status, SolveStatus::Idle);

    line(&mut client, "start").await;
    upload(&mut client, "new.png").await;
    line(&mut client, "solve").await;
    assert_eq!(client.state(), ConductorState::Solving);
    assert_eq!(client.conductor().solve_status(), SolveStatus::Pending);
    assert_eq!(error_count(&client), 0);
    assert_eq!(
        log(&client).last(),
        Some(&(EntryKind::Response, SOLVING_MESSAGE.to_string()))
    );

    // Both tasks reach the solver; only the new one is recorded
    handle.release();
    handle.release();
    let solved = ImageRef::Url("https://solver.test/solved/new.png".to_string());
    assert_eq!(
        client.wait_for_solve().await,
        Some(SolveStatus::Succeeded(solved.clone()))
    );
    assert_eq!(handle.requests(), 2);
    assert_eq!(
        client.conductor().session().last_solved_image(),
        Some(&solved)
    );
    assert_eq!(client.state(), ConductorState::Ready);
    assert!(client.wait_for_solve().await.is_none());
}

// ============================================================================
// Progress
// ============================================================================

/// Capped while pending, 100 at resolution, 0 after the delay
#[tokio::test(start_paused = true)]
async fn test_progress_lifecycle() {
    let (backend, handle) = IntegrationMockBackend::new().gated();
    let mut client = started(backend, manual_config()).await;
    line(&mut client, "start").await;
    upload(&mut client, "puzzle.png").await;
    line(&mut client, "solve").await;
    assert_eq!(client.conductor().progress_value(), 0);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(client.conductor().progress_value(), 90);
    client.poll_solve().await;
    let progress: Vec<u8> = client
        .recv_all()
        .into_iter()
        .filter_map(|m| match m {
            ConductorMessage::Progress { percent } => Some(percent),
            _ => None,
        })
        .collect();
    assert!(progress.iter().all(|p| *p <= 90));

    handle.release();
    client.wait_for_solve().await;
    assert_eq!(client.conductor().progress_value(), 100);

    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(client.conductor().progress_value(), 0);
}

/// A new solve restarts from 0 and the previous reset does not clobber it
#[tokio::test(start_paused = true)]
async fn test_progress_restart_not_clobbered() {
    let (backend, handle) = IntegrationMockBackend::new().gated();
    let mut client = started(backend, manual_config()).await;
    line(&mut client, "start").await;
    upload(&mut client, "one.png").await;
    line(&mut client, "solve").await;
    handle.release();
    client.wait_for_solve().await;
    assert_eq!(client.conductor().progress_value(), 100);

    // Second solve inside the first one's reset delay
    upload(&mut client, "two.png").await;
    line(&mut client, "solve").await;
    assert_eq!(client.conductor().progress_value(), 0);

    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert_eq!(client.conductor().progress_value(), 20);

    handle.release();
    client.wait_for_solve().await;
}

// ============================================================================
// Display
// ============================================================================

/// The TUI display state mirrors the Conductor transcript
#[tokio::test]
async fn test_display_state_mirrors_transcript() {
    let mut client = ConductorClient::with_backend(IntegrationMockBackend::new(), manual_config());
    let mut display = DisplayState::new();
    let mut requests = Vec::new();

    client.start().await.unwrap();
    client.connect().await.unwrap();
    line(&mut client, "start").await;
    line(&mut client, "upload").await;
    client
        .file_selected("puzzle.png".to_string(), vec![1, 2, 3])
        .await
        .unwrap();
    line(&mut client, "solve").await;
    client.wait_for_solve().await;

    for msg in client.recv_all() {
        requests.extend(display.apply_message(msg));
    }

    let expected: Vec<EntryKind> = log(&client).into_iter().map(|(kind, _)| kind).collect();
    let shown: Vec<EntryKind> = display.entries.iter().map(|e| e.kind).collect();
    assert_eq!(shown, expected);
    assert_eq!(
        display.entries.last().map(|e| e.content.as_str()),
        Some("https://solver.test/solved/puzzle.png")
    );
    assert!(requests.contains(&SurfaceRequest::OpenFilePicker));
    assert!(matches!(display.solve_status, SolveStatus::Succeeded(_)));
    assert_eq!(display.progress, 100);

    line(&mut client, "clear").await;
    for msg in client.recv_all() {
        display.apply_message(msg);
    }
    assert_eq!(display.entries.len(), 1);
    assert_eq!(display.entries[0].content, WELCOME_MESSAGE);
}
