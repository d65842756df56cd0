//! Conductor - The Session Engine
//!
//! The Conductor is the "brain" of SudoSolve. It owns:
//! - the transcript and the session state
//! - the command interpreter
//! - the solve task orchestrator and its progress estimate
//! - the channel to the connected UI surface
//!
//! # Design Philosophy
//!
//! The Conductor is UI-agnostic. It doesn't know whether it is talking to a
//! terminal, a test harness or something else. It communicates through:
//! - `ConductorMessage`: Commands sent TO the UI surface
//! - `SurfaceEvent`: Events received FROM the UI surface
//!
//! It is driven from a single event loop: the surface calls
//! [`Conductor::handle_event`] for every user action and
//! [`Conductor::poll_solve`] once per frame. All state is behind `&mut self`;
//! the only concurrent piece is the spawned solver call.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::backend::SolveBackend;
use crate::config::ConductorConfig;
use crate::error::CommandError;
use crate::events::{SurfaceCapabilities, SurfaceEvent, SurfaceType};
use crate::interpreter::{Effect, Interpreter, SOLVED_MESSAGE};
use crate::messages::{ConductorMessage, ConductorState, EventId, NotifyLevel};
use crate::progress::ProgressEstimator;
use crate::session::SessionState;
use crate::tasks::{SolveOrchestrator, SolveOutcome, SolveStatus};
use crate::transcript::{OutputEntry, Transcript};

/// The Conductor - headless session engine
pub struct Conductor<B: SolveBackend + 'static> {
    /// Configuration
    config: ConductorConfig,
    /// Current session
    session: SessionState,
    /// Output log
    transcript: Transcript,
    /// Command rules
    interpreter: Interpreter,
    /// Single-flight solver runner
    orchestrator: SolveOrchestrator<B>,
    /// Synthetic progress
    progress: ProgressEstimator,
    /// Last progress value forwarded to the surface
    progress_rx: watch::Receiver<u8>,
    /// Current operational state
    state: ConductorState,
    /// Channel to send messages to UI surface
    tx: mpsc::Sender<ConductorMessage>,
    /// Connected surface info
    surface_type: Option<SurfaceType>,
    surface_capabilities: Option<SurfaceCapabilities>,
}

impl<B: SolveBackend + 'static> Conductor<B> {
    /// Create a new Conductor with the given backend
    pub fn new(backend: B, config: ConductorConfig, tx: mpsc::Sender<ConductorMessage>) -> Self {
        let progress = ProgressEstimator::new(config.progress);
        let progress_rx = progress.subscribe();

        Self {
            session: SessionState::new(),
            transcript: Transcript::new(config.welcome_on_reset),
            interpreter: Interpreter::new(&config),
            orchestrator: SolveOrchestrator::new(Arc::new(backend)),
            progress,
            progress_rx,
            state: ConductorState::Initializing,
            tx,
            surface_type: None,
            surface_capabilities: None,
            config,
        }
    }

    /// Configuration
    pub fn config(&self) -> &ConductorConfig {
        &self.config
    }

    /// Current session state
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// The output log
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Status of the solve task
    pub fn solve_status(&self) -> SolveStatus {
        self.orchestrator.status()
    }

    /// Current progress estimate
    pub fn progress_value(&self) -> u8 {
        self.progress.value()
    }

    /// Get current state
    pub fn state(&self) -> ConductorState {
        self.state
    }

    /// Connected surface, if any
    pub fn surface_type(&self) -> Option<&SurfaceType> {
        self.surface_type.as_ref()
    }

    /// Whether the Conductor accepts input
    pub fn is_ready(&self) -> bool {
        self.state.accepts_input()
    }

    /// Start the Conductor
    ///
    /// An unreachable solver is reported but does not stop startup.
    pub async fn start(&mut self) -> anyhow::Result<()> {
        self.set_state(ConductorState::Initializing).await;

        let backend = Arc::clone(self.orchestrator.backend());
        if backend.health_check().await {
            tracing::info!(backend = backend.name(), url = %self.config.backend.url, "Solver reachable");
        } else {
            tracing::warn!(backend = backend.name(), url = %self.config.backend.url, "Solver not reachable");
            self.notify(
                NotifyLevel::Warning,
                &format!(
                    "Solver at {} is not reachable - solving will fail until it is",
                    self.config.backend.url
                ),
            )
            .await;
        }

        self.set_state(ConductorState::Ready).await;
        self.send_session_info().await;
        Ok(())
    }

    /// Handle an event from the UI surface
    pub async fn handle_event(&mut self, event: SurfaceEvent) -> anyhow::Result<()> {
        match event {
            SurfaceEvent::Connected {
                event_id,
                surface_type,
                capabilities,
            } => {
                tracing::info!(surface = surface_type.name(), "Surface connected");
                self.surface_type = Some(surface_type);
                self.surface_capabilities = Some(capabilities);
                self.ack(event_id).await;

                // Bring the new surface up to date
                self.send(ConductorMessage::State { state: self.state })
                    .await;
                self.send(ConductorMessage::TranscriptSnapshot {
                    entries: self.transcript.entries().to_vec(),
                })
                .await;
                self.send(ConductorMessage::SolveState {
                    status: self.orchestrator.status(),
                })
                .await;
                self.send_session_info().await;
            }

            SurfaceEvent::Disconnected { event_id, reason } => {
                tracing::info!(reason = ?reason, "Surface disconnected");
                self.surface_type = None;
                self.surface_capabilities = None;
                self.ack(event_id).await;
            }

            SurfaceEvent::Input { event_id, line } => {
                self.ack(event_id).await;
                if self.state == ConductorState::ShuttingDown {
                    tracing::debug!("Ignoring input during shutdown");
                    return Ok(());
                }
                let before = self.transcript.len();
                let effect = self.interpreter.handle_line(
                    &line,
                    &mut self.session,
                    &mut self.transcript,
                    self.orchestrator.is_pending(),
                );
                self.send(ConductorMessage::ClearInput).await;
                self.publish(before, effect).await;
            }

            SurfaceEvent::FileSelected {
                event_id,
                name,
                data,
            } => {
                self.ack(event_id).await;
                let before = self.transcript.len();
                let effect = self.interpreter.stage_upload(
                    &name,
                    data,
                    &mut self.session,
                    &mut self.transcript,
                    self.orchestrator.is_pending(),
                );
                self.publish(before, effect).await;
            }

            SurfaceEvent::FilePickerCancelled { event_id } => {
                self.ack(event_id).await;
                let before = self.transcript.len();
                let effect = self.interpreter.cancel_upload(&mut self.transcript);
                self.publish(before, effect).await;
            }

            SurfaceEvent::SaveFailed { event_id, error } => {
                self.ack(event_id).await;
                tracing::warn!(error = %error, "Surface failed to save image");
                let before = self.transcript.len();
                self.transcript
                    .append(OutputEntry::error(format!("Failed to save image: {error}")));
                self.forward_entries(before).await;
            }

            SurfaceEvent::QuitRequested { event_id } => {
                self.ack(event_id).await;
                self.shutdown().await?;
            }

            SurfaceEvent::SurfaceError {
                event_id,
                error,
                recoverable,
            } => {
                self.ack(event_id).await;
                if recoverable {
                    tracing::warn!(error = %error, "Recoverable surface error");
                } else {
                    tracing::error!(error = %error, "Fatal surface error");
                    self.shutdown().await?;
                }
            }
        }

        Ok(())
    }

    /// Forward new entries and carry out an interpreter effect
    async fn publish(&mut self, before: usize, effect: Effect) {
        if let Effect::Cleared { .. } = effect {
            self.send(ConductorMessage::TranscriptReset {
                welcome: self.transcript.last().cloned(),
            })
            .await;
        } else {
            self.forward_entries(before).await;
        }

        match effect {
            Effect::None => {}
            Effect::OpenFilePicker => {
                self.send(ConductorMessage::OpenFilePicker).await;
            }
            Effect::SubmitSolve(image) => match self.orchestrator.submit(&image) {
                Ok(_) => {
                    self.progress.begin();
                    self.set_state(ConductorState::Solving).await;
                    self.send(ConductorMessage::SolveState {
                        status: SolveStatus::Pending,
                    })
                    .await;
                }
                Err(e) => {
                    let error = CommandError::from(e);
                    tracing::warn!(
                        category = error.category().as_str(),
                        "Solve submission rejected"
                    );
                }
            },
            Effect::SaveImage { image, filename } => {
                tracing::info!(filename = %filename, image = %image.summary(), "Requesting image save");
                self.send(ConductorMessage::SaveImage { image, filename })
                    .await;
            }
            Effect::Cleared { session_reset } => {
                if session_reset {
                    // Also tears down a reset timer left by the last solve
                    self.progress.cancel();
                    if self.orchestrator.orphan_pending() {
                        self.send(ConductorMessage::SolveState {
                            status: SolveStatus::Idle,
                        })
                        .await;
                        self.set_state(ConductorState::Ready).await;
                    }
                }
            }
        }

        self.send_session_info().await;
    }

    /// Send every entry appended since `before`
    async fn forward_entries(&self, before: usize) {
        for entry in self.transcript.entries().iter().skip(before) {
            self.send(ConductorMessage::Entry {
                entry: entry.clone(),
            })
            .await;
        }
    }

    /// Check the solve task and progress estimate (non-blocking)
    ///
    /// Call once per frame. Returns whether anything was sent to the surface.
    pub async fn poll_solve(&mut self) -> bool {
        let mut changed = false;
        if let Some(outcome) = self.orchestrator.try_take_outcome() {
            self.apply_outcome(outcome).await;
            changed = true;
        }
        changed | self.forward_progress().await
    }

    /// Wait for the pending solve to resolve and apply it
    ///
    /// Returns `None` when nothing is pending.
    pub async fn wait_for_solve(&mut self) -> Option<SolveStatus> {
        let outcome = self.orchestrator.next_outcome().await?;
        let status = outcome.status();
        let orphaned = outcome.orphaned;
        self.apply_outcome(outcome).await;
        self.forward_progress().await;
        if orphaned {
            Some(SolveStatus::Idle)
        } else {
            Some(status)
        }
    }

    async fn forward_progress(&mut self) -> bool {
        if !self.progress_rx.has_changed().unwrap_or(false) {
            return false;
        }
        let percent = *self.progress_rx.borrow_and_update();
        self.send(ConductorMessage::Progress { percent }).await;
        true
    }

    /// Record a resolved solve in the session and transcript
    async fn apply_outcome(&mut self, outcome: SolveOutcome) {
        let elapsed_ms = u64::try_from(outcome.elapsed.as_millis()).unwrap_or(u64::MAX);

        // The surface went Idle when the session was reset
        if outcome.orphaned {
            tracing::info!(
                task_id = %outcome.task_id,
                elapsed_ms,
                "Discarding outcome of orphaned solve task"
            );
            return;
        }

        let before = self.transcript.len();
        match &outcome.result {
            Ok(image) => {
                tracing::info!(task_id = %outcome.task_id, upload = %outcome.upload, elapsed_ms, "Puzzle solved");
                self.session
                    .record_solve_success(image.clone(), outcome.upload);
                self.transcript.append(OutputEntry::response(SOLVED_MESSAGE));
                self.transcript.append(OutputEntry::image(image.clone()));
            }
            Err(message) => {
                let error = CommandError::SolveFailure(message.clone());
                tracing::warn!(
                    task_id = %outcome.task_id,
                    upload = %outcome.upload,
                    elapsed_ms,
                    category = error.category().as_str(),
                    error = %message,
                    "Solve failed"
                );
                self.session.record_solve_failure(message.clone());
                self.transcript.append(OutputEntry::error(error.to_string()));
            }
        }
        self.progress.finish();

        self.forward_entries(before).await;
        self.send(ConductorMessage::SolveState {
            status: outcome.status(),
        })
        .await;
        self.set_state(ConductorState::Ready).await;
        self.send_session_info().await;
    }

    /// Shutdown the Conductor
    pub async fn shutdown(&mut self) -> anyhow::Result<()> {
        if self.state == ConductorState::ShuttingDown {
            return Ok(());
        }
        self.set_state(ConductorState::ShuttingDown).await;
        self.progress.cancel();

        self.send(ConductorMessage::Quit { message: None }).await;
        Ok(())
    }

    /// Set state and notify UI
    async fn set_state(&mut self, state: ConductorState) {
        self.state = state;
        self.send(ConductorMessage::State { state }).await;
    }

    async fn send_session_info(&self) {
        self.send(ConductorMessage::SessionInfo {
            session: self.session.snapshot(),
        })
        .await;
    }

    /// Send acknowledgment
    async fn ack(&self, event_id: EventId) {
        self.send(ConductorMessage::Ack { event_id }).await;
    }

    /// Send notification
    async fn notify(&self, level: NotifyLevel, message: &str) {
        self.send(ConductorMessage::Notify {
            level,
            message: message.to_string(),
        })
        .await;
    }

    /// Send a message to the UI surface
    async fn send(&self, msg: ConductorMessage) {
        if let Err(e) = self.tx.send(msg).await {
            tracing::warn!("Failed to send message to surface: {}", e);
        }
    }
}
