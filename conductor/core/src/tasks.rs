//! Solve Task Orchestration
//!
//! Runs the solver for a staged image as a background task and hands its
//! outcome back exactly once.
//!
//! # Design Philosophy
//!
//! Single flight: at most one solve is pending at a time and a second
//! submission is rejected rather than queued. The backend call runs on the
//! tokio runtime; only its result crosses back over a oneshot channel. The
//! orchestrator never touches session state. The Conductor takes the outcome
//! and decides what to record.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use crate::backend::{SolveBackend, SolveRequest};
use crate::error::SubmitError;
use crate::image::{ImageRef, StagedImage, UploadId};

/// Failure text when the task died without reporting
pub const TASK_ENDED_UNEXPECTEDLY: &str = "Solve task ended unexpectedly";

/// Task identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl TaskId {
    /// Create a new task ID from a string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new unique task ID
    pub fn generate() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        use std::time::{SystemTime, UNIX_EPOCH};

        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let count = COUNTER.fetch_add(1, Ordering::SeqCst);
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();

        Self(format!("solve_{timestamp}_{count}"))
    }

    /// Get the string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of the solve task
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    /// Nothing submitted, or the last outcome was consumed
    Idle,
    /// The solver is working
    Pending,
    /// The solver returned an image
    Succeeded(ImageRef),
    /// The solver returned an error message
    Failed(String),
}

impl SolveStatus {
    /// Human-readable label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Pending => "Solving",
            Self::Succeeded(_) => "Solved",
            Self::Failed(_) => "Failed",
        }
    }

    /// Whether this status is an outcome
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Failed(_))
    }

    /// Whether a solve is in flight
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The resolved result of one solve task
#[derive(Clone, Debug)]
pub struct SolveOutcome {
    /// Task that produced this outcome
    pub task_id: TaskId,
    /// Upload that was solved
    pub upload: UploadId,
    /// Solved image or error message
    pub result: Result<ImageRef, String>,
    /// Time from submission to resolution
    pub elapsed: Duration,
    /// The session was reset while this task was pending
    pub orphaned: bool,
}

impl SolveOutcome {
    /// Terminal status for this outcome
    #[must_use]
    pub fn status(&self) -> SolveStatus {
        match &self.result {
            Ok(image) => SolveStatus::Succeeded(image.clone()),
            Err(message) => SolveStatus::Failed(message.clone()),
        }
    }
}

struct InFlight {
    task_id: TaskId,
    upload: UploadId,
    started: Instant,
    rx: oneshot::Receiver<Result<ImageRef, String>>,
    orphaned: bool,
}

impl InFlight {
    fn into_outcome(self, result: Result<ImageRef, String>) -> SolveOutcome {
        SolveOutcome {
            task_id: self.task_id,
            upload: self.upload,
            result,
            elapsed: self.started.elapsed(),
            orphaned: self.orphaned,
        }
    }
}

/// Single-flight runner for solve requests
pub struct SolveOrchestrator<B: SolveBackend + 'static> {
    backend: Arc<B>,
    in_flight: Option<InFlight>,
}

impl<B: SolveBackend + 'static> SolveOrchestrator<B> {
    /// Create an idle orchestrator
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            in_flight: None,
        }
    }

    /// Start solving `image`
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `SubmitError::AlreadyPending` if a solve is already in flight.
    /// An orphaned task does not count; its outcome is dropped.
    pub fn submit(&mut self, image: &StagedImage) -> Result<TaskId, SubmitError> {
        match &self.in_flight {
            Some(in_flight) if !in_flight.orphaned => {
                return Err(SubmitError::AlreadyPending {
                    task_id: in_flight.task_id.clone(),
                });
            }
            Some(in_flight) => {
                tracing::debug!(task_id = %in_flight.task_id, "Replacing orphaned solve task");
            }
            None => {}
        }

        let task_id = TaskId::generate();
        let request = SolveRequest::from_staged(image);
        let backend = Arc::clone(&self.backend);
        let (tx, rx) = oneshot::channel();

        tracing::info!(
            task_id = %task_id,
            upload = %image.id,
            name = %image.name,
            backend = backend.name(),
            "Submitting solve task"
        );

        tokio::spawn(async move {
            let result = backend
                .solve(&request)
                .await
                .map_err(|e| format!("{e:#}"));
            // Receiver gone means the orchestrator was dropped
            let _ = tx.send(result);
        });

        self.in_flight = Some(InFlight {
            task_id: task_id.clone(),
            upload: image.id,
            started: Instant::now(),
            rx,
            orphaned: false,
        });
        Ok(task_id)
    }

    /// Take the outcome if the task has resolved, without waiting
    pub fn try_take_outcome(&mut self) -> Option<SolveOutcome> {
        let in_flight = self.in_flight.as_mut()?;
        let result = match in_flight.rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Closed) => Err(TASK_ENDED_UNEXPECTEDLY.to_string()),
        };
        self.in_flight.take().map(|f| f.into_outcome(result))
    }

    /// Wait for the pending task's outcome
    ///
    /// Returns `None` immediately when nothing is pending. Cancel safe.
    pub async fn next_outcome(&mut self) -> Option<SolveOutcome> {
        let in_flight = self.in_flight.as_mut()?;
        let result = (&mut in_flight.rx)
            .await
            .unwrap_or_else(|_| Err(TASK_ENDED_UNEXPECTEDLY.to_string()));
        self.in_flight.take().map(|f| f.into_outcome(result))
    }

    /// Mark the pending task so its outcome is discarded
    ///
    /// Returns whether there was a pending task.
    pub fn orphan_pending(&mut self) -> bool {
        match &mut self.in_flight {
            Some(in_flight) => {
                tracing::debug!(task_id = %in_flight.task_id, "Orphaning pending solve task");
                in_flight.orphaned = true;
                true
            }
            None => false,
        }
    }

    /// Pending or Idle
    #[must_use]
    pub fn status(&self) -> SolveStatus {
        if self.is_pending() {
            SolveStatus::Pending
        } else {
            SolveStatus::Idle
        }
    }

    /// Whether a solve is in flight for the current session
    ///
    /// An orphaned task may still be running but is not pending.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.in_flight.as_ref().is_some_and(|f| !f.orphaned)
    }

    /// Id and upload of the pending task
    #[must_use]
    pub fn pending_task(&self) -> Option<(&TaskId, UploadId)> {
        self.in_flight
            .as_ref()
            .filter(|f| !f.orphaned)
            .map(|f| (&f.task_id, f.upload))
    }

    /// The backend
    #[must_use]
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }
}
