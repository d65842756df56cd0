//! Conductor Client
//!
//! Thin wrapper around the Conductor for TUI integration.
//! This client embeds the Conductor directly (no network) and provides
//! a convenient interface for sending events and receiving messages.
//!
//! # Architecture
//!
//! The TUI holds no session logic. Everything the user types goes to the
//! Conductor as a `SurfaceEvent`; everything the TUI draws comes back as a
//! `ConductorMessage`. The TUI's job is:
//! 1. Convert key presses and file reads to SurfaceEvents
//! 2. Send SurfaceEvents to the Conductor
//! 3. Receive ConductorMessages
//! 4. Render display state and perform requested side effects

use tokio::sync::mpsc;

use sudosolve_core::{
    Conductor, ConductorConfig, ConductorMessage, ConductorState, HttpSolveBackend, SolveBackend,
    SolveStatus, SurfaceCapabilities, SurfaceEvent, SurfaceType,
};

/// Capacity of the Conductor -> TUI channel
///
/// The Conductor awaits on send from inside the same loop that drains the
/// channel, so this must hold everything one event can produce.
const CHANNEL_CAPACITY: usize = 1024;

/// Client for communicating with the embedded Conductor
pub struct ConductorClient<B: SolveBackend + 'static = HttpSolveBackend> {
    /// The embedded Conductor instance
    conductor: Conductor<B>,
    /// Receiver for messages from Conductor
    rx: mpsc::Receiver<ConductorMessage>,
}

impl ConductorClient<HttpSolveBackend> {
    /// Create a client talking to the HTTP solver named in `config`
    pub fn new(config: ConductorConfig) -> anyhow::Result<Self> {
        let backend = HttpSolveBackend::from_config(&config.backend)?;
        Ok(Self::with_backend(backend, config))
    }
}

impl<B: SolveBackend + 'static> ConductorClient<B> {
    /// Create a client around an arbitrary solver backend
    pub fn with_backend(backend: B, config: ConductorConfig) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let conductor = Conductor::new(backend, config, tx);
        Self { conductor, rx }
    }

    /// Start the Conductor (health check, initial state)
    pub async fn start(&mut self) -> anyhow::Result<()> {
        self.conductor.start().await
    }

    /// Connect this surface to the Conductor
    pub async fn connect(&mut self) -> anyhow::Result<()> {
        self.send_event(SurfaceEvent::Connected {
            event_id: SurfaceEvent::new_event_id(),
            surface_type: SurfaceType::Tui,
            capabilities: SurfaceCapabilities::tui(),
        })
        .await
    }

    /// Submit a line typed at the prompt
    pub async fn send_line(&mut self, line: String) -> anyhow::Result<()> {
        self.send_event(SurfaceEvent::input(line)).await
    }

    /// Hand a picked file to the Conductor
    pub async fn file_selected(&mut self, name: String, data: Vec<u8>) -> anyhow::Result<()> {
        self.send_event(SurfaceEvent::file_selected(name, data))
            .await
    }

    /// The user dismissed the file prompt
    pub async fn picker_cancelled(&mut self) -> anyhow::Result<()> {
        self.send_event(SurfaceEvent::FilePickerCancelled {
            event_id: SurfaceEvent::new_event_id(),
        })
        .await
    }

    /// Report a failed download
    pub async fn save_failed(&mut self, error: String) -> anyhow::Result<()> {
        self.send_event(SurfaceEvent::SaveFailed {
            event_id: SurfaceEvent::new_event_id(),
            error,
        })
        .await
    }

    /// Request quit
    pub async fn request_quit(&mut self) -> anyhow::Result<()> {
        self.send_event(SurfaceEvent::QuitRequested {
            event_id: SurfaceEvent::new_event_id(),
        })
        .await
    }

    /// Poll the solve task and progress (call once per frame)
    pub async fn poll_solve(&mut self) -> bool {
        self.conductor.poll_solve().await
    }

    /// Wait for the pending solve, if any, to resolve
    pub async fn wait_for_solve(&mut self) -> Option<SolveStatus> {
        self.conductor.wait_for_solve().await
    }

    /// Try to receive a message from the Conductor (non-blocking)
    pub fn try_recv(&mut self) -> Option<ConductorMessage> {
        self.rx.try_recv().ok()
    }

    /// Receive all pending messages (non-blocking)
    pub fn recv_all(&mut self) -> Vec<ConductorMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            messages.push(msg);
        }
        messages
    }

    /// Get current Conductor state
    pub fn state(&self) -> ConductorState {
        self.conductor.state()
    }

    /// Check if Conductor is ready
    pub fn is_ready(&self) -> bool {
        self.conductor.is_ready()
    }

    /// Borrow the embedded Conductor
    pub fn conductor(&self) -> &Conductor<B> {
        &self.conductor
    }

    async fn send_event(&mut self, event: SurfaceEvent) -> anyhow::Result<()> {
        self.conductor.handle_event(event).await
    }
}
