//! SudoSolve Core - Headless Session Engine
//!
//! This crate provides the interactive command session behind the SudoSolve
//! terminal, completely independent of any UI framework. It can drive the
//! terminal surface or run headless for testing and automation.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         UI Surfaces                              │
//! │        ┌──────────────────┐         ┌──────────────────┐         │
//! │        │  TUI (ratatui)   │         │ Headless / tests │         │
//! │        └────────┬─────────┘         └────────┬─────────┘         │
//! │                 └──────────────┬─────────────┘                   │
//! │                       SurfaceEvent (up)                          │
//! │                     ConductorMessage (down)                      │
//! └────────────────────────────────┼─────────────────────────────────┘
//!                                  │
//! ┌────────────────────────────────┼─────────────────────────────────┐
//! │                        SUDOSOLVE CORE                            │
//! │  ┌─────────────────────────────┴──────────────────────────────┐  │
//! │  │                        Conductor                           │  │
//! │  │  ┌─────────────┐  ┌─────────┐  ┌────────────┐  ┌────────┐  │  │
//! │  │  │ Interpreter │  │ Session │  │ Transcript │  │Progress│  │  │
//! │  │  └─────────────┘  └─────────┘  └────────────┘  └────────┘  │  │
//! │  │  ┌──────────────────────┐   ┌───────────────────────────┐  │  │
//! │  │  │  Solve Orchestrator  │──▶│ SolveBackend (HTTP, mock) │  │  │
//! │  │  └──────────────────────┘   └───────────────────────────┘  │  │
//! │  └────────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Conductor`]: Owns the session and executes commands
//! - [`ConductorMessage`]: Messages sent from Conductor to UI surfaces
//! - [`SurfaceEvent`]: Events sent from UI surfaces to Conductor
//! - [`Transcript`]: Append-only output log
//! - [`SessionState`]: Initialized flag, staged and solved images
//! - [`SolveOrchestrator`]: Single-flight solver runner
//!
//! # Quick Start
//!
//! ```ignore
//! use sudosolve_core::{
//!     backend::HttpSolveBackend, config::load_config, Conductor, SurfaceEvent,
//! };
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let (tx, mut rx) = mpsc::channel(1024);
//!
//!     let config = load_config()?;
//!     let backend = HttpSolveBackend::from_config(&config.backend)?;
//!     let mut conductor = Conductor::new(backend, config, tx);
//!     conductor.start().await?;
//!
//!     conductor.handle_event(SurfaceEvent::input("start")).await?;
//!
//!     loop {
//!         while let Ok(msg) = rx.try_recv() {
//!             // Render message
//!         }
//!         conductor.poll_solve().await;
//!     }
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`transcript`]: The output log and its entries
//! - [`session`]: Per-session state
//! - [`commands`]: Command words and parsing
//! - [`interpreter`]: Command rules and effects
//! - [`progress`]: Synthetic solve progress
//! - [`tasks`]: Solve task orchestration
//! - [`backend`]: Solver abstraction and HTTP adapter
//! - [`image`]: Staged uploads and solved image references
//! - [`error`]: User-facing command errors
//! - [`config`]: TOML / environment / CLI configuration
//! - [`events`]: Events from UI surfaces to Conductor
//! - [`messages`]: Messages from Conductor to UI surfaces
//! - [`conductor`]: Main Conductor struct
//!
//! # No TUI Dependencies
//!
//! This crate has **zero** dependencies on ratatui, crossterm, or any other
//! UI framework.

#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod commands;
pub mod conductor;
pub mod config;
pub mod error;
pub mod events;
pub mod image;
pub mod interpreter;
pub mod messages;
pub mod progress;
pub mod session;
pub mod tasks;
pub mod transcript;

// Re-exports for convenience
pub use backend::{BackendConfig, HttpSolveBackend, SolveBackend, SolveRequest};
pub use commands::{available_commands, Command};
pub use conductor::Conductor;
pub use config::{
    default_config_path, load_config, load_config_from_path, ConductorConfig, ConductorToml,
    ConfigError, ConfigOverrides, ConfigSource,
};
pub use error::{CommandError, ErrorCategory, SubmitError};
pub use events::{SurfaceCapabilities, SurfaceEvent, SurfaceType};
pub use image::{ImageDecodeError, ImageRef, StagedImage, UploadId};
pub use interpreter::{Effect, Interpreter};
pub use messages::{ConductorMessage, ConductorState, EventId, NotifyLevel, SessionId};
pub use progress::{ProgressConfig, ProgressEstimator, ProgressPhase};
pub use session::{MacroState, SessionSnapshot, SessionState};
pub use tasks::{SolveOrchestrator, SolveOutcome, SolveStatus, TaskId};
pub use transcript::{EntryKind, EntryPayload, OutputEntry, Transcript, WELCOME_MESSAGE};
