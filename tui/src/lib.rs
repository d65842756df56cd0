//! SudoSolve TUI - Terminal interface for the SudoSolve session engine
//!
//! A full-screen terminal that mimics a shell: a scrolling transcript, a
//! `$ ` prompt, a progress gauge while the solver works, and a status bar.
//!
//! # Architecture
//!
//! - **ConductorClient**: Embeds the headless Conductor from `sudosolve-core`
//! - **Display**: Display state derived from Conductor messages
//! - **Downloads**: Writes solved images to disk
//! - **Uploads**: Bounded reads of image files typed at the file prompt
//! - **Theme**: Colors per transcript entry kind

pub mod app;
pub mod conductor_client;
pub mod display;
pub mod downloads;
pub mod theme;
pub mod uploads;

pub use app::App;
pub use conductor_client::ConductorClient;
pub use display::{DisplayState, InputMode, SurfaceRequest};
pub use downloads::{ImageSaver, SaveError};
pub use uploads::{read_image_file, ReadError};
