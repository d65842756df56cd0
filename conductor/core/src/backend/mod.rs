//! Solver Backend Integration
//!
//! Abstracted access to the Sudoku solver through a common trait.
//!
//! # Available Backends
//!
//! - **HTTP**: a solver web service (default `http://localhost:3000`)
//!
//! # Usage
//!
//! ```ignore
//! use sudosolve_core::backend::{HttpSolveBackend, SolveBackend, SolveRequest};
//!
//! let backend = HttpSolveBackend::new("http://localhost:3000", Duration::from_secs(120))?;
//! let solved = backend.solve(&SolveRequest::new("puzzle.png", bytes)).await?;
//! ```

mod http;
mod traits;

pub use http::HttpSolveBackend;
pub use traits::{BackendConfig, SolveBackend, SolveRequest, DEFAULT_BACKEND_URL};
