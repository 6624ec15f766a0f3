//! sweep-core — the synchronous half of sweeprun.
//!
//! Everything here is deterministic transformation of strings and files:
//!
//! - `RunConfig`: immutable per-run settings built by the CLI
//! - `JobDescriptor`: one flat JSON parameter file per sweep leaf
//! - Template rendering: `{name}` substitution into commands and files
//! - Shell-word splitting of rendered commands into argv
//!
//! Process management lives in `sweep-exec`; nothing in this crate spawns
//! a child or blocks.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod render;
pub mod shell;

pub use config::RunConfig;
pub use descriptor::JobDescriptor;
pub use error::{CoreError, CoreResult};
pub use render::{RenderedJob, prepare, render, render_file};
