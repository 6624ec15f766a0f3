//! sweep-exec — child-process execution for sweeprun.
//!
//! The pieces, leaves first:
//!
//! - `ProcessRecord`: lifecycle of one launched child (times, exit
//!   status, terminal state)
//! - `launch`: start one child with its output redirected, or trace it
//!   in dry-run mode
//! - `ProcessPool`: the control loop — fills to the concurrency limit,
//!   blocks on "any child exited", finalizes records, and enforces the
//!   stop-on-error policy
//! - `summary`: the post-run tab-delimited table
//!
//! # Architecture
//!
//! ```text
//! ProcessPool (single control task, owns all state)
//!   ├── per-child waiter task ──┐
//!   ├── per-child waiter task ──┼── mpsc completion queue
//!   └── per-child waiter task ──┘
//! ```
//!
//! Concurrency is expressed purely through OS children; the control task
//! is the only writer of pool state, so there are no locks.

pub mod error;
pub mod launch;
pub mod pool;
pub mod record;
pub mod summary;

pub use error::{ExecError, ExecResult};
pub use launch::{LaunchOutcome, launch};
pub use pool::{ProcessPool, RunOutcome};
pub use record::{ProcessRecord, ProcessState};
pub use summary::{format_summary, write_summary};
