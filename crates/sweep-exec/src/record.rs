//! Lifecycle records for launched children.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

/// Terminal (or in-flight) state of one launched process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Running,
    Complete,
    Failed,
    /// Only ever set by the cancellation sequence, never by a natural exit.
    Terminated,
}

impl std::fmt::Display for ProcessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessState::Running => write!(f, "RUNNING"),
            ProcessState::Complete => write!(f, "COMPLETE"),
            ProcessState::Failed => write!(f, "FAILED"),
            ProcessState::Terminated => write!(f, "TERMINATED"),
        }
    }
}

/// Everything recorded about one child that was actually launched.
///
/// Jobs that never launch (dry runs, descriptor or launch failures)
/// get no record. `state == Running` exactly while `end_time` is unset.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRecord {
    pub command: String,
    pub working_dir: PathBuf,
    pub pid: u32,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub exit_status: Option<i32>,
    pub state: ProcessState,
}

impl ProcessRecord {
    pub fn new(command: String, working_dir: PathBuf, pid: u32) -> Self {
        ProcessRecord {
            command,
            working_dir,
            pid,
            start_time: Utc::now(),
            end_time: None,
            exit_status: None,
            state: ProcessState::Running,
        }
    }

    /// Finalize after a natural exit: `Complete` for status 0, `Failed`
    /// otherwise.
    pub fn complete(&mut self, exit_status: i32) {
        self.exit_status = Some(exit_status);
        self.end_time = Some(Utc::now());
        self.state = if exit_status == 0 {
            ProcessState::Complete
        } else {
            ProcessState::Failed
        };
    }

    /// Finalize after the cancellation sequence signaled this child.
    pub fn terminate(&mut self) {
        self.end_time = Some(Utc::now());
        self.state = ProcessState::Terminated;
    }

    /// Wall-clock run time, once the record is terminal.
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        self.end_time.map(|end| end - self.start_time)
    }
}
