//! The process-pool scheduler.
//!
//! One control task owns all pool state. Filling pulls descriptor paths
//! in input order and launches children until the concurrency limit is
//! reached; the loop then blocks on a single completion queue fed by one
//! waiter task per child, finalizes the record for whichever child
//! exited, and launches a replacement. Under stop-on-error any job
//! failure runs the cancellation sequence: every in-flight child is
//! signaled (best effort, without waiting for it to die) and its record
//! is marked TERMINATED.
//!
//! Per-job failures never escape the loop; they surface through logging,
//! the record list, and the `aborted` flag.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::process::Child;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use sweep_core::{JobDescriptor, RunConfig, render};

use crate::error::{ExecError, ExecResult};
use crate::launch::{LaunchOutcome, launch};
use crate::record::ProcessRecord;

/// What a waiter reports back to the control loop. Each waiter sends
/// exactly one event.
enum PoolEvent {
    /// The child exited on its own. A child killed by an outside signal
    /// reports exit status -1.
    Exited { pid: u32, exit_status: i32 },
    /// The kill trigger fired and the signal was issued.
    Signaled { pid: u32 },
}

/// One pool slot: the record plus the trigger that tells the waiter to
/// kill its child.
#[derive(Debug)]
struct InFlight {
    record: ProcessRecord,
    kill: oneshot::Sender<()>,
}

/// Everything a finished run reports.
#[derive(Debug)]
pub struct RunOutcome {
    /// One record per launched job, in completion order.
    pub records: Vec<ProcessRecord>,
    /// True when the stop-on-error cancellation sequence ran.
    pub aborted: bool,
}

/// The bounded pool of in-flight children.
#[derive(Debug)]
pub struct ProcessPool<'a> {
    config: &'a RunConfig,
    /// pid → in-flight slot. Never grows past `config.max_procs`.
    running: HashMap<u32, InFlight>,
    /// Finalized records, appended as children finish.
    finished: Vec<ProcessRecord>,
    events_tx: mpsc::UnboundedSender<PoolEvent>,
    events_rx: mpsc::UnboundedReceiver<PoolEvent>,
}

impl<'a> ProcessPool<'a> {
    /// Build a pool for one run. Rejects a zero concurrency limit before
    /// any job is pulled.
    pub fn new(config: &'a RunConfig) -> ExecResult<Self> {
        if config.max_procs == 0 {
            return Err(ExecError::InvalidConcurrency(config.max_procs));
        }
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Ok(ProcessPool {
            config,
            running: HashMap::new(),
            finished: Vec::new(),
            events_tx,
            events_rx,
        })
    }

    /// Drive the run to completion over the given descriptor paths.
    pub async fn run(mut self, job_files: &[PathBuf]) -> RunOutcome {
        let mut files = job_files.iter();
        let mut exhausted = false;

        loop {
            // Fill: pull jobs until the pool is at capacity or input runs out.
            while !exhausted && self.running.len() < self.config.max_procs {
                let Some(path) = files.next() else {
                    exhausted = true;
                    break;
                };
                match self.start_job(path) {
                    Ok(_) => {}
                    Err(err) => {
                        error!(job = %path.display(), %err, "job failed to start");
                        if self.config.stop_on_error {
                            self.cancel_all().await;
                            return self.finish(true);
                        }
                    }
                }
            }

            // Filling only stops with an empty pool once input is
            // exhausted; skips and failed starts never hold a slot.
            if self.running.is_empty() {
                return self.finish(false);
            }

            // The sole suspension point: any child exited.
            let Some(event) = self.events_rx.recv().await else {
                return self.finish(false);
            };
            let PoolEvent::Exited { pid, exit_status } = event else {
                // Signaled events only appear after cancel_all has
                // drained the pool.
                continue;
            };
            let Some(slot) = self.running.remove(&pid) else {
                continue;
            };

            let mut record = slot.record;
            record.complete(exit_status);
            if exit_status == 0 {
                info!(pid, dir = %record.working_dir.display(), "finished with 0");
                self.finished.push(record);
            } else {
                warn!(
                    pid,
                    dir = %record.working_dir.display(),
                    exit_status,
                    "finished with non-zero exit status"
                );
                self.finished.push(record);
                if self.config.stop_on_error {
                    self.cancel_all().await;
                    return self.finish(true);
                }
            }
        }
    }

    /// Load, render, and launch one job. `Ok(true)` means a pool slot
    /// was taken; dry runs return `Ok(false)`. All descriptor, render,
    /// and launch failures come back as one error taxonomy.
    fn start_job(&mut self, path: &Path) -> ExecResult<bool> {
        let descriptor = JobDescriptor::load(path)?;
        let rendered = render::prepare(self.config, &descriptor)?;

        match launch(&rendered, self.config.log_file.as_deref(), self.config.dry_run)? {
            LaunchOutcome::Skipped => Ok(false),
            LaunchOutcome::Started { child, record } => {
                let pid = record.pid;
                let (kill_tx, kill_rx) = oneshot::channel();
                spawn_waiter(child, pid, kill_rx, self.events_tx.clone());
                self.running.insert(pid, InFlight { record, kill: kill_tx });
                Ok(true)
            }
        }
    }

    /// The cancellation sequence: signal every in-flight child, mark its
    /// record TERMINATED now, and confirm each signal was issued. Does
    /// not wait for any child to actually die.
    async fn cancel_all(&mut self) {
        warn!("stopping all remaining processes");
        let in_flight = self.running.len();
        for (pid, slot) in self.running.drain() {
            debug!(pid, "signaling termination");
            let _ = slot.kill.send(());
            let mut record = slot.record;
            record.terminate();
            self.finished.push(record);
        }
        // One event per waiter: either the kill confirmation or a natural
        // exit that raced it.
        for _ in 0..in_flight {
            let _ = self.events_rx.recv().await;
        }
    }

    fn finish(self, aborted: bool) -> RunOutcome {
        RunOutcome {
            records: self.finished,
            aborted,
        }
    }
}

/// One lightweight waiter per child: block on that child alone and
/// report into the shared completion queue. This composes a portable
/// "wait for any pool member" out of per-child waits.
fn spawn_waiter(
    mut child: Child,
    pid: u32,
    mut kill_rx: oneshot::Receiver<()>,
    events: mpsc::UnboundedSender<PoolEvent>,
) {
    tokio::spawn(async move {
        tokio::select! {
            status = child.wait() => {
                let exit_status = match status {
                    Ok(status) => status.code().unwrap_or(-1),
                    Err(err) => {
                        error!(pid, %err, "wait failed");
                        -1
                    }
                };
                let _ = events.send(PoolEvent::Exited { pid, exit_status });
            }
            _ = &mut kill_rx => {
                if let Err(err) = child.start_kill() {
                    debug!(pid, %err, "kill failed");
                }
                let _ = events.send(PoolEvent::Signaled { pid });
            }
        }
    });
}
