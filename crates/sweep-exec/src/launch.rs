//! Starting one child process.

use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::info;

use sweep_core::{CoreError, RenderedJob, shell};

use crate::error::{ExecError, ExecResult};
use crate::record::ProcessRecord;

/// What `launch` produced.
#[derive(Debug)]
pub enum LaunchOutcome {
    /// Dry run: the command was reported but nothing was started and no
    /// record exists.
    Skipped,
    /// A live child plus its freshly created `Running` record.
    Started {
        child: Child,
        record: ProcessRecord,
    },
}

/// Start the rendered command in its working directory, or trace it in
/// dry-run mode.
///
/// The command is split into argv with shell quoting rules and executed
/// directly. stdout and stderr both go to `log_file` (truncated) inside
/// the working directory; `None` discards them. A spawn failure is
/// `ExecError::Launch` and is distinct from a child that started and
/// exited non-zero.
pub fn launch(
    rendered: &RenderedJob,
    log_file: Option<&str>,
    dry_run: bool,
) -> ExecResult<LaunchOutcome> {
    if dry_run {
        info!(
            dir = %rendered.working_dir.display(),
            command = %rendered.command,
            "dry run"
        );
        return Ok(LaunchOutcome::Skipped);
    }

    let argv = shell::split(&rendered.command)?;
    let (program, args) = argv.split_first().ok_or(CoreError::EmptyCommand)?;

    let (stdout, stderr) = match log_file {
        Some(name) => {
            let path = rendered.working_dir.join(name);
            let log = std::fs::File::create(&path).map_err(|source| ExecError::Io {
                path: path.clone(),
                source,
            })?;
            let log_err = log.try_clone().map_err(|source| ExecError::Io { path, source })?;
            (Stdio::from(log), Stdio::from(log_err))
        }
        None => (Stdio::null(), Stdio::null()),
    };

    let child = Command::new(program)
        .args(args)
        .stdout(stdout)
        .stderr(stderr)
        .current_dir(&rendered.working_dir)
        .spawn()
        .map_err(|source| ExecError::Launch {
            command: rendered.command.clone(),
            source,
        })?;

    // id() is Some until the child has been waited on.
    let pid = child.id().unwrap_or_default();
    info!(pid, dir = %rendered.working_dir.display(), command = %rendered.command, "started");

    let record = ProcessRecord::new(
        rendered.command.clone(),
        rendered.working_dir.clone(),
        pid,
    );
    Ok(LaunchOutcome::Started { child, record })
}
