//! sweeprun — substitute values into a template and run commands in
//! parallel.
//!
//! Takes one JSON descriptor file per job (a flat object of string
//! parameters, one per leaf of a parameter sweep), renders the command
//! template against each, and runs the commands as child processes under
//! a concurrency limit. Optionally stops everything on the first failure
//! and writes a tab-delimited summary afterwards.
//!
//! # Usage
//!
//! ```text
//! sweeprun -j 4 --template 'run_analysis {infile} {cutoff}' \
//!     --summary-file summary.tsv runs/*/control.json
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::bail;
use clap::Parser;
use tracing::info;

use sweep_core::RunConfig;
use sweep_exec::{ProcessPool, write_summary};

#[derive(Parser)]
#[command(
    name = "sweeprun",
    about = "Substitute values into a template and run commands in parallel",
    version,
)]
struct Cli {
    /// Run a maximum of N processes in parallel locally.
    #[arg(short = 'j', long = "processes", value_name = "N", default_value_t = 2)]
    processes: usize,

    /// Command-execution template, e.g. 'bash {infile}'. Defaults to
    /// executing the template file.
    #[arg(long, value_name = "'template text'")]
    template: Option<String>,

    /// Command-execution template file, rendered into each job directory.
    #[arg(long, value_name = "FILE")]
    template_file: Option<PathBuf>,

    /// Terminate remaining processes if any process returns a non-zero
    /// exit status.
    #[arg(long)]
    stop_on_error: bool,

    /// Per-job file that will contain the command that was executed.
    #[arg(long, value_name = "NAME")]
    save_cmd_file: Option<String>,

    /// Per-job file that will contain output of the executed command.
    #[arg(long, value_name = "NAME", default_value = "log.txt", conflicts_with = "no_log")]
    log_file: String,

    /// Don't create per-job log files.
    #[arg(long)]
    no_log: bool,

    /// Render commands without executing them.
    #[arg(long)]
    dry_run: bool,

    /// Write a tab-delimited summary of the run to this file.
    #[arg(long, value_name = "FILE")]
    summary_file: Option<PathBuf>,

    /// Job descriptor files, one flat JSON object per job.
    #[arg(required = true, value_name = "JSON_FILE")]
    json_files: Vec<PathBuf>,
}

/// Validate the arguments and assemble the immutable run config.
///
/// Everything that can be rejected before a single job launches is
/// rejected here: missing template, nonexistent descriptor files, a
/// non-executable default template file, a zero process limit.
fn build_config(cli: Cli) -> anyhow::Result<(RunConfig, Vec<PathBuf>)> {
    if cli.processes == 0 {
        bail!("--processes must be at least 1");
    }

    for path in &cli.json_files {
        if !path.exists() {
            bail!("{} does not exist", path.display());
        }
    }

    let template = match (&cli.template, &cli.template_file) {
        (Some(template), _) => template.clone(),
        (None, Some(file)) => {
            // No literal template: the rendered template file itself is
            // the command, so it has to be executable.
            let Some(basename) = file.file_name() else {
                bail!("{} has no basename", file.display());
            };
            if !cli.dry_run && !is_executable(file) {
                bail!("{} is not executable; specify a template", file.display());
            }
            Path::new(".").join(basename).display().to_string()
        }
        (None, None) => bail!("specify either a template or a template file"),
    };

    let config = RunConfig {
        max_procs: cli.processes,
        template,
        template_file: cli.template_file,
        save_cmd_file: cli.save_cmd_file,
        log_file: if cli.no_log { None } else { Some(cli.log_file) },
        stop_on_error: cli.stop_on_error,
        dry_run: cli.dry_run,
        summary_file: cli.summary_file,
    };
    Ok((config, cli.json_files))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    true
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let (config, json_files) = build_config(cli)?;
    info!(template = %config.template, jobs = json_files.len(), "starting run");

    let pool = ProcessPool::new(&config)?;
    let outcome = pool.run(&json_files).await;

    if let Some(path) = &config.summary_file {
        write_summary(&outcome.records, path)?;
    }

    Ok(if outcome.aborted {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn base_cli(json_files: Vec<PathBuf>) -> Cli {
        Cli {
            processes: 2,
            template: Some("echo {n}".to_string()),
            template_file: None,
            stop_on_error: false,
            save_cmd_file: None,
            log_file: "log.txt".to_string(),
            no_log: false,
            dry_run: false,
            summary_file: None,
            json_files,
        }
    }

    fn descriptor(dir: &Path) -> PathBuf {
        let path = dir.join("control.json");
        fs::write(&path, r#"{"n": "1"}"#).unwrap();
        path
    }

    #[test]
    fn accepts_a_plain_template() {
        let dir = tempfile::tempdir().unwrap();
        let cli = base_cli(vec![descriptor(dir.path())]);
        let (config, jobs) = build_config(cli).unwrap();
        assert_eq!(config.template, "echo {n}");
        assert_eq!(config.max_procs, 2);
        assert_eq!(config.log_file.as_deref(), Some("log.txt"));
        assert_eq!(jobs.len(), 1);
    }

    #[test]
    fn rejects_missing_template_and_template_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut cli = base_cli(vec![descriptor(dir.path())]);
        cli.template = None;
        assert!(build_config(cli).is_err());
    }

    #[test]
    fn rejects_nonexistent_descriptor() {
        let cli = base_cli(vec![PathBuf::from("/nonexistent/control.json")]);
        assert!(build_config(cli).is_err());
    }

    #[test]
    fn rejects_zero_processes() {
        let dir = tempfile::tempdir().unwrap();
        let mut cli = base_cli(vec![descriptor(dir.path())]);
        cli.processes = 0;
        assert!(build_config(cli).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn template_file_without_template_must_be_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("run.sh");
        fs::write(&script, "#!/bin/sh\necho hi\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o644)).unwrap();

        let mut cli = base_cli(vec![descriptor(dir.path())]);
        cli.template = None;
        cli.template_file = Some(script.clone());
        assert!(build_config(cli).is_err());

        // Executable: the command defaults to ./<basename>.
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        let mut cli = base_cli(vec![descriptor(dir.path())]);
        cli.template = None;
        cli.template_file = Some(script.clone());
        let (config, _) = build_config(cli).unwrap();
        assert_eq!(config.template, "./run.sh");

        // Dry run skips the executable requirement.
        fs::set_permissions(&script, fs::Permissions::from_mode(0o644)).unwrap();
        let mut cli = base_cli(vec![descriptor(dir.path())]);
        cli.template = None;
        cli.template_file = Some(script);
        cli.dry_run = true;
        assert!(build_config(cli).is_ok());
    }

    #[test]
    fn no_log_discards_the_log_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut cli = base_cli(vec![descriptor(dir.path())]);
        cli.no_log = true;
        let (config, _) = build_config(cli).unwrap();
        assert_eq!(config.log_file, None);
    }

    #[test]
    fn cli_parses_the_documented_flags() {
        use clap::Parser;
        let cli = Cli::try_parse_from([
            "sweeprun",
            "-j",
            "4",
            "--template",
            "echo {n}",
            "--stop-on-error",
            "--no-log",
            "--summary-file",
            "out.tsv",
            "a.json",
            "b.json",
        ])
        .unwrap();
        assert_eq!(cli.processes, 4);
        assert!(cli.stop_on_error);
        assert!(cli.no_log);
        assert_eq!(cli.summary_file, Some(PathBuf::from("out.tsv")));
        assert_eq!(cli.json_files.len(), 2);
    }

    #[test]
    fn log_file_conflicts_with_no_log() {
        use clap::Parser;
        let result = Cli::try_parse_from([
            "sweeprun",
            "--template",
            "echo",
            "--log-file",
            "out.log",
            "--no-log",
            "a.json",
        ]);
        assert!(result.is_err());
    }
}
