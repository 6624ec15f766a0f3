//! Per-run configuration.

use std::path::PathBuf;

/// Settings for one run, assembled by the CLI and never mutated after.
///
/// The scheduler borrows this for the whole run; there is no shared
/// mutable run state anywhere else.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Maximum number of children in flight at once. Must be >= 1;
    /// the pool rejects 0 before any job is pulled.
    pub max_procs: usize,
    /// Command template with `{name}` placeholders.
    pub template: String,
    /// Optional template file, rendered into each job directory under
    /// its basename before the command runs.
    pub template_file: Option<PathBuf>,
    /// When set, the fully rendered command line is also written to this
    /// file name inside the job directory.
    pub save_cmd_file: Option<String>,
    /// Per-job log file name for child stdout/stderr, relative to the
    /// job directory. `None` discards child output.
    pub log_file: Option<String>,
    /// Cancel the whole run on the first job failure.
    pub stop_on_error: bool,
    /// Render and report commands without executing anything.
    pub dry_run: bool,
    /// Where to write the tab-delimited run summary, if anywhere.
    pub summary_file: Option<PathBuf>,
}

impl RunConfig {
    /// A config with the standing defaults: two processes, `log.txt`,
    /// everything else off. Callers fill in the template.
    pub fn with_template(template: impl Into<String>) -> Self {
        RunConfig {
            max_procs: 2,
            template: template.into(),
            template_file: None,
            save_cmd_file: None,
            log_file: Some("log.txt".to_string()),
            stop_on_error: false,
            dry_run: false,
            summary_file: None,
        }
    }
}
