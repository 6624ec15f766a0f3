//! The post-run summary table.

use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::{ExecError, ExecResult};
use crate::record::ProcessRecord;

const COLUMNS: [&str; 7] = [
    "directory",
    "command",
    "start_time",
    "end_time",
    "run_time",
    "exit_status",
    "result",
];

fn timestamp(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// Tabs and newlines inside a field would break the row structure, so
/// the free-text columns get them backslash-escaped.
fn escape_field(field: &str) -> String {
    field
        .replace('\\', "\\\\")
        .replace('\t', "\\t")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

/// Render the records as a tab-delimited table, header first. Unset
/// fields (a terminated child's exit status) render empty; embedded
/// tabs and newlines in the directory or command are escaped.
pub fn format_summary(records: &[ProcessRecord]) -> String {
    let mut out = String::new();
    out.push_str(&COLUMNS.join("\t"));
    out.push('\n');

    for record in records {
        let end_time = record.end_time.map(timestamp).unwrap_or_default();
        let run_time = record
            .elapsed()
            .map(|d| format!("{:.6}", d.num_microseconds().unwrap_or(0) as f64 / 1e6))
            .unwrap_or_default();
        let exit_status = record
            .exit_status
            .map(|s| s.to_string())
            .unwrap_or_default();
        // COLUMNS order.
        let _ = writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            escape_field(&record.working_dir.display().to_string()),
            escape_field(&record.command),
            timestamp(record.start_time),
            end_time,
            run_time,
            exit_status,
            record.state,
        );
    }

    out
}

/// Write the summary to `path`, truncating. Written once, at the end of
/// a run; an empty run still gets the header row.
pub fn write_summary(records: &[ProcessRecord], path: &Path) -> ExecResult<()> {
    std::fs::write(path, format_summary(records)).map_err(|source| ExecError::Io {
        path: path.to_path_buf(),
        source,
    })
}
