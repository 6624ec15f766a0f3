//! Template rendering.
//!
//! Commands and template files use `{name}` placeholders filled from a
//! job descriptor's values. `{{` and `}}` escape literal braces.
//! Rendering is pure; `prepare` is the per-job glue that also stages the
//! rendered template file and the saved-command file into the job
//! directory.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::RunConfig;
use crate::descriptor::JobDescriptor;
use crate::error::{CoreError, CoreResult};

/// A job after substitution: what to run and where.
///
/// Derived deterministically from a descriptor and the run config;
/// never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedJob {
    /// The fully substituted command line.
    pub command: String,
    /// Directory the child runs in (the descriptor's directory).
    pub working_dir: PathBuf,
    /// Path of the rendered template file, when one was staged.
    pub rendered_template_path: Option<PathBuf>,
}

/// Substitute `{name}` placeholders in `template` from `values`.
pub fn render(template: &str, values: &BTreeMap<String, String>) -> CoreResult<String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut key = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(k) => key.push(k),
                        None => return Err(CoreError::UnterminatedPlaceholder),
                    }
                }
                match values.get(&key) {
                    Some(value) => out.push_str(value),
                    None => return Err(CoreError::MissingSubstitution { key }),
                }
            }
            c => out.push(c),
        }
    }

    Ok(out)
}

/// Render `template_path` line by line into `out_path`, then copy the
/// source file's permission bits onto the output.
///
/// The permission copy is best effort: failure logs a warning and the
/// job proceeds.
pub fn render_file(
    template_path: &Path,
    out_path: &Path,
    values: &BTreeMap<String, String>,
) -> CoreResult<()> {
    let content = std::fs::read_to_string(template_path).map_err(|source| CoreError::Io {
        path: template_path.to_path_buf(),
        source,
    })?;

    let io_err = |source| CoreError::Io {
        path: out_path.to_path_buf(),
        source,
    };
    let mut out = std::fs::File::create(out_path).map_err(io_err)?;
    for line in content.split_inclusive('\n') {
        out.write_all(render(line, values)?.as_bytes()).map_err(io_err)?;
    }

    match std::fs::metadata(template_path) {
        Ok(meta) => {
            if let Err(err) = std::fs::set_permissions(out_path, meta.permissions()) {
                warn!(
                    out = %out_path.display(),
                    %err,
                    "could not copy permissions to rendered template"
                );
            }
        }
        Err(err) => {
            warn!(
                template = %template_path.display(),
                %err,
                "could not read template permissions"
            );
        }
    }

    Ok(())
}

/// Build the `RenderedJob` for one descriptor: stage the rendered
/// template file (if configured), substitute the command template, and
/// write the saved-command file (if configured).
pub fn prepare(config: &RunConfig, descriptor: &JobDescriptor) -> CoreResult<RenderedJob> {
    let working_dir = descriptor.dir();

    let rendered_template_path = match &config.template_file {
        Some(template_file) => {
            // Stage the rendered template under its basename in the job dir.
            let basename = template_file
                .file_name()
                .ok_or_else(|| CoreError::Io {
                    path: template_file.clone(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "template file has no basename",
                    ),
                })?;
            let out_path = working_dir.join(basename);
            render_file(template_file, &out_path, &descriptor.values)?;
            Some(out_path)
        }
        None => None,
    };

    let command = render(&config.template, &descriptor.values)?;

    if let Some(save_cmd_file) = &config.save_cmd_file {
        let path = working_dir.join(save_cmd_file);
        std::fs::write(&path, format!("{command}\n")).map_err(|source| CoreError::Io {
            path,
            source,
        })?;
    }

    Ok(RenderedJob {
        command,
        working_dir,
        rendered_template_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_placeholders() {
        let v = values(&[("n", "3"), ("infile", "a.fasta")]);
        let out = render("run -j {n} {infile}", &v).unwrap();
        assert_eq!(out, "run -j 3 a.fasta");
    }

    #[test]
    fn rendering_is_deterministic() {
        let v = values(&[("n", "3")]);
        let once = render("echo {n}", &v).unwrap();
        let twice = render("echo {n}", &v).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn doubled_braces_are_literal() {
        let v = values(&[("n", "3")]);
        assert_eq!(render("{{x}} {n} }}", &v).unwrap(), "{x} 3 }");
    }

    #[test]
    fn missing_key_is_an_error() {
        let v = values(&[("n", "3")]);
        let err = render("echo {missing}", &v).unwrap_err();
        match err {
            CoreError::MissingSubstitution { key } => assert_eq!(key, "missing"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unterminated_placeholder_is_its_own_error() {
        // Not a missing key: the key may well exist.
        let v = values(&[("n", "3")]);
        assert!(matches!(
            render("echo {n", &v),
            Err(CoreError::UnterminatedPlaceholder)
        ));
    }

    #[test]
    fn render_file_substitutes_every_line() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("run.sh");
        let out = dir.path().join("out.sh");
        fs::write(&template, "#!/bin/sh\necho {a}\necho {b}\n").unwrap();

        render_file(&template, &out, &values(&[("a", "1"), ("b", "2")])).unwrap();
        assert_eq!(
            fs::read_to_string(&out).unwrap(),
            "#!/bin/sh\necho 1\necho 2\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn render_file_copies_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("run.sh");
        let out = dir.path().join("out.sh");
        fs::write(&template, "echo {a}\n").unwrap();
        fs::set_permissions(&template, fs::Permissions::from_mode(0o755)).unwrap();

        render_file(&template, &out, &values(&[("a", "1")])).unwrap();
        let mode = fs::metadata(&out).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn prepare_stages_template_and_savecmd() {
        let dir = tempfile::tempdir().unwrap();
        let template_file = dir.path().join("run.sh");
        fs::write(&template_file, "echo {n}\n").unwrap();

        let job_dir = dir.path().join("job1");
        fs::create_dir(&job_dir).unwrap();
        let descriptor_path = job_dir.join("control.json");
        fs::write(&descriptor_path, r#"{"n": "7"}"#).unwrap();

        let mut config = RunConfig::with_template("sh run.sh {n}");
        config.template_file = Some(template_file);
        config.save_cmd_file = Some("command.txt".to_string());

        let descriptor = JobDescriptor::load(&descriptor_path).unwrap();
        let rendered = prepare(&config, &descriptor).unwrap();

        assert_eq!(rendered.command, "sh run.sh 7");
        assert_eq!(rendered.working_dir, job_dir);
        assert_eq!(rendered.rendered_template_path, Some(job_dir.join("run.sh")));
        assert_eq!(fs::read_to_string(job_dir.join("run.sh")).unwrap(), "echo 7\n");
        assert_eq!(
            fs::read_to_string(job_dir.join("command.txt")).unwrap(),
            "sh run.sh 7\n"
        );
    }
}
