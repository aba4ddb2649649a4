use crate::audit::workspace::AuditWorkspace;
use crate::config::harness::AuditConfig;
use crate::config::types::{HarnessError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Outcome of a leak check. `CouldNotRun` is never a leak count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LeakReport {
    Clean,
    Leaks { count: u64 },
    CouldNotRun { reason: String },
}

impl LeakReport {
    /// Detector error count, `None` when the check did not run
    pub fn count(&self) -> Option<u64> {
        match self {
            Self::Clean => Some(0),
            Self::Leaks { count } => Some(*count),
            Self::CouldNotRun { .. } => None,
        }
    }
}

impl fmt::Display for LeakReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clean => f.write_str("clean"),
            Self::Leaks { count } => write!(f, "{} error(s)", count),
            Self::CouldNotRun { reason } => write!(f, "could not run: {}", reason),
        }
    }
}

static SUMMARY_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"ERROR SUMMARY:\s*([0-9,]+)\s*errors?").ok());

fn summary_pattern() -> Option<&'static Regex> {
    SUMMARY_PATTERN.as_ref()
}

/// Error count from detector diagnostics: the last `ERROR SUMMARY` line, or
/// else the first all-digit token on the last non-empty line
pub fn parse_error_count(diagnostics: &str) -> Option<u64> {
    if let Some(cap) = summary_pattern().and_then(|re| re.captures_iter(diagnostics).last()) {
        if let Ok(count) = cap[1].replace(',', "").parse::<u64>() {
            return Some(count);
        }
    }

    diagnostics
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())?
        .split_whitespace()
        .find(|token| token.chars().all(|c| c.is_ascii_digit()))
        .and_then(|token| token.parse().ok())
}

/// Exit code the detector uses to signal findings (`--error-exitcode=N`)
fn findings_exit_code(detector_args: &[String]) -> Option<i32> {
    detector_args
        .iter()
        .rev()
        .find_map(|arg| arg.strip_prefix("--error-exitcode="))
        .and_then(|code| code.parse().ok())
}

struct ToolOutput {
    status: Option<i32>,
    stderr: String,
    timed_out: bool,
}

/// Last few diagnostic lines, for log and report messages
fn tail(text: &str) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    lines[lines.len().saturating_sub(3)..].join(" | ")
}

fn run_tool(program: &str, args: &[String], timeout: Duration) -> Result<ToolOutput> {
    let started = Instant::now();
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| HarnessError::Audit(format!("spawn({}): {}", program, e)))?;

    let reader = child.stderr.take().map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    });

    let mut timed_out = false;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status.code(),
            Ok(None) => {
                if started.elapsed() > timeout {
                    timed_out = true;
                    let _ = child.kill();
                    let _ = child.wait();
                    break None;
                }
                std::thread::sleep(Duration::from_millis(10));
            }
            Err(e) => return Err(HarnessError::Audit(format!("wait({}): {}", program, e))),
        }
    };

    let stderr = reader
        .and_then(|handle| handle.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default();

    Ok(ToolOutput {
        status,
        stderr,
        timed_out,
    })
}

/// Links `driver_source` against a submission and runs it under the
/// configured leak detector
pub struct LeakAuditor {
    config: AuditConfig,
    driver_source: PathBuf,
}

impl LeakAuditor {
    pub fn new(config: AuditConfig, driver_source: PathBuf) -> Self {
        Self {
            config,
            driver_source,
        }
    }

    /// Compiler arguments linking `library` into `executable` by file name,
    /// with the library directory on both the link and runtime search path
    pub fn compile_args(&self, library: &Path, executable: &Path) -> Result<Vec<String>> {
        let library = library.canonicalize().unwrap_or_else(|_| library.to_path_buf());
        let file = library
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .ok_or_else(|| {
                HarnessError::Audit(format!("library path has no file name: {}", library.display()))
            })?;
        let dir = match library.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.display().to_string(),
            _ => ".".to_string(),
        };

        let mut args = self.config.compiler_args.clone();
        args.push(format!("-L{}", dir));
        args.push(format!("-Wl,-rpath={}", dir));
        args.push("-o".to_string());
        args.push(executable.display().to_string());
        args.push(self.driver_source.display().to_string());
        args.push(format!("-l:{}", file));
        Ok(args)
    }

    /// Run the full check. Every failure of the toolchain is reported as
    /// [`LeakReport::CouldNotRun`]; the linked executable is always removed.
    pub fn audit(&self, library: &Path, driver_args: &[String]) -> LeakReport {
        match self.try_audit(library, driver_args) {
            Ok(report) => report,
            Err(e) => LeakReport::CouldNotRun {
                reason: e.to_string(),
            },
        }
    }

    fn try_audit(&self, library: &Path, driver_args: &[String]) -> Result<LeakReport> {
        let timeout = Duration::from_secs(self.config.timeout_secs);
        let workspace = AuditWorkspace::new(&self.config.artifact_dir)?;
        let executable = workspace.artifact("leak_driver");

        let args = self.compile_args(library, &executable)?;
        let compiled = run_tool(&self.config.compiler, &args, timeout)?;
        if compiled.timed_out {
            return Ok(LeakReport::CouldNotRun {
                reason: format!("{} timed out", self.config.compiler),
            });
        }
        if compiled.status != Some(0) {
            log::error!(
                "Linking leak driver against {} failed: {}",
                library.display(),
                compiled.stderr.trim_end()
            );
            return Ok(LeakReport::CouldNotRun {
                reason: format!(
                    "{} exited with {:?}: {}",
                    self.config.compiler,
                    compiled.status,
                    tail(&compiled.stderr)
                ),
            });
        }

        let mut args = self.config.detector_args.clone();
        args.push(executable.display().to_string());
        args.extend(driver_args.iter().cloned());
        let detected = run_tool(&self.config.detector, &args, timeout)?;
        if detected.timed_out {
            return Ok(LeakReport::CouldNotRun {
                reason: format!("{} timed out", self.config.detector),
            });
        }

        Ok(self.interpret(detected.status, &detected.stderr))
    }

    /// Map detector exit status and diagnostics to a report
    fn interpret(&self, status: Option<i32>, diagnostics: &str) -> LeakReport {
        let findings_code = findings_exit_code(&self.config.detector_args);
        let clean_exit = status == Some(0);
        let findings_exit = status.is_some() && status == findings_code;

        if !clean_exit && !findings_exit {
            return LeakReport::CouldNotRun {
                reason: format!(
                    "{} exited with {:?}: {}",
                    self.config.detector,
                    status,
                    tail(diagnostics)
                ),
            };
        }

        match parse_error_count(diagnostics) {
            Some(0) => LeakReport::Clean,
            Some(count) => LeakReport::Leaks { count },
            // A clean exit with --error-exitcode means no findings
            None if clean_exit => LeakReport::Clean,
            None => LeakReport::CouldNotRun {
                reason: "detector reported findings but no error count".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEAKY: &str = "\
==22== LEAK SUMMARY:
==22==    definitely lost: 100 bytes in 1 blocks
==22==
==22== ERROR SUMMARY: 1 errors from 1 contexts (suppressed: 0 from 0)
";

    const CLEAN: &str = "\
==7== All heap blocks were freed -- no leaks are possible
==7== ERROR SUMMARY: 0 errors from 0 contexts (suppressed: 0 from 0)
";

    fn auditor() -> LeakAuditor {
        LeakAuditor::new(AuditConfig::default(), PathBuf::from("/tmp/driver.c"))
    }

    #[test]
    fn parses_error_summary() {
        assert_eq!(parse_error_count(LEAKY), Some(1));
        assert_eq!(parse_error_count(CLEAN), Some(0));
        assert_eq!(
            parse_error_count("==1== ERROR SUMMARY: 1,204 errors from 3 contexts"),
            Some(1204)
        );
    }

    #[test]
    fn falls_back_to_last_line_digits() {
        assert_eq!(parse_error_count("noise\n found 12 problems \n\n"), Some(12));
        assert_eq!(parse_error_count("nothing numeric here\n"), None);
        assert_eq!(parse_error_count(""), None);
    }

    #[test]
    fn interpret_distinguishes_findings_from_failure() {
        let auditor = auditor();
        assert_eq!(auditor.interpret(Some(1), LEAKY), LeakReport::Leaks { count: 1 });
        assert_eq!(auditor.interpret(Some(0), CLEAN), LeakReport::Clean);
        assert_eq!(auditor.interpret(Some(0), ""), LeakReport::Clean);
        assert!(matches!(
            auditor.interpret(Some(1), "garbage"),
            LeakReport::CouldNotRun { .. }
        ));
        assert!(matches!(
            auditor.interpret(Some(139), LEAKY),
            LeakReport::CouldNotRun { .. }
        ));
        assert!(matches!(auditor.interpret(None, ""), LeakReport::CouldNotRun { .. }));
    }

    #[test]
    fn compile_args_link_by_file_name() {
        let args = auditor()
            .compile_args(Path::new("/srv/libs/libalice.so"), Path::new("/tmp/run/leak_driver"))
            .unwrap();
        assert_eq!(
            args,
            vec![
                "--std=c99",
                "-O3",
                "-L/srv/libs",
                "-Wl,-rpath=/srv/libs",
                "-o",
                "/tmp/run/leak_driver",
                "/tmp/driver.c",
                "-l:libalice.so",
            ]
        );
    }

    #[test]
    fn missing_compiler_could_not_run_and_cleans_up() {
        let base = tempfile::tempdir().unwrap();
        let config = AuditConfig {
            enabled: true,
            compiler: "/nonexistent/gcc".to_string(),
            artifact_dir: base.path().to_path_buf(),
            ..AuditConfig::default()
        };
        let report = LeakAuditor::new(config, PathBuf::from("driver.c"))
            .audit(Path::new("/srv/libs/libalice.so"), &[]);

        assert!(matches!(report, LeakReport::CouldNotRun { .. }));
        assert_eq!(report.count(), None);
        assert_eq!(std::fs::read_dir(base.path()).unwrap().count(), 0);
    }

    #[test]
    fn findings_code_comes_from_detector_args() {
        assert_eq!(findings_exit_code(&AuditConfig::default().detector_args), Some(1));
        assert_eq!(findings_exit_code(&[]), None);
    }
}
