//! Process execution seam.
//!
//! The invoker never touches `std::process` directly; it goes through [`ProcessRunner`] so hosts
//! and tests can substitute the execution strategy.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Mutex;

use crate::foundation::error::{SpritifyError, SpritifyResult};

/// Captured result of one finished process.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn status_text(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_owned(),
        }
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_owned()
    }
}

pub trait ProcessRunner {
    /// Return `true` when `program` can be executed.
    fn is_available(&self, program: &Path) -> bool;

    /// Run `program` with `args` to completion, capturing stdout and stderr.
    fn run(&self, program: &Path, args: &[OsString]) -> SpritifyResult<ProcessOutput>;
}

/// Runs real OS processes, blocking until they exit.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn is_available(&self, program: &Path) -> bool {
        // An explicit location is checked on disk; a bare name has to answer `-version` via PATH.
        if program.components().count() > 1 {
            return program.is_file();
        }
        Command::new(program)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn run(&self, program: &Path, args: &[OsString]) -> SpritifyResult<ProcessOutput> {
        let out = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => SpritifyError::binary_not_found(program),
                _ => SpritifyError::tool_failure(
                    program.display().to_string(),
                    "failed to spawn",
                    e.to_string(),
                ),
            })?;
        Ok(ProcessOutput {
            code: out.status.code(),
            stdout: out.stdout,
            stderr: out.stderr,
        })
    }
}

/// One call captured by [`RecordingRunner`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedCall {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl RecordedCall {
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

/// In-memory runner for tests and dry runs: records every call and replays canned results.
///
/// Programs are available unless listed with [`RecordingRunner::missing`]. Calls succeed with an
/// empty output unless a failure was queued with [`RecordingRunner::fail_next`].
#[derive(Debug, Default)]
pub struct RecordingRunner {
    missing: Vec<PathBuf>,
    queued: Mutex<Vec<ProcessOutput>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat `program` as absent from the system.
    pub fn missing(mut self, program: impl Into<PathBuf>) -> Self {
        self.missing.push(program.into());
        self
    }

    /// Make the next `run` return `code` with `stderr`. Failures are consumed in queue order.
    pub fn fail_next(self, code: i32, stderr: &str) -> Self {
        self.push_result(ProcessOutput {
            code: Some(code),
            stdout: Vec::new(),
            stderr: stderr.as_bytes().to_vec(),
        });
        self
    }

    fn push_result(&self, out: ProcessOutput) {
        if let Ok(mut q) = self.queued.lock() {
            q.push(out);
        }
    }

    /// Snapshot of the calls made so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl ProcessRunner for RecordingRunner {
    fn is_available(&self, program: &Path) -> bool {
        !self.missing.iter().any(|m| m == program)
    }

    fn run(&self, program: &Path, args: &[OsString]) -> SpritifyResult<ProcessOutput> {
        self.calls
            .lock()
            .map_err(|_| SpritifyError::validation("recording runner lock poisoned"))?
            .push(RecordedCall {
                program: program.to_path_buf(),
                args: args.to_vec(),
            });
        if !self.is_available(program) {
            return Err(SpritifyError::binary_not_found(program));
        }

        let mut queued = self
            .queued
            .lock()
            .map_err(|_| SpritifyError::validation("recording runner lock poisoned"))?;
        if queued.is_empty() {
            Ok(ProcessOutput {
                code: Some(0),
                ..Default::default()
            })
        } else {
            Ok(queued.remove(0))
        }
    }
}
