//! Process execution behind a trait so the sweep can run against fakes.

use anyhow::{Context, Result};
use std::io::{BufRead, BufReader};
use std::process::{Command, Stdio};
use tracing::{debug, info};

use crate::command::Invocation;

/// Result of one external invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutcome {
    /// Exit code, `None` if the process was killed by a signal.
    pub code: Option<i32>,
    pub stderr: String,
}

impl ExecOutcome {
    pub fn success() -> Self {
        Self {
            code: Some(0),
            stderr: String::new(),
        }
    }

    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    /// One-line description of a failed invocation for diagnostics.
    pub fn describe(&self) -> String {
        let status = match self.code {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        };
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            status
        } else {
            format!("{}: {}", status, stderr)
        }
    }
}

/// Runs an [`Invocation`] to completion.
///
/// `Err` means the process could not be started at all.
pub trait CommandRunner {
    fn execute(&mut self, invocation: &Invocation) -> Result<ExecOutcome>;
}

/// Spawns real processes. Blocks until the child exits; there is no timeout.
///
/// Stdout is inherited so elbencho's live progress reaches the console.
/// Stderr is echoed line by line as it arrives and also kept for the failure
/// diagnostic.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn execute(&mut self, invocation: &Invocation) -> Result<ExecOutcome> {
        debug!("exec: {}", invocation);
        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to execute {}. Is it installed?", invocation.program))?;

        let mut stderr = String::new();
        if let Some(pipe) = child.stderr.take() {
            let mut reader = BufReader::new(pipe);
            let mut line = Vec::new();
            loop {
                line.clear();
                let read = reader
                    .read_until(b'\n', &mut line)
                    .with_context(|| format!("Failed to read stderr of {}", invocation.program))?;
                if read == 0 {
                    break;
                }
                let text = String::from_utf8_lossy(&line);
                eprint!("{}", text);
                stderr.push_str(&text);
            }
        }

        let status = child
            .wait()
            .with_context(|| format!("Failed to wait for {}", invocation.program))?;

        Ok(ExecOutcome {
            code: status.code(),
            stderr,
        })
    }
}

/// Logs every invocation and reports success without spawning anything.
#[derive(Debug, Default)]
pub struct DryRunRunner {
    pub executed: Vec<Invocation>,
}

impl CommandRunner for DryRunRunner {
    fn execute(&mut self, invocation: &Invocation) -> Result<ExecOutcome> {
        info!("[dry-run] {}", invocation);
        println!("[dry-run] {}", invocation);
        self.executed.push(invocation.clone());
        Ok(ExecOutcome::success())
    }
}
