//! Invocation descriptors for the external tools
//!
//! Nothing here spawns a process. The builders only turn a workload, a
//! thread count and the planned sizes into an explicit argument list that a
//! [`CommandRunner`](crate::exec::CommandRunner) can execute. Block size and
//! operation tokens are passed through untouched; elbencho rejects what it
//! does not understand.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::{SweepConfig, WorkloadSpec};
use crate::constants::{CSV_EXTENSION, FLAG_DIRECT_IO, FLAG_LATENCY, FLAG_MKDIRS};
use crate::planner::FileSize;

/// A program and its arguments, executed without a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Value following `flag`, if present.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

/// Shell-style rendering for logs; quoting is for readability only.
impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Tool names, login user, port and output location shared by every invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSettings {
    pub benchmark_bin: String,
    pub fanout_bin: String,
    pub remote_user: String,
    pub service_port: u16,
    pub results_dir: PathBuf,
}

impl From<&SweepConfig> for CommandSettings {
    fn from(config: &SweepConfig) -> Self {
        Self {
            benchmark_bin: config.benchmark_bin.clone(),
            fanout_bin: config.fanout_bin.clone(),
            remote_user: config.remote_user.clone(),
            service_port: config.service_port,
            results_dir: config.results_dir.clone(),
        }
    }
}

impl CommandSettings {
    /// `h1:port,h2:port,...`
    pub fn host_list(&self, hosts: &[String]) -> String {
        hosts
            .iter()
            .map(|h| format!("{}:{}", h, self.service_port))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// One CSV per workload and total volume; every thread count of the
    /// workload extends the same file.
    pub fn csv_path(&self, workload: &WorkloadSpec) -> PathBuf {
        self.results_dir.join(format!(
            "{}_{}.{}",
            workload.name, workload.total_size, CSV_EXTENSION
        ))
    }
}

/// elbencho invocation for one run of `workload` at `thread_count`.
pub fn build_invocation(
    settings: &CommandSettings,
    hosts: &[String],
    workload: &WorkloadSpec,
    thread_count: u32,
    file_size: &FileSize,
    directories: &[PathBuf],
) -> Invocation {
    Invocation::new(&settings.benchmark_bin)
        .arg("--threads")
        .arg(thread_count.to_string())
        .arg("--block")
        .arg(&workload.block_size)
        .arg(FLAG_DIRECT_IO)
        .arg("--size")
        .arg(file_size.to_string())
        .args(workload.operation_tokens())
        .arg("--hosts")
        .arg(settings.host_list(hosts))
        .arg(FLAG_MKDIRS)
        .arg(FLAG_LATENCY)
        .arg("--csvfile")
        .arg(path_arg(&settings.csv_path(workload)))
        .args(directories.iter().map(|d| path_arg(d)))
}

/// Single fan-out request creating every run directory on every host.
///
/// `mkdir -p` keeps the request idempotent.
pub fn build_mkdir_fanout(
    settings: &CommandSettings,
    hosts: &[String],
    directories: &[PathBuf],
) -> Invocation {
    let mut remote = String::from("mkdir -p");
    for dir in directories {
        remote.push(' ');
        remote.push_str(&shell_quote(&path_arg(dir)));
    }

    Invocation::new(&settings.fanout_bin)
        .arg("-l")
        .arg(&settings.remote_user)
        .arg("-w")
        .arg(hosts.join(","))
        .arg(remote)
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Quote `word` for a POSIX shell. Plain paths are left as they are.
fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-+:,=@%".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', "'\\''"))
    }
}
