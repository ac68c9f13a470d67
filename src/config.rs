// src/config.rs
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::size_parser::parse_volume_gb;

/// Built-in sweep, used when no config file is given.
const BUILTIN_SWEEP_YAML: &str = include_str!("../configs/default_sweep.yaml");

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SweepConfig {
    /// Load-generator hosts running the elbencho service.
    pub hosts: Vec<String>,

    /// Client-side mount paths. All of them must resolve to the same export;
    /// this is a documented precondition and is not checked.
    pub mount_paths: Vec<PathBuf>,

    /// Login user for the fan-out shell.
    #[serde(default = "default_remote_user")]
    pub remote_user: String,

    /// Workload whose directories read workloads reuse when they do not
    /// name a producer of their own.
    #[serde(default = "default_canonical_producer")]
    pub canonical_producer: String,

    /// Where the per-workload CSV files are written.
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,

    #[serde(default = "default_benchmark_bin")]
    pub benchmark_bin: String,

    #[serde(default = "default_fanout_bin")]
    pub fanout_bin: String,

    /// Port of the elbencho service on every host.
    #[serde(default = "default_service_port")]
    pub service_port: u16,

    /// Workload catalog, executed in declared order.
    pub workloads: Vec<WorkloadSpec>,
}

fn default_remote_user() -> String {
    crate::constants::DEFAULT_REMOTE_USER.to_string()
}

fn default_canonical_producer() -> String {
    crate::constants::DEFAULT_CANONICAL_PRODUCER.to_string()
}

fn default_results_dir() -> PathBuf {
    PathBuf::from(crate::constants::DEFAULT_RESULTS_DIR)
}

fn default_benchmark_bin() -> String {
    crate::constants::DEFAULT_BENCHMARK_BIN.to_string()
}

fn default_fanout_bin() -> String {
    crate::constants::DEFAULT_FANOUT_BIN.to_string()
}

fn default_service_port() -> u16 {
    crate::constants::DEFAULT_SERVICE_PORT
}

/// What a workload does to the shared dataset.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccessType {
    Write,
    Read,
    Mixed,
}

impl AccessType {
    /// Write and mixed runs lay down their own directories; reads reuse a producer's.
    pub fn creates_directories(self) -> bool {
        matches!(self, AccessType::Write | AccessType::Mixed)
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AccessType::Write => "write",
            AccessType::Read => "read",
            AccessType::Mixed => "mixed",
        };
        f.write_str(s)
    }
}

/// One named benchmark scenario.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WorkloadSpec {
    pub name: String,

    /// Block size token handed to elbencho unchanged ("4k", "1M").
    pub block_size: String,

    /// Operation flags handed to elbencho unchanged, whitespace separated
    /// ("--write", "--read --rand", "--rwmixpct 75").
    pub operation: String,

    pub access: AccessType,

    /// Thread counts to sweep, ascending.
    pub threads: Vec<u32>,

    /// Total volume token ("1T", "4T"). Kept verbatim because it also names
    /// the CSV file.
    pub total_size: String,

    /// Explicit producer for a read workload. Falls back to
    /// `SweepConfig::canonical_producer`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub producer: Option<String>,
}

impl WorkloadSpec {
    pub fn operation_tokens(&self) -> Vec<String> {
        self.operation.split_whitespace().map(str::to_string).collect()
    }

    pub fn total_volume_gb(&self) -> Result<u64> {
        parse_volume_gb(&self.total_size)
            .with_context(|| format!("workload '{}': invalid total_size", self.name))
    }

    /// Name of the workload whose directories this one reads.
    pub fn producer_name<'a>(&'a self, canonical: &'a str) -> &'a str {
        self.producer.as_deref().unwrap_or(canonical)
    }
}

/// Hosts and mount paths participating in every run.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterTopology {
    hosts: Vec<String>,
    mount_paths: Vec<PathBuf>,
}

impl ClusterTopology {
    pub fn new(hosts: Vec<String>, mount_paths: Vec<PathBuf>) -> Result<Self> {
        if hosts.is_empty() {
            bail!("at least one host is required");
        }
        if mount_paths.is_empty() {
            bail!("at least one mount path is required");
        }
        let mut seen = HashSet::new();
        for mount in &mount_paths {
            if !seen.insert(mount) {
                bail!("duplicate mount path: {}", mount.display());
            }
        }
        Ok(Self { hosts, mount_paths })
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    pub fn mount_paths(&self) -> &[PathBuf] {
        &self.mount_paths
    }

    pub fn mount_count(&self) -> usize {
        self.mount_paths.len()
    }
}

impl SweepConfig {
    /// Parse and validate a YAML sweep definition.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: SweepConfig =
            serde_yaml::from_str(yaml).context("failed to parse sweep config YAML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&yaml).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn builtin() -> Result<Self> {
        Self::from_yaml_str(BUILTIN_SWEEP_YAML).context("built-in sweep config is invalid")
    }

    pub fn topology(&self) -> Result<ClusterTopology> {
        ClusterTopology::new(self.hosts.clone(), self.mount_paths.clone())
    }

    /// Structural checks done once at startup.
    ///
    /// Total volume tokens are not checked here: a malformed one only skips
    /// its own workload when the sweep reaches it.
    pub fn validate(&self) -> Result<()> {
        self.topology()?;

        let mut names = HashSet::new();
        for workload in &self.workloads {
            if workload.name.trim().is_empty() {
                bail!("workload with empty name");
            }
            if !names.insert(workload.name.as_str()) {
                bail!("duplicate workload name: {}", workload.name);
            }
            if workload.threads.is_empty() {
                bail!("workload '{}': thread list is empty", workload.name);
            }
            if workload.threads.contains(&0) {
                bail!("workload '{}': thread counts must be positive", workload.name);
            }
            if !workload.threads.windows(2).all(|w| w[0] < w[1]) {
                bail!(
                    "workload '{}': thread counts must be strictly ascending, got {:?}",
                    workload.name,
                    workload.threads
                );
            }
            if workload.producer.is_some() && workload.access != AccessType::Read {
                bail!(
                    "workload '{}': only read workloads may name a producer",
                    workload.name
                );
            }
        }

        for (idx, workload) in self.workloads.iter().enumerate() {
            if workload.access != AccessType::Read {
                continue;
            }
            let producer = workload.producer_name(&self.canonical_producer);
            match self.workloads.iter().position(|w| w.name == producer) {
                Some(pos) if !self.workloads[pos].access.creates_directories() => {
                    bail!(
                        "workload '{}': producer '{}' is a read workload",
                        workload.name,
                        producer
                    );
                }
                Some(pos) if pos > idx => {
                    warn!(
                        "workload '{}' runs before its producer '{}'; its runs will be skipped",
                        workload.name, producer
                    );
                }
                Some(_) => {}
                None if workload.producer.is_some() => {
                    bail!(
                        "workload '{}': producer '{}' is not in the catalog",
                        workload.name,
                        producer
                    );
                }
                None => {
                    warn!(
                        "workload '{}': canonical producer '{}' is not in the catalog; its runs will be skipped",
                        workload.name, producer
                    );
                }
            }
        }

        Ok(())
    }

    /// Restrict the catalog to the named workloads, keeping declared order.
    pub fn retain_workloads(&mut self, only: &[String]) -> Result<()> {
        if only.is_empty() {
            return Ok(());
        }
        for name in only {
            if !self.workloads.iter().any(|w| &w.name == name) {
                bail!("unknown workload: {}", name);
            }
        }
        self.workloads.retain(|w| only.contains(&w.name));
        Ok(())
    }
}
