//! Run directory lifecycle
//!
//! Write and mixed runs get one directory per mount path,
//! `{mount}/{workload}_{threads}_threads`, created on every host through a
//! single fan-out request and then recorded in the [`DirectoryRegistry`].
//!
//! Read runs never create anything. They look up the directories of their
//! producer workload at the same thread count, so many read workloads of
//! different block sizes and patterns read one physical dataset. If the
//! producer has not run yet the read run is skipped.
//!
//! Directories are never removed and registry entries live for the whole
//! sweep.

use anyhow::{bail, Result};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::command::{build_mkdir_fanout, CommandSettings};
use crate::config::{ClusterTopology, WorkloadSpec};
use crate::constants::RUN_DIR_SUFFIX;
use crate::exec::CommandRunner;

/// Registry key: one workload at one thread count.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunKey {
    pub workload: String,
    pub threads: u32,
}

impl RunKey {
    pub fn new(workload: impl Into<String>, threads: u32) -> Self {
        Self {
            workload: workload.into(),
            threads,
        }
    }

    /// Directory name used under every mount path.
    pub fn dir_name(&self) -> String {
        format!("{}_{}_{}", self.workload, self.threads, RUN_DIR_SUFFIX)
    }
}

impl fmt::Display for RunKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dir_name())
    }
}

/// Directories materialized on shared storage, by producing run.
///
/// Entries are inserted once and never replaced or removed.
#[derive(Debug, Default)]
pub struct DirectoryRegistry {
    entries: HashMap<RunKey, Vec<PathBuf>>,
}

impl DirectoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &RunKey) -> Option<&[PathBuf]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn contains(&self, key: &RunKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every registered run and its directories, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&RunKey, &[PathBuf])> {
        self.entries.iter().map(|(key, paths)| (key, paths.as_slice()))
    }

    /// Record `paths` for `key` unless it is already present. Returns the
    /// registered paths either way.
    fn record(&mut self, key: RunKey, paths: Vec<PathBuf>) -> &[PathBuf] {
        let entry = self.entries.entry(key).or_insert(paths);
        entry.as_slice()
    }
}

/// Outcome of preparing directories for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prepared {
    /// Directories to pass to elbencho.
    Ready(Vec<PathBuf>),
    /// Read run whose producer directories do not exist yet.
    Skip { producer: RunKey },
}

/// Owns the registry; the only component that mutates it.
#[derive(Debug)]
pub struct DirectoryLifecycle {
    topology: ClusterTopology,
    settings: CommandSettings,
    canonical_producer: String,
    registry: DirectoryRegistry,
}

impl DirectoryLifecycle {
    pub fn new(topology: ClusterTopology, settings: CommandSettings, canonical_producer: impl Into<String>) -> Self {
        Self {
            topology,
            settings,
            canonical_producer: canonical_producer.into(),
            registry: DirectoryRegistry::new(),
        }
    }

    pub fn registry(&self) -> &DirectoryRegistry {
        &self.registry
    }

    pub fn topology(&self) -> &ClusterTopology {
        &self.topology
    }

    /// Per-mount directories of the run `key`.
    pub fn run_directories(&self, key: &RunKey) -> Vec<PathBuf> {
        let name = key.dir_name();
        self.topology
            .mount_paths()
            .iter()
            .map(|mount| mount.join(&name))
            .collect()
    }

    /// Directories for `workload` at `thread_count`, creating them first for
    /// write and mixed workloads.
    ///
    /// Fails only when the fan-out request fails; the registry is untouched
    /// in that case.
    pub fn prepare_directories(
        &mut self,
        workload: &WorkloadSpec,
        thread_count: u32,
        runner: &mut dyn CommandRunner,
    ) -> Result<Prepared> {
        if !workload.access.creates_directories() {
            let producer = RunKey::new(
                workload.producer_name(&self.canonical_producer),
                thread_count,
            );
            return Ok(match self.registry.get(&producer) {
                Some(paths) => {
                    debug!("{} reuses directories of {}", workload.name, producer);
                    Prepared::Ready(paths.to_vec())
                }
                None => {
                    warn!(
                        "No valid directories found for {}. Skipping read test {} at {} threads.",
                        producer, workload.name, thread_count
                    );
                    Prepared::Skip { producer }
                }
            });
        }

        let key = RunKey::new(&workload.name, thread_count);
        let paths = self.run_directories(&key);

        let request = build_mkdir_fanout(&self.settings, self.topology.hosts(), &paths);
        info!("Creating shared test directories: {}", request);
        let outcome = runner.execute(&request)?;
        if !outcome.is_success() {
            bail!(
                "directory creation for {} failed on host group {}: {}",
                key,
                self.topology.hosts().join(","),
                outcome.describe()
            );
        }

        if self.registry.contains(&key) {
            debug!("{} already registered", key);
        }
        Ok(Prepared::Ready(self.registry.record(key, paths).to_vec()))
    }
}
