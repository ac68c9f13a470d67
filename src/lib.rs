// src/lib.rs

pub mod command;
pub mod config;
pub mod constants;
pub mod exec;
pub mod lifecycle; // Run directory creation and reuse
pub mod planner;
pub mod size_parser;
pub mod sweep;
pub mod validation;

pub use config::{AccessType, ClusterTopology, SweepConfig, WorkloadSpec};
pub use exec::{CommandRunner, ExecOutcome};
pub use lifecycle::{DirectoryLifecycle, DirectoryRegistry, Prepared, RunKey};
pub use sweep::{run_sweep, SweepReport};
