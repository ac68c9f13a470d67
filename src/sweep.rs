//! Sequential sweep over the workload catalog.
//!
//! Every run of a workload goes through plan → prepare → build → execute.
//! A failed run stops the remaining thread counts of its workload, and the
//! sweep moves on to the next workload. Runs that cannot be set up (bad
//! volume, producer data missing) are skipped and do not stop anything.

use tracing::{debug, error, info, warn};

use crate::command::{build_invocation, CommandSettings};
use crate::config::{SweepConfig, WorkloadSpec};
use crate::exec::CommandRunner;
use crate::lifecycle::{DirectoryLifecycle, Prepared};
use crate::planner::plan_capacity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    pub threads: u32,
    pub outcome: RunOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadReport {
    pub name: String,
    pub runs: Vec<RunRecord>,
    /// Thread counts abandoned after a failure.
    pub not_attempted: Vec<u32>,
}

impl WorkloadReport {
    fn count(&self, pred: impl Fn(&RunOutcome) -> bool) -> usize {
        self.runs.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn completed(&self) -> usize {
        self.count(|o| matches!(o, RunOutcome::Completed))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, RunOutcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RunOutcome::Failed(_)))
    }

    /// Thread counts that were handed to the benchmark, successful or not.
    pub fn attempted_threads(&self) -> Vec<u32> {
        self.runs
            .iter()
            .filter(|r| !matches!(r.outcome, RunOutcome::Skipped(_)))
            .map(|r| r.threads)
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub workloads: Vec<WorkloadReport>,
}

impl SweepReport {
    pub fn has_failures(&self) -> bool {
        self.workloads.iter().any(|w| w.failed() > 0)
    }

    pub fn workload(&self, name: &str) -> Option<&WorkloadReport> {
        self.workloads.iter().find(|w| w.name == name)
    }

    pub fn print_summary(&self) {
        println!();
        println!("=== Sweep Summary ===");
        println!(
            "{:<20} {:>9} {:>7} {:>6}  {}",
            "workload", "completed", "skipped", "failed", "not attempted"
        );
        for w in &self.workloads {
            let abandoned = if w.not_attempted.is_empty() {
                "-".to_string()
            } else {
                format!("{:?}", w.not_attempted)
            };
            println!(
                "{:<20} {:>9} {:>7} {:>6}  {}",
                w.name,
                w.completed(),
                w.skipped(),
                w.failed(),
                abandoned
            );
        }
        for w in &self.workloads {
            for run in &w.runs {
                if let RunOutcome::Failed(reason) = &run.outcome {
                    println!("FAILED  {} @ {} threads: {}", w.name, run.threads, reason);
                }
            }
        }
    }
}

/// Run every thread count of `workload`, stopping at the first failure.
pub fn run_workload(
    lifecycle: &mut DirectoryLifecycle,
    settings: &CommandSettings,
    workload: &WorkloadSpec,
    runner: &mut dyn CommandRunner,
) -> WorkloadReport {
    let mut report = WorkloadReport {
        name: workload.name.clone(),
        runs: Vec::with_capacity(workload.threads.len()),
        not_attempted: Vec::new(),
    };

    let total_gb = match workload.total_volume_gb() {
        Ok(gb) => gb,
        Err(e) => {
            warn!("{:#}; skipping all runs of {}", e, workload.name);
            let reason = format!("{:#}", e);
            report.runs = workload
                .threads
                .iter()
                .map(|&threads| RunRecord {
                    threads,
                    outcome: RunOutcome::Skipped(reason.clone()),
                })
                .collect();
            return report;
        }
    };

    for (idx, &threads) in workload.threads.iter().enumerate() {
        let outcome = run_once(lifecycle, settings, workload, threads, total_gb, runner);
        let failed = matches!(outcome, RunOutcome::Failed(_));
        report.runs.push(RunRecord { threads, outcome });

        if failed {
            report.not_attempted = workload.threads[idx + 1..].to_vec();
            if !report.not_attempted.is_empty() {
                warn!(
                    "Abandoning remaining thread counts {:?} of {}",
                    report.not_attempted, workload.name
                );
            }
            break;
        }
    }

    report
}

fn run_once(
    lifecycle: &mut DirectoryLifecycle,
    settings: &CommandSettings,
    workload: &WorkloadSpec,
    threads: u32,
    total_gb: u64,
    runner: &mut dyn CommandRunner,
) -> RunOutcome {
    let file_size = match plan_capacity(total_gb, threads, lifecycle.topology().mount_count()) {
        Ok(size) => size,
        Err(e) => {
            warn!("Skipping {} at {} threads: {:#}", workload.name, threads, e);
            return RunOutcome::Skipped(format!("{:#}", e));
        }
    };

    let directories = match lifecycle.prepare_directories(workload, threads, runner) {
        Ok(Prepared::Ready(dirs)) => dirs,
        Ok(Prepared::Skip { producer }) => {
            return RunOutcome::Skipped(format!("no directories from {}", producer));
        }
        Err(e) => {
            error!("Error preparing {} with {} threads: {:#}", workload.name, threads, e);
            return RunOutcome::Failed(format!("{:#}", e));
        }
    };

    let invocation = build_invocation(
        settings,
        lifecycle.topology().hosts(),
        workload,
        threads,
        &file_size,
        &directories,
    );
    println!("Running command: {}", invocation);

    match runner.execute(&invocation) {
        Ok(outcome) if outcome.is_success() => {
            info!("{} with {} threads completed", workload.name, threads);
            RunOutcome::Completed
        }
        Ok(outcome) => {
            error!(
                "Error running workload {} with {} threads: {}",
                workload.name,
                threads,
                outcome.describe()
            );
            RunOutcome::Failed(outcome.describe())
        }
        Err(e) => {
            error!("Error running workload {} with {} threads: {:#}", workload.name, threads, e);
            RunOutcome::Failed(format!("{:#}", e))
        }
    }
}

/// Run the catalog in declared order.
///
/// Read workloads depend on their producer having run earlier in this order;
/// nothing is reordered here.
pub fn run_sweep(
    config: &SweepConfig,
    lifecycle: &mut DirectoryLifecycle,
    runner: &mut dyn CommandRunner,
) -> SweepReport {
    let settings = CommandSettings::from(config);
    let mut report = SweepReport::default();

    for workload in &config.workloads {
        println!("\n\nStarting workload: {}\n", workload.name);
        let workload_report = run_workload(lifecycle, &settings, workload, runner);
        println!(
            "\nCompleted workload: {} ({} completed, {} skipped, {} failed)\n",
            workload.name,
            workload_report.completed(),
            workload_report.skipped(),
            workload_report.failed()
        );
        report.workloads.push(workload_report);
    }

    info!(
        "Sweep finished: {} workloads, {} registered run directories",
        report.workloads.len(),
        lifecycle.registry().len()
    );
    let mut registered: Vec<_> = lifecycle.registry().iter().collect();
    registered.sort_by(|a, b| a.0.cmp(b.0));
    for (key, paths) in registered {
        debug!("registered: {} -> {:?}", key, paths);
    }
    report
}
