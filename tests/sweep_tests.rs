// tests/sweep_tests.rs
//
// End-to-end sweep behaviour against a recording runner: nothing is spawned.

use anyhow::Result;
use elbencho_sweep::command::{CommandSettings, Invocation};
use elbencho_sweep::exec::{CommandRunner, DryRunRunner, ExecOutcome};
use elbencho_sweep::lifecycle::{DirectoryLifecycle, RunKey};
use elbencho_sweep::sweep::{run_sweep, RunOutcome};
use elbencho_sweep::SweepConfig;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Records every invocation. Benchmark runs of workloads whose CSV name
/// starts with one of `fail_workloads` exit 1; fan-out requests can be
/// failed separately.
#[derive(Default)]
struct Recorder {
    calls: Vec<Invocation>,
    fail_workloads: Vec<String>,
    fail_fanout: bool,
}

impl Recorder {
    fn benchmark_calls(&self) -> Vec<&Invocation> {
        self.calls.iter().filter(|c| c.program == "elbencho").collect()
    }

    fn fanout_calls(&self) -> Vec<&Invocation> {
        self.calls.iter().filter(|c| c.program == "clush").collect()
    }
}

impl CommandRunner for Recorder {
    fn execute(&mut self, invocation: &Invocation) -> Result<ExecOutcome> {
        self.calls.push(invocation.clone());
        if invocation.program == "clush" {
            return Ok(if self.fail_fanout {
                ExecOutcome::failure(1, "clush: 10.0.0.2: exited with exit code 1")
            } else {
                ExecOutcome::success()
            });
        }
        let csv_name = invocation
            .flag_value("--csvfile")
            .and_then(|csv| Path::new(csv).file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let failing = self
            .fail_workloads
            .iter()
            .any(|w| csv_name.starts_with(&format!("{}_", w)));
        Ok(if failing {
            ExecOutcome::failure(1, "ERROR: Unable to connect to service host")
        } else {
            ExecOutcome::success()
        })
    }
}

fn lifecycle_for(config: &SweepConfig) -> DirectoryLifecycle {
    DirectoryLifecycle::new(
        config.topology().unwrap(),
        CommandSettings::from(config),
        config.canonical_producer.clone(),
    )
}

const SCENARIO: &str = r#"
hosts: [10.0.0.1]
mount_paths: [/mnt/nfs1, /mnt/nfs2]
canonical_producer: W
workloads:
  - name: W
    block_size: 4k
    operation: --write
    access: write
    threads: [1, 2]
    total_size: 1T
"#;

#[test]
fn test_two_mount_scenario() {
    let config = SweepConfig::from_yaml_str(SCENARIO).unwrap();
    let mut lifecycle = lifecycle_for(&config);
    let mut runner = Recorder::default();

    let report = run_sweep(&config, &mut lifecycle, &mut runner);

    assert!(!report.has_failures());
    let runs = runner.benchmark_calls();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].flag_value("--size"), Some("1024G"));
    assert_eq!(runs[1].flag_value("--size"), Some("512G"));
    assert_eq!(runs[0].flag_value("--hosts"), Some("10.0.0.1:1611"));
    assert_eq!(runs[0].flag_value("--csvfile"), Some("./W_1T.csv"));
    assert!(runs[0].args.ends_with(&[
        "/mnt/nfs1/W_1_threads".to_string(),
        "/mnt/nfs2/W_1_threads".to_string(),
    ]));

    let fanout = runner.fanout_calls();
    assert_eq!(fanout.len(), 2);
    assert_eq!(
        fanout[1].args.last().map(String::as_str),
        Some("mkdir -p /mnt/nfs1/W_2_threads /mnt/nfs2/W_2_threads")
    );

    let registry = lifecycle.registry();
    assert_eq!(registry.len(), 2);
    assert_eq!(
        registry.get(&RunKey::new("W", 2)),
        Some(&[PathBuf::from("/mnt/nfs1/W_2_threads"), PathBuf::from("/mnt/nfs2/W_2_threads")][..])
    );
}

const ISOLATION: &str = r#"
hosts: [10.0.0.1, 10.0.0.2]
mount_paths: [/mnt/nfs1]
workloads:
  - name: broken
    block_size: 1M
    operation: --write
    access: write
    threads: [1, 2, 4]
    total_size: 1T
  - name: healthy
    block_size: 1M
    operation: --write
    access: write
    threads: [1, 2, 4]
    total_size: 1T
"#;

#[test]
fn test_failed_workload_does_not_stop_sweep() {
    let config = SweepConfig::from_yaml_str(ISOLATION).unwrap();
    let mut lifecycle = lifecycle_for(&config);
    let mut runner = Recorder {
        fail_workloads: vec!["broken".to_string()],
        ..Default::default()
    };

    let report = run_sweep(&config, &mut lifecycle, &mut runner);

    assert!(report.has_failures());
    let broken = report.workload("broken").unwrap();
    assert_eq!(broken.attempted_threads(), vec![1]);
    assert_eq!(broken.not_attempted, vec![2, 4]);

    assert!(matches!(broken.runs[0].outcome, RunOutcome::Failed(_)));

    let healthy = report.workload("healthy").unwrap();
    assert_eq!(healthy.completed(), 3);
    assert_eq!(healthy.attempted_threads(), vec![1, 2, 4]);

    // Only thread count 1 of "broken" reached the benchmark
    let broken_runs: Vec<_> = runner
        .benchmark_calls()
        .into_iter()
        .filter(|c| c.flag_value("--csvfile") == Some("./broken_1T.csv"))
        .map(|c| c.flag_value("--threads").unwrap().to_string())
        .collect();
    assert_eq!(broken_runs, vec!["1"]);
}

#[test]
fn test_fanout_failure_is_isolated_to_workload() {
    let config = SweepConfig::from_yaml_str(ISOLATION).unwrap();
    let mut lifecycle = lifecycle_for(&config);
    let mut runner = Recorder {
        fail_fanout: true,
        ..Default::default()
    };

    let report = run_sweep(&config, &mut lifecycle, &mut runner);

    // Each workload fails on its first directory request and stops there
    assert_eq!(report.workloads.len(), 2);
    for w in &report.workloads {
        assert_eq!(w.failed(), 1);
        assert_eq!(w.not_attempted, vec![2, 4]);
    }
    assert!(runner.benchmark_calls().is_empty());
    assert!(lifecycle.registry().is_empty());
}

const READS: &str = r#"
hosts: [10.0.0.1]
mount_paths: [/mnt/nfs1, /mnt/nfs2]
workloads:
  - name: early_read
    block_size: 4k
    operation: --read
    access: read
    threads: [1, 2]
    total_size: 1T
  - name: 1MB_seq_write
    block_size: 1M
    operation: --write
    access: write
    threads: [1, 2]
    total_size: 4T
  - name: 4k_rand_read
    block_size: 4k
    operation: --read --rand
    access: read
    threads: [1, 2, 4]
    total_size: 1T
"#;

#[test]
fn test_reads_follow_canonical_producer() {
    let config = SweepConfig::from_yaml_str(READS).unwrap();
    let mut lifecycle = lifecycle_for(&config);
    let mut runner = Recorder::default();

    let report = run_sweep(&config, &mut lifecycle, &mut runner);
    assert!(!report.has_failures());

    // Ran before the producer: everything skipped, nothing invoked
    let early = report.workload("early_read").unwrap();
    assert_eq!(early.skipped(), 2);
    assert!(runner
        .calls
        .iter()
        .all(|c| c.flag_value("--csvfile") != Some("./early_read_1T.csv")));

    // 1 and 2 threads reuse producer data, 4 threads has none
    let reads = report.workload("4k_rand_read").unwrap();
    assert_eq!(reads.completed(), 2);
    assert_eq!(reads.runs[2].threads, 4);
    assert!(matches!(reads.runs[2].outcome, RunOutcome::Skipped(_)));

    let read_call = runner
        .benchmark_calls()
        .into_iter()
        .find(|c| c.flag_value("--csvfile") == Some("./4k_rand_read_1T.csv"))
        .unwrap();
    assert!(read_call.args.contains(&"--rand".to_string()));
    assert_eq!(read_call.args.last().unwrap(), "/mnt/nfs2/1MB_seq_write_1_threads");

    // Reads never register or create directories
    assert_eq!(lifecycle.registry().len(), 2);
    assert_eq!(runner.fanout_calls().len(), 2);
}

#[test]
fn test_builtin_dry_run() {
    let config = SweepConfig::builtin().unwrap();
    let mut lifecycle = lifecycle_for(&config);
    let mut runner = DryRunRunner::default();

    let report = run_sweep(&config, &mut lifecycle, &mut runner);

    assert!(!report.has_failures());
    // Burn-In + 7 write/mixed workloads x 7 thread counts
    assert_eq!(lifecycle.registry().len(), 1 + 7 * 7);
    // 5 read workloads reuse 1MB_seq_write at every thread count
    for name in ["1MB_seq_read", "64k_seq_read", "64k_rand_read", "4k_seq_read", "4k_rand_read"] {
        assert_eq!(report.workload(name).unwrap().completed(), 7);
    }
    let burn_in = runner
        .executed
        .iter()
        .find(|c| c.program == "elbencho")
        .unwrap();
    assert_eq!(burn_in.flag_value("--size"), Some("16G"));
    assert_eq!(burn_in.flag_value("--block"), Some("2M"));
}

#[test]
fn test_load_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SCENARIO.as_bytes()).unwrap();

    let config = SweepConfig::load(file.path()).unwrap();
    assert_eq!(config.workloads[0].name, "W");

    let missing = SweepConfig::load(&file.path().with_extension("missing"));
    assert!(missing.is_err());
}
