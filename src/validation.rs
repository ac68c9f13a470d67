// Configuration validation and summary display
// Used by the `validate` subcommand and printed before a dry run

use crate::command::CommandSettings;
use crate::config::{AccessType, SweepConfig};
use crate::planner::plan_capacity;
use anyhow::Result;

/// Display the sweep that a config describes: topology, tools and, for every
/// workload, the per-thread file size each run would use.
pub fn display_config_summary(config: &SweepConfig, config_path: &str) -> Result<()> {
    let topology = config.topology()?;
    let settings = CommandSettings::from(config);

    println!("╔═══════════════════════════════════════════════════════════════════════╗");
    println!("║           SWEEP CONFIGURATION SUMMARY                                 ║");
    println!("╚═══════════════════════════════════════════════════════════════════════╝");
    println!();
    println!("✅ Config parsed successfully: {}", config_path);
    println!();

    println!("┌─ Cluster ────────────────────────────────────────────────────────────┐");
    println!("│ Hosts:        {}", settings.host_list(topology.hosts()));
    println!("│ Mounts:       {} (must all reference the same export)", topology.mount_count());
    for mount in topology.mount_paths() {
        println!("│   {}", mount.display());
    }
    println!("│ Fan-out:      {} -l {}", settings.fanout_bin, settings.remote_user);
    println!("│ Benchmark:    {}", settings.benchmark_bin);
    println!("│ Results dir:  {}", settings.results_dir.display());
    println!("└──────────────────────────────────────────────────────────────────────┘");
    println!();

    println!("┌─ Workloads (in execution order) ─────────────────────────────────────┐");
    for (idx, workload) in config.workloads.iter().enumerate() {
        println!(
            "│ {:>2}. {} [{}] block={} op='{}' total={}",
            idx + 1,
            workload.name,
            workload.access,
            workload.block_size,
            workload.operation,
            workload.total_size
        );
        if workload.access == AccessType::Read {
            println!(
                "│     reads directories of: {}",
                workload.producer_name(&config.canonical_producer)
            );
        }
        match workload.total_volume_gb() {
            Ok(total_gb) => {
                let sizes: Vec<String> = workload
                    .threads
                    .iter()
                    .map(|&t| match plan_capacity(total_gb, t, topology.mount_count()) {
                        Ok(size) => format!("{}t={}", t, size),
                        Err(_) => format!("{}t=SKIP", t),
                    })
                    .collect();
                println!("│     per-thread size: {}", sizes.join(" "));
            }
            Err(e) => {
                println!("│     ⚠ {:#} (all runs will be skipped)", e);
            }
        }
        println!("│     csv: {}", settings.csv_path(workload).display());
    }
    println!("└──────────────────────────────────────────────────────────────────────┘");
    println!();

    Ok(())
}
