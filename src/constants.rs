// src/constants.rs
//
// Central location for all constants used throughout elbencho-sweep
// Keeps tool names, ports and sizing policy in one place

// =============================================================================
// External Tools
// =============================================================================

/// Benchmark executable driven for every run
/// User can override via config: benchmark_bin
pub const DEFAULT_BENCHMARK_BIN: &str = "elbencho";

/// Fan-out shell used to create run directories on every host
/// User can override via config: fanout_bin
pub const DEFAULT_FANOUT_BIN: &str = "clush";

/// Login user passed to the fan-out shell (`-l`)
/// User can override via config: remote_user
pub const DEFAULT_REMOTE_USER: &str = "vastdata";

/// Port the elbencho service daemons listen on
/// User can override via config: service_port
pub const DEFAULT_SERVICE_PORT: u16 = 1611;

// =============================================================================
// Sweep Policy
// =============================================================================

/// Workload whose directories back every read workload unless it names its own producer
/// User can override via config: canonical_producer (or per workload: producer)
pub const DEFAULT_CANONICAL_PRODUCER: &str = "1MB_seq_write";

/// Directory that receives the per-workload CSV files
/// User can override via config: results_dir
pub const DEFAULT_RESULTS_DIR: &str = ".";

/// Over-provisioning factor applied to every per-thread file size.
/// Reads must be served from the capacity tier, not from the write cache,
/// so twice the nominal share is written.
pub const CAPACITY_OVERPROVISION_FACTOR: u64 = 2;

/// Gigabytes per terabyte when converting total volume tokens
pub const GB_PER_TB: u64 = 1024;

// =============================================================================
// Benchmark Flags
// =============================================================================

/// Bypass the client page cache so the remote system is measured
pub const FLAG_DIRECT_IO: &str = "--direct";

/// Create the target directories / files as needed
pub const FLAG_MKDIRS: &str = "-d";

/// Record per-operation latency
pub const FLAG_LATENCY: &str = "--lat";

/// Suffix of the per-workload result file
pub const CSV_EXTENSION: &str = "csv";

/// Suffix of the directory created for each run, `{workload}_{threads}_threads`
pub const RUN_DIR_SUFFIX: &str = "threads";
