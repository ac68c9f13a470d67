//! Capacity planning: how much each elbencho thread writes or reads.

use anyhow::{anyhow, bail, Result};
use std::fmt;

use crate::constants::CAPACITY_OVERPROVISION_FACTOR;

/// Per-thread file size in whole gigabytes, rendered as elbencho's `--size` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FileSize {
    gb: u64,
}

impl FileSize {
    pub fn gigabytes(self) -> u64 {
        self.gb
    }
}

impl fmt::Display for FileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}G", self.gb)
    }
}

/// Split `total_volume_gb` over `thread_count × mount_count` streams, then
/// double the share.
///
/// The doubling over-provisions the dataset so reads come from the capacity
/// tier and not from cache; it must stay. A share that truncates to zero
/// means the volume is too small for this many streams and is reported as
/// an error rather than rounded up.
pub fn plan_capacity(total_volume_gb: u64, thread_count: u32, mount_count: usize) -> Result<FileSize> {
    if thread_count == 0 {
        bail!("thread count must be at least 1");
    }
    if mount_count == 0 {
        bail!("at least one mount path is required");
    }

    let streams = u128::from(thread_count) * mount_count as u128;
    let gb = u128::from(total_volume_gb) * u128::from(CAPACITY_OVERPROVISION_FACTOR) / streams;
    if gb == 0 {
        bail!(
            "{}G over {} threads x {} mounts leaves less than 1G per thread",
            total_volume_gb,
            thread_count,
            mount_count
        );
    }

    let gb = u64::try_from(gb).map_err(|_| {
        anyhow!(
            "{}G over {} threads x {} mounts overflows the per-thread size",
            total_volume_gb,
            thread_count,
            mount_count
        )
    })?;

    Ok(FileSize { gb })
}
