//! Storage redundancy health, collected from whatever this host has.
//!
//! Four independent strategies contribute to one device list: cciss
//! hardware controllers queried through `cciss_vol_status`, an `mpt-status`
//! controller summary, the `/proc/mdstat` software RAID pseudo-file, and
//! `btrfs scrub status` for every mounted btrfs filesystem. A strategy
//! whose tool or pseudo-file is missing contributes nothing; no strategy
//! failure is ever an error, the worst case is an empty list.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::Command;

use regex::Regex;

use crate::munin::field_name;

/// Health of one monitored device, array, or filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceStatus {
    /// Raw device path, array name, or mount point
    pub identifier: String,
    /// false means degraded or erroring
    pub healthy: bool,
    /// Category label plus identifier, used as the munin label
    pub description: String,
}

impl DeviceStatus {
    fn hardware(identifier: &str, healthy: bool) -> DeviceStatus {
        DeviceStatus {
            identifier: identifier.to_owned(),
            healthy,
            description: format!("Hardware RAID device {}", identifier),
        }
    }

    fn software(identifier: &str, healthy: bool) -> DeviceStatus {
        DeviceStatus {
            identifier: identifier.to_owned(),
            healthy,
            description: format!("Software RAID device {}", identifier),
        }
    }

    fn btrfs(mount: &str, healthy: bool) -> DeviceStatus {
        DeviceStatus {
            identifier: mount.to_owned(),
            healthy,
            description: format!("BTRFS in {}", mount),
        }
    }

    /// The numeric value reported to munin: 1 healthy, 0 degraded.
    pub fn value(&self) -> u8 {
        if self.healthy {
            1
        } else {
            0
        }
    }
}

/// Where the detection strategies look.
///
/// Defaults are the production paths. The munin-raid binary lets every one
/// be overridden, which is also how tests point a strategy at a fixture.
#[derive(Debug)]
pub struct Detector {
    /// Directory scanned for cciss controller nodes
    pub cciss_dir: PathBuf,
    /// cciss_vol_status executable
    pub cciss_tool: PathBuf,
    /// mpt-status executable
    pub mpt_tool: PathBuf,
    /// Software RAID status pseudo-file
    pub mdstat: PathBuf,
    /// Mounted filesystem listing
    pub mounts: PathBuf,
    /// btrfs executable used for scrub status
    pub btrfs_tool: PathBuf,
}

impl Default for Detector {
    fn default() -> Detector {
        Detector {
            cciss_dir: PathBuf::from("/dev/cciss"),
            cciss_tool: PathBuf::from("/usr/sbin/cciss_vol_status"),
            mpt_tool: PathBuf::from("/usr/sbin/mpt-status"),
            mdstat: PathBuf::from("/proc/mdstat"),
            mounts: PathBuf::from("/proc/mounts"),
            btrfs_tool: PathBuf::from("/usr/bin/btrfs"),
        }
    }
}

impl Detector {
    /// Run every strategy in its fixed order and merge the results.
    ///
    /// The merge keeps the first entry for any munin field name, so the
    /// protocol output never declares one field twice even if two
    /// strategies were to claim the same identifier.
    pub fn detect_all(&self) -> Vec<DeviceStatus> {
        merge_unique(vec![
            cciss_status(&self.cciss_dir, &self.cciss_tool),
            mpt_status(&self.mpt_tool),
            mdstat(&self.mdstat),
            btrfs_scrub(&self.mounts, &self.btrfs_tool),
        ])
    }
}

fn merge_unique(lists: Vec<Vec<DeviceStatus>>) -> Vec<DeviceStatus> {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for device in lists.into_iter().flatten() {
        if seen.insert(field_name(&device.identifier)) {
            merged.push(device);
        }
    }
    merged
}

fn read_file(path: &Path) -> Result<String, io::Error> {
    let mut fh = File::open(path)?;
    let mut contents = String::new();
    fh.read_to_string(&mut contents)?;
    Ok(contents)
}

// ////////////////////////////////////////////////////////////////////////////
// Hardware RAID: cciss controllers

/// Query `cciss_vol_status` for every cciss controller node.
///
/// The tool prints one line per device argument, in argument order, and we
/// rely on that: line N answers for device N. A line without a "status: "
/// field means that slot is not a monitorable device and is omitted.
pub fn cciss_status(dev_dir: &Path, tool: &Path) -> Vec<DeviceStatus> {
    let devices = controller_nodes(dev_dir);
    if devices.is_empty() || !tool.exists() {
        return Vec::new();
    }
    let output = match Command::new(tool).args(&devices).output() {
        Ok(output) => output,
        Err(_) => return Vec::new(),
    };
    let report = String::from_utf8_lossy(&output.stdout);
    parse_controller_report(&devices, &report)
}

/// The controller nodes under `dev_dir`, lexically sorted.
///
/// Controllers appear as c<N>d0; the logical drives behind them do not get
/// their own status line from the tool.
fn controller_nodes(dev_dir: &Path) -> Vec<String> {
    let node = Regex::new(r"^c[0-9]+d0$").unwrap();
    let entries = match fs::read_dir(dev_dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };
    let mut devices = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| node.is_match(name))
        .map(|name| dev_dir.join(name).to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    devices.sort();
    devices
}

fn parse_controller_report(devices: &[String], report: &str) -> Vec<DeviceStatus> {
    let lines = report.lines().collect::<Vec<_>>();
    devices
        .iter()
        .enumerate()
        .filter_map(|(idx, device)| {
            let line = lines.get(idx)?;
            if line.contains("status: OK") {
                Some(DeviceStatus::hardware(device, true))
            } else if line.contains("status: ") {
                Some(DeviceStatus::hardware(device, false))
            } else {
                None
            }
        })
        .collect()
}

// ////////////////////////////////////////////////////////////////////////////
// Hardware RAID: mpt fusion controllers

/// One aggregate status for the whole mpt controller.
///
/// `mpt-status -s` prints a summary when the controller can answer and
/// nothing otherwise, so this is a coarser signal than the cciss strategy:
/// any output at all counts as healthy, silence as degraded.
pub fn mpt_status(tool: &Path) -> Vec<DeviceStatus> {
    if !tool.exists() {
        return Vec::new();
    }
    let healthy = Command::new(tool)
        .arg("-s")
        .output()
        .map(|output| !output.stdout.is_empty())
        .unwrap_or(false);
    vec![DeviceStatus::hardware("mpt", healthy)]
}

// ////////////////////////////////////////////////////////////////////////////
// Software RAID: /proc/mdstat

/// One DeviceStatus per array block in the mdstat pseudo-file.
pub fn mdstat(path: &Path) -> Vec<DeviceStatus> {
    match read_file(path) {
        Ok(contents) => parse_mdstat(&contents),
        Err(_) => Vec::new(),
    }
}

/// Walk the array blocks: a header names the array, and the first line
/// after it carries the member map, where '_' marks a dead member.
///
/// Only lines shaped like `md… : ` start an array; the `Personalities :`
/// preamble would otherwise look like one on hosts with raid modules
/// loaded but no arrays. The current array is forgotten once its first
/// detail line has been read, so resync progress lines are not consulted.
fn parse_mdstat(contents: &str) -> Vec<DeviceStatus> {
    let header = Regex::new(r"^(md\S*) : ").unwrap();
    let mut arrays = Vec::new();
    let mut current: Option<String> = None;
    for line in contents.lines() {
        if let Some(caps) = header.captures(line) {
            current = Some(caps[1].to_owned());
        } else if let Some(array) = current.take() {
            arrays.push(DeviceStatus::software(&array, !line.contains('_')));
        }
    }
    arrays
}

// ////////////////////////////////////////////////////////////////////////////
// Filesystem scrub: btrfs

/// Error counters that must all be zero for a scrubbed filesystem to count
/// as healthy. A counter missing from the report is itself degraded.
const SCRUB_ERROR_COUNTERS: [&str; 6] = [
    "read_errors",
    "verify_errors",
    "super_errors",
    "malloc_errors",
    "uncorrectable_errors",
    "unverified_errors",
];

/// Scrub health for every mounted btrfs filesystem.
///
/// Filesystems that have never been scrubbed (no "scrub started" in the
/// status output) are skipped rather than reported, as are mount points
/// the tool cannot answer for at all.
pub fn btrfs_scrub(mounts_path: &Path, tool: &Path) -> Vec<DeviceStatus> {
    let contents = match read_file(mounts_path) {
        Ok(contents) => contents,
        Err(_) => return Vec::new(),
    };
    btrfs_mounts(&contents)
        .iter()
        .filter_map(|mount| {
            let output = Command::new(tool)
                .args(&["scrub", "status", "-R"])
                .arg(mount)
                .output()
                .ok()?;
            let report = String::from_utf8_lossy(&output.stdout);
            scrub_health(&report).map(|healthy| DeviceStatus::btrfs(mount, healthy))
        })
        .collect()
}

/// The btrfs mount points from a /proc/mounts style file.
///
/// The first mount point seen per device wins, and each distinct point is
/// probed once; a device mounted in several places is only scrubbed from
/// one of them anyway.
fn btrfs_mounts(mounts: &str) -> Vec<String> {
    let mut devices = HashSet::new();
    let mut points = HashSet::new();
    let mut found = Vec::new();
    for line in mounts.lines() {
        let mut parts = line.split_whitespace();
        let (device, mount, vfstype) = match (parts.next(), parts.next(), parts.next()) {
            (Some(d), Some(m), Some(t)) => (d, m, t),
            _ => continue,
        };
        if vfstype != "btrfs" || !devices.insert(device.to_owned()) {
            continue;
        }
        if points.insert(mount.to_owned()) {
            found.push(mount.to_owned());
        }
    }
    found
}

/// Classify a scrub status report.
///
/// `None` means the filesystem has no scrub to speak of and should be
/// skipped; `Some(healthy)` comes from the error counters.
fn scrub_health(report: &str) -> Option<bool> {
    if !report.contains("scrub started") {
        return None;
    }
    let healthy = SCRUB_ERROR_COUNTERS
        .iter()
        .all(|counter| counter_value(report, counter) == Some(0));
    Some(healthy)
}

/// The value of a `name: N` counter line, if present and numeric.
fn counter_value(report: &str, counter: &str) -> Option<u64> {
    report.lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some(name), Some(count)) if name.trim_end_matches(':') == counter => {
                count.parse().ok()
            }
            _ => None,
        }
    })
}

// ////////////////////////////////////////////////////////////////////////////
// Testing


#[cfg(test)]
#[cfg(target_os = "linux")]
mod integration {
    use std::path::Path;

    use super::mdstat;

    #[test]
    fn proc_mdstat_loads() {
        // hosts without md loaded just get an empty list
        let _ = mdstat(Path::new("/proc/mdstat"));
    }
}
