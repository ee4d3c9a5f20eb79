//! Report storage redundancy health in the munin plugin protocol.
//!
//! Every device the host knows how to answer for graphs as 1 (healthy) or
//! 0 (degraded), with a warning threshold that fires when a value drops
//! below 1.

use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use structopt::StructOpt;

use munin_plugins::munin::{field_name, Graph, Mode};
use munin_plugins::raid::{Detector, DeviceStatus};

/// Report storage redundancy health as a munin plugin.
///
/// Aggregates cciss and mpt hardware controllers, mdstat software arrays,
/// and scrubbed btrfs filesystems into one graph. Run with no argument to
/// print values, `config` to print the graph declaration, or `autoconf`
/// to check whether this host has anything to report.
#[derive(StructOpt, Debug, Deserialize)]
#[structopt(
    name = "munin-raid (part of munin-plugins)",
    setting = structopt::clap::AppSettings::ColoredHelp
)]
struct Args {
    /// Plugin mode: autoconf, config, or anything else to fetch values
    mode: Option<String>,
    /// Directory scanned for cciss controller nodes
    #[structopt(long = "cciss-dir", default_value = "/dev/cciss")]
    cciss_dir: PathBuf,
    /// cciss_vol_status executable
    #[structopt(long = "cciss-tool", default_value = "/usr/sbin/cciss_vol_status")]
    cciss_tool: PathBuf,
    /// mpt-status executable
    #[structopt(long = "mpt-tool", default_value = "/usr/sbin/mpt-status")]
    mpt_tool: PathBuf,
    /// Software RAID status pseudo-file
    #[structopt(long = "mdstat", default_value = "/proc/mdstat")]
    mdstat: PathBuf,
    /// Mounted filesystem listing
    #[structopt(long = "mounts", default_value = "/proc/mounts")]
    mounts: PathBuf,
    /// btrfs executable used for scrub status
    #[structopt(long = "btrfs-tool", default_value = "/usr/bin/btrfs")]
    btrfs_tool: PathBuf,
    /// Also print values from config mode, as if fetched
    #[structopt(long = "dirty-config")]
    dirty_config: bool,
}

static GRAPH: Graph = Graph {
    title: "RAID and filesystem redundancy",
    args: "--base 1000 --lower-limit 0 --upper-limit 1",
    vlabel: "healthy (1) or degraded (0)",
    category: "disk",
};

#[cfg_attr(test, allow(dead_code))]
fn main() {
    let args = Args::from_args();
    let detector = Detector {
        cciss_dir: args.cciss_dir,
        cciss_tool: args.cciss_tool,
        mpt_tool: args.mpt_tool,
        mdstat: args.mdstat,
        mounts: args.mounts,
        btrfs_tool: args.btrfs_tool,
    };
    let devices = detector.detect_all();
    let dirty_config = args.dirty_config || dirty_config_requested();

    let lines = match Mode::from_arg(args.mode.as_ref().map(String::as_str)) {
        Mode::Autoconf => vec![autoconf_line(&devices).to_string()],
        Mode::Config => config_lines(&GRAPH, &devices, dirty_config),
        Mode::Fetch => value_lines(&devices),
    };
    for line in lines {
        println!("{}", line);
    }
}

/// Whether munin-node advertised the dirtyconfig capability for this run.
///
/// Checked once here and passed down as a plain bool; nothing below main
/// consults the environment.
fn dirty_config_requested() -> bool {
    env::var("MUNIN_CAP_DIRTYCONFIG")
        .map(|v| v == "1")
        .unwrap_or(false)
}

fn autoconf_line(devices: &[DeviceStatus]) -> &'static str {
    if devices.is_empty() {
        "no (no RAID devices found)"
    } else {
        "yes"
    }
}

fn config_lines(graph: &Graph, devices: &[DeviceStatus], dirty_config: bool) -> Vec<String> {
    let mut lines = graph.config_lines();
    for device in devices {
        let field = field_name(&device.identifier);
        lines.push(format!("{}.label {}", field, device.description));
        lines.push(format!("{}.warning 1:", field));
    }
    if dirty_config {
        lines.extend(value_lines(devices));
    }
    lines
}

fn value_lines(devices: &[DeviceStatus]) -> Vec<String> {
    devices
        .iter()
        .map(|device| format!("{}.value {}", field_name(&device.identifier), device.value()))
        .collect()
}

#[cfg(test)]
mod unit {
    use structopt::StructOpt;

    use super::*;

    fn build_args(argv: Vec<&str>) -> Args {
        Args::from_iter(argv.into_iter())
    }

    fn array(name: &str, healthy: bool) -> DeviceStatus {
        DeviceStatus {
            identifier: name.to_string(),
            healthy,
            description: format!("Software RAID device {}", name),
        }
    }

    #[test]
    fn validate_argparse() {
        let args = build_args(vec!["munin-raid", "config", "--mdstat=/tmp/mdstat"]);
        assert_eq!(args.mode, Some("config".to_string()));
        assert_eq!(args.mdstat, PathBuf::from("/tmp/mdstat"));
        assert!(!args.dirty_config);

        let args = build_args(vec!["munin-raid"]);
        assert_eq!(args.mode, None);
        assert_eq!(args.mounts, PathBuf::from("/proc/mounts"));
    }

    #[test]
    fn autoconf_answers_for_bare_and_populated_hosts() {
        assert_eq!(autoconf_line(&[]), "no (no RAID devices found)");
        assert_eq!(autoconf_line(&[array("md0", true)]), "yes");
    }

    #[test]
    fn config_declares_one_field_per_device() {
        let lines = config_lines(&GRAPH, &[array("md0", true)], false);
        assert_eq!(
            lines,
            vec![
                "graph_title RAID and filesystem redundancy",
                "graph_args --base 1000 --lower-limit 0 --upper-limit 1",
                "graph_vlabel healthy (1) or degraded (0)",
                "graph_category disk",
                "md0.label Software RAID device md0",
                "md0.warning 1:",
            ]
        );
    }

    #[test]
    fn dirty_config_appends_values() {
        let lines = config_lines(&GRAPH, &[array("md0", true)], true);
        assert_eq!(lines.last().unwrap(), "md0.value 1");
    }

    #[test]
    fn values_report_health_as_one_or_zero() {
        let devices = [array("md0", true), array("md1", false)];
        assert_eq!(value_lines(&devices), vec!["md0.value 1", "md1.value 0"]);
    }

    #[test]
    fn root_mount_point_value_line() {
        let root = DeviceStatus {
            identifier: "/".to_string(),
            healthy: true,
            description: "BTRFS in /".to_string(),
        };
        assert_eq!(value_lines(&[root]), vec!["root.value 1"]);
    }
}
