//! Report chrony's NTP tracking status in the munin plugin protocol.

use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use structopt::StructOpt;

use munin_plugins::chrony::{self, TrackingField, TRACKING_FIELDS};
use munin_plugins::munin::{Graph, Mode};

/// Report `chronyc tracking` values as a munin plugin.
///
/// Run with no argument to print values, `config` to print the graph
/// declaration, or `autoconf` to check whether chronyd is answering.
#[derive(StructOpt, Debug, Deserialize)]
#[structopt(
    name = "munin-chrony (part of munin-plugins)",
    setting = structopt::clap::AppSettings::ColoredHelp
)]
struct Args {
    /// Plugin mode: autoconf, config, or anything else to fetch values
    mode: Option<String>,
    /// chronyc executable
    #[structopt(long = "chronyc", default_value = "chronyc")]
    chronyc: PathBuf,
    /// Also print values from config mode, as if fetched
    #[structopt(long = "dirty-config")]
    dirty_config: bool,
}

static GRAPH: Graph = Graph {
    title: "Chrony tracking",
    args: "--base 1000",
    vlabel: "seconds / ppm",
    category: "time",
};

#[cfg_attr(test, allow(dead_code))]
fn main() {
    let args = Args::from_args();
    let dirty_config = args.dirty_config || dirty_config_requested();

    let lines = match Mode::from_arg(args.mode.as_ref().map(String::as_str)) {
        Mode::Autoconf => match chrony::tracking_report(&args.chronyc) {
            Ok(_) => vec!["yes".to_string()],
            Err(e) => vec![format!("no ({})", e)],
        },
        Mode::Config => {
            let report = if dirty_config {
                chrony::tracking_report(&args.chronyc).unwrap_or_default()
            } else {
                String::new()
            };
            config_lines(&GRAPH, TRACKING_FIELDS, &report, dirty_config)
        }
        Mode::Fetch => {
            let report = chrony::tracking_report(&args.chronyc).unwrap_or_default();
            value_lines(TRACKING_FIELDS, &report)
        }
    };
    for line in lines {
        println!("{}", line);
    }
}

/// Whether munin-node advertised the dirtyconfig capability for this run.
fn dirty_config_requested() -> bool {
    env::var("MUNIN_CAP_DIRTYCONFIG")
        .map(|v| v == "1")
        .unwrap_or(false)
}

fn config_lines(
    graph: &Graph,
    fields: &[TrackingField],
    report: &str,
    dirty_config: bool,
) -> Vec<String> {
    let mut lines = graph.config_lines();
    for field in fields {
        lines.push(format!("{}.label {}", field.name, field.label));
        lines.push(format!("{}.info {} ({})", field.name, field.label, field.unit));
    }
    if dirty_config {
        lines.extend(value_lines(fields, report));
    }
    lines
}

/// One value line per declared field, `U` for anything the report lacks.
fn value_lines(fields: &[TrackingField], report: &str) -> Vec<String> {
    let values = chrony::tracking_values(fields, report);
    fields
        .iter()
        .map(|field| {
            match values.iter().find(|(found, _)| found.name == field.name) {
                Some((_, value)) => format!("{}.value {}", field.name, value),
                None => format!("{}.value U", field.name),
            }
        })
        .collect()
}

#[cfg(test)]
mod unit {
    use structopt::StructOpt;

    use super::*;

    fn build_args(argv: Vec<&str>) -> Args {
        Args::from_iter(argv.into_iter())
    }

    #[test]
    fn validate_argparse() {
        let args = build_args(vec!["munin-chrony"]);
        assert_eq!(args.mode, None);
        assert_eq!(args.chronyc, PathBuf::from("chronyc"));

        let args = build_args(vec!["munin-chrony", "autoconf", "--chronyc=/opt/bin/chronyc"]);
        assert_eq!(args.mode, Some("autoconf".to_string()));
        assert_eq!(args.chronyc, PathBuf::from("/opt/bin/chronyc"));
    }

    #[test]
    fn config_declares_every_field() {
        let lines = config_lines(&GRAPH, TRACKING_FIELDS, "", false);
        assert_eq!(lines[0], "graph_title Chrony tracking");
        assert!(lines.contains(&"stratum.label Stratum".to_string()));
        assert!(lines.contains(&"systime.info System time offset (seconds)".to_string()));
        // graph lines plus a label and an info line per field
        assert_eq!(lines.len(), 4 + 2 * TRACKING_FIELDS.len());
        assert!(!lines.iter().any(|line| line.contains(".value")));
    }

    #[test]
    fn values_fall_back_to_unknown() {
        let report = "Stratum         : 2\nSkew            : 0.5 ppm\n";
        let lines = value_lines(TRACKING_FIELDS, report);
        assert_eq!(lines.len(), TRACKING_FIELDS.len());
        assert!(lines.contains(&"stratum.value 2".to_string()));
        assert!(lines.contains(&"skew.value 0.5".to_string()));
        assert!(lines.contains(&"systime.value U".to_string()));
    }

    #[test]
    fn dirty_config_appends_values() {
        let report = "Stratum         : 2\n";
        let lines = config_lines(&GRAPH, TRACKING_FIELDS, report, true);
        assert!(lines.contains(&"stratum.value 2".to_string()));
        assert_eq!(lines.len(), 4 + 3 * TRACKING_FIELDS.len());
    }
}
