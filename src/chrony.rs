//! The tracking report from a chrony NTP daemon.
//!
//! `chronyc tracking` prints one `Name : value` line per quantity. Which
//! quantities become munin fields is declared in [`TRACKING_FIELDS`], and
//! the parser here pulls the numbers out of the raw report.

use std::fmt;
use std::io;
use std::path::Path;
use std::process::Command;

use derive_more::From;

/// One quantity from the tracking report that becomes a munin field.
#[derive(Debug)]
pub struct TrackingField {
    /// munin field name
    pub name: &'static str,
    /// Start of the `chronyc tracking` line the value is read from
    pub prefix: &'static str,
    /// Graph label
    pub label: &'static str,
    /// Unit, for the field's info line
    pub unit: &'static str,
}

/// Every field the munin-chrony plugin reports, in output order.
pub const TRACKING_FIELDS: &[TrackingField] = &[
    TrackingField {
        name: "stratum",
        prefix: "Stratum",
        label: "Stratum",
        unit: "hops to the reference clock",
    },
    TrackingField {
        name: "systime",
        prefix: "System time",
        label: "System time offset",
        unit: "seconds",
    },
    TrackingField {
        name: "lastoffset",
        prefix: "Last offset",
        label: "Last offset",
        unit: "seconds",
    },
    TrackingField {
        name: "rmsoffset",
        prefix: "RMS offset",
        label: "RMS offset",
        unit: "seconds",
    },
    TrackingField {
        name: "frequency",
        prefix: "Frequency",
        label: "Frequency",
        unit: "ppm",
    },
    TrackingField {
        name: "residualfreq",
        prefix: "Residual freq",
        label: "Residual frequency",
        unit: "ppm",
    },
    TrackingField {
        name: "skew",
        prefix: "Skew",
        label: "Skew",
        unit: "ppm",
    },
    TrackingField {
        name: "rootdelay",
        prefix: "Root delay",
        label: "Root delay",
        unit: "seconds",
    },
    TrackingField {
        name: "rootdispersion",
        prefix: "Root dispersion",
        label: "Root dispersion",
        unit: "seconds",
    },
    TrackingField {
        name: "updateinterval",
        prefix: "Update interval",
        label: "Update interval",
        unit: "seconds",
    },
];

/// Why a tracking report could not be collected.
#[derive(Debug, From)]
pub enum TrackingError {
    /// chronyc itself could not be run
    Io(io::Error),
    /// chronyc ran but printed nothing, usually because chronyd is down
    NoOutput,
}

impl fmt::Display for TrackingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TrackingError::Io(e) => write!(f, "chronyc not runnable: {}", e),
            TrackingError::NoOutput => write!(f, "no tracking data from chronyc"),
        }
    }
}

/// Run `chronyc tracking` and return the raw report.
pub fn tracking_report(chronyc: &Path) -> Result<String, TrackingError> {
    let output = Command::new(chronyc).arg("tracking").output()?;
    let report = String::from_utf8_lossy(&output.stdout).into_owned();
    if report.trim().is_empty() {
        return Err(TrackingError::NoOutput);
    }
    Ok(report)
}

/// Pull the value for each field out of a tracking report.
///
/// Fields whose line is missing or unparseable are absent from the result;
/// the caller decides what an absent field looks like on the wire.
pub fn tracking_values<'a>(
    fields: &'a [TrackingField],
    report: &str,
) -> Vec<(&'a TrackingField, f64)> {
    fields
        .iter()
        .filter_map(|field| {
            let line = report.lines().find(|line| line.starts_with(field.prefix))?;
            line_value(line).map(|value| (field, value))
        })
        .collect()
}

/// The signed numeric value of one `Name : value` tracking line.
///
/// chronyc qualifies some quantities with a direction word instead of a
/// sign: "0.024 seconds slow of NTP time", "6.772 ppm fast". Slow means
/// behind, which is reported negative.
fn line_value(line: &str) -> Option<f64> {
    let rest = line.splitn(2, ':').nth(1)?;
    let value = rest
        .split_whitespace()
        .find_map(|token| token.parse::<f64>().ok())?;
    if rest.contains(" slow") {
        Some(-value)
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod unit {
    use super::*;

    const TRACKING: &str = "\
Reference ID    : C0A80101 (ntp1.example.net)
Stratum         : 2
Ref time (UTC)  : Mon Aug 03 14:17:32 2026
System time     : 0.000019947 seconds slow of NTP time
Last offset     : -0.000005614 seconds
RMS offset      : 0.000015164 seconds
Frequency       : 6.772 ppm slow
Residual freq   : -0.001 ppm
Skew            : 0.023 ppm
Root delay      : 0.032778997 seconds
Root dispersion : 0.001305162 seconds
Update interval : 1027.4 seconds
Leap status     : Normal
";

    fn value_of(name: &str) -> f64 {
        tracking_values(TRACKING_FIELDS, TRACKING)
            .into_iter()
            .find(|(field, _)| field.name == name)
            .map(|(_, value)| value)
            .unwrap()
    }

    #[test]
    fn every_field_parses_from_a_full_report() {
        let values = tracking_values(TRACKING_FIELDS, TRACKING);
        assert_eq!(values.len(), TRACKING_FIELDS.len());
    }

    #[test]
    fn fields_come_out_in_table_order() {
        let names = tracking_values(TRACKING_FIELDS, TRACKING)
            .iter()
            .map(|(field, _)| field.name)
            .collect::<Vec<_>>();
        let expected = TRACKING_FIELDS
            .iter()
            .map(|field| field.name)
            .collect::<Vec<_>>();
        assert_eq!(names, expected);
    }

    #[test]
    fn slow_quantities_are_negative() {
        assert_eq!(value_of("systime"), -0.000019947);
        assert_eq!(value_of("frequency"), -6.772);
    }

    #[test]
    fn signed_and_unsigned_quantities_keep_their_sign() {
        assert_eq!(value_of("stratum"), 2.0);
        assert_eq!(value_of("lastoffset"), -0.000005614);
        assert_eq!(value_of("skew"), 0.023);
        assert_eq!(value_of("updateinterval"), 1027.4);
    }

    #[test]
    fn missing_lines_produce_no_value() {
        let report = "Stratum         : 3\nLeap status     : Normal\n";
        let values = tracking_values(TRACKING_FIELDS, report);
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].0.name, "stratum");
    }

    #[test]
    fn non_numeric_lines_produce_no_value() {
        let report = "Stratum         : unknown\n";
        assert!(tracking_values(TRACKING_FIELDS, report).is_empty());
    }

    #[test]
    fn error_display_names_the_reason() {
        assert_eq!(
            format!("{}", TrackingError::NoOutput),
            "no tracking data from chronyc"
        );
    }
}
