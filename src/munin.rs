//! The munin plugin protocol.
//!
//! A plugin is a standalone executable that munin-node calls with at most
//! one positional argument, and everything it says back is plain text on
//! stdout: `graph_*` declarations and `<field>.label` lines in config
//! mode, `<field>.value` lines in fetch mode.

/// Which of the three plugin modes an invocation selects.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Mode {
    /// Report whether this plugin can be expected to work on this host
    Autoconf,
    /// Declare the graph and its data series
    Config,
    /// Report current values (munin-node's default invocation)
    Fetch,
}

impl Mode {
    /// Select the mode from the plugin's positional argument.
    ///
    /// Anything that is not `autoconf` or `config` is a fetch, including
    /// no argument at all.
    pub fn from_arg(arg: Option<&str>) -> Mode {
        match arg {
            Some("autoconf") => Mode::Autoconf,
            Some("config") => Mode::Config,
            _ => Mode::Fetch,
        }
    }
}

/// Sanitize an identifier into a munin field name.
///
/// Field names prefix every `.label` and `.value` line, so they may only
/// contain ascii alphanumerics and underscores. The root filesystem gets
/// the conventional name "root" instead of a lone underscore.
pub fn field_name(identifier: &str) -> String {
    if identifier == "/" {
        return "root".to_string();
    }
    identifier
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// The fixed graph metadata a plugin declares in config mode.
///
/// Each binary owns one of these and hands it to its reporting functions,
/// so the graph shape lives next to `main` instead of being assembled from
/// ambient state.
#[derive(Debug, Clone, Copy)]
pub struct Graph {
    pub title: &'static str,
    /// rrdtool arguments, in practice the base and the axis bounds
    pub args: &'static str,
    pub vlabel: &'static str,
    pub category: &'static str,
}

impl Graph {
    /// The `graph_*` declaration lines for config mode.
    pub fn config_lines(&self) -> Vec<String> {
        vec![
            format!("graph_title {}", self.title),
            format!("graph_args {}", self.args),
            format!("graph_vlabel {}", self.vlabel),
            format!("graph_category {}", self.category),
        ]
    }
}

#[cfg(test)]
mod unit {
    use super::*;

    #[test]
    fn mode_from_arg() {
        assert_eq!(Mode::from_arg(Some("autoconf")), Mode::Autoconf);
        assert_eq!(Mode::from_arg(Some("config")), Mode::Config);
        assert_eq!(Mode::from_arg(None), Mode::Fetch);
        assert_eq!(Mode::from_arg(Some("fetch")), Mode::Fetch);
        assert_eq!(Mode::from_arg(Some("anything-else")), Mode::Fetch);
    }

    #[test]
    fn field_names_are_sanitized() {
        assert_eq!(field_name("md0"), "md0");
        assert_eq!(field_name("/dev/sg0"), "_dev_sg0");
        assert_eq!(field_name("MPT"), "mpt");
        assert_eq!(field_name("/data/vol-1"), "_data_vol_1");
    }

    #[test]
    fn root_filesystem_gets_a_name() {
        assert_eq!(field_name("/"), "root");
    }

    #[test]
    fn graph_declaration_order() {
        let graph = Graph {
            title: "Some graph",
            args: "--base 1000",
            vlabel: "things",
            category: "disk",
        };
        assert_eq!(
            graph.config_lines(),
            vec![
                "graph_title Some graph",
                "graph_args --base 1000",
                "graph_vlabel things",
                "graph_category disk",
            ]
        );
    }
}
