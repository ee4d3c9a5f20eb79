//! Munin plugins, in Rust.
//!
//! Each binary under `src/bin` implements the munin plugin protocol: it is
//! called with a single positional argument, where `autoconf` asks whether
//! the plugin can be expected to work on this host, `config` asks for the
//! graph declaration, and anything else (including no argument, which is
//! how munin-node normally calls it) asks for current values. Everything a
//! plugin has to say goes to stdout as plain text.
//!
//! The library holds the protocol helpers and the parsers for the system
//! facilities the plugins report on. See the `scripts` module for a
//! description of each plugin.

pub mod chrony;
pub mod munin;
pub mod raid;
pub mod scripts;
