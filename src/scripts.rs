//! Documentation about the plugins contained herein
//!
//! - [munin-raid](#munin-raid)
//! - [munin-chrony](#munin-chrony)
//!
//! Both speak the munin plugin protocol: symlink them into the munin
//! plugins directory and munin-node will call them with `autoconf`,
//! `config`, and no argument for values. Setting `MUNIN_CAP_DIRTYCONFIG=1`
//! (or passing `--dirty-config`) merges the value lines into the config
//! response.
//!
//! # munin-raid
//!
//! Linux-only. Aggregates storage redundancy health from cciss and mpt
//! hardware controllers, `/proc/mdstat` software arrays, and btrfs scrub
//! status; every tool and pseudo-file path can be overridden with a flag.
//!
//! ```plain
//! $ munin-raid autoconf
//! yes
//! $ munin-raid config
//! graph_title RAID and filesystem redundancy
//! graph_args --base 1000 --lower-limit 0 --upper-limit 1
//! graph_vlabel healthy (1) or degraded (0)
//! graph_category disk
//! md0.label Software RAID device md0
//! md0.warning 1:
//! _data.label BTRFS in /data
//! _data.warning 1:
//! $ munin-raid
//! md0.value 1
//! _data.value 1
//! ```
//!
//! # munin-chrony
//!
//! Works anywhere a `chronyc` binary can answer `tracking`. Fields the
//! daemon does not report come out as the protocol's unknown value.
//!
//! ```plain
//! $ munin-chrony config
//! graph_title Chrony tracking
//! graph_args --base 1000
//! graph_vlabel seconds / ppm
//! graph_category time
//! stratum.label Stratum
//! stratum.info Stratum (hops to the reference clock)
//! systime.label System time offset
//! systime.info System time offset (seconds)
//! ...
//! $ munin-chrony
//! stratum.value 2
//! systime.value -0.000019947
//! lastoffset.value -0.000005614
//! rmsoffset.value 0.000015164
//! frequency.value -6.772
//! residualfreq.value -0.001
//! skew.value 0.023
//! rootdelay.value 0.032778997
//! rootdispersion.value 0.001305162
//! updateinterval.value 1027.4
//! ```
