//! CLI subcommands

pub mod device;
pub mod snapshot;
