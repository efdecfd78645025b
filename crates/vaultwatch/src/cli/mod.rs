//! CLI subcommand implementations for the vaultwatch binary.

pub mod output;
pub mod parse_cmd;
pub mod scan_cmd;
