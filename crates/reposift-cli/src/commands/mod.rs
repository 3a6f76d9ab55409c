//! Subcommand implementations.

pub mod catalog;
pub mod search;
pub mod serve;
