//! CLI argument definitions.

use clap::{Parser, Subcommand};

use crate::commands::catalog::CatalogCommand;
use crate::commands::search::SearchArgs;
use crate::commands::serve::ServeArgs;

/// Search the repositories visible to a user.
#[derive(Parser, Debug)]
#[command(name = "reposift")]
#[command(author, version = env!("REPOSIFT_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search repositories by name
    Search(SearchArgs),

    /// Serve the search over HTTP
    Serve(ServeArgs),

    /// Populate a filesystem catalog
    Catalog(CatalogCommand),
}
