//! Search command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tracing::info;

use reposift_core::types::{OrgId, Scope, Username};
use reposift_core::{SearchRequest, search};

use crate::output;
use crate::source::SourceArgs;

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Keyword matched against repository names (case-insensitive)
    pub query: String,

    /// Account whose visible repositories are searched
    #[arg(long)]
    pub user: String,

    /// Organization id of the account
    #[arg(long)]
    pub org: Option<i64>,

    /// Include repositories published to the whole organization
    #[arg(long)]
    pub can_view_org: bool,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

pub async fn run(args: SearchArgs) -> Result<()> {
    let viewer = Username::new(&args.user).context("Invalid user")?;
    let org = args
        .org
        .map(OrgId::new)
        .transpose()
        .context("Invalid organization id")?;

    let config = args.source.search_config()?;
    let source = args.source.open()?;
    info!(source = %source.describe(), "Searching");

    let request = SearchRequest {
        viewer: &viewer,
        scope: Scope::from_org(org),
        can_view_org: args.can_view_org,
        query: &args.query,
    };

    let response = search(&source, &request, &config)
        .await
        .context("Search failed")?;

    if response.repos.is_empty() {
        eprintln!("{}", "No matching repositories.".dimmed());
    }

    if args.pretty {
        output::json_pretty(&response)
    } else {
        output::json(&response)
    }
}
