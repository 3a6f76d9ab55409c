//! Catalog subcommands for populating a filesystem catalog.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Subcommand};

use reposift_core::repo::RepositoryRecord;
use reposift_core::types::{GroupId, OrgId, RepoId, Username};
use reposift_file::{FileStore, StoredRepo};

use crate::output;
use crate::source::default_catalog_dir;

#[derive(Args, Debug)]
pub struct CatalogCommand {
    /// Catalog directory (defaults to the platform data directory)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CatalogSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum CatalogSubcommand {
    /// Create a repository
    AddRepo(AddRepoArgs),

    /// Share a repository with a user
    Share(ShareArgs),

    /// Create a group
    CreateGroup(CreateGroupArgs),

    /// Add a user to a group
    AddMember(AddMemberArgs),

    /// Share a repository with a group
    ShareGroup(ShareGroupArgs),

    /// Publish a repository to its organization
    Publish(PublishArgs),
}

#[derive(Args, Debug)]
pub struct AddRepoArgs {
    /// Repository name
    pub name: String,

    /// Owning account
    #[arg(long)]
    pub owner: String,

    /// Owning organization
    #[arg(long)]
    pub org: Option<i64>,

    /// Repository id (generated when omitted)
    #[arg(long)]
    pub id: Option<String>,

    /// Last modification time, seconds since the epoch
    #[arg(long)]
    pub mtime: Option<i64>,

    /// Size in bytes
    #[arg(long, default_value_t = 0)]
    pub size: u64,

    /// Mark the repository as encrypted
    #[arg(long)]
    pub encrypted: bool,

    /// Mark the repository as a virtual sub-view
    #[arg(long = "virtual")]
    pub is_virtual: bool,
}

#[derive(Args, Debug)]
pub struct ShareArgs {
    /// Repository id
    pub repo: String,

    /// Account receiving the share
    #[arg(long)]
    pub user: String,
}

#[derive(Args, Debug)]
pub struct CreateGroupArgs {
    /// Group name
    pub name: String,

    /// Initial members
    #[arg(long = "member")]
    pub members: Vec<String>,
}

#[derive(Args, Debug)]
pub struct AddMemberArgs {
    /// Group id
    pub group: i64,

    /// Account to add
    #[arg(long)]
    pub user: String,
}

#[derive(Args, Debug)]
pub struct ShareGroupArgs {
    /// Repository id
    pub repo: String,

    /// Group id
    #[arg(long)]
    pub group: i64,
}

#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Repository id
    pub repo: String,

    /// Withdraw a previous publication
    #[arg(long)]
    pub revoke: bool,
}

pub async fn handle(cmd: CatalogCommand) -> Result<()> {
    let root = match cmd.root {
        Some(root) => root,
        None => default_catalog_dir()?,
    };
    let store = FileStore::new(&root);

    match cmd.command {
        CatalogSubcommand::AddRepo(args) => add_repo(&store, args),
        CatalogSubcommand::Share(args) => {
            let repo = RepoId::new(args.repo).context("Invalid repository id")?;
            let user = Username::new(args.user).context("Invalid user")?;
            store
                .share_with_user(&repo, &user)
                .context("Failed to share repository")?;
            output::success(&format!("Shared {} with {}", repo, user));
            Ok(())
        }
        CatalogSubcommand::CreateGroup(args) => {
            let members = args
                .members
                .into_iter()
                .map(Username::new)
                .collect::<reposift_core::Result<Vec<_>>>()
                .context("Invalid member")?;
            let id = store
                .create_group(&args.name, &members)
                .context("Failed to create group")?;
            output::field("Group", &id.to_string());
            output::success("Group created");
            Ok(())
        }
        CatalogSubcommand::AddMember(args) => {
            let group = GroupId::new(args.group).context("Invalid group id")?;
            let user = Username::new(args.user).context("Invalid user")?;
            store
                .add_group_member(group, &user)
                .context("Failed to add member")?;
            output::success(&format!("Added {} to group {}", user, group));
            Ok(())
        }
        CatalogSubcommand::ShareGroup(args) => {
            let repo = RepoId::new(args.repo).context("Invalid repository id")?;
            let group = GroupId::new(args.group).context("Invalid group id")?;
            store
                .share_with_group(&repo, group)
                .context("Failed to share repository")?;
            output::success(&format!("Shared {} with group {}", repo, group));
            Ok(())
        }
        CatalogSubcommand::Publish(args) => {
            let repo = RepoId::new(args.repo).context("Invalid repository id")?;
            store
                .set_public(&repo, !args.revoke)
                .context("Failed to update repository")?;
            let verb = if args.revoke { "Unpublished" } else { "Published" };
            output::success(&format!("{} {}", verb, repo));
            Ok(())
        }
    }
}

fn add_repo(store: &FileStore, args: AddRepoArgs) -> Result<()> {
    let owner = Username::new(args.owner).context("Invalid owner")?;
    let org_id = args
        .org
        .map(OrgId::new)
        .transpose()
        .context("Invalid organization id")?;
    let id = match args.id {
        Some(id) => RepoId::new(id).context("Invalid repository id")?,
        None => FileStore::generate_repo_id().context("Failed to generate repository id")?,
    };

    let mut record = RepositoryRecord::new(id, args.name);
    record.last_modified = args.mtime.unwrap_or_else(|| Utc::now().timestamp());
    record.size = args.size;
    record.encrypted = args.encrypted;
    record.is_virtual = args.is_virtual;
    record.version = 1;

    let repo = StoredRepo {
        record,
        owner,
        org_id,
        public: false,
    };
    store.add_repo(&repo).context("Failed to store repository")?;

    output::field("Id", repo.record.id.as_str());
    output::field("Name", &repo.record.name);
    output::field("Owner", repo.owner.as_str());
    output::success("Repository created");
    Ok(())
}
