use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "purger")]
#[command(about = "Retention and cleanup for analysis snapshot history", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Purge a project tree: drop aborted builds, trim history, disable orphans
    Purge {
        /// Id of the top-level project
        #[arg(long)]
        root: i64,
        /// Scope whose history is not kept (repeatable); overrides the configured list
        #[arg(long = "scope", value_name = "SCOPE")]
        scopes: Vec<String>,
    },
    /// List the snapshots of a resource that history trimming may consider
    Purgeable {
        resource_id: i64,
    },
    /// Permanently delete a project, its sub-projects and all of their resources
    DeleteTree {
        root_id: i64,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Delete every snapshot matching the given constraints
    DeleteSnapshots {
        #[arg(long)]
        id: Option<i64>,
        #[arg(long)]
        resource_id: Option<i64>,
        #[arg(long)]
        root_project_id: Option<i64>,
        #[arg(long)]
        root_snapshot_id: Option<i64>,
        #[arg(long)]
        islast: Option<bool>,
        #[arg(long = "status", value_name = "STATUS")]
        statuses: Vec<String>,
        #[arg(long = "scope", value_name = "SCOPE")]
        scopes: Vec<String>,
        /// Only match snapshots that were never purged
        #[arg(long)]
        not_purged: bool,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Print configuration values
    PrintConfig,
}
