use clap::{Parser, Subcommand};
use std::path::PathBuf;

use content_workflow::{ContentType, Role, ValidationStatus};

pub mod commands;

#[derive(Parser)]
#[command(name = "content-workflow")]
#[command(about = "Validation workflow for association posts and events")]
#[command(long_about = "Moves posts and events through draft, editor review, admin review and publication, \
                       keeping an audit trail of every step. Start with 'content-workflow init', add users \
                       with 'content-workflow user add', then create drafts with 'content-workflow item add'.")]
pub struct Cli {
    /// Configuration file (defaults to content-workflow.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the configured store path or database URL
    #[arg(long, global = true)]
    pub store: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default configuration file and create an empty store
    Init {
        /// Overwrite existing configuration and store
        #[arg(long, help = "Overwrite existing configuration and store")]
        force: bool,
    },
    /// Manage back-office users and their roles
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Create and inspect posts and events
    Item {
        #[command(subcommand)]
        command: ItemCommands,
    },
    /// Move an item to another validation status
    Transition {
        /// Content id
        id: String,
        /// Target status: draft, pending_editor, pending_admin, published, rejected
        to: ValidationStatus,
        /// User performing the transition
        #[arg(long = "as", help = "User id performing the transition")]
        actor: String,
        /// Review notes or rejection reason
        #[arg(long, help = "Review notes (to pending_admin) or rejection reason (to rejected)")]
        notes: Option<String>,
    },
    /// List items waiting for a role, oldest submission first
    Queue {
        #[arg(long, help = "Reviewer role: editor or admin")]
        role: Role,
    },
    /// Show the audit trail of an item
    History {
        id: String,
    },
    /// Replay the audit trail of an item and check it against its status
    Verify {
        id: String,
    },
    /// Count items per validation status
    Stats,
    /// Show the back-office permission matrix
    Permissions {
        #[arg(long, help = "Only show grants for this role")]
        role: Option<Role>,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create or replace a user; the first --role is the primary one
    Add {
        id: String,
        #[arg(long = "role", required = true, help = "Role assignment (repeatable, first is primary)")]
        roles: Vec<Role>,
        #[arg(long, help = "Display name shown in review queues")]
        name: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ItemCommands {
    /// Create a draft post or event
    Add {
        #[arg(long = "type", help = "post or event")]
        content_type: ContentType,
        #[arg(long)]
        title: String,
        #[arg(long = "as", help = "Author user id")]
        actor: String,
    },
    /// Show an item and the moves its status allows
    Show {
        id: String,
        #[arg(long = "as", help = "List the moves available to this user")]
        actor: Option<String>,
    },
}
