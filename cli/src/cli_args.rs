use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

/// Inspect and evaluate team role permissions.
#[derive(Debug, Clone, Parser)]
#[command(name = "taskr-perms", version)]
pub struct TaskrCli {
    /// Permission table to use instead of the built-in one.
    #[arg(long, global = true, env = "TASKR_PERMISSION_TABLE", value_name = "FILE")]
    pub table: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` wins when set.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the role x permission grid.
    Matrix {
        /// Emit the table as JSON instead of a grid.
        #[arg(long)]
        json: bool,
    },
    /// Check whether a role holds a permission.
    Check { role: String, permission: String },
    /// Check whether one role may manage another.
    CanManage { manager: String, target: String },
    /// Check whether a role change is allowed.
    CanChangeRole {
        current: String,
        new_role: String,
        changer: String,
    },
    /// Print the advisory capability snapshot for a role as JSON.
    Snapshot { role: String },
    /// Load and validate a permission table file.
    Validate { file: PathBuf },
}

impl TaskrCli {
    /// Default tracing filter derived from `-v` flags.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    }
}
