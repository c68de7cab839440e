use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "todolist", version, about = "To-do list with deadlines")]
pub struct Cli {
    /// Items file to use instead of the project/global one
    #[arg(long, global = true)]
    pub file: Option<PathBuf>,
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a project items file in the current directory
    Init,
    /// List items sorted by deadline
    List {
        /// Only items due today
        #[arg(long)]
        today: bool,
    },
    /// Add a new item
    Add {
        /// Short description
        #[arg(required_unless_present = "from", conflicts_with = "from")]
        short_description: Option<String>,
        /// Free-text details
        #[arg(long, default_value = "")]
        details: String,
        /// Deadline in YYYY-MM-DD format (defaults to today)
        #[arg(long)]
        deadline: Option<String>,
        /// Read the item from a YAML file instead
        #[arg(long)]
        from: Option<PathBuf>,
    },
    /// Delete an item by its row number in `list`
    Delete {
        /// 1-based row number
        row: usize,
        /// Count rows in the today-only list
        #[arg(long)]
        today: bool,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Launch the interactive TUI
    Tui,
}
