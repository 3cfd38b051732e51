use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Task board backed by a shared spreadsheet", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List tasks with optional search, filters and sorting
    ///
    /// Example: taskdeck list --platform Instagram --sort dueDate --order desc
    List {
        /// Free-text search over every task field
        #[arg(long)]
        search: Option<String>,
        /// Keep tasks whose platform tags contain this value
        #[arg(long)]
        platform: Option<String>,
        /// Keep tasks whose format tags contain this value
        #[arg(long)]
        format: Option<String>,
        /// Keep tasks whose assignee tags contain this value
        #[arg(long = "assigned-to")]
        assigned_to: Option<String>,
        /// Keep tasks whose progress label equals this value exactly
        #[arg(long)]
        progress: Option<String>,
        /// Sort key: no, task, dueDate, inProgress, platform
        #[arg(long)]
        sort: Option<String>,
        /// Sort order: asc or desc
        #[arg(long)]
        order: Option<String>,
        /// Skip the cache and fetch a fresh list
        #[arg(long)]
        refresh: bool,
    },
    /// Show one task in full
    ///
    /// Example: taskdeck show 7
    Show {
        no: u32,
    },
    /// Add a task
    ///
    /// Example: taskdeck add "Publish recap" --assigned-to "Social Media" --due 2026-08-20 --progress "In Progress"
    Add {
        task: Option<String>,
        #[arg(long, default_value = "")]
        platform: String,
        #[arg(long, default_value = "")]
        format: String,
        #[arg(long = "assigned-to", default_value = "")]
        assigned_to: String,
        /// Due date (YYYY-MM-DD)
        #[arg(long, default_value = "")]
        due: String,
        /// Progress label, e.g. "In Progress" or "Done"
        #[arg(long, default_value = "")]
        progress: String,
        #[arg(long, default_value = "")]
        reference: String,
        #[arg(long, default_value = "")]
        result: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Edit a task; omitted flags keep the stored values
    ///
    /// Example: taskdeck edit 7 --progress Done
    Edit {
        no: u32,
        #[arg(long)]
        task: Option<String>,
        #[arg(long)]
        platform: Option<String>,
        #[arg(long)]
        format: Option<String>,
        #[arg(long = "assigned-to")]
        assigned_to: Option<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        progress: Option<String>,
        #[arg(long)]
        reference: Option<String>,
        #[arg(long)]
        result: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a task
    ///
    /// Example: taskdeck delete 7
    Delete {
        no: u32,
    },
    /// Show deadline statistics for the whole board
    ///
    /// Example: taskdeck stats
    Stats {
        /// Skip the cache and fetch a fresh list
        #[arg(long)]
        refresh: bool,
    },
}
