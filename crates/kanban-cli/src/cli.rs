use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "kanban")]
#[command(about = "A kanban board kept in sync with a ClickUp list", long_about = None)]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_COMMIT_HASH"), ")"))]
pub struct Cli {
    /// Path to the local board snapshot (or set KANBAN_FILE env var)
    #[arg(long, short, value_name = "FILE", env = "KANBAN_FILE", default_value = "kanban.json")]
    pub file: String,

    /// Path to the config file; defaults to the platform config directory
    #[arg(long, value_name = "PATH", env = "KANBAN_CONFIG")]
    pub config: Option<String>,

    /// API token, overriding the config file
    #[arg(long, env = "CLICKUP_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Remote list id, overriding the config file
    #[arg(long, env = "CLICKUP_LIST_ID")]
    pub list_id: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show or change settings
    Config(ConfigCommand),
    /// Board operations
    Board(BoardCommand),
    /// Column operations
    Column(ColumnCommand),
    /// Card operations
    Card(CardCommand),
    /// Card comments
    Comment(CommentCommand),
    /// Card checklists
    Checklist(ChecklistCommand),
    /// Label catalog and assignments
    Label(LabelCommand),
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// Config commands
#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective settings with the token masked
    Show,
    /// Persist settings to the config file
    Set(ConfigSetArgs),
}

#[derive(Args)]
pub struct ConfigSetArgs {
    #[arg(long)]
    pub api_token: Option<String>,
    #[arg(long)]
    pub list_id: Option<String>,
    #[arg(long)]
    pub team_id: Option<String>,
    #[arg(long)]
    pub space_id: Option<String>,
    #[arg(long)]
    pub base_url: Option<String>,
    /// Quiet period before queued checklist items are sent, in milliseconds
    #[arg(long)]
    pub quiet_period_ms: Option<u64>,
    /// What to do with a local change when the remote call fails
    #[arg(long, value_parser = ["rollback", "mark_dirty"])]
    pub rollback: Option<String>,
}

// Board commands
#[derive(Args)]
pub struct BoardCommand {
    #[command(subcommand)]
    pub action: BoardAction,
}

#[derive(Subcommand)]
pub enum BoardAction {
    /// Print the local board
    Show,
    /// Replace the board with the remote list's statuses and tasks
    Pull,
}

// Column commands
#[derive(Args)]
pub struct ColumnCommand {
    #[command(subcommand)]
    pub action: ColumnAction,
}

#[derive(Subcommand)]
pub enum ColumnAction {
    /// Add a local column
    Add {
        #[arg(long)]
        title: String,
    },
    /// Remove a column and its cards
    Remove {
        #[arg(long)]
        id: String,
    },
}

// Card commands
#[derive(Args)]
pub struct CardCommand {
    #[command(subcommand)]
    pub action: CardAction,
}

#[derive(Subcommand)]
pub enum CardAction {
    /// Create a card and its remote task
    Create {
        #[arg(long)]
        column: String,
        #[arg(long)]
        title: String,
    },
    /// Move a card to another column
    Move {
        #[arg(long)]
        id: String,
        #[arg(long)]
        to: String,
    },
    /// Edit a card's title, description or due date
    Edit(CardEditArgs),
    /// Delete a card and its remote task
    Delete {
        #[arg(long)]
        id: String,
    },
    /// Show a card with its comments
    Show {
        #[arg(long)]
        id: String,
    },
}

#[derive(Args)]
pub struct CardEditArgs {
    #[arg(long)]
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long, conflicts_with = "clear_description")]
    pub description: Option<String>,
    #[arg(long)]
    pub clear_description: bool,
    /// Due date (YYYY-MM-DD)
    #[arg(long, conflicts_with = "clear_due_date")]
    pub due_date: Option<String>,
    #[arg(long)]
    pub clear_due_date: bool,
}

// Comment commands
#[derive(Args)]
pub struct CommentCommand {
    #[command(subcommand)]
    pub action: CommentAction,
}

#[derive(Subcommand)]
pub enum CommentAction {
    /// Fetch a card's comments, newest first
    List {
        #[arg(long)]
        card: String,
    },
    /// Post a comment on a card
    Add {
        #[arg(long)]
        card: String,
        #[arg(long)]
        text: String,
    },
}

// Checklist commands
#[derive(Args)]
pub struct ChecklistCommand {
    #[command(subcommand)]
    pub action: ChecklistAction,
}

#[derive(Subcommand)]
pub enum ChecklistAction {
    /// Create a checklist on a card
    Create {
        #[arg(long)]
        card: String,
        #[arg(long)]
        title: String,
    },
    /// Delete a checklist
    Delete {
        #[arg(long)]
        card: String,
        #[arg(long)]
        id: String,
    },
    /// Queue items and send them as one batch
    AddItems {
        #[arg(long)]
        card: String,
        #[arg(long)]
        checklist: String,
        #[arg(required = true)]
        items: Vec<String>,
    },
    /// Flip an item's completion
    Toggle(ChecklistItemArgs),
    /// Change an item's text
    Rename {
        #[command(flatten)]
        item: ChecklistItemArgs,
        #[arg(long)]
        text: String,
    },
    /// Delete an item
    DeleteItem(ChecklistItemArgs),
}

#[derive(Args)]
pub struct ChecklistItemArgs {
    #[arg(long)]
    pub card: String,
    #[arg(long)]
    pub checklist: String,
    #[arg(long)]
    pub item: String,
}

// Label commands
#[derive(Args)]
pub struct LabelCommand {
    #[command(subcommand)]
    pub action: LabelAction,
}

#[derive(Subcommand)]
pub enum LabelAction {
    /// List the label catalog
    List,
    /// Add a label to the catalog
    Create {
        #[arg(long)]
        name: String,
        /// Hex color such as #4fc3f7; picked from the palette when omitted
        #[arg(long)]
        color: Option<String>,
    },
    /// Remove a label from the catalog and every card
    Delete {
        #[arg(long)]
        id: Uuid,
    },
    /// Assign or unassign a label on a card
    Toggle {
        #[arg(long)]
        card: String,
        #[arg(long)]
        id: Uuid,
    },
}
