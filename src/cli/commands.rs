use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sb", about = concat!("stickyboard v", env!("CARGO_PKG_VERSION"), " - your roadmap, read from the doc"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file (default: stickyboard.toml here or in a parent directory)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// View to load (default: the view marked default, else the first)
    #[arg(long, global = true)]
    pub view: Option<String>,

    /// Read blocks from a JSON dump instead of the remote API
    #[arg(long, global = true)]
    pub fixture: Option<PathBuf>,

    /// More logging on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a starter stickyboard.toml in the current directory
    Init(InitArgs),
    /// List deliverables, grouped by lane
    Board(BoardArgs),
    /// List milestones
    Milestones,
    /// Show one deliverable in full
    Show(ShowArgs),
    /// Show health counts per lane
    Stats(FilterArgs),
    /// List the view's lanes
    Lanes,
    /// Set a deliverable's owner (written back to its owner line)
    Owner(OwnerArgs),
    /// Set a deliverable's delivery date (written back to its date line)
    Date(DateArgs),
    /// Move a deliverable to another quarter and/or lane
    Move(MoveArgs),
}

// ---------------------------------------------------------------------------
// Init args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing stickyboard.toml
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args, Default)]
pub struct FilterArgs {
    /// Only this lane id
    #[arg(long)]
    pub lane: Option<String>,
    /// Filter by status (on-track, at-risk, blocked, done)
    #[arg(long)]
    pub status: Option<String>,
    /// Only cards with this owner
    #[arg(long)]
    pub owner: Option<String>,
    /// Only lanes in this group
    #[arg(long)]
    pub group: Option<String>,
    /// Match title or owner text
    #[arg(long, short = 's')]
    pub search: Option<String>,
}

#[derive(Args)]
pub struct BoardArgs {
    #[command(flatten)]
    pub filter: FilterArgs,
    /// Order cards by delivery date instead of document order
    #[arg(long)]
    pub by_date: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Deliverable id (block id)
    pub id: String,
}

// ---------------------------------------------------------------------------
// Edit command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct OwnerArgs {
    /// Deliverable id
    pub id: String,
    /// New owner name
    pub name: String,
}

#[derive(Args)]
pub struct DateArgs {
    /// Deliverable id
    pub id: String,
    /// New date (YYYY-MM-DD, "March 30, 2026", or "tbd" to clear)
    pub date: String,
}

#[derive(Args)]
pub struct MoveArgs {
    /// Deliverable id
    pub id: String,
    /// Destination quarter id (e.g. 2026-Q2)
    #[arg(long, short = 'q')]
    pub quarter: String,
    /// Destination lane id
    #[arg(long, short = 'l')]
    pub lane: Option<String>,
    /// Date to write (default: the card's current date when it falls in the
    /// destination quarter, else mid-quarter). `tbd` is rejected.
    #[arg(long)]
    pub date: Option<String>,
}
