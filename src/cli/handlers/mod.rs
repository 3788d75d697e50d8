mod init;
pub use init::cmd_init;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::{BlockSource, MemorySource, NotionClient};
use crate::model::board::{Board, Deliverable};
use crate::model::config::{BoardConfig, ViewConfig};
use crate::ops::board_ops;
use crate::ops::filter::{self, BoardFilter, StatusFilter};
use crate::ops::reconcile::{Reconciler, WriteBack, WriteOutcome};
use crate::ops::traverse::load_board;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Options shared by every board command
struct Globals {
    json: bool,
    config: Option<PathBuf>,
    view: Option<String>,
    fixture: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let globals = Globals {
        json: cli.json,
        config: cli.config,
        view: cli.view,
        fixture: cli.fixture,
    };

    match cli.command {
        // Init needs no config and no network
        Commands::Init(args) => cmd_init(args),
        command => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(run(command, globals))
        }
    }
}

async fn run(command: Commands, globals: Globals) -> CmdResult {
    let session = Session::open(&globals)?;
    let json = globals.json;
    match command {
        Commands::Init(args) => cmd_init(args),

        // Read commands
        Commands::Board(args) => cmd_board(&session, args, json).await,
        Commands::Milestones => cmd_milestones(&session, json).await,
        Commands::Show(args) => cmd_show(&session, args, json).await,
        Commands::Stats(args) => cmd_stats(&session, args, json).await,
        Commands::Lanes => cmd_lanes(&session, json).await,

        // Edit commands
        Commands::Owner(args) => cmd_owner(&session, args, json).await,
        Commands::Date(args) => cmd_date(&session, args, json).await,
        Commands::Move(args) => cmd_move(&session, args, json).await,
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Config, selected view and block source for one invocation
struct Session {
    config: BoardConfig,
    view: ViewConfig,
    source: Arc<dyn BlockSource>,
}

impl Session {
    fn open(globals: &Globals) -> Result<Session, Box<dyn std::error::Error>> {
        let path = match &globals.config {
            Some(p) => p.clone(),
            None => config_io::discover_config(&std::env::current_dir()?)?,
        };
        let config = config_io::load_config(&path)?;
        let view = config_io::select_view(&config, globals.view.as_deref())?.clone();
        let source: Arc<dyn BlockSource> = match &globals.fixture {
            Some(dump) => Arc::new(MemorySource::load(dump)?),
            None => Arc::new(NotionClient::from_env(&config.api)?),
        };
        Ok(Session {
            config,
            view,
            source,
        })
    }

    /// Full fetch of the view. Every command starts from a fresh board.
    async fn board(&self) -> Result<Board, Box<dyn std::error::Error>> {
        Ok(load_board(self.source.as_ref(), &self.config, &self.view).await?)
    }

    fn reconciler(&self) -> Reconciler {
        Reconciler::new(Arc::clone(&self.source))
    }
}

fn build_filter(args: FilterArgs) -> Result<BoardFilter, Box<dyn std::error::Error>> {
    let status = args
        .status
        .as_deref()
        .map(str::parse::<StatusFilter>)
        .transpose()
        .map_err(Box::<dyn std::error::Error>::from)?;
    Ok(BoardFilter {
        search: args.search,
        status,
        owner: args.owner,
        group: args.group,
        lane: args.lane,
    })
}

fn find_card<'a>(board: &'a Board, id: &str) -> Result<&'a Deliverable, Box<dyn std::error::Error>> {
    board
        .find(id)
        .ok_or_else(|| board_ops::EditError::NotFound(id.to_string()).into())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

async fn cmd_board(session: &Session, args: BoardArgs, json: bool) -> CmdResult {
    let board = session.board().await?;
    let criteria = build_filter(args.filter)?;
    let mut cards = filter::filter_board(&board, &criteria);
    if args.by_date {
        filter::sort_by_date(&mut cards);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&cards)?);
    } else if cards.is_empty() {
        println!("no deliverables");
    } else {
        for line in format_board(&board, &cards) {
            println!("{}", line);
        }
    }
    Ok(())
}

async fn cmd_milestones(session: &Session, json: bool) -> CmdResult {
    let board = session.board().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&board.milestones)?);
    } else {
        for m in &board.milestones {
            println!("{}", format_milestone_line(m));
        }
    }
    Ok(())
}

async fn cmd_show(session: &Session, args: ShowArgs, json: bool) -> CmdResult {
    let board = session.board().await?;
    let card = find_card(&board, &args.id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(card)?);
    } else {
        for line in format_card_detail(&board, card) {
            println!("{}", line);
        }
    }
    Ok(())
}

async fn cmd_stats(session: &Session, args: FilterArgs, json: bool) -> CmdResult {
    let board = session.board().await?;
    let criteria = build_filter(args)?;
    let cards = filter::filter_board(&board, &criteria);

    let per_lane: Vec<LaneStatsJson> = board
        .lanes
        .iter()
        .map(|lane| LaneStatsJson {
            id: &lane.id,
            title: &lane.title,
            group: &lane.group,
            stats: filter::health(cards.iter().copied().filter(|d| d.lane_id == lane.id)),
        })
        .filter(|entry| entry.stats.total > 0)
        .collect();
    let totals = filter::health(cards.iter().copied());

    if json {
        let output = StatsJson {
            lanes: per_lane,
            totals,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        let name_w = per_lane
            .iter()
            .map(|e| e.title.chars().count())
            .max()
            .unwrap_or(0)
            .max(5); // "Total"
        println!(" {:<name_w$}  {:>4}  {:>5} {:>5} {:>5} {:>5}", "Lane", "all", "●", "◐", "○", "✓");
        for entry in &per_lane {
            println!(" {:<name_w$}  {}", entry.title, format_health(&entry.stats));
        }
        println!(" {:<name_w$}  {}", "Total", format_health(&totals));
        let owners = filter::unique_owners(&board);
        if !owners.is_empty() {
            println!();
            println!("owners: {}", owners.join(", "));
        }
    }
    Ok(())
}

async fn cmd_lanes(session: &Session, json: bool) -> CmdResult {
    let board = session.board().await?;
    let count = |id: &str| board.deliverables.iter().filter(|d| d.lane_id == id).count();

    if json {
        let lanes: Vec<LaneJson> = board
            .lanes
            .iter()
            .map(|lane| LaneJson {
                lane,
                deliverables: count(&lane.id),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&lanes)?);
    } else {
        let mut group = "";
        for lane in &board.lanes {
            if lane.group != group {
                group = lane.group.as_str();
                println!("{}", group);
            }
            println!("{}", format_lane_line(lane, count(&lane.id)));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Edit commands
// ---------------------------------------------------------------------------

/// Wait for the write-back, then print the edited card. A failed write is
/// already logged by the reconciler and does not fail the command.
async fn finish_edit(
    board: &Board,
    id: &str,
    pending: Option<JoinHandle<WriteOutcome>>,
    json: bool,
) -> CmdResult {
    let card = find_card(board, id)?;
    let outcome = match pending {
        Some(handle) => handle.await?,
        None => WriteOutcome::Skipped,
    };
    if json {
        let output = EditJson {
            deliverable: card,
            written_back: outcome.is_applied(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", format_card_line(card));
        match &outcome {
            WriteOutcome::Applied { .. } => {}
            WriteOutcome::Skipped => println!("(local only: no anchor block to write back to)"),
            WriteOutcome::Failed { error } => println!("(local only: write-back failed: {})", error),
        }
    }
    Ok(())
}

fn submit(session: &Session, write: Option<WriteBack>) -> Option<JoinHandle<WriteOutcome>> {
    write.map(|w| session.reconciler().submit(w))
}

async fn cmd_owner(session: &Session, args: OwnerArgs, json: bool) -> CmdResult {
    let mut board = session.board().await?;
    let write = board_ops::set_owner(&mut board, &args.id, &args.name)?;
    let pending = submit(session, write);
    finish_edit(&board, &args.id, pending, json).await
}

async fn cmd_date(session: &Session, args: DateArgs, json: bool) -> CmdResult {
    let mut board = session.board().await?;
    let date = board_ops::parse_date_input(&args.date)?;
    let write = board_ops::set_delivery_date(&mut board, &args.id, date)?;
    let pending = submit(session, write);
    finish_edit(&board, &args.id, pending, json).await
}

async fn cmd_move(session: &Session, args: MoveArgs, json: bool) -> CmdResult {
    let mut board = session.board().await?;
    // a moved card always gets a date, so clearing it is not an option here
    let date = match args.date.as_deref() {
        Some(text) => match board_ops::parse_date_input(text)? {
            Some(date) => Some(date),
            None => return Err(board_ops::EditError::InvalidDate(text.to_string()).into()),
        },
        None => None,
    };
    let write = board_ops::relocate(&mut board, &args.id, &args.quarter, args.lane.as_deref(), date)?;
    let pending = submit(session, write);
    finish_edit(&board, &args.id, pending, json).await
}
