//! CLI surface for the lineup daemon.
//!
//! Thin handlers: each subcommand maps onto one daemon op; `serve` runs the
//! daemon in the foreground; `replay` pushes a cached client mirror and
//! prints the resulting initial view.

use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::client::{self, CachedState, InitialView};
use crate::config;
use crate::core::{Item, ItemId};
use crate::daemon::ipc::{IpcError, Request, Response, ResponsePayload, send_request_to, socket_path};
use crate::daemon::run::{RunOptions, run};
use crate::{Error, Result};

// =============================================================================
// Entry + global options
// =============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "lineup",
    version,
    about = "Persistent reorderable list service",
    infer_subcommands = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Machine-readable JSON output.
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,

    /// Daemon socket path (default: XDG runtime location).
    #[arg(long, global = true, value_name = "PATH")]
    pub socket: Option<PathBuf>,

    /// Debug output (repeat for more).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the daemon in the foreground.
    Serve,

    /// Fetch one page of the list.
    #[command(alias = "ls")]
    Items(ItemsArgs),

    /// Fetch all selected items, in effective order.
    Selected,

    /// Count items matching a search.
    Count(CountArgs),

    /// Toggle one item's selection.
    Toggle { id: u64 },

    /// Submit a complete new order.
    Reorder { ids: Vec<u64> },

    /// Reset to natural id order.
    ResetOrder,

    /// Replace the selection wholesale.
    SetSelection { ids: Vec<u64> },

    /// Show the current custom order.
    Order,

    /// Replay a cached client mirror (order + selection), then print the
    /// initial view.
    Replay(ReplayArgs),

    /// Health check.
    Ping,

    /// Stop the daemon (flushes persisted state).
    Shutdown,
}

#[derive(Args, Debug)]
pub struct ItemsArgs {
    #[arg(long, default_value_t = 0)]
    pub page: u32,

    #[arg(long, default_value_t = 20)]
    pub size: u32,

    /// Case-insensitive substring filter on display text.
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Args, Debug)]
pub struct CountArgs {
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// JSON file holding the cached state: {"order": [...], "selected": [...]}.
    pub cache: PathBuf,

    /// Page size for the bootstrapped view.
    #[arg(long, default_value_t = 20)]
    pub size: u32,
}

pub fn parse_from<I, T>(args: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::parse_from(args)
}

// =============================================================================
// Dispatch
// =============================================================================

pub fn run_command(cli: Cli) -> Result<()> {
    let socket = cli.socket.clone().unwrap_or_else(socket_path);
    let json = cli.json;

    let request = match cli.command {
        Commands::Serve => {
            return run(RunOptions {
                config: config::load(),
                socket: cli.socket,
            });
        }
        Commands::Replay(args) => return replay_command(&socket, args, json),
        Commands::Items(args) => Request::Items {
            page: args.page,
            size: args.size,
            search: args.search,
        },
        Commands::Selected => Request::Selected,
        Commands::Count(args) => Request::Count {
            search: args.search,
        },
        Commands::Toggle { id } => Request::Toggle {
            id: ItemId::new(id),
        },
        Commands::Reorder { ids } => Request::Reorder {
            order: ids.into_iter().map(ItemId::new).collect(),
        },
        Commands::ResetOrder => Request::ResetOrder,
        Commands::SetSelection { ids } => Request::SetSelection {
            ids: ids.into_iter().map(ItemId::new).collect(),
        },
        Commands::Order => Request::Order,
        Commands::Ping => Request::Ping,
        Commands::Shutdown => Request::Shutdown,
    };

    let response = send_request_to(&socket, &request).map_err(Error::Ipc)?;
    render(response, json)
}

fn replay_command(socket: &std::path::Path, args: ReplayArgs, json: bool) -> Result<()> {
    let contents = fs::read_to_string(&args.cache)
        .map_err(|e| Error::Ipc(IpcError::Io(e)))?;
    let cached: CachedState =
        serde_json::from_str(&contents).map_err(|e| Error::Ipc(IpcError::Parse(e)))?;

    let summary = client::replay(socket, &cached);
    if !json {
        println!(
            "replayed: order_restored={} selection_applied={:?}",
            summary.order_restored, summary.selection_applied
        );
    }

    match client::initial_view(socket, args.size).map_err(Error::Ipc)? {
        InitialView::Selected(items) => {
            if json {
                print_json(&items)?;
            } else {
                println!("bootstrapped from selection ({} items)", items.len());
                print_items(&items);
            }
        }
        InitialView::Page(page) => {
            if json {
                print_json(&page)?;
            } else {
                println!("total {}, has_more {}", page.total_count, page.has_more);
                print_items(&page.items);
            }
        }
    }
    Ok(())
}

// =============================================================================
// Rendering
// =============================================================================

fn render(response: Response, json: bool) -> Result<()> {
    let payload = match response {
        Response::Ok { ok } => ok,
        Response::Err { err } => {
            return Err(Error::Ipc(IpcError::Remote {
                code: err.code,
                message: err.message,
            }));
        }
    };

    if json {
        return print_json(&payload);
    }

    match payload {
        ResponsePayload::Page(page) => {
            println!("total {}, has_more {}", page.total_count, page.has_more);
            print_items(&page.items);
        }
        ResponsePayload::Items(items) => print_items(&items),
        ResponsePayload::Toggled { id, selected } => {
            println!("item {id} selected={selected}");
        }
        ResponsePayload::Count { total_count } => println!("{total_count}"),
        ResponsePayload::Order { order } => {
            if order.is_empty() {
                println!("(natural order)");
            } else {
                let ids: Vec<String> = order.iter().map(ToString::to_string).collect();
                println!("{}", ids.join(" "));
            }
        }
        ResponsePayload::SelectionReplaced { applied } => {
            println!("selection replaced ({applied} applied)");
        }
        ResponsePayload::Done => println!("ok"),
    }
    Ok(())
}

fn print_items(items: &[Item]) {
    for item in items {
        let marker = if item.selected { "*" } else { " " };
        println!("{marker} {:>8}  {}", item.id, item.display_text);
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string(value).map_err(|e| Error::Ipc(IpcError::Parse(e)))?;
    println!("{text}");
    Ok(())
}
