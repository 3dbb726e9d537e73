//! Terminal front end for Mossvale.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "mossvale",
    about = "Mossvale, a turn-based text adventure",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(flatten)]
    game: GameOpts,

    /// Log more (repeat for debug and trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every subcommand that opens a session.
#[derive(Args, Clone)]
struct GameOpts {
    /// Directory holding save slots
    #[arg(long, global = true, default_value = "saves")]
    save_dir: PathBuf,

    /// Keep saves in memory only
    #[arg(long, global = true)]
    no_save: bool,

    /// Directory with catalog overrides (items.json, spells.json, ...)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// RNG seed
    #[arg(short, long, global = true, default_value = "42")]
    seed: u64,

    /// Number of save slots
    #[arg(long, global = true, default_value = "100")]
    slots: u32,

    /// Lines kept in the battle log
    #[arg(long, global = true, default_value = "7")]
    log_lines: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Play by typing commands (type 'help' once running)
    Play,

    /// Play with arrow keys, Enter, Esc and Tab
    Keys,

    /// List save slots
    Slots,

    /// List catalog content: items, spells, quests or venues
    Catalog {
        /// Which catalog to list
        kind: String,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = commands::session_config(&cli.game);
    let result = match cli.command {
        Commands::Play => commands::play::run(config),
        Commands::Keys => commands::keys::run(config),
        Commands::Slots => commands::slots::run(config),
        Commands::Catalog { kind } => commands::catalog::run(config, &kind),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
