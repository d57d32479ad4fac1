//! CLI frontend for the Loomwright narrative engine.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "lw",
    about = "Loomwright: procedural narrative scenes from content packages",
    version,
    propagate_version = true
)]
struct Cli {
    /// Log engine events to stderr (-v info, -vv debug; RUST_LOG overrides)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate content and report warnings
    Check {
        /// Content file or directory of .json packages
        path: PathBuf,
    },

    /// List scene templates
    List {
        /// Content file or directory of .json packages
        path: PathBuf,

        /// Only starter templates
        #[arg(long)]
        starters: bool,
    },

    /// Auto-play a seeded session, taking the first selectable choice each turn
    Play {
        /// Content file or directory of .json packages
        path: PathBuf,

        /// RNG seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Maximum number of choices to execute
        #[arg(short = 'n', long, default_value = "10")]
        steps: u32,

        /// Write a session snapshot here when done
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Auto-play a seeded session and print its spawn trace
    Trace {
        /// Content file or directory of .json packages
        path: PathBuf,

        /// Output format: markdown, json
        #[arg(short, long, default_value = "markdown")]
        format: String,

        /// RNG seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Maximum number of choices to execute
        #[arg(short = 'n', long, default_value = "10")]
        steps: u32,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Check { path } => commands::check::run(&path),
        Commands::List { path, starters } => commands::list::run(&path, starters),
        Commands::Play {
            path,
            seed,
            steps,
            save,
        } => commands::play::run(&path, seed, steps, save.as_deref()),
        Commands::Trace {
            path,
            format,
            seed,
            steps,
            output,
        } => commands::trace::run(&path, &format, seed, steps, output.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
