//! recallkit CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "recallkit",
    version,
    about = "Score and summarise serial and free recall experiments"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score session files and store the participant reports
    Score {
        /// Path to a .toml session file or a directory of them
        #[arg(long)]
        session: PathBuf,

        /// Results directory (default: results_dir from config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Primacy/recency zone size for free-recall experiments
        #[arg(long)]
        zone_size: Option<usize>,

        /// Fail on the first trial that cannot be scored
        #[arg(long)]
        strict: bool,

        /// Output format: text, json, markdown, html
        #[arg(long)]
        format: Option<String>,
    },

    /// Summarise every stored report
    Summarize {
        /// Results directory (default: results_dir from config)
        #[arg(long)]
        results: Option<PathBuf>,

        /// Only this experiment (name, number, or alias)
        #[arg(long)]
        experiment: Option<String>,

        /// Output format: text, markdown, json, html
        #[arg(long)]
        format: Option<String>,

        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate session TOML files
    Validate {
        /// Path to a session file or directory
        #[arg(long)]
        session: PathBuf,
    },

    /// Create starter config and example session
    Init,
}

fn main() {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "recallkit=info".parse::<tracing_subscriber::filter::Directive>() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Score {
            session,
            output,
            config,
            zone_size,
            strict,
            format,
        } => commands::score::execute(session, output, config, zone_size, strict, format),
        Commands::Summarize {
            results,
            experiment,
            format,
            output,
            config,
        } => commands::summarize::execute(results, experiment, format, output, config),
        Commands::Validate { session } => commands::validate::execute(session),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
