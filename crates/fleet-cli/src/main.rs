mod cmd;
mod invoker;
mod output;

use clap::{Parser, Subcommand};
use cmd::Overrides;
use fleet_core::config::CONFIG_FILE;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "fleet",
    about = "Keep a fleet of battle agents registered and fighting within their rate limits",
    version,
    propagate_version = true
)]
struct Cli {
    /// Fleet configuration file (missing file = built-in defaults)
    #[arg(long, global = true, env = "FLEET_CONFIG", default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grow the fleet, then battle in cycles until interrupted
    Run {
        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,
    },

    /// Register missing agents up to the target size, then exit
    Register,

    /// Show every agent's progress and cool-down
    Status,

    /// Print the effective configuration
    Config,
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Run { .. } | Commands::Register => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = cmd::load_config(&cli.config, cli.overrides).and_then(|config| match cli.command {
        Commands::Run { once } => cmd::run::run(config, once, cli.json),
        Commands::Register => cmd::register::run(config, cli.json),
        Commands::Status => cmd::status::run(&config, cli.json),
        Commands::Config => cmd::config::run(&config, cli.json),
    });

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
