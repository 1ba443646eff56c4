use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "nexus", version, about = "Nexus session controller CLI")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). NEXUS_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Session control and status polling
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Direct lock box commands
    Device {
        #[command(subcommand)]
        action: commands::device::DeviceAction,
    },
    /// External automation bridge
    Bridge {
        #[command(subcommand)]
        action: commands::bridge::BridgeAction,
    },
    /// Session video pool
    Video {
        #[command(subcommand)]
        action: commands::video::VideoAction,
    },
}

fn verbosity_to_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Logs go to stderr so stdout stays parseable JSON.
fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_env("NEXUS_LOG")
        .unwrap_or_else(|_| EnvFilter::new(verbosity_to_directive(verbosity)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Session { action } => commands::session::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Device { action } => commands::device::run(action),
        Commands::Bridge { action } => commands::bridge::run(action),
        Commands::Video { action } => commands::video::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
