//! calassoc CLI - inspect, validate and extend calibration caches.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "calassoc=debug" } else { "calassoc=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cache = cli.cache;
    let result = match cli.command {
        Commands::Init { force } => commands::init::run(cache, force),

        Commands::Check => commands::check::run(cache, cli.verbose),

        Commands::Show { json } => commands::show::run(cache, json),

        Commands::Extract {
            cal_type,
            references,
            json,
        } => commands::extract::run(cache, cal_type, references, json),

        Commands::Resolve {
            files,
            graph,
            table,
            obs_type,
            refresh_missing,
            no_history,
        } => commands::resolve::run(
            cache,
            commands::resolve::ResolveArgs {
                files,
                graph,
                table,
                obs_type,
                refresh_missing,
                keep_history: !no_history,
            },
        ),

        Commands::Fmt { check } => commands::fmt::run(cache, check),

        Commands::History => commands::history::run(cache),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
