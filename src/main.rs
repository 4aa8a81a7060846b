//! Lectio command-line front end.
//!
//! Every command prints JSON to stdout. Failures are printed as an
//! `{"status", "error"}` object and exit non-zero; logs go to stderr and are
//! filtered with `RUST_LOG`.

mod cli;

use crate::cli::{Cli, Command};
use clap::Parser;
use lectio_config::Config;
use lectio_library::api::SearchRequest;
use lectio_library::{ApiError, Library, SampleOptions};
use serde::Serialize;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
}

fn print_json(value: &impl Serialize) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        },
        Err(err) => {
            tracing::error!(error = %err, "Could not serialize output");
            ExitCode::FAILURE
        },
    }
}

fn respond<T: Serialize>(result: lectio_library::error::Result<T>) -> ExitCode {
    match result {
        Ok(value) => print_json(&value),
        Err(err) => {
            print_json(&ApiError::from(&err));
            ExitCode::FAILURE
        },
    }
}

fn non_empty(units: Vec<String>) -> Option<Vec<String>> {
    if units.is_empty() { None } else { Some(units) }
}

async fn run(library: &Library, command: Command) -> ExitCode {
    match command {
        Command::Unit { id } => respond(library.unit(&id).await.map(|unit| (*unit).clone())),
        Command::Section { unit, section } => respond(library.section(&unit, section).await),
        Command::Item { unit, section, item } => respond(library.item(&unit, section, item).await),
        Command::Search { query, collection, units, case_sensitive, limit, offset } => {
            let request = SearchRequest { q: query, collection, units: non_empty(units), case_sensitive, limit, offset };
            respond(library.search(&request).await)
        },
        Command::Lookup { reference } => respond(library.lookup_text(&reference).await),
        Command::Random { count, collection, units, seed, verse } => {
            let options = SampleOptions { collection, unit_ids: non_empty(units), seed };
            if verse {
                respond(library.random_verse(&options).await)
            } else {
                respond(library.random(count, &options).await)
            }
        },
        Command::Stats => print_json(&library.cache_stats().await),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = ?err, "Could not load configuration");
            eprintln!("lectio: {}", &*err);
            return ExitCode::from(2);
        },
    };
    let library = match Library::open(&config).await {
        Ok(library) => library,
        Err(err) => {
            print_json(&ApiError::from(&err));
            return ExitCode::from(2);
        },
    };
    if cli.warm {
        match library.warm(None).await {
            Ok(loaded) => tracing::info!(loaded, "Warmed caches"),
            Err(err) => tracing::warn!(error = ?err, "Could not warm caches"),
        }
    }
    run(&library, cli.command).await
}
