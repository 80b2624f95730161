//! mvn2get binary.
//!
//! This is the entry point for the `mvn2get` command-line tool. It loads
//! the configuration, initializes logging via `tracing`, parses the seed
//! coordinates, and hands everything to the resolver. The exit code is 0
//! iff the problem ledger is empty at shutdown.

mod cli;
mod sink;

use miette::Result;

use mvn2get_core::config::Configuration;
use mvn2get_core::coordinate::Coordinate;
use mvn2get_core::events::{EventSink, TracingSink};
use mvn2get_repo::fetch::ReqwestFetcher;
use mvn2get_repo::signature::NullVerifier;
use mvn2get_resolver::resolver::Resolver;
use mvn2get_util::errors::Mvn2getError;
use mvn2get_util::progress;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::parse();
    let config = args.build_configuration()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(config.log_level.as_filter())
            }),
        )
        .init();

    let seeds = parse_seeds(&args.coordinates, &config)?;

    if config.do_remote_download {
        mvn2get_util::fs::ensure_dir(&config.output_dir).map_err(|e| Mvn2getError::Config {
            message: format!(
                "output directory {} is not writable: {e}",
                config.output_dir.display()
            ),
        })?;
    }

    let fetcher = ReqwestFetcher::new()?;
    // No PGP backend ships with the tool; a real verifier plugs in here.
    let verifier = NullVerifier;

    let console = config
        .show_progress
        .then(|| sink::ConsoleSink::new(&config.progress_indicators));
    let tracing_sink = TracingSink;
    let sink: &dyn EventSink = match &console {
        Some(console) => console,
        None => &tracing_sink,
    };

    let mut resolver = Resolver::new(&config, &fetcher, &verifier, sink);
    let outcome = resolver.resolve(seeds).await;
    if let Some(console) = &console {
        console.finish();
    }
    outcome?;

    let problems = resolver.problems();
    if let Some(path) = &config.problem_file {
        if !problems.is_empty() {
            problems.write_report(path)?;
        }
    }

    if problems.is_empty() {
        progress::status(
            "Finished",
            &format!("{} coordinates resolved", resolver.records().len()),
        );
        Ok(())
    } else {
        progress::status_warn("Problems", &format!("{} recorded", problems.len()));
        for problem in problems.snapshot() {
            eprintln!("  {}: {}", problem.kind.as_str(), problem.message);
        }
        std::process::exit(1);
    }
}

/// Turn positional arguments into seed coordinates.
///
/// Arguments are either `group:artifact:version[:classifier[:packaging]]`
/// strings or full URLs into one of the configured repositories.
fn parse_seeds(raw: &[String], config: &Configuration) -> Result<Vec<Coordinate>> {
    let mut bases = config.remote_repo_urls.clone();
    bases.extend(config.local_repo_urls.iter().cloned());

    raw.iter()
        .map(|arg| {
            if arg.starts_with("http://") || arg.starts_with("https://") || arg.starts_with("file://")
            {
                Coordinate::parse_url(arg, &bases)
            } else {
                Coordinate::parse(arg)
            }
        })
        .collect()
}
