//! Operator CLI for the Worldwide document store.
//!
//! # Responsibility
//! - `seed`: load a city fixture, guarded by an interactive confirmation
//!   when the collection already holds data.
//! - `ping` / `version`: linkage probes for the core crate.

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use worldwide_core::db::DB_URI_ENV;
use worldwide_core::{
    is_affirmative, seed_cities, CityRepository, DocumentCityRepository, Gateway, GatewayConfig,
    SeedFixture, SeedOutcome,
};

const DEFAULT_FIXTURE: &str = "data/cities.json";

#[derive(Debug, Parser)]
#[command(name = "worldwide", version, about = "Worldwide travel-log maintenance tool")]
struct Cli {
    /// Document store connection string (`sqlite::memory:` or `sqlite://<path>`).
    #[arg(long, global = true, env = DB_URI_ENV)]
    db_uri: Option<String>,

    /// One of trace|debug|info|warn|error.
    #[arg(long, global = true, env = "WORLDWIDE_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Replace the cities collection with the records of a fixture file.
    Seed {
        /// JSON file shaped as `{ "cities": [...] }`.
        #[arg(long, default_value = DEFAULT_FIXTURE)]
        fixture: PathBuf,
        /// Clear existing cities without asking.
        #[arg(long)]
        yes: bool,
    },
    /// Print the core crate liveness probe.
    Ping,
    /// Print the core crate version.
    Version,
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    worldwide_core::init_logging(&cli.log_level, None).map_err(anyhow::Error::msg)?;

    match cli.command {
        Command::Ping => println!("worldwide_core ping={}", worldwide_core::ping()),
        Command::Version => println!("worldwide_core version={}", worldwide_core::core_version()),
        Command::Seed { fixture, yes } => {
            let config = match cli.db_uri.as_deref().map(str::trim) {
                Some(uri) if !uri.is_empty() => GatewayConfig::new(uri),
                _ => GatewayConfig::default(),
            };
            run_seed(config, &fixture, yes)?;
        }
    }
    Ok(())
}

fn run_seed(config: GatewayConfig, fixture_path: &Path, assume_yes: bool) -> anyhow::Result<()> {
    let fixture = SeedFixture::from_path(fixture_path)?;
    let mut gateway = Gateway::new(config);
    let database = gateway
        .connect()
        .context("failed to connect to the document store")?;
    let repo = DocumentCityRepository::new(&database);

    let outcome = seed_cities(&repo, &fixture, |existing| {
        if assume_yes {
            return Ok(true);
        }
        confirm_clear(existing, &mut std::io::stdin().lock(), &mut std::io::stdout())
    });
    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(err) => {
            gateway.close();
            return Err(err.into());
        }
    };

    match outcome {
        SeedOutcome::Cancelled { existing } => {
            println!("Seed cancelled; {existing} existing cities left untouched.");
        }
        SeedOutcome::Completed { cleared, report } => {
            if cleared > 0 {
                println!("Cleared {cleared} existing cities.");
            }
            println!(
                "Migrated {}/{} cities.",
                report.succeeded.len(),
                report.attempted()
            );
            for failure in &report.failed {
                let name = failure
                    .input
                    .get("cityName")
                    .and_then(|value| value.as_str())
                    .unwrap_or("<unnamed>");
                println!("  failed: {name}: {}", failure.reason);
            }
            println!("Collection now holds {} cities.", repo.count_cities()?);
        }
    }

    gateway.close();
    info!("event=seed_cli module=cli status=ok");
    Ok(())
}

/// Asks whether `existing` cities may be deleted; anything but y/yes declines.
fn confirm_clear(
    existing: u64,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> std::io::Result<bool> {
    write!(
        output,
        "The cities collection already holds {existing} records. Delete them and continue? [y/N] "
    )?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(is_affirmative(&answer))
}

#[cfg(test)]
mod tests {
    use super::{confirm_clear, run_seed, Cli, Command, DEFAULT_FIXTURE};
    use clap::Parser;
    use std::io::Cursor;
    use std::path::PathBuf;
    use worldwide_core::{CityRepository, DocumentCityRepository, Gateway, GatewayConfig};

    #[test]
    fn seed_defaults_to_bundled_fixture() {
        let cli = Cli::try_parse_from(["worldwide", "seed"]).unwrap();
        match cli.command {
            Command::Seed { fixture, yes } => {
                assert_eq!(fixture, PathBuf::from(DEFAULT_FIXTURE));
                assert!(!yes);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_db_uri_is_accepted_after_subcommand() {
        let cli = Cli::try_parse_from([
            "worldwide",
            "seed",
            "--yes",
            "--db-uri",
            "sqlite::memory:",
        ])
        .unwrap();
        assert_eq!(cli.db_uri.as_deref(), Some("sqlite::memory:"));
    }

    #[test]
    fn confirm_clear_prompts_and_reads_answer() {
        let mut output = Vec::new();
        let confirmed = confirm_clear(4, &mut Cursor::new("yes\n"), &mut output).unwrap();
        assert!(confirmed);
        assert!(String::from_utf8(output).unwrap().contains("4 records"));

        let declined = confirm_clear(4, &mut Cursor::new("\n"), &mut Vec::new()).unwrap();
        assert!(!declined);
    }

    #[test]
    fn run_seed_loads_fixture_into_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = dir.path().join("cities.json");
        std::fs::write(
            &fixture,
            r#"{"cities": [
                {"cityName": "Lisbon", "country": "Portugal", "position": {"lat": 38.7, "lng": -9.1}},
                {"cityName": "Nowhere"}
            ]}"#,
        )
        .unwrap();
        let db_path = dir.path().join("worldwide.sqlite3");
        let uri = format!("sqlite://{}", db_path.display());

        run_seed(GatewayConfig::new(uri.clone()), &fixture, true).unwrap();
        run_seed(GatewayConfig::new(uri.clone()), &fixture, true).unwrap();

        let mut gateway = Gateway::new(GatewayConfig::new(uri));
        let repo = DocumentCityRepository::new(&gateway.connect().unwrap());
        assert_eq!(repo.count_cities().unwrap(), 1);
    }

    #[test]
    fn run_seed_reports_missing_fixture() {
        let err = run_seed(
            GatewayConfig::new("sqlite::memory:"),
            &PathBuf::from("/nonexistent/cities.json"),
            true,
        )
        .unwrap_err();
        assert!(err.to_string().contains("failed to read fixture"));
    }
}
