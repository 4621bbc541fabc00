#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front-end for the hierarchical OSM geocoder.
//!
//! ```text
//! osm_geocoder --hierarchy-path hierarchy.jsonl [--queries-path queries.txt] [--top 5]
//! osm_geocoder --config geocoder.toml
//! osm_geocoder --verify
//! ```
//!
//! Without `--queries-path` the tool prompts for queries interactively; an
//! empty query exits.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use clap::Parser;
use dialoguer::Input;
use osm_geocoder::{Geocoder, GeocoderConfig, SearchResult, verify};
use osm_geocoder_cli_utils::IndicatifProgress;

#[derive(Parser)]
#[command(
    name = "osm_geocoder",
    about = "Geocode free-text queries against an address hierarchy"
)]
struct Cli {
    /// TOML config file (`hierarchy_path`, `hierarchy_sorted`, `top`)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to the hierarchy corpus (`<id> <json>` per line)
    #[arg(long)]
    hierarchy_path: Option<String>,

    /// File with one query per line; prompts interactively when omitted
    #[arg(long)]
    queries_path: Option<PathBuf>,

    /// Number of results printed per query
    #[arg(long)]
    top: Option<usize>,

    /// The corpus is already sorted by id
    #[arg(long)]
    sorted: bool,

    /// Run the embedded smoke tests and exit
    #[arg(long)]
    verify: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = osm_geocoder_cli_utils::init_logger();
    let cli = Cli::parse();

    if cli.verify {
        return run_verify();
    }

    let mut config = match &cli.config {
        Some(path) => osm_geocoder::load_config(path)?,
        None => GeocoderConfig::default(),
    };
    if let Some(path) = cli.hierarchy_path {
        config.hierarchy_path = path;
    }
    if let Some(top) = cli.top {
        config.top = top;
    }
    if cli.sorted {
        config.hierarchy_sorted = true;
    }

    if config.hierarchy_path.is_empty() {
        eprintln!("No hierarchy given: pass --hierarchy-path or set hierarchy_path in --config");
        std::process::exit(2);
    }

    let progress = IndicatifProgress::bytes_bar(&multi, "Loading hierarchy");
    let geocoder = Geocoder::from_config(&config, progress.as_ref())?;

    match cli.queries_path {
        Some(path) => run_queries_file(&geocoder, &path, config.top)?,
        None => run_interactive(&geocoder, config.top)?,
    }

    Ok(())
}

fn run_queries_file(
    geocoder: &Geocoder,
    path: &Path,
    top: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    log::info!("Reading queries from {}", path.display());

    let reader = BufReader::new(File::open(path)?);
    for line in reader.lines() {
        let line = line?;
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        print_results(query, &geocoder.process_query(query), top);
    }

    Ok(())
}

fn run_interactive(geocoder: &Geocoder, top: usize) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        let query: String = Input::new()
            .with_prompt("Query (empty to quit)")
            .allow_empty(true)
            .interact_text()?;
        let query = query.trim();
        if query.is_empty() {
            return Ok(());
        }
        print_results(query, &geocoder.process_query(query), top);
    }
}

fn print_results(query: &str, results: &[SearchResult], top: usize) {
    println!("{query}");
    if results.is_empty() {
        println!("  (no results)");
        return;
    }
    for result in results.iter().take(top) {
        let kind = result.id.kind();
        let kind: &str = kind.as_ref().map_or("unknown", |k| k.as_ref());
        println!(
            "  {:<22} {kind:<8} {:<12} {:.3}",
            result.id,
            result.id.serial(),
            result.certainty
        );
    }
}

fn run_verify() -> Result<(), Box<dyn std::error::Error>> {
    let report = verify::run_smoke_tests()?;

    for result in &report.results {
        let status = if result.passed { "PASS" } else { "FAIL" };
        println!("[{status}] {}", result.query);
        if let Some(reason) = &result.failure_reason {
            println!("        {reason}");
        }
    }
    println!("\n{}/{} smoke tests passed", report.passed, report.total);

    if !report.all_passed() {
        std::process::exit(1);
    }
    Ok(())
}
