use anyhow::Context;
use clap::Parser;
use cp_selection::{logging, CandidateSet, Config, CpSearch, SearchOutcome, SearchRequest, StepMode};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "cp_selection")]
#[command(about = "Suggest command post parkings around a missing person's last known position")]
struct Cli {
    /// Last known position: "lat, long" in decimal degrees or an address
    location: String,

    /// Hours since the person was at the last known position
    #[arg(long, default_value_t = 2.0)]
    hours: f64,

    /// Estimated walking speed in km/h
    #[arg(long, default_value_t = 5.0)]
    speed: f64,

    /// Request a ring for every half hour of walking instead of one catchment
    #[arg(long)]
    incremental: bool,

    /// Maximum number of candidates, overrides the config file
    #[arg(long)]
    max_candidates: Option<usize>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the candidates as GeoJSON to this file
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write the catchment rings as GeoJSON to this file
    #[arg(long)]
    catchment_output: Option<PathBuf>,

    #[arg(long, help = "Enable verbose output")]
    verbose: bool,
}

fn print_report(outcome: &SearchOutcome) {
    let budget = &outcome.budget;
    println!(
        "Last known position: {}, {}",
        outcome.origin.latitude, outcome.origin.longitude
    );
    println!(
        "Catchment: {} m ({} h at {} km/h, halved), rings {:?}",
        budget.distance_budget_m, budget.elapsed_hours, budget.walking_speed_kmh, budget.range_steps
    );
    println!("Query box (S, W, N, E): {}", outcome.query_box.to_query_string());

    if outcome.candidates.is_empty() {
        println!("No surface parkings found within the catchment.");
        return;
    }

    println!();
    println!(
        "{:>4}  {:>12}  {:>9}  {:<14}  {:<22}  {}",
        "#", "Area", "Capacity", "Access", "Center", "Map"
    );
    for (rank, candidate) in outcome.candidates.iter().enumerate() {
        let capacity = if candidate.capacity_estimated {
            format!("~{}", candidate.capacity)
        } else {
            candidate.capacity.to_string()
        };
        println!(
            "{:>4}  {:>12}  {:>9}  {:<14}  {:<22}  {}",
            rank + 1,
            candidate.area_label(),
            capacity,
            candidate.access,
            format!("{:.5}, {:.5}", candidate.centroid.lat, candidate.centroid.lon),
            candidate.maps_link()
        );
    }
    println!();
    println!(
        "{} candidates, {} parking spaces in total (~ = estimated from area)",
        outcome.candidates.len(),
        outcome.candidates.total_capacity()
    );
}

fn write_candidates(path: &Path, candidates: &CandidateSet) -> anyhow::Result<()> {
    std::fs::write(path, candidates.to_geojson_string())
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::info!("Candidates saved to {}", path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_cli_logger(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => {
            let mut config = Config::default();
            config.apply_env();
            config
        }
    };

    let search = CpSearch::from_config(&config)?;
    let request = SearchRequest {
        step_mode: if cli.incremental {
            StepMode::Incremental
        } else {
            StepMode::Single
        },
        max_candidates: cli.max_candidates,
        ..SearchRequest::new(cli.location.clone(), cli.hours, cli.speed)
    };

    let outcome = match search.run(&request).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Search failed: {}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    print_report(&outcome);

    if let Some(path) = &cli.output {
        write_candidates(path, &outcome.candidates)?;
    }
    if let Some(path) = &cli.catchment_output {
        std::fs::write(path, outcome.catchment.to_geojson().to_string())
            .with_context(|| format!("writing {}", path.display()))?;
    }

    Ok(())
}
