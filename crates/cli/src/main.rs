//! Operator CLI for the claims fraud-review API.
//!
//! Usage:
//!     claimlens claims --category HIGH --size 25
//!     claimlens claims --search diabetes --format json
//!     claimlens metrics
//!     claimlens ingest --file claims.csv
//!     claimlens health

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use claimlens_backend_rest::{ClaimsBackend, RestBackend, RestConfig};
use claimlens_controller::ClaimsQueryController;
use claimlens_model::{Gender, ScoreCategory, ScoringConfig};

#[derive(Parser)]
#[command(name = "claimlens")]
#[command(about = "Review health-insurance claims and fraud-risk analytics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Claims API URL
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    api_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List claims matching the given filters
    Claims(ClaimsArgs),

    /// Dashboard headline metrics
    Metrics,

    /// Aggregated chart data, optionally bounded by encounter date
    Chart {
        /// Lower bound (ISO date)
        #[arg(long)]
        start_date: Option<String>,

        /// Upper bound (ISO date)
        #[arg(long)]
        end_date: Option<String>,
    },

    /// Show or replace the fraud-scoring configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Upload a claims CSV for ingestion
    Ingest {
        /// Path to the CSV file
        #[arg(short, long)]
        file: String,
    },

    /// Check backend health
    Health,
}

#[derive(Args)]
struct ClaimsArgs {
    /// Ad-hoc search over the diagnosis text (supersedes --diagnosis)
    #[arg(long)]
    search: Option<String>,

    /// Patient registration number (substring match)
    #[arg(long)]
    patient_id: Option<String>,

    /// Patient sex (M or F)
    #[arg(long)]
    gender: Option<Gender>,

    /// Diagnosis filter (substring match)
    #[arg(long)]
    diagnosis: Option<String>,

    /// Minimum fraud score
    #[arg(long, conflicts_with = "category")]
    min_score: Option<f64>,

    /// Maximum fraud score
    #[arg(long, conflicts_with = "category")]
    max_score: Option<f64>,

    /// Risk category (LOW, MEDIUM or HIGH); pins the score bounds
    #[arg(long)]
    category: Option<ScoreCategory>,

    /// Encounter date lower bound (ISO date)
    #[arg(long)]
    start_date: Option<String>,

    /// Encounter date upper bound (ISO date)
    #[arg(long)]
    end_date: Option<String>,

    /// 0-based page index
    #[arg(long, default_value = "0")]
    page: u32,

    /// Page size (10, 15, 25, 50 or 100)
    #[arg(long, default_value = "15")]
    size: u32,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the current configuration
    Show,

    /// Replace the configuration from a JSON file
    Set {
        /// Path to the JSON file
        #[arg(short, long)]
        file: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("claimlens=debug".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let config = RestConfig {
        base_url: cli.api_url,
        ..Default::default()
    };
    let backend = RestBackend::new(config);

    match cli.command {
        Commands::Claims(args) => {
            run_claims(backend, args).await?;
        }
        Commands::Metrics => {
            run_metrics(&backend).await?;
        }
        Commands::Chart {
            start_date,
            end_date,
        } => {
            run_chart(&backend, start_date.as_deref(), end_date.as_deref()).await?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => run_config_show(&backend).await?,
            ConfigAction::Set { file } => run_config_set(&backend, &file).await?,
        },
        Commands::Ingest { file } => {
            run_ingest(&backend, &file).await?;
        }
        Commands::Health => {
            run_health(&backend).await?;
        }
    }

    Ok(())
}

async fn run_claims(backend: RestBackend, args: ClaimsArgs) -> Result<()> {
    let mut controller = ClaimsQueryController::new(backend);

    if let Some(patient_id) = args.patient_id.as_deref() {
        controller.set_patient_id(patient_id);
    }
    if let Some(gender) = args.gender {
        controller.set_gender(Some(gender));
    }
    if let Some(diagnosis) = args.diagnosis.as_deref() {
        controller.set_diagnosis(diagnosis);
    }
    if let Some(category) = args.category {
        controller.set_score_category(Some(category));
    }
    if let Some(min) = args.min_score {
        controller.set_min_score(Some(min))?;
    }
    if let Some(max) = args.max_score {
        controller.set_max_score(Some(max))?;
    }
    if let Some(start) = args.start_date.as_deref() {
        controller.set_start_date(start);
    }
    if let Some(end) = args.end_date.as_deref() {
        controller.set_end_date(end);
    }
    if let Some(search) = args.search.as_deref() {
        controller.set_search(search);
    }
    controller.set_page_size(args.size)?;

    // Walk forward to the requested page the way the dashboard does, so the
    // offset never runs past the server's reported totals.
    controller.refresh().await;
    while controller.page_index() < args.page && controller.next_page() {
        controller.refresh().await;
    }

    if let Some(err) = controller.error() {
        anyhow::bail!("claims fetch failed: {err}");
    }
    let Some(page) = controller.page() else {
        anyhow::bail!("no page fetched");
    };

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(page)?);
        return Ok(());
    }

    for (i, claim) in page.content.iter().enumerate() {
        println!(
            "\n{}. {} (Claim: {})",
            u64::from(page.number) * u64::from(page.size) + i as u64 + 1,
            claim.patient_id,
            claim.id
        );
        if let Some(diagnosis) = &claim.diagnosis {
            println!("   Diagnosis: {}", diagnosis);
        }
        if let Some(encounter) = &claim.encounter_date {
            println!("   Encounter: {}", encounter);
        }
        let score = claim
            .fraud_score
            .map(|s| format!("{:.1}", s))
            .unwrap_or_else(|| "-".to_string());
        let risk = claim
            .risk_category()
            .map(|c| c.as_str())
            .unwrap_or("-");
        println!("   Score: {} | Risk: {}", score, risk);
    }

    println!("\n---");
    println!(
        "Page {} of {} | {} claims total",
        page.number + 1,
        page.total_pages,
        page.total_elements
    );

    Ok(())
}

async fn run_metrics(backend: &RestBackend) -> Result<()> {
    let metrics = backend.metrics().await?;

    println!("Total claims:   {}", metrics.total_claims);
    println!("Average amount: {:.2}", metrics.average_amount);
    println!(
        "High risk:      {} ({:.1}%)",
        metrics.high_risk_count, metrics.high_risk_percent
    );
    println!(
        "By category:    LOW {} | MEDIUM {} | HIGH {}",
        metrics.low_count, metrics.medium_count, metrics.high_count
    );

    Ok(())
}

async fn run_chart(
    backend: &RestBackend,
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> Result<()> {
    let points = backend.chart_data(start_date, end_date).await?;

    for point in &points {
        println!(
            "{}  claims {:>5}  avg score {:>5.1}  amount {:>12.2}  L/M/H {}/{}/{}",
            point.date,
            point.count,
            point.average_score,
            point.total_amount,
            point.low_count,
            point.medium_count,
            point.high_count
        );
    }
    println!("---");
    println!("{} data points", points.len());

    Ok(())
}

async fn run_config_show(backend: &RestBackend) -> Result<()> {
    let config = backend.scoring_config().await?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

async fn run_config_set(backend: &RestBackend, file: &str) -> Result<()> {
    let text = tokio::fs::read_to_string(file).await?;
    let config: ScoringConfig = serde_json::from_str(&text)?;
    backend.update_scoring_config(&config).await?;
    println!("Scoring configuration updated");
    Ok(())
}

async fn run_ingest(backend: &RestBackend, file: &str) -> Result<()> {
    let bytes = tokio::fs::read(file).await?;
    let name = std::path::Path::new(file)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("claims.csv");

    let report = backend.ingest_csv(name, bytes).await?;
    println!("Total:    {}", report.total);
    println!("Inserted: {}", report.inserted);
    println!("Skipped:  {}", report.skipped);

    Ok(())
}

async fn run_health(backend: &RestBackend) -> Result<()> {
    print!("Checking {} backend... ", backend.name());

    match backend.health_check().await {
        Ok(()) => {
            println!("OK");
            Ok(())
        }
        Err(e) => {
            println!("FAILED: {}", e);
            std::process::exit(1);
        }
    }
}
