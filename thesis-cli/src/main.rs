use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thesis_core::config::{Config, StorageConfig};
use thesis_core::{create_record_store, detection, load_firms, Pipeline};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "thesis")]
#[command(about = "Extract private equity investment theses from firm websites", long_about = None)]
#[command(version)]
struct Cli {
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Crawl, rank and extract theses for every firm in the list")]
    Run {
        #[arg(long, help = "Scrape concurrently and extract on a single worker")]
        parallel: bool,

        #[arg(long, help = "Drop and recreate the results table first")]
        reset: bool,

        #[arg(long, help = "Firm list CSV (overrides pipeline.firms_csv)")]
        firms: Option<PathBuf>,

        #[arg(long, help = "Keep raw page dumps after extraction")]
        keep_pages: bool,
    },

    #[command(about = "Show current configuration")]
    Show,

    #[command(about = "List stored theses")]
    Records,

    #[command(about = "Check that Ollama is running and the models are pulled")]
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "thesis=info,thesis_core=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Run {
            parallel,
            reset,
            firms,
            keep_pages,
        } => run(config, parallel, reset, firms, keep_pages).await,
        Commands::Show => {
            show_config(&config);
            Ok(())
        }
        Commands::Records => show_records(&config).await,
        Commands::Check => check(&config).await,
    }
}

fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        Config::load(path).with_context(|| format!("Failed to load config {}", path.display()))
    } else {
        tracing::info!(path = %path.display(), "No config file, using defaults");
        Ok(Config::default())
    }
}

async fn run(
    mut config: Config,
    parallel: bool,
    reset: bool,
    firms: Option<PathBuf>,
    keep_pages: bool,
) -> Result<()> {
    config.pipeline.parallel |= parallel;
    config.crawler.keep_pages |= keep_pages;
    if let Some(path) = firms {
        config.pipeline.firms_csv = path;
    }

    let firms = load_firms(&config.pipeline.firms_csv).with_context(|| {
        format!(
            "Failed to load firm list {}",
            config.pipeline.firms_csv.display()
        )
    })?;

    let pipeline = Pipeline::from_config(config)?;
    pipeline
        .store()
        .init(reset)
        .await
        .context("Failed to initialize record store")?;

    let summary = Arc::new(pipeline).run(firms).await?;

    println!();
    println!("{}", "Run complete:".bold().green());
    println!("  Firms:          {}", summary.firms);
    println!("  Succeeded:      {}", summary.succeeded.to_string().green());
    println!("  Failed:         {}", summary.failed.to_string().red());
    println!("  Records saved:  {}", summary.records_saved);

    Ok(())
}

fn show_config(config: &Config) {
    println!("{}", "Current Configuration:".bold().green());
    println!();
    println!("{}", "LLM:".bold());
    println!("  Model:          {}", config.llm.model.cyan());
    println!("  Base URL:       {}", config.llm.base_url);
    match config.llm.temperature {
        Some(t) => println!("  Temperature:    {}", t),
        None => println!("  Temperature:    model default"),
    }
    println!();
    println!("{}", "Ranking:".bold());
    println!("  Embedding Model: {}", config.embedding.model.cyan());
    println!("  Top K:           {} general / {} thesis", config.ranking.general_top_k, config.ranking.thesis_top_k);
    println!("  Boost Weight:    {}", config.ranking.boost_weight);
    println!("  Max Attempts:    {}", config.extraction.max_attempts);
    println!();
    println!("{}", "Crawler:".bold());
    println!("  Max Pages:       {}", config.crawler.max_pages);
    println!("  Output Dir:      {}", config.crawler.output_dir.display());
    println!();
    println!("{}", "Storage:".bold());
    match &config.storage {
        StorageConfig::Postgres { url: Some(_) } => println!("  Backend:         postgres (url from config)"),
        StorageConfig::Postgres { url: None } => println!("  Backend:         postgres (url from environment)"),
        StorageConfig::Sqlite { path } => println!("  Backend:         sqlite ({})", path.display()),
    }
    println!();
    println!("{}", "Pipeline:".bold());
    println!("  Firm List:       {}", config.pipeline.firms_csv.display());
    println!("  Parallel:        {}", config.pipeline.parallel);
}

async fn show_records(config: &Config) -> Result<()> {
    let store = create_record_store(&config.storage).context("Failed to open record store")?;
    let records = store.records().await.context("Failed to read records")?;

    if records.is_empty() {
        println!("{}", "No records stored yet. Run 'thesis run' first.".yellow());
        return Ok(());
    }

    for record in &records {
        let industry = if record.industry.is_empty() {
            "(none)".dimmed().to_string()
        } else {
            record.industry.bold().to_string()
        };
        println!("{} {} {}", "•".cyan(), record.name, industry);
        if !record.thesis.is_empty() {
            println!("    {}", record.thesis);
        }
    }
    println!();
    println!("{} records", records.len());

    Ok(())
}

async fn check(config: &Config) -> Result<()> {
    println!("{} Checking Ollama at {}...", "→".blue(), config.llm.base_url);

    let info = detection::detect_ollama(&config.llm.base_url).await?;
    println!("{} Ollama is running", "✓".green().bold());

    let mut missing = false;
    for model in [&config.llm.model, &config.embedding.model] {
        if info.has_model(model) {
            println!("{} {}", "✓".green().bold(), model.cyan());
        } else {
            missing = true;
            println!("{} {} not pulled (run 'ollama pull {}')", "✗".red().bold(), model.cyan(), model);
        }
    }

    if missing {
        anyhow::bail!("required models are missing");
    }
    Ok(())
}
