use analytics::AnalyticsEngine;
use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand};
use configuration::{LogFormat, settings::Config};
use core_types::{Trade, TradeStatus};
use database::{DbRepository, InMemoryStore, TradeStore};
use rust_decimal::Decimal;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use web_server::AppState;

mod tables;

/// The main entry point for the Tradebook ledger.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file, if present
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let mut config = configuration::load_config_from(&cli.config)?;
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    let _guard = configuration::init_tracing(&config.logging)?;

    // Execute the appropriate command
    match cli.command {
        Commands::Serve(args) => handle_serve(args, &config).await,
        Commands::Trades(args) => {
            let store = connect_store(&config).await?;
            handle_trades(args, store.as_ref()).await
        }
        Commands::Summary(args) => {
            let store = connect_store(&config).await?;
            handle_summary(args, store.as_ref()).await
        }
        Commands::Quarterly(args) => {
            let store = connect_store(&config).await?;
            handle_quarterly(args, store.as_ref()).await
        }
        Commands::Yearly => {
            let store = connect_store(&config).await?;
            handle_yearly(store.as_ref()).await
        }
        Commands::Capital(args) => {
            let store = connect_store(&config).await?;
            handle_capital(args, store.as_ref()).await
        }
        Commands::Export(args) => {
            let store = connect_store(&config).await?;
            handle_export(args, store.as_ref()).await
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// A personal stock-trade ledger with P&L and capital analytics.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = configuration::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Overrides the configured console log format.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// List trades with their booked P&L.
    Trades(StatusArgs),
    /// Show the dashboard metrics for the whole ledger.
    Summary(SummaryArgs),
    /// Break one year down by calendar quarter.
    Quarterly(QuarterlyArgs),
    /// Roll every year up into one row.
    Yearly,
    /// Show or update the total capital.
    Capital(CapitalArgs),
    /// Write the ledger to a CSV file.
    Export(ExportArgs),
}

#[derive(Parser)]
struct ServeArgs {
    /// Address to listen on (e.g., "127.0.0.1:8080"). Defaults to the configured host and port.
    #[arg(long)]
    addr: Option<SocketAddr>,

    /// Keep trades in memory instead of PostgreSQL. Nothing survives a restart.
    #[arg(long)]
    in_memory: bool,
}

#[derive(Parser)]
struct StatusArgs {
    /// Only show "open" or "completed" trades.
    #[arg(long)]
    status: Option<TradeStatus>,
}

#[derive(Parser)]
struct SummaryArgs {
    /// Print the metrics as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct QuarterlyArgs {
    /// The calendar year to analyse. Defaults to the current year.
    #[arg(long)]
    year: Option<i32>,
}

#[derive(Parser)]
struct CapitalArgs {
    /// Set the total capital to this amount.
    #[arg(long)]
    set: Option<Decimal>,
}

#[derive(Parser)]
struct ExportArgs {
    /// Only export "open" or "completed" trades.
    #[arg(long)]
    status: Option<TradeStatus>,

    /// The file to write.
    #[arg(long)]
    output: PathBuf,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn connect_store(config: &Config) -> anyhow::Result<Arc<dyn TradeStore>> {
    let db_pool = database::connect(&config.database).await?;
    database::run_migrations(&db_pool).await?;
    Ok(Arc::new(DbRepository::new(
        db_pool,
        config.ledger.default_total_capital,
    )))
}

async fn handle_serve(args: ServeArgs, config: &Config) -> anyhow::Result<()> {
    let addr = match args.addr {
        Some(addr) => addr,
        None => config.server.socket_addr()?,
    };

    let store: Arc<dyn TradeStore> = if args.in_memory {
        tracing::warn!("Using the in-memory store. Trades will be lost on shutdown.");
        Arc::new(InMemoryStore::new(config.ledger.default_total_capital))
    } else {
        connect_store(config).await?
    };

    web_server::serve(addr, Arc::new(AppState::new(store))).await
}

async fn filtered_trades(
    store: &dyn TradeStore,
    status: Option<TradeStatus>,
) -> anyhow::Result<Vec<Trade>> {
    let trades = store.list_trades().await?;
    Ok(match status {
        Some(status) => trades.into_iter().filter(|t| t.status() == status).collect(),
        None => trades,
    })
}

async fn handle_trades(args: StatusArgs, store: &dyn TradeStore) -> anyhow::Result<()> {
    let trades = filtered_trades(store, args.status).await?;
    if trades.is_empty() {
        println!("No trades recorded.");
        return Ok(());
    }

    let engine = AnalyticsEngine::new();
    println!("{}", tables::trades_table(&engine, &trades));
    Ok(())
}

async fn handle_summary(args: SummaryArgs, store: &dyn TradeStore) -> anyhow::Result<()> {
    let (trades, capital) = tokio::join!(store.list_trades(), store.get_capital());
    let metrics = AnalyticsEngine::new().calculate_trade_metrics(&trades?, capital?.total_capital);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        println!("{}", tables::metrics_table(&metrics));
    }
    Ok(())
}

async fn handle_quarterly(args: QuarterlyArgs, store: &dyn TradeStore) -> anyhow::Result<()> {
    let year = args.year.unwrap_or_else(|| Utc::now().year());
    let trades = store.list_trades().await?;
    let report = AnalyticsEngine::new().quarterly_analytics(&trades, year);

    println!("Quarterly performance for {}", year);
    println!("{}", tables::quarterly_table(&report));
    println!(
        "Best quarter: {}  Worst quarter: {}",
        report.best().quarter,
        report.worst().quarter
    );
    Ok(())
}

async fn handle_yearly(store: &dyn TradeStore) -> anyhow::Result<()> {
    let engine = AnalyticsEngine::new();
    let trades = store.list_trades().await?;
    let years = engine.yearly_analytics(&trades);

    if years.is_empty() {
        println!("No trades recorded.");
        return Ok(());
    }

    println!("{}", tables::yearly_table(&years));
    if let (Some(best), Some(worst)) = (engine.best_year(&years), engine.worst_year(&years)) {
        println!("Best year: {}  Worst year: {}", best.year, worst.year);
    }
    Ok(())
}

async fn handle_capital(args: CapitalArgs, store: &dyn TradeStore) -> anyhow::Result<()> {
    let settings = match args.set {
        Some(amount) => store.set_capital(amount).await?,
        None => store.get_capital().await?,
    };

    println!(
        "Total capital: {:.2} (updated {})",
        settings.total_capital,
        settings.updated_at.format("%Y-%m-%d %H:%M UTC")
    );
    Ok(())
}

async fn handle_export(args: ExportArgs, store: &dyn TradeStore) -> anyhow::Result<()> {
    let trades = filtered_trades(store, args.status).await?;

    let file = std::fs::File::create(&args.output)?;
    AnalyticsEngine::new().write_trades_csv(&trades, file)?;

    println!("Exported {} trades to {}", trades.len(), args.output.display());
    Ok(())
}
