//! sqlite-mysql-migrate CLI - SQLite to MySQL/MariaDB migration.

use clap::{Parser, Subcommand};
use sqlite_mysql_migrate::{Config, DryRunResult, MigrateError, MigrationResult, Orchestrator};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(name = "sqlite-mysql-migrate")]
#[command(about = "SQLite to MySQL/MariaDB schema and data migration")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file (default: read SQLITE_DB and MARIADB_* variables)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate every table from SQLite to MySQL
    Run {
        /// Dry run: print the DDL for each table without connecting to MySQL
        #[arg(long)]
        dry_run: bool,

        /// Override rows per INSERT batch
        #[arg(long)]
        batch_size: Option<usize>,

        /// Override the SQLite database path
        #[arg(long)]
        sqlite_path: Option<PathBuf>,
    },

    /// Test database connections
    HealthCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<ExitCode, MigrateError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format);

    let mut config = match &cli.config {
        Some(path) => {
            let config = Config::load(path)?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => {
            let config = Config::from_env()?;
            info!("Loaded configuration from environment");
            config
        }
    };

    match cli.command {
        Commands::Run {
            dry_run,
            batch_size,
            sqlite_path,
        } => {
            // Apply overrides
            if let Some(size) = batch_size {
                config.migration.batch_size = size;
            }
            if let Some(path) = sqlite_path {
                config.source.path = path;
            }
            config.validate()?;

            if dry_run {
                let result = Orchestrator::plan(&config).await?;
                if cli.output_json {
                    println!("{}", serde_json::to_string_pretty(&result)?);
                } else {
                    print_plans(&result);
                }
                if result.has_failures() {
                    return Ok(ExitCode::FAILURE);
                }
                return Ok(ExitCode::SUCCESS);
            }

            let orchestrator = Orchestrator::new(config).await?;
            let result = orchestrator.run().await?;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                print_result(&result);
            }

            if result.has_failures() {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::HealthCheck => {
            let result = Orchestrator::health_check(&config).await;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  Source (SQLite): {} ({}ms)",
                    if result.source_connected { "OK" } else { "FAILED" },
                    result.source_latency_ms
                );
                if let Some(ref err) = result.source_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "  Target (MySQL): {} ({}ms)",
                    if result.target_connected { "OK" } else { "FAILED" },
                    result.target_latency_ms
                );
                if let Some(ref err) = result.target_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "\n  Overall: {}",
                    if result.healthy { "HEALTHY" } else { "UNHEALTHY" }
                );
            }

            if !result.healthy {
                return Err(MigrateError::connection(
                    "health check",
                    "one or more databases are unreachable",
                ));
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_plans(result: &DryRunResult) {
    for plan in &result.plans {
        println!("-- {}", plan.table);
        for warning in &plan.warnings {
            println!("-- warning: {}", warning);
        }
        println!("{};\n", plan.create_sql);
    }
    for failure in &result.failed_tables {
        println!("-- {} FAILED: {}", failure.table, failure.reason);
    }
    println!(
        "Dry run completed! {} tables planned, {} failed",
        result.plans.len(),
        result.failed_tables.len()
    );
}

fn print_result(result: &MigrationResult) {
    println!("\nMigration completed!");
    println!("  Run ID: {}", result.run_id);
    println!("  Status: {}", result.status);
    println!("  Duration: {:.2}s", result.duration_seconds);
    println!(
        "  Tables: {}/{} ({} skipped)",
        result.tables_success, result.tables_total, result.tables_skipped
    );
    println!(
        "  Rows: {} attempted, {} inserted, {} ignored",
        result.rows_attempted, result.rows_inserted, result.rows_ignored
    );
    println!(
        "  Batches: {}/{} committed",
        result.batches_total - result.batches_failed,
        result.batches_total
    );
    println!("  Throughput: {} rows/sec", result.rows_per_second);
    if !result.failed_tables.is_empty() {
        println!("  Failed tables: {:?}", result.failed_tables);
    }
}

fn setup_logging(verbosity: &str, format: &str) {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so --output-json stays parseable.
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
