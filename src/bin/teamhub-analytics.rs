use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use teamhub_analytics::analytics::{
    AnalyticsEngine, AnalyticsRefresher, JsonFileStore, ReportFormat, Timeframe,
};
use teamhub_analytics::AnalyticsConfig;
use tracing::{error, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// JSON export of the portal database
    #[arg(short, long, env = "TEAMHUB_RECORDS")]
    records: PathBuf,

    /// Configuration file (created with defaults if missing)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Team analytics with insights and recommendations, as JSON
    Snapshot {
        /// week, month, quarter or year
        #[arg(short, long)]
        timeframe: Option<String>,
    },
    /// Condensed performance report
    Report {
        #[arg(short, long)]
        timeframe: Option<String>,

        /// json or markdown
        #[arg(short, long, default_value = "markdown")]
        format: String,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// All-time analytics for one member, as JSON
    Member { member_id: String },
    /// Print a summary line on every scheduled refresh until interrupted
    Watch {
        #[arg(short, long)]
        timeframe: Option<String>,
    },
}

fn default_config_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "teamhub-analytics")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("teamhub-analytics.toml"))
}

fn timeframe_or_default(
    name: Option<String>,
    config: &AnalyticsConfig,
) -> teamhub_analytics::Result<Timeframe> {
    match name {
        Some(name) => name.parse(),
        None => Ok(config.default_timeframe),
    }
}

async fn run(cli: Cli) -> teamhub_analytics::Result<()> {
    let config_path = cli.config.unwrap_or_else(default_config_path);
    let config = AnalyticsConfig::load_from_file(&config_path)?;
    let store = Arc::new(JsonFileStore::new(cli.records));
    let engine = AnalyticsEngine::new(store, config.clone());

    match cli.command {
        Command::Snapshot { timeframe } => {
            let timeframe = timeframe_or_default(timeframe, &config)?;
            let analytics = engine.team_analytics(timeframe).await?;
            println!("{}", serde_json::to_string_pretty(&analytics)?);
        }
        Command::Report {
            timeframe,
            format,
            output,
        } => {
            let timeframe = timeframe_or_default(timeframe, &config)?;
            let format: ReportFormat = format.parse()?;
            let report = engine.performance_report(timeframe).await?;
            match output {
                Some(path) => {
                    report.export(&path, format).await?;
                    info!(path = %path.display(), "Report written");
                }
                None => println!("{}", report.render(format)?),
            }
        }
        Command::Member { member_id } => {
            let analytics = engine.member_analytics(&member_id).await?;
            println!("{}", serde_json::to_string_pretty(analytics.as_ref())?);
        }
        Command::Watch { timeframe } => {
            let timeframe = timeframe_or_default(timeframe, &config)?;
            let refresher = AnalyticsRefresher::new(engine, timeframe, config.refresh_interval());
            let mut updates = refresher.subscribe();
            let handle = refresher.start();

            loop {
                tokio::select! {
                    update = updates.recv() => match update {
                        Ok(analytics) => {
                            let snapshot = &analytics.snapshot;
                            println!(
                                "[{}] tasks {} ({:.1}% done, {} overdue) | net {:.2} | members {}/{}",
                                snapshot.generated_at.format("%H:%M:%S"),
                                snapshot.tasks.total,
                                snapshot.tasks.completion_rate,
                                snapshot.tasks.overdue,
                                snapshot.financial.net_balance,
                                snapshot.team.active_members,
                                snapshot.team.total_members,
                            );
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                            info!(skipped, "Watcher fell behind");
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    },
                    _ = tokio::signal::ctrl_c() => break,
                }
            }

            refresher.stop();
            if let Some(handle) = handle {
                let _ = handle.await;
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with environment-based filtering
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("Command failed: {:?}", e);
        eprintln!("Error: {}", e.user_message());
        std::process::exit(1);
    }

    Ok(())
}
