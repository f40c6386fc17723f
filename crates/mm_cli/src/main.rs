use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use mm_core::{AppConfig, ArticleStore};
use mm_inference::create_summarizer;
use mm_notify::create_notifier;
use mm_report::{ReportConfig, ReportGenerator};
use mm_scraper::HttpFetcher;
use mm_storage::SqliteStore;
use mm_web::AppState;

#[derive(Parser)]
#[command(name = "mm", about = "Media monitoring and report delivery service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Bind address override
        #[arg(long)]
        host: Option<String>,
        /// Port override
        #[arg(long)]
        port: Option<u16>,
    },
    /// Create the database and run migrations
    InitDb,
    /// Submit an article URL from the command line
    Submit {
        url: String,
        #[arg(long, default_value = "cli")]
        submitted_by: String,
    },
    /// List pending articles
    Pending,
    /// Generate and deliver a report now
    Report {
        #[command(subcommand)]
        kind: ReportCommands,
    },
}

#[derive(Subcommand)]
enum ReportCommands {
    /// Daily media monitoring report
    Media {
        /// File with ad-hoc pasted content to include
        #[arg(long)]
        pasted_file: Option<PathBuf>,
        /// Extra recipient for this run
        #[arg(long)]
        recipient: Option<String>,
    },
    /// Parliamentary questions briefing
    Hansard {
        /// Extra recipient for this run
        #[arg(long)]
        recipient: Option<String>,
    },
}

struct Collaborators {
    store: Arc<SqliteStore>,
    reports: Arc<ReportGenerator>,
}

async fn build_collaborators(config: &AppConfig) -> anyhow::Result<Collaborators> {
    let store = Arc::new(SqliteStore::connect(&config.database_path).await?);
    let fetcher = Arc::new(HttpFetcher::from_config(config)?);
    let summarizer = create_summarizer(config)?;
    let notifier = create_notifier(config)?;
    let reports = Arc::new(ReportGenerator::new(
        store.clone(),
        fetcher,
        summarizer,
        notifier,
        ReportConfig::from_app(config),
    ));
    Ok(Collaborators { store, reports })
}

async fn serve(config: AppConfig, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let collaborators = build_collaborators(&config).await?;
    let state = AppState::new(
        collaborators.store,
        collaborators.reports,
        config.webhook_url.clone(),
    );
    let app = mm_web::create_app(state).await;

    let host = host.unwrap_or(config.host);
    let port = port.unwrap_or(config.port);
    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("failed to bind {host}:{port}"))?;
    info!("listening on {}:{}", host, port);
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    match cli.command {
        Commands::Serve { host, port } => serve(config, host, port).await?,
        Commands::InitDb => {
            SqliteStore::connect(&config.database_path).await?;
            println!("database ready at {}", config.database_path);
        }
        Commands::Submit { url, submitted_by } => {
            let store = SqliteStore::connect(&config.database_path).await?;
            let article = store.submit(&url, &submitted_by).await?;
            println!("submitted #{}: {}", article.id, article.url);
        }
        Commands::Pending => {
            let store = SqliteStore::connect(&config.database_path).await?;
            let pending = store.list_pending().await?;
            if pending.is_empty() {
                println!("no pending articles");
            }
            for article in pending {
                let content = if article.has_content() { " [pasted]" } else { "" };
                println!(
                    "#{} {} (by {}, {}){}",
                    article.id,
                    article.url,
                    article.submitted_by,
                    article.submitted_at.format("%Y-%m-%d %H:%M"),
                    content
                );
            }
        }
        Commands::Report { kind } => {
            let collaborators = build_collaborators(&config).await?;
            let outcome = match kind {
                ReportCommands::Media {
                    pasted_file,
                    recipient,
                } => {
                    let pasted = match pasted_file {
                        Some(path) => Some(
                            std::fs::read_to_string(&path)
                                .with_context(|| format!("reading {}", path.display()))?,
                        ),
                        None => None,
                    };
                    collaborators
                        .reports
                        .generate_media_report(pasted, recipient)
                        .await?
                }
                ReportCommands::Hansard { recipient } => {
                    collaborators.reports.generate_hansard_report(recipient).await?
                }
            };
            println!("delivered {}", outcome.report_id);
            println!(
                "scraped {} ok / {} failed, summarized {} ok / {} failed, archived {}",
                outcome.stats.scraped_ok,
                outcome.stats.scrape_failed,
                outcome.stats.summarized_ok,
                outcome.stats.summarize_failed,
                outcome.stats.archived
            );
        }
    }
    Ok(())
}
