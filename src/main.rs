use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use link_audit::api::{start_server, ApiConfig};
use link_audit::utils::{init_logger, parse_url_list};
use link_audit::{AppConfig, Engine, LinkStatus, SearchContext, SuggestionRequest};

#[derive(Parser)]
#[command(name = "link-audit", version, about = "Audit affiliate links and suggest replacements")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Audit the links listed in a file, one per line
    Audit {
        file: PathBuf,
        /// Override the configured concurrency ceiling
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Suggest a replacement for one broken link
    Suggest {
        #[arg(long)]
        url: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        tag: String,
        /// Product ids that must not be suggested
        #[arg(long = "exclude")]
        exclude: Vec<String>,
    },
}

#[actix_web::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Err(e) = init_logger(&config.log_dir) {
        eprintln!("Logging disabled: {:#}", e);
    }

    match cli.command {
        Command::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let engine = Engine::from_config(&config)?;
            start_server(&host, port, engine, ApiConfig::from(&config.server)).await?;
        }
        Command::Audit { file, concurrency } => {
            if let Some(concurrency) = concurrency {
                config.audit.max_concurrency = concurrency;
            }
            let text = std::fs::read_to_string(&file).with_context(|| format!("Failed to read {}", file.display()))?;
            let urls = parse_url_list(&text);
            info!("Auditing {} links from {}", urls.len(), file.display());

            let engine = Engine::from_config(&config)?;
            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted; finishing in-flight probes");
                    on_interrupt.cancel();
                }
            });

            let report = engine.auditor.audit(&urls, cancel).await;
            info!("Audited {} links, {} broken", report.summary.total, report.summary.broken);
            for status in LinkStatus::ALL {
                let count = report.summary.count(status);
                if count > 0 {
                    info!("  {}: {}", status, count);
                }
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Suggest {
            url,
            title,
            description,
            tag,
            exclude,
        } => {
            let engine = Engine::from_config(&config)?;
            let request = SuggestionRequest {
                original_url: url,
                search_context: SearchContext {
                    video_title: title,
                    video_description_excerpt: description,
                },
                affiliate_tag: tag,
                exclude_product_ids: exclude.into_iter().collect(),
            };
            let outcome = engine.suggester.find_replacement(&request).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    Ok(())
}
