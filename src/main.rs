mod api;
mod gateway;
mod timeparse;

use clap::{Parser, Subcommand};
use concierge_capabilities::Capabilities;
use concierge_core::{config, message::IncomingMessage, shellexpand, traits::Provider};
use concierge_memory::Store;
use concierge_providers::build_provider;
use gateway::{Dispatcher, Gateway, IntentClassifier, Pipeline};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(
    name = "concierge",
    version,
    about = "Concierge — WhatsApp assistant for calendar, email, tasks and reminders"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API.
    Start,
    /// Run one message through the full pipeline and print the reply.
    Ask {
        /// User id the session is keyed by.
        #[arg(short, long, default_value = "cli")]
        user: String,
        /// The message to send.
        #[arg(trailing_var_arg = true)]
        message: Vec<String>,
    },
    /// Print the deterministic route and extracted entities for a message.
    Route {
        #[arg(trailing_var_arg = true)]
        message: Vec<String>,
    },
    /// Show provider, capabilities and store status.
    Status,
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Stdout logging plus a daily log file under `{data_dir}/logs`.
///
/// The returned guard must stay alive for the file writer to flush.
fn init_logging(cfg: &config::Config) -> tracing_appender::non_blocking::WorkerGuard {
    let log_dir = format!("{}/logs", shellexpand(&cfg.assistant.data_dir));
    let file = tracing_appender::rolling::daily(log_dir, "concierge.log");
    let (writer, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::registry()
        .with(env_filter(&cfg.assistant.log_level))
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .init();
    guard
}

fn message_arg(message: Vec<String>, usage: &str) -> anyhow::Result<String> {
    let text = message.join(" ");
    if text.trim().is_empty() {
        anyhow::bail!("no message provided. Usage: {usage}");
    }
    Ok(text)
}

/// Wire store, provider, capabilities and pipeline into a gateway.
async fn build_gateway(
    cfg: &config::Config,
) -> anyhow::Result<(Gateway, Store, Option<Arc<dyn Provider>>)> {
    let store = Store::new(&cfg.memory).await?;
    let provider = build_provider(&cfg.provider)?;
    let tz = cfg.assistant.tz()?;

    let capabilities = Capabilities::from_config(cfg, store.clone());
    let pipeline = Pipeline::new(
        Dispatcher::new(capabilities, cfg.dispatch.clone()),
        IntentClassifier::new(provider.clone(), &cfg.classifier),
        provider.clone(),
        tz,
        &cfg.assistant.name,
    );
    let gateway = Gateway::new(
        pipeline,
        Arc::new(store.clone()),
        cfg.memory.history_turns,
    );
    Ok((gateway, store, provider))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;

    match cli.command {
        Commands::Start => {
            let _guard = init_logging(&cfg);
            if !cfg.api.enabled {
                anyhow::bail!("API is disabled. Set [api] enabled = true in config.toml.");
            }

            let (gateway, _store, provider) = build_gateway(&cfg).await?;
            match &provider {
                Some(p) if !p.is_available().await => {
                    tracing::warn!("provider '{}' is not available; replies will fall back", p.name())
                }
                Some(p) => tracing::info!("provider: {}", p.name()),
                None => tracing::info!("no reasoning provider configured"),
            }

            println!("Concierge — listening on {}:{}", cfg.api.host, cfg.api.port);
            api::serve(&cfg.api, Arc::new(gateway)).await;
        }
        Commands::Ask { user, message } => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter("warn"))
                .init();
            let text = message_arg(message, "concierge ask [--user <id>] <message>")?;

            let (gateway, _store, _) = build_gateway(&cfg).await?;
            let reply = gateway.handle(IncomingMessage::text(&user, &text)).await;
            println!("{}", reply.reply);
            println!("\n[route: {}]", reply.route);
        }
        Commands::Route { message } => {
            let text = message_arg(message, "concierge route <message>")?;
            let tz = cfg.assistant.tz()?;
            let local_now = chrono::Utc::now().with_timezone(&tz).naive_local();
            let report = gateway::inspect(&text, local_now);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Status => {
            println!("Concierge — Status Check\n");
            println!("Config: {}", cli.config);
            println!("Timezone: {}", cfg.assistant.timezone);
            println!("Default provider: {}", cfg.provider.default);

            let provider = build_provider(&cfg.provider)?;
            if let Some(p) = &provider {
                println!(
                    "  {}: {}",
                    p.name(),
                    if p.is_available().await {
                        "available"
                    } else {
                        "missing api key"
                    }
                );
            }
            println!(
                "Classifier: {}",
                if cfg.classifier.enabled && provider.is_some() {
                    "provider"
                } else {
                    "heuristic"
                }
            );
            println!();

            let store = Store::new(&cfg.memory).await?;
            let capabilities = Capabilities::from_config(&cfg, store.clone());
            for domain in capabilities.domains() {
                println!("  {}: configured", domain.as_str());
            }
            println!();
            println!("Sessions: {}", store.session_count().await?);
            println!("Database: {} bytes", store.db_size().await?);
            println!(
                "API: {}",
                if cfg.api.enabled {
                    format!("{}:{}", cfg.api.host, cfg.api.port)
                } else {
                    "disabled".to_string()
                }
            );
        }
    }

    Ok(())
}
