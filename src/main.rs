mod dashboard;
mod error;
mod fetcher;
mod frequency;
mod handlers;
mod models;
mod probe;
mod render;
mod sort;
mod state;
mod tabs;
mod traceroute;

use anyhow::bail;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tokio_cron_scheduler::{Job, JobScheduler};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::dashboard::Pipeline;
use crate::fetcher::{Endpoint, EndpointClient, Payload};
use crate::state::{load_templates, AppState, Config};

/// Diagnostics dashboard for a single mesh node.
#[derive(Parser, Debug)]
#[command(name = "meshstatus")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the dashboard (default)
    Serve,
    /// Load the node once, print a summary and exit
    Probe {
        /// Upper bound for the whole load, in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Fetch one node endpoint and print its payload
    Fetch {
        /// capabilities, status, olsr2, nodedb, connections, versions or traceroute
        endpoint: String,
        /// Traceroute target
        #[arg(long)]
        target: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("meshstatus=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Probe { timeout_secs } => {
            let timeout = timeout_secs.map_or(config.probe_timeout, Duration::from_secs);
            if let Err(e) = run_probe(&config, timeout).await {
                error!("Fatal error: {:#}", e);
                std::process::exit(2);
            }
            Ok(())
        }
        Command::Fetch { endpoint, target } => fetch_one(&config, &endpoint, target.as_deref()).await,
    }
}

fn pipeline(config: &Config) -> anyhow::Result<Pipeline> {
    let client = EndpointClient::new(&config.node_url)?;
    Ok(Pipeline::new(client, config.thresholds()))
}

async fn run_probe(config: &Config, timeout: Duration) -> anyhow::Result<()> {
    let report = probe::run(&pipeline(config)?, timeout).await?;
    println!("{}", report);
    Ok(())
}

async fn fetch_one(config: &Config, name: &str, target: Option<&str>) -> anyhow::Result<()> {
    let Some(endpoint) = Endpoint::from_name(name, target) else {
        bail!("unknown endpoint '{}' (traceroute needs --target)", name);
    };
    let client = EndpointClient::new(&config.node_url)?;
    match client.fetch(&endpoint).await {
        Ok(Payload::Json(value)) => println!("{}", serde_json::to_string_pretty(&value)?),
        Ok(Payload::Text(text)) => println!("{}", text),
        Err(e) => bail!("{} failed: {}", endpoint.name(), e.diagnostic()),
    }
    Ok(())
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let tera = load_templates()?;
    let state = Arc::new(AppState::new(tera, pipeline(&config)?));

    info!("Monitoring node at {}", config.node_url);
    let initial = Arc::clone(&state);
    tokio::spawn(async move {
        initial.pipeline.load_all(&initial.dashboard).await;
        info!("Initial dashboard load complete");
    });

    let _scheduler = schedule_refresh(&config.refresh_cron, Arc::clone(&state)).await?;

    let app = handlers::router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Starts the periodic full reload. The returned scheduler must be kept alive.
async fn schedule_refresh(cron: &str, state: Arc<AppState>) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let state = Arc::clone(&state);
        Box::pin(async move {
            info!("Scheduled dashboard reload");
            state.pipeline.load_all(&state.dashboard).await;
        })
    })?;
    scheduler.add(job).await?;
    scheduler.start().await?;
    info!("Dashboard reload scheduled: {}", cron);
    Ok(scheduler)
}
