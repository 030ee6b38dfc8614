use std::env;
use std::str::FromStr;
use std::time::Duration;
use tera::Tera;
use tokio::sync::RwLock;
use tracing::warn;

use crate::dashboard::{Dashboard, Pipeline};
use crate::frequency::{OverlapThresholds, DEFAULT_OVERLAP_HIGH_MHZ, DEFAULT_OVERLAP_LOW_MHZ};

/// Application configuration from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the monitored node.
    pub node_url: String,
    /// Address to bind the HTTP server to.
    pub bind_address: String,
    /// Cron expression for the periodic dashboard reload.
    pub refresh_cron: String,
    /// Frequency-overlap thresholds in MHz.
    pub overlap_low_mhz: f64,
    pub overlap_high_mhz: f64,
    /// Upper bound for the `probe` command.
    pub probe_timeout: Duration,
}

impl Config {
    /// Creates Config from environment variables with defaults.
    pub fn from_env() -> Self {
        Self {
            node_url: env::var("NODE_URL").unwrap_or_else(|_| "http://127.0.0.1:1980".into()),
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8201".into()),
            refresh_cron: env::var("REFRESH_CRON").unwrap_or_else(|_| "0/30 * * * * *".into()),
            overlap_low_mhz: env_number("OVERLAP_LOW_MHZ", DEFAULT_OVERLAP_LOW_MHZ),
            overlap_high_mhz: env_number("OVERLAP_HIGH_MHZ", DEFAULT_OVERLAP_HIGH_MHZ),
            probe_timeout: Duration::from_secs(env_number("PROBE_TIMEOUT_SECS", 30)),
        }
    }

    pub fn thresholds(&self) -> OverlapThresholds {
        OverlapThresholds {
            low_mhz: self.overlap_low_mhz,
            high_mhz: self.overlap_high_mhz,
        }
    }
}

fn env_number<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    parse_or_default(name, env::var(name).ok().as_deref(), default)
}

fn parse_or_default<T: FromStr + Copy + std::fmt::Display>(
    name: &str,
    raw: Option<&str>,
    default: T,
) -> T {
    match raw {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}={:?}, using {}", name, raw, default);
            default
        }),
    }
}

/// Loads the dashboard templates compiled into the binary.
pub fn load_templates() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("macros.html", include_str!("../templates/macros.html")),
        ("dashboard.html", include_str!("../templates/dashboard.html")),
    ])?;
    Ok(tera)
}

/// Shared application state passed to all request handlers.
#[derive(Debug)]
pub struct AppState {
    /// Template engine for rendering HTML pages.
    pub tera: Tera,
    /// The consolidated view model, written by pipeline branches.
    pub dashboard: RwLock<Dashboard>,
    pub pipeline: Pipeline,
}

impl AppState {
    pub fn new(tera: Tera, pipeline: Pipeline) -> Self {
        Self {
            tera,
            dashboard: RwLock::new(Dashboard::default()),
            pipeline,
        }
    }
}
