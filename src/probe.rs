//! One-shot pipeline run for the `probe` command.

use anyhow::{bail, Context as _};
use itertools::Itertools;
use std::fmt;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;

use crate::dashboard::{Dashboard, Pipeline};

/// What a single full load produced.
#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub node: String,
    pub dashboard: Dashboard,
}

impl ProbeReport {
    /// Region diagnostics that were left by the load, labelled by region.
    pub fn problems(&self) -> Vec<(&'static str, &str)> {
        let d = &self.dashboard;
        [
            ("status", d.overview.error.as_deref().unwrap_or_default()),
            ("connections", d.connections.status.as_str()),
            ("versions", d.versions.status.as_str()),
        ]
        .into_iter()
        .filter(|(_, text)| !text.is_empty())
        .collect()
    }
}

impl fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.dashboard;
        writeln!(
            f,
            "{} ({} - {}) uptime {}",
            self.node, d.overview.ip, d.overview.hostname, d.overview.uptime
        )?;
        writeln!(
            f,
            "devices={} links={} neighbors={} ports={}",
            d.devices.rows.len(),
            d.links.rows.len(),
            d.neighbors.rows.len(),
            d.connections.table.rows.len()
        )?;
        if d.frequency_warning {
            writeln!(f, "Warning: frequency overlap detected!")?;
        }
        let problems = self.problems();
        if problems.is_empty() {
            write!(f, "all regions loaded")
        } else {
            write!(
                f,
                "problems: {}",
                problems
                    .iter()
                    .map(|(region, text)| format!("{}: {}", region, text.lines().next().unwrap_or_default()))
                    .join("; ")
            )
        }
    }
}

/// Runs one full load against the pipeline's node, bounded by `timeout`.
///
/// # Errors
///
/// Fails when the load does not finish in time or the node is unreachable.
pub async fn run(pipeline: &Pipeline, timeout: Duration) -> anyhow::Result<ProbeReport> {
    let node = pipeline.client().base_url().to_string();
    info!("Probing {}", node);

    let dashboard = RwLock::new(Dashboard::default());
    tokio::time::timeout(timeout, pipeline.load_all(&dashboard))
        .await
        .with_context(|| format!("probe of {} timed out after {:?}", node, timeout))?;

    let dashboard = dashboard.into_inner();
    if !dashboard.capabilities.reachable {
        bail!(
            "node {} not reachable: {}",
            node,
            dashboard.capabilities.error.as_deref().unwrap_or_default()
        );
    }

    Ok(ProbeReport { node, dashboard })
}
