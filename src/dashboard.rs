//! Consolidated view model and the pipeline that fills it.
//!
//! Every branch of the pipeline receives the shared `RwLock<Dashboard>` by
//! reference, does its fetching without holding the lock, and then writes only
//! the fields it owns. Branches complete in any order; each write replaces its
//! fields wholesale, so the last completed fetch wins.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::fetcher::{Endpoint, EndpointClient};
use crate::frequency::{self, OverlapThresholds, RadioRecord};
use crate::models::{Capabilities, ConnectionsPayload, NodeDirectory, RouteSummary, StatusPayload};
use crate::render::{self, Panel, Table, TableId};
use crate::sort;
use crate::traceroute;

const LOADING: &str = "Loading...";

/// Reachability and feature flags from `/capabilities`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CapabilitiesView {
    pub reachable: bool,
    pub traceroute: bool,
    pub show_admin_link: bool,
    pub error: Option<String>,
}

/// Node identity and the fields derived directly from `/status`.
#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub hostname: String,
    pub ip: String,
    pub uptime: String,
    pub default_route: Option<RouteSummary>,
    pub admin_url: Option<String>,
    pub olsr2_on: bool,
    pub olsr2_info: String,
    pub error: Option<String>,
}

impl Default for Overview {
    fn default() -> Self {
        Self {
            hostname: "Unknown".to_string(),
            ip: String::new(),
            uptime: String::new(),
            default_route: None,
            admin_url: None,
            olsr2_on: false,
            olsr2_info: String::new(),
            error: None,
        }
    }
}

impl Overview {
    fn from_status(status: &StatusPayload) -> Self {
        Self {
            hostname: status.hostname.clone().unwrap_or_else(|| "Unknown".to_string()),
            ip: status.ip.clone().unwrap_or_default(),
            uptime: status.uptime().unwrap_or_default().to_string(),
            default_route: Some(status.default_route.clone()).filter(RouteSummary::is_available),
            admin_url: status.admin_url(),
            olsr2_on: status.olsr2_on,
            olsr2_info: String::new(),
            error: None,
        }
    }
}

/// A table with its own loading/error status line.
#[derive(Debug, Clone, Serialize)]
pub struct TableRegion {
    pub status: String,
    pub table: Table,
}

impl TableRegion {
    fn new(id: TableId) -> Self {
        Self {
            status: String::new(),
            table: Table::new(id),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PanelRegion {
    pub status: String,
    pub panel: Option<Panel>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TracerouteView {
    pub target: String,
    pub summary: String,
    /// Raw command output; shown only when no hop could be parsed.
    pub raw: Option<String>,
    pub table: Table,
    /// Set once an operator ran a traceroute; the uplink trace no longer
    /// replaces the region after that.
    #[serde(skip)]
    pub user_run: bool,
}

impl Default for TracerouteView {
    fn default() -> Self {
        Self {
            target: String::new(),
            summary: String::new(),
            raw: None,
            table: Table::new(TableId::Traceroute),
            user_run: false,
        }
    }
}

impl TracerouteView {
    fn from_output(target: &str, text: String) -> Self {
        let hops = traceroute::parse_hops(&text);
        let summary = traceroute::summary(&text, &hops);
        Self {
            target: target.to_string(),
            summary,
            raw: hops.is_empty().then_some(text),
            table: render::traceroute_table(&hops),
            user_run: true,
        }
    }
}

/// Everything the dashboard shows, in one place.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub capabilities: CapabilitiesView,
    pub overview: Overview,
    /// Shown once, above the devices table.
    pub frequency_warning: bool,
    pub devices: Table,
    pub links: Table,
    pub neighbors: Table,
    pub connections: TableRegion,
    pub versions: PanelRegion,
    pub traceroute: TracerouteView,
    #[serde(skip)]
    pub node_directory: Option<NodeDirectory>,
    /// Last sort key requested per table, re-applied when the table is rebuilt.
    #[serde(skip)]
    pub sort_keys: HashMap<TableId, String>,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self {
            capabilities: CapabilitiesView::default(),
            overview: Overview::default(),
            frequency_warning: false,
            devices: Table::new(TableId::Devices),
            links: Table::new(TableId::Links),
            neighbors: Table::new(TableId::Neighbors),
            connections: TableRegion::new(TableId::Connections),
            versions: PanelRegion::default(),
            traceroute: TracerouteView::default(),
            node_directory: None,
            sort_keys: HashMap::new(),
        }
    }
}

impl Dashboard {
    pub fn table_mut(&mut self, id: TableId) -> &mut Table {
        match id {
            TableId::Devices => &mut self.devices,
            TableId::Links => &mut self.links,
            TableId::Neighbors => &mut self.neighbors,
            TableId::Connections => &mut self.connections.table,
            TableId::Traceroute => &mut self.traceroute.table,
        }
    }

    /// Sorts a rendered table and remembers the key for later rebuilds.
    pub fn sort_table(&mut self, id: TableId, key: &str) {
        self.sort_keys.insert(id, key.to_string());
        sort::sort_table(self.table_mut(id), key);
    }

    fn restore_sort(&mut self, id: TableId) {
        if let Some(key) = self.sort_keys.get(&id).cloned() {
            sort::sort_table(self.table_mut(id), &key);
        }
    }
}

/// Radio records keyed by device IPv4.
fn radio_records(status: &StatusPayload) -> HashMap<String, RadioRecord> {
    status
        .airosdata
        .iter()
        .filter_map(|(ip, entry)| {
            let wireless = entry.wireless.as_ref()?;
            Some((ip.clone(), RadioRecord::from_wireless(wireless)))
        })
        .collect()
}

/// Fetch orchestration for one node.
#[derive(Debug, Clone)]
pub struct Pipeline {
    client: EndpointClient,
    thresholds: OverlapThresholds,
}

impl Pipeline {
    pub fn new(client: EndpointClient, thresholds: OverlapThresholds) -> Self {
        Self { client, thresholds }
    }

    pub fn client(&self) -> &EndpointClient {
        &self.client
    }

    /// Full load: capabilities first, then status, node directory,
    /// connections and versions as independent concurrent branches.
    pub async fn load_all(&self, dashboard: &RwLock<Dashboard>) {
        self.load_capabilities(dashboard).await;
        tokio::join!(
            self.load_status(dashboard),
            self.load_node_directory(dashboard),
            self.load_connections(dashboard),
            self.load_versions(dashboard),
        );
    }

    /// Reachability probe. A failure is recorded but gates nothing.
    pub async fn load_capabilities(&self, dashboard: &RwLock<Dashboard>) {
        let view = match self
            .client
            .fetch_json::<Option<Capabilities>>(&Endpoint::Capabilities)
            .await
        {
            Ok(caps) => {
                let caps = caps.unwrap_or_default();
                CapabilitiesView {
                    reachable: true,
                    traceroute: caps.traceroute,
                    show_admin_link: caps.show_admin_link,
                    error: None,
                }
            }
            Err(e) => {
                warn!(endpoint = "capabilities", "Node not reachable: {}", e);
                CapabilitiesView {
                    error: Some(e.diagnostic()),
                    ..CapabilitiesView::default()
                }
            }
        };
        dashboard.write().await.capabilities = view;
    }

    /// Primary state. When the secondary routing protocol is on, its info text
    /// is fetched before anything from this branch is written.
    pub async fn load_status(&self, dashboard: &RwLock<Dashboard>) {
        debug!("Loading status");
        let status = match self.client.fetch_json::<Option<StatusPayload>>(&Endpoint::Status).await {
            Ok(status) => status.unwrap_or_default(),
            Err(e) => {
                warn!(endpoint = "status", "Status fetch failed: {}", e);
                dashboard.write().await.overview.error = Some(e.diagnostic());
                return;
            }
        };

        let mut overview = Overview::from_status(&status);
        if status.olsr2_on {
            overview.olsr2_info = match self.client.fetch_text(&Endpoint::Olsr2Info).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(endpoint = "olsr2", "Info fetch failed: {}", e);
                    e.diagnostic()
                }
            };
        }

        let radios = radio_records(&status);
        let frequency_warning = frequency::overlap_warning(
            status
                .devices
                .iter()
                .filter_map(|d| d.ipv4.as_deref().and_then(|ip| radios.get(ip))),
            self.thresholds,
        );
        if frequency_warning {
            info!("Frequency overlap detected on {}", overview.hostname);
        }

        let devices = render::devices_table(&status.devices, &radios);
        let links = render::links_table(&status.links);
        let neighbors = render::neighbors_table(&status.neighbors);
        let uplink = traceroute::from_uplink(&status.trace_to_uplink);

        let mut view = dashboard.write().await;
        view.overview = overview;
        view.frequency_warning = frequency_warning;
        view.devices = devices;
        view.links = links;
        view.neighbors = neighbors;
        for id in [TableId::Devices, TableId::Links, TableId::Neighbors] {
            view.restore_sort(id);
        }
        if !uplink.is_empty() && !view.traceroute.user_run {
            view.traceroute = TracerouteView {
                target: status.trace_target.clone().unwrap_or_default(),
                summary: format!(
                    "Traceroute to {}: {} hop(s)",
                    status.trace_target.as_deref().unwrap_or_default(),
                    uplink.len()
                ),
                raw: None,
                table: render::traceroute_table(&uplink),
                user_run: false,
            };
        }
    }

    /// Best-effort side lookup. Failures keep whatever directory was loaded
    /// before; consumers that already rendered pick it up next time.
    pub async fn load_node_directory(&self, dashboard: &RwLock<Dashboard>) {
        match self.client.fetch_json::<NodeDirectory>(&Endpoint::NodeDirectory).await {
            Ok(directory) => {
                debug!("Node directory loaded with {} names", directory.len());
                dashboard.write().await.node_directory = Some(directory);
            }
            Err(e) => warn!(endpoint = "nodedb", "Node directory unavailable: {}", e),
        }
    }

    /// Connections fetch+render. Consults the node directory as currently
    /// stored, without waiting for it.
    pub async fn load_connections(&self, dashboard: &RwLock<Dashboard>) {
        dashboard.write().await.connections.status = LOADING.to_string();

        let result = self
            .client
            .fetch_json::<Option<ConnectionsPayload>>(&Endpoint::Connections)
            .await;

        let mut view = dashboard.write().await;
        match result {
            Ok(payload) => {
                let ports = payload.map(|p| p.ports).unwrap_or_default();
                let table = render::connections_table(&ports, view.node_directory.as_ref());
                view.connections.table = table;
                view.restore_sort(TableId::Connections);
                view.connections.status.clear();
            }
            Err(e) => {
                warn!(endpoint = "connections", "Connections fetch failed: {}", e);
                view.connections.status = e.diagnostic();
            }
        }
    }

    /// Versions fetch+render.
    pub async fn load_versions(&self, dashboard: &RwLock<Dashboard>) {
        dashboard.write().await.versions.status = LOADING.to_string();

        let result = self.client.fetch_json::<Value>(&Endpoint::Versions).await;

        let mut view = dashboard.write().await;
        match result {
            Ok(versions) => {
                view.versions.panel = Some(render::versions_panel(&versions));
                view.versions.status.clear();
            }
            Err(e) => {
                warn!(endpoint = "versions", "Versions fetch failed: {}", e);
                view.versions.status = e.diagnostic();
            }
        }
    }

    /// On-demand traceroute. An empty target is rejected without fetching.
    pub async fn run_traceroute(&self, dashboard: &RwLock<Dashboard>, target: &str) {
        let target = target.trim();
        if target.is_empty() {
            dashboard.write().await.traceroute.summary = "Enter target for traceroute".to_string();
            return;
        }

        {
            let mut view = dashboard.write().await;
            view.traceroute.user_run = true;
            view.traceroute.target = target.to_string();
            view.traceroute.table.rows.clear();
            view.traceroute.summary = "Traceroute: running ...".to_string();
            view.traceroute.raw = Some("Running traceroute...".to_string());
        }

        let result = self
            .client
            .fetch_text(&Endpoint::Traceroute(target.to_string()))
            .await;

        let mut view = dashboard.write().await;
        match result {
            Ok(text) => view.traceroute = TracerouteView::from_output(target, text),
            Err(e) => {
                warn!(endpoint = "traceroute", host = %target, "Traceroute failed: {}", e);
                view.traceroute.raw = Some(e.diagnostic());
                view.traceroute.summary = "Traceroute: failed".to_string();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount(server: &MockServer, route: &str, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(response)
            .mount(server)
            .await;
    }

    async fn mount_json(server: &MockServer, route: &str, body: Value) {
        mount(server, route, ResponseTemplate::new(200).set_body_json(body)).await;
    }

    fn status_body() -> Value {
        json!({
            "hostname": "node-a",
            "ip": "10.1.0.1",
            "uptime": "12345",
            "uptime_str": "3 hours",
            "devices": [
                {"ipv4": "10.1.0.2", "hwaddr": "aa:aa", "hostname": "sector-1", "product": "LiteBeam"},
                {"ipv4": "10.1.0.3", "hwaddr": "bb:bb", "hostname": "sector-2", "product": "NanoStation"},
                {"ipv4": "10.1.0.4", "hwaddr": "cc:cc", "hostname": "switch", "product": "EdgeSwitch"},
            ],
            "airosdata": {
                "10.1.0.2": {"wireless": {"frequency": "5600 MHz", "chanbw": "240", "mode": "ap"}},
                "10.1.0.3": {"wireless": {"frequency": 5600, "chanbw": 240, "mode": "ap"}},
            },
            "default_route": {"hostname": "gw.mesh", "ip": "10.1.0.254", "dev": "eth0"},
            "links": [{"intf": "wlan0", "local": "10.1.0.1", "remote": "10.2.0.1", "lq": "1.000", "nlq": "0.900", "cost": "1.111"}],
            "olsr2_on": false,
            "admin_url": "https://10.1.0.1:8443/",
        })
    }

    async fn healthy_node() -> MockServer {
        let server = MockServer::start().await;
        mount_json(&server, "/capabilities", json!({"traceroute": true, "show_admin_link": true})).await;
        mount_json(&server, "/status", status_body()).await;
        mount_json(&server, "/nodedb.json", json!({"10.3.0.7": {"name": "kiosk"}})).await;
        mount_json(
            &server,
            "/connections.json",
            json!({"ports": [
                {"port": "10", "bridge": "br-lan", "macs": ["m1", "m2"], "ips": ["10.3.0.7", "10.3.0.8"]},
                {"port": "2", "macs": [], "ips": []},
            ]}),
        )
        .await;
        mount_json(&server, "/versions.json", json!({"hostname": "node-a", "firmware": "1.4"})).await;
        server
    }

    fn pipeline(server: &MockServer) -> Pipeline {
        Pipeline::new(
            EndpointClient::new(&server.uri()).unwrap(),
            OverlapThresholds::default(),
        )
    }

    #[tokio::test]
    async fn test_full_load_populates_every_region() {
        let server = healthy_node().await;
        let dashboard = RwLock::new(Dashboard::default());
        pipeline(&server).load_all(&dashboard).await;

        let view = dashboard.read().await;
        assert!(view.capabilities.reachable);
        assert!(view.capabilities.traceroute);
        assert_eq!(view.overview.hostname, "node-a");
        assert_eq!(view.overview.uptime, "3 hours");
        assert_eq!(view.overview.admin_url.as_deref(), Some("https://10.1.0.1:8443/"));
        let route = view.overview.default_route.as_ref().unwrap();
        assert_eq!(route.device, "eth0");

        assert_eq!(view.devices.rows.len(), 3);
        assert_eq!(view.devices.rows[0].cells[7].content(), "5600 MHz ap");
        // the switch has no radio record; its other fields still render
        let switch = &view.devices.rows[2];
        assert!(switch.cells[7].lines.is_empty());
        assert_eq!(switch.cells[1].content(), "switch");
        assert_eq!(switch.cells[2].content(), "EdgeSwitch");

        // two devices trigger the overlap, the flag is still a single banner
        assert!(view.frequency_warning);

        assert_eq!(view.links.rows.len(), 1);
        assert_eq!(view.connections.table.rows.len(), 2);
        assert!(view.connections.status.is_empty());
        let panel = view.versions.panel.as_ref().unwrap();
        assert_eq!(panel.entries[1].value, "1.4");
    }

    #[tokio::test]
    async fn test_secondary_protocol_info_fetched_only_when_enabled() {
        let server = MockServer::start().await;
        let mut status = status_body();
        status["olsr2_on"] = json!(true);
        mount_json(&server, "/status", status).await;
        Mock::given(method("GET"))
            .and(path("/olsr2"))
            .respond_with(ResponseTemplate::new(200).set_body_string("olsrd2 neighbors: 3"))
            .expect(1)
            .mount(&server)
            .await;

        let dashboard = RwLock::new(Dashboard::default());
        pipeline(&server).load_status(&dashboard).await;

        let view = dashboard.read().await;
        assert!(view.overview.olsr2_on);
        assert_eq!(view.overview.olsr2_info, "olsrd2 neighbors: 3");
        assert_eq!(view.devices.rows.len(), 3);
    }

    #[tokio::test]
    async fn test_secondary_protocol_info_skipped_when_disabled() {
        let server = MockServer::start().await;
        mount_json(&server, "/status", status_body()).await;
        Mock::given(method("GET"))
            .and(path("/olsr2"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dashboard = RwLock::new(Dashboard::default());
        pipeline(&server).load_status(&dashboard).await;
        assert!(dashboard.read().await.overview.olsr2_info.is_empty());
    }

    #[tokio::test]
    async fn test_failed_node_directory_does_not_block_connections() {
        let server = MockServer::start().await;
        mount(&server, "/nodedb.json", ResponseTemplate::new(500).set_body_string("no db")).await;
        mount_json(
            &server,
            "/connections.json",
            json!({"ports": [{"port": "1", "ips": ["10.3.0.7"]}]}),
        )
        .await;

        let dashboard = RwLock::new(Dashboard::default());
        let pipeline = pipeline(&server);
        pipeline.load_node_directory(&dashboard).await;
        pipeline.load_connections(&dashboard).await;

        let view = dashboard.read().await;
        assert!(view.node_directory.is_none());
        assert_eq!(view.connections.table.rows.len(), 1);
        assert_eq!(view.connections.table.rows[0].cells[3].content(), "10.3.0.7");
        assert!(view.connections.table.rows[0].cells[4].lines.is_empty());
    }

    #[tokio::test]
    async fn test_late_node_directory_is_used_by_next_connections_render() {
        let server = healthy_node().await;
        let dashboard = RwLock::new(Dashboard::default());
        let pipeline = pipeline(&server);

        pipeline.load_connections(&dashboard).await;
        assert!(dashboard.read().await.connections.table.rows[0].cells[4].lines.is_empty());

        pipeline.load_node_directory(&dashboard).await;
        pipeline.load_connections(&dashboard).await;
        let view = dashboard.read().await;
        assert_eq!(view.connections.table.rows[0].cells[4].lines, vec!["kiosk", ""]);
    }

    #[tokio::test]
    async fn test_http_error_is_shown_in_its_own_region_only() {
        let server = healthy_node().await;
        Mock::given(method("GET"))
            .and(path("/connections.json"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .with_priority(1)
            .mount(&server)
            .await;

        let dashboard = RwLock::new(Dashboard::default());
        pipeline(&server).load_all(&dashboard).await;

        let view = dashboard.read().await;
        assert!(view.connections.status.contains("500"));
        assert!(view.connections.status.contains("boom"));
        assert!(view.connections.table.rows.is_empty());
        assert_eq!(view.overview.hostname, "node-a");
        assert!(view.versions.status.is_empty());
        assert!(view.versions.panel.is_some());
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_replace_rows() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/connections.json",
            ResponseTemplate::new(200)
                .set_body_json(json!({"ports": [{"port": "1"}, {"port": "2"}]}))
                .set_delay(Duration::from_millis(100)),
        )
        .await;

        let dashboard = RwLock::new(Dashboard::default());
        let pipeline = pipeline(&server);
        tokio::join!(
            pipeline.load_connections(&dashboard),
            pipeline.load_connections(&dashboard),
        );
        pipeline.load_connections(&dashboard).await;

        let view = dashboard.read().await;
        assert_eq!(view.connections.table.rows.len(), 2);
        assert!(view.connections.status.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_node_degrades_every_region() {
        let dashboard = RwLock::new(Dashboard::default());
        let pipeline = Pipeline::new(
            EndpointClient::new("http://127.0.0.1:9").unwrap(),
            OverlapThresholds::default(),
        );
        pipeline.load_all(&dashboard).await;

        let view = dashboard.read().await;
        assert!(!view.capabilities.reachable);
        assert!(view.overview.error.as_deref().unwrap().starts_with("ERR: "));
        assert!(view.connections.status.starts_with("ERR: "));
        assert!(view.versions.status.starts_with("ERR: "));
        assert!(view.devices.rows.is_empty());
    }

    #[tokio::test]
    async fn test_non_list_records_render_empty_tables() {
        let server = MockServer::start().await;
        mount_json(&server, "/status", json!({"hostname": "node-b", "devices": "none", "links": 5})).await;
        mount_json(&server, "/connections.json", json!({"ports": {"eth0": {}}})).await;

        let dashboard = RwLock::new(Dashboard::default());
        let pipeline = pipeline(&server);
        pipeline.load_status(&dashboard).await;
        pipeline.load_connections(&dashboard).await;

        let view = dashboard.read().await;
        assert_eq!(view.overview.hostname, "node-b");
        assert!(view.devices.rows.is_empty());
        assert!(view.links.rows.is_empty());
        assert!(!view.frequency_warning);
        assert!(view.connections.table.rows.is_empty());
        assert!(view.connections.status.is_empty());
    }

    mod traceroute_branch {
        use super::*;

        #[tokio::test]
        async fn test_parsed_hops_replace_raw_output() {
            let server = MockServer::start().await;
            mount(
                &server,
                "/traceroute",
                ResponseTemplate::new(200).set_body_string("header\n1 hostA (10.0.0.1) 12ms\n"),
            )
            .await;

            let dashboard = RwLock::new(Dashboard::default());
            pipeline(&server).run_traceroute(&dashboard, " 10.0.0.1 ").await;

            let view = dashboard.read().await;
            assert_eq!(view.traceroute.target, "10.0.0.1");
            assert_eq!(view.traceroute.summary, "Traceroute: 1 hop(s)");
            assert!(view.traceroute.raw.is_none());
            assert_eq!(view.traceroute.table.rows.len(), 1);
        }

        #[tokio::test]
        async fn test_unparsed_output_stays_visible() {
            let server = MockServer::start().await;
            mount(
                &server,
                "/traceroute",
                ResponseTemplate::new(200).set_body_string("traceroute: unknown host nowhere"),
            )
            .await;

            let dashboard = RwLock::new(Dashboard::default());
            pipeline(&server).run_traceroute(&dashboard, "nowhere").await;

            let view = dashboard.read().await;
            assert!(view.traceroute.table.rows.is_empty());
            assert_eq!(view.traceroute.raw.as_deref(), Some("traceroute: unknown host nowhere"));
            assert!(view.traceroute.summary.starts_with("Traceroute: no hops parsed."));
        }

        #[tokio::test]
        async fn test_empty_target_does_not_fetch() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/traceroute"))
                .respond_with(ResponseTemplate::new(200))
                .expect(0)
                .mount(&server)
                .await;

            let dashboard = RwLock::new(Dashboard::default());
            pipeline(&server).run_traceroute(&dashboard, "   ").await;
            assert_eq!(
                dashboard.read().await.traceroute.summary,
                "Enter target for traceroute"
            );
        }

        #[tokio::test]
        async fn test_uplink_trace_from_status() {
            let server = MockServer::start().await;
            mount_json(
                &server,
                "/status",
                json!({
                    "trace_target": "8.8.8.8",
                    "trace_to_uplink": [
                        {"hop": 1, "ip": "10.1.0.254", "host": "gw.mesh", "ping": "1.2"},
                        {"hop": 2, "ip": "8.8.8.8", "hostname": "dns.google", "ping": "9.9"},
                    ],
                }),
            )
            .await;

            let dashboard = RwLock::new(Dashboard::default());
            pipeline(&server).load_status(&dashboard).await;

            let view = dashboard.read().await;
            assert_eq!(view.traceroute.summary, "Traceroute to 8.8.8.8: 2 hop(s)");
            assert_eq!(view.traceroute.table.rows[1].cells[2].content(), "dns.google");
            assert_eq!(view.traceroute.table.rows[1].cells[3].content(), "9.9ms");
        }

        #[tokio::test]
        async fn test_status_reload_keeps_operator_traceroute() {
            let server = MockServer::start().await;
            mount(
                &server,
                "/traceroute",
                ResponseTemplate::new(200).set_body_string("header\n1 one.one (1.1.1.1) 4ms\n"),
            )
            .await;
            mount_json(
                &server,
                "/status",
                json!({
                    "trace_target": "8.8.8.8",
                    "trace_to_uplink": [{"hop": 1, "ip": "8.8.8.8", "ping": "9.9"}],
                }),
            )
            .await;

            let dashboard = RwLock::new(Dashboard::default());
            let pipeline = pipeline(&server);
            pipeline.run_traceroute(&dashboard, "1.1.1.1").await;
            pipeline.load_status(&dashboard).await;

            let view = dashboard.read().await;
            assert_eq!(view.traceroute.target, "1.1.1.1");
            assert_eq!(view.traceroute.summary, "Traceroute: 1 hop(s)");
            assert_eq!(view.traceroute.table.rows[0].cells[1].content(), "1.1.1.1");
        }

        #[tokio::test]
        async fn test_failed_run_clears_previous_hops() {
            let server = MockServer::start().await;
            mount(
                &server,
                "/traceroute",
                ResponseTemplate::new(200).set_body_string("header\n1 gw (10.0.0.1) 1ms\n"),
            )
            .await;

            let dashboard = RwLock::new(Dashboard::default());
            pipeline(&server).run_traceroute(&dashboard, "10.0.0.1").await;
            assert_eq!(dashboard.read().await.traceroute.table.rows.len(), 1);

            let offline = Pipeline::new(
                EndpointClient::new("http://127.0.0.1:9").unwrap(),
                OverlapThresholds::default(),
            );
            offline.run_traceroute(&dashboard, "10.9.9.9").await;

            let view = dashboard.read().await;
            assert_eq!(view.traceroute.target, "10.9.9.9");
            assert_eq!(view.traceroute.summary, "Traceroute: failed");
            assert!(view.traceroute.table.rows.is_empty());
            assert!(view.traceroute.raw.as_deref().unwrap().starts_with("ERR: "));
        }
    }

    #[tokio::test]
    async fn test_reload_keeps_requested_sort_order() {
        let server = healthy_node().await;
        let dashboard = RwLock::new(Dashboard::default());
        let pipeline = pipeline(&server);

        pipeline.load_connections(&dashboard).await;
        dashboard.write().await.sort_table(TableId::Connections, "port");
        pipeline.load_connections(&dashboard).await;

        let view = dashboard.read().await;
        let ports: Vec<String> = view
            .connections
            .table
            .rows
            .iter()
            .map(|r| r.cells[0].content())
            .collect();
        assert_eq!(ports, vec!["2", "10"]);
    }
}
