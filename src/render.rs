//! Table and panel renderers.
//!
//! Converts normalised records into row/cell structures that the templates
//! print verbatim. Rendering is pure: no fetching, no shared state.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::frequency::RadioRecord;
use crate::models::{Device, LinkRecord, Neighbor, NodeDirectory, Port};
use crate::traceroute::TracerouteHop;

/// Declared column: the data key used by sorting and the header label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Column {
    pub key: &'static str,
    pub label: &'static str,
}

const fn column(key: &'static str, label: &'static str) -> Column {
    Column { key, label }
}

const DEVICE_COLUMNS: &[Column] = &[
    column("ipv4", "Local IP"),
    column("hostname", "Hostname"),
    column("product", "Product"),
    column("uptime", "Uptime"),
    column("mode", "Mode"),
    column("essid", "ESSID"),
    column("firmware", "Firmware"),
    column("wireless", "Wireless"),
];

const LINK_COLUMNS: &[Column] = &[
    column("intf", "Interface"),
    column("local", "Local IP"),
    column("remote", "Remote IP"),
    column("remote_host", "Remote Host"),
    column("lq", "LQ"),
    column("nlq", "NLQ"),
    column("cost", "Cost"),
    column("routes", "Routes"),
    column("nodes", "Nodes"),
];

const NEIGHBOR_COLUMNS: &[Column] = &[
    column("originator", "Originator"),
    column("hostname", "Hostname"),
    column("bindto", "Bind To"),
    column("lq", "LQ"),
    column("nlq", "NLQ"),
    column("cost", "Cost"),
    column("metric", "Metric"),
];

const CONNECTION_COLUMNS: &[Column] = &[
    column("port", "Port"),
    column("bridge", "Bridge"),
    column("macs", "MACs"),
    column("ips", "IPs"),
    column("hostnames", "Hostnames"),
    column("notes", "Notes"),
];

const TRACEROUTE_COLUMNS: &[Column] = &[
    column("hop", "Hop"),
    column("ip", "IP"),
    column("hostname", "Hostname"),
    column("ping", "Ping"),
];

/// Identifies one of the rendered tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableId {
    Devices,
    Links,
    Neighbors,
    Connections,
    Traceroute,
}

impl TableId {
    pub fn as_str(self) -> &'static str {
        match self {
            TableId::Devices => "devices",
            TableId::Links => "links",
            TableId::Neighbors => "neighbors",
            TableId::Connections => "connections",
            TableId::Traceroute => "traceroute",
        }
    }

    pub fn columns(self) -> &'static [Column] {
        match self {
            TableId::Devices => DEVICE_COLUMNS,
            TableId::Links => LINK_COLUMNS,
            TableId::Neighbors => NEIGHBOR_COLUMNS,
            TableId::Connections => CONNECTION_COLUMNS,
            TableId::Traceroute => TRACEROUTE_COLUMNS,
        }
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTable(pub String);

impl FromStr for TableId {
    type Err = UnknownTable;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "devices" => Ok(TableId::Devices),
            "links" => Ok(TableId::Links),
            "neighbors" => Ok(TableId::Neighbors),
            "connections" => Ok(TableId::Connections),
            "traceroute" => Ok(TableId::Traceroute),
            other => Err(UnknownTable(other.to_string())),
        }
    }
}

/// One table cell. Multi-valued fields keep one entry per line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub lines: Vec<String>,
    /// Render each line as an `https://` link.
    pub link: bool,
}

impl Cell {
    fn text(value: Option<&str>) -> Self {
        Self {
            lines: value.map(|v| vec![v.to_string()]).unwrap_or_default(),
            link: false,
        }
    }

    fn lines(lines: Vec<String>) -> Self {
        Self { lines, link: false }
    }

    fn link(value: &str) -> Self {
        Self {
            link: true,
            ..Self::text(Some(value).filter(|v| !v.is_empty()))
        }
    }

    /// Trimmed text content, as used for sorting.
    pub fn content(&self) -> String {
        self.lines.join("\n").trim().to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Row {
    pub cells: Vec<Cell>,
}

/// A rendered table: declared columns plus rows in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    pub id: TableId,
    pub columns: &'static [Column],
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(id: TableId) -> Self {
        Self {
            id,
            columns: id.columns(),
            rows: Vec::new(),
        }
    }

    fn with_rows(id: TableId, rows: impl IntoIterator<Item = Row>) -> Self {
        let mut table = Self::new(id);
        table.replace_rows(rows);
        table
    }

    /// Clears all rows, then appends the new ones in order.
    pub fn replace_rows(&mut self, rows: impl IntoIterator<Item = Row>) {
        self.rows.clear();
        self.rows.extend(rows);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Devices table. A device without a radio record gets an empty wireless cell.
pub fn devices_table(devices: &[Device], radios: &HashMap<String, RadioRecord>) -> Table {
    Table::with_rows(
        TableId::Devices,
        devices.iter().map(|d| {
            let local = [d.ipv4.as_deref(), d.hwaddr.as_deref()]
                .into_iter()
                .map(|v| v.unwrap_or_default().to_string())
                .collect();
            let wireless = d
                .ipv4
                .as_deref()
                .and_then(|ip| radios.get(ip))
                .map(RadioRecord::summary)
                .filter(|s| !s.is_empty());
            Row {
                cells: vec![
                    Cell::lines(local),
                    Cell::text(d.hostname.as_deref()),
                    Cell::text(d.product.as_deref()),
                    Cell::text(d.uptime.as_deref()),
                    Cell::text(d.mode.as_deref()),
                    Cell::text(d.essid.as_deref()),
                    Cell::text(d.firmware.as_deref()),
                    Cell::text(wireless.as_deref()),
                ],
            }
        }),
    )
}

pub fn links_table(links: &[LinkRecord]) -> Table {
    Table::with_rows(
        TableId::Links,
        links.iter().map(|l| Row {
            cells: vec![
                Cell::text(l.interface.as_deref()),
                Cell::text(l.local_addr.as_deref()),
                Cell::text(l.remote_addr.as_deref()),
                Cell::text(l.remote_host.as_deref()),
                Cell::text(l.link_quality.as_deref()),
                Cell::text(l.neighbor_link_quality.as_deref()),
                Cell::text(l.cost.as_deref()),
                Cell::text(l.routes.as_deref()),
                Cell::text(l.nodes.as_deref()),
            ],
        }),
    )
}

pub fn neighbors_table(neighbors: &[Neighbor]) -> Table {
    Table::with_rows(
        TableId::Neighbors,
        neighbors.iter().map(|n| Row {
            cells: vec![
                Cell::text(n.originator.as_deref()),
                Cell::text(n.hostname.as_deref()),
                Cell::text(n.bindto.as_deref()),
                Cell::text(n.lq.as_deref()),
                Cell::text(n.nlq.as_deref()),
                Cell::text(n.cost.as_deref()),
                Cell::text(n.metric.as_deref()),
            ],
        }),
    )
}

/// Resolves each IP through the node directory, keeping one line per IP so
/// hostnames line up with the IP column. Empty when nothing resolves.
fn resolve_hostnames(ips: &[String], directory: Option<&NodeDirectory>) -> Vec<String> {
    let Some(directory) = directory else {
        return Vec::new();
    };
    let names: Vec<Option<&str>> = ips.iter().map(|ip| directory.name(ip)).collect();
    if names.iter().all(Option::is_none) {
        return Vec::new();
    }
    names
        .into_iter()
        .map(|name| name.unwrap_or_default().to_string())
        .collect()
}

/// Connections table; the hostnames column is joined from the directory when
/// it is available and left empty otherwise.
pub fn connections_table(ports: &[Port], directory: Option<&NodeDirectory>) -> Table {
    Table::with_rows(
        TableId::Connections,
        ports.iter().map(|p| Row {
            cells: vec![
                Cell::text(p.port.as_deref()),
                Cell::text(p.bridge.as_deref()),
                Cell::lines(p.macs.clone()),
                Cell::lines(p.ips.clone()),
                Cell::lines(resolve_hostnames(&p.ips, directory)),
                Cell::text(p.notes.as_deref()),
            ],
        }),
    )
}

pub fn traceroute_table(hops: &[TracerouteHop]) -> Table {
    Table::with_rows(
        TableId::Traceroute,
        hops.iter().map(|h| Row {
            cells: vec![
                Cell::text(Some(h.hop.as_str()).filter(|v| !v.is_empty())),
                Cell::link(&h.ip),
                Cell::link(&h.hostname),
                Cell::text(Some(h.ping.as_str()).filter(|v| !v.is_empty())),
            ],
        }),
    )
}

/// Keys shown first in the versions panel, with their labels.
const PREFERRED_VERSION_KEYS: &[(&str, &str)] = &[
    ("hostname", "Hostname"),
    ("firmware", "Firmware"),
    ("kernel", "Kernel"),
    ("model", "Model"),
    ("autoupdate", "AutoUpdate"),
    ("wizards", "Wizards"),
    ("local_ips", "Local IPs"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelEntry {
    pub label: String,
    pub value: String,
}

/// Summary block for a flat key/value record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Panel {
    pub entries: Vec<PanelEntry>,
    /// Pretty-printed payload for inspection.
    pub raw: Option<String>,
    /// Shown instead of entries when there is no data at all.
    pub note: Option<String>,
}

fn panel_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Versions panel: preferred keys first, remaining keys sorted, then the
/// whole payload dumped verbatim.
pub fn versions_panel(versions: &Value) -> Panel {
    if versions.is_null() {
        return Panel {
            note: Some("No versions data".to_string()),
            ..Panel::default()
        };
    }

    let mut entries = Vec::new();
    if let Some(fields) = versions.as_object() {
        for (key, label) in PREFERRED_VERSION_KEYS {
            if let Some(value) = fields.get(*key) {
                entries.push(PanelEntry {
                    label: label.to_string(),
                    value: panel_value(value),
                });
            }
        }

        let mut rest: Vec<&String> = fields
            .keys()
            .filter(|k| !PREFERRED_VERSION_KEYS.iter().any(|(p, _)| *p == k.as_str()))
            .collect();
        rest.sort();
        entries.extend(rest.into_iter().map(|key| PanelEntry {
            label: key.clone(),
            value: panel_value(&fields[key.as_str()]),
        }));
    }

    Panel {
        entries,
        raw: serde_json::to_string_pretty(versions).ok(),
        note: None,
    }
}
