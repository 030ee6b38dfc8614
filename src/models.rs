//! Data models for the payloads served by the node.
//!
//! The node's JSON is loosely typed: numbers arrive as strings and vice versa,
//! record lists may be missing or not lists at all. The `lenient_*`
//! deserializers below absorb that so a single odd field never fails a whole
//! payload.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Renders a JSON scalar as cell text. Falsy values (`null`, `false`, `0`,
/// `""`) yield `None` so they show up as empty cells.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some("true".to_string()),
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Array(_) | Value::Object(_) => true,
        scalar => value_text(scalar).is_some(),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_text(&value))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_text(deserializer)?.unwrap_or_default())
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(is_truthy(&value))
}

/// Keeps list positions intact: a falsy entry becomes an empty string so
/// parallel lists (MACs and IPs) stay aligned.
fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .iter()
            .map(|item| value_text(item).unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_map<'de, D, T>(deserializer: D) -> Result<HashMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Object(entries) => entries
            .into_iter()
            .filter_map(|(key, item)| serde_json::from_value(item).ok().map(|v| (key, v)))
            .collect(),
        _ => HashMap::new(),
    })
}

/// `/capabilities` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    #[serde(deserialize_with = "lenient_flag")]
    pub traceroute: bool,
    #[serde(deserialize_with = "lenient_flag")]
    pub show_admin_link: bool,
}

/// `/status` response: the node's primary state.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StatusPayload {
    #[serde(deserialize_with = "lenient_text")]
    pub hostname: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub ip: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub uptime: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub uptime_str: Option<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub devices: Vec<Device>,
    #[serde(deserialize_with = "lenient_map")]
    pub airosdata: HashMap<String, AirosEntry>,
    #[serde(deserialize_with = "lenient_route")]
    pub default_route: RouteSummary,
    #[serde(deserialize_with = "lenient_list")]
    pub links: Vec<LinkRecord>,
    #[serde(deserialize_with = "lenient_list")]
    pub neighbors: Vec<Neighbor>,
    #[serde(deserialize_with = "lenient_flag")]
    pub olsr2_on: bool,
    #[serde(deserialize_with = "lenient_text")]
    pub admin_url: Option<String>,
    pub admin: Value,
    #[serde(deserialize_with = "lenient_list")]
    pub trace_to_uplink: Vec<UplinkHop>,
    #[serde(deserialize_with = "lenient_text")]
    pub trace_target: Option<String>,
}

impl StatusPayload {
    /// `admin.url` takes precedence over the older top-level `admin_url`.
    pub fn admin_url(&self) -> Option<String> {
        self.admin
            .get("url")
            .and_then(value_text)
            .or_else(|| self.admin_url.clone())
    }

    /// Human-friendly uptime when the node provides one.
    pub fn uptime(&self) -> Option<&str> {
        self.uptime_str.as_deref().or(self.uptime.as_deref())
    }
}

/// A device discovered on the node's local segment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Device {
    #[serde(deserialize_with = "lenient_text")]
    pub ipv4: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub hwaddr: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub hostname: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub product: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub uptime: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub mode: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub essid: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub firmware: Option<String>,
}

/// Entry of `status.airosdata`, keyed by device IPv4.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AirosEntry {
    pub wireless: Option<Wireless>,
}

/// Raw wireless block; frequency and width are strings like `"5500 MHz"` or
/// plain numbers depending on firmware.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Wireless {
    pub frequency: Option<Value>,
    pub chanbw: Option<Value>,
    #[serde(deserialize_with = "lenient_text")]
    pub mode: Option<String>,
}

/// OLSR link as reported in `status.links`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LinkRecord {
    #[serde(rename = "intf", deserialize_with = "lenient_text")]
    pub interface: Option<String>,
    #[serde(rename = "local", deserialize_with = "lenient_text")]
    pub local_addr: Option<String>,
    #[serde(rename = "remote", deserialize_with = "lenient_text")]
    pub remote_addr: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub remote_host: Option<String>,
    #[serde(rename = "lq", deserialize_with = "lenient_text")]
    pub link_quality: Option<String>,
    #[serde(rename = "nlq", deserialize_with = "lenient_text")]
    pub neighbor_link_quality: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub cost: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub routes: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub nodes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Neighbor {
    #[serde(deserialize_with = "lenient_text")]
    pub originator: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub hostname: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub bindto: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub lq: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub nlq: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub cost: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub metric: Option<String>,
}

/// Pre-computed hop of the node's own traceroute towards its uplink.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UplinkHop {
    #[serde(deserialize_with = "lenient_string")]
    pub hop: String,
    #[serde(deserialize_with = "lenient_string")]
    pub ip: String,
    #[serde(deserialize_with = "lenient_text")]
    pub host: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub hostname: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub ping: String,
}

/// Default route descriptor. Empty strings mean the field is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteSummary {
    #[serde(deserialize_with = "lenient_string")]
    pub hostname: String,
    #[serde(deserialize_with = "lenient_string")]
    pub ip: String,
    #[serde(rename(deserialize = "dev"), deserialize_with = "lenient_string")]
    pub device: String,
}

impl RouteSummary {
    pub fn is_available(&self) -> bool {
        !(self.hostname.is_empty() && self.ip.is_empty() && self.device.is_empty())
    }
}

fn lenient_route<'de, D>(deserializer: D) -> Result<RouteSummary, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// `/connections.json` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConnectionsPayload {
    #[serde(deserialize_with = "lenient_list")]
    pub ports: Vec<Port>,
}

/// A bridge port and the hosts learned behind it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Port {
    #[serde(deserialize_with = "lenient_text")]
    pub port: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub bridge: Option<String>,
    #[serde(deserialize_with = "lenient_strings")]
    pub macs: Vec<String>,
    #[serde(deserialize_with = "lenient_strings")]
    pub ips: Vec<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub notes: Option<String>,
}

/// `/nodedb.json`: IP address to friendly node name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "Value")]
pub struct NodeDirectory {
    names: HashMap<String, String>,
}

impl From<Value> for NodeDirectory {
    fn from(value: Value) -> Self {
        let names = match value {
            Value::Object(entries) => entries
                .into_iter()
                .filter_map(|(ip, entry)| {
                    let name = entry.get("name").and_then(value_text)?;
                    Some((ip, name))
                })
                .collect(),
            _ => HashMap::new(),
        };
        Self { names }
    }
}

impl NodeDirectory {
    pub fn name(&self, ip: &str) -> Option<&str> {
        self.names.get(ip).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}
