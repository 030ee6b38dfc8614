//! Endpoint client - performs single fetches against the node's status API.

use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::FetchError;

/// Logical endpoints exposed by the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Capabilities,
    Status,
    Olsr2Info,
    NodeDirectory,
    Connections,
    Versions,
    /// On-demand traceroute towards the given target.
    Traceroute(String),
}

/// What an endpoint answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Json,
    Text,
}

impl Endpoint {
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Capabilities => "capabilities",
            Endpoint::Status => "status",
            Endpoint::Olsr2Info => "olsr2",
            Endpoint::NodeDirectory => "nodedb",
            Endpoint::Connections => "connections",
            Endpoint::Versions => "versions",
            Endpoint::Traceroute(_) => "traceroute",
        }
    }

    /// Looks an endpoint up by [`name`](Self::name). Traceroute needs a target.
    pub fn from_name(name: &str, target: Option<&str>) -> Option<Self> {
        match name {
            "capabilities" => Some(Endpoint::Capabilities),
            "status" => Some(Endpoint::Status),
            "olsr2" => Some(Endpoint::Olsr2Info),
            "nodedb" => Some(Endpoint::NodeDirectory),
            "connections" => Some(Endpoint::Connections),
            "versions" => Some(Endpoint::Versions),
            "traceroute" => target.map(|t| Endpoint::Traceroute(t.to_string())),
            _ => None,
        }
    }

    /// Path relative to the node's base URL.
    fn path(&self) -> &'static str {
        match self {
            Endpoint::Capabilities => "capabilities",
            Endpoint::Status => "status",
            Endpoint::Olsr2Info => "olsr2",
            Endpoint::NodeDirectory => "nodedb.json",
            Endpoint::Connections => "connections.json",
            Endpoint::Versions => "versions.json",
            Endpoint::Traceroute(_) => "traceroute",
        }
    }

    pub fn kind(&self) -> PayloadKind {
        match self {
            Endpoint::Olsr2Info | Endpoint::Traceroute(_) => PayloadKind::Text,
            _ => PayloadKind::Json,
        }
    }
}

/// Parsed content of a successful fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

/// HTTP client bound to one node.
#[derive(Debug, Clone)]
pub struct EndpointClient {
    client: reqwest::Client,
    base: Url,
}

impl EndpointClient {
    /// Creates a client for the node at `base_url`.
    ///
    /// A missing trailing slash is added so endpoint paths resolve below any
    /// path prefix of the base URL.
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("meshstatus/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, endpoint: &Endpoint) -> Url {
        let mut url = self.base.clone();
        url.set_path(&format!("{}{}", self.base.path(), endpoint.path()));
        if let Endpoint::Traceroute(target) = endpoint {
            url.query_pairs_mut().append_pair("target", target);
        }
        url
    }

    async fn get(&self, endpoint: &Endpoint) -> Result<(StatusCode, String), FetchError> {
        let url = self.url(endpoint);
        debug!(endpoint = endpoint.name(), %url, "Fetching");

        let response = self
            .client
            .get(url)
            .header(CACHE_CONTROL, "no-store")
            .header(PRAGMA, "no-cache")
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }

    /// Fetches one endpoint, decoding according to its [`PayloadKind`].
    pub async fn fetch(&self, endpoint: &Endpoint) -> Result<Payload, FetchError> {
        match endpoint.kind() {
            PayloadKind::Json => self.fetch_json::<Value>(endpoint).await.map(Payload::Json),
            PayloadKind::Text => self.fetch_text(endpoint).await.map(Payload::Text),
        }
    }

    /// Fetches a JSON endpoint and deserializes it into `T`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` for statuses >= 400, `FetchError::Parse` if
    /// the body does not decode, and `FetchError::Transport` if no response
    /// arrived.
    pub async fn fetch_json<T: DeserializeOwned>(&self, endpoint: &Endpoint) -> Result<T, FetchError> {
        let (status, body) = self.get(endpoint).await?;
        if !status.is_success() {
            return Err(FetchError::Http { status, body });
        }
        serde_json::from_str(&body).map_err(|source| FetchError::Parse { source, raw: body })
    }

    /// Fetches a text endpoint. Non-success statuses are still delivered as
    /// text (status line followed by the body).
    pub async fn fetch_text(&self, endpoint: &Endpoint) -> Result<String, FetchError> {
        let (status, body) = self.get(endpoint).await?;
        if status.is_success() {
            Ok(body)
        } else {
            Ok(FetchError::Http { status, body }.to_string())
        }
    }
}
