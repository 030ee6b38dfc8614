//! Tab bar state: which tabs are visible and which one is active.

use serde::Serialize;

use crate::dashboard::Dashboard;
use crate::render::TableId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    Status,
    Olsr,
    Neighbors,
    Olsr2,
    Connections,
    Versions,
    Traceroute,
    Admin,
}

impl Tab {
    pub const ALL: [Tab; 8] = [
        Tab::Status,
        Tab::Olsr,
        Tab::Neighbors,
        Tab::Olsr2,
        Tab::Connections,
        Tab::Versions,
        Tab::Traceroute,
        Tab::Admin,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Tab::Status => "status",
            Tab::Olsr => "olsr",
            Tab::Neighbors => "neighbors",
            Tab::Olsr2 => "olsr2",
            Tab::Connections => "connections",
            Tab::Versions => "versions",
            Tab::Traceroute => "traceroute",
            Tab::Admin => "admin",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tab::Status => "Status",
            Tab::Olsr => "OLSR Links",
            Tab::Neighbors => "Neighbors",
            Tab::Olsr2 => "OLSRv2",
            Tab::Connections => "Connections",
            Tab::Versions => "Versions",
            Tab::Traceroute => "Traceroute",
            Tab::Admin => "Admin",
        }
    }

    pub fn from_id(id: &str) -> Option<Tab> {
        Tab::ALL.into_iter().find(|tab| tab.id() == id)
    }

    /// Tab that hosts the given table.
    pub fn for_table(id: TableId) -> Tab {
        match id {
            TableId::Devices => Tab::Status,
            TableId::Links => Tab::Olsr,
            TableId::Neighbors => Tab::Neighbors,
            TableId::Connections => Tab::Connections,
            TableId::Traceroute => Tab::Traceroute,
        }
    }

    fn is_visible(self, dashboard: &Dashboard) -> bool {
        match self {
            Tab::Status | Tab::Connections | Tab::Versions => true,
            Tab::Olsr => !dashboard.links.is_empty(),
            Tab::Neighbors => !dashboard.neighbors.is_empty(),
            Tab::Olsr2 => dashboard.overview.olsr2_on,
            Tab::Traceroute => {
                dashboard.capabilities.traceroute || !dashboard.traceroute.table.is_empty()
            }
            Tab::Admin => {
                dashboard.capabilities.show_admin_link && dashboard.overview.admin_url.is_some()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabLink {
    pub id: &'static str,
    pub label: &'static str,
    pub active: bool,
}

/// Resolves the requested tab; hidden or unknown tabs fall back to status.
pub fn active_tab(dashboard: &Dashboard, requested: Option<&str>) -> Tab {
    requested
        .and_then(Tab::from_id)
        .filter(|tab| tab.is_visible(dashboard))
        .unwrap_or(Tab::Status)
}

/// Visible tabs in display order, with the active one marked.
pub fn tab_bar(dashboard: &Dashboard, active: Tab) -> Vec<TabLink> {
    Tab::ALL
        .into_iter()
        .filter(|tab| tab.is_visible(dashboard))
        .map(|tab| TabLink {
            id: tab.id(),
            label: tab.label(),
            active: tab == active,
        })
        .collect()
}
