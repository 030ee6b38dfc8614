use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tera::Context;
use tracing::{debug, error, info, warn};

use crate::render::{TableId, UnknownTable};
use crate::state::AppState;
use crate::tabs::{self, Tab};

/// Query parameters for the dashboard page.
#[derive(Debug, Deserialize)]
pub struct TabQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub tab: Option<String>,
}

/// Query parameters for the traceroute action.
#[derive(Debug, Deserialize)]
pub struct TracerouteQuery {
    #[serde(default)]
    pub target: String,
}

/// Query parameters for sorting a table.
#[derive(Debug, Deserialize)]
pub struct SortQuery {
    #[serde(default)]
    pub key: String,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => Ok(Some(s)),
    }
}

fn render_template(
    tera: &tera::Tera,
    template: &str,
    context: &Context,
) -> Result<Html<String>, (StatusCode, &'static str)> {
    tera.render(template, context).map(Html).map_err(|e| {
        error!("Template render error for '{}': {}", template, e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Render error")
    })
}

fn back_to(tab: Tab) -> Redirect {
    Redirect::to(&format!("/?tab={}", tab.id()))
}

/// Builds the dashboard router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/refresh", post(refresh_all))
        .route("/refresh/connections", post(refresh_connections))
        .route("/refresh/versions", post(refresh_versions))
        .route("/traceroute", get(run_traceroute))
        .route("/tables/{table}/sort", get(sort_table))
        .route("/api/dashboard", get(api_dashboard))
        .with_state(state)
}

/// GET / - Dashboard with the requested tab active.
pub async fn index(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TabQuery>,
) -> impl IntoResponse {
    let dashboard = state.dashboard.read().await;
    let active = tabs::active_tab(&dashboard, query.tab.as_deref());

    let mut context = Context::new();
    context.insert("dashboard", &*dashboard);
    context.insert("tabs", &tabs::tab_bar(&dashboard, active));
    context.insert("active", active.id());
    drop(dashboard);

    render_template(&state.tera, "dashboard.html", &context)
}

/// POST /refresh - Re-run the whole pipeline.
pub async fn refresh_all(State(state): State<Arc<AppState>>) -> Redirect {
    info!("Manual dashboard refresh");
    state.pipeline.load_all(&state.dashboard).await;
    Redirect::to("/")
}

/// POST /refresh/connections
pub async fn refresh_connections(State(state): State<Arc<AppState>>) -> Redirect {
    state.pipeline.load_connections(&state.dashboard).await;
    back_to(Tab::Connections)
}

/// POST /refresh/versions
pub async fn refresh_versions(State(state): State<Arc<AppState>>) -> Redirect {
    state.pipeline.load_versions(&state.dashboard).await;
    back_to(Tab::Versions)
}

/// GET /traceroute?target= - Run a traceroute and show its result.
pub async fn run_traceroute(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TracerouteQuery>,
) -> Redirect {
    state
        .pipeline
        .run_traceroute(&state.dashboard, &query.target)
        .await;
    back_to(Tab::Traceroute)
}

/// GET /tables/{table}/sort?key= - Reorder the rendered rows, no re-fetch.
pub async fn sort_table(
    State(state): State<Arc<AppState>>,
    Path(table): Path<String>,
    Query(query): Query<SortQuery>,
) -> Response {
    let id = match table.parse::<TableId>() {
        Ok(id) => id,
        Err(UnknownTable(name)) => {
            warn!("Sort requested for unknown table '{}'", name);
            return (StatusCode::NOT_FOUND, "Unknown table").into_response();
        }
    };
    debug!("Sorting {} by '{}'", id, query.key);

    let mut dashboard = state.dashboard.write().await;
    dashboard.sort_table(id, &query.key);
    drop(dashboard);

    back_to(Tab::for_table(id)).into_response()
}

/// GET /api/dashboard - The consolidated view model as JSON.
pub async fn api_dashboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let dashboard = state.dashboard.read().await;
    Json(dashboard.clone())
}
