use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use axum_extra::extract::Query;
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::aggregate::{self, Cadence, Selection};
use crate::dataset::DatasetLoader;
use crate::dimensions::{self, Grouping};
use crate::error::{DashboardError, DashboardResult};
use crate::models::OrgTable;
use crate::report;

pub struct AppState {
    pub loader: DatasetLoader,
}

/// Sidebar choices as they arrive in the query string.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub grouping: Grouping,
    pub option: Option<String>,
    #[serde(default)]
    pub cadence: Cadence,
}

impl DashboardQuery {
    pub fn selection(&self) -> DashboardResult<Selection> {
        if let Some(name) = self.option.as_deref() {
            if dimensions::find(name).is_none() {
                return Err(DashboardError::UnknownDimension(name.to_string()));
            }
        }
        Ok(Selection {
            survey_types: self.types.iter().cloned().collect(),
            dimension: self.grouping.option(self.option.as_deref()),
            cadence: self.cadence,
        })
    }
}

pub struct AppError(DashboardError);

impl From<DashboardError> for AppError {
    fn from(err: DashboardError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DashboardError::UnknownDimension(_) => StatusCode::BAD_REQUEST,
            DashboardError::NotFound(_) => StatusCode::NOT_FOUND,
            DashboardError::Authentication(_) | DashboardError::Network(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::error!(%status, error = %self.0, "request failed");
        let body = format!(
            "<!DOCTYPE html><html><body><h1>{}</h1><p>{}</p></body></html>",
            status,
            report::escape_html(&self.0.to_string())
        );
        (status, Html(body)).into_response()
    }
}

async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Html<String>, AppError> {
    let selection = query.selection()?;
    let dataset = state.loader.load().await?;
    Ok(Html(report::build_page(&dataset, &selection)?))
}

async fn series(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let selection = query.selection()?;
    let dataset = state.loader.load().await?;
    match aggregate::aggregate(&dataset.surveys, &selection) {
        Ok(series) => {
            let correlation = selection
                .dimension
                .is_aggregate
                .then(|| aggregate::correlation(&series));
            Ok(Json(serde_json::json!({
                "insufficient": false,
                "series": series,
                "trend": aggregate::trend_line(&series),
                "correlation": correlation,
            })))
        }
        Err(DashboardError::EmptySelection) => Ok(Json(serde_json::json!({ "insufficient": true }))),
        Err(err) => Err(err.into()),
    }
}

async fn org(State(state): State<Arc<AppState>>) -> Result<Json<OrgTable>, AppError> {
    let dataset = state.loader.load().await?;
    Ok(Json(dataset.orgs))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/api/series", get(series))
        .route("/api/org", get(org))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(loader: DatasetLoader, bind: SocketAddr) -> anyhow::Result<()> {
    let app = router(Arc::new(AppState { loader }));
    let listener = TcpListener::bind(bind).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
