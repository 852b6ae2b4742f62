use std::path::Path;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::services::ServeDir;

use zakupy::{BudgetGroup, DateRange, Purchase, Summary, Tracker};

use crate::error::ServerError;

#[derive(Clone)]
pub(crate) struct AppState {
    pub tracker: Tracker,
}

#[derive(Serialize)]
pub(crate) struct Envelope<T> {
    message: &'static str,
    data: T,
}

fn envelope<T>(message: &'static str, data: T) -> Json<Envelope<T>> {
    Json(Envelope { message, data })
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RangeQuery {
    from: Option<String>,
    to: Option<String>,
}

impl RangeQuery {
    fn range(&self) -> Result<DateRange, ServerError> {
        Ok(DateRange::parse(self.from.as_deref(), self.to.as_deref())?)
    }
}

fn payload(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ServerError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ServerError::BadRequest(rejection.body_text()))
}

async fn health() -> Json<Value> {
    Json(json!({ "ok": true, "status": "up" }))
}

async fn list_purchases(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Envelope<Vec<Purchase>>>, ServerError> {
    let purchases = state.tracker.list_purchases(&query.range()?).await
        .map_err(ServerError::tracker("failed to list purchases"))?;
    Ok(envelope("purchases listed", purchases))
}

async fn create_purchase(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<Purchase>>), ServerError> {
    let purchase = state.tracker.append_purchase(&payload(body)?).await
        .map_err(ServerError::tracker("failed to create purchase"))?;
    Ok((StatusCode::CREATED, envelope("purchase created", purchase)))
}

async fn list_budget_groups(
    State(state): State<AppState>,
) -> Result<Json<Envelope<Vec<BudgetGroup>>>, ServerError> {
    let groups = state.tracker.list_budget_groups().await
        .map_err(ServerError::tracker("failed to list budget groups"))?;
    Ok(envelope("budget groups listed", groups))
}

async fn create_budget_group(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<BudgetGroup>>), ServerError> {
    let group = state.tracker.append_budget_group(&payload(body)?).await
        .map_err(ServerError::tracker("failed to create budget group"))?;
    Ok((StatusCode::CREATED, envelope("budget group created", group)))
}

async fn summary(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Envelope<Summary>>, ServerError> {
    let summary = state.tracker.summary(&query.range()?).await
        .map_err(ServerError::tracker("failed to summarize purchases"))?;
    Ok(envelope("summary computed", summary))
}

pub(crate) fn router(state: AppState, static_dir: Option<&Path>) -> Router {
    let router = Router::new()
        .route("/_health", get(health))
        .route("/api/zakupy", get(list_purchases).post(create_purchase))
        .route("/api/grupy", get(list_budget_groups).post(create_budget_group))
        .route("/api/statystyki", get(summary))
        .with_state(state);

    match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    }
}
