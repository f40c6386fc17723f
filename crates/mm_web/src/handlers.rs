use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use mm_core::{Error, PendingArticle, RunStats};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub url: String,
    pub submitted_by: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub article: PendingArticle,
}

#[derive(Debug, Deserialize)]
pub struct PasteRequest {
    pub content: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct MediaReportRequest {
    #[serde(default)]
    pub pasted_content: Option<String>,
    #[serde(default)]
    pub recipient_email: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct HansardReportRequest {
    #[serde(default)]
    pub recipient_email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub success: bool,
    pub message: String,
    pub report_id: String,
    pub stats: RunStats,
}

pub async fn submit_article(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let submitted_by = req.submitted_by.trim();
    if submitted_by.is_empty() {
        return Err(Error::Validation("submitted_by must not be empty".to_string()).into());
    }

    let article = state.store.submit(&req.url, submitted_by).await?;
    info!(url = %article.url, by = %article.submitted_by, "article submitted");
    Ok(Json(SubmitResponse {
        success: true,
        article,
    }))
}

pub async fn list_pending(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PendingArticle>>, ApiError> {
    Ok(Json(state.store.list_pending().await?))
}

pub async fn paste_content(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<PasteRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    if req.content.trim().is_empty() {
        return Err(Error::Validation("content must not be empty".to_string()).into());
    }
    let article = state.store.set_pasted_text(id, &req.content).await?;
    Ok(Json(SubmitResponse {
        success: true,
        article,
    }))
}

pub async fn remove_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state.store.remove(id).await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn trigger_media_report(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MediaReportRequest>,
) -> Result<Json<ReportResponse>, ApiError> {
    let outcome = state
        .reports
        .generate_media_report(req.pasted_content, req.recipient_email)
        .await?;
    Ok(Json(ReportResponse {
        success: true,
        message: "report generated and delivered".to_string(),
        report_id: outcome.report_id,
        stats: outcome.stats,
    }))
}

pub async fn trigger_hansard_report(
    State(state): State<Arc<AppState>>,
    Json(req): Json<HansardReportRequest>,
) -> Result<Json<ReportResponse>, ApiError> {
    let outcome = state
        .reports
        .generate_hansard_report(req.recipient_email)
        .await?;
    Ok(Json(ReportResponse {
        success: true,
        message: "briefing generated and delivered".to_string(),
        report_id: outcome.report_id,
        stats: outcome.stats,
    }))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let database = state.store.health().await.is_ok();
    let webhook = match &state.webhook_url {
        Some(raw) => url::Url::parse(raw).is_ok(),
        None => true,
    };
    Json(json!({
        "status": if database && webhook { "ok" } else { "degraded" },
        "database": database,
        "webhook_configured": webhook,
    }))
}
