//! services/api/src/web/dashboard.rs
//!
//! The metrics endpoint behind the dashboard and metrics pages.

use axum::{extract::State, response::Json, Extension};
use serde::Serialize;
use std::sync::Arc;
use study_assistant_core::domain::{QuizAttempt, RECENT_ACTIVITY_LIMIT};
use study_assistant_core::metrics::{
    dashboard, knowledge_gaps, progress, DashboardStats, ProgressPoint, TopicScore,
};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::rest::{port_error, HandlerError};
use crate::web::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct MetricsResponse {
    pub stats: DashboardStats,
    pub knowledge_gaps: Vec<TopicScore>,
    pub progress: Vec<ProgressPoint>,
    pub recent_activity: Vec<QuizAttempt>,
}

/// Aggregate the user's attempts into dashboard numbers and chart series.
#[utoipa::path(
    get,
    path = "/metrics",
    responses(
        (status = 200, description = "Dashboard metrics", body = MetricsResponse),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn metrics_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<MetricsResponse>, HandlerError> {
    let attempts = app_state
        .db
        .list_attempts(user_id)
        .await
        .map_err(port_error("Failed to load your metrics."))?;

    Ok(Json(MetricsResponse {
        stats: dashboard(&attempts),
        knowledge_gaps: knowledge_gaps(&attempts),
        progress: progress(&attempts),
        recent_activity: attempts.into_iter().take(RECENT_ACTIVITY_LIMIT).collect(),
    }))
}
