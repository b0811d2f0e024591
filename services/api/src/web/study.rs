//! services/api/src/web/study.rs
//!
//! Handlers for the study hub: content summaries, topic retrieval, study plans,
//! and the agent orchestration that turns a bare topic into a saved quiz.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use study_assistant_core::domain::{Difficulty, NewQuiz, Quiz, Summary};
use study_assistant_core::metrics::{dashboard, weakest_topics, KNOWLEDGE_GAP_THRESHOLD};
use study_assistant_core::pipeline::{AgentMessage, Orchestration, OrchestrationStep};
use study_assistant_core::ports::StudyPlanRequest;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::rest::{port_error, required, HandlerError};
use crate::web::state::AppState;

const DEFAULT_SUMMARY_TOPIC: &str = "General";

//=========================================================================================
// Payloads
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SummarizeRequest {
    pub content: String,
    pub topic: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct RetrieveRequest {
    pub topic: String,
}

#[derive(Deserialize, ToSchema)]
pub struct StudyPlanPayload {
    /// Derived from the user's attempts when omitted.
    pub student_progress: Option<String>,
    /// Derived from the user's weakest topics when omitted.
    pub knowledge_gaps: Option<String>,
    pub learning_objectives: String,
}

#[derive(Serialize, ToSchema)]
pub struct StudyPlanResponse {
    pub study_plan: String,
}

#[derive(Deserialize, ToSchema)]
pub struct OrchestrateRequest {
    pub topic: String,
}

#[derive(Serialize, ToSchema)]
pub struct OrchestrateResponse {
    pub transcript: Vec<AgentMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz: Option<Quiz>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<OrchestrationStep>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Summarize pasted learning content and keep the summary.
#[utoipa::path(
    post,
    path = "/study/summaries",
    request_body = SummarizeRequest,
    responses(
        (status = 201, description = "Summary generated and saved", body = Summary),
        (status = 400, description = "No content supplied"),
        (status = 500, description = "The content could not be summarized")
    )
)]
pub async fn summarize_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<SummarizeRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let content = required("content", &req.content)?;
    let topic = non_blank(req.topic).unwrap_or_else(|| DEFAULT_SUMMARY_TOPIC.to_string());

    let text = app_state
        .content_adapter
        .summarize_content(content)
        .await
        .map_err(port_error("Sorry, I couldn't summarize the content at the moment. Please try again later."))?;

    let summary = app_state
        .db
        .create_summary(user_id, topic.trim(), &text)
        .await
        .map_err(port_error("Failed to save the summary."))?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// List the user's saved summaries, newest first.
#[utoipa::path(
    get,
    path = "/study/summaries",
    responses((status = 200, description = "Saved summaries, newest first", body = [Summary]))
)]
pub async fn list_summaries_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<Vec<Summary>>, HandlerError> {
    let summaries = app_state
        .db
        .list_summaries(user_id)
        .await
        .map_err(port_error("Failed to load your summaries."))?;
    Ok(Json(summaries))
}

/// Produce study content for a topic and keep it as a summary.
#[utoipa::path(
    post,
    path = "/study/retrieve",
    request_body = RetrieveRequest,
    responses(
        (status = 201, description = "Content retrieved and saved", body = Summary),
        (status = 400, description = "No topic supplied"),
        (status = 500, description = "Content could not be retrieved")
    )
)]
pub async fn retrieve_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<RetrieveRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let topic = required("topic", &req.topic)?;

    let text = app_state
        .content_adapter
        .retrieve_content(topic)
        .await
        .map_err(port_error("Sorry, I couldn't retrieve content at the moment. Please try again later."))?;

    let summary = app_state
        .db
        .create_summary(user_id, topic, &text)
        .await
        .map_err(port_error("Failed to save the retrieved content."))?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// Write a personalized study plan in markdown.
#[utoipa::path(
    post,
    path = "/study/plan",
    request_body = StudyPlanPayload,
    responses(
        (status = 200, description = "The study plan", body = StudyPlanResponse),
        (status = 400, description = "No learning objectives supplied"),
        (status = 500, description = "The plan could not be generated")
    )
)]
pub async fn study_plan_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<StudyPlanPayload>,
) -> Result<Json<StudyPlanResponse>, HandlerError> {
    let learning_objectives = required("learning_objectives", &req.learning_objectives)?;
    let mut student_progress = non_blank(req.student_progress);
    let mut knowledge_gaps = non_blank(req.knowledge_gaps);

    if student_progress.is_none() || knowledge_gaps.is_none() {
        let attempts = app_state
            .db
            .list_attempts(user_id)
            .await
            .map_err(port_error("Failed to load your progress."))?;

        student_progress.get_or_insert_with(|| {
            let stats = dashboard(&attempts);
            format!(
                "{} quizzes taken across {} topics, averaging {}% (latest change {:+}%).",
                stats.quizzes_taken,
                stats.topics_studied,
                stats.average_score,
                stats.latest_score_change
            )
        });
        knowledge_gaps.get_or_insert_with(|| {
            let weak = weakest_topics(&attempts, KNOWLEDGE_GAP_THRESHOLD);
            if weak.is_empty() {
                "No specific gaps identified yet.".to_string()
            } else {
                weak.iter()
                    .map(|t| format!("{} ({:.0}%)", t.topic, t.average))
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        });
    }

    let request = StudyPlanRequest {
        student_progress: student_progress.unwrap_or_default(),
        knowledge_gaps: knowledge_gaps.unwrap_or_default(),
        learning_objectives: learning_objectives.to_string(),
    };

    let study_plan = app_state
        .study_plan_adapter
        .create_study_plan(&request)
        .await
        .map_err(port_error("Sorry, I couldn't generate a study plan at the moment. Please try again later."))?;

    Ok(Json(StudyPlanResponse { study_plan }))
}

/// Let the agents retrieve content for a topic and build a quiz from it.
#[utoipa::path(
    post,
    path = "/study/orchestrate",
    request_body = OrchestrateRequest,
    responses(
        (status = 201, description = "Quiz built and saved", body = OrchestrateResponse),
        (status = 400, description = "No topic supplied"),
        (status = 502, description = "An agent step failed; the transcript says which", body = OrchestrateResponse)
    )
)]
pub async fn orchestrate_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<OrchestrateRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let topic = required("topic", &req.topic)?;

    match app_state.pipeline.orchestrate(topic).await {
        Orchestration::Completed {
            quiz, transcript, ..
        } => {
            let quiz = app_state
                .db
                .create_quiz(NewQuiz {
                    user_id,
                    title: quiz.title,
                    topic: topic.to_string(),
                    difficulty: Difficulty::Medium,
                    questions: quiz.questions,
                })
                .await
                .map_err(port_error("Failed to save the generated quiz."))?;
            info!("Orchestrated quiz {} on '{}' for user {}", quiz.id, topic, user_id);
            Ok((
                StatusCode::CREATED,
                Json(OrchestrateResponse {
                    transcript,
                    quiz: Some(quiz),
                    failed_step: None,
                }),
            ))
        }
        Orchestration::Failed {
            step,
            error: cause,
            transcript,
        } => {
            error!("Orchestration failed at {:?}: {:?}", step, cause);
            Ok((
                StatusCode::BAD_GATEWAY,
                Json(OrchestrateResponse {
                    transcript,
                    quiz: None,
                    failed_step: Some(step),
                }),
            ))
        }
    }
}
