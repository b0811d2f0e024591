//! services/api/src/web/attempts.rs
//!
//! Handlers for submitting quiz answers, listing attempts, and attaching
//! adaptive feedback to an attempt.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use study_assistant_core::domain::{Answers, Feedback, FeedbackTone, NewQuizAttempt, QuizAttempt};
use study_assistant_core::ports::FeedbackRequest;
use study_assistant_core::scoring::{answered_questions, percentage, score_answers};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::rest::{port_error, HandlerError};
use crate::web::state::AppState;

const DEFAULT_KNOWLEDGE_LEVEL: &str = "intermediate";

//=========================================================================================
// Payloads
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SubmitAttemptRequest {
    /// Question index to the chosen option or typed answer.
    #[schema(value_type = Object)]
    #[serde(default)]
    pub answers: Answers,
}

#[derive(Serialize, ToSchema)]
pub struct SubmitAttemptResponse {
    pub attempt_id: Uuid,
    pub score: u32,
    pub total_questions: u32,
    pub percentage: f64,
}

#[derive(Deserialize, ToSchema, Default)]
pub struct FeedbackOptions {
    pub feedback_tone: Option<FeedbackTone>,
    pub student_knowledge_level: Option<String>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Score a set of answers against a quiz and record the attempt.
#[utoipa::path(
    post,
    path = "/quizzes/{quiz_id}/attempts",
    params(("quiz_id" = Uuid, Path, description = "The quiz being answered.")),
    request_body = SubmitAttemptRequest,
    responses(
        (status = 201, description = "Attempt scored and saved", body = SubmitAttemptResponse),
        (status = 404, description = "No such quiz for this user")
    )
)]
pub async fn submit_attempt_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(quiz_id): Path<Uuid>,
    Json(req): Json<SubmitAttemptRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let quiz = app_state
        .db
        .get_quiz(user_id, quiz_id)
        .await
        .map_err(port_error("Failed to load the quiz."))?;

    let score = score_answers(&quiz.questions, &req.answers);
    let total_questions = quiz.questions.len() as u32;

    let attempt = app_state
        .db
        .create_attempt(NewQuizAttempt {
            user_id,
            quiz_id,
            answers: req.answers,
            score,
            topic: quiz.topic,
            total_questions,
        })
        .await
        .map_err(port_error("Failed to save your results."))?;

    info!(
        "User {} scored {}/{} on quiz {}",
        user_id, score, total_questions, quiz_id
    );
    Ok((
        StatusCode::CREATED,
        Json(SubmitAttemptResponse {
            attempt_id: attempt.id,
            score,
            total_questions,
            percentage: percentage(score, total_questions),
        }),
    ))
}

/// List every attempt by the user, newest first.
#[utoipa::path(
    get,
    path = "/attempts",
    responses((status = 200, description = "All attempts, newest first", body = [QuizAttempt]))
)]
pub async fn list_attempts_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<Vec<QuizAttempt>>, HandlerError> {
    let attempts = app_state
        .db
        .list_attempts(user_id)
        .await
        .map_err(port_error("Failed to load your attempts."))?;
    Ok(Json(attempts))
}

/// Generate adaptive feedback for an attempt and store it on the attempt.
///
/// Calling this again (for example with another tone) replaces the stored feedback.
#[utoipa::path(
    post,
    path = "/attempts/{attempt_id}/feedback",
    params(("attempt_id" = Uuid, Path, description = "The attempt to review.")),
    request_body = FeedbackOptions,
    responses(
        (status = 200, description = "Feedback generated and saved", body = Feedback),
        (status = 404, description = "No such attempt for this user"),
        (status = 500, description = "Feedback could not be generated")
    )
)]
pub async fn attempt_feedback_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(attempt_id): Path<Uuid>,
    options: Option<Json<FeedbackOptions>>,
) -> Result<Json<Feedback>, HandlerError> {
    let options = options.map(|Json(o)| o).unwrap_or_default();

    let attempt = app_state
        .db
        .get_attempt(user_id, attempt_id)
        .await
        .map_err(port_error("Failed to load the attempt."))?;
    let quiz = app_state
        .db
        .get_quiz(user_id, attempt.quiz_id)
        .await
        .map_err(port_error("Failed to load the quiz for this attempt."))?;

    let request = FeedbackRequest {
        quiz_title: quiz.title.clone(),
        questions: answered_questions(&quiz.questions, &attempt.answers),
        score: attempt.score,
        student_knowledge_level: options
            .student_knowledge_level
            .filter(|level| !level.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_KNOWLEDGE_LEVEL.to_string()),
        feedback_tone: options.feedback_tone.unwrap_or_default(),
    };

    let feedback = app_state
        .feedback_adapter
        .provide_feedback(&request)
        .await
        .map_err(port_error("Sorry, I couldn't provide feedback at the moment. Please try again later."))?;

    app_state
        .db
        .attach_feedback(user_id, attempt_id, &feedback)
        .await
        .map_err(port_error("Failed to save the feedback."))?;

    Ok(Json(feedback))
}
