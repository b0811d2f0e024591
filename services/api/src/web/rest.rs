//! services/api/src/web/rest.rs
//!
//! Shared pieces of the REST surface: the master OpenAPI definition and the
//! helpers handlers use to turn port failures into HTTP responses.

use axum::http::StatusCode;
use study_assistant_core::domain::{
    Difficulty, Feedback, FeedbackTone, Question, QuestionFeedback, QuestionKind, Quiz,
    QuizAttempt, Summary, User,
};
use study_assistant_core::metrics::{DashboardStats, ProgressPoint, TopicScore};
use study_assistant_core::pipeline::{AgentMessage, OrchestrationStep, Sender};
use study_assistant_core::ports::PortError;
use tracing::{error, warn};
use utoipa::OpenApi;

use crate::web::{attempts, auth, dashboard, quizzes, study};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::me_handler,
        auth::password_reset_handler,
        auth::password_reset_confirm_handler,
        quizzes::generate_quiz_handler,
        quizzes::list_quizzes_handler,
        quizzes::get_quiz_handler,
        attempts::submit_attempt_handler,
        attempts::list_attempts_handler,
        attempts::attempt_feedback_handler,
        dashboard::metrics_handler,
        study::summarize_handler,
        study::list_summaries_handler,
        study::retrieve_handler,
        study::study_plan_handler,
        study::orchestrate_handler,
    ),
    components(
        schemas(
            auth::SignupRequest, auth::LoginRequest, auth::AuthResponse,
            auth::PasswordResetRequest, auth::PasswordResetConfirm,
            quizzes::GenerateQuizRequest,
            attempts::SubmitAttemptRequest, attempts::SubmitAttemptResponse,
            attempts::FeedbackOptions,
            dashboard::MetricsResponse,
            study::SummarizeRequest, study::RetrieveRequest, study::StudyPlanPayload,
            study::StudyPlanResponse, study::OrchestrateRequest, study::OrchestrateResponse,
            Difficulty, QuestionKind, Question, Quiz, QuizAttempt, Feedback, QuestionFeedback,
            FeedbackTone, Summary, User, TopicScore, ProgressPoint, DashboardStats,
            AgentMessage, Sender, OrchestrationStep,
        )
    ),
    tags(
        (name = "Study Assistant API", description = "Quizzes, scoring, feedback, metrics and study tools.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Handler Helpers
//=========================================================================================

/// The error half of every handler's result.
pub type HandlerError = (StatusCode, String);

/// Maps a port failure onto a status code.
///
/// Client-facing failures keep the port's message. Unexpected failures are logged
/// and answered with `user_message` so internals never reach the client.
pub fn port_error(user_message: &'static str) -> impl FnOnce(PortError) -> HandlerError {
    move |e| match e {
        PortError::NotFound(_) => {
            warn!("{}: {}", user_message, e);
            (StatusCode::NOT_FOUND, e.to_string())
        }
        PortError::Unauthorized => {
            warn!("{}: {}", user_message, e);
            (StatusCode::UNAUTHORIZED, e.to_string())
        }
        PortError::Conflict(_) => (StatusCode::CONFLICT, e.to_string()),
        PortError::Unexpected(_) => {
            error!("{}: {:?}", user_message, e);
            (StatusCode::INTERNAL_SERVER_ERROR, user_message.to_string())
        }
    }
}

/// Rejects a blank required field with 400; returns the trimmed value otherwise.
pub fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, HandlerError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err((StatusCode::BAD_REQUEST, format!("{} is required", field)));
    }
    Ok(trimmed)
}
