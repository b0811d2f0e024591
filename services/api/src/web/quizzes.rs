//! services/api/src/web/quizzes.rs
//!
//! Handlers for generating, listing, and fetching quizzes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde::Deserialize;
use std::sync::Arc;
use study_assistant_core::domain::{
    Difficulty, NewQuiz, Quiz, DEFAULT_QUESTION_COUNT, MAX_QUESTION_COUNT, MIN_QUESTION_COUNT,
    RECENT_QUIZ_LIMIT,
};
use study_assistant_core::ports::QuizRequest;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::rest::{port_error, required, HandlerError};
use crate::web::state::AppState;

//=========================================================================================
// Payloads
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct GenerateQuizRequest {
    pub learning_content: String,
    pub topic: String,
    /// Clamped to 3..=10; defaults to 5.
    pub number_of_questions: Option<u32>,
    pub difficulty: Option<Difficulty>,
}

/// Clamps the requested question count to the supported range.
pub fn question_count(requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(DEFAULT_QUESTION_COUNT)
        .clamp(MIN_QUESTION_COUNT, MAX_QUESTION_COUNT)
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Generate a quiz from learning content, illustrate it, and save it.
#[utoipa::path(
    post,
    path = "/quizzes",
    request_body = GenerateQuizRequest,
    responses(
        (status = 201, description = "Quiz generated and saved", body = Quiz),
        (status = 400, description = "Missing topic or learning content"),
        (status = 401, description = "Not signed in"),
        (status = 500, description = "The quiz could not be generated")
    )
)]
pub async fn generate_quiz_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<GenerateQuizRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let topic = required("topic", &req.topic)?;
    let learning_content = required("learning_content", &req.learning_content)?;

    let request = QuizRequest {
        learning_content: learning_content.to_string(),
        topic: topic.to_string(),
        number_of_questions: question_count(req.number_of_questions),
        difficulty: req.difficulty.unwrap_or_default(),
    };

    let generated = app_state
        .pipeline
        .generate(&request)
        .await
        .map_err(port_error("Sorry, I couldn't generate a quiz at the moment. Please try again later."))?;

    let quiz = app_state
        .db
        .create_quiz(NewQuiz {
            user_id,
            title: generated.title,
            topic: request.topic,
            difficulty: request.difficulty,
            questions: generated.questions,
        })
        .await
        .map_err(port_error("Failed to save the generated quiz."))?;

    info!("Saved quiz {} for user {}", quiz.id, user_id);
    Ok((StatusCode::CREATED, Json(quiz)))
}

/// List the user's most recent quizzes, newest first.
#[utoipa::path(
    get,
    path = "/quizzes",
    responses(
        (status = 200, description = "Up to ten most recent quizzes", body = [Quiz]),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn list_quizzes_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<Vec<Quiz>>, HandlerError> {
    let quizzes = app_state
        .db
        .list_recent_quizzes(user_id, RECENT_QUIZ_LIMIT)
        .await
        .map_err(port_error("Failed to load your quizzes."))?;
    Ok(Json(quizzes))
}

/// Fetch one of the user's quizzes.
#[utoipa::path(
    get,
    path = "/quizzes/{quiz_id}",
    params(("quiz_id" = Uuid, Path, description = "The quiz to fetch.")),
    responses(
        (status = 200, description = "The quiz", body = Quiz),
        (status = 404, description = "No such quiz for this user")
    )
)]
pub async fn get_quiz_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(quiz_id): Path<Uuid>,
) -> Result<Json<Quiz>, HandlerError> {
    let quiz = app_state
        .db
        .get_quiz(user_id, quiz_id)
        .await
        .map_err(port_error("Failed to load the quiz."))?;
    Ok(Json(quiz))
}
