//! crates/study_assistant_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or model APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    AnsweredQuestion, Difficulty, Feedback, FeedbackTone, GeneratedQuiz, NewQuiz,
    NewQuizAttempt, PasswordReset, Quiz, QuizAttempt, Summary, User, UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Flow Inputs
//=========================================================================================

/// Input to the quiz generation flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizRequest {
    pub learning_content: String,
    pub topic: String,
    pub number_of_questions: u32,
    pub difficulty: Difficulty,
}

/// Input to the adaptive feedback flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub quiz_title: String,
    pub questions: Vec<AnsweredQuestion>,
    pub score: u32,
    pub student_knowledge_level: String,
    pub feedback_tone: FeedbackTone,
}

/// Input to the study plan flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyPlanRequest {
    pub student_progress: String,
    pub knowledge_gaps: String,
    pub learning_objectives: String,
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Users and Auth ---
    async fn create_user_with_email(&self, email: &str, hashed_password: &str)
        -> PortResult<User>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn update_password(&self, user_id: Uuid, hashed_password: &str) -> PortResult<()>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    /// Signs the user out everywhere.
    async fn delete_user_sessions(&self, user_id: Uuid) -> PortResult<()>;

    async fn create_password_reset(&self, reset: PasswordReset) -> PortResult<()>;

    /// Removes the token and returns the user it belongs to, if it has not expired.
    async fn consume_password_reset(&self, token: &str) -> PortResult<Uuid>;

    // --- Quizzes ---
    async fn create_quiz(&self, quiz: NewQuiz) -> PortResult<Quiz>;

    async fn get_quiz(&self, user_id: Uuid, quiz_id: Uuid) -> PortResult<Quiz>;

    /// Most recent first.
    async fn list_recent_quizzes(&self, user_id: Uuid, limit: usize) -> PortResult<Vec<Quiz>>;

    // --- Attempts ---
    async fn create_attempt(&self, attempt: NewQuizAttempt) -> PortResult<QuizAttempt>;

    async fn get_attempt(&self, user_id: Uuid, attempt_id: Uuid) -> PortResult<QuizAttempt>;

    /// Merges feedback into an existing attempt, replacing any earlier feedback.
    async fn attach_feedback(
        &self,
        user_id: Uuid,
        attempt_id: Uuid,
        feedback: &Feedback,
    ) -> PortResult<()>;

    /// Most recent first.
    async fn list_attempts(&self, user_id: Uuid) -> PortResult<Vec<QuizAttempt>>;

    // --- Summaries ---
    async fn create_summary(&self, user_id: Uuid, topic: &str, text: &str) -> PortResult<Summary>;

    /// Most recent first.
    async fn list_summaries(&self, user_id: Uuid) -> PortResult<Vec<Summary>>;
}

#[async_trait]
pub trait QuizGenerationService: Send + Sync {
    /// Generates a titled question set, including an image prompt per question.
    async fn generate_quiz(&self, request: &QuizRequest) -> PortResult<GeneratedQuiz>;
}

#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    /// Generates an image from a text prompt and returns a reference to it (URL or data URI).
    async fn generate_image(&self, prompt: &str) -> PortResult<String>;
}

#[async_trait]
pub trait FeedbackService: Send + Sync {
    async fn provide_feedback(&self, request: &FeedbackRequest) -> PortResult<Feedback>;
}

#[async_trait]
pub trait ContentService: Send + Sync {
    /// Condenses student-supplied learning content to its key concepts.
    async fn summarize_content(&self, content: &str) -> PortResult<String>;

    /// Produces a study summary for a topic without any supplied content.
    async fn retrieve_content(&self, topic: &str) -> PortResult<String>;
}

#[async_trait]
pub trait StudyPlanService: Send + Sync {
    /// Returns a markdown study plan.
    async fn create_study_plan(&self, request: &StudyPlanRequest) -> PortResult<String>;
}

#[async_trait]
pub trait PasswordResetNotifier: Send + Sync {
    async fn send_reset(&self, email: &str, token: &str) -> PortResult<()>;
}
