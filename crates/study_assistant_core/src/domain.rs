//! crates/study_assistant_core/src/domain.rs
//!
//! Defines the core data structures for the application.
//! These structs are independent of any database or transport; they derive
//! `serde` and `utoipa` traits only so adapters can store and describe them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

/// Number of questions generated when the caller does not ask for a count.
pub const DEFAULT_QUESTION_COUNT: u32 = 5;
pub const MIN_QUESTION_COUNT: u32 = 3;
pub const MAX_QUESTION_COUNT: u32 = 10;

/// How many quizzes the "recent quizzes" listing returns.
pub const RECENT_QUIZ_LIMIT: usize = 10;
/// How many attempts the dashboard shows as recent activity.
pub const RECENT_ACTIVITY_LIMIT: usize = 5;

/// Placeholder handed to the feedback flow for a question the student skipped.
pub const NOT_ANSWERED: &str = "Not answered";

//=========================================================================================
// Quizzes
//=========================================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    #[default]
    MultipleChoice,
    ShortAnswer,
}

/// A single quiz question, as generated by the quiz flow and stored verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Question {
    pub question: String,
    #[serde(rename = "type", default)]
    pub kind: QuestionKind,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// The output of the quiz flow, before it is owned by anyone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeneratedQuiz {
    pub title: String,
    pub questions: Vec<Question>,
}

/// A persisted quiz owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Quiz {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub questions: Vec<Question>,
    pub created_at: DateTime<Utc>,
}

/// Everything needed to create a `Quiz`; the store assigns id and timestamp.
#[derive(Debug, Clone)]
pub struct NewQuiz {
    pub user_id: Uuid,
    pub title: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub questions: Vec<Question>,
}

//=========================================================================================
// Attempts and Feedback
//=========================================================================================

/// Answers keyed by question index.
pub type Answers = BTreeMap<usize, String>;

/// One completed quiz-taking session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct QuizAttempt {
    pub id: Uuid,
    pub user_id: Uuid,
    pub quiz_id: Uuid,
    #[schema(value_type = Object)]
    pub answers: Answers,
    pub score: u32,
    pub topic: String,
    pub total_questions: u32,
    pub attempt_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
}

#[derive(Debug, Clone)]
pub struct NewQuizAttempt {
    pub user_id: Uuid,
    pub quiz_id: Uuid,
    pub answers: Answers,
    pub score: u32,
    pub topic: String,
    pub total_questions: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct QuestionFeedback {
    pub question: String,
    pub explanation: String,
}

/// Adaptive feedback produced for an attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Feedback {
    pub overall_feedback: String,
    #[serde(default)]
    pub detailed_feedback: Vec<QuestionFeedback>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weak_concepts: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum FeedbackTone {
    #[default]
    Encouraging,
    Constructive,
    Gamified,
}

impl std::fmt::Display for FeedbackTone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FeedbackTone::Encouraging => "Encouraging",
            FeedbackTone::Constructive => "Constructive",
            FeedbackTone::Gamified => "Gamified",
        };
        f.write_str(s)
    }
}

/// A question paired with what the student answered; input to the feedback flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnsweredQuestion {
    pub question: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub user_answer: String,
}

//=========================================================================================
// Summaries
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Summary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub topic: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Users and Auth
//=========================================================================================

// Represents a user - used throughout app
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

/// A single-use password reset token.
#[derive(Debug, Clone)]
pub struct PasswordReset {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}
