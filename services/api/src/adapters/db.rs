//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};
use study_assistant_core::domain::{
    Answers, Difficulty, Feedback, NewQuiz, NewQuizAttempt, PasswordReset, Question, Quiz,
    QuizAttempt, Summary, User, UserCredentials,
};
use study_assistant_core::ports::{DatabaseService, PortError, PortResult};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found(what: String) -> impl FnOnce(sqlx::Error) -> PortError {
    move |e| match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what),
        other => unexpected(other),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: String,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: self.user_id,
            email: self.email,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct QuizRecord {
    id: Uuid,
    user_id: Uuid,
    title: String,
    topic: String,
    difficulty: String,
    questions: Json<Vec<Question>>,
    created_at: DateTime<Utc>,
}
impl QuizRecord {
    fn to_domain(self) -> PortResult<Quiz> {
        let difficulty = self
            .difficulty
            .parse::<Difficulty>()
            .map_err(PortError::Unexpected)?;
        Ok(Quiz {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            topic: self.topic,
            difficulty,
            questions: self.questions.0,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct AttemptRecord {
    id: Uuid,
    user_id: Uuid,
    quiz_id: Uuid,
    answers: Json<Answers>,
    score: i32,
    topic: String,
    total_questions: i32,
    attempt_time: DateTime<Utc>,
    feedback: Option<Json<Feedback>>,
}
impl AttemptRecord {
    fn to_domain(self) -> QuizAttempt {
        QuizAttempt {
            id: self.id,
            user_id: self.user_id,
            quiz_id: self.quiz_id,
            answers: self.answers.0,
            score: self.score.max(0) as u32,
            topic: self.topic,
            total_questions: self.total_questions.max(0) as u32,
            attempt_time: self.attempt_time,
            feedback: self.feedback.map(|f| f.0),
        }
    }
}

#[derive(FromRow)]
struct SummaryRecord {
    id: Uuid,
    user_id: Uuid,
    topic: String,
    text: String,
    created_at: DateTime<Utc>,
}
impl SummaryRecord {
    fn to_domain(self) -> Summary {
        Summary {
            id: self.id,
            user_id: self.user_id,
            topic: self.topic,
            text: self.text,
            created_at: self.created_at,
        }
    }
}

const QUIZ_COLUMNS: &str = "id, user_id, title, topic, difficulty, questions, created_at";
const ATTEMPT_COLUMNS: &str =
    "id, user_id, quiz_id, answers, score, topic, total_questions, attempt_time, feedback";

// Most recent first; `seq` breaks timestamp ties in insertion order.
const QUIZ_ORDER: &str = "ORDER BY created_at DESC, seq DESC";
const ATTEMPT_ORDER: &str = "ORDER BY attempt_time DESC, seq DESC";
const SUMMARY_ORDER: &str = "ORDER BY created_at DESC, seq DESC";

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    // --- Users and Auth ---

    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, email, hashed_password) VALUES ($1, $2, $3) \
             RETURNING user_id, email, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_unique_violation() => {
                PortError::Conflict(format!("User {} already exists", email))
            }
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, email, created_at FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found(format!("User {} not found", user_id)))?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found(format!("User {} not found", email)))?;
        Ok(record.to_domain())
    }

    async fn update_password(&self, user_id: Uuid, hashed_password: &str) -> PortResult<()> {
        let result = sqlx::query("UPDATE users SET hashed_password = $1 WHERE user_id = $2")
            .bind(hashed_password)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("User {} not found", user_id)));
        }
        Ok(())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let user_id: Option<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        user_id.ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn delete_user_sessions(&self, user_id: Uuid) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn create_password_reset(&self, reset: PasswordReset) -> PortResult<()> {
        sqlx::query("INSERT INTO password_resets (token, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(&reset.token)
            .bind(reset.user_id)
            .bind(reset.expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn consume_password_reset(&self, token: &str) -> PortResult<Uuid> {
        let row: Option<(Uuid, DateTime<Utc>)> = sqlx::query_as(
            "DELETE FROM password_resets WHERE token = $1 RETURNING user_id, expires_at",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        match row {
            Some((user_id, expires_at)) if expires_at > Utc::now() => Ok(user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    // --- Quizzes ---

    async fn create_quiz(&self, quiz: NewQuiz) -> PortResult<Quiz> {
        let record = sqlx::query_as::<_, QuizRecord>(&format!(
            "INSERT INTO quizzes (id, user_id, title, topic, difficulty, questions) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            QUIZ_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(quiz.user_id)
        .bind(&quiz.title)
        .bind(&quiz.topic)
        .bind(quiz.difficulty.as_str())
        .bind(Json(&quiz.questions))
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        record.to_domain()
    }

    async fn get_quiz(&self, user_id: Uuid, quiz_id: Uuid) -> PortResult<Quiz> {
        let record = sqlx::query_as::<_, QuizRecord>(&format!(
            "SELECT {} FROM quizzes WHERE id = $1 AND user_id = $2",
            QUIZ_COLUMNS
        ))
        .bind(quiz_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found(format!("Quiz {} not found", quiz_id)))?;
        record.to_domain()
    }

    async fn list_recent_quizzes(&self, user_id: Uuid, limit: usize) -> PortResult<Vec<Quiz>> {
        let records = sqlx::query_as::<_, QuizRecord>(&format!(
            "SELECT {} FROM quizzes WHERE user_id = $1 {} LIMIT $2",
            QUIZ_COLUMNS, QUIZ_ORDER
        ))
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    // --- Attempts ---

    async fn create_attempt(&self, attempt: NewQuizAttempt) -> PortResult<QuizAttempt> {
        let record = sqlx::query_as::<_, AttemptRecord>(&format!(
            "INSERT INTO quiz_attempts (id, user_id, quiz_id, answers, score, topic, total_questions) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            ATTEMPT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(attempt.user_id)
        .bind(attempt.quiz_id)
        .bind(Json(&attempt.answers))
        .bind(attempt.score as i32)
        .bind(&attempt.topic)
        .bind(attempt.total_questions as i32)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_attempt(&self, user_id: Uuid, attempt_id: Uuid) -> PortResult<QuizAttempt> {
        let record = sqlx::query_as::<_, AttemptRecord>(&format!(
            "SELECT {} FROM quiz_attempts WHERE id = $1 AND user_id = $2",
            ATTEMPT_COLUMNS
        ))
        .bind(attempt_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found(format!("Attempt {} not found", attempt_id)))?;
        Ok(record.to_domain())
    }

    async fn attach_feedback(
        &self,
        user_id: Uuid,
        attempt_id: Uuid,
        feedback: &Feedback,
    ) -> PortResult<()> {
        let result =
            sqlx::query("UPDATE quiz_attempts SET feedback = $1 WHERE id = $2 AND user_id = $3")
                .bind(Json(feedback))
                .bind(attempt_id)
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Attempt {} not found", attempt_id)));
        }
        Ok(())
    }

    async fn list_attempts(&self, user_id: Uuid) -> PortResult<Vec<QuizAttempt>> {
        let records = sqlx::query_as::<_, AttemptRecord>(&format!(
            "SELECT {} FROM quiz_attempts WHERE user_id = $1 {}",
            ATTEMPT_COLUMNS, ATTEMPT_ORDER
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    // --- Summaries ---

    async fn create_summary(&self, user_id: Uuid, topic: &str, text: &str) -> PortResult<Summary> {
        let record = sqlx::query_as::<_, SummaryRecord>(
            "INSERT INTO summaries (id, user_id, topic, text) VALUES ($1, $2, $3, $4) \
             RETURNING id, user_id, topic, text, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(topic)
        .bind(text)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn list_summaries(&self, user_id: Uuid) -> PortResult<Vec<Summary>> {
        let records = sqlx::query_as::<_, SummaryRecord>(&format!(
            "SELECT id, user_id, topic, text, created_at FROM summaries WHERE user_id = $1 {}",
            SUMMARY_ORDER
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}
