//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of the `DatabaseService` port. Used when no
//! `DATABASE_URL` is configured, and by the router tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use study_assistant_core::domain::{
    Feedback, NewQuiz, NewQuizAttempt, PasswordReset, Quiz, QuizAttempt, Summary, User,
    UserCredentials,
};
use study_assistant_core::ports::{DatabaseService, PortError, PortResult};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, (User, String)>,
    sessions: HashMap<String, (Uuid, DateTime<Utc>)>,
    resets: HashMap<String, PasswordReset>,
    quizzes: Vec<Quiz>,
    attempts: Vec<QuizAttempt>,
    summaries: Vec<Summary>,
}

/// Keeps every table in memory behind one lock.
#[derive(Default)]
pub struct InMemoryDb {
    tables: RwLock<Tables>,
}

impl InMemoryDb {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Timestamps handed out by the store never go backwards, so "most recent first"
/// stays well defined for records created within the same clock tick.
fn next_timestamp<'a>(existing: impl Iterator<Item = &'a DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now();
    match existing.max() {
        Some(latest) if *latest >= now => *latest + Duration::microseconds(1),
        _ => now,
    }
}

#[async_trait]
impl DatabaseService for InMemoryDb {
    // --- Users and Auth ---

    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|(u, _)| u.email == email) {
            return Err(PortError::Conflict(format!("User {} already exists", email)));
        }
        let user = User {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            created_at: Utc::now(),
        };
        tables
            .users
            .insert(user.user_id, (user.clone(), hashed_password.to_string()));
        Ok(user)
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let tables = self.tables.read().await;
        tables
            .users
            .get(&user_id)
            .map(|(u, _)| u.clone())
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let tables = self.tables.read().await;
        tables
            .users
            .values()
            .find(|(u, _)| u.email == email)
            .map(|(u, hash)| UserCredentials {
                user_id: u.user_id,
                email: u.email.clone(),
                hashed_password: hash.clone(),
            })
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    async fn update_password(&self, user_id: Uuid, hashed_password: &str) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        let (_, hash) = tables
            .users
            .get_mut(&user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;
        *hash = hashed_password.to_string();
        Ok(())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        tables.sessions.retain(|_, (_, expires)| *expires > now);
        tables
            .sessions
            .insert(session_id.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let tables = self.tables.read().await;
        match tables.sessions.get(session_id) {
            Some((user_id, expires_at)) if *expires_at > Utc::now() => Ok(*user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.tables.write().await.sessions.remove(session_id);
        Ok(())
    }

    async fn delete_user_sessions(&self, user_id: Uuid) -> PortResult<()> {
        self.tables
            .write()
            .await
            .sessions
            .retain(|_, (owner, _)| *owner != user_id);
        Ok(())
    }

    async fn create_password_reset(&self, reset: PasswordReset) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        tables.resets.retain(|_, r| r.expires_at > now);
        tables.resets.insert(reset.token.clone(), reset);
        Ok(())
    }

    async fn consume_password_reset(&self, token: &str) -> PortResult<Uuid> {
        let mut tables = self.tables.write().await;
        match tables.resets.remove(token) {
            Some(reset) if reset.expires_at > Utc::now() => Ok(reset.user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    // --- Quizzes ---

    async fn create_quiz(&self, quiz: NewQuiz) -> PortResult<Quiz> {
        let mut tables = self.tables.write().await;
        let created_at = next_timestamp(tables.quizzes.iter().map(|q| &q.created_at));
        let quiz = Quiz {
            id: Uuid::new_v4(),
            user_id: quiz.user_id,
            title: quiz.title,
            topic: quiz.topic,
            difficulty: quiz.difficulty,
            questions: quiz.questions,
            created_at,
        };
        tables.quizzes.push(quiz.clone());
        Ok(quiz)
    }

    async fn get_quiz(&self, user_id: Uuid, quiz_id: Uuid) -> PortResult<Quiz> {
        let tables = self.tables.read().await;
        tables
            .quizzes
            .iter()
            .find(|q| q.id == quiz_id && q.user_id == user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Quiz {} not found", quiz_id)))
    }

    async fn list_recent_quizzes(&self, user_id: Uuid, limit: usize) -> PortResult<Vec<Quiz>> {
        let tables = self.tables.read().await;
        let mut quizzes: Vec<Quiz> = tables
            .quizzes
            .iter()
            .filter(|q| q.user_id == user_id)
            .cloned()
            .collect();
        quizzes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        quizzes.truncate(limit);
        Ok(quizzes)
    }

    // --- Attempts ---

    async fn create_attempt(&self, attempt: NewQuizAttempt) -> PortResult<QuizAttempt> {
        let mut tables = self.tables.write().await;
        let attempt_time = next_timestamp(tables.attempts.iter().map(|a| &a.attempt_time));
        let attempt = QuizAttempt {
            id: Uuid::new_v4(),
            user_id: attempt.user_id,
            quiz_id: attempt.quiz_id,
            answers: attempt.answers,
            score: attempt.score,
            topic: attempt.topic,
            total_questions: attempt.total_questions,
            attempt_time,
            feedback: None,
        };
        tables.attempts.push(attempt.clone());
        Ok(attempt)
    }

    async fn get_attempt(&self, user_id: Uuid, attempt_id: Uuid) -> PortResult<QuizAttempt> {
        let tables = self.tables.read().await;
        tables
            .attempts
            .iter()
            .find(|a| a.id == attempt_id && a.user_id == user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Attempt {} not found", attempt_id)))
    }

    async fn attach_feedback(
        &self,
        user_id: Uuid,
        attempt_id: Uuid,
        feedback: &Feedback,
    ) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        let attempt = tables
            .attempts
            .iter_mut()
            .find(|a| a.id == attempt_id && a.user_id == user_id)
            .ok_or_else(|| PortError::NotFound(format!("Attempt {} not found", attempt_id)))?;
        attempt.feedback = Some(feedback.clone());
        Ok(())
    }

    async fn list_attempts(&self, user_id: Uuid) -> PortResult<Vec<QuizAttempt>> {
        let tables = self.tables.read().await;
        let mut attempts: Vec<QuizAttempt> = tables
            .attempts
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        attempts.sort_by(|a, b| b.attempt_time.cmp(&a.attempt_time));
        Ok(attempts)
    }

    // --- Summaries ---

    async fn create_summary(&self, user_id: Uuid, topic: &str, text: &str) -> PortResult<Summary> {
        let mut tables = self.tables.write().await;
        let created_at = next_timestamp(tables.summaries.iter().map(|s| &s.created_at));
        let summary = Summary {
            id: Uuid::new_v4(),
            user_id,
            topic: topic.to_string(),
            text: text.to_string(),
            created_at,
        };
        tables.summaries.push(summary.clone());
        Ok(summary)
    }

    async fn list_summaries(&self, user_id: Uuid) -> PortResult<Vec<Summary>> {
        let tables = self.tables.read().await;
        let mut summaries: Vec<Summary> = tables
            .summaries
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }
}
