//! services/api/src/web/state.rs
//!
//! Defines the application state shared by every request handler.

use crate::config::Config;
use std::sync::Arc;
use study_assistant_core::pipeline::QuizPipeline;
use study_assistant_core::ports::{
    ContentService, DatabaseService, FeedbackService, PasswordResetNotifier, StudyPlanService,
};

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    /// Quiz generation, image fan-out, and topic orchestration.
    pub pipeline: QuizPipeline,
    pub feedback_adapter: Arc<dyn FeedbackService>,
    pub content_adapter: Arc<dyn ContentService>,
    pub study_plan_adapter: Arc<dyn StudyPlanService>,
    pub reset_notifier: Arc<dyn PasswordResetNotifier>,
}
