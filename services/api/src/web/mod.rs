pub mod attempts;
pub mod auth;
pub mod dashboard;
pub mod middleware;
pub mod quizzes;
pub mod rest;
pub mod state;
pub mod study;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use middleware::require_auth;
pub use state::AppState;

/// Request bodies carry pasted learning content, so allow more than axum's 2 MB default.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Builds the API router: public auth routes plus the session-protected routes.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/password-reset", post(auth::password_reset_handler))
        .route(
            "/auth/password-reset/confirm",
            post(auth::password_reset_confirm_handler),
        );

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route(
            "/quizzes",
            post(quizzes::generate_quiz_handler).get(quizzes::list_quizzes_handler),
        )
        .route("/quizzes/{quiz_id}", get(quizzes::get_quiz_handler))
        .route(
            "/quizzes/{quiz_id}/attempts",
            post(attempts::submit_attempt_handler),
        )
        .route("/attempts", get(attempts::list_attempts_handler))
        .route(
            "/attempts/{attempt_id}/feedback",
            post(attempts::attempt_feedback_handler),
        )
        .route("/metrics", get(dashboard::metrics_handler))
        .route(
            "/study/summaries",
            post(study::summarize_handler).get(study::list_summaries_handler),
        )
        .route("/study/retrieve", post(study::retrieve_handler))
        .route("/study/plan", post(study::study_plan_handler))
        .route("/study/orchestrate", post(study::orchestrate_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
