//! End-to-end tests of the HTTP surface against the in-memory store and
//! scripted model adapters.

use api_lib::adapters::InMemoryDb;
use api_lib::config::Config;
use api_lib::web::{router, AppState};
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use study_assistant_core::domain::{Feedback, GeneratedQuiz, Question, QuestionKind};
use study_assistant_core::pipeline::QuizPipeline;
use study_assistant_core::ports::{
    ContentService, FeedbackRequest, FeedbackService, ImageGenerationService,
    PasswordResetNotifier, PortError, PortResult, QuizGenerationService, QuizRequest,
    StudyPlanRequest, StudyPlanService,
};
use tower::ServiceExt;

//=========================================================================================
// Scripted adapters
//=========================================================================================

/// Answers are always option "A"; the second question's image prompt is broken.
struct ScriptedQuizzes {
    works: bool,
}

#[async_trait]
impl QuizGenerationService for ScriptedQuizzes {
    async fn generate_quiz(&self, request: &QuizRequest) -> PortResult<GeneratedQuiz> {
        if !self.works {
            return Err(PortError::Unexpected("model returned malformed JSON".into()));
        }
        let questions = (0..request.number_of_questions)
            .map(|n| Question {
                question: format!("{} question {}", request.topic, n + 1),
                kind: QuestionKind::MultipleChoice,
                options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
                correct_answer: "A".into(),
                image_prompt: Some(if n == 1 {
                    "broken prompt".to_string()
                } else {
                    format!("diagram {}", n + 1)
                }),
                image_url: None,
            })
            .collect();
        Ok(GeneratedQuiz {
            title: format!("{} Quiz", request.topic),
            questions,
        })
    }
}

struct ScriptedImages;

#[async_trait]
impl ImageGenerationService for ScriptedImages {
    async fn generate_image(&self, prompt: &str) -> PortResult<String> {
        if prompt.contains("broken") {
            return Err(PortError::Unexpected("content policy".into()));
        }
        Ok(format!("https://images.test/{}.png", prompt.replace(' ', "-")))
    }
}

struct ScriptedContent {
    retrieval_works: bool,
}

#[async_trait]
impl ContentService for ScriptedContent {
    async fn summarize_content(&self, content: &str) -> PortResult<String> {
        Ok(format!("Summary of {} characters", content.len()))
    }

    async fn retrieve_content(&self, topic: &str) -> PortResult<String> {
        if self.retrieval_works {
            Ok(format!("Key facts about {}", topic))
        } else {
            Err(PortError::Unexpected("model unavailable".into()))
        }
    }
}

#[async_trait]
impl StudyPlanService for ScriptedContent {
    async fn create_study_plan(&self, request: &StudyPlanRequest) -> PortResult<String> {
        Ok(format!(
            "# Plan\nGaps: {}\nGoal: {}",
            request.knowledge_gaps, request.learning_objectives
        ))
    }
}

struct ScriptedFeedback;

#[async_trait]
impl FeedbackService for ScriptedFeedback {
    async fn provide_feedback(&self, request: &FeedbackRequest) -> PortResult<Feedback> {
        Ok(Feedback {
            overall_feedback: format!("{} feedback: {} correct", request.feedback_tone, request.score),
            detailed_feedback: Vec::new(),
            weak_concepts: None,
        })
    }
}

#[derive(Default)]
struct CapturingNotifier {
    tokens: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl PasswordResetNotifier for CapturingNotifier {
    async fn send_reset(&self, email: &str, token: &str) -> PortResult<()> {
        self.tokens
            .lock()
            .unwrap()
            .push((email.to_string(), token.to_string()));
        Ok(())
    }
}

//=========================================================================================
// Harness
//=========================================================================================

struct TestApp {
    router: Router,
    notifier: Arc<CapturingNotifier>,
}

fn app_with(retrieval_works: bool, quizzes_work: bool) -> TestApp {
    let content = Arc::new(ScriptedContent { retrieval_works });
    let quizzes = Arc::new(ScriptedQuizzes {
        works: quizzes_work,
    });
    let notifier = Arc::new(CapturingNotifier::default());
    let state = Arc::new(AppState {
        db: Arc::new(InMemoryDb::new()),
        config: Arc::new(Config::default()),
        pipeline: QuizPipeline::new(quizzes, Arc::new(ScriptedImages), content.clone()),
        feedback_adapter: Arc::new(ScriptedFeedback),
        content_adapter: content.clone(),
        study_plan_adapter: content,
        reset_notifier: notifier.clone(),
    });
    TestApp {
        router: router(state),
        notifier,
    }
}

fn app() -> TestApp {
    app_with(true, true)
}

impl TestApp {
    async fn send(
        &self,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Option<String>, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, set_cookie, json)
    }

    async fn signup(&self, email: &str) -> String {
        let (status, cookie, _) = self
            .send(
                "POST",
                "/auth/signup",
                None,
                Some(json!({ "email": email, "password": "hunter22" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        cookie.expect("signup sets the session cookie")
    }

    async fn generate_quiz(&self, cookie: &str, topic: &str, count: u32) -> Value {
        let (status, _, quiz) = self
            .send(
                "POST",
                "/quizzes",
                Some(cookie),
                Some(json!({
                    "learning_content": "The heart has four chambers.",
                    "topic": topic,
                    "number_of_questions": count,
                    "difficulty": "easy"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        quiz
    }
}

//=========================================================================================
// Auth
//=========================================================================================

#[tokio::test]
async fn protected_routes_require_a_session() {
    let app = app();
    let (status, _, _) = app.send("GET", "/quizzes", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = app
        .send("GET", "/metrics", Some("session=not-a-session"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signup_login_and_logout() {
    let app = app();
    let cookie = app.signup("Student@Example.com").await;

    let (status, _, me) = app.send("GET", "/auth/me", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "student@example.com");

    let (status, _, _) = app
        .send(
            "POST",
            "/auth/signup",
            None,
            Some(json!({ "email": "student@example.com", "password": "another1" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _, _) = app
        .send(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "student@example.com", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, login_cookie, _) = app
        .send(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "student@example.com", "password": "hunter22" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let login_cookie = login_cookie.unwrap();

    let (status, _, _) = app.send("POST", "/auth/logout", Some(&login_cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = app.send("GET", "/auth/me", Some(&login_cookie), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The signup session is independent of the one that logged out.
    let (status, _, _) = app.send("GET", "/auth/me", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn signup_validates_input() {
    let app = app();
    let (status, _, _) = app
        .send(
            "POST",
            "/auth/signup",
            None,
            Some(json!({ "email": "no-at-sign", "password": "hunter22" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = app
        .send(
            "POST",
            "/auth/signup",
            None,
            Some(json!({ "email": "a@example.com", "password": "short" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn password_reset_token_works_once() {
    let app = app();
    let old_cookie = app.signup("reset@example.com").await;

    let (status, _, _) = app
        .send(
            "POST",
            "/auth/password-reset",
            None,
            Some(json!({ "email": "nobody@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(app.notifier.tokens.lock().unwrap().is_empty());

    let (status, _, _) = app
        .send(
            "POST",
            "/auth/password-reset",
            None,
            Some(json!({ "email": "reset@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let (email, token) = app.notifier.tokens.lock().unwrap()[0].clone();
    assert_eq!(email, "reset@example.com");

    let confirm = json!({ "token": token, "new_password": "new-secret" });
    let (status, _, _) = app
        .send("POST", "/auth/password-reset/confirm", None, Some(confirm.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = app.send("GET", "/auth/me", Some(&old_cookie), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _, _) = app
        .send("POST", "/auth/password-reset/confirm", None, Some(confirm))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = app
        .send(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "reset@example.com", "password": "new-secret" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

//=========================================================================================
// Quizzes, attempts and feedback
//=========================================================================================

#[tokio::test]
async fn generated_quiz_survives_a_failed_image() {
    let app = app();
    let cookie = app.signup("quiz@example.com").await;

    let quiz = app.generate_quiz(&cookie, "Cardiology", 4).await;
    let questions = quiz["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 4);
    assert_eq!(quiz["difficulty"], "easy");
    assert!(questions[0]["image_url"].as_str().unwrap().starts_with("https://images.test/"));
    assert!(questions[1].get("image_url").is_none());
    assert!(questions[2]["image_url"].is_string());

    let id = quiz["id"].as_str().unwrap();
    let (status, _, fetched) = app
        .send("GET", &format!("/quizzes/{}", id), Some(&cookie), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, quiz);
}

#[tokio::test]
async fn question_count_is_clamped_and_fields_required() {
    let app = app();
    let cookie = app.signup("clamp@example.com").await;

    let quiz = app.generate_quiz(&cookie, "Anatomy", 40).await;
    assert_eq!(quiz["questions"].as_array().unwrap().len(), 10);

    let (status, _, _) = app
        .send(
            "POST",
            "/quizzes",
            Some(&cookie),
            Some(json!({ "learning_content": "   ", "topic": "Anatomy" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn quizzes_are_private_to_their_owner() {
    let app = app();
    let owner = app.signup("owner@example.com").await;
    let other = app.signup("other@example.com").await;
    let quiz = app.generate_quiz(&owner, "Anatomy", 3).await;
    let uri = format!("/quizzes/{}", quiz["id"].as_str().unwrap());

    let (status, _, _) = app.send("GET", &uri, Some(&other), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, _, listed) = app.send("GET", "/quizzes", Some(&other), None).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn attempts_are_scored_and_receive_feedback() {
    let app = app();
    let cookie = app.signup("attempt@example.com").await;
    let quiz = app.generate_quiz(&cookie, "Pharmacology", 4).await;
    let quiz_id = quiz["id"].as_str().unwrap();

    let (status, _, result) = app
        .send(
            "POST",
            &format!("/quizzes/{}/attempts", quiz_id),
            Some(&cookie),
            Some(json!({ "answers": { "0": "A", "1": "B", "2": "A" } })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(result["score"], 2);
    assert_eq!(result["total_questions"], 4);
    assert_eq!(result["percentage"], 50.0);

    let attempt_id = result["attempt_id"].as_str().unwrap();
    let (status, _, feedback) = app
        .send(
            "POST",
            &format!("/attempts/{}/feedback", attempt_id),
            Some(&cookie),
            Some(json!({ "feedback_tone": "Gamified" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(feedback["overall_feedback"], "Gamified feedback: 2 correct");

    let (_, _, attempts) = app.send("GET", "/attempts", Some(&cookie), None).await;
    assert_eq!(attempts[0]["feedback"], feedback);
    assert_eq!(attempts[0]["topic"], "Pharmacology");
}

#[tokio::test]
async fn metrics_reflect_attempt_history() {
    let app = app();
    let cookie = app.signup("metrics@example.com").await;

    let (_, _, empty) = app.send("GET", "/metrics", Some(&cookie), None).await;
    assert_eq!(empty["stats"]["quizzes_taken"], 0);

    for (topic, answers) in [
        ("Anatomy", json!({ "0": "A", "1": "A", "2": "A", "3": "A" })),
        ("Cardiology", json!({ "0": "A" })),
    ] {
        let quiz = app.generate_quiz(&cookie, topic, 4).await;
        app.send(
            "POST",
            &format!("/quizzes/{}/attempts", quiz["id"].as_str().unwrap()),
            Some(&cookie),
            Some(json!({ "answers": answers })),
        )
        .await;
    }

    let (status, _, metrics) = app.send("GET", "/metrics", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(metrics["stats"]["quizzes_taken"], 2);
    assert_eq!(metrics["stats"]["topics_studied"], 2);
    assert_eq!(metrics["stats"]["average_score"], 63);
    assert_eq!(metrics["stats"]["latest_score_change"], -75);
    assert_eq!(metrics["progress"][0]["topic"], "Anatomy");
    assert_eq!(metrics["recent_activity"][0]["topic"], "Cardiology");
    assert_eq!(metrics["knowledge_gaps"].as_array().unwrap().len(), 2);
}

//=========================================================================================
// Study hub
//=========================================================================================

#[tokio::test]
async fn summaries_default_their_topic() {
    let app = app();
    let cookie = app.signup("summary@example.com").await;

    let (status, _, summary) = app
        .send(
            "POST",
            "/study/summaries",
            Some(&cookie),
            Some(json!({ "content": "Mitochondria make ATP." })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(summary["topic"], "General");

    let (_, _, listed) = app.send("GET", "/study/summaries", Some(&cookie), None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn study_plan_derives_gaps_from_history() {
    let app = app();
    let cookie = app.signup("plan@example.com").await;
    let quiz = app.generate_quiz(&cookie, "Neurology", 4).await;
    app.send(
        "POST",
        &format!("/quizzes/{}/attempts", quiz["id"].as_str().unwrap()),
        Some(&cookie),
        Some(json!({ "answers": { "0": "A" } })),
    )
    .await;

    let (status, _, plan) = app
        .send(
            "POST",
            "/study/plan",
            Some(&cookie),
            Some(json!({ "learning_objectives": "Pass the boards" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let text = plan["study_plan"].as_str().unwrap();
    assert!(text.contains("Neurology (25%)"));
    assert!(text.contains("Pass the boards"));
}

#[tokio::test]
async fn orchestration_saves_a_quiz() {
    let app = app();
    let cookie = app.signup("agents@example.com").await;

    let (status, _, body) = app
        .send(
            "POST",
            "/study/orchestrate",
            Some(&cookie),
            Some(json!({ "topic": "Renal physiology" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["quiz"]["questions"].as_array().unwrap().len(), 5);
    assert_eq!(body["quiz"]["difficulty"], "medium");
    assert_eq!(body["transcript"].as_array().unwrap().len(), 3);

    let (_, _, listed) = app.send("GET", "/quizzes", Some(&cookie), None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn orchestration_failure_reports_the_step() {
    let app = app_with(false, true);
    let cookie = app.signup("broken@example.com").await;

    let (status, _, body) = app
        .send(
            "POST",
            "/study/orchestrate",
            Some(&cookie),
            Some(json!({ "topic": "Renal physiology" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["failed_step"], "retrieve_content");
    assert!(body.get("quiz").is_none());
    let transcript = body["transcript"].as_array().unwrap();
    assert_eq!(transcript.last().unwrap()["agent_name"], "System");

    let (_, _, listed) = app.send("GET", "/quizzes", Some(&cookie), None).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn orchestration_reports_a_failed_quiz_step() {
    let app = app_with(true, false);
    let cookie = app.signup("quizless@example.com").await;

    let (status, _, body) = app
        .send(
            "POST",
            "/study/orchestrate",
            Some(&cookie),
            Some(json!({ "topic": "Immunology" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["failed_step"], "generate_quiz");
    assert!(body.get("quiz").is_none());
    let transcript = body["transcript"].as_array().unwrap();
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript[1]["agent_name"], "Content Retriever");
    assert_eq!(transcript[2]["agent_name"], "System");

    let (_, _, listed) = app.send("GET", "/quizzes", Some(&cookie), None).await;
    assert_eq!(listed, json!([]));
}
