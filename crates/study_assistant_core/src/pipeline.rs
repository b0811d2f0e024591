//! crates/study_assistant_core/src/pipeline.rs
//!
//! Chains the AI flows together: quiz generation followed by the per-question
//! image fan-out, and the topic-to-quiz orchestration (content retrieval feeding
//! quiz generation).

use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::domain::{Difficulty, GeneratedQuiz, Question, DEFAULT_QUESTION_COUNT};
use crate::ports::{
    ContentService, ImageGenerationService, PortError, PortResult, QuizGenerationService,
    QuizRequest,
};

pub const CONTENT_RETRIEVER: &str = "Content Retriever";
pub const QUIZ_GENERATOR: &str = "Quiz Generator";
pub const SYSTEM_AGENT: &str = "System";

//=========================================================================================
// Image Fan-out
//=========================================================================================

/// Generates an image for every question that carries an image prompt.
///
/// All requests are issued at once and awaited together. A failed request is
/// logged and leaves that question without an image; it never fails the batch.
/// Question order is preserved.
pub async fn attach_images(
    images: &dyn ImageGenerationService,
    questions: Vec<Question>,
) -> Vec<Question> {
    let tasks = questions.into_iter().map(|mut question| async move {
        let prompt = match question.image_prompt.clone() {
            Some(p) if !p.trim().is_empty() => p,
            _ => return question,
        };
        match images.generate_image(&prompt).await {
            Ok(url) => question.image_url = Some(url),
            Err(e) => {
                warn!(
                    "Image generation failed for prompt {:?}; skipping image for this question: {}",
                    prompt, e
                );
                question.image_url = None;
            }
        }
        question
    });

    join_all(tasks).await
}

//=========================================================================================
// Orchestration Transcript
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Agent,
}

/// One line of the agent conversation shown to the student.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AgentMessage {
    pub sender: Sender,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    pub content: String,
}

impl AgentMessage {
    fn user(content: String) -> Self {
        Self {
            sender: Sender::User,
            agent_name: None,
            content,
        }
    }

    fn agent(name: &str, content: String) -> Self {
        Self {
            sender: Sender::Agent,
            agent_name: Some(name.to_string()),
            content,
        }
    }
}

/// The step of the orchestration that did not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrchestrationStep {
    RetrieveContent,
    GenerateQuiz,
}

#[derive(Debug)]
pub enum Orchestration {
    Completed {
        content: String,
        quiz: GeneratedQuiz,
        transcript: Vec<AgentMessage>,
    },
    Failed {
        step: OrchestrationStep,
        error: PortError,
        transcript: Vec<AgentMessage>,
    },
}

//=========================================================================================
// QuizPipeline
//=========================================================================================

/// Runs the quiz-producing flows in sequence against the configured adapters.
#[derive(Clone)]
pub struct QuizPipeline {
    quizzes: Arc<dyn QuizGenerationService>,
    images: Arc<dyn ImageGenerationService>,
    content: Arc<dyn ContentService>,
}

impl QuizPipeline {
    pub fn new(
        quizzes: Arc<dyn QuizGenerationService>,
        images: Arc<dyn ImageGenerationService>,
        content: Arc<dyn ContentService>,
    ) -> Self {
        Self {
            quizzes,
            images,
            content,
        }
    }

    /// Generates a quiz and then its images.
    pub async fn generate(&self, request: &QuizRequest) -> PortResult<GeneratedQuiz> {
        let mut quiz = self.quizzes.generate_quiz(request).await?;
        if quiz.questions.is_empty() {
            return Err(PortError::Unexpected(
                "The AI failed to generate a valid quiz structure.".to_string(),
            ));
        }
        info!(
            "Generated quiz '{}' with {} questions on topic '{}'",
            quiz.title,
            quiz.questions.len(),
            request.topic
        );
        quiz.questions = attach_images(self.images.as_ref(), quiz.questions).await;
        Ok(quiz)
    }

    /// Builds a quiz from nothing but a topic: retrieve content, then quiz on it.
    pub async fn orchestrate(&self, topic: &str) -> Orchestration {
        let mut transcript = vec![AgentMessage::user(format!(
            "Generate a quiz about {}.",
            topic
        ))];

        // --- 1. Content Retriever ---
        let content = match self.content.retrieve_content(topic).await {
            Ok(content) if !content.trim().is_empty() => content,
            Ok(_) => {
                return Self::fail(
                    transcript,
                    OrchestrationStep::RetrieveContent,
                    PortError::Unexpected("Content retrieval returned no summary".to_string()),
                    topic,
                )
            }
            Err(e) => return Self::fail(transcript, OrchestrationStep::RetrieveContent, e, topic),
        };
        transcript.push(AgentMessage::agent(
            CONTENT_RETRIEVER,
            format!(
                "I've found and summarized the content for \"{}\". Passing it to the Quiz Generator agent.",
                topic
            ),
        ));

        // --- 2. Quiz Generator ---
        let request = QuizRequest {
            learning_content: content.clone(),
            topic: topic.to_string(),
            number_of_questions: DEFAULT_QUESTION_COUNT,
            difficulty: Difficulty::Medium,
        };
        match self.generate(&request).await {
            Ok(quiz) => {
                transcript.push(AgentMessage::agent(
                    QUIZ_GENERATOR,
                    "Your quiz is ready! Good luck.".to_string(),
                ));
                Orchestration::Completed {
                    content,
                    quiz,
                    transcript,
                }
            }
            Err(e) => Self::fail(transcript, OrchestrationStep::GenerateQuiz, e, topic),
        }
    }

    fn fail(
        mut transcript: Vec<AgentMessage>,
        step: OrchestrationStep,
        error: PortError,
        topic: &str,
    ) -> Orchestration {
        warn!("Orchestration for topic '{}' failed at {:?}: {}", topic, step, error);
        let content = match step {
            OrchestrationStep::RetrieveContent => format!(
                "I had trouble finding content on \"{}\". Please try another topic.",
                topic
            ),
            OrchestrationStep::GenerateQuiz => format!(
                "I had trouble generating a quiz for \"{}\". Please try again.",
                topic
            ),
        };
        transcript.push(AgentMessage::agent(SYSTEM_AGENT, content));
        Orchestration::Failed {
            step,
            error,
            transcript,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::QuestionKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn question(n: usize, prompt: Option<&str>) -> Question {
        Question {
            question: format!("Question {}", n),
            kind: QuestionKind::MultipleChoice,
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: "a".into(),
            image_prompt: prompt.map(str::to_string),
            image_url: None,
        }
    }

    /// Fails for any prompt containing "broken"; otherwise echoes a URL.
    struct FlakyImages {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ImageGenerationService for FlakyImages {
        async fn generate_image(&self, prompt: &str) -> PortResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if prompt.contains("broken") {
                Err(PortError::Unexpected("image backend unavailable".into()))
            } else {
                Ok(format!("https://images.test/{}", prompt.replace(' ', "-")))
            }
        }
    }

    struct FixedQuiz {
        quiz: GeneratedQuiz,
        seen: Mutex<Vec<QuizRequest>>,
    }

    #[async_trait]
    impl QuizGenerationService for FixedQuiz {
        async fn generate_quiz(&self, request: &QuizRequest) -> PortResult<GeneratedQuiz> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(self.quiz.clone())
        }
    }

    struct Content(Option<String>);

    #[async_trait]
    impl ContentService for Content {
        async fn summarize_content(&self, content: &str) -> PortResult<String> {
            Ok(content.to_string())
        }

        async fn retrieve_content(&self, _topic: &str) -> PortResult<String> {
            self.0
                .clone()
                .ok_or_else(|| PortError::Unexpected("retrieval failed".into()))
        }
    }

    fn images() -> Arc<FlakyImages> {
        Arc::new(FlakyImages {
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn one_failed_image_leaves_the_rest_populated() {
        let images = images();
        let questions = vec![
            question(0, Some("a red cell")),
            question(1, Some("broken prompt")),
            question(2, Some("a heart")),
            question(3, Some("a lung")),
        ];

        let out = attach_images(images.as_ref(), questions).await;

        assert_eq!(images.calls.load(Ordering::SeqCst), 4);
        assert_eq!(out.len(), 4);
        assert_eq!(out.iter().filter(|q| q.image_url.is_some()).count(), 3);
        assert!(out[1].image_url.is_none());
        assert_eq!(out[2].question, "Question 2");
        assert_eq!(out[2].image_url.as_deref(), Some("https://images.test/a-heart"));
    }

    #[tokio::test]
    async fn questions_without_prompts_are_not_sent() {
        let images = images();
        let out = attach_images(
            images.as_ref(),
            vec![question(0, None), question(1, Some("  ")), question(2, Some("x"))],
        )
        .await;
        assert_eq!(images.calls.load(Ordering::SeqCst), 1);
        assert!(out[0].image_url.is_none());
        assert!(out[2].image_url.is_some());
    }

    fn pipeline(quiz: GeneratedQuiz, content: Option<&str>) -> (QuizPipeline, Arc<FixedQuiz>) {
        let quizzes = Arc::new(FixedQuiz {
            quiz,
            seen: Mutex::new(Vec::new()),
        });
        let pipeline = QuizPipeline::new(
            quizzes.clone(),
            images(),
            Arc::new(Content(content.map(str::to_string))),
        );
        (pipeline, quizzes)
    }

    fn sample_quiz() -> GeneratedQuiz {
        GeneratedQuiz {
            title: "Photosynthesis Basics".into(),
            questions: vec![question(0, Some("a leaf")), question(1, Some("broken sun"))],
        }
    }

    #[tokio::test]
    async fn generate_rejects_empty_quiz() {
        let (pipeline, _) = pipeline(
            GeneratedQuiz {
                title: "Empty".into(),
                questions: vec![],
            },
            None,
        );
        let request = QuizRequest {
            learning_content: "text".into(),
            topic: "t".into(),
            number_of_questions: 5,
            difficulty: Difficulty::Easy,
        };
        assert!(pipeline.generate(&request).await.is_err());
    }

    #[tokio::test]
    async fn orchestrate_feeds_retrieved_content_into_quiz() {
        let (pipeline, quizzes) = pipeline(sample_quiz(), Some("Plants convert light."));

        match pipeline.orchestrate("Photosynthesis").await {
            Orchestration::Completed {
                content,
                quiz,
                transcript,
            } => {
                assert_eq!(content, "Plants convert light.");
                assert_eq!(quiz.questions.len(), 2);
                assert!(quiz.questions[0].image_url.is_some());
                assert!(quiz.questions[1].image_url.is_none());
                assert_eq!(transcript.len(), 3);
                assert_eq!(transcript[0].sender, Sender::User);
                assert_eq!(transcript[2].agent_name.as_deref(), Some(QUIZ_GENERATOR));
            }
            other => panic!("expected completion, got {:?}", other),
        }

        let seen = quizzes.seen.lock().unwrap();
        assert_eq!(seen[0].learning_content, "Plants convert light.");
        assert_eq!(seen[0].number_of_questions, DEFAULT_QUESTION_COUNT);
        assert_eq!(seen[0].difficulty, Difficulty::Medium);
    }

    #[tokio::test]
    async fn orchestrate_stops_when_retrieval_fails() {
        let (pipeline, quizzes) = pipeline(sample_quiz(), None);

        match pipeline.orchestrate("Photosynthesis").await {
            Orchestration::Failed {
                step, transcript, ..
            } => {
                assert_eq!(step, OrchestrationStep::RetrieveContent);
                assert_eq!(transcript.last().unwrap().agent_name.as_deref(), Some(SYSTEM_AGENT));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(quizzes.seen.lock().unwrap().is_empty());
    }

    struct FailingQuiz;

    #[async_trait]
    impl QuizGenerationService for FailingQuiz {
        async fn generate_quiz(&self, _request: &QuizRequest) -> PortResult<GeneratedQuiz> {
            Err(PortError::Unexpected("model returned malformed JSON".into()))
        }
    }

    #[tokio::test]
    async fn orchestrate_stops_when_quiz_generation_fails() {
        let images = images();
        let pipeline = QuizPipeline::new(
            Arc::new(FailingQuiz),
            images.clone(),
            Arc::new(Content(Some("Plants convert light.".into()))),
        );

        match pipeline.orchestrate("Photosynthesis").await {
            Orchestration::Failed {
                step,
                error,
                transcript,
            } => {
                assert_eq!(step, OrchestrationStep::GenerateQuiz);
                assert!(matches!(error, PortError::Unexpected(_)));
                assert_eq!(transcript.len(), 3);
                assert_eq!(transcript[1].agent_name.as_deref(), Some(CONTENT_RETRIEVER));
                assert_eq!(transcript[2].agent_name.as_deref(), Some(SYSTEM_AGENT));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(images.calls.load(Ordering::SeqCst), 0);
    }
}
