//! services/api/src/adapters/feedback_llm.rs
//!
//! This module contains the adapter for the adaptive feedback LLM.
//! It implements the `FeedbackService` port from the `core` crate.

use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use study_assistant_core::{
    domain::Feedback,
    ports::{FeedbackRequest, FeedbackService, PortError, PortResult},
};

use crate::adapters::chat::{complete, parse_structured, render, OutputFormat};

const SYSTEM_INSTRUCTIONS: &str = r#"You are an AI mentor providing adaptive feedback to a student based on their quiz results.

You always reply with a single JSON object of this exact shape:
{
  "overall_feedback": "markdown feedback on the attempt as a whole",
  "detailed_feedback": [
    { "question": "the text of a question the student got wrong", "explanation": "why the correct answer is correct and where the student went wrong" }
  ],
  "weak_concepts": ["short names of concepts the student should revisit"]
}

Only questions the student answered incorrectly (or did not answer) belong in "detailed_feedback"."#;

const USER_INPUT_TEMPLATE: &str = r#"Quiz: {{title}}
Score: {{score}} out of {{total}}
Student Knowledge Level: {{level}}
Feedback Tone: {{tone}}

Questions with the student's answers (JSON):
{{questions}}

Provide constructive and individualized feedback to help the student understand their mistakes and improve their learning.
Focus on specific areas where the student struggled and offer suggestions for further study.
Keep the feedback in the requested tone and tailored to the student's current knowledge level."#;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `FeedbackService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiFeedbackAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiFeedbackAdapter {
    /// Creates a new `OpenAiFeedbackAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl FeedbackService for OpenAiFeedbackAdapter {
    async fn provide_feedback(&self, request: &FeedbackRequest) -> PortResult<Feedback> {
        let questions = serde_json::to_string_pretty(&request.questions)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let score = request.score.to_string();
        let total = request.questions.len().to_string();
        let tone = request.feedback_tone.to_string();

        let user_input = render(
            USER_INPUT_TEMPLATE,
            &[
                ("title", request.quiz_title.as_str()),
                ("score", score.as_str()),
                ("total", total.as_str()),
                ("level", request.student_knowledge_level.as_str()),
                ("tone", tone.as_str()),
                ("questions", questions.as_str()),
            ],
        );

        let raw = complete(
            &self.client,
            &self.model,
            SYSTEM_INSTRUCTIONS,
            user_input,
            OutputFormat::Json,
        )
        .await?;

        let mut feedback: Feedback = parse_structured(&raw)?;
        if feedback
            .weak_concepts
            .as_ref()
            .is_some_and(|concepts| concepts.is_empty())
        {
            feedback.weak_concepts = None;
        }
        Ok(feedback)
    }
}
