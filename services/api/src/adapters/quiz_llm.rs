//! services/api/src/adapters/quiz_llm.rs
//!
//! This module contains the adapter for the quiz-generating LLM.
//! It implements the `QuizGenerationService` port from the `core` crate.

const SYSTEM_INSTRUCTIONS: &str = r#"You are an expert quiz generator for students, specializing in educational content.

You always reply with a single JSON object of this exact shape:
{
  "title": "A creative title for the quiz",
  "questions": [
    {
      "question": "The text of the question",
      "type": "multiple-choice",
      "options": ["option 1", "option 2", "option 3", "option 4"],
      "correct_answer": "the option that is correct, copied exactly",
      "image_prompt": "A detailed, descriptive full-sentence prompt for a text-to-image model that would produce a photorealistic, relevant image for this question."
    }
  ]
}"#;

const USER_INPUT_TEMPLATE: &str = r#"Generate a quiz based on the provided learning content, topic, and difficulty level. The quiz must have exactly {{count}} questions.

All questions MUST be of type 'multiple-choice'. Each question must have exactly 4 options, and one of them must be the correct answer.

For each question, also write a detailed, descriptive text prompt for a text-to-image model to create a relevant, photorealistic image. Store it in the 'image_prompt' field.

The difficulty should align with Bloom's Taxonomy:
- 'easy': Focus on Remembering and Understanding (e.g., definitions, facts, explaining concepts).
- 'medium': Focus on Applying and Analyzing (e.g., using information in new situations, drawing connections).
- 'hard': Focus on Evaluating and Creating (e.g., justifying a stance, producing new or original work).

Topic: {{topic}}
Difficulty: {{difficulty}}
Learning Content:
---
{{content}}
---"#;

use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use study_assistant_core::{
    domain::{GeneratedQuiz, Question, QuestionKind},
    ports::{PortResult, QuizGenerationService, QuizRequest},
};
use tracing::warn;

use crate::adapters::chat::{complete, parse_structured, render, OutputFormat};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `QuizGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiQuizAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiQuizAdapter {
    /// Creates a new `OpenAiQuizAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

/// Drops unusable questions and trims the set to the requested size.
fn tidy_questions(mut questions: Vec<Question>, wanted: usize) -> Vec<Question> {
    questions.retain(|q| !q.question.trim().is_empty() && !q.correct_answer.trim().is_empty());
    for q in &questions {
        if q.kind == QuestionKind::MultipleChoice && !q.options.contains(&q.correct_answer) {
            warn!(
                "Generated question {:?} has a correct answer that is not among its options",
                q.question
            );
        }
    }
    questions.truncate(wanted);
    questions
}

//=========================================================================================
// `QuizGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl QuizGenerationService for OpenAiQuizAdapter {
    /// Generates the quiz structure and one image prompt per question.
    async fn generate_quiz(&self, request: &QuizRequest) -> PortResult<GeneratedQuiz> {
        let count = request.number_of_questions.to_string();
        let user_input = render(
            USER_INPUT_TEMPLATE,
            &[
                ("count", count.as_str()),
                ("topic", request.topic.as_str()),
                ("difficulty", request.difficulty.as_str()),
                ("content", request.learning_content.as_str()),
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

        let mut quiz: GeneratedQuiz = parse_structured(&raw)?;
        quiz.questions = tidy_questions(quiz.questions, request.number_of_questions as usize);
        Ok(quiz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(text: &str, answer: &str) -> Question {
        Question {
            question: text.into(),
            kind: QuestionKind::MultipleChoice,
            options: vec!["A".into(), "B".into()],
            correct_answer: answer.into(),
            image_prompt: None,
            image_url: None,
        }
    }

    #[test]
    fn tidy_drops_blank_questions_and_truncates() {
        let out = tidy_questions(
            vec![q("one", "A"), q("  ", "A"), q("two", ""), q("three", "B"), q("four", "A")],
            2,
        );
        let texts: Vec<_> = out.iter().map(|q| q.question.as_str()).collect();
        assert_eq!(texts, vec!["one", "three"]);
    }

    #[test]
    fn model_output_parses_into_generated_quiz() {
        let raw = r#"{"title":"Cells","questions":[{"question":"Powerhouse?","type":"multiple-choice","options":["Nucleus","Mitochondria","Ribosome","Golgi"],"correct_answer":"Mitochondria","image_prompt":"A cell"}]}"#;
        let quiz: GeneratedQuiz = parse_structured(raw).unwrap();
        assert_eq!(quiz.title, "Cells");
        assert_eq!(quiz.questions[0].image_prompt.as_deref(), Some("A cell"));
    }
}
