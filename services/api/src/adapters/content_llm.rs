//! services/api/src/adapters/content_llm.rs
//!
//! This module contains the adapter for the free-text study flows: summarizing
//! supplied content, retrieving content for a topic, and writing study plans.
//! It implements the `ContentService` and `StudyPlanService` ports.

use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use serde::Deserialize;
use study_assistant_core::ports::{
    ContentService, PortResult, StudyPlanRequest, StudyPlanService,
};

use crate::adapters::chat::{complete, parse_structured, render, OutputFormat};

const SUMMARIZE_INSTRUCTIONS: &str = "Summarize the following learning content for a student. Be concise and focus on the key concepts. Reply with a JSON object of the shape {\"summary\": \"...\"}.";

const RETRIEVE_INSTRUCTIONS: &str = r#"You are a Content Retriever Agent. Your task is to provide a comprehensive and easy-to-understand summary on a given topic.

Your response should be structured as if you have fetched and synthesized information from trusted educational sources like Wikipedia, GeeksforGeeks, and TutorialsPoint.

The summary must be understandable, concise, and tailored to the chosen topic.
Reply with a JSON object of the shape {"summary": "..."}."#;

const STUDY_PLAN_INSTRUCTIONS: &str = "You are an AI assistant designed to create personalized study plans for students.";

const STUDY_PLAN_TEMPLATE: &str = r#"Based on the student's progress, knowledge gaps, and learning objectives, create a study plan that addresses these areas.

Student Progress: {{progress}}
Knowledge Gaps: {{gaps}}
Learning Objectives: {{objectives}}

Create a detailed and actionable study plan that the student can follow to improve their understanding and achieve their learning objectives.
Respond in markdown format."#;

#[derive(Deserialize)]
struct SummaryOutput {
    summary: String,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the study content ports using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiContentAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiContentAdapter {
    /// Creates a new `OpenAiContentAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    async fn summary(&self, instructions: &str, input: String) -> PortResult<String> {
        let raw = complete(
            &self.client,
            &self.model,
            instructions,
            input,
            OutputFormat::Json,
        )
        .await?;
        let output: SummaryOutput = parse_structured(&raw)?;
        Ok(output.summary)
    }
}

#[async_trait]
impl ContentService for OpenAiContentAdapter {
    async fn summarize_content(&self, content: &str) -> PortResult<String> {
        self.summary(SUMMARIZE_INSTRUCTIONS, format!("Content: {}", content))
            .await
    }

    async fn retrieve_content(&self, topic: &str) -> PortResult<String> {
        self.summary(
            RETRIEVE_INSTRUCTIONS,
            format!("Topic: {}\n\nGenerate the summary now.", topic),
        )
        .await
    }
}

#[async_trait]
impl StudyPlanService for OpenAiContentAdapter {
    async fn create_study_plan(&self, request: &StudyPlanRequest) -> PortResult<String> {
        let user_input = render(
            STUDY_PLAN_TEMPLATE,
            &[
                ("progress", request.student_progress.as_str()),
                ("gaps", request.knowledge_gaps.as_str()),
                ("objectives", request.learning_objectives.as_str()),
            ],
        );
        let plan = complete(
            &self.client,
            &self.model,
            STUDY_PLAN_INSTRUCTIONS,
            user_input,
            OutputFormat::Text,
        )
        .await?;
        Ok(plan.trim().to_string())
    }
}
