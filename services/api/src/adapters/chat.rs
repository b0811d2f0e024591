//! services/api/src/adapters/chat.rs
//!
//! Shared plumbing for the prompt-based flows: one system message, one templated
//! user message, one chat completion. Structured flows ask for a JSON object and
//! parse it with serde.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use regex::Regex;
use serde::de::DeserializeOwned;
use study_assistant_core::ports::{PortError, PortResult};
use tracing::debug;

/// Whether the model is asked for free text or for a single JSON object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Fills `{{name}}` placeholders in a prompt template.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (name, value)| {
        acc.replace(&format!("{{{{{}}}}}", name), value)
    })
}

/// Runs one chat completion and returns the text of the first choice.
pub async fn complete(
    client: &Client<OpenAIConfig>,
    model: &str,
    system: &str,
    user: String,
    format: OutputFormat,
) -> PortResult<String> {
    let messages = vec![
        ChatCompletionRequestSystemMessageArgs::default()
            .content(system)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .into(),
        ChatCompletionRequestUserMessageArgs::default()
            .content(user)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .into(),
    ];

    let mut args = CreateChatCompletionRequestArgs::default();
    args.model(model).messages(messages).n(1);
    if format == OutputFormat::Json {
        args.response_format(ResponseFormat::JsonObject);
    }
    let request = args
        .build()
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

    // Map the error manually, which respects the orphan rule.
    let response = client
        .chat()
        .create(request)
        .await
        .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

    let content = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| PortError::Unexpected("LLM returned no choices in its response.".to_string()))?
        .message
        .content
        .ok_or_else(|| PortError::Unexpected("LLM response contained no text content.".to_string()))?;

    debug!("{} answered with {} characters", model, content.len());
    Ok(content)
}

/// Strips an optional markdown code fence around a JSON payload.
pub fn strip_code_fence(raw: &str) -> PortResult<&str> {
    let fence = Regex::new(r"(?s)^\s*```[A-Za-z]*\s*(.*?)\s*```\s*$")
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
    Ok(match fence.captures(raw).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => raw.trim(),
    })
}

/// Parses the structured output of a flow into its schema type.
pub fn parse_structured<T: DeserializeOwned>(raw: &str) -> PortResult<T> {
    let body = strip_code_fence(raw)?;
    serde_json::from_str(body).map_err(|e| {
        PortError::Unexpected(format!("LLM output did not match the expected schema: {}", e))
    })
}
