//! Diagram-description generation: steps → Mermaid text.
//!
//! One system message (built by [`crate::prompts::build_diagram_prompt`]),
//! deterministic sampling, reply passed through trimmed. The reply is not
//! validated; whatever the model writes goes to the renderer, which is the
//! component that actually knows the grammar.

use crate::config::RoadmapConfig;
use crate::error::RoadmapError;
use crate::prompts::build_diagram_prompt;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use tracing::debug;

/// Model reply for the diagram call.
#[derive(Debug, Clone)]
pub struct GeneratedDescription {
    /// Reply trimmed of surrounding whitespace.
    pub description: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

/// Ask the model for a Mermaid description of the two tracks.
pub async fn generate_description(
    provider: &Arc<dyn LLMProvider>,
    content_steps: &[String],
    process_steps: &[String],
    config: &RoadmapConfig,
) -> Result<GeneratedDescription, RoadmapError> {
    let prompt = build_diagram_prompt(content_steps, process_steps);
    debug!("Diagram prompt: {} chars", prompt.chars().count());

    let messages = vec![ChatMessage::system(prompt)];
    let options = build_options(config);

    let response = provider
        .chat(&messages, Some(&options))
        .await
        .map_err(|e| RoadmapError::LlmApiError {
            stage: "diagram generation",
            message: e.to_string(),
        })?;

    debug!("Diagram raw reply:\n{}", response.content);

    Ok(GeneratedDescription {
        description: response.content.trim().to_string(),
        input_tokens: response.prompt_tokens,
        output_tokens: response.completion_tokens,
    })
}

fn build_options(config: &RoadmapConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.diagram_temperature),
        max_tokens: config.max_tokens,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampling_is_deterministic_by_default() {
        let opts = build_options(&RoadmapConfig::default());
        assert_eq!(opts.temperature, Some(0.0));
        assert_eq!(opts.max_tokens, None);
    }

    #[test]
    fn max_tokens_is_forwarded() {
        let config = RoadmapConfig::builder().max_tokens(2048).build().unwrap();
        assert_eq!(build_options(&config).max_tokens, Some(2048));
    }
}
