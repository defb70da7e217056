//! Step extraction: paper text → ordered research-content steps.
//!
//! The model is asked for a one-key JSON object, but replies routinely come
//! wrapped in prose or code fences, and sometimes are not JSON at all. The
//! parser is defensive and never fails: an unusable reply becomes
//! [`StepExtraction::Unparseable`], which the caller reports instead of
//! drawing a broken diagram.
//!
//! Process steps are never read from the reply. [`ExtractedSteps`] always
//! carries [`PROCESS_STEPS`] unchanged.

use crate::config::RoadmapConfig;
use crate::error::{ParseFailure, RoadmapError};
use crate::prompts::{step_extraction_user_message, PROCESS_STEPS, STEP_EXTRACTION_PROMPT};
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

static RE_JSON_FENCE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^.*?```json\s*").unwrap());

// Greedy: first `{` to last `}`.
static RE_JSON_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[\s\S]*\}").unwrap());

/// Outcome of parsing a step-extraction reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepExtraction {
    /// The reply parsed. The list may be empty.
    Steps(Vec<String>),
    /// The reply could not be used.
    Unparseable(ParseFailure),
}

impl StepExtraction {
    /// The parsed steps, or an empty slice when unparseable.
    pub fn steps(&self) -> &[String] {
        match self {
            StepExtraction::Steps(s) => s,
            StepExtraction::Unparseable(_) => &[],
        }
    }

    /// True only for a parsed, non-empty list.
    pub fn is_usable(&self) -> bool {
        !self.steps().is_empty()
    }
}

/// Content steps plus the fixed process steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedSteps {
    pub content: StepExtraction,
    pub process_steps: Vec<String>,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl ExtractedSteps {
    /// Pair a parse outcome with the fixed process steps.
    pub fn from_extraction(content: StepExtraction) -> Self {
        Self {
            content,
            process_steps: fixed_process_steps(),
            input_tokens: 0,
            output_tokens: 0,
        }
    }

    /// Require a usable content list.
    pub fn into_content_steps(self) -> Result<Vec<String>, RoadmapError> {
        match self.content {
            StepExtraction::Steps(steps) if !steps.is_empty() => Ok(steps),
            StepExtraction::Steps(_) => Err(RoadmapError::ExtractionIncomplete {
                reason: "the model returned no content steps".to_string(),
            }),
            StepExtraction::Unparseable(failure) => Err(RoadmapError::ExtractionIncomplete {
                reason: failure.to_string(),
            }),
        }
    }
}

/// [`PROCESS_STEPS`] as owned strings.
pub fn fixed_process_steps() -> Vec<String> {
    PROCESS_STEPS.iter().map(|s| s.to_string()).collect()
}

/// Ask the model for the content steps of `text`.
///
/// API failures propagate; reply parsing never does.
pub async fn extract_steps(
    provider: &Arc<dyn LLMProvider>,
    text: &str,
    config: &RoadmapConfig,
) -> Result<ExtractedSteps, RoadmapError> {
    let messages = vec![
        ChatMessage::system(STEP_EXTRACTION_PROMPT),
        ChatMessage::user(step_extraction_user_message(text)),
    ];
    let options = build_options(config);

    let response = provider
        .chat(&messages, Some(&options))
        .await
        .map_err(|e| RoadmapError::LlmApiError {
            stage: "step extraction",
            message: e.to_string(),
        })?;

    debug!("Step extraction raw reply:\n{}", response.content);

    let content = parse_content_steps(&response.content);
    if let StepExtraction::Unparseable(ref failure) = content {
        warn!("Step reply unusable: {}", failure);
    }

    Ok(ExtractedSteps {
        content,
        process_steps: fixed_process_steps(),
        input_tokens: response.prompt_tokens,
        output_tokens: response.completion_tokens,
    })
}

/// Parse a model reply into content steps.
///
/// 1. drop everything up to and including the first ```` ```json ```` marker,
///    then every remaining ```` ``` ````;
/// 2. take the first-`{`-to-last-`}` span;
/// 3. strict JSON parse and read `content_steps`.
pub fn parse_content_steps(raw: &str) -> StepExtraction {
    let cleaned = RE_JSON_FENCE_PREFIX.replace(raw, "");
    let cleaned = cleaned.replace("```", "");
    let cleaned = cleaned.trim();

    let Some(m) = RE_JSON_OBJECT.find(cleaned) else {
        return StepExtraction::Unparseable(ParseFailure::NoJsonObject);
    };

    let value: Value = match serde_json::from_str(m.as_str()) {
        Ok(v) => v,
        Err(e) => return StepExtraction::Unparseable(ParseFailure::InvalidJson(e.to_string())),
    };

    let Some(steps) = value.get("content_steps") else {
        return StepExtraction::Unparseable(ParseFailure::MissingContentSteps);
    };

    match serde_json::from_value::<Vec<String>>(steps.clone()) {
        Ok(list) => StepExtraction::Steps(list),
        Err(e) => StepExtraction::Unparseable(ParseFailure::MalformedContentSteps(e.to_string())),
    }
}

fn build_options(config: &RoadmapConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: config.step_temperature,
        max_tokens: config.max_tokens,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steps(list: &[&str]) -> StepExtraction {
        StepExtraction::Steps(list.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn bare_json() {
        let raw = r#"{"content_steps": ["引言", "理论分析", "实证检验"]}"#;
        assert_eq!(parse_content_steps(raw), steps(&["引言", "理论分析", "实证检验"]));
    }

    #[test]
    fn fenced_json_matches_bare_json() {
        let bare = r#"{"content_steps": ["Literature Review", "Hypotheses"]}"#;
        let fenced = format!("Here is the result:\n```json\n{bare}\n```\nHope it helps.");
        assert_eq!(parse_content_steps(&fenced), parse_content_steps(bare));
    }

    #[test]
    fn plain_fence_without_language_tag() {
        let raw = "```\n{\"content_steps\": [\"A\"]}\n```";
        assert_eq!(parse_content_steps(raw), steps(&["A"]));
    }

    #[test]
    fn no_json_object_is_unparseable_not_a_panic() {
        assert_eq!(
            parse_content_steps("Sorry, I cannot help with that."),
            StepExtraction::Unparseable(ParseFailure::NoJsonObject)
        );
        assert_eq!(
            parse_content_steps(""),
            StepExtraction::Unparseable(ParseFailure::NoJsonObject)
        );
    }

    #[test]
    fn broken_json_is_unparseable() {
        let out = parse_content_steps(r#"{"content_steps": ["a", }"#);
        assert!(matches!(
            out,
            StepExtraction::Unparseable(ParseFailure::InvalidJson(_))
        ));
    }

    #[test]
    fn greedy_span_swallows_trailing_objects() {
        // Two objects: the greedy span covers both and is not valid JSON.
        let raw = r#"{"content_steps": ["a"]} and also {"x": 1}"#;
        assert!(matches!(
            parse_content_steps(raw),
            StepExtraction::Unparseable(ParseFailure::InvalidJson(_))
        ));
    }

    #[test]
    fn missing_key_and_wrong_shape() {
        assert_eq!(
            parse_content_steps(r#"{"steps": ["a"]}"#),
            StepExtraction::Unparseable(ParseFailure::MissingContentSteps)
        );
        assert!(matches!(
            parse_content_steps(r#"{"content_steps": "a, b"}"#),
            StepExtraction::Unparseable(ParseFailure::MalformedContentSteps(_))
        ));
    }

    #[test]
    fn empty_list_is_parsed_but_not_usable() {
        let out = parse_content_steps(r#"{"content_steps": []}"#);
        assert_eq!(out, StepExtraction::Steps(vec![]));
        assert!(!out.is_usable());
    }

    #[test]
    fn process_steps_ignore_model_output() {
        let raw = r#"{"content_steps": ["a"], "process_steps": ["hijacked"]}"#;
        let extracted = ExtractedSteps::from_extraction(parse_content_steps(raw));
        assert_eq!(extracted.process_steps, fixed_process_steps());
        assert_eq!(extracted.content, steps(&["a"]));

        let failed = ExtractedSteps::from_extraction(parse_content_steps("nothing"));
        assert_eq!(failed.process_steps.len(), 6);
    }

    #[test]
    fn incomplete_extraction_errors_keep_the_cause() {
        let empty = ExtractedSteps::from_extraction(StepExtraction::Steps(vec![]));
        match empty.into_content_steps() {
            Err(RoadmapError::ExtractionIncomplete { reason }) => {
                assert!(reason.contains("no content steps"))
            }
            other => panic!("unexpected: {other:?}"),
        }

        let bad = ExtractedSteps::from_extraction(StepExtraction::Unparseable(
            ParseFailure::NoJsonObject,
        ));
        match bad.into_content_steps() {
            Err(RoadmapError::ExtractionIncomplete { reason }) => {
                assert!(reason.contains("no JSON object"))
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn build_options_defaults() {
        let opts = build_options(&RoadmapConfig::default());
        assert_eq!(opts.temperature, None);
        assert_eq!(opts.max_tokens, None);
    }
}
