//! LLM-backed step reasoner.
//!
//! Builds a single-turn prompt from the task, the progress so far and the
//! current element list, sends it to an Ollama-compatible completion
//! endpoint, and extracts one decision from the reply. Replies that do not
//! conform to the expected JSON shape are surfaced as opaque text rather
//! than failing the call; downstream code matches on the two-variant
//! [`Decision`] union instead of probing fields.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::element::Element;
use crate::error::ReasonError;

/// Inputs for one reasoning call.
#[derive(Debug)]
pub struct StepContext<'a> {
    pub original_task: &'a str,
    pub step_count: usize,
    pub max_steps: usize,
    pub history: &'a [String],
    pub elements: &'a [Element],
}

/// Self-reported confidence label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// A reasoner reply that parsed into the expected shape.
#[derive(Debug, Clone, Deserialize)]
pub struct StructuredDecision {
    #[serde(default)]
    pub target_element_id: Option<usize>,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub step_description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub confidence: Option<Confidence>,
}

/// Reasoner output: the structured shape, or the raw text the model
/// produced when it did not conform.
#[derive(Debug, Clone)]
pub enum Decision {
    Structured(StructuredDecision),
    Opaque(String),
}

/// Reasoner collaborator contract.
#[async_trait]
pub trait Reasoner: Send + Sync {
    async fn decide(&self, ctx: &StepContext<'_>) -> Result<Decision, ReasonError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f64,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Client for an Ollama-compatible `/api/generate` endpoint.
#[derive(Debug, Clone)]
pub struct LlmReasoner {
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
    client: reqwest::Client,
}

impl LlmReasoner {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into(),
            model: model.into(),
            max_tokens: 400,
            temperature: 0.1,
            client,
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Check if the LLM endpoint is reachable
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);

        match self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl Reasoner for LlmReasoner {
    async fn decide(&self, ctx: &StepContext<'_>) -> Result<Decision, ReasonError> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: &self.model,
            prompt: build_prompt(ctx),
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
                num_predict: self.max_tokens,
            },
        };

        let resp = self.client.post(&url).json(&request).send().await?;
        if !resp.status().is_success() {
            return Err(ReasonError::Status {
                status: resp.status().as_u16(),
            });
        }

        let body: GenerateResponse = resp.json().await?;
        debug!(chars = body.response.len(), "llm replied");
        Ok(extract_decision(&body.response))
    }
}

/// Build the single-turn planning prompt.
fn build_prompt(ctx: &StepContext<'_>) -> String {
    let screen_elements = ctx
        .elements
        .iter()
        .map(|e| format!("Element {}: {}", e.id, e.content))
        .collect::<Vec<_>>()
        .join("\n");

    let progress_info = if ctx.history.is_empty() {
        String::new()
    } else {
        format!("\nSteps already completed: {}", ctx.history.join(", "))
    };

    format!(
        r#"You are a computer use agent helping a user complete a multi-step task. Analyze the current screen and decide the NEXT action needed.

ORIGINAL TASK: {task}
CURRENT STEP: {step}/{max_steps}{progress_info}

CURRENT SCREEN ELEMENTS:
{screen_elements}

Instructions:
1. Consider the original task and what steps have already been completed
2. Identify what the NEXT logical step should be
3. Find the element (by ID) that helps accomplish this next step
4. If the task appears to be completely finished, set completed to true
5. If no suitable element exists for the next step, set target_element_id to null

Respond in this JSON format:
{{
    "target_element_id": <number or null>,
    "reasoning": "<your reasoning about what step to take next>",
    "action": "<click/type/etc>",
    "step_description": "<brief description of this step>",
    "completed": <true/false - true if the entire original task is now complete>,
    "confidence": "<high/medium/low>"
}}

Only respond with the JSON object, nothing else."#,
        task = ctx.original_task,
        step = ctx.step_count + 1,
        max_steps = ctx.max_steps,
    )
}

/// Extract a JSON block from a markdown code fence, if any.
fn extract_json_block(content: &str) -> Option<&str> {
    let patterns = ["```json\n", "```JSON\n", "```\n"];

    for pattern in patterns {
        if let Some(start) = content.find(pattern) {
            let json_start = start + pattern.len();
            if let Some(end) = content[json_start..].find("```") {
                return Some(content[json_start..json_start + end].trim());
            }
        }
    }

    None
}

/// Tolerant extraction: strip markdown fences, then try the structured
/// shape once. Anything that does not parse comes back as opaque text.
pub fn extract_decision(raw: &str) -> Decision {
    let trimmed = raw.trim();
    let candidate = extract_json_block(trimmed).unwrap_or(trimmed);

    match serde_json::from_str::<StructuredDecision>(candidate) {
        Ok(decision) => Decision::Structured(decision),
        Err(_) => Decision::Opaque(trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::BoundingBox;
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn test_extract_decision_raw_json() {
        let raw = r#"{"target_element_id": 15, "reasoning": "click the address bar", "completed": false, "confidence": "high"}"#;
        match extract_decision(raw) {
            Decision::Structured(d) => {
                assert_eq!(d.target_element_id, Some(15));
                assert_eq!(d.reasoning, "click the address bar");
                assert!(!d.completed);
                assert_eq!(d.confidence, Some(Confidence::High));
            }
            Decision::Opaque(_) => panic!("expected structured decision"),
        }
    }

    #[test]
    fn test_extract_decision_markdown_fence() {
        let raw = "```json\n{\"target_element_id\": null, \"reasoning\": \"done\", \"completed\": true}\n```";
        match extract_decision(raw) {
            Decision::Structured(d) => {
                assert_eq!(d.target_element_id, None);
                assert!(d.completed);
            }
            Decision::Opaque(_) => panic!("expected structured decision"),
        }
    }

    #[test]
    fn test_extract_decision_nonconforming_text_is_opaque() {
        let raw = "I think you should click the settings icon.";
        match extract_decision(raw) {
            Decision::Opaque(text) => assert_eq!(text, raw),
            Decision::Structured(_) => panic!("expected opaque decision"),
        }
    }

    #[test]
    fn test_extract_decision_null_target() {
        let raw = r#"{"target_element_id": null, "reasoning": "nothing actionable", "completed": false}"#;
        match extract_decision(raw) {
            Decision::Structured(d) => assert_eq!(d.target_element_id, None),
            Decision::Opaque(_) => panic!("expected structured decision"),
        }
    }

    #[test]
    fn test_build_prompt_lists_elements_and_history() {
        let elements = vec![
            Element {
                id: 0,
                content: "Back".to_string(),
                bounding_box: None,
            },
            Element {
                id: 1,
                content: "Settings icon".to_string(),
                bounding_box: Some(BoundingBox([0.1, 0.1, 0.2, 0.2])),
            },
        ];
        let history = vec!["Clicked Back".to_string()];
        let ctx = StepContext {
            original_task: "open settings",
            step_count: 1,
            max_steps: 5,
            history: &history,
            elements: &elements,
        };

        let prompt = build_prompt(&ctx);
        assert!(prompt.contains("ORIGINAL TASK: open settings"));
        assert!(prompt.contains("CURRENT STEP: 2/5"));
        assert!(prompt.contains("Element 1: Settings icon"));
        assert!(prompt.contains("Steps already completed: Clicked Back"));
    }

    #[tokio::test]
    async fn test_decide_parses_generate_response() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(200).json_body(json!({
                "response": "{\"target_element_id\": 0, \"reasoning\": \"go\", \"completed\": true}"
            }));
        });

        let reasoner = LlmReasoner::new(server.base_url(), "llama3.2", Duration::from_secs(5));
        let elements = vec![Element {
            id: 0,
            content: "Settings icon".to_string(),
            bounding_box: None,
        }];
        let ctx = StepContext {
            original_task: "open settings",
            step_count: 0,
            max_steps: 1,
            history: &[],
            elements: &elements,
        };

        match reasoner.decide(&ctx).await.unwrap() {
            Decision::Structured(d) => {
                assert_eq!(d.target_element_id, Some(0));
                assert!(d.completed);
            }
            Decision::Opaque(_) => panic!("expected structured decision"),
        }
    }

    #[tokio::test]
    async fn test_decide_server_error_maps_to_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(503);
        });

        let reasoner = LlmReasoner::new(server.base_url(), "llama3.2", Duration::from_secs(5));
        let ctx = StepContext {
            original_task: "open settings",
            step_count: 0,
            max_steps: 1,
            history: &[],
            elements: &[],
        };

        match reasoner.decide(&ctx).await.unwrap_err() {
            ReasonError::Status { status } => assert_eq!(status, 503),
            other => panic!("expected status error, got {other}"),
        }
    }
}
