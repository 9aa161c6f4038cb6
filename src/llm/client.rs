use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::IssueCategory;

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Name of the tool the detector must call with its findings
pub const SUBMIT_ISSUES_TOOL: &str = "submit_issues";

/// Configuration for the Anthropic API client
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key (from ANTHROPIC_API_KEY env var)
    pub api_key: String,
    /// Model used to detect issues across a whole transcript
    pub model: String,
    /// Temperature for detection (0-1, lower = more deterministic)
    pub temperature: f64,
    /// Maximum tokens in a detection response
    pub max_tokens: u32,
    /// Model used to apply a single fix to a single line
    pub fix_model: String,
    /// Temperature for per-line fixes
    pub fix_temperature: f64,
    /// Maximum tokens in a per-line fix response
    pub fix_max_tokens: u32,
}

impl AnthropicConfig {
    /// Create config from environment variables
    ///
    /// `PROOFMARK_MODEL` and `PROOFMARK_FIX_MODEL` override the default models.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .context("ANTHROPIC_API_KEY environment variable not set")?;

        let mut config = Self::new(api_key);
        if let Ok(model) = std::env::var("PROOFMARK_MODEL") {
            config.model = model;
        }
        if let Ok(model) = std::env::var("PROOFMARK_FIX_MODEL") {
            config.fix_model = model;
        }
        Ok(config)
    }

    /// Create with default models
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            model: "claude-sonnet-4-20250514".to_string(),
            temperature: 0.3,
            max_tokens: 8192,
            fix_model: "claude-3-5-haiku-latest".to_string(),
            fix_temperature: 0.1,
            fix_max_tokens: 500,
        }
    }
}

/// Anthropic API client.
///
/// Build one per process and pass it by reference to whatever needs it.
pub struct AnthropicClient {
    client: Client,
    config: AnthropicConfig,
}

impl AnthropicClient {
    pub fn new(config: AnthropicConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    async fn post(&self, request: &MessagesRequest<'_>) -> Result<AnthropicResponse> {
        let response = self
            .client
            .post(MESSAGES_URL)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .context("Failed to send request to Anthropic API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Anthropic API error: {} - {}", status, body);
        }

        response
            .json()
            .await
            .context("Failed to parse Anthropic API response")
    }

    /// Send a plain message with the fix model and return the reply text
    pub async fn send_message(&self, system: &str, user: &str) -> Result<String> {
        let request = MessagesRequest::new(
            &self.config.fix_model,
            self.config.fix_max_tokens,
            self.config.fix_temperature,
            system,
            user,
        );

        let response = self.post(&request).await?;

        response
            .content
            .into_iter()
            .find(|block| block.content_type == "text")
            .map(|block| block.text)
            .context("No text content in response")
    }

    /// Ask the detection model for issues, forcing the `submit_issues` tool.
    ///
    /// Returns the raw tool input; schema validation is the caller's job.
    pub async fn send_with_tool(&self, system: &str, user: &str) -> Result<serde_json::Value> {
        let mut request = MessagesRequest::new(
            &self.config.model,
            self.config.max_tokens,
            self.config.temperature,
            system,
            user,
        );
        request.tools = vec![submit_issues_tool()];
        request.tool_choice = Some(ToolChoice {
            choice_type: "tool",
            name: SUBMIT_ISSUES_TOOL,
        });

        let response = self.post(&request).await?;

        let input = response
            .content
            .into_iter()
            .filter(|block| block.content_type == "tool_use")
            .find(|block| block.name.as_deref() == Some(SUBMIT_ISSUES_TOOL))
            .and_then(|block| block.input)
            .with_context(|| format!("No {} tool call in response", SUBMIT_ISSUES_TOOL))?;

        debug!("Received {} tool input", SUBMIT_ISSUES_TOOL);
        Ok(input)
    }
}

/// Tool definition mirroring the issue schema
fn submit_issues_tool() -> Tool {
    let categories: Vec<&str> = IssueCategory::DETECTABLE.iter().map(|c| c.as_str()).collect();

    Tool {
        name: SUBMIT_ISSUES_TOOL,
        description: "Submit every detected transcript issue",
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "issues": {
                    "type": "array",
                    "description": "Array of detected issues",
                    "items": {
                        "type": "object",
                        "properties": {
                            "line_number": {
                                "type": "integer",
                                "minimum": 1,
                                "description": "1-based line number where the issue occurs"
                            },
                            "category": {"type": "string", "enum": categories},
                            "severity": {"type": "string", "enum": ["blocking", "review", "info"]},
                            "description": {
                                "type": "string",
                                "description": "Brief description of the issue"
                            },
                            "suggested_fix": {
                                "type": "string",
                                "description": "Minimal instruction, at most one sentence, not a rewrite"
                            },
                            "confidence": {"type": "number", "minimum": 0, "maximum": 1}
                        },
                        "required": ["line_number", "category", "severity", "description", "suggested_fix", "confidence"],
                        "additionalProperties": false
                    }
                }
            },
            "required": ["issues"],
            "additionalProperties": false
        }),
    }
}

/// Messages API request body; tools are only sent for detection
#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    system: &'a str,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

impl<'a> MessagesRequest<'a> {
    fn new(
        model: &'a str,
        max_tokens: u32,
        temperature: f64,
        system: &'a str,
        user: &'a str,
    ) -> Self {
        Self {
            model,
            max_tokens,
            temperature,
            system,
            messages: vec![Message {
                role: "user",
                content: user,
            }],
            tools: Vec::new(),
            tool_choice: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct Tool {
    name: &'static str,
    description: &'static str,
    input_schema: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ToolChoice {
    #[serde(rename = "type")]
    choice_type: &'static str,
    name: &'static str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    input: Option<serde_json::Value>,
}
