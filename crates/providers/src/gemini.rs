//! Google Gemini provider implementation.
//!
//! Uses the `generateContent` REST endpoint directly.
//!
//! Features:
//! - `x-goog-api-key` header authentication
//! - System directive as the top-level `systemInstruction`
//! - Function calling through `functionDeclarations`
//! - Tool results sent as `user` turns, since `contents` only knows `user`
//!   and `model`

use async_trait::async_trait;
use shellsmith_core::error::ProviderError;
use shellsmith_core::message::{Role, Turn};
use shellsmith_core::provider::*;
use shellsmith_core::tool::ToolCall;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini `generateContent` provider.
pub struct GeminiProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Create a new Gemini provider.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            name: "gemini".into(),
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Convert turns to Gemini `contents`.
    fn to_api_contents(turns: &[Turn]) -> Vec<GeminiContent> {
        turns
            .iter()
            .map(|turn| GeminiContent {
                role: match turn.role {
                    Role::Human | Role::ToolResult => "user".into(),
                    Role::Model => "model".into(),
                },
                parts: turn
                    .parts
                    .iter()
                    .map(|text| GeminiPart { text: text.clone() })
                    .collect(),
            })
            .collect()
    }

    /// Convert tool definitions to a single `functionDeclarations` block.
    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<GeminiTool> {
        if tools.is_empty() {
            return Vec::new();
        }
        vec![GeminiTool {
            function_declarations: tools
                .iter()
                .map(|t| FunctionDeclaration {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: uppercase_schema_types(&t.parameters),
                })
                .collect(),
        }]
    }

    fn build_body(request: &ProviderRequest) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: Self::to_api_contents(&request.turns),
            system_instruction: (!request.system_directive.is_empty()).then(|| {
                SystemInstruction {
                    parts: vec![GeminiPart {
                        text: request.system_directive.clone(),
                    }],
                }
            }),
            tools: Self::to_api_tools(&request.tools),
            generation_config: GenerationConfig {
                temperature: request.temperature,
            },
        }
    }

    fn response_to_provider_response(
        resp: GenerateContentResponse,
        requested_model: &str,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let candidate = resp.candidates.into_iter().next().ok_or_else(|| {
            let reason = resp
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates".into());
            ProviderError::InvalidResponse(format!("Gemini returned no candidates ({reason})"))
        })?;

        let finish_reason = candidate.finish_reason;
        let mut text = String::new();
        let mut tool_calls = Vec::new();

        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            match part {
                ResponsePart::FunctionCall { function_call } => {
                    tool_calls.push(ToolCall::new(function_call.name, function_call.args));
                }
                ResponsePart::Text { text: t, thought } => {
                    if !thought {
                        text.push_str(&t);
                    }
                }
                ResponsePart::Other(_) => {}
            }
        }

        if text.is_empty() && tool_calls.is_empty() {
            let reason = finish_reason.unwrap_or_else(|| "no content".into());
            return Err(ProviderError::InvalidResponse(format!(
                "Gemini returned an empty candidate (finishReason: {reason})"
            )));
        }

        let usage = resp.usage_metadata.map(|u| Usage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        });

        Ok(ProviderResponse {
            text,
            tool_calls,
            usage,
            model: resp
                .model_version
                .unwrap_or_else(|| requested_model.to_string()),
        })
    }
}

/// Gemini's schema dialect spells types in upper case (`OBJECT`, `STRING`).
fn uppercase_schema_types(schema: &serde_json::Value) -> serde_json::Value {
    match schema {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let v = match (k.as_str(), v) {
                        ("type", serde_json::Value::String(t)) => {
                            serde_json::Value::String(t.to_uppercase())
                        }
                        _ => uppercase_schema_types(v),
                    };
                    (k.clone(), v)
                })
                .collect(),
        ),
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(uppercase_schema_types).collect())
        }
        other => other.clone(),
    }
}

fn status_to_error(status: u16, body: String, model: &str) -> ProviderError {
    match status {
        429 => ProviderError::RateLimited {
            retry_after_secs: 5,
        },
        401 | 403 => ProviderError::AuthenticationFailed("Invalid Gemini API key".into()),
        404 => ProviderError::ModelNotFound(model.to_string()),
        _ => ProviderError::ApiError {
            status_code: status,
            message: body,
        },
    }
}

#[async_trait]
impl shellsmith_core::Provider for GeminiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, request.model
        );
        let body = Self::build_body(&request);

        debug!(
            provider = "gemini",
            model = %request.model,
            turns = request.turns.len(),
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Gemini API error");
            return Err(status_to_error(status, error_body, &request.model));
        }

        let api_resp: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse Gemini response: {e}")))?;

        Self::response_to_provider_response(api_resp, &request.model)
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let url = format!("{}/v1beta/models?pageSize=1", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        Ok(response.status().is_success())
    }
}

// --- Gemini API types ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTool>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct FunctionDeclaration {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResponsePart {
    FunctionCall {
        #[serde(rename = "functionCall")]
        function_call: FunctionCall,
    },
    Text {
        text: String,
        #[serde(default)]
        thought: bool,
    },
    Other(serde_json::Value),
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use shellsmith_core::Provider;

    #[test]
    fn constructor() {
        let provider = GeminiProvider::new("test-key");
        assert_eq!(provider.name(), "gemini");
        assert_eq!(provider.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn constructor_with_base_url() {
        let provider = GeminiProvider::new("test-key").with_base_url("http://localhost:9000/");
        assert_eq!(provider.base_url, "http://localhost:9000");
    }

    #[test]
    fn tool_results_are_sent_as_user_turns() {
        let turns = vec![
            Turn::human("Build a portfolio site"),
            Turn::tool_result("executeCommand", "Command output", "Command executed"),
            Turn::model("Done!"),
        ];
        let contents = GeminiProvider::to_api_contents(&turns);
        let roles: Vec<&str> = contents.iter().map(|c| c.role.as_str()).collect();
        assert_eq!(roles, vec!["user", "user", "model"]);

        let json = serde_json::to_value(&contents[1]).unwrap();
        assert_eq!(json["parts"][0]["text"], "Command output:\nCommand executed");
    }

    #[test]
    fn schema_types_are_uppercased() {
        let schema = serde_json::json!({
            "type": "object",
            "properties": {
                "command": { "type": "string", "description": "type of thing" }
            },
            "required": ["command"]
        });
        let converted = uppercase_schema_types(&schema);
        assert_eq!(converted["type"], "OBJECT");
        assert_eq!(converted["properties"]["command"]["type"], "STRING");
        assert_eq!(converted["properties"]["command"]["description"], "type of thing");
        assert_eq!(converted["required"], serde_json::json!(["command"]));
    }

    #[test]
    fn request_body_shape() {
        let request = ProviderRequest {
            model: "gemini-3-pro-preview".into(),
            system_directive: "You build websites".into(),
            turns: vec![Turn::human("hi")],
            tools: vec![ToolDefinition {
                name: "executeCommand".into(),
                description: "Run a command".into(),
                parameters: serde_json::json!({"type": "object", "properties": {}}),
            }],
            temperature: 0.2,
        };
        let body = serde_json::to_value(GeminiProvider::build_body(&request)).unwrap();
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "You build websites");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(
            body["tools"][0]["functionDeclarations"][0]["name"],
            "executeCommand"
        );
        assert_eq!(body["tools"][0]["functionDeclarations"][0]["parameters"]["type"], "OBJECT");
        assert!((body["generationConfig"]["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn request_body_without_tools_or_directive() {
        let request = ProviderRequest {
            model: "m".into(),
            system_directive: String::new(),
            turns: vec![],
            tools: vec![],
            temperature: 0.7,
        };
        let body = serde_json::to_value(GeminiProvider::build_body(&request)).unwrap();
        assert!(body.get("tools").is_none());
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn parse_text_response() {
        let resp: GenerateContentResponse = serde_json::from_str(
            r#"{
                "candidates": [{"content": {"role": "model", "parts": [{"text": "Your site is "}, {"text": "ready."}]}}],
                "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 5, "totalTokenCount": 15},
                "modelVersion": "gemini-3-pro-preview"
            }"#,
        )
        .unwrap();

        let pr = GeminiProvider::response_to_provider_response(resp, "requested").unwrap();
        assert_eq!(pr.text, "Your site is ready.");
        assert!(pr.tool_calls.is_empty());
        assert_eq!(pr.usage.unwrap().total_tokens, 15);
        assert_eq!(pr.model, "gemini-3-pro-preview");
    }

    #[test]
    fn parse_function_call_response_keeps_order() {
        let resp: GenerateContentResponse = serde_json::from_str(
            r#"{
                "candidates": [{"content": {"role": "model", "parts": [
                    {"text": "thinking it over", "thought": true},
                    {"functionCall": {"name": "executeCommand", "args": {"command": "mkdir site"}}},
                    {"functionCall": {"name": "writeFile", "args": {"filePath": "site/index.html", "content": "<html></html>"}}}
                ]}}]
            }"#,
        )
        .unwrap();

        let pr = GeminiProvider::response_to_provider_response(resp, "gemini-x").unwrap();
        assert!(pr.text.is_empty());
        assert_eq!(pr.tool_calls.len(), 2);
        assert_eq!(pr.tool_calls[0].name, "executeCommand");
        assert_eq!(pr.tool_calls[0].arguments["command"], "mkdir site");
        assert_eq!(pr.tool_calls[1].name, "writeFile");
        assert_eq!(pr.model, "gemini-x");
    }

    #[test]
    fn parse_blocked_response() {
        let resp: GenerateContentResponse = serde_json::from_str(
            r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#,
        )
        .unwrap();
        let err = GeminiProvider::response_to_provider_response(resp, "m").unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn parse_empty_candidate_names_finish_reason() {
        let resp: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#).unwrap();
        let err = GeminiProvider::response_to_provider_response(resp, "m").unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
        assert!(err.to_string().contains("SAFETY"), "{err}");
    }

    #[test]
    fn parse_thought_only_candidate_is_empty() {
        let resp: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": "hmm", "thought": true}]}, "finishReason": "MAX_TOKENS"}]}"#,
        )
        .unwrap();
        let err = GeminiProvider::response_to_provider_response(resp, "m").unwrap_err();
        assert!(err.to_string().contains("MAX_TOKENS"), "{err}");
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            status_to_error(429, String::new(), "m"),
            ProviderError::RateLimited { .. }
        ));
        assert!(matches!(
            status_to_error(403, String::new(), "m"),
            ProviderError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            status_to_error(404, String::new(), "gemini-9"),
            ProviderError::ModelNotFound(m) if m == "gemini-9"
        ));
        assert!(matches!(
            status_to_error(500, "boom".into(), "m"),
            ProviderError::ApiError { status_code: 500, .. }
        ));
    }
}
