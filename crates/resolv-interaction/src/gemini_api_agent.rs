//! GeminiApiAgent - Direct REST API implementation for Gemini with function calling.
//!
//! This agent calls the Gemini `generateContent` endpoint directly. Tool
//! declarations are sent as `functionDeclarations`, model requests to call a
//! tool arrive as `functionCall` parts, and results go back as
//! `functionResponse` parts.

use crate::config::ResolvSettings;
use crate::model_service::{ModelRequest, ModelResponse, ModelService};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use resolv_core::session::{ConversationTurn, MessageRole, TurnPart};
use resolv_core::tool::{ToolDeclaration, ToolInvocation};
use resolv_core::{ResolvError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Agent implementation that talks to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiApiAgent {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiApiAgent {
    /// Creates a new agent with the provided API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Builds an agent from resolved settings.
    ///
    /// A missing API key is an initialization failure.
    pub fn try_from_settings(settings: &ResolvSettings) -> Result<Self> {
        let api_key = settings.api_key.clone().ok_or_else(|| {
            ResolvError::initialization(
                "Gemini API key not found (set GEMINI_API_KEY or add it to secret.json)",
            )
        })?;
        Ok(Self::new(api_key, settings.model.clone()))
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Points the agent at a different API root (proxies, regional endpoints).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send_request(&self, body: &GenerateContentRequest) -> Result<ModelResponse> {
        let url = format!(
            "{}/{model}:generateContent?key={api_key}",
            self.base_url,
            model = self.model,
            api_key = self.api_key
        );

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| ResolvError::Service {
                message: format!("Gemini API request failed: {}", without_url(err)),
                status_code: None,
                is_retryable: true,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|err| {
            ResolvError::service(format!(
                "Failed to parse Gemini response: {}",
                without_url(err)
            ))
        })?;

        extract_model_response(parsed)
    }
}

#[async_trait]
impl ModelService for GeminiApiAgent {
    fn describe(&self) -> String {
        format!("Gemini API ({})", self.model)
    }

    async fn ensure_ready(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(ResolvError::initialization("Gemini API key is empty"));
        }

        let url = format!(
            "{}/{model}?key={api_key}",
            self.base_url,
            model = self.model,
            api_key = self.api_key
        );
        let response = self.client.get(url).send().await.map_err(|err| {
            ResolvError::initialization(format!(
                "Gemini API is unreachable: {}",
                without_url(err)
            ))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response.text().await.unwrap_or_default();
            return Err(ResolvError::initialization(
                map_http_error(status, body_text).to_string(),
            ));
        }

        Ok(())
    }

    async fn generate(&self, request: ModelRequest<'_>) -> Result<ModelResponse> {
        let body = GenerateContentRequest::from_model_request(request);
        self.send_request(&body).await
    }
}

/// Strips the request URL (which carries the API key) from reqwest errors.
fn without_url(err: reqwest::Error) -> reqwest::Error {
    err.without_url()
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolSet>,
}

impl GenerateContentRequest {
    fn from_model_request(request: ModelRequest<'_>) -> Self {
        let contents = request
            .turns
            .iter()
            .filter_map(Content::from_turn)
            .collect();

        let system_instruction = if request.system_instruction.trim().is_empty() {
            None
        } else {
            Some(SystemInstruction {
                parts: vec![Part::Text {
                    text: request.system_instruction.to_string(),
                }],
            })
        };

        let tools = if request.tools.is_empty() {
            Vec::new()
        } else {
            vec![ToolSet {
                function_declarations: request.tools.iter().map(FunctionDeclaration::from).collect(),
            }]
        };

        Self {
            contents,
            system_instruction,
            tools,
        }
    }
}

#[derive(Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

impl Content {
    /// Converts one history turn; turns with no parts are skipped since
    /// Gemini rejects empty content.
    fn from_turn(turn: &ConversationTurn) -> Option<Self> {
        let role = match turn.role {
            MessageRole::User => "user",
            MessageRole::Assistant => "model",
        };

        let parts: Vec<Part> = turn
            .parts
            .iter()
            .map(|part| match part {
                TurnPart::Text(text) => Part::Text { text: text.clone() },
                TurnPart::ToolInvocation(invocation) => Part::FunctionCall {
                    function_call: FunctionCall {
                        name: invocation.name.clone(),
                        args: Value::Object(invocation.arguments.clone()),
                        id: Some(invocation.invocation_id.clone()),
                    },
                    thought_signature: invocation.signature.clone(),
                },
                TurnPart::ToolResult(result) => Part::FunctionResponse {
                    function_response: FunctionResponse {
                        name: result.name.clone(),
                        id: result.invocation_id.clone(),
                        response: serde_json::json!({ "result": result.outcome }),
                    },
                },
            })
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(Self { role, parts })
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    FunctionCall {
        #[serde(rename = "functionCall")]
        function_call: FunctionCall,
        #[serde(rename = "thoughtSignature", skip_serializing_if = "Option::is_none")]
        thought_signature: Option<String>,
    },
    FunctionResponse {
        #[serde(rename = "functionResponse")]
        function_response: FunctionResponse,
    },
}

#[derive(Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
}

#[derive(Serialize)]
struct FunctionResponse {
    name: String,
    id: String,
    response: Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolSet {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Serialize)]
struct FunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

impl From<&ToolDeclaration> for FunctionDeclaration {
    fn from(tool: &ToolDeclaration) -> Self {
        Self {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.parameters.clone(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartResponse {
    text: Option<String>,
    function_call: Option<FunctionCall>,
    #[serde(default)]
    thought: bool,
    /// Gemini 3 rejects replayed function calls that lack their signature.
    thought_signature: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    code: Option<i32>,
    message: Option<String>,
    status: Option<String>,
}

fn extract_model_response(response: GenerateContentResponse) -> Result<ModelResponse> {
    let Some(candidate) = response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
    else {
        let reason = response
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
            .unwrap_or_else(|| "no candidates".to_string());
        return Err(ResolvError::service(format!(
            "Gemini API returned no candidates: {reason}"
        )));
    };

    let mut text = String::new();
    let mut invocations = Vec::new();

    for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
        if let Some(call) = part.function_call {
            let arguments = match call.args {
                Value::Object(map) => map,
                Value::Null => Map::new(),
                other => {
                    return Err(ResolvError::service(format!(
                        "Gemini functionCall '{}' has non-object args: {other}",
                        call.name
                    )));
                }
            };
            // Ids may be absent; the dialogue session assigns one.
            let mut invocation =
                ToolInvocation::new(call.id.unwrap_or_default(), call.name, arguments);
            invocation.signature = part.thought_signature;
            invocations.push(invocation);
        } else if let Some(part_text) = part.text {
            if !part.thought {
                text.push_str(&part_text);
            }
        }
    }

    Ok(ModelResponse { text, invocations })
}

fn map_http_error(status: StatusCode, body: String) -> ResolvError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    let is_retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    ResolvError::Service {
        message,
        status_code: Some(status.as_u16()),
        is_retryable,
    }
}
