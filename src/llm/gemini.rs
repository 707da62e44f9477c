use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sse_stream::SseStream;
use tokio::sync::mpsc;
use url::Url;

use super::{GenerateRequest, LanguageModel};
use crate::auth::Token;
use crate::error::{GhAssessError, Result};
use crate::tools::ToolSet;

pub const DEFAULT_LLM_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

const MAX_TOOL_ROUNDS: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn user(parts: Vec<Part>) -> Self {
        Self {
            role: "user".to_string(),
            parts,
        }
    }

    fn model(parts: Vec<Part>) -> Self {
        Self {
            role: "model".to_string(),
            parts,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    thought: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
}

impl Part {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FunctionDeclaration<'a> {
    name: &'a str,
    description: &'a str,
    parameters: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolGroup<'a> {
    function_declarations: Vec<FunctionDeclaration<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: &'a [Content],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolGroup<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Parts and function calls gathered over one streamed model turn.
#[derive(Debug, Default)]
struct Turn {
    parts: Vec<Part>,
    calls: Vec<FunctionCall>,
}

/// Client for the Gemini `streamGenerateContent` API, running the
/// function-calling loop against a [`ToolSet`].
pub struct GeminiModel {
    client: Client,
    stream_url: Url,
    model: String,
    api_key: Token,
}

impl GeminiModel {
    pub fn new(base_url: &str, model: &str, api_key: Token) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("ghassess/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GhAssessError::Config(format!("Failed to create HTTP client: {e}")))?;

        let mut api_url = Url::parse(base_url)
            .map_err(|e| GhAssessError::Config(format!("Invalid LLM API URL: {e}")))?;
        if !api_url.path().ends_with('/') {
            let path = format!("{}/", api_url.path());
            api_url.set_path(&path);
        }

        let mut stream_url = api_url
            .join(&format!(
                "v1beta/models/{}:streamGenerateContent",
                urlencoding::encode(model)
            ))
            .map_err(|e| GhAssessError::Config(format!("Invalid LLM model URL: {e}")))?;
        stream_url.query_pairs_mut().append_pair("alt", "sse");

        Ok(Self {
            client,
            stream_url,
            model: model.to_string(),
            api_key,
        })
    }

    async fn stream_turn(
        &self,
        contents: &[Content],
        tools: Option<&ToolSet>,
        temperature: f32,
        chunks: &mpsc::Sender<String>,
        text: &mut String,
    ) -> Result<Turn> {
        let declarations = tools.map(ToolSet::declarations).unwrap_or_default();
        let function_declarations: Vec<FunctionDeclaration<'_>> = declarations
            .iter()
            .map(|declaration| FunctionDeclaration {
                name: declaration.name,
                description: declaration.description,
                parameters: declaration.input_schema.clone(),
            })
            .collect();
        let tool_groups = if function_declarations.is_empty() {
            Vec::new()
        } else {
            vec![ToolGroup {
                function_declarations,
            }]
        };

        let body = GenerateContentRequest {
            contents,
            tools: tool_groups,
            generation_config: GenerationConfig { temperature },
        };

        let response = self
            .client
            .post(self.stream_url.clone())
            .header("x-goog-api-key", self.api_key.as_str())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(GhAssessError::Generation(format!("{status}: {detail}")));
        }

        let mut events = std::pin::pin!(SseStream::from_byte_stream(response.bytes_stream()));
        let mut turn = Turn::default();
        while let Some(event) = events.next().await {
            let event = event
                .map_err(|e| GhAssessError::Generation(format!("Stream interrupted: {e}")))?;
            if let Some(data) = event.data.as_deref().filter(|d| !d.is_empty()) {
                Self::absorb_event(data, &mut turn, chunks, text).await?;
            }
        }

        Ok(turn)
    }

    async fn absorb_event(
        event: &str,
        turn: &mut Turn,
        chunks: &mpsc::Sender<String>,
        text: &mut String,
    ) -> Result<()> {
        let response: GenerateContentResponse = serde_json::from_str(event)
            .map_err(|e| GhAssessError::Generation(format!("Undecodable stream event: {e}")))?;

        if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(GhAssessError::Generation(format!("Prompt blocked: {reason}")));
        }

        let parts = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts)
            .unwrap_or_default();

        for part in parts {
            if let Some(call) = &part.function_call {
                turn.calls.push(call.clone());
            } else if !part.thought {
                if let Some(chunk) = part.text.as_deref().filter(|t| !t.is_empty()) {
                    text.push_str(chunk);
                    if chunks.send(chunk.to_string()).await.is_err() {
                        debug!("Chunk receiver closed, continuing generation");
                    }
                }
            }
            turn.parts.push(part);
        }

        Ok(())
    }
}

#[async_trait]
impl LanguageModel for GeminiModel {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        request: GenerateRequest<'_>,
        chunks: &mpsc::Sender<String>,
    ) -> Result<String> {
        let mut contents = vec![Content::user(vec![Part::text(request.prompt)])];
        let mut text = String::new();

        for round in 0..=MAX_TOOL_ROUNDS {
            let turn = self
                .stream_turn(
                    &contents,
                    request.tools,
                    request.temperature,
                    chunks,
                    &mut text,
                )
                .await?;

            if turn.calls.is_empty() {
                return Ok(text);
            }

            let Some(tools) = request.tools else {
                return Err(GhAssessError::Generation(
                    "Model requested a tool call but no tools were offered".to_string(),
                ));
            };
            if round == MAX_TOOL_ROUNDS {
                break;
            }

            contents.push(Content::model(turn.parts));

            let mut responses = Vec::with_capacity(turn.calls.len());
            for call in turn.calls {
                info!("Model called tool {} with {}", call.name, call.args);
                let output = tools.call(&call.name, call.args).await?;
                responses.push(Part {
                    function_response: Some(FunctionResponse {
                        response: json!({ "name": call.name, "content": output }),
                        name: call.name,
                    }),
                    ..Part::default()
                });
            }
            contents.push(Content::user(responses));
        }

        warn!("Model kept calling tools after {MAX_TOOL_ROUNDS} rounds");
        Err(GhAssessError::Generation(format!(
            "Model did not finish within {MAX_TOOL_ROUNDS} tool rounds"
        )))
    }
}
