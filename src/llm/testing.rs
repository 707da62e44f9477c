use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use super::{GenerateRequest, LanguageModel};
use crate::error::{GhAssessError, Result};

/// What a [`ScriptedModel`] saw for one `generate` call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub prompt: String,
    pub tool_names: Vec<&'static str>,
    pub temperature: f32,
}

/// Replays fixed chunks, optionally calling one tool first.
#[derive(Default)]
pub struct ScriptedModel {
    chunks: Vec<String>,
    tool_call: Option<(String, Value)>,
    failure: Option<String>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedModel {
    pub fn replying(chunks: &[&str]) -> Self {
        Self {
            chunks: chunks.iter().map(|chunk| (*chunk).to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn calling_tool(mut self, name: &str, input: Value) -> Self {
        self.tool_call = Some((name.to_string(), input));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        request: GenerateRequest<'_>,
        chunks: &mpsc::Sender<String>,
    ) -> Result<String> {
        self.calls.lock().unwrap().push(RecordedCall {
            prompt: request.prompt.to_string(),
            tool_names: request
                .tools
                .map(|tools| tools.declarations().iter().map(|d| d.name).collect())
                .unwrap_or_default(),
            temperature: request.temperature,
        });

        if let Some(message) = &self.failure {
            return Err(GhAssessError::Generation(message.clone()));
        }

        if let (Some((name, input)), Some(tools)) = (&self.tool_call, request.tools) {
            tools.call(name, input.clone()).await?;
        }

        let mut text = String::new();
        for chunk in &self.chunks {
            text.push_str(chunk);
            let _ = chunks.send(chunk.clone()).await;
        }
        Ok(text)
    }
}
