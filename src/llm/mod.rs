mod gemini;
#[cfg(test)]
pub mod testing;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::tools::ToolSet;

pub use gemini::{GeminiModel, DEFAULT_LLM_URL, DEFAULT_MODEL};

/// A single generation: the prompt, the tools the model may call and its temperature.
pub struct GenerateRequest<'a> {
    pub prompt: &'a str,
    pub tools: Option<&'a ToolSet>,
    pub temperature: f32,
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn model_name(&self) -> &str;

    /// Streams text chunks into `chunks` as they arrive and returns their
    /// concatenation once the model is done.
    ///
    /// A closed `chunks` receiver does not stop the generation.
    async fn generate(
        &self,
        request: GenerateRequest<'_>,
        chunks: &mpsc::Sender<String>,
    ) -> Result<String>;
}
