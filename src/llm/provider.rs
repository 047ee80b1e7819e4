use async_trait::async_trait;

use crate::config::LLMConfig;
use crate::types::{AppResult, LLMRequest, LLMResponse};

/// "Given a prompt, return text" capability.
#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse>;
}

pub struct LLM {
    adapter: Box<dyn LLMAdapter>,
    model: String,
    temperature: f32,
}

impl LLM {
    pub fn openai(config: &LLMConfig) -> Self {
        let adapter = crate::llm::openai::OpenAIAdapter::with_base_url(
            &config.openai_api_key,
            &config.base_url,
        );
        Self::with_adapter(Box::new(adapter), config)
    }

    pub fn with_adapter(adapter: Box<dyn LLMAdapter>, config: &LLMConfig) -> Self {
        Self {
            adapter,
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        self.adapter.create_chat_completion(request).await
    }
}
