//! LLM客户端 - 提供统一的文本生成服务接口

use anyhow::Result;
use async_trait::async_trait;
use rig::completion::PromptError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::Config;
use crate::llm::tools::literature_search::AgentToolLiteratureSearch;
use crate::search::LiteratureSearch;
use crate::types::{ChatMessage, Transcript};
use crate::utils::retry::{RateLimitError, RetryClass, RetryPolicy, classify, retry_with_backoff};

mod providers;
pub mod types;

pub use types::GenerationRequest;

use providers::{ProviderClient, to_transcript};

/// 生成服务错误，限流与其他失败可区分
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation service rate limited")]
    RateLimited(#[from] RateLimitError),

    #[error("generation provider error: {0}")]
    Provider(String),

    #[error("generation service returned an empty response")]
    EmptyResponse,
}

impl GenerationError {
    /// 将 provider 返回的错误归类为限流或一般错误
    pub fn from_provider(err: impl std::fmt::Display) -> Self {
        let message = err.to_string();
        match classify(&anyhow::anyhow!(message.clone())) {
            RetryClass::RateLimited { retry_after } => {
                GenerationError::RateLimited(RateLimitError::new(message, retry_after))
            }
            RetryClass::Fatal => GenerationError::Provider(message),
        }
    }
}

/// 文本生成能力
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// 单轮生成，返回最终文本
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// 带文献检索工具的多轮对话，返回完整对话记录（含工具输出）
    async fn research(
        &self,
        request: &GenerationRequest,
        searcher: Arc<dyn LiteratureSearch>,
    ) -> Result<Transcript>;
}

/// LLM客户端
#[derive(Clone)]
pub struct LLMClient {
    config: Config,
    client: ProviderClient,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: Config) -> Result<Self> {
        let client = ProviderClient::new(&config.llm)?;
        Ok(Self { client, config })
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.config.llm.retry_attempts,
            Duration::from_millis(self.config.llm.retry_delay_ms),
        )
    }

    async fn with_timeout<T, Fut>(&self, fut: Fut) -> Result<T, GenerationError>
    where
        Fut: Future<Output = Result<T, PromptError>>,
    {
        let timeout = Duration::from_secs(self.config.llm.timeout_seconds);
        match tokio::time::timeout(timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(GenerationError::from_provider(e)),
            Err(_) => Err(GenerationError::Provider(format!(
                "request timed out after {}s",
                timeout.as_secs()
            ))),
        }
    }
}

#[async_trait]
impl TextGenerator for LLMClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let llm_config = &self.config.llm;
        let temperature = request.temperature.unwrap_or(llm_config.temperature);
        let agent = self
            .client
            .create_agent(&request.system, temperature, llm_config);

        retry_with_backoff(&self.retry_policy(), "generate", || async {
            let response = self.with_timeout(agent.prompt(&request.prompt)).await?;
            if response.trim().is_empty() {
                return Err(GenerationError::EmptyResponse.into());
            }
            Ok(response)
        })
        .await
    }

    async fn research(
        &self,
        request: &GenerationRequest,
        searcher: Arc<dyn LiteratureSearch>,
    ) -> Result<Transcript> {
        let llm_config = &self.config.llm;
        let temperature = request.temperature.unwrap_or(llm_config.temperature);
        let search_tool = AgentToolLiteratureSearch::new(
            searcher,
            self.config.search.default_match_limit,
            self.config.search.max_match_limit,
        );
        let agent = self.client.create_research_agent(
            &request.system,
            temperature,
            llm_config,
            &search_tool,
        );

        // 重试由调用方的并发执行器负责
        let mut history = Vec::new();
        let timeout = Duration::from_secs(llm_config.timeout_seconds);
        let outcome = tokio::time::timeout(
            timeout,
            agent.multi_turn_with_history(&request.prompt, llm_config.max_turns, &mut history),
        )
        .await;

        match outcome {
            Ok(Ok(final_text)) => {
                let mut transcript = to_transcript(&history);
                if transcript.final_text() != Some(final_text.as_str())
                    && !final_text.trim().is_empty()
                {
                    transcript.push(ChatMessage::assistant(final_text));
                }
                Ok(transcript)
            }
            Ok(Err(PromptError::MaxDepthError {
                max_depth,
                chat_history,
                ..
            })) => {
                // 工具调用轮数耗尽时保留已有对话，工具输出仍可用于提取
                tracing::warn!("⚠️ 检索对话达到最大轮数 ({})，使用部分对话记录", max_depth);
                Ok(to_transcript(&chat_history))
            }
            Ok(Err(e)) => Err(GenerationError::from_provider(e).into()),
            Err(_) => Err(GenerationError::Provider(format!(
                "request timed out after {}s",
                timeout.as_secs()
            ))
            .into()),
        }
    }
}
