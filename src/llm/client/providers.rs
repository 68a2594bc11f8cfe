//! LLM Provider支持模块

use anyhow::Result;
use rig::{
    agent::Agent,
    client::CompletionClient,
    completion::{AssistantContent, Message, Prompt, PromptError},
    message::{ToolResultContent, UserContent},
};
use std::collections::HashMap;

use crate::{
    config::{LLMConfig, LLMProvider},
    llm::tools::literature_search::AgentToolLiteratureSearch,
    types::{ChatMessage, Transcript},
};

/// 统一的Provider客户端枚举
#[derive(Clone)]
pub enum ProviderClient {
    OpenAI(rig::providers::openai::Client),
    Anthropic(rig::providers::anthropic::Client),
    DeepSeek(rig::providers::deepseek::Client),
    Ollama(rig::providers::ollama::Client),
}

impl ProviderClient {
    /// 根据配置创建相应的provider客户端
    pub fn new(config: &LLMConfig) -> Result<Self> {
        match config.provider {
            LLMProvider::OpenAI => {
                let client = rig::providers::openai::Client::builder(&config.api_key)
                    .base_url(&config.api_base_url)
                    .build();
                Ok(ProviderClient::OpenAI(client))
            }
            LLMProvider::Anthropic => {
                let client =
                    rig::providers::anthropic::ClientBuilder::new(&config.api_key).build()?;
                Ok(ProviderClient::Anthropic(client))
            }
            LLMProvider::DeepSeek => {
                let client = rig::providers::deepseek::Client::builder(&config.api_key)
                    .base_url(&config.api_base_url)
                    .build();
                Ok(ProviderClient::DeepSeek(client))
            }
            LLMProvider::Ollama => {
                let client = rig::providers::ollama::Client::builder().build();
                Ok(ProviderClient::Ollama(client))
            }
        }
    }

    /// 创建不带工具的Agent
    pub fn create_agent(
        &self,
        system_prompt: &str,
        temperature: f64,
        config: &LLMConfig,
    ) -> ProviderAgent {
        let model = config.model.as_str();
        match self {
            ProviderClient::OpenAI(client) => {
                let agent = client
                    .completion_model(model)
                    .completions_api()
                    .into_agent_builder()
                    .preamble(system_prompt)
                    .max_tokens(config.max_tokens.into())
                    .temperature(temperature)
                    .build();
                ProviderAgent::OpenAI(agent)
            }
            ProviderClient::Anthropic(client) => {
                let agent = client
                    .agent(model)
                    .preamble(system_prompt)
                    .max_tokens(config.max_tokens.into())
                    .temperature(temperature)
                    .build();
                ProviderAgent::Anthropic(agent)
            }
            ProviderClient::DeepSeek(client) => {
                let agent = client
                    .agent(model)
                    .preamble(system_prompt)
                    .max_tokens(config.max_tokens.into())
                    .temperature(temperature)
                    .build();
                ProviderAgent::DeepSeek(agent)
            }
            ProviderClient::Ollama(client) => {
                let agent = client
                    .agent(model)
                    .preamble(system_prompt)
                    .max_tokens(config.max_tokens.into())
                    .temperature(temperature)
                    .build();
                ProviderAgent::Ollama(agent)
            }
        }
    }

    /// 创建带文献检索工具的Agent
    pub fn create_research_agent(
        &self,
        system_prompt: &str,
        temperature: f64,
        config: &LLMConfig,
        search_tool: &AgentToolLiteratureSearch,
    ) -> ProviderAgent {
        let model = config.model.as_str();
        match self {
            ProviderClient::OpenAI(client) => {
                let agent = client
                    .completion_model(model)
                    .completions_api()
                    .into_agent_builder()
                    .preamble(system_prompt)
                    .max_tokens(config.max_tokens.into())
                    .temperature(temperature)
                    .tool(search_tool.clone())
                    .build();
                ProviderAgent::OpenAI(agent)
            }
            ProviderClient::Anthropic(client) => {
                let agent = client
                    .agent(model)
                    .preamble(system_prompt)
                    .max_tokens(config.max_tokens.into())
                    .temperature(temperature)
                    .tool(search_tool.clone())
                    .build();
                ProviderAgent::Anthropic(agent)
            }
            ProviderClient::DeepSeek(client) => {
                let agent = client
                    .agent(model)
                    .preamble(system_prompt)
                    .max_tokens(config.max_tokens.into())
                    .temperature(temperature)
                    .tool(search_tool.clone())
                    .build();
                ProviderAgent::DeepSeek(agent)
            }
            ProviderClient::Ollama(client) => {
                let agent = client
                    .agent(model)
                    .preamble(system_prompt)
                    .max_tokens(config.max_tokens.into())
                    .temperature(temperature)
                    .tool(search_tool.clone())
                    .build();
                ProviderAgent::Ollama(agent)
            }
        }
    }
}

/// 统一的Agent枚举
pub enum ProviderAgent {
    OpenAI(Agent<rig::providers::openai::CompletionModel>),
    Anthropic(Agent<rig::providers::anthropic::completion::CompletionModel>),
    DeepSeek(Agent<rig::providers::deepseek::CompletionModel>),
    Ollama(Agent<rig::providers::ollama::CompletionModel<reqwest::Client>>),
}

impl ProviderAgent {
    /// 执行prompt
    pub async fn prompt(&self, prompt: &str) -> Result<String, PromptError> {
        match self {
            ProviderAgent::OpenAI(agent) => agent.prompt(prompt).await,
            ProviderAgent::Anthropic(agent) => agent.prompt(prompt).await,
            ProviderAgent::DeepSeek(agent) => agent.prompt(prompt).await,
            ProviderAgent::Ollama(agent) => agent.prompt(prompt).await,
        }
    }

    /// 执行多轮工具调用对话，完整对话写入 `history`
    pub async fn multi_turn_with_history(
        &self,
        prompt: &str,
        max_turns: usize,
        history: &mut Vec<Message>,
    ) -> Result<String, PromptError> {
        match self {
            ProviderAgent::OpenAI(agent) => {
                agent
                    .prompt(prompt)
                    .with_history(history)
                    .multi_turn(max_turns)
                    .await
            }
            ProviderAgent::Anthropic(agent) => {
                agent
                    .prompt(prompt)
                    .with_history(history)
                    .multi_turn(max_turns)
                    .await
            }
            ProviderAgent::DeepSeek(agent) => {
                agent
                    .prompt(prompt)
                    .with_history(history)
                    .multi_turn(max_turns)
                    .await
            }
            ProviderAgent::Ollama(agent) => {
                agent
                    .prompt(prompt)
                    .with_history(history)
                    .multi_turn(max_turns)
                    .await
            }
        }
    }
}

/// 将 rig 对话历史转换为与 provider 无关的对话记录。
/// 工具输出按调用 id 关联回工具名称。
pub fn to_transcript(history: &[Message]) -> Transcript {
    let mut tool_names: HashMap<String, String> = HashMap::new();
    for msg in history {
        if let Message::Assistant { content, .. } = msg {
            for c in content.iter() {
                if let AssistantContent::ToolCall(tool_call) = c {
                    tool_names.insert(tool_call.id.clone(), tool_call.function.name.clone());
                }
            }
        }
    }

    let mut transcript = Transcript::default();
    for msg in history {
        match msg {
            Message::User { content } => {
                for c in content.iter() {
                    match c {
                        UserContent::Text(text) => transcript.push(ChatMessage::user(&text.text)),
                        UserContent::ToolResult(result) => {
                            let name = tool_names
                                .get(&result.id)
                                .cloned()
                                .unwrap_or_else(|| result.id.clone());
                            for part in result.content.iter() {
                                if let ToolResultContent::Text(text) = part {
                                    transcript.push(ChatMessage::tool(&name, &text.text));
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
            Message::Assistant { content, .. } => {
                let text = content
                    .iter()
                    .filter_map(|c| match c {
                        AssistantContent::Text(text) => Some(text.text.clone()),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                if !text.trim().is_empty() {
                    transcript.push(ChatMessage::assistant(text));
                }
            }
            #[allow(unreachable_patterns)]
            _ => {}
        }
    }

    transcript
}
