use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

/// LLM Provider类型
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum LLMProvider {
    #[serde(rename = "openai")]
    #[default]
    OpenAI,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "ollama")]
    Ollama,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::Anthropic => write!(f, "anthropic"),
            LLMProvider::DeepSeek => write!(f, "deepseek"),
            LLMProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(LLMProvider::OpenAI),
            "anthropic" => Ok(LLMProvider::Anthropic),
            "deepseek" => Ok(LLMProvider::DeepSeek),
            "ollama" => Ok(LLMProvider::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    /// LLM模型配置
    pub llm: LLMConfig,

    /// 文献检索配置
    pub search: SearchConfig,

    /// 文献调研配置
    pub research: ResearchConfig,

    /// 章节撰写配置
    pub writing: WritingConfig,

    /// 是否启用详细日志
    pub verbose: bool,
}

/// LLM模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LLMConfig {
    /// LLM Provider类型
    pub provider: LLMProvider,

    /// LLM API KEY
    pub api_key: String,

    /// LLM API基地址
    pub api_base_url: String,

    /// 模型名称
    pub model: String,

    /// 最大tokens
    pub max_tokens: u32,

    /// 温度
    pub temperature: f64,

    /// 重试次数（总尝试次数）
    pub retry_attempts: u32,

    /// 重试基础间隔（毫秒），按 2^n 指数增长
    pub retry_delay_ms: u64,

    /// 超时时间（秒）
    pub timeout_seconds: u64,

    /// 工具调用的最大轮数
    pub max_turns: usize,
}

/// 文献检索配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    /// 检索后端名称
    pub backend: String,

    /// E-utilities 基地址
    pub base_url: String,

    /// 提交给 NCBI 的联系邮箱
    pub email: String,

    /// 两次请求之间的最小间隔（毫秒）
    pub min_interval_ms: u64,

    /// 同时在途的最大请求数
    pub max_concurrent_requests: usize,

    pub retry_attempts: u32,

    pub retry_delay_ms: u64,

    /// 工具调用未指定数量时的默认返回条数
    pub default_match_limit: usize,

    /// 单次检索返回条数上限
    pub max_match_limit: usize,

    pub timeout_seconds: u64,
}

/// 文献调研配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ResearchConfig {
    /// 同时检索的章节数
    pub max_parallels: usize,

    /// 章节任务错开启动的间隔（毫秒）
    pub stagger_ms: u64,

    /// 启动时间的随机抖动上限（毫秒）
    pub jitter_ms: u64,

    pub retry_attempts: u32,

    pub retry_delay_ms: u64,

    /// 法规大纲目录
    pub outline_dir: PathBuf,

    /// 全量调研时依次处理的大纲编号
    pub corpus_sections: Vec<String>,

    /// 药物法规背景资料目录
    pub context_dir: PathBuf,

    /// 调研结果目录
    pub results_dir: PathBuf,
}

/// 章节撰写配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct WritingConfig {
    /// 章节撰写指引目录
    pub guidance_dir: PathBuf,

    /// LaTeX 输出目录
    pub output_dir: PathBuf,

    pub enable_refinement: bool,

    /// 最多修订次数
    pub max_revisions: u32,

    /// 低于该得分时触发修订
    pub refine_below_score: f64,

    /// 有效性判定的最低得分
    pub pass_score: f64,

    pub min_length: usize,

    pub max_length: usize,

    /// 每个章节必须出现的结构标记
    pub required_markers: Vec<String>,

    /// 相邻章节之间的等待时间（毫秒）
    pub inter_section_delay_ms: u64,

    /// 单个相关章节的上下文预算（字符）
    pub related_section_budget: usize,

    /// 上下文超限后单个相关章节压缩到的预算（字符）
    pub compressed_section_budget: usize,

    /// 累计上下文上限（字符）
    pub context_ceiling: usize,

    /// 超过该值时输出告警（字符）
    pub context_warning: usize,

    pub max_papers_in_context: usize,

    pub temperature: f64,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}

impl LLMConfig {
    /// 应用形如 `provider:model` 的模型选择串。
    /// 不带前缀时按模型名推断 provider（gpt-*/o1/o3 -> openai，claude-* -> anthropic，deepseek-* -> deepseek）。
    pub fn apply_model_selector(&mut self, selector: &str) -> Result<(), String> {
        let selector = selector.trim();
        if selector.is_empty() {
            return Err("Empty model selector".to_string());
        }

        if let Some((provider, model)) = selector.split_once(':') {
            if let Ok(provider) = provider.parse::<LLMProvider>() {
                if model.trim().is_empty() {
                    return Err(format!("Missing model name in selector: {}", selector));
                }
                self.provider = provider;
                self.model = model.trim().to_string();
                return Ok(());
            }
        }

        let lowered = selector.to_lowercase();
        if lowered.starts_with("gpt-") || lowered.starts_with("o1") || lowered.starts_with("o3") {
            self.provider = LLMProvider::OpenAI;
        } else if lowered.starts_with("claude-") {
            self.provider = LLMProvider::Anthropic;
        } else if lowered.starts_with("deepseek-") {
            self.provider = LLMProvider::DeepSeek;
        }
        self.model = selector.to_string();
        Ok(())
    }

    /// `provider:model` 形式的展示串
    pub fn selector(&self) -> String {
        format!("{}:{}", self.provider, self.model)
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::default(),
            api_key: std::env::var("REGWRITER_LLM_API_KEY").unwrap_or_default(),
            api_base_url: String::from("https://api.openai.com/v1"),
            model: String::from("gpt-4o"),
            max_tokens: 16384,
            temperature: 0.3,
            retry_attempts: 5,
            retry_delay_ms: 2000,
            timeout_seconds: 300,
            max_turns: 12,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            backend: String::from("pubmed"),
            base_url: String::from("https://eutils.ncbi.nlm.nih.gov/entrez/eutils"),
            email: std::env::var("PUBMED_EMAIL")
                .unwrap_or_else(|_| String::from("research@example.com")),
            min_interval_ms: 350,
            max_concurrent_requests: 2,
            retry_attempts: 3,
            retry_delay_ms: 1000,
            default_match_limit: 5,
            max_match_limit: 100,
            timeout_seconds: 30,
        }
    }
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            max_parallels: 2,
            stagger_ms: 500,
            jitter_ms: 250,
            retry_attempts: 5,
            retry_delay_ms: 2000,
            outline_dir: PathBuf::from("Module5Regulation"),
            corpus_sections: (1..=7).map(|n| format!("5.3.{}", n)).collect(),
            context_dir: PathBuf::from("."),
            results_dir: PathBuf::from("module5Results"),
        }
    }
}

impl Default for WritingConfig {
    fn default() -> Self {
        Self {
            guidance_dir: PathBuf::from("section2.5"),
            output_dir: PathBuf::from("section2.5_tex"),
            enable_refinement: true,
            max_revisions: 2,
            refine_below_score: 70.0,
            pass_score: 60.0,
            min_length: 500,
            max_length: 50000,
            required_markers: vec!["\\section".to_string(), "\\label".to_string()],
            inter_section_delay_ms: 2000,
            related_section_budget: 3000,
            compressed_section_budget: 1500,
            context_ceiling: 15000,
            context_warning: 20000,
            max_papers_in_context: 15,
            temperature: 0.3,
        }
    }
}

// Include tests
#[cfg(test)]
mod tests;
