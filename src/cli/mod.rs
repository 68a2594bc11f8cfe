use crate::config::{Config, LLMProvider};
use crate::generator::workflow::{Job, WriteMode};
use anyhow::{Result, anyhow, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// 默认配置文件名，位于当前工作目录
pub const DEFAULT_CONFIG_FILE: &str = "regwriter.toml";

/// RegWriter-RS - 法规申报文献调研与 LaTeX 章节撰写引擎
#[derive(Parser, Debug)]
#[command(name = "regwriter")]
#[command(
    about = "LLM-driven literature research and LaTeX drafting engine for regulatory submissions. It searches the literature for every subsection of a regulation outline, reconciles duplicate findings and writes dependency-ordered Module 2.5 sections."
)]
#[command(version)]
pub struct Args {
    /// 配置文件路径
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// 是否启用详细日志
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// LLM Provider (openai, anthropic, deepseek, ollama)
    #[arg(long, global = true)]
    pub llm_provider: Option<String>,

    /// LLM API KEY
    #[arg(long, global = true)]
    pub llm_api_key: Option<String>,

    /// LLM API基地址
    #[arg(long, global = true)]
    pub llm_api_base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 针对单个法规大纲检索文献并去重
    Research {
        /// 法规大纲文件，例如 Module5Regulation/5.3.1.txt
        outline: PathBuf,

        /// 药品名称
        subject: String,

        /// 模型选择，例如 openai:gpt-4o
        model: Option<String>,

        /// 结果目录
        #[arg(long)]
        results_dir: Option<PathBuf>,
    },

    /// 依次处理全部 5.3.x 大纲并合并结果
    ResearchAll {
        /// 药品名称
        subject: String,

        /// 模型选择，例如 anthropic:claude-sonnet-4-5-20250929
        model: Option<String>,

        /// 法规大纲目录
        #[arg(long)]
        outline_dir: Option<PathBuf>,

        /// 结果目录
        #[arg(long)]
        results_dir: Option<PathBuf>,
    },

    /// 根据文献结果撰写 2.5 章节
    Write {
        /// 文献检索结果 JSON
        papers_json: PathBuf,

        /// 章节编号，例如 2.5.4
        section_id: Option<String>,

        /// 模型选择
        #[arg(short, long)]
        model: Option<String>,

        /// LaTeX 输出目录
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// 关闭自动修订
        #[arg(long)]
        no_refinement: bool,

        /// 生成温度
        #[arg(short, long)]
        temperature: Option<f64>,

        /// 撰写全部标准章节
        #[arg(short, long, conflicts_with_all = ["batch", "section_id"])]
        all: bool,

        /// 逗号分隔的章节列表，例如 2.5.1,2.5.2
        #[arg(short, long, value_delimiter = ',', conflicts_with = "section_id")]
        batch: Option<Vec<String>>,

        /// 只根据已有片段生成 main.tex
        #[arg(short, long)]
        generate_main: bool,

        /// 撰写完成后不生成 main.tex
        #[arg(long)]
        no_main: bool,
    },

    /// 直接执行一次文献检索
    Search {
        query: String,

        /// 返回条数
        #[arg(long)]
        limit: Option<usize>,
    },
}

impl Args {
    /// 将CLI参数转换为配置：显式配置文件 > 当前目录的 regwriter.toml > 默认值，命令行参数最后覆盖
    pub fn into_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(config_path) => Config::from_file(config_path)?,
            None => {
                let default_config_path = std::env::current_dir()
                    .unwrap_or_else(|_| PathBuf::from("."))
                    .join(DEFAULT_CONFIG_FILE);
                if default_config_path.exists() {
                    Config::from_file(&default_config_path)?
                } else {
                    Config::default()
                }
            }
        };

        if let Some(provider_str) = &self.llm_provider {
            match provider_str.parse::<LLMProvider>() {
                Ok(provider) => config.llm.provider = provider,
                Err(_) => eprintln!(
                    "⚠️ 警告: 未知的provider: {}，使用默认provider",
                    provider_str
                ),
            }
        }
        if let Some(llm_api_base_url) = &self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url.clone();
        }
        if let Some(llm_api_key) = &self.llm_api_key {
            config.llm.api_key = llm_api_key.clone();
        }
        config.verbose = config.verbose || self.verbose;

        match &self.command {
            Command::Research {
                model, results_dir, ..
            } => {
                apply_model(&mut config, model.as_deref())?;
                if let Some(dir) = results_dir {
                    config.research.results_dir = dir.clone();
                }
            }
            Command::ResearchAll {
                model,
                outline_dir,
                results_dir,
                ..
            } => {
                apply_model(&mut config, model.as_deref())?;
                if let Some(dir) = outline_dir {
                    config.research.outline_dir = dir.clone();
                }
                if let Some(dir) = results_dir {
                    config.research.results_dir = dir.clone();
                }
            }
            Command::Write {
                model,
                output_dir,
                no_refinement,
                temperature,
                ..
            } => {
                apply_model(&mut config, model.as_deref())?;
                if let Some(dir) = output_dir {
                    config.writing.output_dir = dir.clone();
                }
                if *no_refinement {
                    config.writing.enable_refinement = false;
                }
                if let Some(temperature) = temperature {
                    config.writing.temperature = *temperature;
                }
            }
            Command::Search { .. } => {}
        }

        Ok(config)
    }

    /// 将子命令转换为工作流任务
    pub fn into_job(self) -> Result<Job> {
        let job = match self.command {
            Command::Research {
                outline, subject, ..
            } => Job::Research { outline, subject },
            Command::ResearchAll { subject, .. } => Job::ResearchAll { subject },
            Command::Write {
                papers_json,
                section_id,
                all,
                batch,
                generate_main,
                no_main,
                ..
            } => {
                let mode = if generate_main {
                    WriteMode::AssembleOnly
                } else if all {
                    WriteMode::All
                } else if let Some(sections) = batch {
                    let sections: Vec<String> = sections
                        .into_iter()
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect();
                    if sections.is_empty() {
                        bail!("--batch requires at least one section id");
                    }
                    WriteMode::Batch(sections)
                } else if let Some(section_id) = section_id {
                    WriteMode::Single(section_id)
                } else {
                    return Err(anyhow!(
                        "Specify a section id, --all, --batch or --generate-main"
                    ));
                };
                Job::Write {
                    papers: papers_json,
                    mode,
                    generate_main: !no_main,
                }
            }
            Command::Search { query, limit } => Job::Search { query, limit },
        };
        Ok(job)
    }
}

fn apply_model(config: &mut Config, model: Option<&str>) -> Result<()> {
    if let Some(selector) = model {
        config
            .llm
            .apply_model_selector(selector)
            .map_err(|e| anyhow!(e))?;
    }
    Ok(())
}

// Include tests
#[cfg(test)]
mod tests;
