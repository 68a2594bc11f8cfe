//! 2.5 章节撰写：按依赖顺序逐个生成 LaTeX 片段并汇总为 main.tex

use anyhow::{Context, Result, bail};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use crate::generator::context::GeneratorContext;
use crate::generator::outlet::{LatexOutlet, read_json};
use crate::generator::research::ReconciledSection;

pub mod catalog;
pub mod dependency;
pub mod pipeline;
pub mod planning;
pub mod prompts;
pub mod rubric;

pub use dependency::SectionDependencyGraph;
pub use pipeline::{SectionWritingPipeline, WritingOutcome, WritingState};
pub use rubric::QualityRubric;

use planning::SectionPlanner;

static SECTION_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^2\.5(\.\d+)*$").unwrap());

const DEFAULT_SUBJECT: &str = "Drug Product";

fn default_subject() -> String {
    DEFAULT_SUBJECT.to_string()
}

/// 检索阶段产出的文献JSON（单个大纲或合并后的全集）
#[derive(Debug, Clone, Deserialize)]
pub struct PapersCorpus {
    #[serde(default = "default_subject")]
    pub drug_name: String,
    #[serde(default)]
    pub sections: IndexMap<String, ReconciledSection>,
}

impl PapersCorpus {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!("Papers JSON file not found: {}", path.display());
        }
        read_json(path).with_context(|| format!("Failed to load papers: {}", path.display()))
    }

    pub fn paper_count(&self) -> usize {
        self.sections.values().map(|s| s.papers.len()).sum()
    }
}

pub fn validate_section_id(section_id: &str) -> Result<()> {
    if !SECTION_ID_RE.is_match(section_id) {
        bail!(
            "Invalid section ID format: {} (expected 2.5, 2.5.1, 2.5.6.1, ...)",
            section_id
        );
    }
    Ok(())
}

/// 单个章节的撰写结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SectionWriteResult {
    Success {
        file: PathBuf,
        length: usize,
        quality_score: f64,
    },
    Failed {
        error: String,
    },
}

impl SectionWriteResult {
    pub fn is_success(&self) -> bool {
        matches!(self, SectionWriteResult::Success { .. })
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub order: Vec<String>,
    pub results: IndexMap<String, SectionWriteResult>,
    pub main_document: Option<PathBuf>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.results.values().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// 章节撰写器，持有依赖图与片段输出目录
pub struct SectionComposer<'a> {
    context: &'a GeneratorContext,
    graph: SectionDependencyGraph,
    outlet: LatexOutlet,
}

impl<'a> SectionComposer<'a> {
    pub fn new(context: &'a GeneratorContext) -> Self {
        Self {
            context,
            graph: SectionDependencyGraph::standard(),
            outlet: LatexOutlet::new(&context.config.writing.output_dir),
        }
    }

    pub fn outlet(&self) -> &LatexOutlet {
        &self.outlet
    }

    /// 撰写并保存单个章节；失败只反映在返回值中
    pub async fn write_section(&self, section_id: &str, corpus: &PapersCorpus) -> SectionWriteResult {
        let writing = &self.context.config.writing;
        let planner = SectionPlanner::new(writing, &self.graph, self.outlet.output_dir());
        let pipeline = SectionWritingPipeline::new(self.context.generator.as_ref(), planner, writing);

        let outcome = match pipeline.run(section_id, &corpus.sections).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(section = %section_id, "❌ 章节 {} 撰写失败: {:#}", section_id, e);
                return SectionWriteResult::Failed {
                    error: format!("{:#}", e),
                };
            }
        };

        if outcome.content.trim().is_empty() {
            tracing::error!(section = %section_id, "❌ 章节 {} 没有生成内容", section_id);
            return SectionWriteResult::Failed {
                error: "No content generated".to_string(),
            };
        }

        match self.outlet.save_fragment(section_id, &outcome.content) {
            Ok(file) => {
                tracing::info!(
                    section = %section_id,
                    "✅ 章节 {} 完成: {} 字符, 得分 {:.1}, 修订 {} 次",
                    section_id,
                    outcome.content.chars().count(),
                    outcome.report.score,
                    outcome.revision_count
                );
                SectionWriteResult::Success {
                    file,
                    length: outcome.content.chars().count(),
                    quality_score: outcome.report.score,
                }
            }
            Err(e) => SectionWriteResult::Failed {
                error: format!("{:#}", e),
            },
        }
    }

    /// 按依赖顺序撰写多个章节，章节之间固定间隔
    pub async fn write_batch(
        &self,
        corpus: &PapersCorpus,
        sections: &[String],
        generate_main: bool,
    ) -> Result<BatchReport> {
        let order = self.graph.order(sections);
        let delay = Duration::from_millis(self.context.config.writing.inter_section_delay_ms);

        tracing::info!("🚀 批量撰写 {} 个章节", order.len());
        tracing::info!("📋 顺序: {}", order.join(" → "));

        let mut report = BatchReport {
            order: order.clone(),
            ..Default::default()
        };
        for (idx, section_id) in order.iter().enumerate() {
            tracing::info!("📄 [{}/{}] 章节 {}", idx + 1, order.len(), section_id);
            let result = self.write_section(section_id, corpus).await;
            report.results.insert(section_id.clone(), result);

            if idx + 1 < order.len() && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        tracing::info!(
            "📊 批量撰写完成: 成功 {}/{}, 失败 {}/{}",
            report.succeeded(),
            order.len(),
            report.failed(),
            order.len()
        );

        if generate_main {
            report.main_document = Some(
                self.outlet
                    .generate_main_document(&corpus.drug_name, &order)?,
            );
        }
        Ok(report)
    }

    /// 撰写单个章节，可选地刷新 main.tex（标准顺序）
    pub async fn write_single(
        &self,
        corpus: &PapersCorpus,
        section_id: &str,
        generate_main: bool,
    ) -> Result<SectionWriteResult> {
        validate_section_id(section_id)?;
        tracing::info!(
            "🚀 撰写章节 {} (药物: {}, 温度: {}, 修订: {})",
            section_id,
            corpus.drug_name,
            self.context.config.writing.temperature,
            if self.context.config.writing.enable_refinement { "开启" } else { "关闭" }
        );

        let result = self.write_section(section_id, corpus).await;
        if result.is_success() && generate_main {
            self.assemble_main(&corpus.drug_name)?;
        }
        Ok(result)
    }

    /// 仅根据已有片段生成 main.tex
    pub fn assemble_main(&self, subject: &str) -> Result<PathBuf> {
        self.outlet
            .generate_main_document(subject, &catalog::standard_sections())
    }
}
