//! 文献检索阶段：大纲 -> 并发章节检索 -> 跨章节去重 -> 落盘

use anyhow::Result;
use std::path::PathBuf;

use crate::generator::context::GeneratorContext;
use crate::generator::outlet::ResultsOutlet;
use crate::generator::preprocess::OutlinePreprocessor;
use crate::generator::types::Generator;

pub mod combine;
pub mod extractor;
pub mod orchestrator;
pub mod prompts;
pub mod reconciler;

pub use combine::{CombinedResult, combine_results};
pub use extractor::{CandidateSource, LiteraturePaperExtractor};
pub use orchestrator::ResearchOrchestrator;
pub use reconciler::{
    DeduplicationInstruction, ReconciledResult, ReconciledSection, SectionResultReconciler,
    SectionResultSet,
};

/// 单个大纲文件的完整检索流程
pub struct OutlineResearch {
    outline_path: PathBuf,
    subject: String,
}

impl OutlineResearch {
    pub fn new(outline_path: impl Into<PathBuf>, subject: impl Into<String>) -> Self {
        Self {
            outline_path: outline_path.into(),
            subject: subject.into(),
        }
    }
}

impl Generator<ReconciledResult> for OutlineResearch {
    fn stage(&self) -> &'static str {
        "research"
    }

    async fn execute(&self, context: GeneratorContext) -> Result<ReconciledResult> {
        let prepared = OutlinePreprocessor::new(&self.outline_path, &self.subject)
            .execute(context.clone())
            .await?;

        let outlet = ResultsOutlet::new(&context.config.research.results_dir);

        if prepared.sections.is_empty() {
            tracing::warn!("⚠️ 大纲中没有可识别的章节: {}", self.outline_path.display());
            let result = reconciler::unreconciled(
                &prepared.subject,
                &prepared.regulation_section,
                &prepared.sections,
                &SectionResultSet::new(),
            );
            outlet.save_reconciled(&result)?;
            return Ok(result);
        }

        let results = ResearchOrchestrator::new()
            .run_workers(&context, &prepared)
            .await;

        let reconciler = SectionResultReconciler::new(
            context.generator.as_ref(),
            context.config.llm.temperature,
        );
        let reconciled = reconciler
            .reconcile(
                &prepared.subject,
                &prepared.regulation_section,
                &prepared.sections,
                &results,
            )
            .await;

        outlet.save_reconciled(&reconciled)?;
        Ok(reconciled)
    }
}

/// 全部大纲的检索结果
#[derive(Debug, Default)]
pub struct CorpusOutcome {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
    pub combined_path: Option<PathBuf>,
}

impl CorpusOutcome {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// 依次检索所有 5.3.x 大纲并汇总
pub async fn research_corpus(context: &GeneratorContext, subject: &str) -> Result<CorpusOutcome> {
    let research = &context.config.research;
    let mut outcome = CorpusOutcome::default();
    let mut parts = Vec::new();

    tracing::info!(
        "🚀 依次处理 {} 个大纲: {}",
        research.corpus_sections.len(),
        research.corpus_sections.join(", ")
    );

    for sid in &research.corpus_sections {
        let outline_path = research.outline_dir.join(format!("{}.txt", sid));
        if !outline_path.exists() {
            tracing::warn!("⚠️ 大纲文件不存在，跳过: {}", outline_path.display());
            outcome.failed.push(sid.clone());
            continue;
        }

        match OutlineResearch::new(&outline_path, subject)
            .execute(context.clone())
            .await
        {
            Ok(result) => {
                tracing::info!("✅ {} 完成", sid);
                outcome.succeeded.push(sid.clone());
                parts.push((sid.clone(), result));
            }
            Err(e) => {
                tracing::error!("❌ {} 失败: {:#}", sid, e);
                outcome.failed.push(sid.clone());
            }
        }
    }

    if parts.is_empty() {
        tracing::warn!("⚠️ 没有成功的大纲可供汇总");
        return Ok(outcome);
    }

    let combined = combine_results(subject, &parts);
    let outlet = ResultsOutlet::new(&research.results_dir);
    outcome.combined_path = Some(outlet.save_combined(&combined)?);

    tracing::info!(
        unique = combined.summary.total_unique_papers,
        mentions = combined.summary.total_mentions,
        "📊 汇总完成：成功 {}，失败 {}",
        outcome.succeeded.len(),
        outcome.failed.len()
    );

    Ok(outcome)
}
