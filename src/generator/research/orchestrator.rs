use std::time::Duration;

use crate::generator::context::GeneratorContext;
use crate::generator::outlet::ResultsOutlet;
use crate::generator::preprocess::PreprocessingResult;
use crate::generator::research::extractor::LiteraturePaperExtractor;
use crate::generator::research::prompts::{worker_query, worker_system_prompt};
use crate::generator::research::reconciler::SectionResultSet;
use crate::llm::client::GenerationRequest;
use crate::types::{Paper, Section, Transcript};
use crate::utils::retry::RetryPolicy;
use crate::utils::threads::BoundedConcurrencyExecutor;

/// 章节检索编排器：每个章节一个检索对话，有界并发执行
#[derive(Default)]
pub struct ResearchOrchestrator {
    extractor: LiteraturePaperExtractor,
}

impl ResearchOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    fn executor(context: &GeneratorContext) -> BoundedConcurrencyExecutor {
        let research = &context.config.research;
        BoundedConcurrencyExecutor::new(research.max_parallels)
            .with_stagger(
                Duration::from_millis(research.stagger_ms),
                Duration::from_millis(research.jitter_ms),
            )
            .with_retry(RetryPolicy::new(
                research.retry_attempts,
                Duration::from_millis(research.retry_delay_ms),
            ))
    }

    /// 并发检索所有章节。
    /// 单个章节失败只会得到空列表；结果按大纲顺序返回。
    pub async fn run_workers(
        &self,
        context: &GeneratorContext,
        prepared: &PreprocessingResult,
    ) -> SectionResultSet {
        let sections: Vec<Section> = prepared
            .sections
            .iter()
            .map(|(sid, info)| Section::new(sid, info))
            .collect();

        tracing::info!(
            "🔍 检索阶段：{} 个章节，检索后端：{}",
            sections.len(),
            context.searcher.name()
        );

        let temperature = context.config.llm.temperature;
        let tasks: Vec<_> = sections
            .iter()
            .map(|section| {
                let generator = context.generator.clone();
                let searcher = context.searcher.clone();
                let request = GenerationRequest::new(
                    worker_system_prompt(section, &prepared.subject, &prepared.drug_context),
                    worker_query(section, &prepared.subject),
                )
                .with_temperature(temperature);
                let section_id = section.id.clone();

                move || {
                    let generator = generator.clone();
                    let searcher = searcher.clone();
                    let request = request.clone();
                    let section_id = section_id.clone();
                    async move {
                        tracing::info!(section = %section_id, "🤖 生成检索式并检索文献...");
                        generator.research(&request, searcher).await
                    }
                }
            })
            .collect();

        let outcomes = Self::executor(context).run(tasks).await;

        let outlet = ResultsOutlet::new(&context.config.research.results_dir);
        let mut results = SectionResultSet::new();
        for (section, outcome) in sections.iter().zip(outcomes) {
            let papers = match outcome {
                Ok(transcript) => {
                    let papers = self.collect_papers(section, &transcript);
                    if let Err(e) = outlet.save_section_papers(
                        &prepared.subject,
                        &prepared.regulation_section,
                        section,
                        &papers,
                    ) {
                        tracing::warn!(section = %section.id, "⚠️ 无法保存章节结果: {}", e);
                    }
                    papers
                }
                Err(e) => {
                    tracing::error!(section = %section.id, "❌ 章节检索失败: {}", e);
                    Vec::new()
                }
            };
            results.insert(section.id.clone(), papers);
        }

        tracing::info!("✅ 检索阶段完成：{} 个章节", results.len());
        results
    }

    fn collect_papers(&self, section: &Section, transcript: &Transcript) -> Vec<Paper> {
        tracing::debug!(
            section = %section.id,
            messages = transcript.messages.len(),
            tool_outputs = transcript.tool_outputs().count(),
            "🔍 检索对话记录"
        );

        let extraction = self.extractor.extract(transcript);
        if extraction.papers.is_empty() {
            tracing::warn!(section = %section.id, "⚠️ 未提取到有效文献");
        } else {
            tracing::info!(
                section = %section.id,
                source = ?extraction.source,
                "📄 提取到 {} 篇文献",
                extraction.papers.len()
            );
        }
        extraction.papers
    }
}
