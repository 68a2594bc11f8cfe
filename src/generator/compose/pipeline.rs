//! 单个章节的撰写状态机：
//! planning → writing → validating → (refining → validating)* → done

use anyhow::Result;
use indexmap::IndexMap;
use std::fmt;

use crate::config::WritingConfig;
use crate::generator::compose::planning::{SectionPlan, SectionPlanner};
use crate::generator::compose::prompts::{
    WritingPhase, refinement_prompt, refinement_system_prompt, writer_system_prompt,
    writer_user_prompt,
};
use crate::generator::compose::rubric::QualityRubric;
use crate::generator::research::ReconciledSection;
use crate::llm::client::{GenerationRequest, TextGenerator};
use crate::types::QualityReport;
use crate::utils::structured::{first_fenced_block, strip_fences};
use crate::utils::text::truncate_text;

/// 生成结果无法识别时保留的最大长度
const RAW_CONTENT_LIMIT: usize = 50_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritingState {
    Planning,
    Writing,
    Validating,
    Refining,
    Done,
}

impl fmt::Display for WritingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WritingState::Planning => "planning",
            WritingState::Writing => "writing",
            WritingState::Validating => "validating",
            WritingState::Refining => "refining",
            WritingState::Done => "done",
        };
        f.write_str(name)
    }
}

impl WritingState {
    /// 校验之后的去向
    pub fn after_validation(
        policy: &RefinementPolicy,
        report: &QualityReport,
        revision_count: u32,
    ) -> Self {
        if policy.should_refine(report, revision_count) {
            WritingState::Refining
        } else {
            WritingState::Done
        }
    }
}

/// 修订触发条件
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefinementPolicy {
    pub enabled: bool,
    pub max_revisions: u32,
    pub refine_below_score: f64,
}

impl Default for RefinementPolicy {
    fn default() -> Self {
        Self::from_config(&WritingConfig::default())
    }
}

impl RefinementPolicy {
    pub fn from_config(config: &WritingConfig) -> Self {
        Self {
            enabled: config.enable_refinement,
            max_revisions: config.max_revisions,
            refine_below_score: config.refine_below_score,
        }
    }

    pub fn should_refine(&self, report: &QualityReport, revision_count: u32) -> bool {
        self.enabled
            && revision_count < self.max_revisions
            && (!report.is_valid
                || report.score < self.refine_below_score
                || report.has_structural_errors())
    }
}

/// 章节撰写的最终结果
#[derive(Debug, Clone)]
pub struct WritingOutcome {
    pub section_id: String,
    pub content: String,
    pub report: QualityReport,
    pub revision_count: u32,
    pub relevant_papers: usize,
}

/// 从生成结果中提取LaTeX：
/// 代码块优先，其次是带章节命令的正文，去掉围栏后再试一次，最后退回原文（过长时截断）
pub fn extract_latex(response: &str) -> String {
    if let Some(block) = first_fenced_block(response) {
        return block;
    }
    if has_section_command(response) {
        return response.trim().to_string();
    }

    let stripped = strip_fences(response);
    if has_section_command(&stripped) {
        return stripped;
    }

    tracing::warn!("⚠️ 无法从生成结果中识别LaTeX，使用原始内容");
    if response.chars().count() > RAW_CONTENT_LIMIT {
        tracing::warn!("⚠️ 生成结果过长 ({} 字符)，已截断", response.chars().count());
        return truncate_text(response, RAW_CONTENT_LIMIT).trim().to_string();
    }
    response.trim().to_string()
}

fn has_section_command(text: &str) -> bool {
    text.contains("\\section") || text.contains("\\subsection")
}

pub struct SectionWritingPipeline<'a> {
    generator: &'a dyn TextGenerator,
    planner: SectionPlanner<'a>,
    rubric: QualityRubric,
    policy: RefinementPolicy,
    temperature: f64,
    max_papers: usize,
}

impl<'a> SectionWritingPipeline<'a> {
    pub fn new(
        generator: &'a dyn TextGenerator,
        planner: SectionPlanner<'a>,
        config: &WritingConfig,
    ) -> Self {
        Self {
            generator,
            planner,
            rubric: QualityRubric::from_config(config),
            policy: RefinementPolicy::from_config(config),
            temperature: config.temperature,
            max_papers: config.max_papers_in_context,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// 驱动状态机直到 done。
    /// 指引缺失或撰写调用失败时返回错误；修订失败只计入修订次数。
    pub async fn run(
        &self,
        section_id: &str,
        corpus: &IndexMap<String, ReconciledSection>,
    ) -> Result<WritingOutcome> {
        let mut state = WritingState::Planning;
        let mut plan: Option<SectionPlan> = None;
        let mut content = String::new();
        let mut report = QualityReport::default();
        let mut revision_count = 0u32;

        loop {
            tracing::debug!(section = %section_id, state = %state, "撰写状态");
            state = match state {
                WritingState::Planning => {
                    plan = Some(self.planner.plan(section_id, corpus)?);
                    WritingState::Writing
                }
                WritingState::Writing => {
                    if let Some(plan) = &plan {
                        content = self.write(plan).await?;
                    }
                    WritingState::Validating
                }
                WritingState::Validating => {
                    let relevant = plan.as_ref().map_or(0, |p| p.relevant_papers.len());
                    report = self
                        .rubric
                        .evaluate(&content, QualityRubric::expected_citations(relevant));
                    log_report(section_id, &report);
                    WritingState::after_validation(&self.policy, &report, revision_count)
                }
                WritingState::Refining => {
                    tracing::info!(
                        section = %section_id,
                        "✨ 第 {}/{} 次修订 (当前得分 {:.1})",
                        revision_count + 1,
                        self.policy.max_revisions,
                        report.score
                    );
                    if let Some(refined) = self.refine(section_id, &content, &report).await {
                        content = refined;
                    }
                    revision_count += 1;
                    WritingState::Validating
                }
                WritingState::Done => break,
            };
        }

        Ok(WritingOutcome {
            section_id: section_id.to_string(),
            content,
            report,
            revision_count,
            relevant_papers: plan.map_or(0, |p| p.relevant_papers.len()),
        })
    }

    async fn write(&self, plan: &SectionPlan) -> Result<String> {
        tracing::info!(section = %plan.section_id, "✍️ 撰写章节 {}", plan.section_id);

        let request = GenerationRequest::new(
            writer_system_prompt(plan, WritingPhase::Full, self.max_papers),
            writer_user_prompt(&plan.section_id),
        )
        .with_temperature(WritingPhase::Full.temperature().unwrap_or(self.temperature));

        let response = self.generator.generate(&request).await?;
        let latex = extract_latex(&response);
        tracing::info!("   ✅ 生成完成，LaTeX 长度 {} 字符", latex.chars().count());
        Ok(latex)
    }

    async fn refine(&self, section_id: &str, content: &str, report: &QualityReport) -> Option<String> {
        let request = GenerationRequest::new(
            refinement_system_prompt(section_id),
            refinement_prompt(section_id, content, report),
        )
        .with_temperature(WritingPhase::Refine.temperature().unwrap_or(self.temperature));

        match self.generator.generate(&request).await {
            Ok(response) => {
                let refined = strip_fences(&response);
                if has_section_command(&refined) {
                    tracing::info!("   ✅ 修订完成，新长度 {} 字符", refined.chars().count());
                    Some(refined)
                } else {
                    tracing::warn!("   ⚠️ 修订结果不像有效的LaTeX，保留原内容");
                    None
                }
            }
            Err(e) => {
                tracing::warn!(section = %section_id, "   ⚠️ 修订失败，保留原内容: {}", e);
                None
            }
        }
    }
}

fn log_report(section_id: &str, report: &QualityReport) {
    tracing::info!(
        section = %section_id,
        "🔍 质量评分 {:.1}/100 {} (引用 {}, 章节 {}, 词数 {})",
        report.score,
        if report.is_valid { "✅" } else { "❌" },
        report.citation_count,
        report.section_count,
        report.word_count
    );
    for issue in report.issues.iter().take(5) {
        tracing::debug!("   ⚠️ {}", issue);
    }
    for error in report.structural_errors.iter().take(5) {
        tracing::debug!("   ❌ {}", error);
    }
}
