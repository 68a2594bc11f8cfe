//! 撰写前的准备：指引、相关文献、相关章节及上下文预算

use anyhow::Result;
use indexmap::IndexMap;
use std::path::Path;

use crate::config::WritingConfig;
use crate::generator::compose::catalog::{
    all_section_info, find_relevant_papers, load_section_guidance, related_sections, section_title,
};
use crate::generator::compose::dependency::SectionDependencyGraph;
use crate::generator::outlet::load_written_section;
use crate::generator::research::ReconciledSection;
use crate::types::{Paper, SectionMap};
use crate::utils::text::summarize_latex_content;

/// 相关章节上下文的字符预算
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextBudget {
    pub per_section: usize,
    pub compressed: usize,
    pub ceiling: usize,
    pub warning: usize,
}

impl ContextBudget {
    pub fn from_config(config: &WritingConfig) -> Self {
        Self {
            per_section: config.related_section_budget,
            compressed: config.compressed_section_budget,
            ceiling: config.context_ceiling,
            warning: config.context_warning,
        }
    }

    /// 相关章节超过2个时，单个章节的预算减半
    pub fn per_section_for(&self, related_count: usize) -> usize {
        if related_count <= 2 {
            self.per_section
        } else {
            self.per_section / 2
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelatedSection {
    pub id: String,
    pub title: String,
    /// 已写好的正文（已按预算压缩）；尚未撰写时为 None
    pub written: Option<String>,
}

/// 单个章节的撰写上下文
#[derive(Debug, Clone)]
pub struct SectionPlan {
    pub section_id: String,
    pub guidance: String,
    pub relevant_papers: Vec<Paper>,
    pub related: Vec<RelatedSection>,
    pub context_estimate: usize,
}

pub struct SectionPlanner<'a> {
    config: &'a WritingConfig,
    graph: &'a SectionDependencyGraph,
    output_dir: &'a Path,
}

impl<'a> SectionPlanner<'a> {
    pub fn new(config: &'a WritingConfig, graph: &'a SectionDependencyGraph, output_dir: &'a Path) -> Self {
        Self {
            config,
            graph,
            output_dir,
        }
    }

    /// 指引缺失时返回错误，只影响当前章节
    pub fn plan(
        &self,
        section_id: &str,
        corpus: &IndexMap<String, ReconciledSection>,
    ) -> Result<SectionPlan> {
        tracing::info!(section = %section_id, "📋 准备章节 {} 的撰写上下文", section_id);

        let guidance = load_section_guidance(&self.config.guidance_dir, section_id)?;
        let relevant_papers = find_relevant_papers(section_id, corpus);
        tracing::info!("   ✅ 找到 {} 篇相关文献", relevant_papers.len());

        let all_sections = all_section_info(&self.config.guidance_dir).unwrap_or_else(|e| {
            tracing::warn!("⚠️ 无法扫描撰写指引目录: {}", e);
            SectionMap::new()
        });
        let related_ids = related_sections(section_id, self.graph, &all_sections);
        let dependencies = self.graph.prerequisites(section_id);

        let budget = ContextBudget::from_config(self.config);
        let per_section = budget.per_section_for(related_ids.len());
        let mut estimate = guidance.chars().count() + papers_size(&relevant_papers);
        let mut loaded = 0usize;
        let mut related = Vec::with_capacity(related_ids.len());

        for related_id in &related_ids {
            let written = load_written_section(self.output_dir, related_id, per_section).map(|content| {
                let length = content.chars().count();
                let content = if loaded > 0 && estimate + length > budget.ceiling {
                    let compressed = summarize_latex_content(&content, budget.compressed);
                    tracing::debug!(
                        "   ✓ {} 已撰写 ({}/{} 字符，已压缩)",
                        related_id,
                        compressed.chars().count(),
                        length
                    );
                    compressed
                } else {
                    tracing::debug!("   ✓ {} 已撰写 ({} 字符)", related_id, length);
                    content
                };
                loaded += 1;
                estimate += content.chars().count();
                content
            });

            if written.is_none() && dependencies.contains(related_id) {
                tracing::warn!(
                    section = %section_id,
                    "⚠️ 章节 {} 依赖的 {} 尚未撰写",
                    section_id,
                    related_id
                );
            }

            let title = all_sections
                .get(related_id)
                .map(|info| info.title.clone())
                .filter(|title| !title.is_empty())
                .or_else(|| section_title(related_id).map(str::to_string))
                .unwrap_or_else(|| related_id.clone());

            related.push(RelatedSection {
                id: related_id.clone(),
                title,
                written,
            });
        }

        if !related.is_empty() {
            tracing::info!("   📊 上下文估算: ~{} 字符", estimate);
            if estimate > budget.warning {
                tracing::warn!("⚠️ 上下文较大 (~{} 字符)，已压缩相关章节", estimate);
            }
        }

        Ok(SectionPlan {
            section_id: section_id.to_string(),
            guidance,
            relevant_papers,
            related,
            context_estimate: estimate,
        })
    }
}

fn papers_size(papers: &[Paper]) -> usize {
    serde_json::to_string(papers)
        .map(|s| s.chars().count())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests;
