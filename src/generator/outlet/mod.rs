//! 检索结果与文档片段的落盘

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::generator::research::combine::CombinedResult;
use crate::generator::research::reconciler::ReconciledResult;
use crate::types::{Paper, Section};
use crate::utils::text::sanitize_filename;

pub mod latex;

pub use latex::{LatexOutlet, load_written_section};

/// 单个章节的检索结果文件
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SectionPapersArtifact {
    pub drug_name: String,
    pub regulation_section: String,
    pub section_id: String,
    pub section_title: String,
    pub papers: Vec<Paper>,
    pub paper_count: usize,
    pub saved_at: String,
}

/// 检索阶段的JSON产物目录
pub struct ResultsOutlet {
    results_dir: PathBuf,
}

impl ResultsOutlet {
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
        }
    }

    pub fn section_results_path(&self, subject: &str, outline_stem: &str, section_id: &str) -> PathBuf {
        self.results_dir.join("section_results").join(format!(
            "{}_{}_{}_papers.json",
            sanitize_filename(subject),
            outline_stem,
            Section::file_key(section_id)
        ))
    }

    pub fn reconciled_path(&self, subject: &str, outline_stem: &str) -> PathBuf {
        self.results_dir.join(format!(
            "{}_{}_papers.json",
            sanitize_filename(subject),
            outline_stem
        ))
    }

    pub fn combined_path(&self, subject: &str) -> PathBuf {
        self.results_dir
            .join(format!("{}_5.3_combined_papers.json", sanitize_filename(subject)))
    }

    /// 保存单个章节的检索结果，只写入有效文献
    pub fn save_section_papers(
        &self,
        subject: &str,
        outline_stem: &str,
        section: &Section,
        papers: &[Paper],
    ) -> Result<PathBuf> {
        let valid: Vec<Paper> = papers.iter().filter(|p| p.is_valid()).cloned().collect();
        if valid.len() < papers.len() {
            tracing::warn!(
                section = %section.id,
                "⚠️ 保存前过滤掉 {} 条无效文献",
                papers.len() - valid.len()
            );
        }

        let artifact = SectionPapersArtifact {
            drug_name: subject.to_string(),
            regulation_section: outline_stem.to_string(),
            section_id: section.id.clone(),
            section_title: section.title.clone(),
            paper_count: valid.len(),
            papers: valid,
            saved_at: chrono::Local::now().to_rfc3339(),
        };

        let path = self.section_results_path(subject, outline_stem, &section.id);
        write_json(&path, &artifact)?;
        tracing::debug!("   💾 章节结果已保存: {}", path.display());
        Ok(path)
    }

    pub fn save_reconciled(&self, result: &ReconciledResult) -> Result<PathBuf> {
        let path = self.reconciled_path(&result.drug_name, &result.regulation_section);
        write_json(&path, result)?;
        tracing::info!("💾 检索结果已保存: {}", path.display());
        Ok(path)
    }

    pub fn save_combined(&self, combined: &CombinedResult) -> Result<PathBuf> {
        let path = self.combined_path(&combined.drug_name);
        write_json(&path, combined)?;
        tracing::info!("💾 汇总结果已保存: {}", path.display());
        Ok(path)
    }
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content).with_context(|| format!("Failed to write: {}", path.display()))
}

pub fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read: {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse: {}", path.display()))
}

#[cfg(test)]
mod tests;
