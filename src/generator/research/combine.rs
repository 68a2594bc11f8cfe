//! 多个大纲检索结果的汇总

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::generator::research::reconciler::{DeduplicationStats, ReconciledResult, ReconciledSection};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedSummary {
    pub total_unique_papers: usize,
    pub total_mentions: usize,
    pub papers_by_section: IndexMap<String, usize>,
    pub deduplication_stats: DeduplicationStats,
    pub sections_processed: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedResult {
    pub drug_name: String,
    pub regulation_section: String,
    pub sections: IndexMap<String, ReconciledSection>,
    pub summary: CombinedSummary,
    pub combined_at: String,
}

/// 汇总各大纲的结果。计数直接累加，不做跨大纲去重
pub fn combine_results(subject: &str, parts: &[(String, ReconciledResult)]) -> CombinedResult {
    let mut combined = CombinedResult {
        drug_name: subject.to_string(),
        regulation_section: "5.3".to_string(),
        combined_at: chrono::Local::now().to_rfc3339(),
        ..Default::default()
    };

    for (outline_id, part) in parts {
        for (sid, section) in &part.sections {
            let count = section.papers.len();
            combined.summary.papers_by_section.insert(sid.clone(), count);
            combined.summary.total_unique_papers += count;
            combined.sections.insert(sid.clone(), section.clone());
        }

        let stats = &part.summary.deduplication_stats;
        combined.summary.total_mentions += part.summary.total_mentions;
        combined.summary.deduplication_stats.duplicates_found += stats.duplicates_found;
        combined.summary.deduplication_stats.papers_removed += stats.papers_removed;
        combined.summary.sections_processed.push(outline_id.clone());
    }

    combined
}
