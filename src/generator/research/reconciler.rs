//! 跨章节文献去重与交叉标注。
//!
//! 去重判定交给生成服务完成，但只提交 `{index, title, url, pmid}` 组成的轻量视图；
//! 返回的是按下标寻址的删除/交叉标注指令，再回写到完整数据上。
//! 生成服务失败或返回无法解析时，原样输出未去重的并集。

use anyhow::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet};

use crate::generator::research::prompts::{DEDUPLICATION_SYSTEM_PROMPT, deduplication_prompt};
use crate::llm::client::{GenerationRequest, TextGenerator};
use crate::types::{Paper, SectionMap};
use crate::utils::structured::StructuredExtractor;

/// 章节编号 -> 该章节检索到的文献（顺序即下标）
pub type SectionResultSet = IndexMap<String, Vec<Paper>>;

/// 按下标寻址的去重指令
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeduplicationInstruction {
    pub removals: BTreeMap<String, BTreeSet<usize>>,
    pub also_relevant: BTreeMap<String, BTreeMap<usize, Vec<String>>>,
}

impl DeduplicationInstruction {
    /// 从生成服务的自由文本中解析指令
    pub fn parse(text: &str) -> Option<Self> {
        StructuredExtractor::for_keyed_object("removals")
            .extract(text, |v| {
                v.is_object() && (v.get("removals").is_some() || v.get("also_relevant").is_some())
            })
            .map(|extracted| Self::from_value(&extracted.value))
    }

    /// 宽松转换：下标可以是整数、无小数部分的浮点数或数字字符串，负数与无法识别的值被忽略
    pub fn from_value(value: &Value) -> Self {
        let mut instruction = Self::default();

        if let Some(removals) = value.get("removals").and_then(Value::as_object) {
            for (section_id, indices) in removals {
                let set: BTreeSet<usize> = indices
                    .as_array()
                    .map(|items| items.iter().filter_map(as_index).collect())
                    .unwrap_or_default();
                if !set.is_empty() {
                    instruction.removals.insert(section_id.clone(), set);
                }
            }
        }

        if let Some(also_relevant) = value.get("also_relevant").and_then(Value::as_object) {
            for (section_id, links) in also_relevant {
                let Some(links) = links.as_object() else {
                    continue;
                };
                let mut by_index = BTreeMap::new();
                for (index, targets) in links {
                    let Ok(index) = index.trim().parse::<usize>() else {
                        continue;
                    };
                    let targets: Vec<String> = targets
                        .as_array()
                        .map(|items| {
                            items
                                .iter()
                                .filter_map(Value::as_str)
                                .map(str::to_string)
                                .collect()
                        })
                        .unwrap_or_default();
                    if !targets.is_empty() {
                        by_index.insert(index, targets);
                    }
                }
                if !by_index.is_empty() {
                    instruction.also_relevant.insert(section_id.clone(), by_index);
                }
            }
        }

        instruction
    }

    pub fn is_empty(&self) -> bool {
        self.removals.is_empty() && self.also_relevant.is_empty()
    }
}

fn as_index(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n.as_u64().map(|n| n as usize).or_else(|| {
            n.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as usize)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeduplicationStats {
    pub duplicates_found: usize,
    pub papers_removed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    pub total_unique_papers: usize,
    /// 去重前各章节文献数之和
    pub total_mentions: usize,
    pub papers_by_section: IndexMap<String, usize>,
    pub deduplication_stats: DeduplicationStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconciledSection {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub papers: Vec<Paper>,
}

/// 单个大纲的最终检索结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconciledResult {
    pub drug_name: String,
    pub regulation_section: String,
    pub sections: IndexMap<String, ReconciledSection>,
    pub summary: ReconciliationSummary,
}

impl ReconciledResult {
    /// 每篇文献在所属章节中的位置，用于检查是否仍有重复URL
    pub fn all_papers(&self) -> impl Iterator<Item = (&str, &Paper)> {
        self.sections
            .iter()
            .flat_map(|(sid, s)| s.papers.iter().map(move |p| (sid.as_str(), p)))
    }
}

/// 构造提交给去重判定的轻量视图
pub fn build_projection(sections: &SectionMap, results: &SectionResultSet) -> Value {
    let projected: serde_json::Map<String, Value> = sections
        .iter()
        .map(|(sid, info)| {
            let papers: Vec<Value> = results
                .get(sid)
                .map(Vec::as_slice)
                .unwrap_or_default()
                .iter()
                .enumerate()
                .map(|(index, paper)| {
                    json!({
                        "index": index,
                        "title": paper.title,
                        "url": paper.url,
                        "pmid": paper.pmid.clone().unwrap_or_default(),
                    })
                })
                .collect();
            (sid.clone(), json!({ "title": info.title, "papers": papers }))
        })
        .collect();

    json!({ "sections": projected })
}

/// 将指令回写到完整数据
pub fn apply_instruction(
    subject: &str,
    regulation_section: &str,
    sections: &SectionMap,
    results: &SectionResultSet,
    instruction: &DeduplicationInstruction,
) -> ReconciledResult {
    let mut stats = DeduplicationStats::default();
    let mut reconciled = IndexMap::new();
    let mut total_mentions = 0;

    for (sid, info) in sections {
        let mut papers = results.get(sid).cloned().unwrap_or_default();
        total_mentions += papers.len();

        if let Some(indices) = instruction.removals.get(sid) {
            // 倒序删除，保证剩余下标不受影响
            for &index in indices.iter().rev() {
                if index < papers.len() {
                    papers.remove(index);
                    stats.papers_removed += 1;
                    stats.duplicates_found += 1;
                }
            }
        }

        // 交叉标注的下标针对删除后的列表
        if let Some(links) = instruction.also_relevant.get(sid) {
            for (&index, targets) in links {
                if let Some(paper) = papers.get_mut(index) {
                    paper.also_relevant_to.extend(targets.iter().cloned());
                }
            }
        }

        reconciled.insert(
            sid.clone(),
            ReconciledSection {
                title: info.title.clone(),
                description: info.description.clone(),
                papers,
            },
        );
    }

    let papers_by_section: IndexMap<String, usize> = reconciled
        .iter()
        .map(|(sid, s)| (sid.clone(), s.papers.len()))
        .collect();

    ReconciledResult {
        drug_name: subject.to_string(),
        regulation_section: regulation_section.to_string(),
        summary: ReconciliationSummary {
            total_unique_papers: papers_by_section.values().sum(),
            total_mentions,
            papers_by_section,
            deduplication_stats: stats,
        },
        sections: reconciled,
    }
}

/// 未去重的兜底结果，计数按“未发生去重”报告
pub fn unreconciled(
    subject: &str,
    regulation_section: &str,
    sections: &SectionMap,
    results: &SectionResultSet,
) -> ReconciledResult {
    apply_instruction(
        subject,
        regulation_section,
        sections,
        results,
        &DeduplicationInstruction::default(),
    )
}

pub struct SectionResultReconciler<'a> {
    generator: &'a dyn TextGenerator,
    temperature: f64,
}

impl<'a> SectionResultReconciler<'a> {
    pub fn new(generator: &'a dyn TextGenerator, temperature: f64) -> Self {
        Self {
            generator,
            temperature,
        }
    }

    /// 请求去重判定，失败时返回 None
    pub async fn request_instruction(&self, projection: &Value) -> Result<Option<DeduplicationInstruction>> {
        let request = GenerationRequest::new(DEDUPLICATION_SYSTEM_PROMPT, deduplication_prompt(projection))
            .with_temperature(self.temperature);
        let response = self.generator.generate(&request).await?;
        Ok(DeduplicationInstruction::parse(&response))
    }

    pub async fn reconcile(
        &self,
        subject: &str,
        regulation_section: &str,
        sections: &SectionMap,
        results: &SectionResultSet,
    ) -> ReconciledResult {
        tracing::info!("🔄 跨章节去重: {} 个章节", sections.len());

        let projection = build_projection(sections, results);

        let instruction = match self.request_instruction(&projection).await {
            Ok(Some(instruction)) => instruction,
            Ok(None) => {
                tracing::warn!("⚠️ 去重结果无法解析，使用未去重的数据");
                return unreconciled(subject, regulation_section, sections, results);
            }
            Err(e) => {
                tracing::warn!("⚠️ 去重请求失败，使用未去重的数据: {}", e);
                return unreconciled(subject, regulation_section, sections, results);
            }
        };

        let result = apply_instruction(subject, regulation_section, sections, results, &instruction);
        let summary = &result.summary;
        tracing::info!(
            unique = summary.total_unique_papers,
            mentions = summary.total_mentions,
            removed = summary.deduplication_stats.papers_removed,
            "✅ 去重完成"
        );
        result
    }
}
