//! 从检索对话中提取文献列表

use serde_json::Value;
use std::collections::HashSet;

use crate::types::paper::record_has_placeholder;
use crate::types::{Paper, Transcript};
use crate::utils::structured::StructuredExtractor;

/// 最终采用的候选来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    /// 助手给出的列表，无占位符
    Text,
    /// 检索工具的原始输出，至少含一条有效记录
    Tool,
    /// 剔除占位符记录后的助手列表
    SalvagedText,
    /// 检索工具的原始输出（兜底）
    RawTool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub source: CandidateSource,
    pub papers: Vec<Paper>,
}

pub struct LiteraturePaperExtractor {
    structured: StructuredExtractor,
}

impl Default for LiteraturePaperExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl LiteraturePaperExtractor {
    pub fn new() -> Self {
        Self {
            structured: StructuredExtractor::for_paper_lists(),
        }
    }

    /// 所有工具输出中 `papers` 列表的并集
    pub fn tool_candidate(&self, transcript: &Transcript) -> Vec<Value> {
        transcript
            .tool_outputs()
            .filter_map(|m| serde_json::from_str::<Value>(&m.content).ok())
            .filter_map(|value| value.get("papers").and_then(Value::as_array).cloned())
            .flatten()
            .collect()
    }

    /// 助手消息中的文献列表。
    /// 逐条解析时后出现的列表覆盖先前的结果，因此以最后一条能解析出列表的消息为准；
    /// 助手常在末尾给出经过筛选的最终列表
    pub fn text_candidate(&self, transcript: &Transcript) -> Vec<Value> {
        let texts: Vec<&str> = transcript.assistant_texts().collect();
        texts
            .into_iter()
            .rev()
            .find_map(|text| {
                self.structured
                    .extract(text, |v| paper_records(v).is_some_and(|r| !r.is_empty()))
                    .and_then(|extracted| paper_records(&extracted.value))
            })
            .unwrap_or_default()
    }

    /// 按优先级选择候选，再做有效性过滤与URL去重
    pub fn extract(&self, transcript: &Transcript) -> Extraction {
        let tool = self.tool_candidate(transcript);
        let text = self.text_candidate(transcript);

        let (source, records) = if !text.is_empty() && !any_placeholder(&text) {
            (CandidateSource::Text, text)
        } else if !tool.is_empty() && tool.iter().any(is_valid_record) {
            if !text.is_empty() {
                tracing::debug!("   🔧 助手列表含占位符，改用工具输出 ({} 篇)", tool.len());
            }
            (CandidateSource::Tool, tool)
        } else if !text.is_empty() {
            let total = text.len();
            let salvaged: Vec<Value> = text
                .into_iter()
                .filter(|r| !r.as_object().is_some_and(record_has_placeholder))
                .collect();
            tracing::debug!("   🔧 剔除占位符记录: {} -> {}", total, salvaged.len());
            (CandidateSource::SalvagedText, salvaged)
        } else {
            (CandidateSource::RawTool, tool)
        };

        Extraction {
            source,
            papers: finalize(&records),
        }
    }
}

/// 接受文献对象数组，或带 `papers` 数组的对象
fn paper_records(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => {
            let looks_like_papers = items.iter().all(|item| {
                item.as_object().is_some_and(|o| {
                    o.contains_key("title") || o.contains_key("url") || o.contains_key("description")
                })
            });
            looks_like_papers.then(|| items.clone())
        }
        Value::Object(map) => map.get("papers").and_then(Value::as_array).cloned(),
        _ => None,
    }
}

fn any_placeholder(records: &[Value]) -> bool {
    records
        .iter()
        .filter_map(Value::as_object)
        .any(record_has_placeholder)
}

fn is_valid_record(record: &Value) -> bool {
    Paper::from_value(record).is_some_and(|p| p.is_valid())
}

/// 有效性过滤后按URL去重，保留首次出现
pub fn finalize(records: &[Value]) -> Vec<Paper> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter_map(Paper::from_value)
        .filter(Paper::is_valid)
        .filter(|paper| seen.insert(paper.identity_key()))
        .collect()
}
