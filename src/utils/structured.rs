//! 从生成模型的自由文本中尽力提取结构化（JSON）内容。
//!
//! 每种策略从文本中产出若干候选值，按策略顺序依次尝试，
//! 第一个被调用方接受的候选即为结果。

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static FENCED_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[A-Za-z]*\s*(.*?)\s*```").unwrap());
static TITLED_OBJECT_ARRAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[\s*\{[^}]*"title"[^}]*\}(?:\s*,\s*\{[^}]*"title"[^}]*\})*\s*\]"#).unwrap()
});
static FLAT_OBJECT_ARRAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\s*\{[^}]*\}(?:\s*,\s*\{[^}]*\})*\s*\]").unwrap());
static LEADING_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^```[A-Za-z]*[ \t]*\n?").unwrap());
static TRAILING_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)\s*```[ \t]*$").unwrap());

/// 提取策略，越靠后越宽松
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// 整段文本就是合法JSON
    WholeText,
    /// ``` 代码块中的JSON
    FencedBlock,
    /// 元素均含 "title" 字段的对象数组
    TitledObjectArray,
    /// 含指定键的对象（括号配平扫描）
    KeyedObject(&'static str),
    /// 任意扁平对象数组
    FlatObjectArray,
    /// 任意配平的对象或数组
    BalancedScan,
}

impl Strategy {
    fn candidates(&self, text: &str) -> Vec<Value> {
        match self {
            Strategy::WholeText => parse(text.trim()).into_iter().collect(),
            Strategy::FencedBlock => FENCED_BLOCK_RE
                .captures_iter(text)
                .filter_map(|caps| caps.get(1))
                .filter_map(|m| parse(m.as_str()))
                .collect(),
            Strategy::TitledObjectArray => TITLED_OBJECT_ARRAY_RE
                .find_iter(text)
                .filter_map(|m| parse(m.as_str()))
                .collect(),
            Strategy::KeyedObject(key) => balanced_spans(text, &['{'])
                .into_iter()
                .filter_map(parse)
                .filter(|value| value.get(key).is_some())
                .collect(),
            Strategy::FlatObjectArray => FLAT_OBJECT_ARRAY_RE
                .find_iter(text)
                .filter_map(|m| parse(m.as_str()))
                .collect(),
            Strategy::BalancedScan => balanced_spans(text, &['{', '['])
                .into_iter()
                .filter_map(parse)
                .collect(),
        }
    }
}

/// 提取结果及命中的策略
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub strategy: Strategy,
    pub value: Value,
}

/// 按顺序应用多种策略的提取器
#[derive(Debug, Clone)]
pub struct StructuredExtractor {
    strategies: Vec<Strategy>,
}

impl StructuredExtractor {
    pub fn new(strategies: Vec<Strategy>) -> Self {
        Self { strategies }
    }

    /// 用于提取文献列表的策略序列
    pub fn for_paper_lists() -> Self {
        Self::new(vec![
            Strategy::WholeText,
            Strategy::FencedBlock,
            Strategy::TitledObjectArray,
            Strategy::KeyedObject("papers"),
            Strategy::FlatObjectArray,
        ])
    }

    /// 用于提取含指定顶层键的对象
    pub fn for_keyed_object(key: &'static str) -> Self {
        Self::new(vec![
            Strategy::WholeText,
            Strategy::FencedBlock,
            Strategy::KeyedObject(key),
            Strategy::BalancedScan,
        ])
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    pub fn extract<F>(&self, text: &str, accept: F) -> Option<Extracted>
    where
        F: Fn(&Value) -> bool,
    {
        for strategy in &self.strategies {
            if let Some(value) = strategy.candidates(text).into_iter().find(|v| accept(v)) {
                return Some(Extracted {
                    strategy: *strategy,
                    value,
                });
            }
        }
        None
    }
}

/// 第一个 ``` 代码块的内容
pub fn first_fenced_block(text: &str) -> Option<String> {
    FENCED_BLOCK_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// 去掉行首/行尾的 ``` 围栏标记
pub fn strip_fences(text: &str) -> String {
    let text = LEADING_FENCE_RE.replace_all(text, "");
    TRAILING_FENCE_RE.replace_all(&text, "").trim().to_string()
}

fn parse(candidate: &str) -> Option<Value> {
    serde_json::from_str(candidate).ok()
}

/// 找出所有以指定开括号起始、括号配平的片段（忽略字符串内部的括号），按起始位置排序。
/// 单次扫描：括号失配时丢弃所有未闭合的开括号；括号之外的引号视为普通文本。
fn balanced_spans<'a>(text: &'a str, openers: &[char]) -> Vec<&'a str> {
    let mut open: Vec<(usize, char)> = Vec::new();
    let mut found: Vec<(usize, usize)> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' if !open.is_empty() => in_string = true,
            '{' => open.push((idx, '}')),
            '[' => open.push((idx, ']')),
            '}' | ']' => match open.pop() {
                Some((start, expected)) if expected == ch => {
                    found.push((start, idx + ch.len_utf8()));
                }
                Some(_) => open.clear(),
                None => {}
            },
            _ => {}
        }
    }

    found.sort_unstable_by_key(|&(start, _)| start);
    found
        .into_iter()
        .filter(|&(start, _)| text[start..].starts_with(openers))
        .map(|(start, end)| &text[start..end])
        .collect()
}

#[cfg(test)]
mod tests;
