//! 文献记录：以URL为主标识的规范化论文实体

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 生成模型常用的占位符取值
pub const PLACEHOLDER_SENTINELS: [&str; 4] = ["...", ".", "-", ""];

/// 判断字段取值是否为占位符
pub fn is_placeholder(value: &str) -> bool {
    PLACEHOLDER_SENTINELS.contains(&value.trim())
}

/// 判断URL是否带有 http(s) 协议前缀
pub fn has_http_scheme(url: &str) -> bool {
    let url = url.trim().to_ascii_lowercase();
    url.starts_with("http://") || url.starts_with("https://")
}

/// 判断原始记录中是否存在任何占位符字段
pub fn record_has_placeholder(record: &Map<String, Value>) -> bool {
    record
        .values()
        .any(|value| matches!(value, Value::String(s) if is_placeholder(s)))
}

const KNOWN_FIELDS: [&str; 10] = [
    "title",
    "url",
    "pmid",
    "authors",
    "journal",
    "year",
    "abstract",
    "description",
    "relevance_reason",
    "also_relevant_to",
];

/// 文献记录
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Paper {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pmid: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,

    #[serde(rename = "abstract", default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,

    /// 检索代理给出的简要说明
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_reason: Option<String>,

    /// 去重阶段交叉标注的其他相关章节
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub also_relevant_to: Vec<String>,

    /// 其余未识别字段原样保留
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Paper {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    /// 从外部（检索服务或生成模型）给出的任意JSON值宽松地构造记录。
    /// 数字形式的pmid/year会被转为字符串，作者既可以是数组也可以是逗号分隔的字符串。
    pub fn from_value(value: &Value) -> Option<Self> {
        let record = value.as_object()?;

        let authors = match record.get("authors") {
            Some(Value::Array(items)) => items.iter().filter_map(text_of).collect(),
            Some(Value::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };

        let also_relevant_to = match record.get("also_relevant_to") {
            Some(Value::Array(items)) => items.iter().filter_map(text_of).collect(),
            _ => Vec::new(),
        };

        let extra = record
            .iter()
            .filter(|(key, _)| !KNOWN_FIELDS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Some(Self {
            title: record.get("title").and_then(text_of).unwrap_or_default(),
            url: record.get("url").and_then(text_of).unwrap_or_default(),
            pmid: optional_text(record, "pmid"),
            authors,
            journal: optional_text(record, "journal"),
            year: optional_text(record, "year"),
            abstract_text: optional_text(record, "abstract"),
            description: optional_text(record, "description"),
            relevance_reason: optional_text(record, "relevance_reason"),
            also_relevant_to,
            extra,
        })
    }

    /// 唯一的有效性判定：标题非占位符，URL非占位符且带 http(s) 协议
    pub fn is_valid(&self) -> bool {
        !is_placeholder(&self.title) && !is_placeholder(&self.url) && has_http_scheme(&self.url)
    }

    /// 实体标识：优先URL，缺失时退化为标题
    pub fn identity_key(&self) -> String {
        let url = self.url.trim();
        if url.is_empty() {
            format!("title:{}", self.title.trim().to_lowercase())
        } else {
            url.to_string()
        }
    }

    /// 推断文献类别时使用的来源章节
    pub fn source_section(&self) -> Option<&str> {
        self.extra.get("source_section").and_then(Value::as_str)
    }
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn optional_text(record: &Map<String, Value>, key: &str) -> Option<String> {
    record
        .get(key)
        .and_then(text_of)
        .filter(|s| !s.trim().is_empty())
}
