//! 章节标识与大纲条目

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// 大纲中的单个章节描述（不含编号）
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SectionInfo {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// 有序的 章节编号 -> 章节描述 映射，保持大纲中的出现顺序
pub type SectionMap = IndexMap<String, SectionInfo>;

/// 带编号的章节，解析完成后不再修改
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Section {
    pub id: String,
    pub title: String,
    pub description: String,
}

impl Section {
    pub fn new(id: impl Into<String>, info: &SectionInfo) -> Self {
        Self {
            id: id.into(),
            title: info.title.clone(),
            description: info.description.clone(),
        }
    }

    /// 嵌套章节（4级及以上）的父章节编号，例如 2.5.6.1 -> 2.5.6
    pub fn parent_id(id: &str) -> Option<String> {
        let parts: Vec<&str> = id.split('.').collect();
        if parts.len() > 3 {
            Some(parts[..parts.len() - 1].join("."))
        } else {
            None
        }
    }

    /// 用于文件名与LaTeX label的编号形式，例如 2.5.6.1 -> 2_5_6_1
    pub fn file_key(id: &str) -> String {
        id.replace('.', "_")
    }
}
