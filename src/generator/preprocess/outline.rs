//! 法规大纲解析

use anyhow::{Context, Result};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use crate::types::{SectionInfo, SectionMap};

/// 2-4 级数字编号 + 标题，例如 "5.3.1.1 Bioavailability (BA) Study Reports"
static SECTION_HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d+){1,3})\s+(.+)$").unwrap());

/// 解析大纲文本。
///
/// 每个匹配编号模式的行开启一个新章节，其后的非空行（去除首尾空白）依次并入该章节描述，
/// 直到下一个章节行。第一个章节行之前的文本被丢弃；没有任何章节行时返回空映射。
/// 同一编号重复出现时以最后一次为准，但保留首次出现的位置。
pub fn parse_outline(text: &str) -> SectionMap {
    let mut sections = SectionMap::new();
    let mut current: Option<(String, String, Vec<&str>)> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = SECTION_HEADER_RE.captures(line) {
            if let Some((id, title, description)) = current.take() {
                sections.insert(id, section_info(title, &description));
            }
            current = Some((caps[1].to_string(), caps[2].trim().to_string(), Vec::new()));
        } else if let Some((_, _, description)) = current.as_mut() {
            description.push(line);
        }
    }

    if let Some((id, title, description)) = current {
        sections.insert(id, section_info(title, &description));
    }

    sections
}

fn section_info(title: String, description: &[&str]) -> SectionInfo {
    SectionInfo {
        title,
        description: description.join("\n").trim().to_string(),
    }
}

/// 读取并解析大纲文件
pub async fn load_outline(path: &Path) -> Result<SectionMap> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read regulation outline: {}", path.display()))?;
    Ok(parse_outline(&content))
}

/// 大纲文件名（不含扩展名），用作结果文件中的 regulation_section
pub fn outline_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "regulation".to_string())
}

#[cfg(test)]
mod tests;
