//! 2.5 章节词汇表：标题、文献类别映射、撰写指引加载

use anyhow::{Context, Result, bail};
use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use crate::generator::compose::dependency::SectionDependencyGraph;
use crate::generator::research::ReconciledSection;
use crate::types::{Paper, Section, SectionInfo, SectionMap};

static SUBSECTION_HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+").unwrap());

/// 默认撰写顺序
pub const STANDARD_SECTIONS: [&str; 11] = [
    "2.5.1", "2.5.2", "2.5.3", "2.5.4", "2.5.5", "2.5.6", "2.5.6.1", "2.5.6.2", "2.5.6.3",
    "2.5.6.4", "2.5.7",
];

const SECTION_TITLES: [(&str, &str); 14] = [
    ("2.5", "Clinical Overview"),
    ("2.5.1", "Product Development Rationale"),
    ("2.5.2", "Overview of Biopharmaceutics"),
    ("2.5.3", "Overview of Clinical Pharmacology"),
    ("2.5.4", "Overview of Efficacy"),
    ("2.5.5", "Overview of Safety"),
    ("2.5.6", "Benefits and Risks Conclusions"),
    ("2.5.6.1", "Therapeutic Context"),
    ("2.5.6.1.1", "Disease or Condition"),
    ("2.5.6.1.2", "Current Therapies"),
    ("2.5.6.2", "Benefits"),
    ("2.5.6.3", "Risks"),
    ("2.5.6.4", "Benefit-Risk Assessment"),
    ("2.5.7", "Literature References"),
];

const EFFICACY_SAFETY: [&str; 6] = ["5.3.5", "5.3.5.1", "5.3.5.2", "5.3.5.3", "5.3.5.4", "5.3.6"];

const BASE_LITERATURE: [(&str, &[&str]); 7] = [
    ("2.5.1", &["5.3.1", "5.3.1.1", "5.3.1.2", "5.3.3", "5.3.3.1", "5.3.3.2"]),
    ("2.5.2", &["5.3.1", "5.3.1.1", "5.3.1.2", "5.3.1.3", "5.3.1.4"]),
    (
        "2.5.3",
        &[
            "5.3.2", "5.3.2.1", "5.3.2.2", "5.3.2.3", "5.3.3", "5.3.3.1", "5.3.3.2", "5.3.3.3",
            "5.3.3.4", "5.3.3.5", "5.3.4", "5.3.4.1", "5.3.4.2",
        ],
    ),
    ("2.5.4", &["5.3.5", "5.3.5.1", "5.3.5.2", "5.3.5.3", "5.3.5.4"]),
    ("2.5.5", &EFFICACY_SAFETY),
    ("2.5.6", &EFFICACY_SAFETY),
    ("2.5.7", &[]),
];

const NESTED_LITERATURE: [(&str, &[&str]); 4] = [
    ("2.5.6.1", &["5.3.5", "5.3.5.1", "5.3.5.2", "5.3.5.3", "5.3.5.4"]),
    ("2.5.6.2", &["5.3.5", "5.3.5.1", "5.3.5.2", "5.3.5.3"]),
    ("2.5.6.3", &["5.3.5", "5.3.5.1", "5.3.5.2", "5.3.5.3", "5.3.6"]),
    ("2.5.6.4", &EFFICACY_SAFETY),
];

/// 参考文献章节，使用全部文献
pub const REFERENCES_SECTION: &str = "2.5.7";

pub fn section_title(section_id: &str) -> Option<&'static str> {
    SECTION_TITLES
        .iter()
        .find(|(sid, _)| *sid == section_id)
        .map(|(_, title)| *title)
}

pub fn standard_sections() -> Vec<String> {
    STANDARD_SECTIONS.iter().map(|s| s.to_string()).collect()
}

/// 按数字逐级比较的排序键，保证 2.5.10 排在 2.5.9 之后
pub fn section_sort_key(section_id: &str) -> Vec<u32> {
    section_id
        .split('.')
        .map(|part| part.parse().unwrap_or(u32::MAX))
        .collect()
}

fn lookup(table: &[(&str, &'static [&'static str])], section_id: &str) -> Option<&'static [&'static str]> {
    table
        .iter()
        .find(|(sid, _)| *sid == section_id)
        .map(|(_, categories)| *categories)
}

/// 章节对应的 Module 5 文献类别；未知的嵌套章节沿用父章节的映射
pub fn literature_categories(section_id: &str) -> &'static [&'static str] {
    let direct = lookup(&NESTED_LITERATURE, section_id).or_else(|| lookup(&BASE_LITERATURE, section_id));
    if let Some(categories) = direct {
        return categories;
    }

    Section::parent_id(section_id)
        .and_then(|parent| {
            lookup(&NESTED_LITERATURE, &parent).or_else(|| lookup(&BASE_LITERATURE, &parent))
        })
        .unwrap_or_default()
}

/// 挑选与章节相关的文献：映射类别中的文献、交叉标注到这些类别的文献，
/// 参考文献章节额外包含全部文献。按URL去重。
///
/// 结果中的文献带有 `source_section` 字段，记录其所在的检索章节。
pub fn find_relevant_papers(
    section_id: &str,
    sections: &IndexMap<String, ReconciledSection>,
) -> Vec<Paper> {
    let categories = literature_categories(section_id);
    let mut seen: HashSet<String> = HashSet::new();
    let mut relevant: Vec<Paper> = Vec::new();

    let mut take = |origin: &str, paper: &Paper, relevant: &mut Vec<Paper>| {
        if seen.insert(paper.url.clone()) {
            let mut paper = paper.clone();
            paper
                .extra
                .entry("source_section")
                .or_insert_with(|| Value::String(origin.to_string()));
            relevant.push(paper);
        }
    };

    for category in categories {
        if let Some(section) = sections.get(*category) {
            for paper in &section.papers {
                take(*category, paper, &mut relevant);
            }
        }
    }

    for (origin, section) in sections {
        for paper in &section.papers {
            let cross_linked = categories
                .iter()
                .any(|category| paper.also_relevant_to.iter().any(|s| s == category));
            if cross_linked {
                take(origin.as_str(), paper, &mut relevant);
            }
        }
    }

    if section_id == REFERENCES_SECTION {
        for (origin, section) in sections {
            for paper in &section.papers {
                take(origin.as_str(), paper, &mut relevant);
            }
        }
    }

    relevant
}

/// 读取章节撰写指引。
/// 嵌套章节缺少独立文件时，从父章节文件中截取以该编号开头、到下一个编号行为止的片段；
/// 截取不到则使用父章节全文。
pub fn load_section_guidance(guidance_dir: &Path, section_id: &str) -> Result<String> {
    let path = guidance_dir.join(format!("{}.txt", section_id));
    if path.exists() {
        return fs::read_to_string(&path)
            .with_context(|| format!("Failed to read guidance: {}", path.display()));
    }

    if let Some(parent_id) = Section::parent_id(section_id) {
        let parent_path = guidance_dir.join(format!("{}.txt", parent_id));
        if parent_path.exists() {
            tracing::warn!(
                "⚠️ 未找到 {}.txt，使用 {}.txt 中的撰写指引",
                section_id,
                parent_id
            );
            let content = fs::read_to_string(&parent_path)
                .with_context(|| format!("Failed to read guidance: {}", parent_path.display()))?;
            let slice = slice_subsection(&content, section_id);
            return Ok(slice.unwrap_or(content));
        }
    }

    bail!("Guidance file not found: {}", path.display())
}

fn slice_subsection(content: &str, section_id: &str) -> Option<String> {
    let mut lines = content.lines();
    let first = lines.by_ref().find(|line| line.starts_with(section_id))?;

    let mut kept = vec![first];
    kept.extend(lines.take_while(|line| !SUBSECTION_HEADER_RE.is_match(line.trim())));
    Some(kept.join("\n"))
}

/// 扫描指引目录中的全部章节（跳过 2.5 前言），按编号排序。
/// 标题优先取词汇表，否则取首行去掉编号后的内容；描述为前5行。
pub fn all_section_info(guidance_dir: &Path) -> Result<SectionMap> {
    let pattern = guidance_dir.join("*.txt");
    let mut entries: Vec<(String, SectionInfo)> = Vec::new();

    for entry in glob::glob(&pattern.to_string_lossy())? {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!("⚠️ 无法访问指引文件: {}", e);
                continue;
            }
        };
        let Some(section_id) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
            continue;
        };
        if section_id == "2.5" {
            continue;
        }

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("⚠️ 无法读取 {} 的章节信息: {}", section_id, e);
                continue;
            }
        };

        let title = match section_title(&section_id) {
            Some(title) => title.to_string(),
            None => content
                .lines()
                .next()
                .map(str::trim)
                .filter(|line| line.contains(section_id.as_str()))
                .map(|line| line.replace(section_id.as_str(), "").trim().to_string())
                .unwrap_or_default(),
        };
        let description = content.lines().take(5).collect::<Vec<_>>().join("\n").trim().to_string();

        entries.push((section_id, SectionInfo { title, description }));
    }

    entries.sort_by_key(|(sid, _)| section_sort_key(sid));
    Ok(entries.into_iter().collect())
}

/// 撰写时需要参考的章节：依赖图中的前置章节加上父章节，只保留指引目录中存在的章节
pub fn related_sections(
    section_id: &str,
    graph: &SectionDependencyGraph,
    all_sections: &SectionMap,
) -> Vec<String> {
    let mut related: Vec<String> = graph.prerequisites(section_id).to_vec();
    if let Some(parent) = Section::parent_id(section_id)
        && !related.contains(&parent)
    {
        related.push(parent);
    }
    related.retain(|sid| all_sections.contains_key(sid));
    related
}
