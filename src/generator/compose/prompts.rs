//! 章节撰写与修订的提示词

use crate::generator::compose::planning::{RelatedSection, SectionPlan};
use crate::types::{Paper, QualityReport, Section};
use crate::utils::text::summarize_latex_content;

const RULE: &str = "============================================================";
const HEAVY_RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";
const RELATED_PREVIEW_CHARS: usize = 2000;
const RELATED_PREVIEW_LINES: usize = 10;
const KEY_FINDING_CHARS: usize = 200;

pub const REGULATORY_WRITING_GUIDELINES: &str = r#"REGULATORY WRITING STANDARDS (ICH M4E Compliance):

1. LANGUAGE AND TONE:
   - Use precise, unambiguous scientific language
   - Maintain objective, third-person perspective
   - Avoid promotional or biased language
   - Use active voice where appropriate for clarity
   - Define abbreviations on first use

2. STRUCTURE AND ORGANIZATION:
   - Follow a logical flow from general to specific
   - Use clear topic sentences for each paragraph
   - Ensure smooth transitions between sections
   - Include appropriate cross-references to other sections

3. DATA PRESENTATION:
   - Present data objectively with appropriate context
   - Include relevant statistics and confidence intervals
   - Discuss both positive and negative findings
   - Acknowledge limitations transparently

4. CITATION STANDARDS:
   - Support every scientific claim with a Module 5 reference
   - Use the \modref{}, \studyref{} and \tableref{} commands consistently
   - Prioritize peer-reviewed publications

5. REGULATORY COMPLIANCE:
   - Address all required elements per ICH guidelines
   - Use standardized terminology (MedDRA, WHO-DD)
   - Include required safety and efficacy summaries
   - Follow regional requirements as applicable"#;

/// 撰写阶段，决定提示词中的任务说明与采样温度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritingPhase {
    /// 一次写出完整章节
    Full,
    /// 按质量报告修订已有内容
    Refine,
}

impl WritingPhase {
    /// `Full` 使用调用方配置的温度
    pub fn temperature(self) -> Option<f64> {
        match self {
            WritingPhase::Full => None,
            WritingPhase::Refine => Some(0.2),
        }
    }

    pub fn instructions(self) -> &'static str {
        match self {
            WritingPhase::Full => "CURRENT TASK: WRITE COMPLETE SECTION\n\n\
                 Write a comprehensive, polished LaTeX section that is ready for regulatory submission.",
            WritingPhase::Refine => "CURRENT TASK: REFINE AND IMPROVE DRAFT\n\n\
                 Review and improve the existing draft. Focus on:\n\
                 1. Improving clarity and flow of the text\n\
                 2. Ensuring all claims are properly referenced\n\
                 3. Adding missing cross-references to other sections\n\
                 4. Fixing any LaTeX formatting issues\n\
                 5. Enhancing regulatory compliance language\n\n\
                 Return the complete, refined LaTeX content.",
        }
    }
}

/// Module 5.3 文献类别及其名称
const LITERATURE_GROUPS: [(&str, &str); 6] = [
    ("5.3.1", "Biopharmaceutic Studies"),
    ("5.3.2", "PK Using Human Biomaterials"),
    ("5.3.3", "Human PK Studies"),
    ("5.3.4", "Human PD Studies"),
    ("5.3.5", "Efficacy and Safety Studies"),
    ("5.3.6", "Post-marketing Experience"),
];

const DEFAULT_GROUP: &str = "5.3.5";

const KEYWORD_GROUPS: [(&str, &[&str]); 5] = [
    ("5.3.1", &["bioavailability", "bioequivalence", "dissolution"]),
    (
        "5.3.3",
        &["pharmacokinetic", "absorption", "distribution", "metabolism", "excretion"],
    ),
    ("5.3.4", &["pharmacodynamic", "receptor", "mechanism"]),
    (
        "5.3.5",
        &["efficacy", "clinical trial", "phase", "randomized", "safety", "adverse"],
    ),
    ("5.3.6", &["post-market", "surveillance", "real-world"]),
];

/// 文献所属的 5.3 类别：优先按来源章节前缀，否则按标题与摘要中的关键词推断
pub fn infer_category(paper: &Paper) -> &'static str {
    if let Some(source) = paper.source_section().filter(|s| !s.is_empty()) {
        return LITERATURE_GROUPS
            .iter()
            .map(|(key, _)| *key)
            .find(|key| source.starts_with(key))
            .unwrap_or(DEFAULT_GROUP);
    }

    let haystack = format!(
        "{} {}",
        paper.title.to_lowercase(),
        paper.abstract_text.as_deref().unwrap_or_default().to_lowercase()
    );
    KEYWORD_GROUPS
        .iter()
        .find(|(_, terms)| terms.iter().any(|term| haystack.contains(term)))
        .map(|(key, _)| *key)
        .unwrap_or(DEFAULT_GROUP)
}

/// 摘要的第一句；过长时取前200个字符
pub fn key_finding(abstract_text: &str) -> String {
    let first = abstract_text.split('.').next().unwrap_or_default();
    let sentence = format!("{}.", first);
    if sentence.chars().count() > KEY_FINDING_CHARS {
        let head: String = abstract_text.chars().take(KEY_FINDING_CHARS).collect();
        format!("{}...", head)
    } else {
        sentence
    }
}

/// 按 5.3 类别分组列出文献，最多 `max_papers` 篇
pub fn format_papers_context(papers: &[Paper], max_papers: usize) -> String {
    if papers.is_empty() {
        return String::new();
    }

    let shown = papers.len().min(max_papers);
    let mut context = format!(
        "CLINICAL STUDY DATA FROM MODULE 5 ({} of {} studies):\n{}\n\
         IMPORTANT: Reference these using \\modref{{5.3.X.X}} format, NOT \\cite{{}}!\n\
         For the tabular listing of all studies, use \\modref{{5.2}}.\n{}\n",
        shown,
        papers.len(),
        RULE,
        RULE
    );

    let mut index = 1;
    for (key, name) in LITERATURE_GROUPS {
        let group: Vec<&Paper> = papers[..shown]
            .iter()
            .filter(|paper| infer_category(paper) == key)
            .collect();
        if group.is_empty() {
            continue;
        }

        context.push_str(&format!(
            "\n--- Section {}: {} ---\nReference as: \\modref{{{}}} or \\modref{{{}.X}} for subsections\n\n",
            key, name, key, key
        ));

        for paper in group {
            let location = paper.source_section().unwrap_or(key);
            context.push_str(&format!("[{}] {}\n", index, paper.title));
            if !paper.authors.is_empty() {
                let mut authors = paper.authors.iter().take(3).cloned().collect::<Vec<_>>().join(", ");
                if paper.authors.len() > 3 {
                    authors.push_str(" et al.");
                }
                context.push_str(&format!("    Authors: {}\n", authors));
            }
            if let (Some(journal), Some(year)) = (&paper.journal, &paper.year) {
                context.push_str(&format!("    Published: {} ({})\n", journal, year));
            }
            context.push_str(&format!("    Module 5 Location: Section {}\n", location));
            context.push_str(&format!("    Reference: \\modref{{{}}}\n", location));
            if let Some(abstract_text) = paper.abstract_text.as_deref().filter(|a| !a.is_empty()) {
                context.push_str(&format!("    Key Finding: {}\n", key_finding(abstract_text)));
            }
            context.push('\n');
            index += 1;
        }
    }

    if papers.len() > max_papers {
        context.push_str(&format!(
            "\n[... {} additional studies available in Module 5 ...]\n",
            papers.len() - max_papers
        ));
    }

    context.push_str(RULE);
    context.push_str(
        "\nREMINDER: Use these reference formats:\n\
         \x20 - \\modref{5.3.1} - for biopharmaceutic studies\n\
         \x20 - \\modref{5.3.5.1} - for specific efficacy study reports\n\
         \x20 - \\modref{5.2} - for the tabular listing of all clinical studies\n\
         \x20 - \\tableref{X} - for specific study in Table 5.1\n\
         \x20 - \\studyref{Study-ID} - for specific study by ID\n",
    );
    context.push_str(RULE);
    context.push('\n');
    context
}

/// 相关章节的交叉引用说明与已写内容预览
pub fn format_related_sections(related: &[RelatedSection]) -> String {
    if related.is_empty() {
        return String::new();
    }

    let mut context = format!(
        "RELATED SECTIONS IN 2.5 FOR CROSS-REFERENCING:\n{}\n\
         Cross-reference these sections using \\secref{{2.5.X}} command.\n\
         Always add \\label{{sec:X_Y_Z}} after your section commands.\n",
        RULE
    );

    for section in related {
        context.push_str(&format!(
            "\n[{}] {}\n    Cross-ref: \\secref{{{}}}\n",
            section.id, section.title, section.id
        ));

        match section.written.as_deref().filter(|w| !w.is_empty()) {
            Some(content) => {
                let total = content.chars().count();
                let preview = if total > RELATED_PREVIEW_CHARS {
                    context.push_str(&format!("    Content preview ({} chars total):\n", total));
                    summarize_latex_content(content, RELATED_PREVIEW_CHARS)
                } else {
                    context.push_str("    Content:\n");
                    content.to_string()
                };
                for line in preview.lines().take(RELATED_PREVIEW_LINES) {
                    context.push_str(&format!("      {}\n", line));
                }
            }
            None => context.push_str("    Status: Not yet written (use forward reference)\n"),
        }
    }

    context.push_str(RULE);
    context.push('\n');
    context
}

fn formatting_requirements(section_id: &str) -> String {
    let label = Section::file_key(section_id);
    format!(
        r#"LATEX FORMATTING REQUIREMENTS:
{rule}
- Section commands: Use the EXACT section number in the title: \section{{{sid} Title}}
  Example: \section{{2.5.1 Product Development Rationale}}
- Labels: \label{{sec:{label}}} immediately after section commands
- Cross-references to OTHER 2.5 sections: \secref{{2.5.X}} (e.g., \secref{{2.5.3}})
- Bold: \textbf{{text}}, Italic: \textit{{text}}
- Lists: \begin{{itemize}}...\end{{itemize}} or \begin{{enumerate}}...\end{{enumerate}}
- Math: $x = y$ for inline, \[x = y\] for display
- Special characters: Escape %, $, &, #, _ as \%, \$, \&, \#, \_
{rule}

REFERENCING MODULE 5 CLINICAL STUDY DATA:
{rule}
IMPORTANT: Do NOT use \cite{{PMID...}} for citations!

Instead, reference Module 5 sections directly using these formats:
- For clinical study reports: \modref{{5.3.5.1}}
- For tabular listings: \tableref{{X}} where X is the study/row number
- For specific studies: \studyref{{Study-001}}

Section 5.2 contains the Tabular Listing of All Clinical Studies.
Section 5.3 contains the Clinical Study Reports organized as:
  5.3.1 - Reports of Biopharmaceutic Studies
  5.3.2 - Reports of Studies Pertinent to Pharmacokinetics
  5.3.3 - Reports of Human PK Studies
  5.3.4 - Reports of Human PD Studies
  5.3.5 - Reports of Efficacy and Safety Studies
  5.3.6 - Reports of Post-marketing Experience
{rule}

OUTPUT REQUIREMENTS:
1. Return ONLY LaTeX code (no markdown code blocks, no explanations)
2. Start with \section{{{sid} Title}} - include the section number in the title!
3. Include \label{{sec:{label}}} after the section command
4. Do NOT include document preamble (\documentclass, \begin{{document}}, etc.)
5. Ensure all braces are balanced and environments are properly closed
6. Use \modref{{}}, \tableref{{}}, or \studyref{{}} for references to Module 5 data
7. Use \secref{{2.5.X}} for cross-references to other 2.5 sections

QUALITY STANDARDS:
- Comprehensive coverage of all guidance topics
- At least 3-5 references to Module 5 sections (5.2 or 5.3.x)
- Cross-references to related 2.5 sections using \secref{{2.5.X}}
- Professional regulatory language with no promotional terms
- Clear, logical structure with section numbers in titles
- Proper abbreviation definitions"#,
        rule = HEAVY_RULE,
        sid = section_id,
        label = label
    )
}

/// 撰写代理的系统提示词
pub fn writer_system_prompt(plan: &SectionPlan, phase: WritingPhase, max_papers: usize) -> String {
    let mut parts = vec![
        "You are an expert regulatory medical writer specializing in ICH Module 5 Section 2.5: Clinical Overview.".to_string(),
        format!(
            "You are writing Section {} as part of a system where each section is written by a dedicated writer.",
            plan.section_id
        ),
        REGULATORY_WRITING_GUIDELINES.to_string(),
        format!(
            "SECTION GUIDANCE FROM REGULATORY REQUIREMENTS:\n{}\n{}\n{}",
            RULE, plan.guidance, RULE
        ),
    ];

    let papers = format_papers_context(&plan.relevant_papers, max_papers);
    if !papers.is_empty() {
        parts.push(papers);
    }
    let related = format_related_sections(&plan.related);
    if !related.is_empty() {
        parts.push(related);
    }

    parts.push(phase.instructions().to_string());
    parts.push(formatting_requirements(&plan.section_id));
    parts.join("\n\n")
}

pub fn writer_user_prompt(section_id: &str) -> String {
    format!(
        "Write the LaTeX content for Section {} based on the guidance provided.\n\n\
         Ensure that:\n\
         1. All key points from the guidance are addressed\n\
         2. Relevant papers are cross-referenced appropriately\n\
         3. The LaTeX is properly formatted and structured\n\
         4. The content is comprehensive and suitable for regulatory submission\n\n\
         Return ONLY the LaTeX code starting with the appropriate sectioning command.",
        section_id
    )
}

pub fn refinement_system_prompt(section_id: &str) -> String {
    format!(
        "You are a LaTeX expert improving regulatory documentation for Section {}. Fix all issues and improve quality.\n\n{}",
        section_id,
        WritingPhase::Refine.instructions()
    )
}

fn bullet_list(items: &[String], fallback: &str) -> String {
    if items.is_empty() {
        format!("- {}", fallback)
    } else {
        items
            .iter()
            .map(|item| format!("- {}", item))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// 根据质量报告构造修订请求
pub fn refinement_prompt(section_id: &str, content: &str, report: &QualityReport) -> String {
    format!(
        "Please refine and improve the following LaTeX content for Section {sid}.\n\n\
         CURRENT CONTENT:\n```latex\n{content}\n```\n\n\
         ISSUES TO FIX:\n{issues}\n\n\
         LATEX ERRORS TO CORRECT:\n{errors}\n\n\
         IMPROVEMENTS TO MAKE:\n{suggestions}\n\n\
         Please provide the complete, improved LaTeX content. Focus on:\n\
         1. Fixing all identified issues and errors\n\
         2. Improving clarity and flow\n\
         3. Ensuring proper Module 5 references and cross-references\n\
         4. Maintaining regulatory writing standards\n\n\
         Return ONLY the improved LaTeX code, starting with the section command.",
        sid = section_id,
        content = content,
        issues = bullet_list(&report.issues, "No major issues"),
        errors = bullet_list(&report.structural_errors, "No LaTeX errors"),
        suggestions = bullet_list(&report.suggestions, "Polish and improve clarity"),
    )
}

#[cfg(test)]
mod tests;
