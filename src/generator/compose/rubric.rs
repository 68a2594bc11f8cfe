//! 生成文本的确定性质量评分

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::config::WritingConfig;
use crate::types::QualityReport;

static CITATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\(cite|modref|studyref|tableref)\{[^}]+\}").unwrap());
static SECTION_COMMAND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\(section|subsection|subsubsection)\{[^}]+\}").unwrap());
static BEGIN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\begin\{\w+\}").unwrap());
static END_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\end\{\w+\}").unwrap());
static PERCENTAGE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+%").unwrap());
static ABBREVIATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{2,6}\b").unwrap());
static PROMOTIONAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(breakthrough|revolutionary|best|guaranteed|miracle)\b").unwrap()
});

const SPECIAL_CHARS: [char; 5] = ['%', '&', '$', '#', '_'];
const SPECIAL_CHAR_WINDOW: usize = 1000;
const ALLOWED_ABBREVIATIONS: [&str; 4] = ["ICH", "FDA", "EMA", "PMID"];
const MIN_SECTIONS: usize = 1;

/// 评分规则，阈值来自撰写配置
#[derive(Debug, Clone)]
pub struct QualityRubric {
    pub min_length: usize,
    pub max_length: usize,
    pub required_markers: Vec<String>,
    pub pass_score: f64,
}

impl Default for QualityRubric {
    fn default() -> Self {
        Self::from_config(&WritingConfig::default())
    }
}

impl QualityRubric {
    pub fn from_config(config: &WritingConfig) -> Self {
        Self {
            min_length: config.min_length,
            max_length: config.max_length,
            required_markers: config.required_markers.clone(),
            pass_score: config.pass_score,
        }
    }

    /// 期望的引用数量：相关文献数，限制在 [3, 10]
    pub fn expected_citations(relevant_papers: usize) -> usize {
        relevant_papers.clamp(3, 10)
    }

    pub fn evaluate(&self, content: &str, expected_citations: usize) -> QualityReport {
        if content.trim().is_empty() {
            return QualityReport {
                is_valid: false,
                score: 0.0,
                issues: vec!["Empty content".to_string()],
                suggestions: vec!["Generate content".to_string()],
                ..Default::default()
            };
        }

        let mut report = QualityReport {
            score: 100.0,
            word_count: content.split_whitespace().count(),
            ..Default::default()
        };

        let length = content.chars().count();
        if length < self.min_length {
            report.issues.push(format!(
                "Content too short ({} chars, minimum {})",
                length, self.min_length
            ));
            report.score -= 20.0;
            report
                .suggestions
                .push("Expand content with more details and explanations".to_string());
        }
        if length > self.max_length {
            report.issues.push(format!(
                "Content too long ({} chars), may cause context issues",
                length
            ));
            report.score -= 10.0;
        }

        report.citation_count = CITATION_RE.find_iter(content).count();
        if report.citation_count < expected_citations {
            report.issues.push(format!(
                "Low citation count ({}, expected at least {})",
                report.citation_count, expected_citations
            ));
            report.score -= 15.0;
            report
                .suggestions
                .push("Add more Module 5 references to support scientific claims".to_string());
        }

        report.section_count = SECTION_COMMAND_RE.find_iter(content).count();
        if report.section_count < MIN_SECTIONS {
            report.issues.push(format!(
                "Missing section structure (found {} sections)",
                report.section_count
            ));
            report.score -= 15.0;
            report
                .suggestions
                .push("Add proper section and subsection structure".to_string());
        }

        for marker in &self.required_markers {
            if !content.contains(marker.as_str()) {
                report
                    .issues
                    .push(format!("Missing required LaTeX element: {}", marker));
                report.score -= 10.0;
                report
                    .suggestions
                    .push(format!("Add {} command to the content", marker));
            }
        }

        if content.contains("\\section") && !content.contains("\\label") {
            report
                .issues
                .push("Section without \\label - cross-referencing won't work".to_string());
            report.score -= 10.0;
            report
                .suggestions
                .push("Add \\label{sec:...} after each section command".to_string());
        }

        check_structure(content, &mut report);
        check_style(content, &mut report);

        report.score = report.score.max(0.0);
        report.is_valid = report.score >= self.pass_score && !report.has_structural_errors();
        report
    }
}

fn check_structure(content: &str, report: &mut QualityReport) {
    let open_braces = content.matches('{').count();
    let close_braces = content.matches('}').count();
    if open_braces != close_braces {
        report.structural_errors.push(format!(
            "Unbalanced braces: {} open, {} close",
            open_braces, close_braces
        ));
        report.score -= 20.0;
    }

    let begin_count = BEGIN_RE.find_iter(content).count();
    let end_count = END_RE.find_iter(content).count();
    if begin_count != end_count {
        report.structural_errors.push(format!(
            "Unbalanced environments: {} \\begin, {} \\end",
            begin_count, end_count
        ));
        report.score -= 15.0;
    }

    if content.contains("\\item")
        && !content.contains("\\begin{itemize}")
        && !content.contains("\\begin{enumerate}")
    {
        report
            .structural_errors
            .push("\\item used without itemize or enumerate environment".to_string());
        report.score -= 10.0;
    }
}

fn check_style(content: &str, report: &mut QualityReport) {
    let unescaped = unescaped_special_chars(content);
    if !unescaped.is_empty() {
        let listed: Vec<String> = unescaped.iter().map(char::to_string).collect();
        report.issues.push(format!(
            "Possible unescaped special characters: {}",
            listed.join(" ")
        ));
        report.score -= 5.0;
    }

    if has_bare_percentage(content) {
        report
            .suggestions
            .push("Consider using math mode for percentages: $X\\%$".to_string());
    }

    let promotional: BTreeSet<String> = PROMOTIONAL_RE
        .find_iter(content)
        .map(|m| m.as_str().to_lowercase())
        .collect();
    if !promotional.is_empty() {
        report.issues.push(format!(
            "Promotional language detected: {}",
            promotional.into_iter().collect::<Vec<_>>().join(", ")
        ));
        report.score -= 10.0;
        report.suggestions.push(
            "Use objective, scientific language instead of promotional terms".to_string(),
        );
    }

    let undefined: BTreeSet<&str> = ABBREVIATION_RE
        .find_iter(content)
        .map(|m| m.as_str())
        .filter(|abbr| !ALLOWED_ABBREVIATIONS.contains(abbr))
        .filter(|abbr| !content.contains(&format!("({})", abbr)))
        .collect();
    if undefined.len() > 3 {
        let sample: Vec<&str> = undefined.into_iter().take(5).collect();
        report.suggestions.push(format!(
            "Consider defining abbreviations on first use: {}",
            sample.join(", ")
        ));
    }
}

/// 开头窗口内未被反斜杠转义的特殊字符
fn unescaped_special_chars(content: &str) -> BTreeSet<char> {
    let mut found = BTreeSet::new();
    let mut previous: Option<char> = None;
    for ch in content.chars().take(SPECIAL_CHAR_WINDOW) {
        if SPECIAL_CHARS.contains(&ch) && previous != Some('\\') {
            found.insert(ch);
        }
        previous = Some(ch);
    }
    found
}

/// 数学模式之外的百分数，例如 `45%`；`$45\%$` 不计
fn has_bare_percentage(content: &str) -> bool {
    PERCENTAGE_RE.find_iter(content).any(|m| {
        let before = content[..m.start()].chars().next_back();
        let after = content[m.end()..].chars().next();
        before != Some('$') && after != Some('$')
    })
}
