//! 文本裁剪、摘要与文件名处理

use regex::Regex;
use std::sync::LazyLock;

static PHARMACOPOEIA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+(USP|BP|EP|JP|NF)\s*").unwrap());
static STRENGTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+\d+\s*(mg|g|mcg|µg|ml)\s*").unwrap());
static TRAILING_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+\d+\s*$").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static UNSAFE_FILENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\-\.]").unwrap());
static REPEATED_UNDERSCORE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_+").unwrap());

pub const TRUNCATION_MARKER: &str = "\n\n[... content truncated for context length ...]";
pub const SUMMARY_MARKER: &str = "\n\n[... remaining content truncated for context length ...]";

/// 去掉药典标记、规格剂量与尾部数字，得到药物基础名称。
/// 例如 "Levofloxacin USP 250mg" -> "Levofloxacin"
pub fn extract_base_drug_name(drug_name: &str) -> String {
    let base = PHARMACOPOEIA_RE.replace_all(drug_name, " ");
    let base = STRENGTH_RE.replace_all(&base, " ");
    let base = TRAILING_NUMBER_RE.replace_all(&base, "");
    let base = WHITESPACE_RE.replace_all(&base, " ");
    let base = base.trim();

    if base.is_empty() {
        drug_name.to_string()
    } else {
        base.to_string()
    }
}

/// 将任意名称转为安全的文件名片段
pub fn sanitize_filename(name: &str) -> String {
    let sanitized = UNSAFE_FILENAME_RE.replace_all(name, "_");
    let sanitized = REPEATED_UNDERSCORE_RE.replace_all(&sanitized, "_");
    sanitized.trim_matches('_').to_string()
}

/// 截断文本到指定字符数，尽量在句末或换行处断开
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let head: String = text.chars().take(max_chars).collect();
    let cut_point = head.rfind('.').max(head.rfind('\n'));

    let truncated = match cut_point {
        // 只有损失不超过20%时才在边界处断开
        Some(idx) if head[..idx].chars().count() as f64 > max_chars as f64 * 0.8 => &head[..=idx],
        _ => head.as_str(),
    };

    format!("{}{}", truncated, TRUNCATION_MARKER)
}

/// 压缩LaTeX内容：保留章节命令与非注释行，直到用掉 90% 的预算
pub fn summarize_latex_content(latex: &str, max_chars: usize) -> String {
    if latex.chars().count() <= max_chars {
        return latex.to_string();
    }

    let budget = max_chars as f64 * 0.9;
    let mut kept: Vec<&str> = Vec::new();
    let mut chars_used = 0usize;

    for line in latex.lines() {
        let stripped = line.trim();
        let is_heading = stripped.starts_with("\\section{")
            || stripped.starts_with("\\subsection{")
            || stripped.starts_with("\\subsubsection{");

        if !is_heading && (stripped.is_empty() || stripped.starts_with('%')) {
            continue;
        }

        let line_len = line.chars().count();
        if (chars_used + line_len) as f64 > budget {
            break;
        }
        kept.push(line);
        chars_used += line_len + 1;
    }

    let mut summary = kept.join("\n");
    if latex.len() > summary.len() {
        summary.push_str(SUMMARY_MARKER);
    }
    summary
}
