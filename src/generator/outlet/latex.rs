//! LaTeX 片段与主文档

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::generator::compose::catalog;
use crate::types::Section;
use crate::utils::text::summarize_latex_content;

const MAIN_TEMPLATE: &str = r#"% =============================================================================
% ICH Module 5 Section 2.5: Clinical Overview
% Main LaTeX Document
% =============================================================================
% Drug Product: @SUBJECT@
% Generated: @GENERATED@
% =============================================================================

\documentclass[11pt,a4paper]{article}

% Page layout
\usepackage[margin=1in]{geometry}
\usepackage{setspace}
\onehalfspacing

% Font and encoding
\usepackage[utf8]{inputenc}
\usepackage[T1]{fontenc}
\usepackage{mathptmx}

% Tables and figures
\usepackage{booktabs}
\usepackage{tabularx}
\usepackage{longtable}
\usepackage{graphicx}
\usepackage{float}

% Lists and formatting
\usepackage{enumitem}
\usepackage{parskip}

% Math
\usepackage{amsmath}
\usepackage{amssymb}

% Cross-referencing and hyperlinks
\usepackage{hyperref}
\hypersetup{
    colorlinks=true,
    linkcolor=blue,
    citecolor=blue,
    urlcolor=blue,
    pdfauthor={Regulatory Documentation},
    pdftitle={ICH Module 5 Section 2.5 - Clinical Overview - @SUBJECT@},
    pdfsubject={Regulatory Submission}
}
\usepackage[nameinlink]{cleveref}

% Headers and footers
\usepackage{fancyhdr}
\pagestyle{fancy}
\fancyhf{}
\fancyhead[L]{\small ICH Module 5 Section 2.5}
\fancyhead[R]{\small @SUBJECT@}
\fancyfoot[C]{\thepage}
\fancyfoot[R]{\small Confidential}
\renewcommand{\headrulewidth}{0.4pt}
\renewcommand{\footrulewidth}{0.4pt}

% Section titles carry their own 2.5.x numbers
\setcounter{secnumdepth}{0}

\newcommand{\modref}[1]{(see Module 5, Section #1)}
\newcommand{\studyref}[1]{(see Section 5.2, Study #1)}
\newcommand{\tableref}[1]{(see Section 5.2, Table 5.1, Row #1)}
\newcommand{\secref}[1]{(see Section #1)}

\begin{document}
@INCLUDES@
\end{document}
"#;

/// `.tex` 片段输出目录
pub struct LatexOutlet {
    output_dir: PathBuf,
}

impl LatexOutlet {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn fragment_path(&self, section_id: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.tex", Section::file_key(section_id)))
    }

    /// 写入章节片段，带生成信息头
    pub fn save_fragment(&self, section_id: &str, content: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create directory: {}", self.output_dir.display())
        })?;

        let path = self.fragment_path(section_id);
        let body = format!(
            "% Section {}\n% Generated: {}\n\n{}\n",
            section_id,
            timestamp(),
            content
        );
        fs::write(&path, body).with_context(|| format!("Failed to write: {}", path.display()))?;

        tracing::info!("   💾 已保存: {}", path.display());
        Ok(path)
    }

    /// 生成 main.tex，按给定顺序包含已存在的片段
    pub fn generate_main_document(&self, subject: &str, order: &[String]) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create directory: {}", self.output_dir.display())
        })?;

        let existing: Vec<&String> = order
            .iter()
            .filter(|sid| self.fragment_path(sid).exists())
            .collect();

        let mut includes = String::new();
        for sid in &existing {
            let title = catalog::section_title(sid).unwrap_or(sid.as_str());
            includes.push_str(&format!(
                "\n% =============================================================================\n\
                 % SECTION {} - {}\n\
                 % =============================================================================\n\
                 \\input{{{}}}\n\\newpage\n",
                sid,
                title,
                Section::file_key(sid)
            ));
        }

        let document = MAIN_TEMPLATE
            .replace("@SUBJECT@", subject)
            .replace("@GENERATED@", &timestamp())
            .replace("@INCLUDES@", &includes);

        let path = self.output_dir.join("main.tex");
        fs::write(&path, document).with_context(|| format!("Failed to write: {}", path.display()))?;

        tracing::info!("📄 已生成 main.tex: {} (包含 {} 个章节)", path.display(), existing.len());
        Ok(path)
    }
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// 读取已写好的章节正文：去掉开头的生成信息注释与空行，超出预算时压缩
pub fn load_written_section(output_dir: &Path, section_id: &str, max_chars: usize) -> Option<String> {
    let path = output_dir.join(format!("{}.tex", Section::file_key(section_id)));
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!("⚠️ 无法读取已写章节 {}: {}", section_id, e);
            return None;
        }
    };

    // 只跳过文件开头的生成头注释，正文中的同类注释保留
    let body = content
        .lines()
        .skip_while(|line| {
            let stripped = line.trim();
            stripped.is_empty()
                || stripped == "%"
                || stripped.starts_with("% Section ")
                || (stripped.starts_with('%')
                    && (stripped.contains("Generated:") || stripped.contains("Preamble")))
        })
        .filter(|line| {
            let stripped = line.trim();
            !(stripped.is_empty() || stripped == "%")
        })
        .collect::<Vec<_>>()
        .join("\n");
    let body = body.trim();

    if body.is_empty() {
        return None;
    }
    Some(summarize_latex_content(body, max_chars))
}
