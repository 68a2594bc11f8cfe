use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::generator::{context::GeneratorContext, types::Generator};
use crate::types::SectionMap;

pub mod drug_context;
pub mod outline;

pub use drug_context::load_drug_context;
pub use outline::{load_outline, outline_stem, parse_outline};

/// 预处理结果：解析后的大纲与药物背景资料
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PreprocessingResult {
    pub subject: String,
    /// 大纲文件名（不含扩展名）
    pub regulation_section: String,
    pub sections: SectionMap,
    pub drug_context: String,
}

pub struct OutlinePreprocessor {
    outline_path: PathBuf,
    subject: String,
}

impl OutlinePreprocessor {
    pub fn new(outline_path: impl Into<PathBuf>, subject: impl Into<String>) -> Self {
        Self {
            outline_path: outline_path.into(),
            subject: subject.into(),
        }
    }
}

impl Generator<PreprocessingResult> for OutlinePreprocessor {
    fn stage(&self) -> &'static str {
        "preprocess"
    }

    async fn execute(&self, context: GeneratorContext) -> Result<PreprocessingResult> {
        tracing::info!("📋 解析法规大纲: {}", self.outline_path.display());

        let sections = load_outline(&self.outline_path).await?;
        tracing::info!("   发现 {} 个章节", sections.len());

        let drug_context =
            load_drug_context(&self.subject, &context.config.research.context_dir).await;

        Ok(PreprocessingResult {
            subject: self.subject.clone(),
            regulation_section: outline_stem(&self.outline_path),
            sections,
            drug_context,
        })
    }
}
