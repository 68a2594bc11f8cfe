use serde::{Deserialize, Serialize};

/// 生成文本的结构化质量报告，每次校验都会重新计算
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QualityReport {
    /// 得分达标且不存在结构错误
    pub is_valid: bool,
    /// 0-100
    pub score: f64,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
    /// 括号不平衡、环境不闭合等结构性错误
    pub structural_errors: Vec<String>,
    pub citation_count: usize,
    pub section_count: usize,
    pub word_count: usize,
}

impl QualityReport {
    pub fn has_structural_errors(&self) -> bool {
        !self.structural_errors.is_empty()
    }
}
