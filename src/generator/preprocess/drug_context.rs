//! 药物法规背景资料

use std::path::Path;

use crate::utils::text::extract_base_drug_name;

const CONTEXT_HEADER: &str = "=== Drug Regulations (TXT) ===";

fn candidate_files(subject: &str) -> Vec<String> {
    let base = extract_base_drug_name(subject);
    vec![
        format!("{}_regulations.txt", base),
        format!("{}Regulations.txt", base),
        format!("{}_regulations.txt", base.to_lowercase()),
        format!("{}_regulations.txt", subject),
        format!("{}Regulations.txt", subject),
        format!("{}_regulations.txt", subject.to_lowercase()),
    ]
}

/// 读取第一个存在的药物法规资料文件；都不存在时返回空串
pub async fn load_drug_context(subject: &str, dir: &Path) -> String {
    for name in candidate_files(subject) {
        let path = dir.join(&name);
        if !path.exists() {
            continue;
        }
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                tracing::info!("📄 加载药物法规资料: {}", path.display());
                return format!("{}\n{}", CONTEXT_HEADER, content);
            }
            Err(e) => {
                tracing::warn!("⚠️ 无法读取 {}: {}", path.display(), e);
                return String::new();
            }
        }
    }
    String::new()
}

#[cfg(test)]
mod tests;
