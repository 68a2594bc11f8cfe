#[cfg(test)]
mod tests {
    use crate::generator::preprocess::drug_context::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_prefers_base_name_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("Levofloxacin_regulations.txt"),
            "base name rules",
        )
        .unwrap();
        std::fs::write(
            temp_dir.path().join("Levofloxacin USP 250mg_regulations.txt"),
            "full name rules",
        )
        .unwrap();

        let context = load_drug_context("Levofloxacin USP 250mg", temp_dir.path()).await;
        assert_eq!(context, "=== Drug Regulations (TXT) ===\nbase name rules");
    }

    #[tokio::test]
    async fn test_falls_back_to_lowercase_name() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("amoxicillin_regulations.txt"),
            "lower",
        )
        .unwrap();

        let context = load_drug_context("Amoxicillin 500mg", temp_dir.path()).await;
        assert!(context.ends_with("lower"));
    }

    #[tokio::test]
    async fn test_missing_context_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        assert!(load_drug_context("Levofloxacin", temp_dir.path()).await.is_empty());
    }
}
