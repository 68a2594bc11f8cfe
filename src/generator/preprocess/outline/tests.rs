#[cfg(test)]
mod tests {
    use crate::generator::preprocess::outline::*;
    use std::path::Path;
    use tempfile::TempDir;

    const OUTLINE: &str = "Module 5 Clinical Study Reports
Preamble text that belongs to no section.

5.3.1 Reports of Biopharmaceutic Studies
  Studies of bioavailability and bioequivalence.

5.3.1.1 Bioavailability (BA) Study Reports
BA studies evaluate the rate and extent of release.
Include comparative BA studies.
5.3.1.2 Comparative BA and Bioequivalence (BE) Study Reports
5.3.2 Reports of Studies Pertinent to Pharmacokinetics Using Human Biomaterials
Plasma protein binding.
";

    #[test]
    fn test_parse_outline_sections_in_order() {
        let sections = parse_outline(OUTLINE);
        let ids: Vec<&str> = sections.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["5.3.1", "5.3.1.1", "5.3.1.2", "5.3.2"]);

        assert_eq!(sections["5.3.1"].title, "Reports of Biopharmaceutic Studies");
        assert_eq!(
            sections["5.3.1"].description,
            "Studies of bioavailability and bioequivalence."
        );
        assert_eq!(
            sections["5.3.1.1"].description,
            "BA studies evaluate the rate and extent of release.\nInclude comparative BA studies."
        );
        assert_eq!(sections["5.3.1.2"].description, "");
        assert_eq!(sections["5.3.2"].description, "Plasma protein binding.");
    }

    #[test]
    fn test_text_before_first_header_is_discarded() {
        let sections = parse_outline(OUTLINE);
        assert!(
            sections
                .values()
                .all(|s| !s.description.contains("Preamble"))
        );
    }

    #[test]
    fn test_two_level_headers_are_sections() {
        let sections = parse_outline("5.3 Clinical Study Reports\nOverview line\n");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections["5.3"].description, "Overview line");
    }

    #[test]
    fn test_non_matching_text_yields_empty_mapping() {
        assert!(parse_outline("").is_empty());
        assert!(parse_outline("No numbered headers here.\n5 is not a header\n").is_empty());
        // 编号后必须有标题
        assert!(parse_outline("5.3.1\n").is_empty());
    }

    #[test]
    fn test_header_count_matches_entry_count() {
        let text = (1..=6)
            .map(|i| format!("5.3.{} Title {}\nline a\nline b", i, i))
            .collect::<Vec<_>>()
            .join("\n");
        let sections = parse_outline(&text);
        assert_eq!(sections.len(), 6);
        assert!(sections.values().all(|s| s.description == "line a\nline b"));
    }

    #[tokio::test]
    async fn test_load_outline_reports_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("5.3.9.txt");
        let err = load_outline(&missing).await.unwrap_err();
        assert!(err.to_string().contains("Failed to read regulation outline"));
    }

    #[tokio::test]
    async fn test_load_outline_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("5.3.1.txt");
        std::fs::write(&path, OUTLINE).unwrap();
        let sections = load_outline(&path).await.unwrap();
        assert_eq!(sections.len(), 4);
    }

    #[test]
    fn test_outline_stem() {
        assert_eq!(outline_stem(Path::new("Module5Regulation/5.3.1.txt")), "5.3.1");
        assert_eq!(outline_stem(Path::new("outline")), "outline");
    }
}
