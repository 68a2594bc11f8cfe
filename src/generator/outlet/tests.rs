#[cfg(test)]
mod tests {
    use crate::generator::outlet::*;
    use crate::types::{Paper, Section, SectionInfo};
    use std::fs;
    use tempfile::TempDir;

    fn section() -> Section {
        Section::new(
            "5.3.1.2",
            &SectionInfo {
                title: "Comparative BA and BE Study Reports".to_string(),
                description: String::new(),
            },
        )
    }

    #[test]
    fn test_artifact_paths() {
        let outlet = ResultsOutlet::new("module5Results");
        assert_eq!(
            outlet.section_results_path("Levofloxacin USP 250mg", "5.3.1", "5.3.1.2"),
            std::path::PathBuf::from(
                "module5Results/section_results/Levofloxacin_USP_250mg_5.3.1_5_3_1_2_papers.json"
            )
        );
        assert_eq!(
            outlet.reconciled_path("Levofloxacin USP 250mg", "5.3.1"),
            std::path::PathBuf::from("module5Results/Levofloxacin_USP_250mg_5.3.1_papers.json")
        );
        assert_eq!(
            outlet.combined_path("Levofloxacin"),
            std::path::PathBuf::from("module5Results/Levofloxacin_5.3_combined_papers.json")
        );
    }

    #[test]
    fn test_section_artifact_only_keeps_valid_papers() {
        let temp_dir = TempDir::new().unwrap();
        let outlet = ResultsOutlet::new(temp_dir.path());

        let papers = vec![
            Paper::new("Real study", "https://pubmed.ncbi.nlm.nih.gov/1"),
            Paper::new("...", "https://pubmed.ncbi.nlm.nih.gov/2"),
            Paper::new("No scheme", "pubmed/3"),
        ];
        let path = outlet
            .save_section_papers("Levofloxacin", "5.3.1", &section(), &papers)
            .unwrap();

        let artifact: SectionPapersArtifact = read_json(&path).unwrap();
        assert_eq!(artifact.paper_count, 1);
        assert_eq!(artifact.papers[0].title, "Real study");
        assert_eq!(artifact.section_id, "5.3.1.2");
        assert_eq!(artifact.regulation_section, "5.3.1");
        assert!(chrono::DateTime::parse_from_rfc3339(&artifact.saved_at).is_ok());
    }

    #[test]
    fn test_fragment_roundtrip_strips_header() {
        let temp_dir = TempDir::new().unwrap();
        let outlet = LatexOutlet::new(temp_dir.path().join("tex"));

        let path = outlet
            .save_fragment("2.5.6.1", "\\section{2.5.6.1 Therapeutic Context}\n\\label{sec:2_5_6_1}\n\nBody text.")
            .unwrap();
        assert!(path.ends_with("2_5_6_1.tex"));

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with("% Section 2.5.6.1\n% Generated: "));

        let loaded = load_written_section(outlet.output_dir(), "2.5.6.1", 3000).unwrap();
        assert_eq!(
            loaded,
            "\\section{2.5.6.1 Therapeutic Context}\n\\label{sec:2_5_6_1}\nBody text."
        );
    }

    #[test]
    fn test_section_comments_in_body_survive_loading() {
        let temp_dir = TempDir::new().unwrap();
        let outlet = LatexOutlet::new(temp_dir.path());

        outlet
            .save_fragment(
                "2.5.3",
                "\\section{2.5.3 Overview}\n% Section 2.5.3.1 follows the PK tables\nBody text.",
            )
            .unwrap();

        let loaded = load_written_section(outlet.output_dir(), "2.5.3", 3000).unwrap();
        assert!(loaded.starts_with("\\section{2.5.3 Overview}"));
        assert!(loaded.contains("% Section 2.5.3.1 follows the PK tables"));
        assert!(!loaded.contains("% Generated:"));
    }

    #[test]
    fn test_missing_fragment_loads_as_none() {
        let temp_dir = TempDir::new().unwrap();
        assert!(load_written_section(temp_dir.path(), "2.5.1", 3000).is_none());
    }

    #[test]
    fn test_main_document_includes_existing_fragments_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let outlet = LatexOutlet::new(temp_dir.path());
        outlet.save_fragment("2.5.3", "\\section{2.5.3 X}").unwrap();
        outlet.save_fragment("2.5.1", "\\section{2.5.1 Y}").unwrap();

        let order: Vec<String> = ["2.5.1", "2.5.2", "2.5.3"].iter().map(|s| s.to_string()).collect();
        let path = outlet.generate_main_document("Levofloxacin", &order).unwrap();
        let main = fs::read_to_string(path).unwrap();

        let first = main.find("\\input{2_5_1}").unwrap();
        let second = main.find("\\input{2_5_3}").unwrap();
        assert!(first < second);
        assert!(!main.contains("\\input{2_5_2}"));
        assert!(main.contains("% SECTION 2.5.1 - Product Development Rationale"));
        assert!(main.contains("\\fancyhead[R]{\\small Levofloxacin}"));
        assert!(main.contains("\\newcommand{\\modref}[1]"));
        assert!(main.contains("\\newcommand{\\secref}[1]"));
        assert!(!main.contains("@SUBJECT@"));
    }
}
