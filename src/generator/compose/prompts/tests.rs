#[cfg(test)]
mod tests {
    use crate::generator::compose::planning::{RelatedSection, SectionPlan};
    use crate::generator::compose::prompts::*;
    use crate::types::{Paper, QualityReport};
    use serde_json::json;

    fn paper(title: &str, pmid: u32) -> Paper {
        Paper::new(title, format!("https://pubmed.ncbi.nlm.nih.gov/{}", pmid))
    }

    #[test]
    fn test_phase_temperatures() {
        assert_eq!(WritingPhase::Refine.temperature(), Some(0.2));
        assert_eq!(WritingPhase::Full.temperature(), None);
        assert!(WritingPhase::Full.instructions().starts_with("CURRENT TASK: WRITE COMPLETE SECTION"));
    }

    #[test]
    fn test_infer_category() {
        let mut tagged = paper("Anything", 1);
        tagged.extra.insert("source_section".to_string(), json!("5.3.3.2"));
        assert_eq!(infer_category(&tagged), "5.3.3");

        let mut unknown_source = paper("Anything", 2);
        unknown_source.extra.insert("source_section".to_string(), json!("5.2"));
        assert_eq!(infer_category(&unknown_source), "5.3.5");

        assert_eq!(infer_category(&paper("Bioequivalence of two formulations", 3)), "5.3.1");
        assert_eq!(infer_category(&paper("Renal excretion in adults", 4)), "5.3.3");
        assert_eq!(infer_category(&paper("Receptor occupancy", 5)), "5.3.4");
        assert_eq!(infer_category(&paper("Post-marketing surveillance data", 6)), "5.3.6");
        assert_eq!(infer_category(&paper("Unrelated title", 7)), "5.3.5");

        let mut by_abstract = paper("Study 12", 8);
        by_abstract.abstract_text = Some("A Dissolution comparison.".to_string());
        assert_eq!(infer_category(&by_abstract), "5.3.1");
    }

    #[test]
    fn test_key_finding() {
        assert_eq!(key_finding("Levels rose. Then fell."), "Levels rose.");
        let long = "x".repeat(300);
        let finding = key_finding(&long);
        assert_eq!(finding.len(), 203);
        assert!(finding.ends_with("..."));
    }

    #[test]
    fn test_papers_context_groups_and_limits() {
        let mut pk = paper("Pharmacokinetic profile", 10);
        pk.authors = vec!["A One".into(), "B Two".into(), "C Three".into(), "D Four".into()];
        pk.journal = Some("Clin Pharmacokinet".into());
        pk.year = Some("2019".into());
        pk.abstract_text = Some("Exposure was dose proportional. More text.".into());

        let papers = vec![
            paper("Randomized efficacy trial", 11),
            pk,
            paper("Bioavailability study", 12),
        ];
        let context = format_papers_context(&papers, 2);

        assert!(context.starts_with("CLINICAL STUDY DATA FROM MODULE 5 (2 of 3 studies):"));
        // 5.3.3 组排在 5.3.5 组之前
        let pk_pos = context.find("--- Section 5.3.3: Human PK Studies ---").unwrap();
        let eff_pos = context.find("--- Section 5.3.5: Efficacy and Safety Studies ---").unwrap();
        assert!(pk_pos < eff_pos);
        assert!(context.contains("[1] Pharmacokinetic profile"));
        assert!(context.contains("[2] Randomized efficacy trial"));
        assert!(context.contains("Authors: A One, B Two, C Three et al."));
        assert!(context.contains("Published: Clin Pharmacokinet (2019)"));
        assert!(context.contains("Reference: \\modref{5.3.3}"));
        assert!(context.contains("Key Finding: Exposure was dose proportional."));
        assert!(!context.contains("Bioavailability study"));
        assert!(context.contains("[... 1 additional studies available in Module 5 ...]"));

        assert!(format_papers_context(&[], 15).is_empty());
    }

    #[test]
    fn test_related_sections_context() {
        let related = vec![
            RelatedSection {
                id: "2.5.3".into(),
                title: "Overview of Clinical Pharmacology".into(),
                written: Some((1..=12).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n")),
            },
            RelatedSection {
                id: "2.5.4".into(),
                title: "Overview of Efficacy".into(),
                written: None,
            },
        ];
        let context = format_related_sections(&related);

        assert!(context.contains("[2.5.3] Overview of Clinical Pharmacology"));
        assert!(context.contains("Cross-ref: \\secref{2.5.3}"));
        assert!(context.contains("      line 10\n"));
        assert!(!context.contains("line 11"));
        assert!(context.contains("[2.5.4] Overview of Efficacy"));
        assert!(context.contains("Status: Not yet written (use forward reference)"));
    }

    #[test]
    fn test_writer_system_prompt_sections() {
        let plan = SectionPlan {
            section_id: "2.5.6.1".into(),
            guidance: "2.5.6.1 Therapeutic Context\nDescribe the disease.".into(),
            relevant_papers: vec![paper("Randomized trial", 1)],
            related: vec![],
            context_estimate: 0,
        };
        let prompt = writer_system_prompt(&plan, WritingPhase::Full, 15);

        assert!(prompt.starts_with("You are an expert regulatory medical writer"));
        assert!(prompt.contains("REGULATORY WRITING STANDARDS"));
        assert!(prompt.contains("Describe the disease."));
        assert!(prompt.contains("CLINICAL STUDY DATA FROM MODULE 5 (1 of 1 studies)"));
        assert!(!prompt.contains("RELATED SECTIONS IN 2.5"));
        assert!(prompt.contains("CURRENT TASK: WRITE COMPLETE SECTION"));
        assert!(prompt.contains("\\label{sec:2_5_6_1}"));
        assert!(prompt.contains("\\section{2.5.6.1 Title}"));

        assert!(writer_user_prompt("2.5.6.1").contains("Section 2.5.6.1"));
    }

    #[test]
    fn test_refinement_prompt_lists_findings() {
        let report = QualityReport {
            issues: vec!["Content too short (10 chars, minimum 500)".into()],
            structural_errors: vec![],
            suggestions: vec![],
            ..Default::default()
        };
        let prompt = refinement_prompt("2.5.2", "\\section{2.5.2}", &report);

        assert!(prompt.contains("```latex\n\\section{2.5.2}\n```"));
        assert!(prompt.contains("- Content too short (10 chars, minimum 500)"));
        assert!(prompt.contains("- No LaTeX errors"));
        assert!(prompt.contains("- Polish and improve clarity"));
        let system = refinement_system_prompt("2.5.2");
        assert!(system.contains("Section 2.5.2"));
        assert!(system.contains("CURRENT TASK: REFINE AND IMPROVE DRAFT"));
    }
}
