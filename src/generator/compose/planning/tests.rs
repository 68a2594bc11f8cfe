#[cfg(test)]
mod tests {
    use crate::config::WritingConfig;
    use crate::generator::compose::dependency::SectionDependencyGraph;
    use crate::generator::compose::planning::*;
    use crate::generator::outlet::LatexOutlet;
    use crate::generator::research::ReconciledSection;
    use crate::types::Paper;
    use indexmap::IndexMap;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _temp_dir: TempDir,
        config: WritingConfig,
        outlet: LatexOutlet,
    }

    fn fixture() -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let guidance_dir = temp_dir.path().join("section2.5");
        let output_dir = temp_dir.path().join("section2.5_tex");
        fs::create_dir_all(&guidance_dir).unwrap();
        for (sid, title) in [
            ("2.5.3", "Overview of Clinical Pharmacology"),
            ("2.5.4", "Overview of Efficacy"),
            ("2.5.5", "Overview of Safety"),
        ] {
            fs::write(
                guidance_dir.join(format!("{}.txt", sid)),
                format!("{} {}\nDescribe the relevant findings.", sid, title),
            )
            .unwrap();
        }

        let config = WritingConfig {
            guidance_dir,
            output_dir: output_dir.clone(),
            ..Default::default()
        };
        Fixture {
            _temp_dir: temp_dir,
            config,
            outlet: LatexOutlet::new(output_dir),
        }
    }

    fn corpus() -> IndexMap<String, ReconciledSection> {
        let mut corpus = IndexMap::new();
        corpus.insert(
            "5.3.5.3".to_string(),
            ReconciledSection {
                title: "Reports of Analyses of Data from More than One Study".to_string(),
                description: String::new(),
                papers: vec![Paper::new("Pooled safety analysis", "https://pubmed.ncbi.nlm.nih.gov/7")],
            },
        );
        corpus
    }

    fn long_fragment(label: &str) -> String {
        let mut content = format!("\\section{{{}}}\n", label);
        for i in 0..40 {
            content.push_str(&format!("Finding number {} is described in detail here.\n", i));
        }
        content
    }

    #[test]
    fn test_context_budget() {
        let budget = ContextBudget::from_config(&WritingConfig::default());
        assert_eq!(budget.per_section_for(2), 3000);
        assert_eq!(budget.per_section_for(3), 1500);
        assert_eq!(budget.ceiling, 15000);
    }

    #[test]
    fn test_plan_collects_guidance_papers_and_related_sections() {
        let fixture = fixture();
        fixture
            .outlet
            .save_fragment("2.5.3", "\\section{2.5.3 Overview of Clinical Pharmacology}\nBody.")
            .unwrap();

        let graph = SectionDependencyGraph::standard();
        let planner = SectionPlanner::new(&fixture.config, &graph, fixture.outlet.output_dir());
        let plan = planner.plan("2.5.5", &corpus()).unwrap();

        assert!(plan.guidance.starts_with("2.5.5 Overview of Safety"));
        assert_eq!(plan.relevant_papers.len(), 1);
        assert_eq!(plan.related.len(), 2);
        assert_eq!(plan.related[0].id, "2.5.3");
        assert_eq!(plan.related[0].title, "Overview of Clinical Pharmacology");
        assert_eq!(
            plan.related[0].written.as_deref(),
            Some("\\section{2.5.3 Overview of Clinical Pharmacology}\nBody.")
        );
        // 2.5.4 尚未撰写
        assert_eq!(plan.related[1].written, None);
        assert_eq!(plan.related.iter().filter(|r| r.written.is_some()).count(), 1);
        assert!(plan.context_estimate > plan.guidance.len());
    }

    #[test]
    fn test_plan_compresses_when_ceiling_exceeded() {
        let mut fixture = fixture();
        fixture.config.context_ceiling = 10;
        fixture.config.compressed_section_budget = 200;
        fixture.outlet.save_fragment("2.5.3", &long_fragment("2.5.3")).unwrap();
        fixture.outlet.save_fragment("2.5.4", &long_fragment("2.5.4")).unwrap();

        let graph = SectionDependencyGraph::standard();
        let planner = SectionPlanner::new(&fixture.config, &graph, fixture.outlet.output_dir());
        let plan = planner.plan("2.5.5", &IndexMap::new()).unwrap();

        let first = plan.related[0].written.as_ref().unwrap();
        let second = plan.related[1].written.as_ref().unwrap();
        // 第一个相关章节按单章节预算加载，第二个超过上限后被压缩
        assert_eq!(first.trim_end(), long_fragment("2.5.3").trim_end());
        assert!(second.len() < first.len());
        assert!(second.starts_with("\\section{2.5.4}"));
        assert!(second.contains("remaining content truncated"));
    }

    #[test]
    fn test_plan_fails_without_guidance() {
        let fixture = fixture();
        let graph = SectionDependencyGraph::standard();
        let planner = SectionPlanner::new(&fixture.config, &graph, fixture.outlet.output_dir());
        assert!(planner.plan("2.5.2", &corpus()).is_err());
    }
}
