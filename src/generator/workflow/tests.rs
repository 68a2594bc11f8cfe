#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::generator::context::GeneratorContext;
    use crate::generator::workflow::{Job, TimingKeys, TimingScope, WriteMode, run};
    use crate::llm::client::{GenerationRequest, TextGenerator};
    use crate::search::LiteratureSearch;
    use crate::types::{Paper, Transcript};
    use anyhow::{Result, bail};
    use async_trait::async_trait;
    use std::fs;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    struct SilentGenerator;

    #[async_trait]
    impl TextGenerator for SilentGenerator {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
            bail!("generation is not expected here")
        }

        async fn research(
            &self,
            _request: &GenerationRequest,
            _searcher: Arc<dyn LiteratureSearch>,
        ) -> Result<Transcript> {
            Ok(Transcript::default())
        }
    }

    #[derive(Default)]
    struct CountingSearch {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LiteratureSearch for CountingSearch {
        fn name(&self) -> &str {
            "stub"
        }

        async fn search(&self, query: &str, limit: usize) -> Result<Vec<Paper>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((0..limit.min(2))
                .map(|i| Paper {
                    title: format!("{} study {}", query, i),
                    url: format!("https://pubmed.ncbi.nlm.nih.gov/{}", 100 + i),
                    ..Default::default()
                })
                .collect())
        }
    }

    fn create_test_context(temp_dir: &TempDir, searcher: Arc<CountingSearch>) -> GeneratorContext {
        let mut config = Config::default();
        config.research.outline_dir = temp_dir.path().join("outlines");
        config.research.results_dir = temp_dir.path().join("results");
        config.research.context_dir = temp_dir.path().to_path_buf();
        config.writing.guidance_dir = temp_dir.path().join("section2.5");
        config.writing.output_dir = temp_dir.path().join("tex");
        config.writing.inter_section_delay_ms = 0;

        GeneratorContext::with_services(config, Arc::new(SilentGenerator), searcher)
    }

    fn write_papers_json(temp_dir: &TempDir) -> std::path::PathBuf {
        let path = temp_dir.path().join("papers.json");
        fs::write(
            &path,
            r#"{"drug_name": "Aspirin 81mg", "regulation_section": "5.3.1", "sections": {}}"#,
        )
        .unwrap();
        path
    }

    #[test]
    fn test_timing_scope_records_phases_in_order() {
        let mut timing = TimingScope::new();
        timing.start_phase(TimingKeys::WRITING);
        timing.start_phase(TimingKeys::ASSEMBLY);
        assert!(timing.end_phase(TimingKeys::ASSEMBLY).is_some());
        assert!(timing.end_phase(TimingKeys::WRITING).is_some());
        assert!(timing.end_phase(TimingKeys::SEARCH).is_none());

        let phases: Vec<&str> = timing
            .phase_durations()
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(phases, vec!["assembly", "writing"]);

        let report = timing.generate_timing_report();
        assert!(report.contains("- assembly:"));
        assert!(timing.total_duration() >= Duration::ZERO);
    }

    #[tokio::test]
    async fn test_search_job_uses_default_limit() {
        let temp_dir = TempDir::new().unwrap();
        let searcher = Arc::new(CountingSearch::default());
        let context = create_test_context(&temp_dir, searcher.clone());

        let job = Job::Search {
            query: "aspirin pharmacokinetics".to_string(),
            limit: None,
        };
        assert!(run(&context, job).await.unwrap());
        assert_eq!(searcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_research_all_without_outlines_reports_failure() {
        let temp_dir = TempDir::new().unwrap();
        let searcher = Arc::new(CountingSearch::default());
        let context = create_test_context(&temp_dir, searcher.clone());

        let job = Job::ResearchAll {
            subject: "Aspirin".to_string(),
        };
        let success = run(&context, job).await.unwrap();
        assert!(!success);
        assert_eq!(searcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_research_missing_outline_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let context = create_test_context(&temp_dir, Arc::new(CountingSearch::default()));

        let job = Job::Research {
            outline: temp_dir.path().join("missing.txt"),
            subject: "Aspirin".to_string(),
        };
        assert!(run(&context, job).await.is_err());
    }

    #[tokio::test]
    async fn test_write_missing_papers_json_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let context = create_test_context(&temp_dir, Arc::new(CountingSearch::default()));

        let job = Job::Write {
            papers: temp_dir.path().join("missing.json"),
            mode: WriteMode::All,
            generate_main: true,
        };
        let err = run(&context, job).await.unwrap_err();
        assert!(err.to_string().contains("Papers JSON file not found"));
    }

    #[tokio::test]
    async fn test_assemble_only_writes_main_document() {
        let temp_dir = TempDir::new().unwrap();
        let context = create_test_context(&temp_dir, Arc::new(CountingSearch::default()));
        let papers = write_papers_json(&temp_dir);

        let tex_dir = temp_dir.path().join("tex");
        fs::create_dir_all(&tex_dir).unwrap();
        fs::write(tex_dir.join("2_5_1.tex"), "\\section{Product Development Rationale}").unwrap();

        let job = Job::Write {
            papers,
            mode: WriteMode::AssembleOnly,
            generate_main: true,
        };
        assert!(run(&context, job).await.unwrap());

        let main = fs::read_to_string(tex_dir.join("main.tex")).unwrap();
        assert!(main.contains("Aspirin 81mg"));
        assert!(main.contains("\\input{2_5_1}"));
        assert!(!main.contains("\\input{2_5_2}"));
    }

    #[tokio::test]
    async fn test_single_write_rejects_invalid_section_id() {
        let temp_dir = TempDir::new().unwrap();
        let context = create_test_context(&temp_dir, Arc::new(CountingSearch::default()));
        let papers = write_papers_json(&temp_dir);

        let job = Job::Write {
            papers,
            mode: WriteMode::Single("3.1".to_string()),
            generate_main: false,
        };
        assert!(run(&context, job).await.is_err());
    }

    #[tokio::test]
    async fn test_batch_write_failures_make_run_unsuccessful() {
        let temp_dir = TempDir::new().unwrap();
        let context = create_test_context(&temp_dir, Arc::new(CountingSearch::default()));
        let papers = write_papers_json(&temp_dir);

        // 没有撰写指引，每个章节都会失败
        let job = Job::Write {
            papers,
            mode: WriteMode::Batch(vec!["2.5.2".to_string(), "2.5.1".to_string()]),
            generate_main: false,
        };
        assert!(!run(&context, job).await.unwrap());
        assert!(!temp_dir.path().join("tex").join("main.tex").exists());
    }
}
