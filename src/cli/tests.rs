#[cfg(test)]
mod tests {
    use crate::cli::{Args, Command};
    use crate::config::LLMProvider;
    use crate::generator::workflow::{Job, WriteMode};
    use clap::Parser;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_research_command() {
        let args = Args::try_parse_from([
            "regwriter",
            "research",
            "Module5Regulation/5.3.1.txt",
            "Aspirin",
            "anthropic:claude-sonnet-4-5-20250929",
            "--results-dir",
            "/tmp/results",
        ])
        .unwrap();

        let config = args.into_config().unwrap();
        assert_eq!(config.llm.provider, LLMProvider::Anthropic);
        assert_eq!(config.llm.model, "claude-sonnet-4-5-20250929");
        assert_eq!(config.research.results_dir, PathBuf::from("/tmp/results"));

        assert_eq!(
            args.into_job().unwrap(),
            Job::Research {
                outline: PathBuf::from("Module5Regulation/5.3.1.txt"),
                subject: "Aspirin".to_string(),
            }
        );
    }

    #[test]
    fn test_research_all_command() {
        let args = Args::try_parse_from([
            "regwriter",
            "research-all",
            "Aspirin",
            "--outline-dir",
            "outlines",
        ])
        .unwrap();

        let config = args.into_config().unwrap();
        assert_eq!(config.research.outline_dir, PathBuf::from("outlines"));
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(
            args.into_job().unwrap(),
            Job::ResearchAll {
                subject: "Aspirin".to_string()
            }
        );
    }

    #[test]
    fn test_write_single_section() {
        let args = Args::try_parse_from([
            "regwriter",
            "write",
            "papers.json",
            "2.5.4",
            "-t",
            "0.5",
            "--no-refinement",
            "-o",
            "out_tex",
        ])
        .unwrap();

        let config = args.into_config().unwrap();
        assert_eq!(config.writing.temperature, 0.5);
        assert!(!config.writing.enable_refinement);
        assert_eq!(config.writing.output_dir, PathBuf::from("out_tex"));

        assert_eq!(
            args.into_job().unwrap(),
            Job::Write {
                papers: PathBuf::from("papers.json"),
                mode: WriteMode::Single("2.5.4".to_string()),
                generate_main: true,
            }
        );
    }

    #[test]
    fn test_write_batch_list() {
        let args = Args::try_parse_from([
            "regwriter",
            "write",
            "papers.json",
            "-b",
            "2.5.4, 2.5.1,2.5.2",
            "--no-main",
        ])
        .unwrap();

        match args.into_job().unwrap() {
            Job::Write {
                mode, generate_main, ..
            } => {
                assert_eq!(
                    mode,
                    WriteMode::Batch(vec![
                        "2.5.4".to_string(),
                        "2.5.1".to_string(),
                        "2.5.2".to_string()
                    ])
                );
                assert!(!generate_main);
            }
            other => panic!("unexpected job: {:?}", other),
        }
    }

    #[test]
    fn test_write_all_and_assemble_modes() {
        let args = Args::try_parse_from(["regwriter", "write", "papers.json", "--all"]).unwrap();
        assert!(matches!(
            args.into_job().unwrap(),
            Job::Write {
                mode: WriteMode::All,
                ..
            }
        ));

        let args = Args::try_parse_from(["regwriter", "write", "papers.json", "-g"]).unwrap();
        assert!(matches!(
            args.into_job().unwrap(),
            Job::Write {
                mode: WriteMode::AssembleOnly,
                ..
            }
        ));
    }

    #[test]
    fn test_write_requires_a_selection() {
        let args = Args::try_parse_from(["regwriter", "write", "papers.json"]).unwrap();
        assert!(args.into_job().is_err());

        // --all 与章节编号互斥
        assert!(
            Args::try_parse_from(["regwriter", "write", "papers.json", "2.5.1", "--all"]).is_err()
        );
    }

    #[test]
    fn test_search_command() {
        let args =
            Args::try_parse_from(["regwriter", "search", "aspirin bleeding", "--limit", "3"])
                .unwrap();
        assert!(matches!(args.command, Command::Search { .. }));
        assert_eq!(
            args.into_job().unwrap(),
            Job::Search {
                query: "aspirin bleeding".to_string(),
                limit: Some(3),
            }
        );
    }

    #[test]
    fn test_global_options_override_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("custom.toml");
        fs::write(
            &config_path,
            "[llm]\nprovider = \"deepseek\"\nmodel = \"deepseek-chat\"\napi_key = \"from-file\"\n",
        )
        .unwrap();

        let args = Args::try_parse_from([
            "regwriter",
            "search",
            "aspirin",
            "--config",
            config_path.to_str().unwrap(),
            "--llm-api-key",
            "from-cli",
            "--verbose",
        ])
        .unwrap();

        let config = args.into_config().unwrap();
        assert_eq!(config.llm.provider, LLMProvider::DeepSeek);
        assert_eq!(config.llm.model, "deepseek-chat");
        assert_eq!(config.llm.api_key, "from-cli");
        assert!(config.verbose);
    }

    #[test]
    fn test_unknown_provider_keeps_configured_one() {
        let args = Args::try_parse_from([
            "regwriter",
            "--llm-provider",
            "mistral",
            "search",
            "aspirin",
        ])
        .unwrap();
        let config = args.into_config().unwrap();
        assert_eq!(config.llm.provider, LLMProvider::OpenAI);
    }

    #[test]
    fn test_invalid_model_selector() {
        let args =
            Args::try_parse_from(["regwriter", "research-all", "Aspirin", "openai:"]).unwrap();
        assert!(args.into_config().is_err());
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let args = Args::try_parse_from([
            "regwriter",
            "-c",
            "/nonexistent/regwriter.toml",
            "search",
            "aspirin",
        ])
        .unwrap();
        assert!(args.into_config().is_err());
    }
}
