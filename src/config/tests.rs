#[cfg(test)]
mod tests {
    use crate::config::{Config, LLMConfig, LLMProvider, ResearchConfig, WritingConfig};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.search.backend, "pubmed");
        assert_eq!(config.search.min_interval_ms, 350);
        assert_eq!(config.search.max_concurrent_requests, 2);
        assert_eq!(config.search.retry_attempts, 3);
        assert_eq!(config.research.max_parallels, 2);
        assert!(config.writing.enable_refinement);
        assert!(!config.verbose);
    }

    #[test]
    fn test_research_config_default_corpus() {
        let research = ResearchConfig::default();
        assert_eq!(
            research.corpus_sections,
            vec!["5.3.1", "5.3.2", "5.3.3", "5.3.4", "5.3.5", "5.3.6", "5.3.7"]
        );
        assert_eq!(research.outline_dir, PathBuf::from("Module5Regulation"));
        assert_eq!(research.results_dir, PathBuf::from("module5Results"));
    }

    #[test]
    fn test_writing_config_default_thresholds() {
        let writing = WritingConfig::default();
        assert_eq!(writing.max_revisions, 2);
        assert_eq!(writing.refine_below_score, 70.0);
        assert_eq!(writing.pass_score, 60.0);
        assert_eq!(writing.related_section_budget, 3000);
        assert_eq!(writing.context_ceiling, 15000);
        assert_eq!(writing.required_markers, vec!["\\section", "\\label"]);
    }

    #[test]
    fn test_llm_provider_default() {
        assert_eq!(LLMProvider::default(), LLMProvider::OpenAI);
    }

    #[test]
    fn test_llm_provider_from_str() {
        assert_eq!("openai".parse::<LLMProvider>().unwrap(), LLMProvider::OpenAI);
        assert_eq!(
            "Anthropic".parse::<LLMProvider>().unwrap(),
            LLMProvider::Anthropic
        );
        assert_eq!(
            "deepseek".parse::<LLMProvider>().unwrap(),
            LLMProvider::DeepSeek
        );
        assert_eq!("ollama".parse::<LLMProvider>().unwrap(), LLMProvider::Ollama);
        assert!("invalid".parse::<LLMProvider>().is_err());
    }

    #[test]
    fn test_llm_provider_display() {
        assert_eq!(LLMProvider::OpenAI.to_string(), "openai");
        assert_eq!(LLMProvider::Anthropic.to_string(), "anthropic");
        assert_eq!(LLMProvider::DeepSeek.to_string(), "deepseek");
        assert_eq!(LLMProvider::Ollama.to_string(), "ollama");
    }

    #[test]
    fn test_model_selector_with_provider_prefix() {
        let mut llm = LLMConfig::default();
        llm.apply_model_selector("anthropic:claude-sonnet-4-5-20250929")
            .unwrap();
        assert_eq!(llm.provider, LLMProvider::Anthropic);
        assert_eq!(llm.model, "claude-sonnet-4-5-20250929");
        assert_eq!(llm.selector(), "anthropic:claude-sonnet-4-5-20250929");
    }

    #[test]
    fn test_model_selector_infers_provider() {
        let mut llm = LLMConfig::default();
        llm.provider = LLMProvider::Ollama;

        llm.apply_model_selector("gpt-4o-mini").unwrap();
        assert_eq!(llm.provider, LLMProvider::OpenAI);

        llm.apply_model_selector("claude-3-5-haiku").unwrap();
        assert_eq!(llm.provider, LLMProvider::Anthropic);

        // 无法推断时保留当前 provider
        llm.apply_model_selector("llama3.1").unwrap();
        assert_eq!(llm.provider, LLMProvider::Anthropic);
        assert_eq!(llm.model, "llama3.1");
    }

    #[test]
    fn test_model_selector_rejects_empty() {
        let mut llm = LLMConfig::default();
        assert!(llm.apply_model_selector("  ").is_err());
        assert!(llm.apply_model_selector("openai:").is_err());
    }

    #[test]
    fn test_config_from_file_partial() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("regwriter.toml");
        fs::write(
            &path,
            r#"
verbose = true

[llm]
provider = "deepseek"
model = "deepseek-chat"

[research]
max_parallels = 4
corpus_sections = ["5.3.1", "5.3.5"]

[writing]
enable_refinement = false
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert!(config.verbose);
        assert_eq!(config.llm.provider, LLMProvider::DeepSeek);
        assert_eq!(config.llm.model, "deepseek-chat");
        assert_eq!(config.llm.retry_attempts, 5);
        assert_eq!(config.research.max_parallels, 4);
        assert_eq!(config.research.corpus_sections, vec!["5.3.1", "5.3.5"]);
        assert!(!config.writing.enable_refinement);
        assert_eq!(config.search.min_interval_ms, 350);
    }

    #[test]
    fn test_config_from_missing_file() {
        let result = Config::from_file(&PathBuf::from("/nonexistent/regwriter.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_config_from_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.toml");
        fs::write(&path, "[llm\nprovider = ").unwrap();
        assert!(Config::from_file(&path).is_err());
    }
}
