#[cfg(test)]
mod tests {
    use crate::utils::structured::*;
    use serde_json::{Value, json};

    fn has_papers(value: &Value) -> bool {
        value.get("papers").is_some() || value.is_array()
    }

    #[test]
    fn test_whole_text_json() {
        let text = r#"{"papers": [{"title": "A", "url": "https://a"}]}"#;
        let found = StructuredExtractor::for_paper_lists()
            .extract(text, has_papers)
            .unwrap();
        assert_eq!(found.strategy, Strategy::WholeText);
        assert_eq!(found.value["papers"][0]["title"], "A");
    }

    #[test]
    fn test_fenced_block_with_prose() {
        let text = "Here are the results:\n```json\n[{\"title\": \"A\", \"url\": \"https://a\"}]\n```\nLet me know.";
        let found = StructuredExtractor::for_paper_lists()
            .extract(text, has_papers)
            .unwrap();
        assert_eq!(found.strategy, Strategy::FencedBlock);
        assert_eq!(found.value, json!([{"title": "A", "url": "https://a"}]));
    }

    #[test]
    fn test_titled_array_inside_prose() {
        let text = r#"I found: [{"title": "A", "url": "https://a"}, {"title": "B", "url": "https://b"}] which are relevant."#;
        let found = StructuredExtractor::for_paper_lists()
            .extract(text, has_papers)
            .unwrap();
        assert_eq!(found.strategy, Strategy::TitledObjectArray);
        assert_eq!(found.value.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_keyed_object_with_nested_braces() {
        let text = r#"Summary follows {"papers": [{"title": "A", "meta": {"k": "v}"}}]} trailing"#;
        let found = StructuredExtractor::for_paper_lists()
            .extract(text, |v| v.get("papers").is_some())
            .unwrap();
        assert_eq!(found.strategy, Strategy::KeyedObject("papers"));
        assert_eq!(found.value["papers"][0]["meta"]["k"], "v}");
    }

    #[test]
    fn test_flat_array_without_titles() {
        let text = r#"Results: [{"url": "https://a", "description": "x"}] end"#;
        let found = StructuredExtractor::for_paper_lists()
            .extract(text, has_papers)
            .unwrap();
        assert_eq!(found.strategy, Strategy::FlatObjectArray);
    }

    #[test]
    fn test_unparseable_text_yields_nothing() {
        let fixtures = [
            "",
            "No papers were found for this section.",
            "[{\"title\": \"A\", \"url\": ",
            "```json\n{broken\n```",
        ];
        for text in fixtures {
            assert!(
                StructuredExtractor::for_paper_lists()
                    .extract(text, has_papers)
                    .is_none(),
                "unexpected extraction from {:?}",
                text
            );
        }
    }

    #[test]
    fn test_keyed_object_extractor_skips_unrelated_objects() {
        let text = r#"Note {"other": 1}. Answer: {"removals": {"5.3.1": [0]}, "also_relevant": {}}"#;
        let found = StructuredExtractor::for_keyed_object("removals")
            .extract(text, |v| v.get("removals").is_some())
            .unwrap();
        assert_eq!(found.value["removals"]["5.3.1"], json!([0]));
    }

    #[test]
    fn test_long_unbalanced_prefix_still_finds_object() {
        let mut text = "[".repeat(20_000);
        text.push_str(r#" then {"papers": [{"title": "A", "url": "https://a"}]}"#);
        let found = StructuredExtractor::for_paper_lists()
            .extract(&text, |v| v.get("papers").is_some())
            .unwrap();
        assert_eq!(found.value["papers"][0]["title"], "A");
    }

    #[test]
    fn test_mismatched_closer_keeps_inner_object() {
        let text = r#"Broken [{"removals": {"5.3.1": [1]}} } tail"#;
        let found = StructuredExtractor::for_keyed_object("removals")
            .extract(text, |v| v.get("removals").is_some())
            .unwrap();
        assert_eq!(found.value["removals"]["5.3.1"], json!([1]));
    }

    #[test]
    fn test_first_fenced_block_and_strip_fences() {
        let text = "intro\n```latex\n\\section{A}\n```\nouter";
        assert_eq!(first_fenced_block(text).as_deref(), Some("\\section{A}"));
        assert_eq!(strip_fences("```latex\n\\section{A}\n```"), "\\section{A}");
    }
}
