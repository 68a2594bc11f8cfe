//! 文献检索工具

use rig::tool::Tool;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::search::LiteratureSearch;
use crate::types::Paper;

/// 供检索代理调用的文献检索工具
#[derive(Clone)]
pub struct AgentToolLiteratureSearch {
    searcher: Arc<dyn LiteratureSearch>,
    default_limit: usize,
    max_limit: usize,
}

/// 检索参数
#[derive(Debug, Deserialize, JsonSchema)]
pub struct LiteratureSearchArgs {
    /// PubMed 检索式，支持 AND/OR/NOT 与字段标签（如 [Title/Abstract]）
    pub query: String,
    /// 返回的最大文献数
    #[serde(default)]
    pub match_limit: Option<usize>,
}

/// 检索结果；检索失败时 `error` 非空且 `count` 为 0
#[derive(Debug, Serialize)]
pub struct LiteratureSearchResult {
    pub query: String,
    pub count: usize,
    pub papers: Vec<Paper>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Error)]
#[error("literature search tool error: {0}")]
pub struct LiteratureSearchToolError(String);

impl AgentToolLiteratureSearch {
    pub fn new(searcher: Arc<dyn LiteratureSearch>, default_limit: usize, max_limit: usize) -> Self {
        Self {
            searcher,
            default_limit: default_limit.max(1),
            max_limit: max_limit.max(1),
        }
    }

    pub async fn run(&self, args: &LiteratureSearchArgs) -> LiteratureSearchResult {
        let limit = args
            .match_limit
            .unwrap_or(self.default_limit)
            .clamp(1, self.max_limit);

        match self.searcher.search(&args.query, limit).await {
            Ok(papers) => LiteratureSearchResult {
                query: args.query.clone(),
                count: papers.len(),
                papers,
                error: None,
            },
            Err(e) => {
                tracing::warn!("⚠️ 文献检索失败 [{}]: {:#}", args.query, e);
                LiteratureSearchResult {
                    query: args.query.clone(),
                    count: 0,
                    papers: Vec::new(),
                    error: Some(format!("{:#}", e)),
                }
            }
        }
    }

    fn parameters() -> serde_json::Value {
        let mut schema = schemars::schema_for!(LiteratureSearchArgs).to_value();
        if let Some(object) = schema.as_object_mut() {
            object.remove("$schema");
            object.remove("title");
        }
        schema
    }
}

impl Tool for AgentToolLiteratureSearch {
    const NAME: &'static str = "search_research_papers";

    type Error = LiteratureSearchToolError;
    type Args = LiteratureSearchArgs;
    type Output = LiteratureSearchResult;

    async fn definition(&self, _prompt: String) -> rig::completion::ToolDefinition {
        rig::completion::ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Search PubMed for research papers. Returns a JSON object with the query, the number of papers found and the papers (title, url, pmid, abstract, authors, journal, year).".to_string(),
            parameters: Self::parameters(),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        tracing::debug!("   🔧 tool called...search_research_papers@{:?}", args);

        if args.query.trim().is_empty() {
            return Err(LiteratureSearchToolError("query must not be empty".to_string()));
        }

        Ok(self.run(&args).await)
    }
}
