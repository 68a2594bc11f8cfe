//! 文献检索后端

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::SearchConfig;
use crate::types::Paper;

pub mod pubmed;
pub mod rate_limiter;

pub use pubmed::{PubMedSearcher, SearchError};
pub use rate_limiter::RateLimiter;

/// 文献检索能力：按查询返回至多 `limit` 条记录
#[async_trait]
pub trait LiteratureSearch: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Paper>>;
}

/// 支持的检索后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SearchBackend {
    #[serde(rename = "pubmed")]
    #[default]
    PubMed,
}

impl Display for SearchBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchBackend::PubMed => write!(f, "pubmed"),
        }
    }
}

impl FromStr for SearchBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pubmed" | "ncbi" => Ok(SearchBackend::PubMed),
            _ => Err(format!("Unknown search backend: {}", s)),
        }
    }
}

/// 按名称创建检索后端；未知名称回退到 PubMed
pub fn create_searcher(
    backend: &str,
    config: &SearchConfig,
    limiter: Arc<RateLimiter>,
) -> Result<Arc<dyn LiteratureSearch>> {
    let backend = backend.parse::<SearchBackend>().unwrap_or_else(|e| {
        tracing::warn!("⚠️ {}，使用默认后端 pubmed", e);
        SearchBackend::default()
    });

    match backend {
        SearchBackend::PubMed => Ok(Arc::new(PubMedSearcher::new(config, limiter)?)),
    }
}
