//! PubMed / NCBI E-utilities 检索后端

use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::SearchConfig;
use crate::search::LiteratureSearch;
use crate::search::rate_limiter::RateLimiter;
use crate::types::Paper;
use crate::utils::retry::{RateLimitError, RetryPolicy, classify, retry_with_backoff_when};

const MAX_AUTHORS: usize = 3;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("PubMed returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("PubMed rate limit hit")]
    RateLimited(#[from] RateLimitError),

    #[error("invalid XML response: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default, Deserialize)]
struct ESearchResponse {
    #[serde(default)]
    esearchresult: ESearchResult,
}

#[derive(Debug, Default, Deserialize)]
struct ESearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

pub struct PubMedSearcher {
    client: reqwest::Client,
    base_url: String,
    email: String,
    max_limit: usize,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
}

impl PubMedSearcher {
    pub fn new(config: &SearchConfig, limiter: Arc<RateLimiter>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to build PubMed HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            email: config.email.clone(),
            max_limit: config.max_match_limit,
            limiter,
            retry: RetryPolicy::new(
                config.retry_attempts,
                Duration::from_millis(config.retry_delay_ms),
            ),
        })
    }

    async fn get_once(&self, url: &str, params: &[(&str, String)]) -> Result<String> {
        let _slot = self.limiter.acquire().await?;

        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(SearchError::from)?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SearchError::from(RateLimitError::new("HTTP 429 from PubMed", None)).into());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        Ok(response.text().await.map_err(SearchError::from)?)
    }

    /// 429 与网络/HTTP错误均按 1s、2s、4s 退避重试
    async fn get_with_retry(&self, endpoint: &str, params: &[(&str, String)]) -> Result<String> {
        let url = format!("{}/{}", self.base_url, endpoint);
        retry_with_backoff_when(&self.retry, endpoint, is_transient, || {
            self.get_once(&url, params)
        })
        .await
    }

    async fn search_ids(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        let params = [
            ("db", "pubmed".to_string()),
            ("term", query.to_string()),
            ("retmax", limit.min(self.max_limit).to_string()),
            ("retmode", "json".to_string()),
            ("email", self.email.clone()),
            ("sort", "relevance".to_string()),
        ];

        let body = self.get_with_retry("esearch.fcgi", &params).await?;
        let parsed: ESearchResponse = serde_json::from_str(&body).map_err(SearchError::from)?;
        Ok(parsed.esearchresult.idlist)
    }

    async fn fetch_details(&self, pmids: &[String]) -> Result<Vec<Paper>> {
        let params = [
            ("db", "pubmed".to_string()),
            ("id", pmids.join(",")),
            ("retmode", "xml".to_string()),
            ("email", self.email.clone()),
        ];

        let body = self.get_with_retry("efetch.fcgi", &params).await?;
        Ok(parse_efetch(&body)?)
    }
}

fn is_transient(err: &anyhow::Error) -> Option<Option<Duration>> {
    match err.downcast_ref::<SearchError>() {
        Some(SearchError::Http(_) | SearchError::Status { .. } | SearchError::RateLimited(_)) => {
            Some(None)
        }
        _ => classify(err).retry_hint(),
    }
}

#[async_trait]
impl LiteratureSearch for PubMedSearcher {
    fn name(&self) -> &str {
        "pubmed"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Paper>> {
        tracing::info!("🔎 [PubMed] 检索: {}", query);

        let pmids = self
            .search_ids(query, limit)
            .await
            .with_context(|| format!("PubMed esearch failed for query '{}'", query))?;

        if pmids.is_empty() {
            tracing::info!("[PubMed] 未找到相关文献");
            return Ok(Vec::new());
        }

        tracing::info!("[PubMed] 找到 {} 篇文献，获取详情...", pmids.len());

        let papers = self
            .fetch_details(&pmids)
            .await
            .with_context(|| format!("PubMed efetch failed for {} ids", pmids.len()))?;

        tracing::info!("✅ [PubMed] 成功获取 {} 篇文献", papers.len());
        Ok(papers)
    }
}

#[derive(Default)]
struct ArticleDraft {
    title: String,
    abstract_parts: Vec<String>,
    pmid: Option<String>,
    authors: Vec<String>,
    author_elements: usize,
    journal: Option<String>,
    year: Option<String>,
}

impl ArticleDraft {
    fn into_paper(self) -> Paper {
        let pmid = self.pmid.filter(|p| !p.is_empty());
        let url = pmid
            .as_ref()
            .map(|p| format!("https://pubmed.ncbi.nlm.nih.gov/{}", p))
            .unwrap_or_default();
        let title = normalize(&self.title);

        let mut paper = Paper::new(if title.is_empty() { "Untitled".to_string() } else { title }, url);
        paper.pmid = pmid;
        paper.authors = self.authors;
        paper.journal = self.journal.filter(|j| !j.is_empty());
        paper.year = self.year.filter(|y| !y.is_empty());
        let abstract_text = self.abstract_parts.join(" ");
        paper.abstract_text = (!abstract_text.is_empty()).then_some(abstract_text);
        paper
    }
}

#[derive(Default)]
struct AuthorDraft {
    last_name: Option<String>,
    fore_name: Option<String>,
}

impl AuthorDraft {
    fn display_name(self) -> Option<String> {
        match (self.fore_name, self.last_name) {
            (Some(fore), Some(last)) => Some(format!("{} {}", fore, last)),
            (None, Some(last)) => Some(last),
            _ => None,
        }
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn local_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.local_name().as_ref()).into_owned()
}

/// 解析 efetch 返回的 PubmedArticleSet XML
pub fn parse_efetch(xml: &str) -> Result<Vec<Paper>, SearchError> {
    let mut reader = Reader::from_str(xml);

    let mut papers = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut article: Option<ArticleDraft> = None;
    let mut author: Option<AuthorDraft> = None;
    let mut abstract_part: Option<(Option<String>, String)> = None;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let name = local_name(&start);
                match name.as_str() {
                    "PubmedArticle" => article = Some(ArticleDraft::default()),
                    "Author" => {
                        if let Some(draft) = article.as_mut() {
                            draft.author_elements += 1;
                            if draft.author_elements <= MAX_AUTHORS {
                                author = Some(AuthorDraft::default());
                            }
                        }
                    }
                    "AbstractText" => {
                        let label = start
                            .try_get_attribute("Label")
                            .ok()
                            .flatten()
                            .and_then(|attr| attr.unescape_value().ok())
                            .map(|v| v.into_owned())
                            .filter(|v| !v.is_empty());
                        abstract_part = Some((label, String::new()));
                    }
                    _ => {}
                }
                if abstract_part.is_none() && !path.iter().any(|p| p == "ArticleTitle") {
                    text.clear();
                }
                path.push(name);
            }
            Event::Text(content) => {
                let content = content.unescape()?;
                if let Some((_, part)) = abstract_part.as_mut() {
                    part.push_str(&content);
                } else {
                    text.push_str(&content);
                }
            }
            Event::End(_) => {
                let Some(name) = path.pop() else {
                    continue;
                };
                let parent = path.last().map(String::as_str);
                let value = normalize(&text);

                if name == "PubmedArticle" {
                    if let Some(done) = article.take() {
                        papers.push(done.into_paper());
                    }
                } else if let Some(draft) = article.as_mut() {
                    match (name.as_str(), parent) {
                        ("ArticleTitle", _) if draft.title.is_empty() => draft.title = value,
                        ("PMID", _) if draft.pmid.is_none() => draft.pmid = Some(value),
                        ("LastName", Some("Author")) => {
                            if let Some(a) = author.as_mut() {
                                a.last_name = Some(value);
                            }
                        }
                        ("ForeName", Some("Author")) => {
                            if let Some(a) = author.as_mut() {
                                a.fore_name = Some(value);
                            }
                        }
                        ("Author", _) => {
                            if let Some(name) = author.take().and_then(AuthorDraft::display_name) {
                                draft.authors.push(name);
                            }
                        }
                        ("AbstractText", _) => {
                            if let Some((label, part)) = abstract_part.take() {
                                let part = normalize(&part);
                                if !part.is_empty() {
                                    draft.abstract_parts.push(match label {
                                        Some(label) => format!("{}: {}", label, part),
                                        None => part,
                                    });
                                }
                            }
                        }
                        ("Title", Some("Journal")) if draft.journal.is_none() => {
                            draft.journal = Some(value)
                        }
                        ("Year", Some("PubDate")) if draft.year.is_none() => draft.year = Some(value),
                        _ => {}
                    }
                }

                if abstract_part.is_none() && !path.iter().any(|p| p == "ArticleTitle") {
                    text.clear();
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(papers)
}
