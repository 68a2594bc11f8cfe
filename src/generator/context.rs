use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::{
    config::Config,
    llm::client::{LLMClient, TextGenerator},
    search::{LiteratureSearch, RateLimiter, create_searcher},
};

#[derive(Clone)]
pub struct GeneratorContext {
    /// 文本生成服务
    pub generator: Arc<dyn TextGenerator>,
    /// 文献检索服务，所有检索共享同一个限速器
    pub searcher: Arc<dyn LiteratureSearch>,
    /// 配置
    pub config: Config,
}

impl GeneratorContext {
    /// 按配置创建真实的生成与检索服务
    pub fn new(config: Config) -> Result<Self> {
        let generator: Arc<dyn TextGenerator> = Arc::new(LLMClient::new(config.clone())?);

        let limiter = Arc::new(RateLimiter::new(
            Duration::from_millis(config.search.min_interval_ms),
            config.search.max_concurrent_requests,
        ));
        let searcher = create_searcher(&config.search.backend, &config.search, limiter)?;

        Ok(Self::with_services(config, generator, searcher))
    }

    /// 使用外部提供的服务实现（测试中注入桩实现）
    pub fn with_services(
        config: Config,
        generator: Arc<dyn TextGenerator>,
        searcher: Arc<dyn LiteratureSearch>,
    ) -> Self {
        Self {
            generator,
            searcher,
            config,
        }
    }
}
