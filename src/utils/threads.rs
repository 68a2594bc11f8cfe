//! 有界并发执行器

use anyhow::{Result, anyhow};
use futures::future::join_all;
use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::utils::retry::{RetryPolicy, retry_with_backoff};

/// 以信号量限制并发的任务执行器。
///
/// 每个任务按 `stagger × (序号 mod 并发数)` 加随机抖动错开启动；
/// 配置了重试策略时，限流失败会按退避策略重试。
/// 无论成功与否，每个任务都恰好产生一个结果，结果顺序与提交顺序一致。
#[derive(Debug, Clone)]
pub struct BoundedConcurrencyExecutor {
    max_concurrency: usize,
    stagger: Duration,
    jitter: Duration,
    retry: Option<RetryPolicy>,
}

impl BoundedConcurrencyExecutor {
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
            stagger: Duration::ZERO,
            jitter: Duration::ZERO,
            retry: None,
        }
    }

    pub fn with_stagger(mut self, stagger: Duration, jitter: Duration) -> Self {
        self.stagger = stagger;
        self.jitter = jitter;
        self
    }

    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    fn start_delay(&self, index: usize) -> Duration {
        let slot = (index % self.max_concurrency) as u32;
        let base = self.stagger.saturating_mul(slot);
        if self.jitter.is_zero() {
            return base;
        }
        let jitter_ms = rand::rng().random_range(0..=self.jitter.as_millis() as u64);
        base + Duration::from_millis(jitter_ms)
    }

    pub async fn run<T, F, Fut>(&self, tasks: Vec<F>) -> Vec<Result<T>>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let total = tasks.len();
        if total == 0 {
            return Vec::new();
        }

        tracing::info!(
            "🚀 启动并发执行：{}个任务，最大并发数：{}",
            total,
            self.max_concurrency
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));

        let runs = tasks.into_iter().enumerate().map(|(index, task)| {
            let semaphore = semaphore.clone();
            async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|e| anyhow!("任务 #{} 无法获取并发许可: {}", index, e))?;

                let delay = self.start_delay(index);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }

                let label = format!("task #{}", index);
                let outcome = match &self.retry {
                    Some(policy) => retry_with_backoff(policy, &label, || task()).await,
                    None => task().await,
                };

                if let Err(e) = &outcome {
                    tracing::warn!("⚠️ {} 执行失败: {}", label, e);
                }
                outcome
            }
        });

        let outcomes = join_all(runs).await;

        let failed = outcomes.iter().filter(|o| o.is_err()).count();
        tracing::info!("✅ 并发执行完成：成功 {}，失败 {}", total - failed, failed);

        outcomes
    }
}
