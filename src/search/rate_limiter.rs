//! 进程级检索限速：最小请求间隔 + 在途请求上限

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Semaphore, SemaphorePermit};

/// 时钟抽象，测试中可替换为手动推进的时钟
#[async_trait]
pub trait Clock: Send + Sync {
    /// 自时钟起点以来的单调时间
    fn now(&self) -> Duration;
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// 所有检索客户端共享的限速器。
/// 间隔时间戳受互斥锁保护，等待期间持有锁，保证请求严格串行错开。
pub struct RateLimiter {
    min_interval: Duration,
    last_request: tokio::sync::Mutex<Option<Duration>>,
    in_flight: Semaphore,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration, max_concurrent: usize) -> Self {
        Self::with_clock(min_interval, max_concurrent, Arc::new(SystemClock::default()))
    }

    pub fn with_clock(min_interval: Duration, max_concurrent: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            min_interval,
            last_request: tokio::sync::Mutex::new(None),
            in_flight: Semaphore::new(max_concurrent.max(1)),
            clock,
        }
    }

    /// 占用一个在途请求名额并等待到允许发出请求的时刻。
    /// 返回的许可在请求结束前需一直持有。
    pub async fn acquire(&self) -> Result<SemaphorePermit<'_>> {
        let permit = self
            .in_flight
            .acquire()
            .await
            .map_err(|e| anyhow!("rate limiter closed: {}", e))?;
        self.wait_turn().await;
        Ok(permit)
    }

    async fn wait_turn(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(previous) = *last {
            let elapsed = self.clock.now().saturating_sub(previous);
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                tracing::debug!(wait_ms = wait.as_millis() as u64, "检索请求限速等待");
                self.clock.sleep(wait).await;
            }
        }

        *last = Some(self.clock.now());
    }
}
