//! 限流识别与指数退避重试

use anyhow::Result;
use regex::Regex;
use std::future::Future;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

static WAIT_HINT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+\.?\d*)\s*seconds?").unwrap());

const RATE_LIMIT_MARKERS: [&str; 5] = [
    "rate limit",
    "rate_limit",
    "ratelimit",
    "429",
    "too many requests",
];

/// 外部服务返回的限流错误，可被 [`classify`] 直接识别
#[derive(Debug, Clone, Error)]
#[error("rate limited: {message}")]
pub struct RateLimitError {
    pub retry_after: Option<Duration>,
    pub message: String,
}

impl RateLimitError {
    pub fn new(message: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self {
            retry_after,
            message: message.into(),
        }
    }
}

/// 错误分类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    RateLimited { retry_after: Option<Duration> },
    Fatal,
}

impl RetryClass {
    /// 可重试时返回等待提示（可能为空）
    pub fn retry_hint(&self) -> Option<Option<Duration>> {
        match self {
            RetryClass::RateLimited { retry_after } => Some(*retry_after),
            RetryClass::Fatal => None,
        }
    }
}

/// 沿错误链识别限流：类型化的限流错误、HTTP 429、或消息中的限流标记。
/// 消息中形如 "N seconds" 的等待提示会额外加 1 秒余量。
pub fn classify(error: &anyhow::Error) -> RetryClass {
    for cause in error.chain() {
        if let Some(limited) = cause.downcast_ref::<RateLimitError>() {
            let retry_after = limited
                .retry_after
                .or_else(|| parse_wait_hint(&limited.message));
            return RetryClass::RateLimited { retry_after };
        }

        if let Some(http) = cause.downcast_ref::<reqwest::Error>() {
            if http.status() == Some(reqwest::StatusCode::TOO_MANY_REQUESTS) {
                return RetryClass::RateLimited { retry_after: None };
            }
        }

        let message = cause.to_string();
        let lowered = message.to_lowercase();
        if RATE_LIMIT_MARKERS.iter().any(|m| lowered.contains(m)) {
            return RetryClass::RateLimited {
                retry_after: parse_wait_hint(&message),
            };
        }
    }

    RetryClass::Fatal
}

fn parse_wait_hint(message: &str) -> Option<Duration> {
    WAIT_HINT_RE
        .captures(message)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(|secs| Duration::from_secs_f64(secs + 1.0))
}

/// 重试策略：最多尝试 `max_attempts` 次，第 n 次失败后等待 base_delay × 2^n
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// max(提示等待, 指数退避)
    pub fn delay_for(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        let backoff = self.base_delay.saturating_mul(2u32.saturating_pow(attempt));
        hint.map_or(backoff, |hint| hint.max(backoff))
    }
}

/// 仅对限流错误进行退避重试，其余错误直接返回
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    retry_with_backoff_when(policy, label, |err| classify(err).retry_hint(), operation).await
}

/// 由调用方决定哪些错误可以重试：`retryable` 返回 `Some(提示)` 表示可重试
pub async fn retry_with_backoff_when<T, F, Fut, P>(
    policy: &RetryPolicy,
    label: &str,
    retryable: P,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    P: Fn(&anyhow::Error) -> Option<Option<Duration>>,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let hint = match retryable(&err) {
                    Some(hint) if attempt + 1 < policy.max_attempts => hint,
                    _ => return Err(err),
                };

                let delay = policy.delay_for(attempt, hint);
                tracing::warn!(
                    task = label,
                    attempt = attempt + 1,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "⏳ 触发限流，{:.1}秒后重试: {}",
                    delay.as_secs_f64(),
                    err
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests;
