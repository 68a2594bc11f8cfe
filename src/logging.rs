//! 日志初始化

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// 日志过滤环境变量，例如 `REGWRITER_LOG=regwriter_rs::search=debug,info`
pub const LOG_ENV: &str = "REGWRITER_LOG";

static INIT: Once = Once::new();

/// 默认过滤级别
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}

/// 安装全局 fmt subscriber，多次调用只生效一次
pub fn init(verbose: bool) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

        // 已有全局 subscriber 时（例如嵌入到其他程序中）保持原样
        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_target(verbose))
            .with(filter)
            .try_init();
    });
}

#[cfg(test)]
mod tests;
