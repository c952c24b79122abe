//! 日志初始化。
//!
//! 库内部只通过 `tracing` 宏输出结构化事件；宿主程序可以自行安装 subscriber，
//! 也可以调用 [`init_logging`] 使用默认的 fmt 输出。

use tracing_subscriber::EnvFilter;

const LOG_LEVEL_ENV: &str = "CLOUDVAULT_LOG_LEVEL";

/// 安装 fmt subscriber。`RUST_LOG` 优先，其次 `CLOUDVAULT_LOG_LEVEL`，最后是传入的默认级别。
/// 重复调用是安全的，已经存在全局 subscriber 时直接返回。
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| default_level.to_string());
        EnvFilter::new(level)
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
