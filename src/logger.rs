//! 日志初始化

use tracing_subscriber::EnvFilter;

/// 初始化 tracing 日志输出
///
/// 默认级别为 info，可通过 RUST_LOG 环境变量覆盖
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}
