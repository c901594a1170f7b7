//! 日志初始化
//!
//! 库本身只产生 `tracing` 事件。应用程序可以调用 [`init`] 安装默认的订阅者：
//! 过滤规则来自 `RUST_LOG`，未设置时为 `arc2=info`。
//!
//! `log` 记录由 `tracing-subscriber` 的 `tracing-log` 特性在 `try_init` 中桥接，
//! 最大级别与过滤规则一致。

use tracing_subscriber::EnvFilter;

/// 默认过滤规则
pub const DEFAULT_FILTER: &str = "arc2=info";

/// 日志初始化错误
pub type InitError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// 安装全局订阅者
///
/// 已经安装过订阅者时返回错误，不会 panic。
pub fn init() -> Result<(), InitError> {
    init_with_filter(env_filter())
}

/// 使用指定过滤规则安装全局订阅者（同时安装 `log` 桥接）
pub fn init_with_filter(filter: EnvFilter) -> Result<(), InitError> {
    let directives = filter.to_string();
    tracing_subscriber::fmt().with_env_filter(filter).try_init()?;
    tracing::debug!("Logging initialized with filter: {}", directives);
    Ok(())
}

/// `RUST_LOG` 或默认规则
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 第一次安装成功并打开 `log` 桥接；第二次返回错误而不是 panic
    ///
    /// 本测试二进制中只有这里安装订阅者。
    #[test]
    fn test_init_installs_log_bridge_once() {
        init_with_filter(EnvFilter::new("debug")).unwrap();
        assert_eq!(log::max_level(), log::LevelFilter::Debug);

        // 经由桥接的 log 记录
        log::info!("log records are forwarded to tracing");

        assert!(init_with_filter(EnvFilter::new("off")).is_err());
    }

    #[test]
    fn test_default_filter_parses() {
        assert!(DEFAULT_FILTER.parse::<tracing_subscriber::filter::Directive>().is_ok());
    }
}
