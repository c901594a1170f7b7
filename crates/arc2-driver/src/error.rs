//! 驱动层错误类型定义

use thiserror::Error;

/// 驱动层错误类型
///
/// 原生驱动在提交或读取时产生的错误。本层从不重试，也从不吞掉这些错误。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// 操作超时
    #[error("Operation timeout")]
    Timeout,

    /// 设备已断开
    #[error("Instrument disconnected")]
    Disconnected,

    /// 原生驱动报告的错误
    #[error("Native driver error: {0}")]
    Native(String),

    /// 驱动拒绝了参数（如通道号越界、簇时序不一致）
    #[error("Rejected by driver: {0}")]
    Rejected(String),

    /// 驱动返回的数据长度与预期不符
    #[error("Invalid response: expected {expected} values, got {actual}")]
    InvalidResponse { expected: usize, actual: usize },
}

impl DriverError {
    /// 是否为连接类错误（需要重新打开设备）
    pub fn is_fatal(&self) -> bool {
        matches!(self, DriverError::Disconnected)
    }
}
