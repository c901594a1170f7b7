//! # ArC2 Protocol
//!
//! ArC2 仪器的参数值类型定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `constants`: 通道数量等硬件常量
//! - `channels`: 通道集合与输入规范化（InputNormalizer）
//! - `modes`: 空闲模式、控制模式、数据读取模式
//! - `ops`: 脉冲/读取/斜坡等操作的参数类型
//!
//! ## 校验边界
//!
//! 本 crate 只负责**形状与类型**校验：向量维度、元素是否能表示为无符号通道号、
//! 枚举值是否合法。通道号是否小于 [`NUM_CHANNELS`] 由底层驱动负责拒绝。

pub mod channels;
pub mod constants;
pub mod modes;
pub mod ops;

// 重新导出常用类型
pub use channels::*;
pub use constants::*;
pub use modes::*;
pub use ops::*;

use thiserror::Error;

/// 参数错误（InvalidArgument）
///
/// 在任何硬件调用发出之前同步产生。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("Invalid argument: expected a {expected}-dimensional array, got {actual} dimensions")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid argument: value must be an iterable of integers ({detail})")]
    NotAnIntegerSequence { detail: String },

    #[error("invalid idle mode: {0}")]
    InvalidIdleMode(String),

    #[error("invalid control mode: {0}")]
    InvalidControlMode(String),

    #[error("invalid data mode: {0}")]
    InvalidDataMode(String),

    #[error("invalid read type: {0}")]
    InvalidReadType(String),

    #[error("Unknown ReadAfter: {0}")]
    InvalidReadAfter(String),

    #[error("No voltage associated")]
    NoVoltage,
}

/// 规范化枚举名称：忽略大小写以及 `_`/`-` 分隔符
///
/// `"Soft_Gnd"`、`"soft-gnd"`、`"softgnd"` 均得到 `"softgnd"`。
pub(crate) fn canonical_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_error_display() {
        let err = ArgumentError::DimensionMismatch {
            expected: 1,
            actual: 2,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("1-dimensional") && msg.contains("got 2"));

        let err = ArgumentError::InvalidIdleMode("7".to_string());
        assert!(err.to_string().starts_with("invalid idle mode"));

        let err = ArgumentError::InvalidControlMode("sideways".to_string());
        assert!(err.to_string().starts_with("invalid control mode"));
    }

    #[test]
    fn test_canonical_name() {
        assert_eq!(canonical_name("Soft_Gnd"), "softgnd");
        assert_eq!(canonical_name("soft-gnd"), "softgnd");
        assert_eq!(canonical_name(" HardGnd "), "hardgnd");
    }
}
