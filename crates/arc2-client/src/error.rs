//! 客户端错误类型定义

use crate::config::ConfigError;
use arc2_driver::DriverError;
use arc2_protocol::ArgumentError;
use thiserror::Error;

/// 客户端错误类型
///
/// - `InvalidArgument`: 在任何硬件调用之前同步产生
/// - `Driver`: 原生驱动在提交或读取时产生，原样透传，不重试
#[derive(Error, Debug)]
pub enum Arc2Error {
    #[error("{0}")]
    InvalidArgument(#[from] ArgumentError),

    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl Arc2Error {
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Arc2Error::InvalidArgument(_))
    }

    pub fn is_driver_error(&self) -> bool {
        matches!(self, Arc2Error::Driver(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_argument_error() {
        let err: Arc2Error = ArgumentError::InvalidIdleMode("7".to_string()).into();
        assert!(err.is_invalid_argument());
        assert!(!err.is_driver_error());
        assert!(err.to_string().starts_with("invalid idle mode"));
    }

    #[test]
    fn test_driver_error_is_verbatim() {
        let err: Arc2Error = DriverError::Timeout.into();
        assert!(err.is_driver_error());
        match err {
            Arc2Error::Driver(inner) => assert_eq!(inner, DriverError::Timeout),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
