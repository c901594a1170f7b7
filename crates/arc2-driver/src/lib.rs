//! # ArC2 Driver Layer
//!
//! 原生驱动接口层：
//!
//! - [`CommandSink`] / [`ResultSource`] / [`Arc2Driver`]: 本层消费的原生驱动原语
//! - [`CommandSequence`]: 一次性提交的命令序列
//! - [`MockDriver`]: 无硬件测试驱动（`mock` feature）
//!
//! 固件通信、设备枚举由原生驱动负责，不在本 crate 范围内。

pub mod command;
mod driver;
mod error;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use command::{Command, CommandBuffer, CommandSequence};
pub use driver::{Arc2Driver, CommandSink, ResultSource};
pub use error::DriverError;

#[cfg(any(test, feature = "mock"))]
pub use mock::{CallLog, DriverCall, MockDriver};
