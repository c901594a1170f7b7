//! 客户端接口模块
//!
//! 本模块提供 ArC2 仪器的用户接口，包括：
//! - [`Instrument`]: 仪器门面，转发完整命令集合并规范化向量参数
//! - [`ResultIterator`]: 惰性读取驱动结果缓冲区
//! - [`IdleStateController`]: 按固定顺序将通道和控制路由切换到终态
//! - [`config`]: TOML 配置
//!
//! # 错误处理
//!
//! 所有操作返回 [`Arc2Error`]：参数错误在硬件调用之前同步产生，驱动错误原样透传。

pub mod config;
mod error;
pub mod idle;
pub mod instrument;
pub mod results;

// 重新导出常用类型
pub use config::{ConfigError, IdleConfig, InstrumentConfig, ResultsConfig};
pub use error::Arc2Error;
pub use idle::IdleStateController;
pub use instrument::Instrument;
pub use results::{RecordBuffer, ResultBatch, ResultIterator, ResultRecord};
