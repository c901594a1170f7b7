//! ArC2 SDK - ArC2 仪器命令编排与校验层
//!
//! 位于原生驱动之上，负责：
//!
//! - 将各种通道/掩码/地址参数规范化为驱动需要的一维无符号整数向量
//! - 以惰性、有序的序列暴露采集结果
//! - 按固定原语顺序把通道和控制路由切换到定义好的空闲状态
//!
//! # 架构设计
//!
//! 从底层到高层：
//!
//! - **协议层** (`protocol`): 无硬件依赖的值类型和输入规范化
//! - **驱动层** (`driver`): 原生驱动接口、一次性提交的命令序列
//! - **客户端层** (`client`): 仪器门面、结果迭代器、空闲状态控制器
//!
//! # 快速开始
//!
//! ```rust
//! use arc2_sdk::prelude::*;
//! ```

pub use arc2_client as client;
pub use arc2_driver as driver;
pub use arc2_protocol as protocol;

pub mod logging;
pub mod prelude;

// --- 用户以此为界 ---

// 协议层常用类型
pub use protocol::{
    ArgumentError, ChannelSet, ControlMode, DataMode, IdleMode, IntoChannelSet, RawMode,
    ReadType, normalize, normalize_optional,
};

// 驱动层
pub use driver::{Arc2Driver, CommandSequence, DriverError};

// 客户端层（推荐入口）
pub use client::{Arc2Error, IdleStateController, Instrument, InstrumentConfig, ResultIterator};
