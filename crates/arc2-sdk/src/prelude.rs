//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use arc2_sdk::prelude::*;
//! ```

// 客户端层
pub use crate::client::{
    Arc2Error, IdleConfig, IdleStateController, Instrument, InstrumentConfig, ResultBatch,
    ResultIterator, ResultRecord, ResultsConfig,
};

// 驱动层
pub use crate::driver::{Arc2Driver, Command, CommandSequence, CommandSink, DriverError, ResultSource};

// 值类型
pub use crate::protocol::{
    ArgumentError, AuxDacFn, BiasOrder, ChannelSet, ControlMode, DataMode, IdleMode,
    IntoChannelSet, RampConfig, RawMode, ReadAfter, ReadAt, ReadType, WaitFor,
};
