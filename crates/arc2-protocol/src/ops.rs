//! 操作参数类型
//!
//! 脉冲、读取、斜坡与读取序列等命令使用的值类型。时间参数统一以纳秒 `u128` 表示。

use crate::{ArgumentError, canonical_name};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// 多交叉点脉冲/读取时的偏置方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BiasOrder {
    /// 偏置行
    Rows,
    /// 偏置列
    Columns,
}

/// 斜坡操作的读出电压
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReadAt {
    /// 在当前偏置电压下读出
    Bias,
    /// 在指定电压下读出
    Arb(f32),
    /// 不读出（隐含 `ReadAfter::Never`）
    Never,
}

impl ReadAt {
    /// 读出电压，仅 `ReadAt::Arb` 有值
    pub fn voltage(&self) -> Result<f32, ArgumentError> {
        match self {
            ReadAt::Arb(v) => Ok(*v),
            _ => Err(ArgumentError::NoVoltage),
        }
    }
}

/// 斜坡操作的读出时机
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ReadAfter {
    /// 每个脉冲之后
    Pulse,
    /// 整个斜坡结束之后
    Ramp,
    /// 每个电压台阶之后
    Block,
    /// 从不（隐含 `ReadAt::Never`）
    Never,
}

impl ReadAfter {
    pub fn as_str(self) -> &'static str {
        match self {
            ReadAfter::Pulse => "pulse",
            ReadAfter::Ramp => "ramp",
            ReadAfter::Block => "block",
            ReadAfter::Never => "never",
        }
    }
}

impl FromStr for ReadAfter {
    type Err = ArgumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match canonical_name(s).as_str() {
            "pulse" => Ok(ReadAfter::Pulse),
            "ramp" => Ok(ReadAfter::Ramp),
            "block" => Ok(ReadAfter::Block),
            "never" => Ok(ReadAfter::Never),
            _ => Err(ArgumentError::InvalidReadAfter(s.to_string())),
        }
    }
}

impl fmt::Display for ReadAfter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 读取序列的终止条件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WaitFor {
    /// 持续指定时间
    Time(Duration),
    /// 执行指定次数
    Iterations(usize),
}

impl WaitFor {
    pub fn nanos(nanos: u64) -> Self {
        WaitFor::Time(Duration::from_nanos(nanos))
    }

    pub fn millis(millis: u64) -> Self {
        WaitFor::Time(Duration::from_millis(millis))
    }

    pub fn iterations(iters: usize) -> Self {
        WaitFor::Iterations(iters)
    }
}

/// 辅助 DAC 功能
///
/// 数值为辅助 DAC 的输出索引。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    num_enum::IntoPrimitive,
    num_enum::TryFromPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum AuxDacFn {
    /// 选择器下拉电压
    SELL = 0,
    /// 选择器上拉电压
    SELH = 1,
    /// 任意电源（最大 100 mA）
    ARB4 = 2,
    ARB3 = 3,
    ARB1 = 4,
    ARB2 = 5,
    /// 电流源设定电压
    CSET = 6,
    /// 电流源参考电压
    CREF = 7,
}

impl fmt::Display for AuxDacFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// 斜坡操作参数
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RampConfig {
    /// 低电压通道（通常接地）
    pub low: usize,
    /// 高电压通道
    pub high: usize,
    pub vstart: f32,
    /// 每个台阶的电压增量（可为负）
    pub vstep: f32,
    pub vstop: f32,
    /// 单个脉冲宽度（ns）
    pub pw_nanos: u128,
    /// 相邻脉冲间隔（ns）
    pub inter_nanos: u128,
    /// 每个电压台阶的脉冲数
    pub num_pulses: usize,
    pub read_at: ReadAt,
    pub read_after: ReadAfter,
}

impl RampConfig {
    /// 创建不读出的斜坡
    pub fn new(low: usize, high: usize, vstart: f32, vstep: f32, vstop: f32) -> Self {
        Self {
            low,
            high,
            vstart,
            vstep,
            vstop,
            pw_nanos: 100_000,
            inter_nanos: 0,
            num_pulses: 1,
            read_at: ReadAt::Never,
            read_after: ReadAfter::Never,
        }
    }

    pub fn with_timing(mut self, pw_nanos: u128, inter_nanos: u128, num_pulses: usize) -> Self {
        self.pw_nanos = pw_nanos;
        self.inter_nanos = inter_nanos;
        self.num_pulses = num_pulses;
        self
    }

    pub fn with_read(mut self, read_at: ReadAt, read_after: ReadAfter) -> Self {
        self.read_at = read_at;
        self.read_after = read_after;
        self
    }
}
