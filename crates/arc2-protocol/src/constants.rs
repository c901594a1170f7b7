//! 硬件常量定义

/// 可寻址的模拟通道数量
pub const NUM_CHANNELS: usize = 64;

/// 标准交叉阵列的边长（32×32）
pub const ARRAY_DIM: usize = 32;

/// 快速脉冲驱动器的簇数量
///
/// 每个簇包含 8 个连续通道，通道 `c` 属于簇 `c / 8`。
pub const NUM_CLUSTERS: usize = 8;

/// `DataMode::All` 下单条结果记录的样本数
pub const RECORD_LEN_ALL: usize = NUM_CHANNELS;

/// `DataMode::Words` / `DataMode::Bits` 下单条结果记录的样本数
pub const RECORD_LEN_HALF: usize = NUM_CHANNELS / 2;
