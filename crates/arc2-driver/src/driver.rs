//! 原生驱动接口
//!
//! 本层不实现固件通信，只消费原生驱动提供的原语。原语分为三类：
//!
//! - [`CommandSink`]: 排队类原语，只写入驱动的命令缓冲区，`execute()` 时才下发到硬件
//! - [`ResultSource`]: 从驱动内部结果缓冲区逐条取出记录（FIFO 游标由驱动持有）
//! - [`Arc2Driver`]: 以上两者加上立即执行的读取类原语
//!
//! 所有调用都是同步阻塞的。向量参数已经过规范化，驱动可以直接拷贝进固定大小的命令缓冲区；
//! 通道号是否越界由驱动自行检查并返回 [`DriverError::Rejected`]。

use crate::DriverError;
use arc2_protocol::{
    AuxDacFn, BiasOrder, Channel, ControlMode, DataMode, NUM_CLUSTERS, RampConfig, ReadType,
    WaitFor,
};

/// 排队类原语
pub trait CommandSink {
    /// 插入延时（ns）
    fn add_delay(&mut self, nanos: u128) -> Result<(), DriverError>;

    /// 所有通道软接地（DAC 驱动到 0 V）
    fn ground_all(&mut self) -> Result<(), DriverError>;

    /// 所有通道快速接地（高速驱动器）
    fn ground_all_fast(&mut self) -> Result<(), DriverError>;

    /// 所有通道与 DAC 断开（浮空）
    fn float_all(&mut self) -> Result<(), DriverError>;

    /// 将指定通道硬接地；空集合清除所有硬接地
    fn connect_to_gnd(&mut self, chans: &[Channel]) -> Result<(), DriverError>;

    /// 打开指定通道，其余通道断开
    fn open_channels(&mut self, chans: &[Channel]) -> Result<(), DriverError>;

    /// 设置通道电压；`base` 为其余通道的电压（`None` 表示保持不变）
    fn config_channels(
        &mut self,
        voltages: &[(u16, f32)],
        base: Option<f32>,
    ) -> Result<(), DriverError>;

    /// 设置辅助 DAC 电压
    fn config_aux_channels(&mut self, voltages: &[(AuxDacFn, f32)]) -> Result<(), DriverError>;

    /// 使能指定选择器通道，其余选择器关闭
    fn config_selectors(&mut self, selectors: &[Channel]) -> Result<(), DriverError>;

    /// 设置数字 IO 输出掩码
    fn set_logic(&mut self, mask: u32) -> Result<(), DriverError>;

    fn pulse_one(
        &mut self,
        low: Channel,
        high: Channel,
        voltage: f32,
        nanos: u128,
    ) -> Result<(), DriverError>;

    fn pulse_slice(&mut self, chan: Channel, voltage: f32, nanos: u128)
    -> Result<(), DriverError>;

    fn pulse_slice_masked(
        &mut self,
        chan: Channel,
        mask: &[Channel],
        voltage: f32,
        nanos: u128,
    ) -> Result<(), DriverError>;

    /// 仅使用高速驱动器的开路脉冲
    ///
    /// `chans` 为 `(通道, 脉冲电压, 常态电压)`；`cl_nanos` 为每个簇的脉宽，`None` 表示跳过该簇。
    fn pulse_slice_fast_open(
        &mut self,
        chans: &[(Channel, f32, f32)],
        cl_nanos: &[Option<u128>; NUM_CLUSTERS],
        preset_state: bool,
    ) -> Result<(), DriverError>;

    fn pulse_all(&mut self, voltage: f32, nanos: u128, order: BiasOrder)
    -> Result<(), DriverError>;

    /// 启动斜坡操作，结果写入内部结果缓冲区
    fn generate_ramp(&mut self, ramp: &RampConfig) -> Result<(), DriverError>;

    /// 启动电流读取序列；`lows` 为空表示开路读取
    fn generate_read_train(
        &mut self,
        lows: &[Channel],
        highs: &[Channel],
        vread: f32,
        nreads: usize,
        inter_nanos: u128,
        ground: bool,
    ) -> Result<(), DriverError>;

    /// 启动电压读取序列
    fn generate_vread_train(
        &mut self,
        chans: &[Channel],
        averaging: bool,
        npulses: usize,
        inter_nanos: u128,
    ) -> Result<(), DriverError>;

    /// 类保持性测试的连续读取
    fn read_train(
        &mut self,
        low: Channel,
        high: Channel,
        vread: f32,
        interpulse: u128,
        preload: Option<f32>,
        condition: WaitFor,
    ) -> Result<(), DriverError>;

    /// 提交命令缓冲区
    fn execute(&mut self) -> Result<(), DriverError>;
}

/// 结果缓冲区
pub trait ResultSource {
    /// 取出下一条结果记录并清除其存储区
    ///
    /// 缓冲区为空时返回 `Ok(None)`。
    fn pick_one(
        &mut self,
        mode: DataMode,
        rtype: ReadType,
    ) -> Result<Option<Vec<f32>>, DriverError>;
}

/// 完整的原生驱动接口
pub trait Arc2Driver: CommandSink + ResultSource {
    fn read_one(&mut self, low: Channel, high: Channel, vread: f32) -> Result<f32, DriverError>;

    fn read_slice(&mut self, chan: Channel, vread: f32) -> Result<Vec<f32>, DriverError>;

    /// 未选中的通道返回 `NaN`
    fn read_slice_masked(
        &mut self,
        chan: Channel,
        mask: &[Channel],
        vread: f32,
    ) -> Result<Vec<f32>, DriverError>;

    /// 返回行优先的 32×32 个值
    fn read_all(&mut self, vread: f32, order: BiasOrder) -> Result<Vec<f32>, DriverError>;

    fn read_slice_open(
        &mut self,
        highs: &[Channel],
        ground_after: bool,
    ) -> Result<Vec<f32>, DriverError>;

    fn pulseread_one(
        &mut self,
        low: Channel,
        high: Channel,
        vpulse: f32,
        nanos: u128,
        vread: f32,
    ) -> Result<f32, DriverError>;

    fn pulseread_slice(
        &mut self,
        chan: Channel,
        vpulse: f32,
        nanos: u128,
        vread: f32,
    ) -> Result<Vec<f32>, DriverError>;

    fn pulseread_slice_masked(
        &mut self,
        chan: Channel,
        mask: &[Channel],
        vpulse: f32,
        nanos: u128,
        vread: f32,
    ) -> Result<Vec<f32>, DriverError>;

    /// 返回行优先的 32×32 个值
    fn pulseread_all(
        &mut self,
        vpulse: f32,
        nanos: u128,
        vread: f32,
        order: BiasOrder,
    ) -> Result<Vec<f32>, DriverError>;

    /// 按通道升序返回电压
    fn vread_channels(
        &mut self,
        chans: &[Channel],
        averaging: bool,
    ) -> Result<Vec<f32>, DriverError>;

    fn currents_from_address(
        &mut self,
        addr: u32,
        chans: &[Channel],
    ) -> Result<Vec<f32>, DriverError>;

    fn word_currents_from_address(&mut self, addr: u32) -> Result<Vec<f32>, DriverError>;

    fn bit_currents_from_address(&mut self, addr: u32) -> Result<Vec<f32>, DriverError>;

    /// 立即切换控制模式（不经过命令缓冲区）
    fn set_control_mode(&mut self, mode: ControlMode) -> Result<(), DriverError>;

    /// 仪器是否仍在执行命令
    fn busy(&self) -> Result<bool, DriverError>;

    /// 阻塞直到仪器空闲
    fn wait(&mut self) -> Result<(), DriverError>;
}
