//! 命令序列模块
//!
//! 排队类原语先累积在 [`CommandSequence`] 中，再由 [`CommandSequence::commit`]
//! 一次性写入驱动并提交。序列在提交时被消费，不能重复使用，也不能只提交一部分。

use crate::{CommandSink, DriverError};
use arc2_protocol::{
    ArgumentError, AuxDacFn, BiasOrder, Channel, ChannelIndex, ChannelSet, IntoChannelSet,
    NUM_CLUSTERS, RampConfig, WaitFor,
};
use smallvec::SmallVec;
use tracing::debug;

/// 命令缓冲区类型
///
/// 栈上预留 4 个位置，足以覆盖所有空闲状态切换序列（最多 3 条命令）。
pub type CommandBuffer = SmallVec<[Command; 4]>;

/// 单条排队命令
///
/// 每个变体对应 [`CommandSink`] 上的一个同名原语，向量参数均已规范化。
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Delay(u128),
    GroundAll,
    GroundAllFast,
    FloatAll,
    ConnectToGnd(ChannelSet),
    OpenChannels(ChannelSet),
    ConfigChannels {
        voltages: Vec<(u16, f32)>,
        base: Option<f32>,
    },
    ConfigAuxChannels(Vec<(AuxDacFn, f32)>),
    ConfigSelectors(ChannelSet),
    SetLogic(u32),
    PulseOne {
        low: Channel,
        high: Channel,
        voltage: f32,
        nanos: u128,
    },
    PulseSlice {
        chan: Channel,
        voltage: f32,
        nanos: u128,
    },
    PulseSliceMasked {
        chan: Channel,
        mask: ChannelSet,
        voltage: f32,
        nanos: u128,
    },
    PulseSliceFastOpen {
        chans: Vec<(Channel, f32, f32)>,
        cl_nanos: [Option<u128>; NUM_CLUSTERS],
        preset_state: bool,
    },
    PulseAll {
        voltage: f32,
        nanos: u128,
        order: BiasOrder,
    },
    GenerateRamp(RampConfig),
    GenerateReadTrain {
        lows: ChannelSet,
        highs: ChannelSet,
        vread: f32,
        nreads: usize,
        inter_nanos: u128,
        ground: bool,
    },
    GenerateVReadTrain {
        chans: ChannelSet,
        averaging: bool,
        npulses: usize,
        inter_nanos: u128,
    },
    ReadTrain {
        low: Channel,
        high: Channel,
        vread: f32,
        interpulse: u128,
        preload: Option<f32>,
        condition: WaitFor,
    },
}

impl Command {
    /// 对应原语的名称（用于日志和故障注入）
    pub fn name(&self) -> &'static str {
        match self {
            Command::Delay(_) => "add_delay",
            Command::GroundAll => "ground_all",
            Command::GroundAllFast => "ground_all_fast",
            Command::FloatAll => "float_all",
            Command::ConnectToGnd(_) => "connect_to_gnd",
            Command::OpenChannels(_) => "open_channels",
            Command::ConfigChannels { .. } => "config_channels",
            Command::ConfigAuxChannels(_) => "config_aux_channels",
            Command::ConfigSelectors(_) => "config_selectors",
            Command::SetLogic(_) => "set_logic",
            Command::PulseOne { .. } => "pulse_one",
            Command::PulseSlice { .. } => "pulse_slice",
            Command::PulseSliceMasked { .. } => "pulse_slice_masked",
            Command::PulseSliceFastOpen { .. } => "pulse_slice_fast_open",
            Command::PulseAll { .. } => "pulse_all",
            Command::GenerateRamp(_) => "generate_ramp",
            Command::GenerateReadTrain { .. } => "generate_read_train",
            Command::GenerateVReadTrain { .. } => "generate_vread_train",
            Command::ReadTrain { .. } => "read_train",
        }
    }

    /// 将命令写入驱动的命令缓冲区
    pub fn apply<S: CommandSink + ?Sized>(&self, sink: &mut S) -> Result<(), DriverError> {
        match self {
            Command::Delay(nanos) => sink.add_delay(*nanos),
            Command::GroundAll => sink.ground_all(),
            Command::GroundAllFast => sink.ground_all_fast(),
            Command::FloatAll => sink.float_all(),
            Command::ConnectToGnd(chans) => sink.connect_to_gnd(chans.as_slice()),
            Command::OpenChannels(chans) => sink.open_channels(chans.as_slice()),
            Command::ConfigChannels { voltages, base } => sink.config_channels(voltages, *base),
            Command::ConfigAuxChannels(voltages) => sink.config_aux_channels(voltages),
            Command::ConfigSelectors(selectors) => sink.config_selectors(selectors.as_slice()),
            Command::SetLogic(mask) => sink.set_logic(*mask),
            Command::PulseOne {
                low,
                high,
                voltage,
                nanos,
            } => sink.pulse_one(*low, *high, *voltage, *nanos),
            Command::PulseSlice {
                chan,
                voltage,
                nanos,
            } => sink.pulse_slice(*chan, *voltage, *nanos),
            Command::PulseSliceMasked {
                chan,
                mask,
                voltage,
                nanos,
            } => sink.pulse_slice_masked(*chan, mask.as_slice(), *voltage, *nanos),
            Command::PulseSliceFastOpen {
                chans,
                cl_nanos,
                preset_state,
            } => sink.pulse_slice_fast_open(chans, cl_nanos, *preset_state),
            Command::PulseAll {
                voltage,
                nanos,
                order,
            } => sink.pulse_all(*voltage, *nanos, *order),
            Command::GenerateRamp(ramp) => sink.generate_ramp(ramp),
            Command::GenerateReadTrain {
                lows,
                highs,
                vread,
                nreads,
                inter_nanos,
                ground,
            } => sink.generate_read_train(
                lows.as_slice(),
                highs.as_slice(),
                *vread,
                *nreads,
                *inter_nanos,
                *ground,
            ),
            Command::GenerateVReadTrain {
                chans,
                averaging,
                npulses,
                inter_nanos,
            } => sink.generate_vread_train(chans.as_slice(), *averaging, *npulses, *inter_nanos),
            Command::ReadTrain {
                low,
                high,
                vread,
                interpulse,
                preload,
                condition,
            } => sink.read_train(*low, *high, *vread, *interpulse, *preload, *condition),
        }
    }
}

/// 命令序列
///
/// 按调用顺序累积排队命令。所有接受向量参数的方法在入队前都会规范化参数，
/// 规范化失败时返回 [`ArgumentError`]，此时不会有任何命令到达驱动。
///
/// **提交即消费**：`commit` 按值接收 `self`，同一序列无法提交两次，
/// 也无法在提交后继续追加命令。
///
/// # 示例
///
/// ```rust
/// use arc2_driver::CommandSequence;
///
/// let seq = CommandSequence::new()
///     .ground_all_fast()
///     .float_all()
///     .connect_to_gnd(0..64usize)
///     .unwrap();
/// assert_eq!(seq.len(), 3);
/// ```
#[must_use = "a command sequence has no effect until it is committed"]
#[derive(Debug, Default, PartialEq)]
pub struct CommandSequence {
    commands: CommandBuffer,
}

impl CommandSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加任意命令
    pub fn push(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    pub fn delay(self, nanos: u128) -> Self {
        self.push(Command::Delay(nanos))
    }

    pub fn ground_all(self) -> Self {
        self.push(Command::GroundAll)
    }

    pub fn ground_all_fast(self) -> Self {
        self.push(Command::GroundAllFast)
    }

    pub fn float_all(self) -> Self {
        self.push(Command::FloatAll)
    }

    /// 硬接地；空集合清除所有硬接地
    pub fn connect_to_gnd(self, chans: impl IntoChannelSet) -> Result<Self, ArgumentError> {
        Ok(self.push(Command::ConnectToGnd(chans.into_channel_set()?)))
    }

    pub fn open_channels(self, chans: impl IntoChannelSet) -> Result<Self, ArgumentError> {
        Ok(self.push(Command::OpenChannels(chans.into_channel_set()?)))
    }

    /// 设置通道电压
    ///
    /// 通道号必须能表示为 `u16`。
    pub fn config_channels<T, I>(self, voltages: I, base: Option<f32>) -> Result<Self, ArgumentError>
    where
        T: ChannelIndex,
        I: IntoIterator<Item = (T, f32)>,
    {
        let voltages = voltages
            .into_iter()
            .map(|(chan, v)| {
                chan.to_channel().and_then(|chan| {
                    u16::try_from(chan)
                        .map(|c| (c, v))
                        .map_err(|_| ArgumentError::NotAnIntegerSequence {
                            detail: format!("channel {} does not fit in 16 bits", chan),
                        })
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.push(Command::ConfigChannels { voltages, base }))
    }

    pub fn config_aux_channels(self, voltages: impl IntoIterator<Item = (AuxDacFn, f32)>) -> Self {
        self.push(Command::ConfigAuxChannels(voltages.into_iter().collect()))
    }

    pub fn config_selectors(self, selectors: impl IntoChannelSet) -> Result<Self, ArgumentError> {
        Ok(self.push(Command::ConfigSelectors(selectors.into_channel_set()?)))
    }

    pub fn set_logic(self, mask: u32) -> Self {
        self.push(Command::SetLogic(mask))
    }

    pub fn pulse_one(self, low: Channel, high: Channel, voltage: f32, nanos: u128) -> Self {
        self.push(Command::PulseOne {
            low,
            high,
            voltage,
            nanos,
        })
    }

    pub fn pulse_slice(self, chan: Channel, voltage: f32, nanos: u128) -> Self {
        self.push(Command::PulseSlice {
            chan,
            voltage,
            nanos,
        })
    }

    pub fn pulse_slice_masked(
        self,
        chan: Channel,
        mask: impl IntoChannelSet,
        voltage: f32,
        nanos: u128,
    ) -> Result<Self, ArgumentError> {
        Ok(self.push(Command::PulseSliceMasked {
            chan,
            mask: mask.into_channel_set()?,
            voltage,
            nanos,
        }))
    }

    /// 开路快速脉冲
    ///
    /// `cl_nanos` 的长度在类型上固定为簇数量。簇时序与通道是否匹配由驱动检查。
    pub fn pulse_slice_fast_open<T, I>(
        self,
        chans: I,
        cl_nanos: [Option<u128>; NUM_CLUSTERS],
        preset_state: bool,
    ) -> Result<Self, ArgumentError>
    where
        T: ChannelIndex,
        I: IntoIterator<Item = (T, f32, f32)>,
    {
        let chans = chans
            .into_iter()
            .map(|(chan, vpulse, vnormal)| chan.to_channel().map(|c| (c, vpulse, vnormal)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.push(Command::PulseSliceFastOpen {
            chans,
            cl_nanos,
            preset_state,
        }))
    }

    pub fn pulse_all(self, voltage: f32, nanos: u128, order: BiasOrder) -> Self {
        self.push(Command::PulseAll {
            voltage,
            nanos,
            order,
        })
    }

    pub fn generate_ramp(self, ramp: RampConfig) -> Self {
        self.push(Command::GenerateRamp(ramp))
    }

    /// 电流读取序列
    ///
    /// `lows` 为 `None` 时进行开路读取，以空集合下发给驱动。
    pub fn generate_read_train<L, H>(
        self,
        lows: Option<L>,
        highs: H,
        vread: f32,
        nreads: usize,
        inter_nanos: u128,
        ground: bool,
    ) -> Result<Self, ArgumentError>
    where
        L: IntoChannelSet,
        H: IntoChannelSet,
    {
        let lows = arc2_protocol::normalize_optional(lows)?.unwrap_or_default();
        let highs = highs.into_channel_set()?;
        Ok(self.push(Command::GenerateReadTrain {
            lows,
            highs,
            vread,
            nreads,
            inter_nanos,
            ground,
        }))
    }

    pub fn generate_vread_train(
        self,
        chans: impl IntoChannelSet,
        averaging: bool,
        npulses: usize,
        inter_nanos: u128,
    ) -> Result<Self, ArgumentError> {
        Ok(self.push(Command::GenerateVReadTrain {
            chans: chans.into_channel_set()?,
            averaging,
            npulses,
            inter_nanos,
        }))
    }

    pub fn read_train(
        self,
        low: Channel,
        high: Channel,
        vread: f32,
        interpulse: u128,
        preload: Option<f32>,
        condition: WaitFor,
    ) -> Self {
        self.push(Command::ReadTrain {
            low,
            high,
            vread,
            interpulse,
            preload,
            condition,
        })
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    /// 按顺序写入所有命令，然后调用 `execute()` 提交
    ///
    /// 任一原语失败时立即返回该错误，不会调用 `execute()`。
    /// 返回提交的命令数量。
    pub fn commit<S: CommandSink + ?Sized>(self, sink: &mut S) -> Result<usize, DriverError> {
        for command in &self.commands {
            command.apply(sink)?;
        }
        sink.execute()?;

        debug!(
            "Committed command sequence ({} commands): {:?}",
            self.commands.len(),
            self.commands.iter().map(Command::name).collect::<Vec<_>>()
        );
        Ok(self.commands.len())
    }
}
