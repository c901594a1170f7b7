//! Mock 驱动
//!
//! 不连接硬件，记录每一次原语调用，并从预置的 FIFO 缓冲区返回结果记录。
//!
//! `MockDriver` 是共享句柄：克隆后的实例共享同一份状态，
//! 因此可以在把驱动交给 `Instrument` 之后继续预置数据、检查调用记录。

use crate::command::Command;
use crate::{Arc2Driver, CommandSink, DriverError, ResultSource};
use arc2_protocol::{
    ARRAY_DIM, AuxDacFn, BiasOrder, Channel, ChannelSet, ControlMode, DataMode, NUM_CLUSTERS,
    RampConfig, ReadType, WaitFor,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// 一次驱动调用
#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall {
    /// 排队类原语
    Queue(Command),
    Execute,
    SetControlMode(ControlMode),
    PickOne {
        mode: DataMode,
        rtype: ReadType,
    },
    ReadOne {
        low: Channel,
        high: Channel,
        vread: f32,
    },
    ReadSlice {
        chan: Channel,
        vread: f32,
    },
    ReadSliceMasked {
        chan: Channel,
        mask: ChannelSet,
        vread: f32,
    },
    ReadAll {
        vread: f32,
        order: BiasOrder,
    },
    ReadSliceOpen {
        highs: ChannelSet,
        ground_after: bool,
    },
    PulseReadOne {
        low: Channel,
        high: Channel,
        vpulse: f32,
        nanos: u128,
        vread: f32,
    },
    PulseReadSlice {
        chan: Channel,
        vpulse: f32,
        nanos: u128,
        vread: f32,
    },
    PulseReadSliceMasked {
        chan: Channel,
        mask: ChannelSet,
        vpulse: f32,
        nanos: u128,
        vread: f32,
    },
    PulseReadAll {
        vpulse: f32,
        nanos: u128,
        vread: f32,
        order: BiasOrder,
    },
    VReadChannels {
        chans: ChannelSet,
        averaging: bool,
    },
    CurrentsFromAddress {
        addr: u32,
        chans: ChannelSet,
    },
    WordCurrentsFromAddress(u32),
    BitCurrentsFromAddress(u32),
    Busy,
    Wait,
}

impl DriverCall {
    /// 原语名称，与 [`Command::name`] 一致
    pub fn name(&self) -> &'static str {
        match self {
            DriverCall::Queue(command) => command.name(),
            DriverCall::Execute => "execute",
            DriverCall::SetControlMode(_) => "set_control_mode",
            DriverCall::PickOne { .. } => "pick_one",
            DriverCall::ReadOne { .. } => "read_one",
            DriverCall::ReadSlice { .. } => "read_slice",
            DriverCall::ReadSliceMasked { .. } => "read_slice_masked",
            DriverCall::ReadAll { .. } => "read_all",
            DriverCall::ReadSliceOpen { .. } => "read_slice_open",
            DriverCall::PulseReadOne { .. } => "pulseread_one",
            DriverCall::PulseReadSlice { .. } => "pulseread_slice",
            DriverCall::PulseReadSliceMasked { .. } => "pulseread_slice_masked",
            DriverCall::PulseReadAll { .. } => "pulseread_all",
            DriverCall::VReadChannels { .. } => "vread_channels",
            DriverCall::CurrentsFromAddress { .. } => "currents_from_address",
            DriverCall::WordCurrentsFromAddress(_) => "word_currents_from_address",
            DriverCall::BitCurrentsFromAddress(_) => "bit_currents_from_address",
            DriverCall::Busy => "busy",
            DriverCall::Wait => "wait",
        }
    }
}

/// 共享的调用记录
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<DriverCall>>>,
}

impl CallLog {
    fn push(&self, call: DriverCall) {
        self.calls.lock().push(call);
    }

    /// 当前所有调用的拷贝
    pub fn snapshot(&self) -> Vec<DriverCall> {
        self.calls.lock().clone()
    }

    /// 取出并清空所有调用
    pub fn take(&self) -> Vec<DriverCall> {
        std::mem::take(&mut *self.calls.lock())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.calls.lock().iter().map(DriverCall::name).collect()
    }

    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.lock().is_empty()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

#[derive(Debug, Default)]
struct MockState {
    results: VecDeque<Vec<f32>>,
    responses: VecDeque<Vec<f32>>,
    faults: Vec<(&'static str, DriverError)>,
    read_value: f32,
    busy: bool,
    control_mode: Option<ControlMode>,
}

/// Mock 驱动
#[derive(Debug, Clone, Default)]
pub struct MockDriver {
    state: Arc<Mutex<MockState>>,
    log: CallLog,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// 调用记录句柄
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    /// 向结果缓冲区追加一条记录（由 `pick_one` 按 FIFO 顺序取出）
    pub fn push_result(&self, record: Vec<f32>) {
        self.state.lock().results.push_back(record);
    }

    /// 结果缓冲区中剩余的记录数
    pub fn pending_results(&self) -> usize {
        self.state.lock().results.len()
    }

    /// 预置下一次立即读取的返回数据（覆盖默认生成的数据）
    pub fn push_response(&self, data: Vec<f32>) {
        self.state.lock().responses.push_back(data);
    }

    /// 单点读取和默认生成数据使用的值
    pub fn set_read_value(&self, value: f32) {
        self.state.lock().read_value = value;
    }

    pub fn set_busy(&self, busy: bool) {
        self.state.lock().busy = busy;
    }

    /// 最近一次设置的控制模式
    pub fn control_mode(&self) -> Option<ControlMode> {
        self.state.lock().control_mode
    }

    /// 下一次调用名为 `name` 的原语时返回 `err`（一次性）
    pub fn fail_next(&self, name: &'static str, err: DriverError) {
        self.state.lock().faults.push((name, err));
    }

    fn record(&self, call: DriverCall) -> Result<(), DriverError> {
        let name = call.name();
        self.log.push(call);
        let mut state = self.state.lock();
        match state.faults.iter().position(|(n, _)| *n == name) {
            Some(idx) => Err(state.faults.remove(idx).1),
            None => Ok(()),
        }
    }

    fn queue(&self, command: Command) -> Result<(), DriverError> {
        self.record(DriverCall::Queue(command))
    }

    fn respond(&self, call: DriverCall, len: usize) -> Result<Vec<f32>, DriverError> {
        self.record(call)?;
        let mut state = self.state.lock();
        let value = state.read_value;
        Ok(state
            .responses
            .pop_front()
            .unwrap_or_else(|| vec![value; len]))
    }

    fn masked(&self, call: DriverCall, mask: &[Channel]) -> Result<Vec<f32>, DriverError> {
        let mut data = self.respond(call, ARRAY_DIM)?;
        for (idx, v) in data.iter_mut().enumerate() {
            if !mask.contains(&idx) {
                *v = f32::NAN;
            }
        }
        Ok(data)
    }
}

impl CommandSink for MockDriver {
    fn add_delay(&mut self, nanos: u128) -> Result<(), DriverError> {
        self.queue(Command::Delay(nanos))
    }

    fn ground_all(&mut self) -> Result<(), DriverError> {
        self.queue(Command::GroundAll)
    }

    fn ground_all_fast(&mut self) -> Result<(), DriverError> {
        self.queue(Command::GroundAllFast)
    }

    fn float_all(&mut self) -> Result<(), DriverError> {
        self.queue(Command::FloatAll)
    }

    fn connect_to_gnd(&mut self, chans: &[Channel]) -> Result<(), DriverError> {
        self.queue(Command::ConnectToGnd(chans.to_vec().into()))
    }

    fn open_channels(&mut self, chans: &[Channel]) -> Result<(), DriverError> {
        self.queue(Command::OpenChannels(chans.to_vec().into()))
    }

    fn config_channels(
        &mut self,
        voltages: &[(u16, f32)],
        base: Option<f32>,
    ) -> Result<(), DriverError> {
        self.queue(Command::ConfigChannels {
            voltages: voltages.to_vec(),
            base,
        })
    }

    fn config_aux_channels(&mut self, voltages: &[(AuxDacFn, f32)]) -> Result<(), DriverError> {
        self.queue(Command::ConfigAuxChannels(voltages.to_vec()))
    }

    fn config_selectors(&mut self, selectors: &[Channel]) -> Result<(), DriverError> {
        self.queue(Command::ConfigSelectors(selectors.to_vec().into()))
    }

    fn set_logic(&mut self, mask: u32) -> Result<(), DriverError> {
        self.queue(Command::SetLogic(mask))
    }

    fn pulse_one(
        &mut self,
        low: Channel,
        high: Channel,
        voltage: f32,
        nanos: u128,
    ) -> Result<(), DriverError> {
        self.queue(Command::PulseOne {
            low,
            high,
            voltage,
            nanos,
        })
    }

    fn pulse_slice(
        &mut self,
        chan: Channel,
        voltage: f32,
        nanos: u128,
    ) -> Result<(), DriverError> {
        self.queue(Command::PulseSlice {
            chan,
            voltage,
            nanos,
        })
    }

    fn pulse_slice_masked(
        &mut self,
        chan: Channel,
        mask: &[Channel],
        voltage: f32,
        nanos: u128,
    ) -> Result<(), DriverError> {
        self.queue(Command::PulseSliceMasked {
            chan,
            mask: mask.to_vec().into(),
            voltage,
            nanos,
        })
    }

    fn pulse_slice_fast_open(
        &mut self,
        chans: &[(Channel, f32, f32)],
        cl_nanos: &[Option<u128>; NUM_CLUSTERS],
        preset_state: bool,
    ) -> Result<(), DriverError> {
        self.queue(Command::PulseSliceFastOpen {
            chans: chans.to_vec(),
            cl_nanos: *cl_nanos,
            preset_state,
        })
    }

    fn pulse_all(
        &mut self,
        voltage: f32,
        nanos: u128,
        order: BiasOrder,
    ) -> Result<(), DriverError> {
        self.queue(Command::PulseAll {
            voltage,
            nanos,
            order,
        })
    }

    fn generate_ramp(&mut self, ramp: &RampConfig) -> Result<(), DriverError> {
        self.queue(Command::GenerateRamp(*ramp))
    }

    fn generate_read_train(
        &mut self,
        lows: &[Channel],
        highs: &[Channel],
        vread: f32,
        nreads: usize,
        inter_nanos: u128,
        ground: bool,
    ) -> Result<(), DriverError> {
        self.queue(Command::GenerateReadTrain {
            lows: lows.to_vec().into(),
            highs: highs.to_vec().into(),
            vread,
            nreads,
            inter_nanos,
            ground,
        })
    }

    fn generate_vread_train(
        &mut self,
        chans: &[Channel],
        averaging: bool,
        npulses: usize,
        inter_nanos: u128,
    ) -> Result<(), DriverError> {
        self.queue(Command::GenerateVReadTrain {
            chans: chans.to_vec().into(),
            averaging,
            npulses,
            inter_nanos,
        })
    }

    fn read_train(
        &mut self,
        low: Channel,
        high: Channel,
        vread: f32,
        interpulse: u128,
        preload: Option<f32>,
        condition: WaitFor,
    ) -> Result<(), DriverError> {
        self.queue(Command::ReadTrain {
            low,
            high,
            vread,
            interpulse,
            preload,
            condition,
        })
    }

    fn execute(&mut self) -> Result<(), DriverError> {
        self.record(DriverCall::Execute)
    }
}

impl ResultSource for MockDriver {
    fn pick_one(
        &mut self,
        mode: DataMode,
        rtype: ReadType,
    ) -> Result<Option<Vec<f32>>, DriverError> {
        self.record(DriverCall::PickOne { mode, rtype })?;
        Ok(self.state.lock().results.pop_front())
    }
}

impl Arc2Driver for MockDriver {
    fn read_one(&mut self, low: Channel, high: Channel, vread: f32) -> Result<f32, DriverError> {
        self.record(DriverCall::ReadOne { low, high, vread })?;
        Ok(self.state.lock().read_value)
    }

    fn read_slice(&mut self, chan: Channel, vread: f32) -> Result<Vec<f32>, DriverError> {
        self.respond(DriverCall::ReadSlice { chan, vread }, ARRAY_DIM)
    }

    fn read_slice_masked(
        &mut self,
        chan: Channel,
        mask: &[Channel],
        vread: f32,
    ) -> Result<Vec<f32>, DriverError> {
        let call = DriverCall::ReadSliceMasked {
            chan,
            mask: mask.to_vec().into(),
            vread,
        };
        self.masked(call, mask)
    }

    fn read_all(&mut self, vread: f32, order: BiasOrder) -> Result<Vec<f32>, DriverError> {
        self.respond(DriverCall::ReadAll { vread, order }, ARRAY_DIM * ARRAY_DIM)
    }

    fn read_slice_open(
        &mut self,
        highs: &[Channel],
        ground_after: bool,
    ) -> Result<Vec<f32>, DriverError> {
        let call = DriverCall::ReadSliceOpen {
            highs: highs.to_vec().into(),
            ground_after,
        };
        self.respond(call, highs.len())
    }

    fn pulseread_one(
        &mut self,
        low: Channel,
        high: Channel,
        vpulse: f32,
        nanos: u128,
        vread: f32,
    ) -> Result<f32, DriverError> {
        self.record(DriverCall::PulseReadOne {
            low,
            high,
            vpulse,
            nanos,
            vread,
        })?;
        Ok(self.state.lock().read_value)
    }

    fn pulseread_slice(
        &mut self,
        chan: Channel,
        vpulse: f32,
        nanos: u128,
        vread: f32,
    ) -> Result<Vec<f32>, DriverError> {
        let call = DriverCall::PulseReadSlice {
            chan,
            vpulse,
            nanos,
            vread,
        };
        self.respond(call, ARRAY_DIM)
    }

    fn pulseread_slice_masked(
        &mut self,
        chan: Channel,
        mask: &[Channel],
        vpulse: f32,
        nanos: u128,
        vread: f32,
    ) -> Result<Vec<f32>, DriverError> {
        let call = DriverCall::PulseReadSliceMasked {
            chan,
            mask: mask.to_vec().into(),
            vpulse,
            nanos,
            vread,
        };
        self.masked(call, mask)
    }

    fn pulseread_all(
        &mut self,
        vpulse: f32,
        nanos: u128,
        vread: f32,
        order: BiasOrder,
    ) -> Result<Vec<f32>, DriverError> {
        let call = DriverCall::PulseReadAll {
            vpulse,
            nanos,
            vread,
            order,
        };
        self.respond(call, ARRAY_DIM * ARRAY_DIM)
    }

    fn vread_channels(
        &mut self,
        chans: &[Channel],
        averaging: bool,
    ) -> Result<Vec<f32>, DriverError> {
        let call = DriverCall::VReadChannels {
            chans: chans.to_vec().into(),
            averaging,
        };
        self.respond(call, chans.len())
    }

    fn currents_from_address(
        &mut self,
        addr: u32,
        chans: &[Channel],
    ) -> Result<Vec<f32>, DriverError> {
        let call = DriverCall::CurrentsFromAddress {
            addr,
            chans: chans.to_vec().into(),
        };
        self.respond(call, arc2_protocol::NUM_CHANNELS)
    }

    fn word_currents_from_address(&mut self, addr: u32) -> Result<Vec<f32>, DriverError> {
        self.respond(DriverCall::WordCurrentsFromAddress(addr), ARRAY_DIM)
    }

    fn bit_currents_from_address(&mut self, addr: u32) -> Result<Vec<f32>, DriverError> {
        self.respond(DriverCall::BitCurrentsFromAddress(addr), ARRAY_DIM)
    }

    fn set_control_mode(&mut self, mode: ControlMode) -> Result<(), DriverError> {
        self.record(DriverCall::SetControlMode(mode))?;
        self.state.lock().control_mode = Some(mode);
        Ok(())
    }

    fn busy(&self) -> Result<bool, DriverError> {
        self.record(DriverCall::Busy)?;
        Ok(self.state.lock().busy)
    }

    fn wait(&mut self) -> Result<(), DriverError> {
        self.record(DriverCall::Wait)?;
        self.state.lock().busy = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_results_are_fifo() {
        let mut driver = MockDriver::new();
        driver.push_result(vec![1.0]);
        driver.push_result(vec![2.0]);

        let first = driver.pick_one(DataMode::All, ReadType::Current).unwrap();
        let second = driver.pick_one(DataMode::All, ReadType::Current).unwrap();
        let third = driver.pick_one(DataMode::All, ReadType::Current).unwrap();

        assert_eq!(first, Some(vec![1.0]));
        assert_eq!(second, Some(vec![2.0]));
        assert_eq!(third, None);
        assert_eq!(driver.log().len(), 3);
    }

    #[test]
    fn test_clones_share_state() {
        let handle = MockDriver::new();
        let mut driver = handle.clone();
        driver.ground_all().unwrap();
        handle.push_result(vec![0.5]);

        assert_eq!(handle.log().names(), vec!["ground_all"]);
        assert_eq!(driver.pending_results(), 1);
    }

    #[test]
    fn test_fault_is_one_shot() {
        let mut driver = MockDriver::new();
        driver.fail_next("execute", DriverError::Disconnected);

        assert_eq!(driver.execute(), Err(DriverError::Disconnected));
        assert_eq!(driver.execute(), Ok(()));
        // 失败的调用也会被记录
        assert_eq!(driver.log().names(), vec!["execute", "execute"]);
    }

    #[test]
    fn test_masked_read_marks_unselected_nan() {
        let mut driver = MockDriver::new();
        driver.set_read_value(1.5);
        let data = driver.read_slice_masked(0, &[2, 5], 0.2).unwrap();
        assert_eq!(data.len(), ARRAY_DIM);
        assert_eq!(data[2], 1.5);
        assert_eq!(data[5], 1.5);
        assert!(data[0].is_nan());
    }

    #[test]
    fn test_control_mode_and_busy() {
        let mut driver = MockDriver::new();
        driver.set_busy(true);
        assert!(driver.busy().unwrap());
        driver.wait().unwrap();
        assert!(!driver.busy().unwrap());

        driver.set_control_mode(ControlMode::Header).unwrap();
        assert_eq!(driver.control_mode(), Some(ControlMode::Header));
    }

    #[test]
    fn test_preset_response_overrides_default() {
        let mut driver = MockDriver::new();
        driver.push_response(vec![1.0, 2.0, 3.0]);
        assert_eq!(driver.read_all(0.2, BiasOrder::Rows).unwrap().len(), 3);
        assert_eq!(
            driver.read_all(0.2, BiasOrder::Rows).unwrap().len(),
            ARRAY_DIM * ARRAY_DIM
        );
    }
}
