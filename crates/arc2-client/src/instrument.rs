//! 仪器门面
//!
//! [`Instrument`] 持有驱动句柄，转发仪器的完整命令集合。所有接受通道/掩码/地址向量的调用
//! 在到达驱动之前都先经过规范化。
//!
//! 排队类操作通过 [`CommandSequence`] 构造，再用 [`Instrument::submit`] 一次性提交；
//! 立即类操作直接调用驱动并返回 `ndarray` 数组。
//!
//! # 并发
//!
//! 门面只有一个所有者，所有修改驱动状态的方法都需要 `&mut self`。
//! 需要跨线程共享时由调用者自行加锁（如 `Mutex<Instrument<D>>`）。
//!
//! # 示例
//!
//! ```rust,ignore
//! use arc2_client::Instrument;
//! use arc2_protocol::{DataMode, IdleMode, ReadAt, ReadAfter, RampConfig};
//!
//! let mut arc2 = Instrument::new(driver);
//! let ramp = RampConfig::new(3, 20, 0.0, 0.1, 1.0)
//!     .with_read(ReadAt::Arb(0.2), ReadAfter::Pulse);
//! arc2.submit(arc2.sequence().generate_ramp(ramp))?;
//! arc2.wait()?;
//!
//! for batch in arc2.get_iter(DataMode::All, None) {
//!     let batch = batch?;
//!     // ...
//! }
//! arc2.finalise(Some(IdleMode::Float), None)?;
//! ```

use crate::config::{IdleConfig, ResultsConfig};
use crate::idle::IdleStateController;
use crate::results::{ResultIterator, ResultRecord};
use crate::Arc2Error;
use arc2_driver::{Arc2Driver, CommandSequence, DriverError};
use arc2_protocol::{
    ARRAY_DIM, BiasOrder, Channel, ControlMode, DataMode, IdleMode, IntoChannelSet, RawMode,
    ReadType,
};
use ndarray::{Array1, Array2};

/// 仪器门面
pub struct Instrument<D: Arc2Driver> {
    driver: D,
}

impl<D: Arc2Driver> Instrument<D> {
    pub fn new(driver: D) -> Self {
        Self { driver }
    }

    pub fn inner(&self) -> &D {
        &self.driver
    }

    pub fn inner_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn into_inner(self) -> D {
        self.driver
    }

    // ==================== 排队类操作 ====================

    /// 新建空命令序列
    pub fn sequence(&self) -> CommandSequence {
        CommandSequence::new()
    }

    /// 提交命令序列（按顺序写入全部命令，然后 `execute`）
    ///
    /// 返回提交的命令数量。
    pub fn submit(&mut self, sequence: CommandSequence) -> Result<usize, Arc2Error> {
        Ok(sequence.commit(&mut self.driver)?)
    }

    // ==================== 立即读取 ====================

    /// 读取单个交叉点的电流
    pub fn read_one(&mut self, low: Channel, high: Channel, vread: f32) -> Result<f32, Arc2Error> {
        Ok(self.driver.read_one(low, high, vread)?)
    }

    /// 读取以 `chan` 为低电位的整行/列
    pub fn read_slice(&mut self, chan: Channel, vread: f32) -> Result<Array1<f32>, Arc2Error> {
        Ok(Array1::from(self.driver.read_slice(chan, vread)?))
    }

    /// 只读取 `mask` 中的高电位通道，其余为 `NaN`
    pub fn read_slice_masked(
        &mut self,
        chan: Channel,
        mask: impl IntoChannelSet,
        vread: f32,
    ) -> Result<Array1<f32>, Arc2Error> {
        let mask = mask.into_channel_set()?;
        let data = self
            .driver
            .read_slice_masked(chan, mask.as_slice(), vread)?;
        Ok(Array1::from(data))
    }

    /// 读取整个 32×32 阵列
    pub fn read_all(&mut self, vread: f32, order: BiasOrder) -> Result<Array2<f32>, Arc2Error> {
        let data = self.driver.read_all(vread, order)?;
        Ok(to_crossbar(data)?)
    }

    /// 开路读取 `highs` 通道
    ///
    /// `ground_after` 省略时为 `true`。
    pub fn read_slice_open(
        &mut self,
        highs: impl IntoChannelSet,
        ground_after: Option<bool>,
    ) -> Result<Array1<f32>, Arc2Error> {
        let highs = highs.into_channel_set()?;
        let data = self
            .driver
            .read_slice_open(highs.as_slice(), ground_after.unwrap_or(true))?;
        Ok(Array1::from(data))
    }

    pub fn pulseread_one(
        &mut self,
        low: Channel,
        high: Channel,
        vpulse: f32,
        nanos: u128,
        vread: f32,
    ) -> Result<f32, Arc2Error> {
        Ok(self.driver.pulseread_one(low, high, vpulse, nanos, vread)?)
    }

    pub fn pulseread_slice(
        &mut self,
        chan: Channel,
        vpulse: f32,
        nanos: u128,
        vread: f32,
    ) -> Result<Array1<f32>, Arc2Error> {
        let data = self.driver.pulseread_slice(chan, vpulse, nanos, vread)?;
        Ok(Array1::from(data))
    }

    pub fn pulseread_slice_masked(
        &mut self,
        chan: Channel,
        mask: impl IntoChannelSet,
        vpulse: f32,
        nanos: u128,
        vread: f32,
    ) -> Result<Array1<f32>, Arc2Error> {
        let mask = mask.into_channel_set()?;
        let data =
            self.driver
                .pulseread_slice_masked(chan, mask.as_slice(), vpulse, nanos, vread)?;
        Ok(Array1::from(data))
    }

    /// 脉冲后读取整个 32×32 阵列
    pub fn pulseread_all(
        &mut self,
        vpulse: f32,
        nanos: u128,
        vread: f32,
        order: BiasOrder,
    ) -> Result<Array2<f32>, Arc2Error> {
        let data = self.driver.pulseread_all(vpulse, nanos, vread, order)?;
        Ok(to_crossbar(data)?)
    }

    /// 读取通道电压，按通道升序返回
    pub fn vread_channels(
        &mut self,
        chans: impl IntoChannelSet,
        averaging: bool,
    ) -> Result<Array1<f32>, Arc2Error> {
        let chans = chans.into_channel_set()?;
        let data = self.driver.vread_channels(chans.as_slice(), averaging)?;
        Ok(Array1::from(data))
    }

    /// 从指定地址段读取电流；未选中的通道为 `NaN`
    pub fn currents_from_address(
        &mut self,
        addr: u32,
        chans: impl IntoChannelSet,
    ) -> Result<Array1<f32>, Arc2Error> {
        let chans = chans.into_channel_set()?;
        let data = self.driver.currents_from_address(addr, chans.as_slice())?;
        Ok(Array1::from(data))
    }

    pub fn word_currents_from_address(&mut self, addr: u32) -> Result<Array1<f32>, Arc2Error> {
        Ok(Array1::from(self.driver.word_currents_from_address(addr)?))
    }

    pub fn bit_currents_from_address(&mut self, addr: u32) -> Result<Array1<f32>, Arc2Error> {
        Ok(Array1::from(self.driver.bit_currents_from_address(addr)?))
    }

    // ==================== 仪器状态 ====================

    pub fn busy(&self) -> Result<bool, Arc2Error> {
        Ok(self.driver.busy()?)
    }

    /// 阻塞直到仪器空闲
    pub fn wait(&mut self) -> Result<(), Arc2Error> {
        Ok(self.driver.wait()?)
    }

    pub fn set_control_mode(&mut self, mode: ControlMode) -> Result<(), Arc2Error> {
        Ok(self.driver.set_control_mode(mode)?)
    }

    // ==================== 结果缓冲区 ====================

    /// 取出一条结果记录；缓冲区为空时返回 `None`
    pub fn pick_one(
        &mut self,
        mode: DataMode,
        rtype: ReadType,
    ) -> Result<Option<ResultRecord>, Arc2Error> {
        Ok(self.driver.pick_one(mode, rtype)?.map(ResultRecord::new))
    }

    /// 结果迭代器
    ///
    /// `rtype` 省略时为 [`ReadType::Current`]。
    pub fn get_iter(&mut self, mode: DataMode, rtype: Option<ReadType>) -> ResultIterator<'_, D> {
        ResultIterator::new(&mut self.driver, mode, rtype.unwrap_or_default())
    }

    /// 使用配置文件中的 `[results]` 段创建结果迭代器
    pub fn get_iter_configured(&mut self, config: &ResultsConfig) -> ResultIterator<'_, D> {
        ResultIterator::new(&mut self.driver, config.data_mode, config.read_type)
    }

    // ==================== 空闲状态 ====================

    pub fn idle_controller(&mut self) -> IdleStateController<'_, D> {
        IdleStateController::new(&mut self.driver)
    }

    /// 切换到指定空闲模式和控制模式，`None` 表示保持不变
    pub fn finalise(
        &mut self,
        idle: Option<IdleMode>,
        control: Option<ControlMode>,
    ) -> Result<(), Arc2Error> {
        self.idle_controller().finalise(idle, control)
    }

    /// 使用外部来源的未校验模式值切换
    pub fn finalise_raw(
        &mut self,
        idle: Option<&RawMode>,
        control: Option<&RawMode>,
    ) -> Result<(), Arc2Error> {
        self.idle_controller().finalise_raw(idle, control)
    }

    pub fn finalise_configured(&mut self, config: &IdleConfig) -> Result<(), Arc2Error> {
        self.idle_controller().finalise_configured(config)
    }
}

/// 将驱动返回的行优先数据整形为 32×32 阵列
fn to_crossbar(data: Vec<f32>) -> Result<Array2<f32>, DriverError> {
    let actual = data.len();
    Array2::from_shape_vec((ARRAY_DIM, ARRAY_DIM), data).map_err(|_| {
        DriverError::InvalidResponse {
            expected: ARRAY_DIM * ARRAY_DIM,
            actual,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arc2_driver::{Command, DriverCall, MockDriver};
    use arc2_protocol::ChannelSet;
    use ndarray::arr2;

    fn instrument() -> (Instrument<MockDriver>, MockDriver) {
        let driver = MockDriver::new();
        (Instrument::new(driver.clone()), driver)
    }

    #[test]
    fn test_read_all_is_square() {
        let (mut arc2, driver) = instrument();
        driver.push_response((0..1024).map(|i| i as f32).collect());
        let data = arc2.read_all(0.2, BiasOrder::Rows).unwrap();
        assert_eq!(data.dim(), (32, 32));
        assert_eq!(data[[1, 0]], 32.0);
    }

    #[test]
    fn test_read_all_wrong_length_is_invalid_response() {
        let (mut arc2, driver) = instrument();
        driver.push_response(vec![0.0; 10]);
        let err = arc2.pulseread_all(1.0, 1000, 0.2, BiasOrder::Columns).unwrap_err();
        match err {
            Arc2Error::Driver(DriverError::InvalidResponse { expected, actual }) => {
                assert_eq!(expected, 1024);
                assert_eq!(actual, 10);
            },
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_vector_arguments_are_normalized() {
        let (mut arc2, driver) = instrument();
        arc2.vread_channels(vec![3i64, 1], true).unwrap();
        arc2.read_slice_masked(0, 2u32..4, 0.2).unwrap();
        assert_eq!(
            driver.log().snapshot(),
            vec![
                DriverCall::VReadChannels {
                    chans: ChannelSet::from(vec![3, 1]),
                    averaging: true
                },
                DriverCall::ReadSliceMasked {
                    chan: 0,
                    mask: ChannelSet::from(vec![2, 3]),
                    vread: 0.2
                },
            ]
        );
    }

    #[test]
    fn test_invalid_vector_never_reaches_driver() {
        let (mut arc2, driver) = instrument();
        let err = arc2
            .currents_from_address(0x100, arr2(&[[1u32, 2], [3, 4]]))
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(driver.log().is_empty());
    }

    #[test]
    fn test_read_slice_open_defaults_to_ground_after() {
        let (mut arc2, driver) = instrument();
        let data = arc2.read_slice_open([1u8, 2, 3], None).unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(
            driver.log().snapshot(),
            vec![DriverCall::ReadSliceOpen {
                highs: ChannelSet::from(vec![1, 2, 3]),
                ground_after: true
            }]
        );
    }

    #[test]
    fn test_submit_commits_sequence() {
        let (mut arc2, driver) = instrument();
        let seq = arc2
            .sequence()
            .pulse_slice_masked(4, [8u32, 9], 1.5, 1_000)
            .unwrap()
            .set_logic(0xFF);
        assert_eq!(arc2.submit(seq).unwrap(), 2);
        assert_eq!(
            driver.log().names(),
            vec!["pulse_slice_masked", "set_logic", "execute"]
        );
    }

    #[test]
    fn test_pick_one_and_iter_share_cursor() {
        let (mut arc2, driver) = instrument();
        for i in 0..3 {
            driver.push_result(vec![i as f32; 32]);
        }
        let first = arc2.pick_one(DataMode::Words, ReadType::Current).unwrap().unwrap();
        assert_eq!(first.view()[0], 0.0);
        assert_eq!(arc2.get_iter(DataMode::Words, None).count(), 2);
        assert!(arc2.pick_one(DataMode::Words, ReadType::Current).unwrap().is_none());
    }

    #[test]
    fn test_get_iter_defaults_to_current() {
        let (mut arc2, driver) = instrument();
        let _ = arc2.get_iter(DataMode::Bits, None).count();
        assert_eq!(
            driver.log().snapshot(),
            vec![DriverCall::PickOne {
                mode: DataMode::Bits,
                rtype: ReadType::Current
            }]
        );
    }

    /// `[results]` 段决定数据模式和读取类型
    #[test]
    fn test_get_iter_configured_uses_results_section() {
        let (mut arc2, driver) = instrument();
        driver.push_result(vec![0.25; 32]);
        let config = ResultsConfig {
            data_mode: DataMode::Words,
            read_type: ReadType::Voltage,
        };

        let batches: Vec<_> = arc2.get_iter_configured(&config).collect();
        assert_eq!(batches.len(), 1);
        assert_eq!(
            driver.log().snapshot(),
            vec![
                DriverCall::PickOne {
                    mode: DataMode::Words,
                    rtype: ReadType::Voltage
                };
                2
            ]
        );
    }

    #[test]
    fn test_finalise_configured() {
        let (mut arc2, driver) = instrument();
        let config = IdleConfig {
            mode: Some(RawMode::from("soft-gnd")),
            control: None,
        };
        arc2.finalise_configured(&config).unwrap();
        assert_eq!(
            driver.log().snapshot()[1],
            DriverCall::Queue(Command::GroundAll)
        );
    }
}
