//! 空闲状态控制
//!
//! 将所有通道和板级控制路由切换到调用者指定的终态。
//!
//! 软件不记录仪器的实际状态，每次调用都无条件重新下发目标模式的完整序列，
//! 每个序列作为一个批次一次性提交，不与其他命令交错。
//!
//! | 空闲模式 | 原语序列 |
//! |---|---|
//! | `Float` | `connect_to_gnd(∅)` → `ground_all_fast` → `float_all` → `execute` |
//! | `SoftGnd` | `connect_to_gnd(∅)` → `ground_all` → `execute` |
//! | `HardGnd` | `ground_all_fast` → `float_all` → `connect_to_gnd(0..64)` → `execute` |
//! | `None` | 不调用任何原语 |
//!
//! 通道序列提交之后，如果给定了控制模式，再调用 `set_control_mode`。
//!
//! # 失败语义
//!
//! 没有回滚。切换失败后，已经执行的子步骤留下的硬件状态保持不变，
//! 调用者应将电气状态视为未定义并重新下发。

use crate::Arc2Error;
use crate::config::IdleConfig;
use arc2_driver::{Arc2Driver, Command, CommandSequence};
use arc2_protocol::{ChannelSet, ControlMode, IdleMode, RawMode};
use tracing::{info, warn};

/// 空闲状态控制器
///
/// 每次调用无状态，只借用驱动。
pub struct IdleStateController<'a, D: Arc2Driver + ?Sized> {
    driver: &'a mut D,
}

impl<'a, D: Arc2Driver + ?Sized> IdleStateController<'a, D> {
    pub fn new(driver: &'a mut D) -> Self {
        Self { driver }
    }

    /// 目标空闲模式对应的命令序列（不含提交）
    pub fn sequence_for(mode: IdleMode) -> CommandSequence {
        match mode {
            // 空集合上的 connect_to_gnd 清除残留的硬接地
            IdleMode::Float => CommandSequence::new()
                .push(Command::ConnectToGnd(ChannelSet::empty()))
                .ground_all_fast()
                .float_all(),
            IdleMode::SoftGnd => CommandSequence::new()
                .push(Command::ConnectToGnd(ChannelSet::empty()))
                .ground_all(),
            IdleMode::HardGnd => CommandSequence::new()
                .ground_all_fast()
                .float_all()
                .push(Command::ConnectToGnd(ChannelSet::all())),
        }
    }

    /// 切换到指定空闲模式和控制模式
    ///
    /// `None` 表示保持不变。
    pub fn finalise(
        &mut self,
        idle: Option<IdleMode>,
        control: Option<ControlMode>,
    ) -> Result<(), Arc2Error> {
        self.transition(idle)?;
        self.apply_control(control)
    }

    /// 使用未校验的模式值切换
    ///
    /// 校验顺序：
    /// 1. 空闲模式非法 → 返回错误，不调用任何原语
    /// 2. 空闲模式合法 → 通道序列提交到硬件
    /// 3. 控制模式非法 → 返回错误，第 2 步的效果保留
    pub fn finalise_raw(
        &mut self,
        idle: Option<&RawMode>,
        control: Option<&RawMode>,
    ) -> Result<(), Arc2Error> {
        let idle = idle.map(RawMode::to_idle_mode).transpose()?;
        self.transition(idle)?;

        let control = match control.map(RawMode::to_control_mode).transpose() {
            Ok(control) => control,
            Err(e) => {
                if let Some(mode) = idle {
                    warn!(
                        "Control mode rejected after idle transition to {} was committed: {}",
                        mode, e
                    );
                }
                return Err(e.into());
            },
        };
        self.apply_control(control)
    }

    /// 使用配置文件中的 `[idle]` 段切换
    pub fn finalise_configured(&mut self, config: &IdleConfig) -> Result<(), Arc2Error> {
        self.finalise_raw(config.mode.as_ref(), config.control.as_ref())
    }

    fn transition(&mut self, idle: Option<IdleMode>) -> Result<(), Arc2Error> {
        let Some(mode) = idle else {
            return Ok(());
        };

        info!("Idle transition: {}", mode);
        Self::sequence_for(mode).commit(&mut *self.driver)?;
        Ok(())
    }

    fn apply_control(&mut self, control: Option<ControlMode>) -> Result<(), Arc2Error> {
        if let Some(mode) = control {
            info!("Control mode set to: {}", mode);
            self.driver.set_control_mode(mode)?;
        }
        Ok(())
    }
}
