//! 模式类型定义
//!
//! 空闲模式、控制模式以及结果读取模式。
//!
//! 编译期构造的值都是穷尽的枚举；只有来自外部（配置文件、整数代码、字符串）
//! 的值才经过 [`RawMode`] 的运行时校验路径。

use crate::{ArgumentError, canonical_name};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// 空闲模式
// ============================================================================

/// 空闲模式：操作完成后所有通道应处于的电气状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, num_enum::IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[repr(u8)]
pub enum IdleMode {
    /// 浮空：通道与 DAC 断开
    Float = 0b01,
    /// 软接地：DAC 驱动到 0 V
    SoftGnd = 0b10,
    /// 硬接地：通道直接连接到地
    HardGnd = 0b11,
}

impl IdleMode {
    pub const ALL: [IdleMode; 3] = [IdleMode::Float, IdleMode::SoftGnd, IdleMode::HardGnd];

    pub fn name(self) -> &'static str {
        match self {
            IdleMode::Float => "float",
            IdleMode::SoftGnd => "soft-gnd",
            IdleMode::HardGnd => "hard-gnd",
        }
    }
}

impl TryFrom<u8> for IdleMode {
    type Error = ArgumentError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0b01 => Ok(IdleMode::Float),
            0b10 => Ok(IdleMode::SoftGnd),
            0b11 => Ok(IdleMode::HardGnd),
            _ => Err(ArgumentError::InvalidIdleMode(value.to_string())),
        }
    }
}

impl FromStr for IdleMode {
    type Err = ArgumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match canonical_name(s).as_str() {
            "float" => Ok(IdleMode::Float),
            "softgnd" => Ok(IdleMode::SoftGnd),
            "hardgnd" => Ok(IdleMode::HardGnd),
            _ => Err(ArgumentError::InvalidIdleMode(s.to_string())),
        }
    }
}

impl fmt::Display for IdleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// 控制模式
// ============================================================================

/// 控制模式：板级信号路由（排针 / 内部电路），与通道电气状态无关
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, num_enum::IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[repr(u8)]
pub enum ControlMode {
    /// 内部电路
    Internal = 0,
    /// 外部排针
    Header = 1,
}

impl ControlMode {
    pub fn name(self) -> &'static str {
        match self {
            ControlMode::Internal => "internal",
            ControlMode::Header => "header",
        }
    }
}

impl TryFrom<u8> for ControlMode {
    type Error = ArgumentError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ControlMode::Internal),
            1 => Ok(ControlMode::Header),
            _ => Err(ArgumentError::InvalidControlMode(value.to_string())),
        }
    }
}

impl FromStr for ControlMode {
    type Err = ArgumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match canonical_name(s).as_str() {
            "internal" => Ok(ControlMode::Internal),
            "header" => Ok(ControlMode::Header),
            _ => Err(ArgumentError::InvalidControlMode(s.to_string())),
        }
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// 结果读取模式
// ============================================================================

/// 结果记录的数据子集
///
/// - `Words` / `Bits`: 字线 / 位线对应的 32 个通道
/// - `All`: 全部 64 个通道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, num_enum::IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[repr(u8)]
pub enum DataMode {
    Words = 0,
    Bits = 1,
    All = 2,
}

impl DataMode {
    /// 该模式下单条记录的样本数
    pub fn record_len(self) -> usize {
        match self {
            DataMode::Words | DataMode::Bits => crate::RECORD_LEN_HALF,
            DataMode::All => crate::RECORD_LEN_ALL,
        }
    }
}

impl FromStr for DataMode {
    type Err = ArgumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match canonical_name(s).as_str() {
            "words" => Ok(DataMode::Words),
            "bits" => Ok(DataMode::Bits),
            "all" => Ok(DataMode::All),
            _ => Err(ArgumentError::InvalidDataMode(s.to_string())),
        }
    }
}

impl fmt::Display for DataMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DataMode::Words => "words",
            DataMode::Bits => "bits",
            DataMode::All => "all",
        })
    }
}

/// 结果记录的解码方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, num_enum::IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[repr(u8)]
pub enum ReadType {
    /// 解码为电流（默认）
    #[default]
    Current = 0,
    /// 解码为电压
    Voltage = 1,
}

impl FromStr for ReadType {
    type Err = ArgumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match canonical_name(s).as_str() {
            "current" => Ok(ReadType::Current),
            "voltage" => Ok(ReadType::Voltage),
            _ => Err(ArgumentError::InvalidReadType(s.to_string())),
        }
    }
}

impl fmt::Display for ReadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReadType::Current => "current",
            ReadType::Voltage => "voltage",
        })
    }
}

// ============================================================================
// 未校验的模式值
// ============================================================================

/// 来自外部输入的未校验模式值
///
/// 配置文件中既可以写整数代码（`mode = 3`），也可以写名称（`mode = "hard-gnd"`）。
/// 反序列化时不做校验，由调用者在合适的时机转换为 [`IdleMode`] / [`ControlMode`]，
/// 以便空闲模式和控制模式的校验可以分先后进行。
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum RawMode {
    Code(u8),
    Name(String),
}

impl RawMode {
    pub fn to_idle_mode(&self) -> Result<IdleMode, ArgumentError> {
        match self {
            RawMode::Code(code) => IdleMode::try_from(*code),
            RawMode::Name(name) => name.parse(),
        }
    }

    pub fn to_control_mode(&self) -> Result<ControlMode, ArgumentError> {
        match self {
            RawMode::Code(code) => ControlMode::try_from(*code),
            RawMode::Name(name) => name.parse(),
        }
    }
}

impl fmt::Display for RawMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawMode::Code(code) => write!(f, "{}", code),
            RawMode::Name(name) => f.write_str(name),
        }
    }
}

impl From<u8> for RawMode {
    fn from(code: u8) -> Self {
        RawMode::Code(code)
    }
}

impl From<&str> for RawMode {
    fn from(name: &str) -> Self {
        RawMode::Name(name.to_string())
    }
}

impl From<IdleMode> for RawMode {
    fn from(mode: IdleMode) -> Self {
        RawMode::Code(mode.into())
    }
}

impl From<ControlMode> for RawMode {
    fn from(mode: ControlMode) -> Self {
        RawMode::Code(mode.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_mode_codes() {
        assert_eq!(u8::from(IdleMode::Float), 0b01);
        assert_eq!(u8::from(IdleMode::SoftGnd), 0b10);
        assert_eq!(u8::from(IdleMode::HardGnd), 0b11);
        for mode in IdleMode::ALL {
            assert_eq!(IdleMode::try_from(u8::from(mode)).unwrap(), mode);
        }
    }

    #[test]
    fn test_idle_mode_invalid_code() {
        let err = IdleMode::try_from(0).unwrap_err();
        assert_eq!(err, ArgumentError::InvalidIdleMode("0".to_string()));
        assert!(IdleMode::try_from(4).is_err());
    }

    #[test]
    fn test_idle_mode_parse() {
        assert_eq!("Float".parse::<IdleMode>().unwrap(), IdleMode::Float);
        assert_eq!("soft_gnd".parse::<IdleMode>().unwrap(), IdleMode::SoftGnd);
        assert_eq!("SoftGnd".parse::<IdleMode>().unwrap(), IdleMode::SoftGnd);
        assert_eq!("hard-gnd".parse::<IdleMode>().unwrap(), IdleMode::HardGnd);
        assert!("grounded".parse::<IdleMode>().is_err());
    }

    #[test]
    fn test_idle_mode_display_parses_back() {
        for mode in IdleMode::ALL {
            assert_eq!(mode.to_string().parse::<IdleMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_control_mode() {
        assert_eq!(u8::from(ControlMode::Internal), 0);
        assert_eq!(u8::from(ControlMode::Header), 1);
        assert_eq!(ControlMode::try_from(1).unwrap(), ControlMode::Header);
        assert_eq!("HEADER".parse::<ControlMode>().unwrap(), ControlMode::Header);
        let err = ControlMode::try_from(2).unwrap_err();
        assert!(err.to_string().starts_with("invalid control mode"));
    }

    #[test]
    fn test_data_mode() {
        assert_eq!(DataMode::All.record_len(), 64);
        assert_eq!(DataMode::Words.record_len(), 32);
        assert_eq!(DataMode::Bits.record_len(), 32);
        assert_eq!("bits".parse::<DataMode>().unwrap(), DataMode::Bits);
        assert!(matches!(
            "rows".parse::<DataMode>(),
            Err(ArgumentError::InvalidDataMode(_))
        ));
    }

    #[test]
    fn test_read_type_default() {
        assert_eq!(ReadType::default(), ReadType::Current);
        assert_eq!("Voltage".parse::<ReadType>().unwrap(), ReadType::Voltage);
        assert!(matches!(
            "power".parse::<ReadType>(),
            Err(ArgumentError::InvalidReadType(_))
        ));
    }

    #[test]
    fn test_raw_mode_conversion() {
        assert_eq!(RawMode::Code(3).to_idle_mode().unwrap(), IdleMode::HardGnd);
        assert_eq!(
            RawMode::from("soft-gnd").to_idle_mode().unwrap(),
            IdleMode::SoftGnd
        );
        assert_eq!(
            RawMode::from(ControlMode::Header).to_control_mode().unwrap(),
            ControlMode::Header
        );
        assert!(RawMode::Code(9).to_idle_mode().is_err());
        assert!(RawMode::from("sideways").to_control_mode().is_err());
        // 同一个代码在两个枚举中含义不同
        assert_eq!(RawMode::Code(1).to_idle_mode().unwrap(), IdleMode::Float);
        assert_eq!(
            RawMode::Code(1).to_control_mode().unwrap(),
            ControlMode::Header
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_raw_mode_untagged_serde() {
        let code: RawMode = serde_json::from_str("3").unwrap();
        assert_eq!(code, RawMode::Code(3));
        let name: RawMode = serde_json::from_str("\"float\"").unwrap();
        assert_eq!(name, RawMode::Name("float".to_string()));
        let mode: IdleMode = serde_json::from_str("\"soft-gnd\"").unwrap();
        assert_eq!(mode, IdleMode::SoftGnd);
    }
}
