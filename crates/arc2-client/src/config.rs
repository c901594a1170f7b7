//! # 仪器配置
//!
//! 从 TOML 加载的空闲状态与结果读取配置。
//!
//! ```toml
//! [idle]
//! mode = "soft-gnd"     # 或整数代码：1 = float, 2 = soft-gnd, 3 = hard-gnd
//! control = "internal"  # 或整数代码：0 = internal, 1 = header
//!
//! [results]
//! data_mode = "all"
//! read_type = "current"
//! ```
//!
//! `[idle]` 中的值在加载时不做校验，在切换时才校验，
//! 以保证非法控制模式不会阻止合法的通道切换。

use arc2_protocol::{DataMode, RawMode, ReadType};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// 仪器配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentConfig {
    /// 空闲状态
    pub idle: IdleConfig,

    /// 结果读取
    pub results: ResultsConfig,
}

impl InstrumentConfig {
    /// 创建默认配置（不切换空闲状态，读取全部通道电流）
    pub fn default_config() -> Self {
        Self::default()
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// 从文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// 空闲状态配置
///
/// 两个字段都可以省略，省略表示保持不变。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdleConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<RawMode>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub control: Option<RawMode>,
}

/// 结果读取配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultsConfig {
    pub data_mode: DataMode,
    pub read_type: ReadType,
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self {
            data_mode: DataMode::All,
            read_type: ReadType::Current,
        }
    }
}
