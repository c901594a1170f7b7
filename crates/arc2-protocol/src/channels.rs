//! 通道集合与输入规范化
//!
//! 底层驱动会把通道/掩码/地址向量直接拷贝进固定大小的硬件命令缓冲区，
//! 因此所有向量参数在到达驱动之前都必须被规范化为一维、固定宽度的无符号整数数组。
//!
//! # 接受的输入
//!
//! | 输入 | 结果 |
//! |---|---|
//! | [`ChannelSet`] | 原样通过 |
//! | `Vec<T>` / `&[T]` / `[T; N]` / `Range<T>`（`T` 为任意整数类型） | 按顺序逐元素转换 |
//! | 一维 `ndarray` 数组 | 按顺序逐元素转换 |
//! | 多维 `ndarray` 数组 | `ArgumentError::DimensionMismatch` |
//! | 0 维 `ndarray` 数组（标量） | `ArgumentError::NotAnIntegerSequence` |
//! | 负数或超出 `usize` 的元素 | `ArgumentError::NotAnIntegerSequence` |
//! | `None`（通过 [`normalize_optional`]） | 原样返回 `None` |
//!
//! 字符串不实现 [`IntoChannelSet`]，在编译期即被拒绝，不会被逐字符迭代。
//!
//! 不做去重：重复的通道号原样保留。
//!
//! # 示例
//!
//! ```rust
//! use arc2_protocol::{normalize, ChannelSet};
//!
//! let chans = normalize(vec![3u32, 1, 3]).unwrap();
//! assert_eq!(chans.as_slice(), &[3, 1, 3]);
//!
//! let all = normalize(0..64usize).unwrap();
//! assert_eq!(all, ChannelSet::all());
//! ```

use crate::ArgumentError;
use crate::constants::NUM_CHANNELS;
use ndarray::{Array1, ArrayBase, Data, Dimension};
use std::ops::{Range, RangeInclusive};

/// 规范化后的通道号类型（固定宽度无符号整数）
pub type Channel = usize;

/// 规范化的通道集合
///
/// 有序、一维、元素为 [`Channel`]。由调用者在每次调用时构造，不做持久化。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct ChannelSet {
    channels: Vec<Channel>,
}

impl ChannelSet {
    /// 空集合
    ///
    /// 与 `connect_to_gnd` 配合使用时表示“清除所有硬接地”。
    pub fn empty() -> Self {
        Self {
            channels: Vec::new(),
        }
    }

    /// 全部 [`NUM_CHANNELS`] 个通道，升序
    pub fn all() -> Self {
        (0..NUM_CHANNELS).collect()
    }

    pub fn as_slice(&self) -> &[Channel] {
        &self.channels
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    /// 转换为一维 `ndarray` 数组
    pub fn to_array(&self) -> Array1<Channel> {
        Array1::from(self.channels.clone())
    }

    pub fn into_vec(self) -> Vec<Channel> {
        self.channels
    }
}

impl FromIterator<Channel> for ChannelSet {
    fn from_iter<I: IntoIterator<Item = Channel>>(iter: I) -> Self {
        Self {
            channels: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<Channel>> for ChannelSet {
    fn from(channels: Vec<Channel>) -> Self {
        Self { channels }
    }
}

impl From<ChannelSet> for Array1<Channel> {
    fn from(set: ChannelSet) -> Self {
        Array1::from(set.channels)
    }
}

impl AsRef<[Channel]> for ChannelSet {
    fn as_ref(&self) -> &[Channel] {
        &self.channels
    }
}

// ==================== 元素转换 ====================

/// 可以转换为 [`Channel`] 的整数类型
pub trait ChannelIndex: Copy {
    /// 转换为无符号通道号；负数或超出 `usize` 范围的值返回错误
    fn to_channel(self) -> Result<Channel, ArgumentError>;
}

macro_rules! impl_channel_index {
    ($($t:ty),* $(,)?) => {
        $(
            impl ChannelIndex for $t {
                #[inline]
                fn to_channel(self) -> Result<Channel, ArgumentError> {
                    Channel::try_from(self).map_err(|_| ArgumentError::NotAnIntegerSequence {
                        detail: format!("element {} is not a valid unsigned channel index", self),
                    })
                }
            }
        )*
    };
}

impl_channel_index!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

fn collect_channels<T, I>(iter: I) -> Result<ChannelSet, ArgumentError>
where
    T: ChannelIndex,
    I: IntoIterator<Item = T>,
{
    iter.into_iter()
        .map(ChannelIndex::to_channel)
        .collect::<Result<Vec<_>, _>>()
        .map(ChannelSet::from)
}

// ==================== InputNormalizer ====================

/// 可以规范化为 [`ChannelSet`] 的参数
pub trait IntoChannelSet {
    fn into_channel_set(self) -> Result<ChannelSet, ArgumentError>;
}

impl IntoChannelSet for ChannelSet {
    fn into_channel_set(self) -> Result<ChannelSet, ArgumentError> {
        Ok(self)
    }
}

impl IntoChannelSet for &ChannelSet {
    fn into_channel_set(self) -> Result<ChannelSet, ArgumentError> {
        Ok(self.clone())
    }
}

impl<T: ChannelIndex> IntoChannelSet for Vec<T> {
    fn into_channel_set(self) -> Result<ChannelSet, ArgumentError> {
        collect_channels(self)
    }
}

impl<T: ChannelIndex> IntoChannelSet for &Vec<T> {
    fn into_channel_set(self) -> Result<ChannelSet, ArgumentError> {
        collect_channels(self.iter().copied())
    }
}

impl<T: ChannelIndex> IntoChannelSet for &[T] {
    fn into_channel_set(self) -> Result<ChannelSet, ArgumentError> {
        collect_channels(self.iter().copied())
    }
}

impl<T: ChannelIndex, const N: usize> IntoChannelSet for [T; N] {
    fn into_channel_set(self) -> Result<ChannelSet, ArgumentError> {
        collect_channels(self)
    }
}

impl<T: ChannelIndex, const N: usize> IntoChannelSet for &[T; N] {
    fn into_channel_set(self) -> Result<ChannelSet, ArgumentError> {
        collect_channels(self.iter().copied())
    }
}

impl<T> IntoChannelSet for Range<T>
where
    T: ChannelIndex,
    Range<T>: Iterator<Item = T>,
{
    fn into_channel_set(self) -> Result<ChannelSet, ArgumentError> {
        collect_channels(self)
    }
}

impl<T> IntoChannelSet for RangeInclusive<T>
where
    T: ChannelIndex,
    RangeInclusive<T>: Iterator<Item = T>,
{
    fn into_channel_set(self) -> Result<ChannelSet, ArgumentError> {
        collect_channels(self)
    }
}

impl<S, D, T> IntoChannelSet for ArrayBase<S, D>
where
    S: Data<Elem = T>,
    D: Dimension,
    T: ChannelIndex,
{
    fn into_channel_set(self) -> Result<ChannelSet, ArgumentError> {
        (&self).into_channel_set()
    }
}

impl<S, D, T> IntoChannelSet for &ArrayBase<S, D>
where
    S: Data<Elem = T>,
    D: Dimension,
    T: ChannelIndex,
{
    fn into_channel_set(self) -> Result<ChannelSet, ArgumentError> {
        match self.ndim() {
            0 => Err(ArgumentError::NotAnIntegerSequence {
                detail: "got a 0-dimensional scalar".to_string(),
            }),
            // 逻辑顺序迭代，与内存布局无关
            1 => collect_channels(self.iter().copied()),
            actual => Err(ArgumentError::DimensionMismatch {
                expected: 1,
                actual,
            }),
        }
    }
}

/// 规范化一个通道/掩码/地址向量参数
///
/// 纯函数，无副作用。
pub fn normalize<A: IntoChannelSet>(arg: A) -> Result<ChannelSet, ArgumentError> {
    arg.into_channel_set()
}

/// 规范化一个可缺省的向量参数
///
/// `None` 原样返回，由调用者解释为“使用默认值/省略”。
pub fn normalize_optional<A: IntoChannelSet>(
    arg: Option<A>,
) -> Result<Option<ChannelSet>, ArgumentError> {
    arg.map(IntoChannelSet::into_channel_set).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, IxDyn, arr0, arr1, arr2};
    use proptest::prelude::*;

    #[test]
    fn test_canonical_passes_through() {
        let set = ChannelSet::from(vec![5, 1, 5]);
        let normalized = normalize(set.clone()).unwrap();
        assert_eq!(normalized, set);
    }

    #[test]
    fn test_vec_and_slices() {
        assert_eq!(normalize(vec![1u8, 2, 3]).unwrap().as_slice(), &[1, 2, 3]);
        assert_eq!(normalize(&[9i32, 0][..]).unwrap().as_slice(), &[9, 0]);
        assert_eq!(normalize([7u64, 7]).unwrap().as_slice(), &[7, 7]);
        let v = vec![4i64, 2];
        assert_eq!(normalize(&v).unwrap().as_slice(), &[4, 2]);
    }

    #[test]
    fn test_empty_input_is_empty_set() {
        let empty: [u32; 0] = [];
        let set = normalize(empty).unwrap();
        assert!(set.is_empty());
        assert_eq!(set, ChannelSet::empty());
    }

    #[test]
    fn test_ranges() {
        assert_eq!(normalize(0..64usize).unwrap(), ChannelSet::all());
        assert_eq!(normalize(0u32..=2).unwrap().as_slice(), &[0, 1, 2]);
    }

    #[test]
    fn test_one_dimensional_array() {
        let arr = arr1(&[10u64, 20, 30]);
        assert_eq!(normalize(&arr).unwrap().as_slice(), &[10, 20, 30]);
        assert_eq!(normalize(arr).unwrap().as_slice(), &[10, 20, 30]);
    }

    /// 带步长的视图按逻辑顺序展开，而不是内存顺序
    #[test]
    fn test_strided_view_keeps_logical_order() {
        let arr = arr1(&[0u32, 1, 2, 3, 4, 5]);
        let view = arr.slice(ndarray::s![..;-2]);
        assert_eq!(normalize(view).unwrap().as_slice(), &[5, 3, 1]);
    }

    #[test]
    fn test_two_dimensional_rejected() {
        let arr = arr2(&[[1u64, 2], [3, 4]]);
        let err = normalize(&arr).unwrap_err();
        assert_eq!(
            err,
            ArgumentError::DimensionMismatch {
                expected: 1,
                actual: 2
            }
        );
    }

    /// `IxDyn` 数组的维度在运行时检查
    #[test]
    fn test_dynamic_dimension_checked_at_runtime() {
        let arr = Array::<u32, _>::zeros(IxDyn(&[2, 2, 2]));
        let err = normalize(arr).unwrap_err();
        assert!(matches!(
            err,
            ArgumentError::DimensionMismatch {
                expected: 1,
                actual: 3
            }
        ));

        let flat = Array::<u32, _>::zeros(IxDyn(&[4]));
        assert_eq!(normalize(flat).unwrap().len(), 4);
    }

    #[test]
    fn test_scalar_rejected() {
        let err = normalize(arr0(5u64)).unwrap_err();
        assert!(matches!(err, ArgumentError::NotAnIntegerSequence { .. }));
        assert!(err.to_string().contains("iterable of integers"));
    }

    #[test]
    fn test_negative_element_rejected() {
        let err = normalize(vec![1i32, -1]).unwrap_err();
        assert!(matches!(err, ArgumentError::NotAnIntegerSequence { .. }));
        assert!(err.to_string().contains("-1"));
    }

    /// 超出 64 的通道号不在这里拒绝，交给驱动处理
    #[test]
    fn test_out_of_range_channel_passes() {
        // 范围检查由驱动负责
        assert_eq!(normalize(vec![64u32, 1000]).unwrap().as_slice(), &[64, 1000]);
    }

    #[test]
    fn test_optional() {
        assert_eq!(normalize_optional(None::<Vec<u32>>).unwrap(), None);
        assert_eq!(
            normalize_optional(Some(vec![2u16])).unwrap(),
            Some(ChannelSet::from(vec![2]))
        );
        assert!(normalize_optional(Some(arr2(&[[1u8]]))).is_err());
    }

    #[test]
    fn test_all_channels() {
        let all = ChannelSet::all();
        assert_eq!(all.len(), NUM_CHANNELS);
        assert_eq!(all.as_slice().first(), Some(&0));
        assert_eq!(all.as_slice().last(), Some(&(NUM_CHANNELS - 1)));
    }

    #[test]
    fn test_to_array() {
        let set = ChannelSet::from(vec![3, 4]);
        assert_eq!(set.to_array(), arr1(&[3usize, 4]));
        let arr: Array1<Channel> = set.into();
        assert_eq!(arr.len(), 2);
    }

    proptest! {
        /// 任意非负整数序列：元素与顺序完全保留
        #[test]
        fn normalize_preserves_elements_and_order(values in prop::collection::vec(0u32..10_000, 0..128)) {
            let set = normalize(values.clone()).unwrap();
            let expected: Vec<Channel> = values.iter().map(|v| *v as Channel).collect();
            prop_assert_eq!(set.as_slice(), expected.as_slice());
        }

        /// 包含负数的序列总是被拒绝
        #[test]
        fn normalize_rejects_any_negative(mut values in prop::collection::vec(0i64..64, 0..32), neg in i64::MIN..0) {
            values.push(neg);
            prop_assert!(normalize(values).is_err());
        }
    }
}
