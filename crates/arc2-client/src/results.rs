//! 结果迭代
//!
//! 长时操作（斜坡、读取序列）的结果由驱动写入内部结果缓冲区，
//! [`ResultIterator`] 每前进一步向驱动请求一条记录，直到驱动返回空值。
//!
//! 游标由驱动持有：新建的迭代器总是从驱动当前的位置继续，不能回退。
//! 迭代器在生命周期内可变借用驱动，因此同一个驱动上不可能同时存在两个迭代器。

use crate::Arc2Error;
use arc2_driver::ResultSource;
use arc2_protocol::{DataMode, ReadType};
use ndarray::{Array1, ArrayView1};
use smallvec::SmallVec;
use std::iter::FusedIterator;
use tracing::{debug, trace};

/// 单条结果记录
///
/// `DataMode::All` 下为 64 个样本，其余模式为 32 个。所有权完全转交给调用者。
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    data: Array1<f32>,
}

impl ResultRecord {
    pub fn new(data: Vec<f32>) -> Self {
        Self {
            data: Array1::from(data),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn view(&self) -> ArrayView1<'_, f32> {
        self.data.view()
    }

    pub fn into_array(self) -> Array1<f32> {
        self.data
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.data.to_vec()
    }
}

impl From<Vec<f32>> for ResultRecord {
    fn from(data: Vec<f32>) -> Self {
        Self::new(data)
    }
}

/// 记录批次缓冲区类型
///
/// 当前每批恰好一条记录，栈上预留 1 个位置即可避免堆分配。
pub type RecordBuffer = SmallVec<[ResultRecord; 1]>;

/// 一次迭代产生的记录批次
#[derive(Debug, Clone, PartialEq)]
pub struct ResultBatch {
    records: RecordBuffer,
}

impl ResultBatch {
    /// 单条记录批次
    #[inline]
    pub fn single(record: ResultRecord) -> Self {
        let mut records = RecordBuffer::new();
        records.push(record);
        Self { records }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&ResultRecord> {
        self.records.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResultRecord> {
        self.records.iter()
    }

    pub fn into_records(self) -> RecordBuffer {
        self.records
    }
}

impl IntoIterator for ResultBatch {
    type Item = ResultRecord;
    type IntoIter = smallvec::IntoIter<[ResultRecord; 1]>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

/// 惰性、有限、单遍的结果序列
///
/// 驱动返回空值时序列正常结束；驱动报错时产生一次 `Err` 然后结束。
/// 结束之后不再访问驱动。
pub struct ResultIterator<'a, S: ResultSource + ?Sized> {
    source: &'a mut S,
    mode: DataMode,
    rtype: ReadType,
    pulled: usize,
    finished: bool,
}

impl<'a, S: ResultSource + ?Sized> ResultIterator<'a, S> {
    pub fn new(source: &'a mut S, mode: DataMode, rtype: ReadType) -> Self {
        Self {
            source,
            mode,
            rtype,
            pulled: 0,
            finished: false,
        }
    }

    pub fn mode(&self) -> DataMode {
        self.mode
    }

    pub fn read_type(&self) -> ReadType {
        self.rtype
    }

    /// 已取出的记录数
    pub fn pulled(&self) -> usize {
        self.pulled
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl<S: ResultSource + ?Sized> Iterator for ResultIterator<'_, S> {
    type Item = Result<ResultBatch, Arc2Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.source.pick_one(self.mode, self.rtype) {
            Ok(Some(data)) => {
                self.pulled += 1;
                trace!(
                    "Pulled result record #{} ({} samples, {}/{})",
                    self.pulled,
                    data.len(),
                    self.mode,
                    self.rtype
                );
                Some(Ok(ResultBatch::single(ResultRecord::new(data))))
            },
            Ok(None) => {
                self.finished = true;
                debug!("Result buffer exhausted after {} records", self.pulled);
                None
            },
            Err(e) => {
                self.finished = true;
                Some(Err(e.into()))
            },
        }
    }
}

impl<S: ResultSource + ?Sized> FusedIterator for ResultIterator<'_, S> {}
