//! 结果迭代集成测试

use arc2_sdk::driver::{DriverCall, MockDriver};
use arc2_sdk::prelude::*;
use proptest::prelude::*;

fn loaded(records: usize) -> (Instrument<MockDriver>, MockDriver) {
    let driver = MockDriver::new();
    for i in 0..records {
        driver.push_result(vec![i as f32; 64]);
    }
    (Instrument::new(driver.clone()), driver)
}

#[test]
fn test_ramp_then_iterate() -> anyhow::Result<()> {
    let (mut arc2, driver) = loaded(4);
    let ramp = RampConfig::new(3, 20, 0.0, 0.1, 1.0)
        .with_timing(1_000, 1_000, 1)
        .with_read(ReadAt::Arb(0.2), ReadAfter::Pulse);
    let seq = arc2.sequence().generate_ramp(ramp);
    arc2.submit(seq)?;
    arc2.wait()?;

    let mut seen = Vec::new();
    for batch in arc2.get_iter(DataMode::All, None) {
        let batch = batch?;
        assert_eq!(batch.len(), 1);
        for record in batch {
            seen.push(record.view()[0]);
        }
    }

    assert_eq!(seen, vec![0.0, 1.0, 2.0, 3.0]);
    assert_eq!(driver.pending_results(), 0);
    Ok(())
}

#[test]
fn test_exhausted_buffer_is_not_an_error() {
    let (mut arc2, _driver) = loaded(0);
    let mut iter = arc2.get_iter(DataMode::Words, Some(ReadType::Voltage));
    assert!(iter.next().is_none());
    assert!(iter.next().is_none());

    assert!(arc2.pick_one(DataMode::Words, ReadType::Voltage).unwrap().is_none());
}

#[test]
fn test_driver_error_during_iteration() {
    let (mut arc2, driver) = loaded(3);
    driver.fail_next("pick_one", DriverError::Timeout);

    let results: Vec<_> = arc2.get_iter(DataMode::All, None).collect();
    assert_eq!(results.len(), 1);
    assert!(results[0].as_ref().is_err_and(Arc2Error::is_driver_error));

    // 游标未被消费，新的迭代器继续读取
    assert_eq!(arc2.get_iter(DataMode::All, None).count(), 3);
}

proptest! {
    /// 缓冲区中恰好 K 条记录：产生 K 条后结束，驱动共收到 K + 1 次请求
    #[test]
    fn iterator_yields_exactly_buffered_records(k in 0usize..40) {
        let (mut arc2, driver) = loaded(k);
        let yielded = arc2.get_iter(DataMode::All, None).filter(Result::is_ok).count();

        prop_assert_eq!(yielded, k);
        let picks = driver
            .log()
            .snapshot()
            .iter()
            .filter(|call| matches!(call, DriverCall::PickOne { .. }))
            .count();
        prop_assert_eq!(picks, k + 1);
    }
}
