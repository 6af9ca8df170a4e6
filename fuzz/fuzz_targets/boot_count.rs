#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use powerwatch_core::types::{BootCycleCount, LogText};

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    log: String,
    marker: String,
    appended: String,
}

fuzz_target!(|input: FuzzInput| {
    if input.marker.is_empty() {
        return;
    }
    let before = BootCycleCount::count(&LogText::from(input.log.as_str()), &input.marker);
    assert!(before.get() <= input.log.len() / input.marker.len());

    // 추가 전용 로그에서는 부팅 횟수가 줄어들지 않음
    let grown = format!("{}{}", input.log, input.appended);
    let after = BootCycleCount::count(&LogText::from(grown), &input.marker);
    assert!(after >= before);
});
