#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use powerwatch_scenario::{Condition, PowerMode, PowerStateConfig};

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    mode: u8,
    delay: String,
    message: String,
    timeout: u64,
    condition: Option<String>,
}

fuzz_target!(|input: FuzzInput| {
    let mode = PowerMode::ALL[usize::from(input.mode) % PowerMode::ALL.len()];
    let mut config = PowerStateConfig::new(mode)
        .with_delay(input.delay)
        .with_message(input.message)
        .with_timeout(input.timeout);
    if let Some(cmd) = input.condition {
        config = config.with_condition(Condition::Command(cmd));
    }

    // 검증을 통과한 설정만 렌더링되고, 렌더링 결과는 다시 파싱되어야 함
    let Ok(document) = config.render_user_data() else {
        return;
    };
    let body = document
        .strip_prefix("#cloud-config\n")
        .expect("header must be present");
    let parsed: serde_yaml::Value = serde_yaml::from_str(body).expect("rendered YAML must parse");
    assert!(parsed.get("power_state").is_some());
});
