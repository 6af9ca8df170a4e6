//! 시나리오 케이스
//!
//! 표준 케이스(poweroff, reboot, halt)와 조건이 거짓인 케이스를 정의하고,
//! 각 케이스가 로그에 남겨야 하는 기대 마커를 계산합니다.

use serde::Serialize;

use powerwatch_observer::Marker;

use crate::power_state::{Condition, PowerMode, PowerStateConfig};

/// 전이 모듈이 실행될 때 기록되는 라인
pub const MODULE_RUN_MARKER: &str = "Running module power_state_change";

/// 재부팅 후 모듈이 다시 실행되지 않았음을 나타내는 라인
pub const ALREADY_RAN_MARKER: &str = "config-power_state_change already ran";

/// 조건이 거짓일 때 기록되는 라인
pub const CONDITION_FALSE_LINE: &str = "Condition was false. Will not perform state change";

/// 시나리오 케이스
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioCase {
    /// 케이스 이름 (보고서/로그용)
    pub name: String,
    /// 원격 에이전트에 주입할 전원 상태 설정
    pub power_state: PowerStateConfig,
}

impl ScenarioCase {
    pub fn new(name: impl Into<String>, power_state: PowerStateConfig) -> Self {
        Self {
            name: name.into(),
            power_state,
        }
    }

    /// 모드에 해당하는 표준 케이스
    pub fn standard(mode: PowerMode) -> Self {
        let power_state = match mode {
            PowerMode::Poweroff => PowerStateConfig::new(mode).with_timeout(10),
            PowerMode::Reboot => PowerStateConfig::new(mode),
            PowerMode::Halt => PowerStateConfig::new(mode).with_delay("+1"),
        };
        Self::new(mode.as_str(), power_state)
    }

    pub fn mode(&self) -> PowerMode {
        self.power_state.mode
    }

    /// 조건이 거짓이라 전이가 일어나지 않아야 하는 케이스인지
    pub fn expects_no_transition(&self) -> bool {
        self.power_state.condition == Condition::Bool(false)
    }

    /// 로그에 순서대로 나타나야 하는 마커
    ///
    /// 모든 마커는 리터럴이므로 `+1` 같은 정규식 메타문자도 그대로 매칭됩니다.
    pub fn expected_markers(&self, boot_marker: &str) -> Vec<Marker> {
        if self.expects_no_transition() {
            return vec![Marker::literal(CONDITION_FALSE_LINE)];
        }
        vec![
            Marker::literal(MODULE_RUN_MARKER),
            Marker::literal(self.power_state.expected_execute_line()),
            Marker::literal(boot_marker),
            Marker::literal(ALREADY_RAN_MARKER),
        ]
    }
}

/// 표준 케이스 세 개 (poweroff, reboot, halt)
pub fn standard_cases() -> Vec<ScenarioCase> {
    PowerMode::ALL.into_iter().map(ScenarioCase::standard).collect()
}

/// 조건이 거짓인 poweroff 케이스
pub fn false_condition_case() -> ScenarioCase {
    ScenarioCase::new(
        "poweroff_false_condition",
        PowerStateConfig::new(PowerMode::Poweroff)
            .with_delay("0")
            .with_condition(Condition::Bool(false)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use powerwatch_core::config::DEFAULT_BOOT_MARKER;

    #[test]
    fn standard_case_parameters() {
        let cases = standard_cases();
        assert_eq!(cases.len(), 3);

        let poweroff = &cases[0];
        assert_eq!(poweroff.name, "poweroff");
        assert_eq!(poweroff.power_state.delay, "now");
        assert_eq!(poweroff.power_state.timeout, 10);

        let reboot = &cases[1];
        assert_eq!(reboot.mode(), PowerMode::Reboot);
        assert_eq!(reboot.power_state.timeout, 0);

        let halt = &cases[2];
        assert_eq!(halt.power_state.delay, "+1");
        assert_eq!(halt.power_state.condition, Condition::Bool(true));
    }

    #[test]
    fn expected_markers_for_reboot() {
        let markers = ScenarioCase::standard(PowerMode::Reboot).expected_markers(DEFAULT_BOOT_MARKER);
        let texts: Vec<&str> = markers.iter().map(Marker::as_str).collect();
        assert_eq!(
            texts,
            vec![
                "Running module power_state_change",
                "will execute: shutdown -r now msg",
                "running 'init-local'",
                "config-power_state_change already ran",
            ]
        );
        assert!(markers.iter().all(Marker::is_literal));
    }

    #[test]
    fn halt_marker_matches_literally() {
        let markers = ScenarioCase::standard(PowerMode::Halt).expected_markers(DEFAULT_BOOT_MARKER);
        let re = markers[1].compile(1).unwrap();
        assert!(re.is_match("will execute: shutdown -H +1 msg"));
    }

    #[test]
    fn false_condition_case_parameters() {
        let case = false_condition_case();
        assert!(case.expects_no_transition());
        assert_eq!(case.power_state.delay, "0");
        assert_eq!(case.power_state.timeout, 0);
        assert_eq!(case.mode(), PowerMode::Poweroff);

        let markers = case.expected_markers(DEFAULT_BOOT_MARKER);
        assert_eq!(markers, vec![Marker::literal(CONDITION_FALSE_LINE)]);
    }

    #[test]
    fn standard_cases_render_user_data() {
        for case in standard_cases() {
            let doc = case.power_state.render_user_data().unwrap();
            assert!(doc.contains(&format!("mode: {}", case.mode())));
        }
    }
}
