//! 순서 마커 검증기
//!
//! [`OrderedMarkerVerifier`]는 마커 목록이 로그 스냅샷에 부분 수열(subsequence)로
//! 나타나는지 검증합니다. 즉 마커 i가 위치 p_i에서 매칭되고
//! `p_1 < p_2 < ... < p_n`을 만족하는 위치들이 존재해야 합니다.
//!
//! 마커는 생성 시 한 번만 컴파일되어 캐싱됩니다.
//!
//! # 겹침 규칙
//!
//! 마커가 매칭되면 커서는 매칭 시작 위치 바로 다음 문자로 이동합니다.
//! 따라서 다음 마커는 이전 매칭과 겹칠 수 있지만, 같은 위치에서 시작할 수는 없습니다.
//! 텍스트 끝에서 시작한 (빈) 매칭 뒤에는 남은 위치가 없으므로 다음 마커는 실패합니다.
//! 역추적(backtracking)은 하지 않습니다.

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use powerwatch_core::metrics as m;
use powerwatch_core::types::{LogText, VerificationOutcome};

use crate::error::ObserverError;
use crate::marker::Marker;

/// 각 마커의 매칭 위치 (바이트 오프셋, 엄격히 증가)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkerMatches {
    pub positions: Vec<usize>,
}

/// 순서 마커 검증기
///
/// 부수 효과가 없는 순수 함수이며, 같은 스냅샷에 대해 항상 같은 판정과
/// 같은 실패 인덱스를 반환합니다.
#[derive(Debug, Clone)]
pub struct OrderedMarkerVerifier {
    markers: Vec<Marker>,
    compiled: Vec<Regex>,
}

impl OrderedMarkerVerifier {
    /// 마커 목록을 컴파일하여 검증기를 생성합니다.
    ///
    /// # Errors
    ///
    /// 패턴 마커가 컴파일되지 않으면 해당 인덱스와 함께
    /// `ObserverError::InvalidPattern`을 반환합니다.
    pub fn new<M: Into<Marker>>(
        markers: impl IntoIterator<Item = M>,
    ) -> Result<Self, ObserverError> {
        let markers: Vec<Marker> = markers.into_iter().map(Into::into).collect();
        let compiled = markers
            .iter()
            .enumerate()
            .map(|(idx, marker)| marker.compile(idx))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { markers, compiled })
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// 스냅샷에서 마커 순서를 검증합니다.
    ///
    /// 빈 마커 목록은 항상 성공합니다.
    ///
    /// # Errors
    ///
    /// 이전 매칭 이후에서 찾지 못한 첫 마커에 대해
    /// `ObserverError::MarkerNotFound`를 반환합니다.
    pub fn verify(&self, log: &LogText) -> Result<MarkerMatches, ObserverError> {
        let text = log.as_str();
        // `None`: 이전 매칭이 텍스트 끝에서 시작해 더 뒤의 위치가 남아 있지 않음
        let mut cursor = Some(0usize);
        let mut positions = Vec::with_capacity(self.compiled.len());

        for (index, regex) in self.compiled.iter().enumerate() {
            let Some(found) = cursor.and_then(|from| regex.find_at(text, from)) else {
                let search_from = cursor.unwrap_or(text.len());
                debug!(
                    index,
                    marker = %self.markers[index],
                    search_from,
                    "marker not found"
                );
                metrics::counter!(m::VERIFIER_CHECKS_TOTAL, m::LABEL_RESULT => "failure")
                    .increment(1);
                return Err(ObserverError::MarkerNotFound {
                    index,
                    marker: self.markers[index].as_str().to_owned(),
                    search_from,
                    searched_len: text.len(),
                });
            };

            let start = found.start();
            positions.push(start);
            cursor = advance_past(text, start);
        }

        metrics::counter!(m::VERIFIER_CHECKS_TOTAL, m::LABEL_RESULT => "success").increment(1);
        Ok(MarkerMatches { positions })
    }

    /// 마커가 순서대로 모두 나타나는지 여부
    pub fn is_satisfied(&self, log: &LogText) -> bool {
        self.verify(log).is_ok()
    }

    /// 검증 결과를 오케스트레이터용 [`VerificationOutcome`]으로 변환합니다.
    pub fn outcome(&self, log: &LogText, last_known_boot_count: usize) -> VerificationOutcome {
        match self.verify(log) {
            Ok(_) => VerificationOutcome::Success,
            Err(e) => {
                let failed_marker_index = match &e {
                    ObserverError::MarkerNotFound { index, .. } => Some(*index),
                    _ => None,
                };
                VerificationOutcome::Failure {
                    failed_marker_index,
                    last_known_boot_count,
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// 매칭 시작 위치의 문자 하나만큼 전진한 커서. 시작 위치가 텍스트 끝이면 `None`.
fn advance_past(text: &str, start: usize) -> Option<usize> {
    text[start..].chars().next().map(|c| start + c.len_utf8())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier(markers: &[&str]) -> OrderedMarkerVerifier {
        OrderedMarkerVerifier::new(markers.iter().copied()).unwrap()
    }

    fn reboot_markers() -> Vec<&'static str> {
        vec![
            "Running module power_state_change",
            "will execute: shutdown -r now msg",
            "running 'init-local'",
            "config-power_state_change already ran",
        ]
    }

    #[test]
    fn in_order_markers_pass() {
        let log = LogText::from("..A...B...C...");
        let matches = verifier(&["A", "B", "C"]).verify(&log).unwrap();
        assert_eq!(matches.positions, vec![2, 6, 10]);
    }

    #[test]
    fn out_of_order_fails_at_second_marker() {
        let log = LogText::from("...B...A...C...");
        let err = verifier(&["A", "B", "C"]).verify(&log).unwrap_err();
        match err {
            ObserverError::MarkerNotFound {
                index,
                marker,
                search_from,
                searched_len,
            } => {
                assert_eq!(index, 1);
                assert_eq!(marker, "B");
                assert_eq!(search_from, 8);
                assert_eq!(searched_len, 15);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn repeated_verification_is_stable() {
        let log = LogText::from("C B A");
        let v = verifier(&["A", "B"]);
        let first = v.verify(&log).unwrap_err().to_string();
        let second = v.verify(&log).unwrap_err().to_string();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_marker_list_is_vacuously_true() {
        let v = OrderedMarkerVerifier::new(Vec::<Marker>::new()).unwrap();
        assert!(v.is_satisfied(&LogText::from("")));
        assert!(v.verify(&LogText::from("anything")).unwrap().positions.is_empty());
    }

    #[test]
    fn single_marker_is_presence_check() {
        let v = verifier(&["needle"]);
        assert!(v.is_satisfied(&LogText::from("hay needle hay")));
        assert!(!v.is_satisfied(&LogText::from("hay hay")));
    }

    #[test]
    fn duplicate_markers_need_distinct_occurrences() {
        let v = verifier(&["running 'init-local'", "running 'init-local'"]);
        assert!(!v.is_satisfied(&LogText::from("running 'init-local'\n")));
        assert!(v.is_satisfied(&LogText::from(
            "running 'init-local'\nreboot\nrunning 'init-local'\n"
        )));
    }

    #[test]
    fn overlapping_matches_are_permitted() {
        let v = verifier(&["aa", "aa"]);
        let matches = v.verify(&LogText::from("aaa")).unwrap();
        assert_eq!(matches.positions, vec![0, 1]);
    }

    #[test]
    fn cursor_respects_multibyte_characters() {
        let v = verifier(&["부팅", "팅"]);
        let matches = v.verify(&LogText::from("부팅")).unwrap();
        assert_eq!(matches.positions, vec![0, 3]);
    }

    #[test]
    fn empty_matches_at_end_of_text_stay_strictly_increasing() {
        let log = LogText::from("abc");
        let v = OrderedMarkerVerifier::new(vec![Marker::pattern("$"), Marker::pattern("$")]).unwrap();
        let err = v.verify(&log).unwrap_err();
        match err {
            ObserverError::MarkerNotFound {
                index, search_from, ..
            } => {
                assert_eq!(index, 1);
                assert_eq!(search_from, 3);
            }
            other => panic!("unexpected error: {other}"),
        }

        let v = verifier(&["c", ""]);
        assert_eq!(v.verify(&log).unwrap().positions, vec![2, 3]);
        let v = verifier(&["c", "", ""]);
        assert!(matches!(
            v.verify(&log).unwrap_err(),
            ObserverError::MarkerNotFound { index: 2, .. }
        ));
    }

    #[test]
    fn empty_literal_matches_each_position_once() {
        let v = verifier(&["", "", ""]);
        assert_eq!(v.verify(&LogText::from("ab")).unwrap().positions, vec![0, 1, 2]);
        assert!(!verifier(&["", ""]).is_satisfied(&LogText::from("")));
    }

    #[test]
    fn reboot_scenario_passes_on_interleaved_log() {
        let log = LogText::from(
            "2024 - stages.py - Running module power_state_change\n\
             noise\n\
             2024 - cc_power_state_change.py - will execute: shutdown -r now msg\n\
             --- reboot ---\n\
             2024 - main.py - running 'init-local'\n\
             more noise\n\
             2024 - helpers.py - config-power_state_change already ran\n",
        );
        assert!(verifier(&reboot_markers()).is_satisfied(&log));
    }

    #[test]
    fn reboot_scenario_missing_third_line_fails_at_index_two() {
        let log = LogText::from(
            "Running module power_state_change\n\
             will execute: shutdown -r now msg\n\
             config-power_state_change already ran\n",
        );
        let err = verifier(&reboot_markers()).verify(&log).unwrap_err();
        assert!(matches!(err, ObserverError::MarkerNotFound { index: 2, .. }));
    }

    #[test]
    fn invalid_pattern_rejected_at_construction() {
        let err = OrderedMarkerVerifier::new(vec![Marker::literal("ok"), Marker::pattern("[")])
            .unwrap_err();
        assert!(matches!(err, ObserverError::InvalidPattern { index: 1, .. }));
    }

    #[test]
    fn outcome_reports_failed_index() {
        let v = verifier(&["A", "B"]);
        match v.outcome(&LogText::from("A only"), 1) {
            VerificationOutcome::Failure {
                failed_marker_index,
                last_known_boot_count,
                reason,
            } => {
                assert_eq!(failed_marker_index, Some(1));
                assert_eq!(last_known_boot_count, 1);
                assert!(reason.contains("'B'"));
            }
            VerificationOutcome::Success => panic!("expected failure"),
        }
        assert!(v.outcome(&LogText::from("A B"), 2).is_success());
    }
}
