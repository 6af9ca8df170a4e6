#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use powerwatch_core::types::LogText;
use powerwatch_observer::{Marker, ObserverError, OrderedMarkerVerifier};

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// 마커 목록 (최대 8개로 제한)
    markers: Vec<FuzzMarker>,
    log: String,
}

#[derive(Arbitrary, Debug)]
enum FuzzMarker {
    Literal(String),
    Pattern(String),
    Auto(String),
}

impl FuzzMarker {
    fn into_marker(self) -> Marker {
        match self {
            FuzzMarker::Literal(s) => Marker::literal(s),
            FuzzMarker::Pattern(s) => Marker::pattern(s),
            FuzzMarker::Auto(s) => Marker::auto(s),
        }
    }
}

fuzz_target!(|input: FuzzInput| {
    let markers: Vec<Marker> = input
        .markers
        .into_iter()
        .take(8)
        .map(FuzzMarker::into_marker)
        .collect();
    let count = markers.len();

    // 잘못된 패턴은 생성 단계에서 거부됨
    let Ok(verifier) = OrderedMarkerVerifier::new(markers) else {
        return;
    };
    let log = LogText::from(input.log);

    match verifier.verify(&log) {
        Ok(matches) => {
            assert_eq!(matches.positions.len(), count);
            assert!(matches.positions.windows(2).all(|p| p[0] < p[1]));
            assert!(matches.positions.iter().all(|&p| p <= log.len()));
        }
        Err(ObserverError::MarkerNotFound { index, .. }) => assert!(index < count),
        Err(other) => panic!("unexpected verifier error: {other}"),
    }

    // 같은 스냅샷에 대해 판정이 바뀌지 않아야 함
    assert_eq!(verifier.outcome(&log, 0), verifier.outcome(&log, 0));
});
