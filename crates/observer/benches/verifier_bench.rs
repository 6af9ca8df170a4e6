//! 마커 검증 및 부팅 횟수 계산 벤치마크
//!
//! 로그 크기에 따른 순서 검증과 부팅 마커 카운팅 성능을 측정합니다.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use powerwatch_core::types::{BootCycleCount, LogText};
use powerwatch_observer::{Marker, OrderedMarkerVerifier};

const BOOT_MARKER: &str = "running 'init-local'";

/// `lines`줄짜리 cloud-init 스타일 로그를 생성합니다. 마커는 일정 간격으로 배치됩니다.
fn create_log(lines: usize) -> LogText {
    let mut text = String::with_capacity(lines * 80);
    for i in 0..lines {
        let line = if i == 0 {
            "stages.py[DEBUG]: Running module power_state_change"
        } else if i == lines / 4 {
            "cc_power_state_change.py[DEBUG]: will execute: shutdown -r now msg"
        } else if i == lines / 2 {
            "main.py[DEBUG]: Cloud-init v. 23.1 running 'init-local'"
        } else if i == lines * 3 / 4 {
            "helpers.py[DEBUG]: config-power_state_change already ran"
        } else {
            "util.py[DEBUG]: Reading from /proc/uptime (quiet=False)"
        };
        text.push_str(line);
        text.push('\n');
    }
    LogText::from(text)
}

fn reboot_verifier() -> OrderedMarkerVerifier {
    OrderedMarkerVerifier::new(vec![
        Marker::literal("Running module power_state_change"),
        Marker::literal("will execute: shutdown -r now msg"),
        Marker::literal(BOOT_MARKER),
        Marker::literal("config-power_state_change already ran"),
    ])
    .unwrap()
}

fn bench_verify_scaling(c: &mut Criterion) {
    let verifier = reboot_verifier();
    let mut group = c.benchmark_group("verify_scaling");

    for lines in [100usize, 1_000, 10_000] {
        let log = create_log(lines);
        group.throughput(Throughput::Bytes(log.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(lines), &log, |b, log| {
            b.iter(|| verifier.verify(black_box(log)).unwrap())
        });
    }

    group.finish();
}

fn bench_verify_missing_marker(c: &mut Criterion) {
    let verifier = OrderedMarkerVerifier::new(vec![Marker::literal("never present")]).unwrap();
    let log = create_log(10_000);

    let mut group = c.benchmark_group("verify_failure");
    group.throughput(Throughput::Bytes(log.len() as u64));
    group.bench_function("full_scan", |b| {
        b.iter(|| verifier.verify(black_box(&log)).is_err())
    });
    group.finish();
}

fn bench_boot_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("boot_count");

    for lines in [100usize, 1_000, 10_000] {
        let log = create_log(lines);
        group.throughput(Throughput::Bytes(log.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(lines), &log, |b, log| {
            b.iter(|| BootCycleCount::count(black_box(log), BOOT_MARKER))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_verify_scaling,
    bench_verify_missing_marker,
    bench_boot_count
);
criterion_main!(benches);
