//! 인스턴스 수명주기 추상화
//!
//! 관측 엔진은 인스턴스를 읽기만 합니다. halt/poweroff 이후 인스턴스를
//! 다시 켜는 일은 오케스트레이터의 몫이며, [`Lifecycle`] trait으로 분리되어 있습니다.

use std::future::Future;

use crate::error::ScenarioError;

/// 인스턴스 수명주기 조작
pub trait Lifecycle: Send + Sync + 'static {
    /// 정지된 인스턴스를 시작합니다.
    ///
    /// # Errors
    ///
    /// 시작 요청이 실패하면 `ScenarioError::Lifecycle` 또는 `ScenarioError::Docker`를 반환합니다.
    fn start(&self) -> impl Future<Output = Result<(), ScenarioError>> + Send;
}

/// 테스트용 가상 머신
///
/// 가상 시간에 따라 정지하거나 재부팅하며, `start` 호출 시 부팅 로그를 추가합니다.
#[cfg(test)]
pub struct MockMachine {
    created: tokio::time::Instant,
    state: std::sync::Mutex<MachineState>,
}

#[cfg(test)]
#[derive(Default)]
struct MachineState {
    log: String,
    stopped: bool,
    stop_after: Option<std::time::Duration>,
    reboot: Option<(std::time::Duration, String)>,
    boot_log: String,
    fail_start: bool,
    start_calls: usize,
}

#[cfg(test)]
impl MockMachine {
    /// 주어진 로그로 실행 중인 머신을 생성합니다.
    pub fn new(log: &str) -> Self {
        Self {
            created: tokio::time::Instant::now(),
            state: std::sync::Mutex::new(MachineState {
                log: log.to_owned(),
                ..MachineState::default()
            }),
        }
    }

    /// `after` 경과 후 스스로 정지합니다.
    pub fn stops_after(self, after: std::time::Duration) -> Self {
        self.state.lock().unwrap().stop_after = Some(after);
        self
    }

    /// `after` 경과 후 재부팅되어 `appended`가 로그에 추가됩니다.
    pub fn reboots_after(self, after: std::time::Duration, appended: &str) -> Self {
        self.state.lock().unwrap().reboot = Some((after, appended.to_owned()));
        self
    }

    /// `start` 호출 시 로그에 추가될 부팅 로그
    pub fn on_start(self, boot_log: &str) -> Self {
        self.state.lock().unwrap().boot_log = boot_log.to_owned();
        self
    }

    /// `start` 호출이 실패하도록 설정합니다.
    pub fn failing_start(self) -> Self {
        self.state.lock().unwrap().fail_start = true;
        self
    }

    pub fn start_calls(&self) -> usize {
        self.state.lock().unwrap().start_calls
    }

    fn tick(&self) -> std::sync::MutexGuard<'_, MachineState> {
        let elapsed = self.created.elapsed();
        let mut state = self.state.lock().unwrap();
        if state.stop_after.is_some_and(|at| elapsed >= at) {
            state.stop_after = None;
            state.stopped = true;
        }
        if state.reboot.as_ref().is_some_and(|(at, _)| elapsed >= *at) {
            if let Some((_, appended)) = state.reboot.take() {
                state.log.push_str(&appended);
            }
        }
        state
    }
}

#[cfg(test)]
impl powerwatch_observer::Instance for MockMachine {
    async fn is_reachable(&self) -> bool {
        !self.tick().stopped
    }

    async fn read_file(
        &self,
        _path: &str,
    ) -> Result<powerwatch_core::types::LogText, powerwatch_observer::ObserverError> {
        let state = self.tick();
        if state.stopped {
            return Err(powerwatch_observer::ObserverError::TransientIo(
                "machine is stopped".to_owned(),
            ));
        }
        Ok(powerwatch_core::types::LogText::from(state.log.as_str()))
    }
}

#[cfg(test)]
impl Lifecycle for MockMachine {
    async fn start(&self) -> Result<(), ScenarioError> {
        let mut state = self.tick();
        state.start_calls += 1;
        if state.fail_start {
            return Err(ScenarioError::Lifecycle("mock start failure".to_owned()));
        }
        state.stopped = false;
        let boot_log = std::mem::take(&mut state.boot_log);
        state.log.push_str(&boot_log);
        Ok(())
    }
}
