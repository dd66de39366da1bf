use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

/// 하나의 백그라운드 스레드에서 주기적으로 작업을 실행한다.
///
/// 다음 대기는 이전 작업이 끝난 뒤에 시작한다(고정 지연). 작업이 느리면
/// 실제 주기도 그만큼 늘어난다. 작업이 `false`를 반환하거나 `stop`이
/// 호출되면 루프가 끝난다. 실행 중인 작업은 중단하지 않는다.
pub struct Repeater {
    cancel: Option<Sender<()>>,
}

impl Repeater {
    pub fn start<F>(name: &str, interval: Duration, mut task: F) -> std::io::Result<Self>
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<()>();

        thread::Builder::new()
            .name(name.to_string())
            .spawn(move || loop {
                match rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        if !task() {
                            break;
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;

        Ok(Self { cancel: Some(tx) })
    }

    /// 이후의 실행을 취소한다. 여러 번 호출해도 된다.
    pub fn stop(&mut self) {
        if let Some(tx) = self.cancel.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for Repeater {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_ticks_until_stopped() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let mut repeater = Repeater::start("test-tick", Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        })
        .unwrap();

        thread::sleep(Duration::from_millis(150));
        repeater.stop();
        assert!(repeater.cancel.is_none());
        assert!(count.load(Ordering::SeqCst) >= 1);

        // 진행 중이던 tick이 끝날 시간을 준 뒤 고정
        thread::sleep(Duration::from_millis(50));
        let settled = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(100));
        assert_eq!(count.load(Ordering::SeqCst), settled);
    }

    #[test]
    fn test_task_returning_false_ends_loop() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let _repeater = Repeater::start("test-once", Duration::from_millis(5), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            false
        })
        .unwrap();

        thread::sleep(Duration::from_millis(100));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_slow_task_delays_next_tick() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let mut repeater = Repeater::start("test-slow", Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(40));
            true
        })
        .unwrap();

        thread::sleep(Duration::from_millis(250));
        repeater.stop();
        // 주기 10ms + 작업 40ms: 250ms 동안 최대 5~6회
        assert!(count.load(Ordering::SeqCst) <= 6);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut repeater =
            Repeater::start("test-idle", Duration::from_secs(3600), || true).unwrap();
        repeater.stop();
        repeater.stop();
        assert!(repeater.cancel.is_none());
    }
}
