use crate::StopSignal;
use cairn_time::CairnTime;
use std::time::{Duration, Instant};

#[test]
fn test_wait_returns_early_on_stop() {
    let signal = StopSignal::new();
    assert!(!signal.wait(CairnTime::from_millis(10)));

    let remote = signal.clone();
    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        remote.stop();
    });
    let start = Instant::now();
    assert!(signal.wait(CairnTime::from_millis(10_000)));
    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(signal.is_stopped());
    handle.join().unwrap();
}
