use super::fakes::{boost, item, Setup};
use clubwatch::monitor::{MonitorService, StopOutcome};
use serial_test::serial;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn idle_service(store_path: &Path, poll_interval: Duration) -> MonitorService {
    let (monitor, _log, _signal) = Setup {
        items: vec![],
        opportunities: vec![],
        quota: vec![],
        poll_interval,
    }
    .build(store_path);
    MonitorService::new(monitor, Duration::from_secs(2))
}

fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}

#[test]
#[serial]
fn test_start_and_stop() {
    let temp_dir = TempDir::new().unwrap();
    let mut service = idle_service(&temp_dir.path().join("boost_card.json"), Duration::from_millis(10));

    assert!(service.start());
    assert!(service.is_running());
    assert!(service.monitor().is_none());
    thread::sleep(Duration::from_millis(50));

    assert_eq!(service.stop(), StopOutcome::Stopped);
    assert!(!service.is_running());
    let monitor = service.monitor().unwrap();
    assert!(monitor.checks() > 0);
}

#[test]
#[serial]
fn test_start_while_running_is_a_no_op() {
    let temp_dir = TempDir::new().unwrap();
    let mut service = idle_service(&temp_dir.path().join("boost_card.json"), Duration::from_millis(10));

    assert!(service.start());
    assert!(!service.start());
    assert_eq!(service.stop(), StopOutcome::Stopped);
}

#[test]
#[serial]
fn test_stop_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let mut service = idle_service(&temp_dir.path().join("boost_card.json"), Duration::from_millis(10));

    assert_eq!(service.stop(), StopOutcome::NotRunning);
    assert!(service.start());
    assert_eq!(service.stop(), StopOutcome::Stopped);
    assert_eq!(service.stop(), StopOutcome::NotRunning);
}

#[test]
#[serial]
fn test_service_can_restart() {
    let temp_dir = TempDir::new().unwrap();
    let mut service = idle_service(&temp_dir.path().join("boost_card.json"), Duration::from_millis(10));

    assert!(service.start());
    assert_eq!(service.stop(), StopOutcome::Stopped);
    let first_run = service.monitor().unwrap().checks();

    assert!(service.start());
    thread::sleep(Duration::from_millis(50));
    assert_eq!(service.stop(), StopOutcome::Stopped);
    assert!(service.monitor().unwrap().checks() > first_run);
}

#[test]
#[serial]
fn test_stop_interrupts_long_poll_interval() {
    let temp_dir = TempDir::new().unwrap();
    let mut service = idle_service(&temp_dir.path().join("boost_card.json"), Duration::from_secs(60));

    assert!(service.start());
    thread::sleep(Duration::from_millis(100));

    let start = Instant::now();
    assert_eq!(service.stop(), StopOutcome::Stopped);
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[test]
#[serial]
fn test_background_contribution() {
    let temp_dir = TempDir::new().unwrap();
    let store_path = temp_dir.path().join("boost_card.json");
    let (monitor, log, signal) = Setup {
        items: vec![
            Some(item("100", "42")),
            Some(item("100", "42")),
            Some(item("200", "77")),
        ],
        opportunities: vec![boost()],
        quota: vec![],
        poll_interval: Duration::from_millis(10),
    }
    .build(&store_path);
    let mut service = MonitorService::new(monitor, Duration::from_secs(2));
    let producer_signal = service.signal();

    assert!(service.start());
    assert!(wait_until(Duration::from_secs(5), || log.count("quota_record") == 1));
    assert_eq!(service.stop(), StopOutcome::Stopped);

    assert!(producer_signal.is_raised());
    assert!(signal.is_raised());
    assert_eq!(log.count("notify:200"), 1);
    assert_eq!(service.monitor().unwrap().last_known_item_id(), Some("200"));
    assert!(store_path.exists());
}

#[test]
#[serial]
fn test_stop_collects_loop_that_hit_failure_ceiling() {
    let temp_dir = TempDir::new().unwrap();
    let (monitor, _log, _signal) = Setup {
        items: vec![],
        opportunities: vec![],
        quota: vec![],
        poll_interval: Duration::from_millis(10),
    }
    .build_with_ceiling(&temp_dir.path().join("boost_card.json"), 3);
    let mut service = MonitorService::new(monitor, Duration::from_secs(2));

    assert!(service.start());
    assert!(wait_until(Duration::from_secs(5), || !service.is_running()));

    assert_eq!(service.stop(), StopOutcome::NotRunning);
    let monitor = service.monitor().expect("monitor collected after self-stop");
    assert!(monitor.failure_ceiling_reached());
    assert_eq!(monitor.checks(), 3);
}

