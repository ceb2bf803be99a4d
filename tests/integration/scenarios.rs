use super::fakes::{boost, item, Setup};
use clubwatch::monitor::{ContributionOutcome, TickOutcome};
use clubwatch::store::DescriptorStore;
use std::time::Duration;
use tempfile::TempDir;

fn contribution_setup(quota: Vec<bool>) -> Setup {
    Setup {
        items: vec![
            Some(item("100", "42")),
            Some(item("100", "42")),
            Some(item("200", "77")),
        ],
        opportunities: vec![boost()],
        quota,
        poll_interval: Duration::ZERO,
    }
}

#[test]
fn test_contribution_that_changes_the_item() {
    let temp_dir = TempDir::new().unwrap();
    let store_path = temp_dir.path().join("created_files").join("boost_card.json");
    let (mut monitor, log, signal) = contribution_setup(vec![]).build(&store_path);

    let outcome = monitor.tick();

    let TickOutcome::Contributed(report) = outcome else {
        panic!("expected a contribution, got {outcome:?}");
    };
    assert_eq!(report.outcome, ContributionOutcome::Changed);
    assert_eq!(log.count("submit:42"), 1);
    assert_eq!(log.count("notify:"), 1);
    assert_eq!(log.count("notify:200"), 1);
    assert_eq!(monitor.last_known_item_id(), Some("200"));
    assert!(signal.is_raised());

    let saved = DescriptorStore::new(&store_path).load().unwrap().unwrap();
    assert_eq!(saved.item_id, "200");
    assert_eq!(saved.instance_id.as_deref(), Some("77"));
    assert_eq!(saved.members.len(), 1);
}

#[test]
fn test_quota_denied_on_second_check() {
    let temp_dir = TempDir::new().unwrap();
    let store_path = temp_dir.path().join("boost_card.json");
    let (mut monitor, log, signal) = contribution_setup(vec![true, false]).build(&store_path);

    monitor.tick();

    assert_eq!(log.count("quota_check:"), 2);
    assert_eq!(log.count("submit:"), 0);
    assert_eq!(log.count("notify:"), 0);
    assert!(!signal.is_raised());
    assert!(!store_path.exists());
}

#[test]
fn test_item_change_without_boost() {
    let temp_dir = TempDir::new().unwrap();
    let store_path = temp_dir.path().join("boost_card.json");
    let (mut monitor, log, signal) = Setup {
        items: vec![
            Some(item("100", "42")),
            Some(item("150", "51")),
            Some(item("150", "51")),
        ],
        opportunities: vec![None],
        quota: vec![],
        poll_interval: Duration::ZERO,
    }
    .build(&store_path);

    assert!(matches!(monitor.tick(), TickOutcome::Quiet { .. }));
    assert_eq!(monitor.last_known_item_id(), Some("100"));
    assert!(matches!(
        monitor.tick(),
        TickOutcome::IdentityChanged { handled: true, .. }
    ));

    let cancel = log.index_of("cancel_exchanges").unwrap();
    let notify = log.index_of("notify:150").unwrap();
    assert!(cancel < notify);
    assert_eq!(log.count("submit:"), 0);
    assert_eq!(monitor.last_known_item_id(), Some("150"));
    assert!(signal.is_raised());

    let saved = DescriptorStore::new(&store_path).load().unwrap().unwrap();
    assert_eq!(saved.item_id, "150");
}

#[test]
fn test_notification_precedes_cleanup() {
    let temp_dir = TempDir::new().unwrap();
    let store_path = temp_dir.path().join("boost_card.json");
    let (mut monitor, log, _signal) = contribution_setup(vec![]).build(&store_path);

    monitor.tick();

    let notify = log.index_of("notify:200").unwrap();
    assert!(notify < log.index_of("cancel_exchanges").unwrap());
    assert!(notify < log.index_of("quota_record").unwrap());
    assert!(notify < log.index_of("quota_refresh").unwrap());
}
