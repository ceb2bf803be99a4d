use clubwatch::exchanges::ExchangeCanceller;
use clubwatch::models::{ClubMember, OpportunityTarget, TrackedItem};
use clubwatch::monitor::{CancellationSignal, ChangeMonitor, Collaborators, LoopSettings};
use clubwatch::notify::Notifier;
use clubwatch::quota::QuotaGate;
use clubwatch::remote::RemoteState;
use clubwatch::store::DescriptorStore;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const CLUB_URL: &str = "https://club.test/clubs/7";

/// Calls made to the collaborators, in order.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    fn push(&self, call: impl Into<String>) {
        self.0.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn index_of(&self, prefix: &str) -> Option<usize> {
        self.calls().iter().position(|c| c.starts_with(prefix))
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }
}

/// Scripted club site. Empty scripts answer `None`.
pub struct ScriptedRemote {
    pub log: CallLog,
    pub items: Mutex<VecDeque<Option<TrackedItem>>>,
    pub opportunities: Mutex<VecDeque<Option<OpportunityTarget>>>,
    pub submit_ok: bool,
}

impl RemoteState for ScriptedRemote {
    fn fetch_opportunity(&self, _resource_url: &str) -> Option<OpportunityTarget> {
        self.log.push("fetch_opportunity");
        self.opportunities.lock().unwrap().pop_front().flatten()
    }

    fn fetch_item_descriptor(&self, _resource_url: &str) -> Option<TrackedItem> {
        self.log.push("fetch_item");
        self.items.lock().unwrap().pop_front().flatten()
    }

    fn submit_contribution(&self, _target: &OpportunityTarget, instance_id: &str) -> bool {
        self.log.push(format!("submit:{instance_id}"));
        self.submit_ok
    }
}

pub struct ScriptedQuota {
    pub log: CallLog,
    pub answers: Mutex<VecDeque<bool>>,
}

impl QuotaGate for ScriptedQuota {
    fn can_proceed(&self, _force_refresh: bool) -> bool {
        let allowed = self.answers.lock().unwrap().pop_front().unwrap_or(true);
        self.log.push(format!("quota_check:{allowed}"));
        allowed
    }

    fn record_contribution(&self) {
        self.log.push("quota_record");
    }

    fn refresh(&self) {
        self.log.push("quota_refresh");
    }

    fn display(&self) {
        self.log.push("quota_display");
    }
}

pub struct RecordingNotifier {
    pub log: CallLog,
}

impl Notifier for RecordingNotifier {
    fn is_enabled(&self) -> bool {
        true
    }

    fn notify_change(&self, item: &TrackedItem, _resource_url: &str, _members: &[ClubMember]) -> bool {
        self.log.push(format!("notify:{}", item.item_id));
        true
    }
}

pub struct RecordingExchanges {
    pub log: CallLog,
}

impl ExchangeCanceller for RecordingExchanges {
    fn cancel_pending_exchanges(&self) -> bool {
        self.log.push("cancel_exchanges");
        true
    }
}

pub fn item(item_id: &str, instance_id: &str) -> TrackedItem {
    TrackedItem {
        instance_id: Some(instance_id.to_string()),
        item_id: item_id.to_string(),
        name: format!("Card {item_id}"),
        rank: None,
        owner_count: None,
        wanter_count: None,
        members: vec![ClubMember {
            user_id: "5".to_string(),
            name: "Reader".to_string(),
        }],
    }
}

pub fn boost() -> Option<OpportunityTarget> {
    Some(OpportunityTarget::new(format!("{CLUB_URL}/boost")))
}

pub struct Setup {
    pub items: Vec<Option<TrackedItem>>,
    pub opportunities: Vec<Option<OpportunityTarget>>,
    pub quota: Vec<bool>,
    pub poll_interval: Duration,
}

impl Setup {
    pub fn build(self, store_path: &Path) -> (ChangeMonitor, CallLog, CancellationSignal) {
        self.build_with_ceiling(store_path, 0)
    }

    /// Like `build`, stopping after `max_consecutive_failures` failed reads.
    pub fn build_with_ceiling(
        self,
        store_path: &Path,
        max_consecutive_failures: u32,
    ) -> (ChangeMonitor, CallLog, CancellationSignal) {
        let log = CallLog::default();
        let signal = CancellationSignal::new();

        let collab = Collaborators {
            remote: Arc::new(ScriptedRemote {
                log: log.clone(),
                items: Mutex::new(self.items.into()),
                opportunities: Mutex::new(self.opportunities.into()),
                submit_ok: true,
            }),
            quota: Arc::new(ScriptedQuota {
                log: log.clone(),
                answers: Mutex::new(self.quota.into()),
            }),
            notifier: Some(Arc::new(RecordingNotifier { log: log.clone() })),
            exchanges: Arc::new(RecordingExchanges { log: log.clone() }),
            store: DescriptorStore::new(store_path),
        };

        let settings = LoopSettings {
            resource_url: CLUB_URL.to_string(),
            poll_interval: self.poll_interval,
            heartbeat_interval: 20,
            contribution_settle_delay: Duration::ZERO,
            speculative_settle_delay: Duration::ZERO,
            max_consecutive_failures,
        };

        (
            ChangeMonitor::new(settings, collab, signal.clone()),
            log,
            signal,
        )
    }
}
