use crate::config::MonitorConfig;
use crate::exchanges::{ExchangeCanceller, HttpExchangeCanceller};
use crate::models::TrackedItem;
use crate::notify::{Notifier, TelegramNotifier};
use crate::quota::{DailyQuota, QuotaGate};
use crate::remote::{HttpRemote, RemoteState};
use crate::store::DescriptorStore;
use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Everything the monitor talks to outside its own state.
pub struct Collaborators {
    pub remote: Arc<dyn RemoteState>,
    pub quota: Arc<dyn QuotaGate>,
    pub notifier: Option<Arc<dyn Notifier>>,
    pub exchanges: Arc<dyn ExchangeCanceller>,
    pub store: DescriptorStore,
}

impl Collaborators {
    /// HTTP-backed collaborators for a live run.
    pub fn from_config(config: &MonitorConfig) -> Result<Self> {
        let notifier: Option<Arc<dyn Notifier>> = if config.telegram.is_configured() {
            Some(Arc::new(TelegramNotifier::new(
                &config.telegram,
                Some(config.users_path()),
                config.request_timeout(),
            )?))
        } else {
            None
        };

        Ok(Self {
            remote: Arc::new(HttpRemote::new(config)?),
            quota: Arc::new(DailyQuota::open(config.quota_path(), config.quota.daily_limit)),
            notifier,
            exchanges: Arc::new(HttpExchangeCanceller::new(config)?),
            store: DescriptorStore::new(config.descriptor_path()),
        })
    }

    pub fn notifications_enabled(&self) -> bool {
        self.notifier.as_ref().is_some_and(|n| n.is_enabled())
    }

    /// Send the change notification if a channel is enabled.
    pub(crate) fn notify(&self, item: &TrackedItem, resource_url: &str) {
        let Some(notifier) = self.notifier.as_ref().filter(|n| n.is_enabled()) else {
            return;
        };

        if notifier.notify_change(item, resource_url, &item.members) {
            info!(item_id = %item.item_id, "change notification sent");
        } else {
            warn!(item_id = %item.item_id, "change notification failed");
        }
    }

    /// Persist the descriptor; failure is logged and otherwise ignored.
    pub(crate) fn persist(&self, item: &TrackedItem) {
        match self.store.persist(item) {
            Ok(()) => info!(path = %self.store.path().display(), "descriptor saved"),
            Err(e) => error!(error = %format!("{e:#}"), "failed to save descriptor"),
        }
    }

    pub(crate) fn cancel_exchanges(&self) {
        info!("cancelling pending exchanges");
        if self.exchanges.cancel_pending_exchanges() {
            info!("pending exchanges cancelled");
        } else {
            warn!("could not cancel exchanges (there may have been none)");
        }
    }
}
