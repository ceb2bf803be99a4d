use super::change_loop::ChangeMonitor;
use crate::models::TrackedItem;
use std::thread;
use tracing::{info, warn};

impl ChangeMonitor {
    /// The club moved to a new item without a boost being open.
    ///
    /// Returns false when the follow-up read fails. `last_known_item_id`
    /// is left alone in that case so the next tick sees the change again.
    pub(crate) fn handle_identity_change(&mut self, previous: &str, observed: &TrackedItem) -> bool {
        info!(
            previous,
            current = %observed.item_id,
            "club item changed without a boost"
        );

        self.collab.cancel_exchanges();
        thread::sleep(self.settings.speculative_settle_delay);

        let Some(latest) = self
            .collab
            .remote
            .fetch_item_descriptor(&self.settings.resource_url)
        else {
            warn!("could not read the new club item, retrying next check");
            return false;
        };

        info!(item = %latest.summary(), "new club item");
        info!("{}", latest.members_line());

        self.collab.notify(&latest, &self.settings.resource_url);
        self.collab.persist(&latest);
        self.state.last_known_item_id = Some(latest.item_id);

        self.signal.raise();
        info!("offer producer told to restart against the new item");
        true
    }
}
