//! The contribution sequence run once a boost opportunity is admitted.

use super::collaborators::Collaborators;
use super::events::{ContributionOutcome, ContributionReport};
use crate::models::OpportunityTarget;
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};

pub struct ContributionPipeline<'a> {
    collab: &'a Collaborators,
    resource_url: &'a str,
    settle_delay: Duration,
}

impl<'a> ContributionPipeline<'a> {
    pub fn new(collab: &'a Collaborators, resource_url: &'a str, settle_delay: Duration) -> Self {
        Self {
            collab,
            resource_url,
            settle_delay,
        }
    }

    /// Contribute to the open boost and handle what follows.
    ///
    /// Order is fixed: quota recheck, descriptor read, submit, settle,
    /// re-read, notify (if changed), persist, cancel exchanges, quota
    /// bookkeeping. The notification goes out before any cleanup so the
    /// operator hears about the change as early as possible.
    pub fn attempt(&self, target: &OpportunityTarget) -> ContributionReport {
        let collab = self.collab;

        if !collab.quota.can_proceed(true) {
            warn!("daily contribution limit reached before submitting");
            return ContributionReport::failed(ContributionOutcome::QuotaDenied, None);
        }

        let Some(current) = collab.remote.fetch_item_descriptor(&target.url) else {
            error!(url = %target.url, "could not read the item to contribute");
            return ContributionReport::failed(ContributionOutcome::NoDescriptor, None);
        };
        let previous_item_id = Some(current.item_id.clone());

        let Some(instance_id) = current.instance_id.as_deref() else {
            error!(item_id = %current.item_id, "no owned instance of the requested item");
            return ContributionReport::failed(
                ContributionOutcome::NoInstanceHandle,
                previous_item_id,
            );
        };

        info!(
            item = %current.summary(),
            instance_id,
            "contributing item"
        );

        if !collab.remote.submit_contribution(target, instance_id) {
            error!(item_id = %current.item_id, "contribution was not accepted");
            return ContributionReport::failed(ContributionOutcome::SubmitFailed, previous_item_id);
        }

        info!(item_id = %current.item_id, "contribution accepted");
        thread::sleep(self.settle_delay);

        let outcome = match collab.remote.fetch_item_descriptor(&target.url) {
            Some(latest) if latest.differs_from(&current) => {
                collab.notify(&latest, self.resource_url);
                info!(
                    previous = %current.item_id,
                    item = %latest.summary(),
                    "club item changed after contribution"
                );
                info!("{}", latest.members_line());
                collab.persist(&latest);
                Some((ContributionOutcome::Changed, latest.item_id))
            }
            Some(latest) => {
                warn!(item_id = %latest.item_id, "club item unchanged after contribution");
                collab.persist(&latest);
                Some((ContributionOutcome::Unchanged, latest.item_id))
            }
            None => {
                warn!("could not re-read the club item after contributing");
                None
            }
        };

        collab.cancel_exchanges();
        collab.quota.record_contribution();
        collab.quota.refresh();
        collab.quota.display();

        match outcome {
            Some((outcome, new_item_id)) => ContributionReport {
                outcome,
                previous_item_id,
                new_item_id: Some(new_item_id),
            },
            None => ContributionReport {
                outcome: ContributionOutcome::Unverified,
                previous_item_id,
                new_item_id: None,
            },
        }
    }
}
