/// How a contribution attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContributionOutcome {
    /// The second quota check denied admission.
    QuotaDenied,
    /// The assignable item could not be read.
    NoDescriptor,
    /// The assignable item carried no instance handle.
    NoInstanceHandle,
    /// The site did not accept the submission.
    SubmitFailed,
    /// Submitted and the club now holds a different item.
    Changed,
    /// Submitted but the club still holds the same item.
    Unchanged,
    /// Submitted but the verifying re-read failed.
    Unverified,
}

impl ContributionOutcome {
    /// True once the submission itself was accepted.
    pub fn submitted(self) -> bool {
        matches!(self, Self::Changed | Self::Unchanged | Self::Unverified)
    }
}

/// Result of `ContributionPipeline::attempt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributionReport {
    pub outcome: ContributionOutcome,
    /// Item id read before submitting.
    pub previous_item_id: Option<String>,
    /// Item id read after the settle delay.
    pub new_item_id: Option<String>,
}

impl ContributionReport {
    pub(crate) fn failed(outcome: ContributionOutcome, previous_item_id: Option<String>) -> Self {
        Self {
            outcome,
            previous_item_id,
            new_item_id: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.outcome.submitted()
    }
}

/// What a single tick of the monitor did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing changed and no boost was open. `heartbeat` is true when the
    /// periodic status line was logged.
    Quiet { heartbeat: bool },
    /// The held item changed without a boost; `handled` is false when the
    /// follow-up read failed and the change will be retried next tick.
    IdentityChanged {
        previous: String,
        current: String,
        handled: bool,
    },
    /// A boost was open but the quota denied it.
    QuotaExhausted,
    /// A boost was open and a contribution was attempted.
    Contributed(ContributionReport),
}
