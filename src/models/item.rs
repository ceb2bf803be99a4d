use serde::{Deserialize, Serialize};
use std::fmt;

/// Snapshot of the item currently held by the club.
///
/// Built fresh from every fetch and never mutated. Two snapshots describe
/// the same item when their `item_id` matches; `instance_id` changes every
/// contribution cycle and is only needed to submit a contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedItem {
    pub instance_id: Option<String>,
    pub item_id: String,
    pub name: String,
    pub rank: Option<String>,
    pub owner_count: Option<u32>,
    pub wanter_count: Option<u32>,
    #[serde(default)]
    pub members: Vec<ClubMember>,
}

impl TrackedItem {
    /// Whether `other` holds a different kind of item than `self`.
    pub fn differs_from(&self, other: &TrackedItem) -> bool {
        self.item_id != other.item_id
    }

    /// One-line human summary used in log output.
    pub fn summary(&self) -> String {
        format!(
            "{} (id {}, instance {}, rank {}, owners {}, wanters {})",
            self.name,
            self.item_id,
            self.instance_id.as_deref().unwrap_or("?"),
            self.rank.as_deref().unwrap_or("?"),
            display_count(self.owner_count),
            display_count(self.wanter_count),
        )
    }

    /// Comma-separated member names, or a placeholder when nobody is listed.
    pub fn members_line(&self) -> String {
        format_members(&self.members)
    }
}

fn display_count(count: Option<u32>) -> String {
    count.map_or_else(|| "?".to_string(), |c| c.to_string())
}

/// Format a member list for logs and notifications.
pub fn format_members(members: &[ClubMember]) -> String {
    if members.is_empty() {
        return "No club members hold this item".to_string();
    }

    let names: Vec<&str> = members.iter().map(|m| m.name.as_str()).collect();
    format!("Club members with this item ({}): {}", names.len(), names.join(", "))
}

/// A club member shown next to the tracked item. Display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClubMember {
    pub user_id: String,
    pub name: String,
}

/// Where a contribution is submitted once the boost control is visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpportunityTarget {
    pub url: String,
}

impl OpportunityTarget {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl fmt::Display for OpportunityTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}
