//! Read-only view of the Telegram users registry.
//!
//! The registry is written by the companion bot when someone links a site
//! account to their Telegram id. Layout, keyed by Telegram id:
//!
//! ```json
//! {
//!   "123456789": {
//!     "telegram_username": "taro",
//!     "mangabuff_accounts": [
//!       { "user_id": "826513", "username": "Taro", "notification_type": "dm" }
//!     ]
//!   }
//! }
//! ```

use crate::models::ClubMember;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// How a registered member wants to hear about items they hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// Direct message from the bot.
    Dm,
    /// Mention in the club chat message.
    #[default]
    Tag,
}

#[derive(Debug, Clone, Deserialize)]
struct LinkedAccount {
    user_id: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    notification_type: NotificationKind,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RegisteredUser {
    #[serde(default)]
    telegram_username: Option<String>,
    #[serde(default)]
    mangabuff_accounts: Vec<LinkedAccount>,
}

/// A club member matched to the Telegram user who linked them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRoute {
    pub telegram_id: i64,
    pub telegram_username: Option<String>,
    /// Display name of the linked site account.
    pub member_name: String,
    pub kind: NotificationKind,
}

#[derive(Debug, Default)]
pub struct UsersRegistry {
    users: BTreeMap<i64, RegisteredUser>,
}

impl UsersRegistry {
    /// Load the registry; a missing file is an empty registry.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read users registry: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Invalid users registry: {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let users = serde_json::from_str(content).context("Failed to parse users registry")?;
        Ok(Self { users })
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Routes for every listed member with a linked Telegram user, in
    /// member order.
    pub fn routes_for(&self, members: &[ClubMember]) -> Vec<MemberRoute> {
        let mut routes = Vec::new();
        for member in members {
            for (telegram_id, user) in &self.users {
                let Some(account) = user
                    .mangabuff_accounts
                    .iter()
                    .find(|a| a.user_id == member.user_id)
                else {
                    continue;
                };
                let member_name = if account.username.is_empty() {
                    member.name.clone()
                } else {
                    account.username.clone()
                };
                routes.push(MemberRoute {
                    telegram_id: *telegram_id,
                    telegram_username: user
                        .telegram_username
                        .clone()
                        .filter(|u| !u.trim().is_empty()),
                    member_name,
                    kind: account.notification_type,
                });
            }
        }
        routes
    }
}
