//! Change notifications sent to a Telegram chat.
//!
//! Notifications are best-effort: failures are logged and reported as
//! `false`, never propagated. Club members linked in the users registry
//! are mentioned in the chat message or sent a direct message, depending on
//! their preference.

pub mod users;

pub use users::{MemberRoute, NotificationKind, UsersRegistry};

use crate::config::TelegramConfig;
use crate::models::item::format_members;
use crate::models::{ClubMember, TrackedItem};
use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

const TELEGRAM_API: &str = "https://api.telegram.org";
const MAX_MESSAGE_CHARS: usize = 4096;

/// External channel told about item changes.
pub trait Notifier: Send + Sync {
    fn is_enabled(&self) -> bool;

    /// Announce `item` as the club's new item. True iff delivered.
    fn notify_change(&self, item: &TrackedItem, resource_url: &str, members: &[ClubMember])
        -> bool;
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// `Notifier` over the Telegram Bot API `sendMessage` method.
pub struct TelegramNotifier {
    client: Client,
    api_url: String,
    chat_id: String,
    thread_id: Option<i64>,
    users_path: Option<PathBuf>,
    enabled: bool,
}

impl TelegramNotifier {
    /// `users_path` points at the users registry; `None` disables member
    /// routing.
    pub fn new(
        config: &TelegramConfig,
        users_path: Option<PathBuf>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = crate::remote::create_http_client(timeout, None, None)?;
        Ok(Self {
            client,
            api_url: format!("{TELEGRAM_API}/bot{}", config.bot_token.trim()),
            chat_id: config.chat_id.trim().to_string(),
            thread_id: config.thread_id,
            users_path,
            enabled: config.is_configured(),
        })
    }

    /// Re-read on every notification: the registry is written by the bot
    /// while the monitor runs.
    fn member_routes(&self, members: &[ClubMember]) -> Vec<MemberRoute> {
        let Some(path) = &self.users_path else {
            return Vec::new();
        };
        match UsersRegistry::load(path) {
            Ok(registry) => registry.routes_for(members),
            Err(e) => {
                warn!(error = %format!("{e:#}"), "users registry unreadable, skipping member routing");
                Vec::new()
            }
        }
    }

    fn send_message(&self, chat_id: &str, thread_id: Option<i64>, text: &str) -> Result<()> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });
        if let Some(thread_id) = thread_id {
            body["message_thread_id"] = json!(thread_id);
        }

        let response = self
            .client
            .post(format!("{}/sendMessage", self.api_url))
            .json(&body)
            .send()
            .context("Telegram request failed")?;

        let status = response.status();
        if !status.is_success() {
            bail!("Telegram returned HTTP {status}");
        }

        let parsed: ApiResponse = response.json().context("Invalid Telegram response")?;
        if !parsed.ok {
            bail!(
                "Telegram rejected message: {}",
                parsed.description.unwrap_or_else(|| "no description".to_string())
            );
        }
        Ok(())
    }
}

impl Notifier for TelegramNotifier {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn notify_change(
        &self,
        item: &TrackedItem,
        resource_url: &str,
        members: &[ClubMember],
    ) -> bool {
        if !self.enabled {
            return false;
        }

        let routes = self.member_routes(members);
        let (direct, tagged): (Vec<MemberRoute>, Vec<MemberRoute>) = routes
            .into_iter()
            .partition(|r| r.kind == NotificationKind::Dm);

        let text = format_change_message(item, resource_url, members, &tagged);
        let delivered = match self.send_message(&self.chat_id, self.thread_id, &text) {
            Ok(()) => {
                debug!(item_id = %item.item_id, tagged = tagged.len(), "telegram notification delivered");
                true
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "telegram notification failed");
                false
            }
        };

        for route in &direct {
            let text = format_direct_message(item, resource_url, &route.member_name);
            if let Err(e) = self.send_message(&route.telegram_id.to_string(), None, &text) {
                warn!(
                    telegram_id = route.telegram_id,
                    error = %format!("{e:#}"),
                    "direct notification failed"
                );
            }
        }

        delivered
    }
}

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Mention for a registered member: `@username` when known, otherwise a
/// link to the Telegram user id.
pub fn format_mention(route: &MemberRoute) -> String {
    match &route.telegram_username {
        Some(username) => format!("@{}", escape_html(username.trim_start_matches('@'))),
        None => format!(
            "<a href=\"tg://user?id={}\">{}</a>",
            route.telegram_id,
            escape_html(&route.member_name)
        ),
    }
}

/// Body of the "new item in the club" message.
pub fn format_change_message(
    item: &TrackedItem,
    resource_url: &str,
    members: &[ClubMember],
    tagged: &[MemberRoute],
) -> String {
    let mut lines = vec![
        "<b>🎁 New card in the club!</b>".to_string(),
        String::new(),
        format!("<b>{}</b>", escape_html(&item.name)),
        format!(
            "ID: <code>{}</code> | Rank: {}",
            escape_html(&item.item_id),
            escape_html(item.rank.as_deref().unwrap_or("?"))
        ),
    ];

    if item.owner_count.is_some() || item.wanter_count.is_some() {
        lines.push(format!(
            "Owners: {} | Wanted by: {}",
            item.owner_count.map_or("?".to_string(), |c| c.to_string()),
            item.wanter_count.map_or("?".to_string(), |c| c.to_string()),
        ));
    }

    lines.push(String::new());
    lines.push(escape_html(&format_members(members)));
    if !tagged.is_empty() {
        let mentions: Vec<String> = tagged.iter().map(format_mention).collect();
        lines.push(mentions.join(" "));
    }
    lines.push(String::new());
    lines.push(format!(
        "<a href=\"{}\">Open club page</a>",
        escape_html(resource_url)
    ));

    let text = lines.join("\n");
    if text.chars().count() > MAX_MESSAGE_CHARS {
        // Member lists are the only unbounded part; drop them rather than
        // cut an HTML tag in half.
        return format_change_message(item, resource_url, &[], tagged);
    }
    text
}

/// Direct message for a member who holds the club's new item.
pub fn format_direct_message(item: &TrackedItem, resource_url: &str, member_name: &str) -> String {
    format!(
        "<b>🎁 The club wants a card you hold</b>\n\n{}: <b>{}</b> (ID <code>{}</code>)\n\n<a href=\"{}\">Open club page</a>",
        escape_html(member_name),
        escape_html(&item.name),
        escape_html(&item.item_id),
        escape_html(resource_url)
    )
}
