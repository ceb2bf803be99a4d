//! Club boost page parsing.
//!
//! The page is matched with a handful of anchored regular expressions rather
//! than a DOM: only the boost control, the card block attributes and the
//! member links are needed.

use super::error::{RemoteError, Result};
use crate::models::{ClubMember, TrackedItem};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a\b([^>]*)>(.*?)</a>").expect("Invalid regex"));
static BUTTON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<button\b([^>]*)>(.*?)</button>").expect("Invalid regex")
});
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]+>").expect("Invalid regex"));
static CARD_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<[a-z]+\b([^>]*\bdata-card-id\s*=\s*"[^"]*"[^>]*)>"#)
        .expect("Invalid regex")
});
static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)class\s*=\s*"[^"]*\bclub-boost__name\b[^"]*"[^>]*>(.*?)</"#)
        .expect("Invalid regex")
});
static OWNERS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)class\s*=\s*"[^"]*\bclub-boost__owners\b[^"]*"[^>]*>\D*?(\d+)"#)
        .expect("Invalid regex")
});
static WANTERS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)class\s*=\s*"[^"]*\bclub-boost__wanters\b[^"]*"[^>]*>\D*?(\d+)"#)
        .expect("Invalid regex")
});
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)([a-z_:][-a-z0-9_:.]*)\s*=\s*"([^"]*)""#).expect("Invalid regex")
});
static USER_HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/users/(\d+)").expect("Invalid regex"));

const BOOST_CLASSES: [&str; 2] = ["club_boost-btn", "club-boost-btn"];
const BOOST_TEXT: [&str; 2] = ["Пожертвовать", "пожертвовать"];
const MEMBER_CLASS: &str = "club-boost__user";

/// Value of `name="..."` inside a tag's attribute text.
pub fn attr(attrs: &str, name: &str) -> Option<String> {
    ATTR_RE
        .captures_iter(attrs)
        .find(|c| c[1].eq_ignore_ascii_case(name))
        .map(|c| decode_entities(&c[2]))
}

fn has_class(attrs: &str, class: &str) -> bool {
    attr(attrs, "class").is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
}

/// Visible text of an HTML fragment, whitespace-collapsed.
pub fn inner_text(fragment: &str) -> String {
    let stripped = TAG_RE.replace_all(fragment, " ");
    decode_entities(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#039;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Result of looking for the boost control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoostControl {
    /// Control present with a link.
    Link(String),
    /// Control present but carries no href; contribute from the page itself.
    Inline,
}

/// Find the boost control: class match first, then visible text.
pub fn find_boost_control(html: &str) -> Option<BoostControl> {
    let elements: Vec<(String, String)> = ANCHOR_RE
        .captures_iter(html)
        .chain(BUTTON_RE.captures_iter(html))
        .map(|c| (c[1].to_string(), c[2].to_string()))
        .collect();

    let by_class = elements
        .iter()
        .find(|(attrs, _)| BOOST_CLASSES.iter().any(|class| has_class(attrs, class)));

    let found = by_class.or_else(|| {
        elements
            .iter()
            .find(|(_, body)| BOOST_TEXT.iter().any(|text| inner_text(body).contains(text)))
    })?;

    Some(match attr(&found.0, "href") {
        Some(href) if !href.trim().is_empty() => BoostControl::Link(href.trim().to_string()),
        _ => BoostControl::Inline,
    })
}

/// Turn a possibly-relative link into an absolute URL on `base_url`.
pub fn resolve_url(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    let base = base_url.trim_end_matches('/');
    if href.starts_with('/') {
        format!("{base}{href}")
    } else {
        format!("{base}/{href}")
    }
}

fn parse_count(captured: Option<&str>, field: &'static str) -> Result<Option<u32>> {
    match captured {
        Some(raw) => raw
            .parse::<u32>()
            .map(Some)
            .map_err(|_| RemoteError::InvalidField {
                field,
                value: raw.to_string(),
            }),
        None => {
            debug!(field, "optional field absent from club page");
            Ok(None)
        }
    }
}

/// Parse the item currently held by the club.
///
/// The item id and name are required; the page is rejected without them so
/// markup drift shows up in the logs instead of as a phantom item change.
pub fn parse_tracked_item(html: &str) -> Result<TrackedItem> {
    let card_attrs = CARD_TAG_RE
        .captures(html)
        .map(|c| c[1].to_string())
        .ok_or(RemoteError::MissingField("card block"))?;

    let item_id = attr(&card_attrs, "data-card-id")
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or(RemoteError::MissingField("card id"))?;
    if !item_id.chars().all(|c| c.is_ascii_digit()) {
        return Err(RemoteError::InvalidField {
            field: "card id",
            value: item_id,
        });
    }

    let name = NAME_RE
        .captures(html)
        .map(|c| inner_text(&c[1]))
        .filter(|n| !n.is_empty())
        .ok_or(RemoteError::MissingField("card name"))?;

    let instance_id = attr(&card_attrs, "data-id")
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty() && id != "0");
    if instance_id.is_none() {
        debug!(item_id = %item_id, "card block has no instance id");
    }

    let rank = attr(&card_attrs, "data-rank").filter(|r| !r.trim().is_empty());
    let owner_count = parse_count(
        OWNERS_RE.captures(html).and_then(|c| c.get(1)).map(|m| m.as_str()),
        "owners count",
    )?;
    let wanter_count = parse_count(
        WANTERS_RE.captures(html).and_then(|c| c.get(1)).map(|m| m.as_str()),
        "wanters count",
    )?;

    Ok(TrackedItem {
        instance_id,
        item_id,
        name,
        rank,
        owner_count,
        wanter_count,
        members: parse_members(html),
    })
}

/// Club members listed as holding the current item, in page order.
pub fn parse_members(html: &str) -> Vec<ClubMember> {
    let mut members: Vec<ClubMember> = Vec::new();

    for caps in ANCHOR_RE.captures_iter(html) {
        let attrs = &caps[1];
        if !has_class(attrs, MEMBER_CLASS) {
            continue;
        }
        let Some(href) = attr(attrs, "href") else {
            continue;
        };
        let Some(user_id) = USER_HREF_RE.captures(&href).map(|c| c[1].to_string()) else {
            continue;
        };
        if members.iter().any(|m| m.user_id == user_id) {
            continue;
        }

        let text = inner_text(&caps[2]);
        let name = if text.is_empty() {
            attr(attrs, "title").unwrap_or_else(|| format!("User{user_id}"))
        } else {
            text
        };
        members.push(ClubMember { user_id, name });
    }

    members
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <div class="club-boost">
          <div class="club-boost__card" data-id="42" data-card-id="100" data-rank="S">
            <img src="/img/cards/100.webp">
            <div class="club-boost__name">Rem &amp; Ram</div>
            <div class="club-boost__owners">Владельцев: 15</div>
            <div class="club-boost__wanters">Желающих: 3</div>
          </div>
          <div class="club-boost__users">
            <a class="club-boost__user" href="/users/258280">LTM I PoliS</a>
            <a class="club-boost__user" href="/users/826513" title="Taro"><img src="a.png"></a>
            <a class="club-boost__user" href="/users/258280">LTM I PoliS</a>
          </div>
          <a class="button club_boost-btn" href="/clubs/boost?id=9">Пожертвовать карту</a>
        </div>
    "#;

    #[test]
    fn test_parse_full_card() {
        let item = parse_tracked_item(PAGE).unwrap();

        assert_eq!(item.item_id, "100");
        assert_eq!(item.instance_id.as_deref(), Some("42"));
        assert_eq!(item.name, "Rem & Ram");
        assert_eq!(item.rank.as_deref(), Some("S"));
        assert_eq!(item.owner_count, Some(15));
        assert_eq!(item.wanter_count, Some(3));
        assert_eq!(
            item.members,
            vec![
                ClubMember { user_id: "258280".into(), name: "LTM I PoliS".into() },
                ClubMember { user_id: "826513".into(), name: "Taro".into() },
            ]
        );
    }

    #[test]
    fn test_missing_card_id_is_rejected() {
        let html = r#"<div class="club-boost__name">Nameless</div>"#;
        assert!(matches!(
            parse_tracked_item(html),
            Err(RemoteError::MissingField("card block"))
        ));
    }

    #[test]
    fn test_missing_name_is_rejected() {
        let html = r#"<div data-card-id="5" data-id="9"></div>"#;
        assert!(matches!(
            parse_tracked_item(html),
            Err(RemoteError::MissingField("card name"))
        ));
    }

    #[test]
    fn test_non_numeric_card_id_is_rejected() {
        let html = r#"<div data-card-id="abc"></div><p class="club-boost__name">X</p>"#;
        assert!(matches!(
            parse_tracked_item(html),
            Err(RemoteError::InvalidField { field: "card id", .. })
        ));
    }

    #[test]
    fn test_zero_instance_id_means_absent() {
        let html = r#"<div data-card-id="5" data-id="0"></div><p class="club-boost__name">X</p>"#;
        let item = parse_tracked_item(html).unwrap();
        assert_eq!(item.instance_id, None);
        assert_eq!(item.owner_count, None);
        assert!(item.members.is_empty());
    }

    #[test]
    fn test_boost_control_by_class() {
        assert_eq!(
            find_boost_control(PAGE),
            Some(BoostControl::Link("/clubs/boost?id=9".to_string()))
        );
    }

    #[test]
    fn test_boost_control_by_text_without_href() {
        let html = r#"<button type="button" class="btn">Пожертвовать карту</button>"#;
        assert_eq!(find_boost_control(html), Some(BoostControl::Inline));
    }

    #[test]
    fn test_no_boost_control() {
        let html = r#"<a href="/clubs/taro">Клуб</a><button>Обмен</button>"#;
        assert_eq!(find_boost_control(html), None);
    }

    #[test]
    fn test_resolve_url() {
        let base = "https://mangabuff.ru/";
        assert_eq!(resolve_url(base, "/clubs/boost"), "https://mangabuff.ru/clubs/boost");
        assert_eq!(resolve_url(base, "clubs/boost"), "https://mangabuff.ru/clubs/boost");
        assert_eq!(resolve_url(base, "https://other.ru/x"), "https://other.ru/x");
    }

    #[test]
    fn test_attr_is_not_fooled_by_prefixed_names() {
        let attrs = r#" data-id="42" data-card-id="100""#;
        assert_eq!(attr(attrs, "data-id").as_deref(), Some("42"));
        assert_eq!(attr(attrs, "id"), None);
    }

    #[test]
    fn test_attr_is_case_insensitive_and_skips_values() {
        let attrs = r#" title="href=&quot;x&quot;" HREF="/users/7""#;
        assert_eq!(attr(attrs, "href").as_deref(), Some("/users/7"));
        assert_eq!(attr(attrs, "title").as_deref(), Some("href=\"x\""));
    }

    #[test]
    fn test_large_page_with_many_links() {
        let mut html = String::new();
        for i in 0..2000 {
            html.push_str(&format!(r#"<a class="nav-link" href="/manga/{i}">Title {i}</a>"#));
        }
        for i in 0..300 {
            html.push_str(&format!(
                r#"<a class="club-boost__user" href="/users/{i}">User {i}</a>"#
            ));
        }
        html.push_str(r#"<a class="club-boost-btn" href="/clubs/boost?id=1">Go</a>"#);

        for _ in 0..5 {
            assert_eq!(
                find_boost_control(&html),
                Some(BoostControl::Link("/clubs/boost?id=1".to_string()))
            );
            let members = parse_members(&html);
            assert_eq!(members.len(), 300);
            assert_eq!(members[299].user_id, "299");
        }
    }
}
