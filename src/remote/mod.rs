//! Access to the club site: reading the boost page and submitting
//! contributions.

mod error;
pub mod parse;

pub use error::RemoteError;

use crate::config::MonitorConfig;
use crate::models::{OpportunityTarget, TrackedItem};
use anyhow::{Context, Result};
use parse::BoostControl;
use reqwest::blocking::{Client, Response};
use reqwest::header::{self, HeaderMap, HeaderValue};
use std::time::Duration;
use tracing::{debug, warn};

const CONNECT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_USER_AGENT: &str = concat!("clubwatch/", env!("CARGO_PKG_VERSION"));
const CONTRIBUTE_PATH: &str = "/clubs/boost";

/// Reads and writes against the monitored resource.
///
/// Every method absorbs its own failures: a transport or parse error is
/// logged and reported as "nothing observed", never raised to the caller.
pub trait RemoteState: Send + Sync {
    /// Target URL for a contribution if the boost control is showing.
    fn fetch_opportunity(&self, resource_url: &str) -> Option<OpportunityTarget>;

    /// The item the club currently holds.
    fn fetch_item_descriptor(&self, resource_url: &str) -> Option<TrackedItem>;

    /// Submit the held instance. True iff the site answered with success.
    fn submit_contribution(&self, target: &OpportunityTarget, instance_id: &str) -> bool;
}

/// Create an HTTP client with connect and total timeouts.
///
/// `cookie` is attached to every request when present.
pub fn create_http_client(
    timeout: Duration,
    cookie: Option<&str>,
    user_agent: Option<&str>,
) -> Result<Client> {
    let mut headers = HeaderMap::new();
    if let Some(cookie) = cookie.filter(|c| !c.trim().is_empty()) {
        let value = HeaderValue::from_str(cookie.trim()).context("Invalid session cookie")?;
        headers.insert(header::COOKIE, value);
    }

    Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(timeout))
        .timeout(timeout)
        .user_agent(user_agent.unwrap_or(DEFAULT_USER_AGENT))
        .default_headers(headers)
        .build()
        .context("Failed to create HTTP client")
}

/// Return the response if its status is 200, otherwise a typed error.
fn require_ok(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.as_u16() != 200 {
        return Err(RemoteError::Status {
            status: status.as_u16(),
            url: response.url().to_string(),
        });
    }
    Ok(response)
}

/// `RemoteState` over blocking HTTP with the configured session.
pub struct HttpRemote {
    client: Client,
    base_url: String,
    csrf_token: String,
}

impl HttpRemote {
    pub fn new(config: &MonitorConfig) -> Result<Self> {
        let client = create_http_client(
            config.request_timeout(),
            Some(&config.session.cookie),
            config.session.user_agent.as_deref(),
        )?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            csrf_token: config.session.csrf_token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get_page(&self, url: &str) -> Result<String, RemoteError> {
        let response = self.client.get(url).send()?;
        let body = require_ok(response)?.text()?;
        Ok(body)
    }

    /// Typed variant of `fetch_opportunity`, for callers that want the reason.
    pub fn try_fetch_opportunity(
        &self,
        resource_url: &str,
    ) -> Result<Option<OpportunityTarget>, RemoteError> {
        let html = self.get_page(resource_url)?;
        let target = parse::find_boost_control(&html).map(|control| match control {
            BoostControl::Link(href) => parse::resolve_url(&self.base_url, &href),
            BoostControl::Inline => resource_url.to_string(),
        });
        Ok(target.map(OpportunityTarget::new))
    }

    /// Typed variant of `fetch_item_descriptor`.
    pub fn try_fetch_item_descriptor(&self, resource_url: &str) -> Result<TrackedItem, RemoteError> {
        let html = self.get_page(resource_url)?;
        parse::parse_tracked_item(&html)
    }

    fn try_submit(&self, target: &OpportunityTarget, instance_id: &str) -> Result<(), RemoteError> {
        let url = format!("{}{CONTRIBUTE_PATH}", self.base_url);
        let form = [("card_id", instance_id), ("_token", self.csrf_token.as_str())];

        let response = self
            .client
            .post(&url)
            .header(header::REFERER, target.url.as_str())
            .header(header::ORIGIN, self.base_url.as_str())
            .header("X-Requested-With", "XMLHttpRequest")
            .header("X-CSRF-TOKEN", self.csrf_token.as_str())
            .form(&form)
            .send()?;
        require_ok(response)?;
        Ok(())
    }
}

impl RemoteState for HttpRemote {
    fn fetch_opportunity(&self, resource_url: &str) -> Option<OpportunityTarget> {
        match self.try_fetch_opportunity(resource_url) {
            Ok(target) => target,
            Err(e) => {
                warn!(url = resource_url, error = %e, "boost check failed");
                None
            }
        }
    }

    fn fetch_item_descriptor(&self, resource_url: &str) -> Option<TrackedItem> {
        match self.try_fetch_item_descriptor(resource_url) {
            Ok(item) => {
                debug!(url = resource_url, item_id = %item.item_id, "fetched club item");
                Some(item)
            }
            Err(e) => {
                warn!(url = resource_url, error = %e, "club item fetch failed");
                None
            }
        }
    }

    fn submit_contribution(&self, target: &OpportunityTarget, instance_id: &str) -> bool {
        match self.try_submit(target, instance_id) {
            Ok(()) => true,
            Err(e) => {
                warn!(target = %target, instance_id, error = %e, "contribution request failed");
                false
            }
        }
    }
}
