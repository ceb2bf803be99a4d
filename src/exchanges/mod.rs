//! Cancellation of outbound exchange offers the concurrent producer may
//! still have pending.

use crate::config::MonitorConfig;
use crate::remote::create_http_client;
use anyhow::Result;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use tracing::{debug, warn};

pub trait ExchangeCanceller: Send + Sync {
    /// Withdraw every pending offer. Having nothing to withdraw is success.
    fn cancel_pending_exchanges(&self) -> bool;
}

pub struct HttpExchangeCanceller {
    client: Client,
    url: String,
    csrf_token: String,
}

impl HttpExchangeCanceller {
    pub fn new(config: &MonitorConfig) -> Result<Self> {
        let client = create_http_client(
            config.request_timeout(),
            Some(&config.session.cookie),
            config.session.user_agent.as_deref(),
        )?;
        let base = config.base_url.trim_end_matches('/');
        let path = config.exchanges.cancel_path.trim();
        let url = if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        };

        Ok(Self {
            client,
            url,
            csrf_token: config.session.csrf_token.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ExchangeCanceller for HttpExchangeCanceller {
    fn cancel_pending_exchanges(&self) -> bool {
        let response = self
            .client
            .post(&self.url)
            .header("X-CSRF-TOKEN", self.csrf_token.as_str())
            .header("X-Requested-With", "XMLHttpRequest")
            .form(&[("_token", self.csrf_token.as_str())])
            .send();

        match response {
            Ok(resp) if resp.status() == StatusCode::OK => true,
            Ok(resp) if resp.status() == StatusCode::NOT_FOUND => {
                debug!("no pending exchanges to cancel");
                true
            }
            Ok(resp) => {
                warn!(status = %resp.status(), "exchange cancellation rejected");
                false
            }
            Err(e) => {
                warn!(error = %e, "exchange cancellation request failed");
                false
            }
        }
    }
}
