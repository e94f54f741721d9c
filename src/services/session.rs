// src/services/session.rs

//! Search session transport.
//!
//! The session is the single stateful connection used to navigate search
//! pages: it keeps cookies between requests and a log of the responses it
//! has seen. It is owned by the control flow and never shared with the
//! download workers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Browser, SearchConfig};

/// A response recorded by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResponse {
    /// Final URL after redirects
    pub url: Url,
    pub status: u16,
    pub body: String,
}

impl PageResponse {
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Navigation transport for search pages.
#[async_trait]
pub trait SearchSession: Send {
    /// Navigate to `url`, recording the response.
    async fn navigate(&mut self, url: &Url) -> Result<()>;

    /// The recorded response for the URL the session is currently on.
    fn current_response(&self) -> Option<&PageResponse>;

    /// Forget all recorded responses.
    fn clear_responses(&mut self);

    /// Release the session. Further navigation fails.
    async fn close(&mut self) -> Result<()>;
}

/// HTTP-backed session presenting a browser profile.
pub struct HttpSession {
    client: Option<Client>,
    current_url: Option<Url>,
    responses: Vec<PageResponse>,
}

impl HttpSession {
    /// Build a session with a persistent cookie store.
    pub fn new(browser: Browser, config: &SearchConfig) -> Result<Self> {
        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| browser.user_agent().to_string());
        let client = Client::builder()
            .user_agent(user_agent)
            .cookie_store(true)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        log::debug!("Opened {browser} search session");
        Ok(Self {
            client: Some(client),
            current_url: None,
            responses: Vec::new(),
        })
    }
}

#[async_trait]
impl SearchSession for HttpSession {
    async fn navigate(&mut self, url: &Url) -> Result<()> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| AppError::session("session is closed"))?;

        let response = client.get(url.clone()).send().await?;
        let final_url = response.url().clone();
        let status = response.status().as_u16();
        let body = response.text().await?;

        self.current_url = Some(final_url.clone());
        self.responses.push(PageResponse {
            url: final_url,
            status,
            body,
        });
        Ok(())
    }

    fn current_response(&self) -> Option<&PageResponse> {
        let current = self.current_url.as_ref()?;
        self.responses.iter().rev().find(|r| &r.url == current)
    }

    fn clear_responses(&mut self) {
        self.responses.clear();
    }

    async fn close(&mut self) -> Result<()> {
        if self.client.take().is_some() {
            log::debug!("Search session closed");
        }
        self.responses.clear();
        self.current_url = None;
        Ok(())
    }
}
