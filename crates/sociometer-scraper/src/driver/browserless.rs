use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use sociometer_store::Cookie;

use super::PageDriver;
use crate::error::DriverError;
use crate::extract::PageState;

/// Extra time granted to the HTTP request beyond the in-browser navigation
/// timeout, so the renderer can report its own timeout first.
const REQUEST_SLACK: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GotoOptions {
    timeout: u64,
    wait_until: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireCookie<'a> {
    name: &'a str,
    value: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    domain: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires: Option<f64>,
    http_only: bool,
    secure: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ContentRequest<'a> {
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_agent: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    cookies: Vec<WireCookie<'a>>,
    goto_options: GotoOptions,
}

/// Renders pages through a Browserless-compatible `POST /content` endpoint.
///
/// Each navigation is a fresh render. The endpoint returns markup only, so
/// scrolling, pointer movement and clicks are accepted but leave the snapshot
/// unchanged, and cookies set by the page are not observed: [`cookies`]
/// returns what was last set. A navigation that fails or times out leaves no
/// page behind.
///
/// [`cookies`]: PageDriver::cookies
pub struct BrowserlessDriver {
    client: Client,
    base_url: String,
    token: Option<String>,
    user_agent: Option<String>,
    cookies: Vec<Cookie>,
    page: Option<PageState>,
}

impl BrowserlessDriver {
    /// # Errors
    ///
    /// Returns [`DriverError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self, DriverError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
            user_agent: None,
            cookies: Vec::new(),
            page: None,
        })
    }

    fn endpoint(&self) -> String {
        match &self.token {
            Some(token) => format!("{}/content?token={token}", self.base_url),
            None => format!("{}/content", self.base_url),
        }
    }
}

#[async_trait]
impl PageDriver for BrowserlessDriver {
    async fn set_user_agent(&mut self, user_agent: &str) -> Result<(), DriverError> {
        self.user_agent = Some(user_agent.to_string());
        Ok(())
    }

    async fn set_cookies(&mut self, cookies: &[Cookie]) -> Result<(), DriverError> {
        self.cookies = cookies.to_vec();
        Ok(())
    }

    async fn cookies(&mut self) -> Result<Vec<Cookie>, DriverError> {
        Ok(self.cookies.clone())
    }

    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), DriverError> {
        self.page = None;
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        let body = ContentRequest {
            url,
            user_agent: self.user_agent.as_deref(),
            cookies: self
                .cookies
                .iter()
                .map(|c| WireCookie {
                    name: &c.name,
                    value: &c.value,
                    domain: c.domain.as_deref(),
                    path: c.path.as_deref(),
                    url: c.domain.is_none().then_some(url),
                    expires: c.expires,
                    http_only: c.http_only,
                    secure: c.secure,
                })
                .collect(),
            goto_options: GotoOptions {
                timeout: timeout_ms,
                wait_until: "networkidle2",
            },
        };

        let timed_out = || DriverError::Timeout {
            url: url.to_string(),
            timeout_secs: timeout.as_secs(),
        };

        let response = self
            .client
            .post(self.endpoint())
            .timeout(timeout + REQUEST_SLACK)
            .json(&body)
            .send()
            .await
            .map_err(|e| if e.is_timeout() { timed_out() } else { DriverError::Http(e) })?;

        let status = response.status();
        if status == reqwest::StatusCode::REQUEST_TIMEOUT {
            return Err(timed_out());
        }
        if !status.is_success() {
            return Err(DriverError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let html = response
            .text()
            .await
            .map_err(|e| if e.is_timeout() { timed_out() } else { DriverError::Http(e) })?;
        tracing::debug!(url, bytes = html.len(), "page rendered");
        self.page = Some(PageState::new(url, html));
        Ok(())
    }

    async fn snapshot(&mut self) -> Result<PageState, DriverError> {
        self.page.clone().ok_or(DriverError::NoPage)
    }

    async fn scroll_by(&mut self, _dy: i64) -> Result<(), DriverError> {
        Ok(())
    }

    async fn move_pointer(&mut self, _x: u32, _y: u32) -> Result<(), DriverError> {
        Ok(())
    }

    async fn click(&mut self, _selector: &str) -> Result<bool, DriverError> {
        Ok(false)
    }
}
