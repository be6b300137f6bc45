//! Immutable HTTP session for judge traffic.
//!
//! Cookies, CSRF token, browser-like headers and the optional proxy are fixed
//! when the session is built. Every judge call goes through the client built
//! here; nothing is mutated afterwards.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, COOKIE, HeaderMap, HeaderName, HeaderValue, ORIGIN,
    REFERER, USER_AGENT,
};

use crate::io::config::{JudgeConfig, Secrets};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/143.0.0.0 Safari/537.36";

/// Judge endpoint plus authentication material.
#[derive(Debug, Clone)]
pub struct JudgeSession {
    pub base_url: String,
    pub session_cookie: String,
    pub csrf_token: Option<String>,
    pub proxy: Option<String>,
    pub timeout: Duration,
}

impl JudgeSession {
    pub fn new(cfg: &JudgeConfig, secrets: &Secrets) -> Self {
        Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            session_cookie: secrets.leetcode_session.clone(),
            csrf_token: secrets.leetcode_csrf.clone(),
            proxy: cfg.proxy.clone(),
            timeout: Duration::from_secs(cfg.timeout_secs),
        }
    }

    /// `Cookie` header value carrying the session (and CSRF token if set).
    pub fn cookie_header(&self) -> String {
        match &self.csrf_token {
            Some(csrf) => format!(
                "LEETCODE_SESSION={}; csrftoken={}",
                self.session_cookie, csrf
            ),
            None => format!("LEETCODE_SESSION={}", self.session_cookie),
        }
    }

    /// Headers sent with every request.
    pub fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            ORIGIN,
            HeaderValue::from_str(&self.base_url).context("origin header")?,
        );
        headers.insert(
            REFERER,
            HeaderValue::from_str(&self.base_url).context("referer header")?,
        );
        let mut cookie = HeaderValue::from_str(&self.cookie_header()).context("cookie header")?;
        cookie.set_sensitive(true);
        headers.insert(COOKIE, cookie);
        if let Some(csrf) = &self.csrf_token {
            let mut value = HeaderValue::from_str(csrf).context("csrf header")?;
            value.set_sensitive(true);
            headers.insert(HeaderName::from_static("x-csrftoken"), value);
        }
        Ok(headers)
    }

    /// Build the blocking client for this session.
    pub fn build_client(&self) -> Result<Client> {
        let mut builder = Client::builder()
            .default_headers(self.default_headers()?)
            .timeout(self.timeout);
        if let Some(proxy) = &self.proxy {
            let proxy =
                reqwest::Proxy::all(proxy).with_context(|| format!("invalid proxy url {proxy}"))?;
            builder = builder.proxy(proxy);
        }
        builder.build().context("build judge http client")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(csrf: Option<&str>) -> JudgeSession {
        JudgeSession {
            base_url: "https://leetcode.com".to_string(),
            session_cookie: "sess".to_string(),
            csrf_token: csrf.map(str::to_string),
            proxy: None,
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn cookie_header_includes_csrf_when_present() {
        assert_eq!(session(None).cookie_header(), "LEETCODE_SESSION=sess");
        assert_eq!(
            session(Some("tok")).cookie_header(),
            "LEETCODE_SESSION=sess; csrftoken=tok"
        );
    }

    #[test]
    fn default_headers_carry_csrf_token() {
        let headers = session(Some("tok")).default_headers().expect("headers");
        assert_eq!(headers.get("x-csrftoken").expect("csrf"), "tok");
        assert_eq!(headers.get(ORIGIN).expect("origin"), "https://leetcode.com");

        let headers = session(None).default_headers().expect("headers");
        assert!(headers.get("x-csrftoken").is_none());
    }

    #[test]
    fn new_trims_trailing_slash() {
        let cfg = JudgeConfig {
            base_url: "https://leetcode.com/".to_string(),
            ..JudgeConfig::default()
        };
        let secrets = Secrets {
            leetcode_session: "sess".to_string(),
            ..Secrets::default()
        };
        assert_eq!(JudgeSession::new(&cfg, &secrets).base_url, "https://leetcode.com");
    }
}
