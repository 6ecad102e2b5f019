//! HTTP session for the collection exporter
//!
//! Headers and cookies live on an explicit [`Session`] built once per run and
//! passed to the lister and the fetchers.

use crate::error::FetchError;
use crate::DEFAULT_USER_AGENT;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, COOKIE, USER_AGENT};
use tracing::debug;

/// Base URL of the collections API
pub const DEFAULT_API_BASE: &str = "https://www.zhihu.com/api/v4";

/// Session options
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Custom User-Agent
    pub user_agent: Option<String>,
    /// Raw cookie string (`name=value; name2=value2`)
    pub cookie: Option<String>,
    /// Base URL of the collections API, without trailing slash
    pub api_base: String,
    /// Accept-Language header value
    pub accept_language: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            user_agent: None,
            cookie: None,
            api_base: DEFAULT_API_BASE.to_string(),
            accept_language: "zh-CN,zh;q=0.8".to_string(),
        }
    }
}

impl SessionOptions {
    /// Set the cookie string
    pub fn cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    /// Set the API base URL
    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set custom User-Agent
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }
}

/// Shared HTTP client plus the API base it talks to
#[derive(Debug, Clone)]
pub struct Session {
    client: reqwest::Client,
    api_base: String,
}

impl Session {
    /// Build the session's client with default headers and cookies
    pub fn new(options: SessionOptions) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        let user_agent = options.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT)),
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/json,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&options.accept_language)
                .map_err(|_| FetchError::InvalidHeader("accept-language"))?,
        );
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        if let Some(cookie) = options.cookie.as_deref() {
            let pairs = parse_cookie_string(cookie);
            debug!(count = pairs.len(), "Attaching session cookies");
            let header = pairs
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            let mut value =
                HeaderValue::from_str(&header).map_err(|_| FetchError::InvalidHeader("cookie"))?;
            value.set_sensitive(true);
            headers.insert(COOKIE, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(FetchError::ClientBuildError)?;

        Ok(Self {
            client,
            api_base: options.api_base.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL of the collections API
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// GET a URL and return the body as text; non-2xx is an error
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        check_scheme(url)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response.text().await.map_err(FetchError::from_reqwest)
    }

    /// GET a URL and decode the JSON body
    pub async fn get_json<T>(&self, url: &str) -> Result<T, FetchError>
    where
        T: serde::de::DeserializeOwned,
    {
        check_scheme(url)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

fn check_scheme(url: &str) -> Result<(), FetchError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(FetchError::InvalidUrlScheme)
    }
}

/// Split a browser cookie string into `(name, value)` pairs
///
/// Segments without `=` are ignored; names and values are trimmed.
pub fn parse_cookie_string(raw: &str) -> Vec<(String, String)> {
    raw.split(';')
        .filter_map(|item| {
            let (name, value) = item.trim().split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cookie_string() {
        let pairs = parse_cookie_string("z_c0=abc; _xsrf=x=y ; broken; =empty");
        assert_eq!(
            pairs,
            vec![
                ("z_c0".to_string(), "abc".to_string()),
                ("_xsrf".to_string(), "x=y".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_cookie_string_empty() {
        assert!(parse_cookie_string("").is_empty());
    }

    #[test]
    fn test_session_options_default() {
        let options = SessionOptions::default();
        assert!(options.user_agent.is_none());
        assert!(options.cookie.is_none());
        assert_eq!(options.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn test_session_options_trims_base() {
        let options = SessionOptions::default().api_base("http://localhost:1234/api/");
        assert_eq!(options.api_base, "http://localhost:1234/api");
    }

    #[tokio::test]
    async fn test_get_text_invalid_scheme() {
        let session = Session::new(SessionOptions::default()).unwrap();
        let result = session.get_text("ftp://example.com").await;
        assert!(matches!(result, Err(FetchError::InvalidUrlScheme)));
    }

    #[test]
    fn test_session_rejects_bad_cookie() {
        let result = Session::new(SessionOptions::default().cookie("a=\u{7f}bad"));
        assert!(matches!(result, Err(FetchError::InvalidHeader("cookie"))));
    }
}
