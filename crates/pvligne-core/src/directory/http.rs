//! Client for the web application's user-search endpoint.
//!
//! Uses reqwest to call `GET {base_url}{search_path}?q=<query>`.

use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use tracing::debug;

use super::UserDirectory;
use super::types::{UserRecord, UsersResponse};
use crate::config::LookupConfig;
use crate::error::{Error, Result};

/// User-search HTTP client.
#[derive(Debug, Clone)]
pub struct HttpDirectory {
    http: reqwest::Client,
    endpoint: Url,
    query_param: String,
}

impl HttpDirectory {
    /// Create a client from the lookup configuration.
    pub fn new(config: &LookupConfig) -> Result<Self> {
        if config.base_url.is_empty() {
            return Err(Error::Config("lookup.base_url is empty".into()));
        }
        let endpoint = format!(
            "{}{}",
            config.base_url.trim_end_matches('/'),
            config.search_path
        );
        let endpoint = Url::parse(&endpoint)
            .map_err(|e| Error::Config(format!("Invalid lookup URL {endpoint}: {e}")))?;

        let mut headers = HeaderMap::new();
        if let Some(ref session) = config.session_cookie {
            let value = HeaderValue::from_str(&format!("sessionid={session}"))
                .map_err(|_| Error::Config("Invalid session cookie".into()))?;
            headers.insert(COOKIE, value);
        }

        // reqwest is built with rustls-no-provider; `Err` means a provider is
        // already installed.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http,
            endpoint,
            query_param: config.query_param.clone(),
        })
    }

    /// Full request URL for `query`, with the query URL-encoded.
    pub fn search_url(&self, query: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair(&self.query_param, query);
        url
    }

    /// Check HTTP response status, returning error for non-success codes.
    fn check_status(resp: &reqwest::Response) -> Result<()> {
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for HttpDirectory {
    async fn search(&self, query: &str) -> Result<Vec<UserRecord>> {
        let url = self.search_url(query);
        debug!(%url, "Searching users");
        let resp = self.http.get(url).send().await?;
        Self::check_status(&resp)?;
        let body = resp.bytes().await?;
        let parsed: UsersResponse =
            serde_json::from_slice(&body).map_err(|e| Error::Decode(e.to_string()))?;
        Ok(parsed.users)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(base: &str) -> LookupConfig {
        LookupConfig {
            base_url: base.to_string(),
            ..LookupConfig::default()
        }
    }

    #[test]
    fn search_url_encodes_query() {
        let dir = HttpDirectory::new(&config("http://pv.local:8000/")).unwrap();
        let url = dir.search_url("é & co");
        assert_eq!(
            url.as_str(),
            "http://pv.local:8000/api/users/search/?q=%C3%A9+%26+co"
        );
    }

    #[test]
    fn base_url_path_prefix_is_kept() {
        let dir = HttpDirectory::new(&config("https://intranet.example/pv")).unwrap();
        assert_eq!(
            dir.search_url("al").as_str(),
            "https://intranet.example/pv/api/users/search/?q=al"
        );
    }

    #[test]
    fn empty_base_url_is_rejected() {
        assert!(matches!(HttpDirectory::new(&config("")), Err(Error::Config(_))));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            HttpDirectory::new(&config("not a url")),
            Err(Error::Config(_))
        ));
    }
}
