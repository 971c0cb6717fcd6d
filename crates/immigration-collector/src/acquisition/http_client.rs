//! HTTP transport used for pages, feeds and sitemaps.

use crate::config::CollectorConfig;
use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::time::Duration;

/// `Accept` header for ordinary page fetches.
pub const ACCEPT_ANY: &str = "*/*";
/// `Accept` header for RSS/Atom feeds.
pub const ACCEPT_FEED: &str =
    "application/rss+xml, application/atom+xml, application/xml, text/xml;q=0.9,*/*;q=0.8";
/// `Accept` header for sitemaps.
pub const ACCEPT_SITEMAP: &str = "application/xml, text/xml;q=0.9,*/*;q=0.8";

/// A response after redirects have been followed.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    /// URL of the last hop.
    pub final_url: String,
    pub body: String,
    /// Raw `Content-Type` header, empty if absent.
    pub content_type: String,
}

impl FetchResponse {
    /// Status in `[200, 400)`.
    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.status)
    }

    pub fn is_html(&self) -> bool {
        let ct = self.content_type.to_lowercase();
        ct.contains("text/html") || ct.contains("application/xhtml+xml")
    }
}

/// Fetches a URL, following redirects internally.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &str, accept: &str) -> Result<FetchResponse, FetchError>;
}

/// `reqwest`-backed transport with a fixed user agent, timeout and redirect cap.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(
        user_agent: &str,
        timeout: Duration,
        max_redirects: usize,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(max_redirects))
            .build()?;
        Ok(Self { client })
    }

    pub fn from_config(cfg: &CollectorConfig) -> Result<Self, FetchError> {
        Self::new(
            &cfg.user_agent,
            Duration::from_millis(cfg.crawl.timeout_ms),
            cfg.crawl.max_redirects,
        )
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn fetch(&self, url: &str, accept: &str) -> Result<FetchResponse, FetchError> {
        let resp = self.client.get(url).header(ACCEPT, accept).send().await?;

        let status = resp.status().as_u16();
        let final_url = resp.url().to_string();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = resp.text().await?;

        Ok(FetchResponse {
            status,
            final_url,
            body,
            content_type,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// In-memory transport serving canned responses; unknown URLs fail with 404.
    #[derive(Default)]
    pub(crate) struct StaticTransport {
        responses: HashMap<String, FetchResponse>,
        pub(crate) requested: Mutex<Vec<String>>,
    }

    impl StaticTransport {
        pub(crate) fn with(mut self, url: &str, status: u16, content_type: &str, body: &str) -> Self {
            self.responses.insert(
                url.to_string(),
                FetchResponse {
                    status,
                    final_url: url.to_string(),
                    body: body.to_string(),
                    content_type: content_type.to_string(),
                },
            );
            self
        }
    }

    #[async_trait]
    impl Transport for StaticTransport {
        async fn fetch(&self, url: &str, _accept: &str) -> Result<FetchResponse, FetchError> {
            self.requested.lock().unwrap().push(url.to_string());
            self.responses
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Status {
                    status: 404,
                    url: url.to_string(),
                })
        }
    }

    #[test]
    fn test_is_html() {
        let mut resp = FetchResponse {
            status: 200,
            final_url: "https://a.ca/".into(),
            body: String::new(),
            content_type: "Text/HTML; charset=utf-8".into(),
        };
        assert!(resp.is_html());
        resp.content_type = "application/xhtml+xml".into();
        assert!(resp.is_html());
        resp.content_type = "application/pdf".into();
        assert!(!resp.is_html());
    }

    #[tokio::test]
    async fn test_fetch_follows_redirect_and_reports_final_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(301).insert_header("location", format!("{}/new", server.uri())),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .and(header("accept", "application/xml"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<urlset/>", "application/xml"))
            .mount(&server)
            .await;

        let client = HttpClient::new("collector-test", Duration::from_secs(5), 5).unwrap();
        let resp = client
            .fetch(&format!("{}/old", server.uri()), ACCEPT_SITEMAP)
            .await
            .unwrap();

        assert_eq!(resp.status, 200);
        assert_eq!(resp.final_url, format!("{}/new", server.uri()));
        assert_eq!(resp.content_type, "application/xml");
        assert_eq!(resp.body, "<urlset/>");

        let requests = server.received_requests().await.unwrap();
        let last = requests.last().unwrap();
        assert_eq!(last.url.path(), "/new");
        assert_eq!(last.headers.get("accept").unwrap(), ACCEPT_SITEMAP);
    }

    #[tokio::test]
    async fn test_too_many_redirects_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/loop"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("location", format!("{}/loop", server.uri())),
            )
            .mount(&server)
            .await;

        let client = HttpClient::new("collector-test", Duration::from_secs(5), 2).unwrap();
        let err = client
            .fetch(&format!("{}/loop", server.uri()), ACCEPT_ANY)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }
}
