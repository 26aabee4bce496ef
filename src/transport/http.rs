//! DevTools HTTP endpoints.
//!
//! Chromium exposes target discovery over plain HTTP next to the
//! WebSocket debugger:
//!
//! | Endpoint | Method | Purpose |
//! |----------|--------|---------|
//! | `/json/version` | GET | Browser and protocol version |
//! | `/json/list` | GET | Open targets |
//! | `/json/new?{url}` | PUT | Open a new tab |
//! | `/json/activate/{id}` | GET | Bring a tab to front |
//! | `/json/close/{id}` | GET | Close a tab |

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::client::{BrowserVersion, TabInfo};
use crate::error::{Error, Result};
use crate::identifiers::TargetId;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for a single HTTP request.
const HTTP_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// DevToolsHttp
// ============================================================================

/// Client for the DevTools HTTP endpoints of one browser.
#[derive(Debug, Clone)]
pub struct DevToolsHttp {
    /// Base URL, e.g. `http://localhost:9222/`.
    base: Url,
    /// HTTP client.
    client: Client,
}

impl DevToolsHttp {
    /// Creates a client for `endpoint`.
    ///
    /// Accepts `host:port` or a full `http://` URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Url`] if the endpoint cannot be parsed, or
    /// [`Error::Http`] if the HTTP client cannot be built.
    pub fn new(endpoint: &str) -> Result<Self> {
        let base = endpoint_url(endpoint)?;
        let client = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self { base, client })
    }

    /// Returns the base URL.
    #[inline]
    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Fetches browser version metadata.
    pub async fn version(&self) -> Result<BrowserVersion> {
        self.request(Method::GET, "json/version").await
    }

    /// Lists open targets.
    pub async fn list(&self) -> Result<Vec<TabInfo>> {
        self.request(Method::GET, "json/list").await
    }

    /// Opens a new tab navigated to `url`.
    pub async fn new_tab(&self, url: &str) -> Result<TabInfo> {
        let path = if url.is_empty() {
            "json/new".to_string()
        } else {
            format!("json/new?{}", urlencoding::encode(url))
        };
        self.request(Method::PUT, &path).await
    }

    /// Brings a tab to front.
    pub async fn activate(&self, id: &TargetId) -> Result<()> {
        self.request_text(Method::GET, &format!("json/activate/{id}"))
            .await
            .map(drop)
    }

    /// Closes a tab.
    pub async fn close(&self, id: &TargetId) -> Result<()> {
        self.request_text(Method::GET, &format!("json/close/{id}"))
            .await
            .map(drop)
    }

    /// Sends a request and decodes the JSON body.
    async fn request<T: DeserializeOwned>(&self, method: Method, path: &str) -> Result<T> {
        let text = self.request_text(method, path).await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Sends a request and returns the body text.
    async fn request_text(&self, method: Method, path: &str) -> Result<String> {
        let url = self.base.join(path)?;
        debug!(%url, %method, "DevTools HTTP request");

        let response = self.client.request(method, url.clone()).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::connection(format!("{url} returned {status}: {body}")));
        }

        Ok(body)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Normalizes `host:port` into an `http://host:port/` URL.
pub(crate) fn endpoint_url(endpoint: &str) -> Result<Url> {
    let with_scheme = if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("http://{endpoint}")
    };

    let mut url = Url::parse(&with_scheme)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves exactly one HTTP request with a fixed body and returns the
    /// endpoint plus a handle yielding the request line.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.expect("accept");
            let mut buf = vec![0u8; 4096];
            let n = stream.read(&mut buf).await.expect("read");
            let request = String::from_utf8_lossy(&buf[..n]).to_string();

            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.expect("write");
            request.lines().next().unwrap_or_default().to_string()
        });

        (addr.to_string(), handle)
    }

    #[test]
    fn test_endpoint_url_adds_scheme() {
        let url = endpoint_url("localhost:9222").expect("parse");
        assert_eq!(url.as_str(), "http://localhost:9222/");
        assert_eq!(
            url.join("json/version").expect("join").as_str(),
            "http://localhost:9222/json/version"
        );
    }

    #[test]
    fn test_endpoint_url_keeps_full_url() {
        let url = endpoint_url("http://127.0.0.1:9333/devtools").expect("parse");
        assert_eq!(url.as_str(), "http://127.0.0.1:9333/devtools/");
    }

    #[tokio::test]
    async fn test_version() {
        let (endpoint, handle) = serve_once(
            "200 OK",
            r#"{"Browser":"HeadlessChrome/120.0.0.0","Protocol-Version":"1.3","User-Agent":"x","V8-Version":"12","WebKit-Version":"537.36"}"#,
        )
        .await;

        let http = DevToolsHttp::new(&endpoint).expect("client");
        let version = http.version().await.expect("version");

        assert_eq!(version.browser, "HeadlessChrome/120.0.0.0");
        assert_eq!(version.protocol_version, "1.3");
        assert_eq!(handle.await.expect("join"), "GET /json/version HTTP/1.1");
    }

    #[tokio::test]
    async fn test_new_tab_encodes_url() {
        let (endpoint, handle) = serve_once(
            "200 OK",
            r#"{"id":"T1","type":"page","title":"","url":"https://example.com/?q=a b","webSocketDebuggerUrl":"ws://x/devtools/page/T1"}"#,
        )
        .await;

        let http = DevToolsHttp::new(&endpoint).expect("client");
        let tab = http.new_tab("https://example.com/?q=a b").await.expect("new tab");

        assert_eq!(tab.id.as_str(), "T1");
        let request_line = handle.await.expect("join");
        assert!(request_line.starts_with("PUT /json/new?https%3A%2F%2Fexample.com"));
    }

    #[tokio::test]
    async fn test_error_status() {
        let (endpoint, _handle) = serve_once("404 Not Found", "No such target id: X").await;

        let http = DevToolsHttp::new(&endpoint).expect("client");
        let err = http.activate(&TargetId::new("X")).await.unwrap_err();

        assert!(err.is_connection_error());
        assert!(err.to_string().contains("404"));
    }
}
