// # ntfy Push Transport
//
// Delivers updater notifications to an ntfy topic.
//
// ## Wire format
//
// ```http
// POST <server>/<topic>
// Title: DNS Updater
// Tags: warning
//
// Failed to get IPv4 address: Transport error: ...
// ```
//
// The topic doubles as the access secret: anyone who knows it can read
// the messages, so it is treated like an API token and never logged.

use async_trait::async_trait;
use ddns_core::traits::PushTransport;
use ddns_core::{Error, Result};
use std::time::Duration;

/// Public ntfy server
pub const DEFAULT_SERVER: &str = "https://ntfy.sh";

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Push transport posting to an ntfy topic
pub struct NtfyTransport {
    /// Topic URL, `<server>/<topic>`
    /// ⚠️ NEVER log this value
    url: String,
    server: String,
    title: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for NtfyTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NtfyTransport")
            .field("server", &self.server)
            .field("topic", &"<REDACTED>")
            .field("title", &self.title)
            .finish()
    }
}

impl NtfyTransport {
    /// Create a transport for `topic` on `server`
    ///
    /// # Errors
    ///
    /// `Error::Config` if the topic is empty, the server is not an HTTP(S)
    /// URL, or the HTTP client cannot be built.
    pub fn new(server: &str, topic: &str, title: impl Into<String>) -> Result<Self> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(Error::config("ntfy topic cannot be empty"));
        }
        let server = server.trim_end_matches('/');
        if !server.starts_with("https://") && !server.starts_with("http://") {
            return Err(Error::config(format!(
                "ntfy server must use HTTP or HTTPS scheme. Got: {}",
                server
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: format!("{}/{}", server, topic),
            server: server.to_string(),
            title: title.into(),
            client,
        })
    }
}

#[async_trait]
impl PushTransport for NtfyTransport {
    async fn push(&self, tag: &str, message: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .header("Title", &self.title)
            .header("Tags", tag)
            .body(message.to_string())
            .send()
            .await
            .map_err(|e| Error::transport(format!("ntfy request failed: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::transport(format!(
                "ntfy answered {}: {}",
                status,
                body.trim()
            )));
        }

        tracing::debug!(tag, "notification delivered");
        Ok(())
    }
}
