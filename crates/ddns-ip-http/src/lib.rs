// # HTTP Address Source
//
// This crate provides the HTTP "what is my IP" address source for the
// DDNS updater.
//
// ## Architecture
//
// An endpoint answers a plain GET with the caller's public address as
// text (e.g. api.ipify.org). Which address it sees depends on the socket
// family the request leaves from, so the source keeps one client per
// family, each bound to that family's unspecified local address:
//
// - IPv4 client bound to `0.0.0.0`
// - IPv6 client bound to `::`
//
// A host with no IPv6 route fails the IPv6 fetch at connect time instead
// of silently answering over IPv4.

use ddns_core::address::{Family, parse_address};
use ddns_core::traits::AddressSource;
use ddns_core::{Error, Result};

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

/// Default per-request timeout
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Address source querying HTTP endpoints
#[derive(Debug, Clone)]
pub struct HttpAddressSource {
    v4: reqwest::Client,
    v6: reqwest::Client,
}

impl HttpAddressSource {
    /// Create a source with the default timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a source whose requests give up after `timeout`
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Ok(Self {
            v4: pinned_client(IpAddr::V4(Ipv4Addr::UNSPECIFIED), timeout)?,
            v6: pinned_client(IpAddr::V6(Ipv6Addr::UNSPECIFIED), timeout)?,
        })
    }

    fn client(&self, family: Family) -> &reqwest::Client {
        match family {
            Family::V4 => &self.v4,
            Family::V6 => &self.v6,
        }
    }
}

fn pinned_client(local: IpAddr, timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .local_address(local)
        .timeout(timeout)
        .build()
        .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))
}

#[async_trait::async_trait]
impl AddressSource for HttpAddressSource {
    async fn fetch(&self, endpoint: &str, family: Family) -> Result<IpAddr> {
        let response = self
            .client(family)
            .get(endpoint)
            .send()
            .await
            .map_err(|e| Error::transport(format!("Request to {} failed: {}", endpoint, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::transport(format!(
                "{} answered HTTP {}",
                endpoint, status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(format!("Failed to read response: {}", e)))?;

        let ip = parse_address(&body, family)?;
        tracing::debug!(%family, %ip, endpoint, "fetched public address");
        Ok(ip)
    }
}
