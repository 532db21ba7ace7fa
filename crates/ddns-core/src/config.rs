//! Configuration types for the DDNS updater
//!
//! This module defines the configuration structures consumed by the core.
//! The daemon fills them from flags and environment variables.

use crate::address::Family;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default "what is my IP" endpoint for IPv4
pub const DEFAULT_IPV4_URL: &str = "https://api.ipify.org";

/// Default "what is my IP" endpoint for IPv6
pub const DEFAULT_IPV6_URL: &str = "https://api6.ipify.org";

/// Poll loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Zone whose address records are kept in sync (e.g. "example.com")
    pub zone: String,

    /// Seconds between ticks
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Upper bound for a single address fetch, in seconds
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// IPv4 discovery endpoint; `None` disables the `A` record
    #[serde(default = "default_ipv4_url")]
    pub ipv4_url: Option<String>,

    /// IPv6 discovery endpoint; `None` disables the `AAAA` record
    #[serde(default = "default_ipv6_url")]
    pub ipv6_url: Option<String>,
}

impl PollConfig {
    /// Create a configuration with defaults for `zone`
    pub fn new(zone: impl Into<String>) -> Self {
        Self {
            zone: zone.into(),
            interval_secs: default_interval_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            ipv4_url: default_ipv4_url(),
            ipv6_url: default_ipv6_url(),
        }
    }

    /// Set the polling interval
    pub fn with_interval_secs(mut self, secs: u64) -> Self {
        self.interval_secs = secs;
        self
    }

    /// Set or clear the endpoint for a family
    pub fn with_endpoint(mut self, family: Family, url: Option<String>) -> Self {
        match family {
            Family::V4 => self.ipv4_url = url,
            Family::V6 => self.ipv6_url = url,
        }
        self
    }

    /// Endpoint for a family, if that family is enabled
    pub fn endpoint(&self, family: Family) -> Option<&str> {
        match family {
            Family::V4 => self.ipv4_url.as_deref(),
            Family::V6 => self.ipv6_url.as_deref(),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.zone.trim().is_empty() {
            return Err(crate::Error::config(
                "Zone must be specified when polling is enabled",
            ));
        }
        if self.interval_secs == 0 {
            return Err(crate::Error::config("Poll interval must be > 0"));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(crate::Error::config("Fetch timeout must be > 0"));
        }

        let mut enabled = 0;
        for family in Family::ALL {
            if let Some(url) = self.endpoint(family) {
                if !url.starts_with("https://") && !url.starts_with("http://") {
                    return Err(crate::Error::config(format!(
                        "{} endpoint must use HTTP or HTTPS scheme. Got: {}",
                        family, url
                    )));
                }
                enabled += 1;
            }
        }
        if enabled == 0 {
            return Err(crate::Error::config(
                "At least one of the IPv4 and IPv6 endpoints must be enabled",
            ));
        }

        Ok(())
    }
}

/// Notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Minimum seconds between repeated failure alerts on one channel
    #[serde(default = "default_grace_secs")]
    pub grace_secs: u64,

    /// Title attached to every pushed message
    #[serde(default = "default_title")]
    pub title: String,
}

impl NotifyConfig {
    pub fn grace(&self) -> Duration {
        Duration::from_secs(self.grace_secs)
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            grace_secs: default_grace_secs(),
            title: default_title(),
        }
    }
}

fn default_interval_secs() -> u64 {
    60
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_ipv4_url() -> Option<String> {
    Some(DEFAULT_IPV4_URL.to_string())
}

fn default_ipv6_url() -> Option<String> {
    Some(DEFAULT_IPV6_URL.to_string())
}

fn default_grace_secs() -> u64 {
    300
}

fn default_title() -> String {
    "DNS Updater".to_string()
}
