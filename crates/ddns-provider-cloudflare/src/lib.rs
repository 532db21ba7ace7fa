// # Cloudflare DNS Provider
//
// This crate provides the Cloudflare DNS provider for the DDNS updater.
//
// ## Behaviour
//
// - ✅ One HTTP request per trait call
// - ✅ Full error propagation (the poll loop's next tick is the retry)
// - ✅ HTTP timeout configured (30 seconds)
// - ✅ Specific error handling for HTTP status codes (401/403, 404, 409, 429, 5xx)
// - ✅ Both A and AAAA record support
// - ❌ NO retry logic
// - ❌ NO caching of zone or record identifiers
// - ❌ NO background tasks
//
// ## Trust Level: Untrusted (DNS Provider)
//
// **Allowed Capabilities**:
// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
// - ✅ Parse provider-specific responses
//
// **Forbidden Capabilities**:
// - ❌ Spawn tasks or threads
// - ❌ Implement retry logic
// - ❌ Decide whether an update is needed (owned by `RecordUpdater`)
//
// ## Security Requirements
//
// - API token NEVER appears in logs
// - API token MUST be provided via environment variables only
// - Provider MUST fail fast if token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List Zones: GET `/zones?name=...`
// - List DNS Records: GET `/zones/:zone_id/dns_records?type=...`
// - Patch DNS Record: PATCH `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use ddns_core::address::{Family, RecordType, parse_address};
use ddns_core::traits::DnsProvider;
use ddns_core::{Error, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::net::IpAddr;
use std::time::Duration;

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const PROVIDER: &str = "cloudflare";

/// Response envelope shared by every Cloudflare v4 endpoint
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct Zone {
    id: String,
}

#[derive(Debug, Deserialize)]
struct DnsRecord {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    content: String,
}

/// Cloudflare DNS provider
///
/// # Trust Level: Untrusted
///
/// This provider is isolated, stateless, and single-shot.
///
/// # Security
///
/// The Debug implementation does NOT expose the API token.
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API root, overridable for tests
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    ///
    /// # Errors
    ///
    /// `Error::Config` if the token is empty or the HTTP client cannot be
    /// built.
    pub fn new(api_token: impl Into<String>) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.trim().is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            base_url: CLOUDFLARE_API_BASE.to_string(),
            client,
        })
    }

    /// Point the provider at another API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Send a request and unwrap the Cloudflare envelope.
    ///
    /// `what` names the object being looked up or written; it shows up in
    /// `NotFound` and fallback error messages.
    async fn call<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder, what: &str) -> Result<T> {
        let response = request
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::transport(format!("Cloudflare request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(status_error(status, &error_text, what));
        }

        let envelope: Envelope<T> = response.json().await.map_err(|e| {
            Error::provider(PROVIDER, format!("Failed to parse response: {}", e))
        })?;

        if !envelope.success {
            return Err(Error::provider(PROVIDER, api_errors(&envelope.errors, what)));
        }

        envelope.result.ok_or_else(|| {
            Error::provider(PROVIDER, format!("Invalid response format: no result for {}", what))
        })
    }
}

/// Map a non-2xx status to an error
fn status_error(status: StatusCode, body: &str, what: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::provider(
            PROVIDER,
            format!(
                "Authentication failed: Invalid API token or insufficient permissions. Status: {}",
                status
            ),
        ),
        404 => Error::not_found(format!("{} not found", what)),
        409 => Error::provider(PROVIDER, format!("Conflict updating {}: {}", what, body)),
        429 => Error::provider(
            PROVIDER,
            format!("Rate limit exceeded. Please retry later. Status: {}", status),
        ),
        500..=599 => Error::provider(
            PROVIDER,
            format!("Cloudflare server error (transient): {} - {}", status, body),
        ),
        _ => Error::provider(PROVIDER, format!("Request for {} failed: {} - {}", what, status, body)),
    }
}

fn api_errors(errors: &[ApiMessage], what: &str) -> String {
    if errors.is_empty() {
        return format!("Cloudflare reported failure for {}", what);
    }
    let joined: Vec<String> = errors
        .iter()
        .map(|e| format!("{} (code {})", e.message, e.code))
        .collect();
    format!("Cloudflare rejected {}: {}", what, joined.join("; "))
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn find_zone_id(&self, zone_name: &str) -> Result<String> {
        tracing::debug!("Looking up zone ID for: {}", zone_name);

        let request = self
            .client
            .get(format!("{}/zones", self.base_url))
            .query(&[("name", zone_name)]);
        let zones: Vec<Zone> = self.call(request, &format!("zone {}", zone_name)).await?;

        let zone = zones
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("Zone not found: {}", zone_name)))?;

        tracing::debug!("Found zone ID: {}", zone.id);
        Ok(zone.id)
    }

    async fn find_record_id(&self, zone_id: &str, record_type: RecordType) -> Result<String> {
        let request = self
            .client
            .get(format!("{}/zones/{}/dns_records", self.base_url, zone_id))
            .query(&[("type", record_type.as_str())]);
        let records: Vec<DnsRecord> = self
            .call(request, &format!("{} records of zone {}", record_type, zone_id))
            .await?;

        // The type filter is the API's; the family check guards against a
        // record whose content is not an address at all
        let family = record_type.family();
        let record = records
            .into_iter()
            .find(|r| parse_address(&r.content, family).is_ok())
            .ok_or_else(|| Error::not_found(format!("No {} record in zone {}", record_type, zone_id)))?;

        tracing::debug!(
            "Found {} record {} ({}) currently {}",
            record_type,
            record.id,
            record.name,
            record.content
        );
        Ok(record.id)
    }

    async fn update_record(&self, zone_id: &str, record_id: &str, address: IpAddr) -> Result<()> {
        tracing::info!(
            "Updating Cloudflare DNS record {} -> {} ({})",
            record_id,
            address,
            Family::of(&address).record_type()
        );

        let request = self
            .client
            .patch(format!(
                "{}/zones/{}/dns_records/{}",
                self.base_url, zone_id, record_id
            ))
            .json(&json!({ "content": address.to_string() }));
        let _: serde_json::Value = self.call(request, &format!("record {}", record_id)).await?;

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}
