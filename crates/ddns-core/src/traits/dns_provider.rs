// # DNS Provider Trait
//
// Defines the interface for looking up and writing address records via a
// provider API.
//
// ## Implementations
//
// - Cloudflare: `ddns-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::DnsProvider;
// use ddns_core::address::RecordType;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let zone_id = provider.find_zone_id("example.com").await?;
//     let record_id = provider.find_record_id(&zone_id, RecordType::A).await?;
//     provider
//         .update_record(&zone_id, &record_id, "203.0.113.5".parse()?)
//         .await?;
//
//     Ok(())
// }
// ```

use crate::address::RecordType;
use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for DNS provider implementations
///
/// Three single-shot capabilities: resolve a zone name to the provider's
/// zone identifier, find the address record of a given type in that zone,
/// and overwrite that record's content.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks. The
/// poll loop writes the `A` and `AAAA` records concurrently.
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
/// - ✅ Parse provider-specific responses
/// - ✅ Return success or failure (the next poll tick is the retry)
///
/// ## Forbidden Capabilities
/// - ❌ Spawn tasks or threads
/// - ❌ Implement retry logic or backoff
/// - ❌ Cache zone or record identifiers between calls
/// - ❌ Decide whether an update is needed (owned by `RecordUpdater`)
/// - ❌ Send notifications (owned by `NotificationSink`)
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Resolve a zone name (e.g. "example.com") to its provider identifier
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The zone ID
    /// - `Err(Error::NotFound)`: The provider has no such zone
    /// - `Err(Error)`: Transport or provider failure
    async fn find_zone_id(&self, zone_name: &str) -> Result<String, crate::Error>;

    /// Find the identifier of the zone's address record of `record_type`
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The record ID
    /// - `Err(Error::NotFound)`: The zone has no record of that type
    /// - `Err(Error)`: Transport or provider failure
    async fn find_record_id(
        &self,
        zone_id: &str,
        record_type: RecordType,
    ) -> Result<String, crate::Error>;

    /// Overwrite a record's content with `address`
    ///
    /// Must be a single provider request: either the record holds the new
    /// address afterwards or an error is returned.
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        address: IpAddr,
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
