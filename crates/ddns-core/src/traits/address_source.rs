// # Address Source Trait
//
// Defines the interface for discovering the host's current public address.
//
// ## Implementations
//
// - HTTP "what is my IP" endpoints: `ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::AddressSource;
// use ddns_core::address::Family;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* AddressSource implementation */;
//
//     let v4 = source.fetch("https://api.ipify.org", Family::V4).await?;
//     let v6 = source.fetch("https://api6.ipify.org", Family::V6).await?;
//     println!("{v4} {v6}");
//
//     Ok(())
// }
// ```

use crate::address::Family;
use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for address source implementations
///
/// A source answers one question per call: which public address does the
/// endpoint see for this host over `family`? It holds no state between
/// calls.
///
/// # Trust Level: Semi-Trusted
///
/// ## Allowed Capabilities
/// - ✅ One outbound request per `fetch()` call
/// - ✅ Pin the outbound socket to the requested family
///
/// ## Forbidden Capabilities
/// - ❌ Retry inside a call (the poll loop's next tick is the retry)
/// - ❌ Cache the last address (owned by `RecordUpdater`)
/// - ❌ Spawn polling loops (owned by `PollLoop`)
/// - ❌ Perform DNS updates
#[async_trait]
pub trait AddressSource: Send + Sync {
    /// Fetch the current public address of `family` from `endpoint`
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: An address for which `family.matches(&ip)` holds
    /// - `Err(Error::Transport)`: Network or HTTP failure
    /// - `Err(Error::Parse)`: The body is not a valid address of `family`
    async fn fetch(&self, endpoint: &str, family: Family) -> Result<IpAddr, crate::Error>;
}
