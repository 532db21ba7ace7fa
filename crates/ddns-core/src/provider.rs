//! The provider write path
//!
//! One address write is three provider calls: zone lookup, record lookup,
//! record update. Zone and record identifiers are looked up on every write
//! so a record recreated at the provider is picked up on the next write.

use crate::address::Family;
use crate::error::{Error, Result};
use crate::traits::DnsProvider;
use std::net::IpAddr;
use tracing::{debug, info};

/// Write `address` into the address record of its family in `zone`.
///
/// Lookup failures keep their [`Error::NotFound`] classification but gain
/// the zone name; every error is returned unchanged otherwise.
pub async fn write_address(provider: &dyn DnsProvider, zone: &str, address: IpAddr) -> Result<()> {
    let record_type = Family::of(&address).record_type();

    let zone_id = provider.find_zone_id(zone).await.map_err(|e| match e {
        Error::NotFound(msg) => Error::not_found(format!("zone {}: {}", zone, msg)),
        other => other,
    })?;
    debug!(zone, record_type = %record_type, "zone resolved");

    let record_id = provider
        .find_record_id(&zone_id, record_type)
        .await
        .map_err(|e| match e {
            Error::NotFound(msg) => {
                Error::not_found(format!("{} record in zone {}: {}", record_type, zone, msg))
            }
            other => other,
        })?;

    provider.update_record(&zone_id, &record_id, address).await?;

    info!(
        provider = provider.provider_name(),
        zone,
        record_type = %record_type,
        %address,
        "Record updated successfully"
    );
    Ok(())
}
