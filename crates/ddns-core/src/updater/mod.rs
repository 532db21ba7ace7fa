//! Record updater
//!
//! The RecordUpdater owns the last address written per family and is the
//! only component that calls the provider's write path. It is responsible for:
//! - Skipping writes for an address that is already in the record
//! - Serialising writes to the same record
//! - Committing the new address only after the provider accepted it
//!
//! ## Locking
//!
//! Each family has its own slot behind its own async mutex. The lock is
//! held for the whole read-decide-write sequence, including the provider
//! calls, so two writes to the `A` record never interleave while an `A`
//! and an `AAAA` write proceed independently.

use crate::address::{Family, RecordType};
use crate::error::{Error, Result};
use crate::notify::NotificationSink;
use crate::provider::write_address;
use crate::traits::DnsProvider;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Result of an update call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateResult {
    /// Record was written
    Updated {
        /// The address previously written by this updater, if any
        previous_ip: Option<IpAddr>,
        /// The new address
        new_ip: IpAddr,
    },
    /// Record already held this address; the provider was not contacted
    Unchanged {
        /// The current address
        current_ip: IpAddr,
    },
}

/// Last confirmed write for one family
#[derive(Debug)]
struct RecordSlot {
    record_type: RecordType,
    /// Zone and address of the last successful write
    last: Option<(String, IpAddr)>,
}

impl RecordSlot {
    fn new(family: Family) -> Self {
        Self {
            record_type: family.record_type(),
            last: None,
        }
    }

    fn holds(&self, zone: &str, address: IpAddr) -> bool {
        matches!(&self.last, Some((z, ip)) if z == zone && *ip == address)
    }
}

/// Keeps the `A` and `AAAA` records of a zone in sync, writing only on change
///
/// Construct one per process and share it (behind an `Arc`) between the
/// poll loop and the webhook handler.
pub struct RecordUpdater {
    provider: Arc<dyn DnsProvider>,
    notifier: Arc<NotificationSink>,
    v4: Mutex<RecordSlot>,
    v6: Mutex<RecordSlot>,
}

impl RecordUpdater {
    /// Create an updater with both slots unset
    pub fn new(provider: Arc<dyn DnsProvider>, notifier: Arc<NotificationSink>) -> Self {
        Self {
            provider,
            notifier,
            v4: Mutex::new(RecordSlot::new(Family::V4)),
            v6: Mutex::new(RecordSlot::new(Family::V6)),
        }
    }

    fn slot(&self, family: Family) -> &Mutex<RecordSlot> {
        match family {
            Family::V4 => &self.v4,
            Family::V6 => &self.v6,
        }
    }

    /// Write `address` into the `family` record of `zone` unless it is
    /// already there.
    ///
    /// On a successful write the sink gets `update_succeeded`. On failure
    /// the slot is left as it was and the error is returned; reporting it
    /// to the sink is the caller's job.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidInput` when `address` is not of `family`
    /// - any error from the provider write path
    pub async fn update(&self, family: Family, address: IpAddr, zone: &str) -> Result<UpdateResult> {
        if !family.matches(&address) {
            return Err(Error::invalid_input(format!(
                "{} is not an {} address",
                address, family
            )));
        }

        let mut slot = self.slot(family).lock().await;

        if slot.holds(zone, address) {
            debug!(zone, record_type = %slot.record_type, %address, "IP address unchanged");
            return Ok(UpdateResult::Unchanged {
                current_ip: address,
            });
        }

        write_address(self.provider.as_ref(), zone, address).await?;

        let previous_ip = slot.last.replace((zone.to_string(), address)).map(|(_, ip)| ip);
        drop(slot);

        info!(zone, %family, new_ip = %address, ?previous_ip, "New IP address");
        self.notifier.update_succeeded(family, address).await;

        Ok(UpdateResult::Updated {
            previous_ip,
            new_ip: address,
        })
    }

    /// [`RecordUpdater::update`] for the `A` record
    pub async fn update_ipv4(&self, address: IpAddr, zone: &str) -> Result<UpdateResult> {
        self.update(Family::V4, address, zone).await
    }

    /// [`RecordUpdater::update`] for the `AAAA` record
    pub async fn update_ipv6(&self, address: IpAddr, zone: &str) -> Result<UpdateResult> {
        self.update(Family::V6, address, zone).await
    }

    /// The address last written for `family`, if any
    pub async fn last_address(&self, family: Family) -> Option<IpAddr> {
        self.slot(family).lock().await.last.as_ref().map(|(_, ip)| *ip)
    }
}

impl std::fmt::Debug for RecordUpdater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordUpdater")
            .field("provider", &self.provider.provider_name())
            .finish_non_exhaustive()
    }
}
