//! Periodic dual-stack poll loop
//!
//! Each tick:
//!
//! ```text
//!            ┌──────────────┐   ┌──────────────┐
//!            │ fetch (IPv4) │   │ fetch (IPv6) │     concurrent, joined
//!            └──────┬───────┘   └──────┬───────┘
//!                   ▼                  ▼
//!            ┌──────────────┐   ┌──────────────┐
//!            │ update A     │   │ update AAAA  │     only for families
//!            └──────┬───────┘   └──────┬───────┘     whose fetch succeeded
//!                   ▼                  ▼
//!                  NotificationSink (per outcome)
//! ```
//!
//! A failure in one family never cancels, delays or skips the other, and a
//! failed tick never stops the next one.

use crate::address::Family;
use crate::config::PollConfig;
use crate::error::{Error, Result};
use crate::notify::NotificationSink;
use crate::traits::AddressSource;
use crate::updater::{RecordUpdater, UpdateResult};
use std::net::IpAddr;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// What happened to one family during a tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FamilyOutcome {
    /// No endpoint configured for this family
    Disabled,
    /// The address fetch failed; no update was attempted
    FetchFailed(String),
    /// The fetch succeeded but the record write failed
    UpdateFailed(String),
    /// The record already held the fetched address
    Unchanged(IpAddr),
    /// The record was written with the fetched address
    Updated(IpAddr),
}

/// Outcomes of one tick, per family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub v4: FamilyOutcome,
    pub v6: FamilyOutcome,
}

impl TickReport {
    pub fn get(&self, family: Family) -> &FamilyOutcome {
        match family {
            Family::V4 => &self.v4,
            Family::V6 => &self.v6,
        }
    }
}

/// Cancellable periodic task driving address discovery and record updates
pub struct PollLoop {
    source: Arc<dyn AddressSource>,
    updater: Arc<RecordUpdater>,
    notifier: Arc<NotificationSink>,
    config: PollConfig,
}

impl PollLoop {
    /// Create a poll loop
    ///
    /// # Errors
    ///
    /// `Error::Config` when `config` does not validate.
    pub fn new(
        source: Arc<dyn AddressSource>,
        updater: Arc<RecordUpdater>,
        notifier: Arc<NotificationSink>,
        config: PollConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            source,
            updater,
            notifier,
            config,
        })
    }

    /// Run until `cancel` fires.
    ///
    /// The first tick runs immediately. Cancellation is observed between
    /// ticks: a tick that has started always runs to completion, so no
    /// provider write is abandoned halfway.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        let mut interval = tokio::time::interval(self.config.interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = IntervalStream::new(interval);

        info!(
            zone = %self.config.zone,
            interval = ?self.config.interval(),
            "Polling started"
        );

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    info!("Polling stopped");
                    break;
                }

                Some(_) = ticks.next() => {
                    let report = self.tick().await;
                    debug!(?report, "tick complete");
                }
            }
        }

        Ok(())
    }

    /// Run a single tick and report what happened per family
    pub async fn tick(&self) -> TickReport {
        let (v4, v6) = tokio::join!(self.fetch(Family::V4), self.fetch(Family::V6));
        let (v4, v6) = tokio::join!(self.apply(Family::V4, v4), self.apply(Family::V6, v6));
        TickReport { v4, v6 }
    }

    /// Fetch one family's address, bounded by the fetch timeout.
    /// `None` when the family is disabled.
    async fn fetch(&self, family: Family) -> Option<Result<IpAddr>> {
        let endpoint = self.config.endpoint(family)?;
        let timeout = self.config.fetch_timeout();

        let result = match tokio::time::timeout(timeout, self.source.fetch(endpoint, family)).await
        {
            Ok(Ok(ip)) if !family.matches(&ip) => Err(Error::parse(format!(
                "{} returned {} for an {} fetch",
                endpoint, ip, family
            ))),
            Ok(result) => result,
            Err(_) => Err(Error::transport(format!(
                "fetching {} address from {} timed out after {:?}",
                family, endpoint, timeout
            ))),
        };
        Some(result)
    }

    async fn apply(&self, family: Family, fetched: Option<Result<IpAddr>>) -> FamilyOutcome {
        let address = match fetched {
            None => return FamilyOutcome::Disabled,
            Some(Err(e)) => {
                error!(%family, error = %e, transient = e.is_transient(), "Failed to get external IP");
                self.notifier.fetch_failed(family, &e).await;
                return FamilyOutcome::FetchFailed(e.to_string());
            }
            Some(Ok(address)) => address,
        };
        self.notifier.fetch_succeeded(family).await;

        match self.updater.update(family, address, &self.config.zone).await {
            Ok(UpdateResult::Unchanged { current_ip }) => FamilyOutcome::Unchanged(current_ip),
            Ok(UpdateResult::Updated { new_ip, .. }) => FamilyOutcome::Updated(new_ip),
            Err(e) => {
                error!(%family, error = %e, transient = e.is_transient(), "Failed to update IP");
                self.notifier.update_failed(family, &e).await;
                FamilyOutcome::UpdateFailed(e.to_string())
            }
        }
    }
}
