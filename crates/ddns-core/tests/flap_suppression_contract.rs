//! Contract Test: Flap Suppression
//!
//! Drives the notification sink through the poll loop the way a real
//! outage would, one tick per minute with a five minute grace period.
//!
//! Constraints verified:
//! - A short blip after a success produces no notification
//! - A sustained outage produces one alert per grace window
//! - The first success after a long outage produces one "repaired" notice
//! - Fetch and update channels keep separate clocks

mod common;

use common::*;
use ddns_core::address::{Family, RecordType};
use ddns_core::notify::{Channel, ChannelStatus};
use std::time::Duration;

const MINUTE: Duration = Duration::from_secs(60);

fn v4_only(v4: Reply) -> Harness {
    let config = poll_config().with_endpoint(Family::V6, None);
    Harness::with_config(v4, Reply::Unreachable, config)
}

#[tokio::test(start_paused = true)]
async fn single_blip_is_silent() {
    let h = v4_only(Reply::Address("203.0.113.5"));

    h.poll.tick().await;
    assert_eq!(h.transport.count(), 1, "initial write is announced");

    tokio::time::advance(MINUTE).await;
    h.source.set(Family::V4, Reply::Unreachable);
    h.poll.tick().await;

    tokio::time::advance(MINUTE).await;
    h.source.set(Family::V4, Reply::Address("203.0.113.5"));
    h.poll.tick().await;

    assert_eq!(h.transport.count(), 1, "blip inside the grace period must be silent");
}

#[tokio::test(start_paused = true)]
async fn sustained_fetch_outage_alerts_once_per_window_then_repairs_once() {
    let h = v4_only(Reply::Address("203.0.113.5"));
    h.poll.tick().await;

    h.source.set(Family::V4, Reply::Unreachable);
    for _ in 0..12 {
        tokio::time::advance(MINUTE).await;
        h.poll.tick().await;
    }
    // Alerts at minute 6 and minute 12
    assert_eq!(h.transport.count_containing("Failed to get IPv4 address"), 2);
    assert_eq!(h.notifier.status(Channel::Fetch), Some(ChannelStatus::FailingNotified));

    h.source.set(Family::V4, Reply::Address("203.0.113.5"));
    tokio::time::advance(MINUTE).await;
    h.poll.tick().await;
    tokio::time::advance(MINUTE).await;
    h.poll.tick().await;

    assert_eq!(h.transport.count_containing("Repaired: get IPv4 address"), 1);
    // Address unchanged through the outage, so no second write
    assert_eq!(h.provider.write_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn sustained_update_outage_alerts_then_reports_repaired_write() {
    let h = v4_only(Reply::Address("203.0.113.5"));
    h.provider.set_failing(RecordType::A, true);

    for _ in 0..7 {
        h.poll.tick().await;
        tokio::time::advance(MINUTE).await;
    }
    assert_eq!(h.transport.count_containing("Failed to update IPv4 record"), 1);
    assert_eq!(h.provider.write_count(), 7, "every tick retries the write");

    h.provider.set_failing(RecordType::A, false);
    h.poll.tick().await;

    assert_eq!(
        h.transport.count_containing("Repaired: IPv4 record updated to 203.0.113.5"),
        1
    );
    assert_eq!(h.notifier.status(Channel::Update), Some(ChannelStatus::Healthy));
    // Fetches never failed
    assert_eq!(h.transport.count_containing("get IPv4"), 0);
}

#[tokio::test(start_paused = true)]
async fn address_change_after_quiet_period_is_new_not_repaired() {
    let h = v4_only(Reply::Address("203.0.113.5"));
    h.poll.tick().await;

    // Half an hour of unchanged ticks
    for _ in 0..30 {
        tokio::time::advance(MINUTE).await;
        h.poll.tick().await;
    }
    h.source.set(Family::V4, Reply::Address("198.51.100.7"));
    tokio::time::advance(MINUTE).await;
    h.poll.tick().await;

    assert_eq!(
        h.transport.messages(),
        vec![
            "New IPv4 address: 203.0.113.5".to_string(),
            "New IPv4 address: 198.51.100.7".to_string(),
        ]
    );
}
