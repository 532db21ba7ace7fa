//! Operator notifications with flap suppression
//!
//! The [`NotificationSink`] is either a [`PushNotifier`] that pushes
//! through a [`PushTransport`], or disabled. Which one is decided once at
//! startup; callers only see the four outcome methods.
//!
//! ## Grace period
//!
//! Each of the two channels (address fetch, record update) runs its own
//! copy of this state machine:
//!
//! ```text
//!             failure, inside grace
//!  Healthy ─────────────────────────▶ FailingUnnotified
//!     ▲  \                                  │
//!     │   \ failure, grace exceeded         │ failure, grace exceeded
//!     │    ▼                                ▼
//!     └──────────── success ───────── FailingNotified ──┐
//!                                           ▲           │ failure, grace since
//!                                           └───────────┘ last alert exceeded
//! ```
//!
//! A failure alerts only when both the last success and the last alert on
//! that channel are older than the grace period. A sustained outage
//! therefore alerts once per grace window, and a blip shorter than the
//! grace period after a success stays silent.
//!
//! Both families share the update channel. The family that raised the last
//! update alert is remembered, and only its next success reads as repaired.

use crate::address::Family;
use crate::config::NotifyConfig;
use crate::error::Error;
use crate::traits::{PushTransport, TAG_GLOBE, TAG_WARNING};
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Which outcome stream a notification belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Address discovery
    Fetch,
    /// Provider record writes
    Update,
}

/// Observable state of one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelStatus {
    Healthy,
    /// Failing, but no alert sent since the last success
    FailingUnnotified,
    /// Failing, alert sent
    FailingNotified,
}

#[derive(Debug)]
struct ChannelState {
    last_ok: Instant,
    last_alert: Option<Instant>,
    status: ChannelStatus,
}

impl ChannelState {
    fn new(now: Instant) -> Self {
        Self {
            last_ok: now,
            last_alert: None,
            status: ChannelStatus::Healthy,
        }
    }

    /// Record a failure; returns whether to alert.
    fn on_failure(&mut self, now: Instant, grace: Duration) -> bool {
        let since_ok = now.saturating_duration_since(self.last_ok);
        let since_alert = self
            .last_alert
            .map(|t| now.saturating_duration_since(t) > grace)
            .unwrap_or(true);

        if since_ok > grace && since_alert {
            self.last_alert = Some(now);
            self.status = ChannelStatus::FailingNotified;
            return true;
        }

        if self.status == ChannelStatus::Healthy {
            self.status = ChannelStatus::FailingUnnotified;
        }
        false
    }

    /// Record a success; returns the status it recovered from and whether
    /// the last success is older than the grace period.
    fn on_success(&mut self, now: Instant, grace: Duration) -> (ChannelStatus, bool) {
        let previous = self.status;
        let overdue = now.saturating_duration_since(self.last_ok) > grace;
        self.last_ok = now;
        self.status = ChannelStatus::Healthy;
        (previous, overdue)
    }
}

#[derive(Debug)]
struct NotificationState {
    fetch: ChannelState,
    update: ChannelState,
    /// Family named by the last update alert
    update_alerted: Option<Family>,
}

impl NotificationState {
    fn channel(&mut self, channel: Channel) -> &mut ChannelState {
        match channel {
            Channel::Fetch => &mut self.fetch,
            Channel::Update => &mut self.update,
        }
    }
}

/// Push notifier with grace-period suppression
pub struct PushNotifier {
    transport: Box<dyn PushTransport>,
    grace: Duration,
    state: Mutex<NotificationState>,
}

impl std::fmt::Debug for PushNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushNotifier")
            .field("grace", &self.grace)
            .finish_non_exhaustive()
    }
}

impl PushNotifier {
    /// Create a notifier; both channels start `Healthy` as of now.
    pub fn new(transport: Box<dyn PushTransport>, grace: Duration) -> Self {
        let now = Instant::now();
        Self {
            transport,
            grace,
            state: Mutex::new(NotificationState {
                fetch: ChannelState::new(now),
                update: ChannelState::new(now),
                update_alerted: None,
            }),
        }
    }

    /// Current status of a channel
    pub fn status(&self, channel: Channel) -> ChannelStatus {
        self.lock().channel(channel).status
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NotificationState> {
        // State is a handful of timestamps; a panic elsewhere cannot leave
        // it half-written, so a poisoned lock is still usable.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn fetch_ok(&self, family: Family) {
        let (_, overdue) = self.lock().fetch.on_success(Instant::now(), self.grace);
        if overdue {
            self.send(TAG_GLOBE, format!("Repaired: get {} address", family))
                .await;
        }
    }

    async fn fetch_failed(&self, family: Family, error: &Error) {
        let alert = self.lock().fetch.on_failure(Instant::now(), self.grace);
        if alert {
            self.send(
                TAG_WARNING,
                format!("Failed to get {} address: {}", family, error),
            )
            .await;
        } else {
            debug!(%family, "fetch failure inside grace period, alert suppressed");
        }
    }

    async fn update_ok(&self, family: Family, address: IpAddr) {
        let repaired = {
            let mut state = self.lock();
            let (previous, _) = state.update.on_success(Instant::now(), self.grace);
            let alerted = state.update_alerted.take();
            previous == ChannelStatus::FailingNotified && alerted == Some(family)
        };
        let message = if repaired {
            format!("Repaired: {} record updated to {}", family, address)
        } else {
            format!("New {} address: {}", family, address)
        };
        self.send(TAG_GLOBE, message).await;
    }

    async fn update_failed(&self, family: Family, error: &Error) {
        let alert = {
            let mut state = self.lock();
            let alert = state.update.on_failure(Instant::now(), self.grace);
            if alert {
                state.update_alerted = Some(family);
            }
            alert
        };
        if alert {
            self.send(
                TAG_WARNING,
                format!("Failed to update {} record: {}", family, error),
            )
            .await;
        } else {
            debug!(%family, "update failure inside grace period, alert suppressed");
        }
    }

    async fn send(&self, tag: &str, message: String) {
        if let Err(e) = self.transport.push(tag, &message).await {
            warn!(error = %e, "Failed to send notification");
        }
    }
}

/// Notification sink selected at startup
#[derive(Debug)]
pub enum NotificationSink {
    /// Pushes through a transport, with flap suppression
    Push(PushNotifier),
    /// No notification channel configured
    Disabled,
}

impl NotificationSink {
    /// Build the sink: a push notifier when a transport is configured,
    /// disabled otherwise.
    pub fn new(transport: Option<Box<dyn PushTransport>>, config: &NotifyConfig) -> Self {
        match transport {
            Some(transport) => Self::Push(PushNotifier::new(transport, config.grace())),
            None => Self::Disabled,
        }
    }

    /// A sink that drops everything
    pub fn disabled() -> Self {
        Self::Disabled
    }

    /// An address fetch succeeded
    pub async fn fetch_succeeded(&self, family: Family) {
        if let Self::Push(n) = self {
            n.fetch_ok(family).await;
        }
    }

    /// An address fetch failed
    pub async fn fetch_failed(&self, family: Family, error: &Error) {
        if let Self::Push(n) = self {
            n.fetch_failed(family, error).await;
        }
    }

    /// A record write succeeded with a new address
    pub async fn update_succeeded(&self, family: Family, address: IpAddr) {
        if let Self::Push(n) = self {
            n.update_ok(family, address).await;
        }
    }

    /// A record write failed
    pub async fn update_failed(&self, family: Family, error: &Error) {
        if let Self::Push(n) = self {
            n.update_failed(family, error).await;
        }
    }

    /// Channel status, `None` for a disabled sink
    pub fn status(&self, channel: Channel) -> Option<ChannelStatus> {
        match self {
            Self::Push(n) => Some(n.status(channel)),
            Self::Disabled => None,
        }
    }
}
