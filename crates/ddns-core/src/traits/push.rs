// # Push Transport Trait
//
// The outbound channel behind the notification sink.
//
// ## Implementations
//
// - ntfy topics: `ddns-notify-ntfy` crate

use async_trait::async_trait;

/// Tag attached to failure alerts
pub const TAG_WARNING: &str = "warning";

/// Tag attached to repaired and new-address notices
pub const TAG_GLOBE: &str = "globe_with_meridians";

/// Trait for push transports
///
/// Delivers one short text message with a semantic tag. Delivery is
/// best-effort: the sink logs a returned error and moves on, it never
/// retries and never lets the error reach a DNS update.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Push `message` tagged with `tag`
    async fn push(&self, tag: &str, message: &str) -> Result<(), crate::Error>;
}
