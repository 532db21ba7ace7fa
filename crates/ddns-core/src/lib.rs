// # ddns-core
//
// Core library for the DDNS updater.
//
// ## Architecture Overview
//
// This library keeps a zone's address records in sync with the host's
// public addresses:
// - **AddressSource**: Trait for discovering the current public address
// - **DnsProvider**: Trait for looking up and writing records via provider APIs
// - **PushTransport**: Trait for delivering operator notifications
// - **RecordUpdater**: Writes a record only when its address changed
// - **NotificationSink**: Flap-suppressed failure/recovery notifications
// - **PollLoop**: Periodic, concurrent IPv4/IPv6 discovery feeding the updater
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from HTTP clients
// 2. **No redundant writes**: An unchanged address never reaches the provider
// 3. **Family independence**: `A` and `AAAA` succeed or fail on their own
// 4. **Quiet failures**: One alert per grace window, never one per attempt
// 5. **Library-First**: All core functionality can be used as a library

pub mod address;
pub mod config;
pub mod error;
pub mod notify;
pub mod poll;
pub mod provider;
pub mod traits;
pub mod updater;

// Re-export core types for convenience
pub use address::{Family, RecordType, parse_address};
pub use config::{NotifyConfig, PollConfig};
pub use error::{Error, Result};
pub use notify::{Channel, ChannelStatus, NotificationSink, PushNotifier};
pub use poll::{FamilyOutcome, PollLoop, TickReport};
pub use traits::{AddressSource, DnsProvider, PushTransport};
pub use updater::{RecordUpdater, UpdateResult};
