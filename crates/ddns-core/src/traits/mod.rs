//! Core traits for the DDNS updater
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`AddressSource`]: Discover the current public address
//! - [`DnsProvider`]: Look up and write address records via provider APIs
//! - [`PushTransport`]: Deliver operator notifications

pub mod address_source;
pub mod dns_provider;
pub mod push;

pub use address_source::AddressSource;
pub use dns_provider::DnsProvider;
pub use push::{PushTransport, TAG_GLOBE, TAG_WARNING};
