//! Test doubles and common utilities for contract tests
//!
//! This module provides minimal test doubles that record how the core
//! drives its collaborators without doing any real I/O.

#![allow(dead_code)]

use ddns_core::address::{Family, RecordType, parse_address};
use ddns_core::config::PollConfig;
use ddns_core::error::{Error, Result};
use ddns_core::notify::{NotificationSink, PushNotifier};
use ddns_core::poll::PollLoop;
use ddns_core::traits::{AddressSource, DnsProvider, PushTransport};
use ddns_core::updater::RecordUpdater;
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Grace period used by the harness
pub const GRACE: Duration = Duration::from_secs(300);

/// One `update_record` call seen by the mock provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteCall {
    pub zone: String,
    pub record_type: RecordType,
    pub address: IpAddr,
}

#[derive(Default)]
struct ProviderState {
    writes: Mutex<Vec<WriteCall>>,
    failing: Mutex<HashSet<RecordType>>,
    missing_zones: Mutex<HashSet<String>>,
    delay: Mutex<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// A mock DnsProvider that records writes and fails on demand per record type
#[derive(Clone, Default)]
pub struct MockDnsProvider {
    state: Arc<ProviderState>,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `update_record` call so far, failed ones included
    pub fn writes(&self) -> Vec<WriteCall> {
        self.state.writes.lock().unwrap().clone()
    }

    pub fn write_count(&self) -> usize {
        self.state.writes.lock().unwrap().len()
    }

    pub fn writes_of(&self, record_type: RecordType) -> Vec<WriteCall> {
        self.writes()
            .into_iter()
            .filter(|w| w.record_type == record_type)
            .collect()
    }

    /// Make writes of `record_type` fail (or succeed again)
    pub fn set_failing(&self, record_type: RecordType, failing: bool) {
        let mut set = self.state.failing.lock().unwrap();
        if failing {
            set.insert(record_type);
        } else {
            set.remove(&record_type);
        }
    }

    pub fn remove_zone(&self, zone: &str) {
        self.state.missing_zones.lock().unwrap().insert(zone.to_string());
    }

    /// Delay every `update_record` call
    pub fn set_delay(&self, delay: Duration) {
        *self.state.delay.lock().unwrap() = delay;
    }

    /// Highest number of writes that were in flight at the same time
    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn find_zone_id(&self, zone_name: &str) -> Result<String> {
        if self.state.missing_zones.lock().unwrap().contains(zone_name) {
            return Err(Error::not_found("no such zone"));
        }
        Ok(format!("zone:{}", zone_name))
    }

    async fn find_record_id(&self, zone_id: &str, record_type: RecordType) -> Result<String> {
        Ok(format!("{}/{}", zone_id, record_type))
    }

    async fn update_record(&self, zone_id: &str, _record_id: &str, address: IpAddr) -> Result<()> {
        let record_type = Family::of(&address).record_type();
        let current = self.state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = *self.state.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.state.writes.lock().unwrap().push(WriteCall {
            zone: zone_id.trim_start_matches("zone:").to_string(),
            record_type,
            address,
        });
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.state.failing.lock().unwrap().contains(&record_type) {
            return Err(Error::provider("mock", "write rejected"));
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// What the scripted source answers for a family
#[derive(Debug, Clone)]
pub enum Reply {
    Address(&'static str),
    Unreachable,
    Garbage,
    Hang,
}

struct SourceState {
    v4: Mutex<Reply>,
    v6: Mutex<Reply>,
    v4_calls: AtomicUsize,
    v6_calls: AtomicUsize,
    delay: Mutex<Duration>,
}

/// An AddressSource answering from a per-family script
#[derive(Clone)]
pub struct ScriptedSource {
    state: Arc<SourceState>,
}

impl ScriptedSource {
    pub fn new(v4: Reply, v6: Reply) -> Self {
        Self {
            state: Arc::new(SourceState {
                v4: Mutex::new(v4),
                v6: Mutex::new(v6),
                v4_calls: AtomicUsize::new(0),
                v6_calls: AtomicUsize::new(0),
                delay: Mutex::new(Duration::ZERO),
            }),
        }
    }

    pub fn set(&self, family: Family, reply: Reply) {
        match family {
            Family::V4 => *self.state.v4.lock().unwrap() = reply,
            Family::V6 => *self.state.v6.lock().unwrap() = reply,
        }
    }

    /// Delay every answer
    pub fn set_delay(&self, delay: Duration) {
        *self.state.delay.lock().unwrap() = delay;
    }

    pub fn calls(&self, family: Family) -> usize {
        match family {
            Family::V4 => self.state.v4_calls.load(Ordering::SeqCst),
            Family::V6 => self.state.v6_calls.load(Ordering::SeqCst),
        }
    }
}

#[async_trait::async_trait]
impl AddressSource for ScriptedSource {
    async fn fetch(&self, _endpoint: &str, family: Family) -> Result<IpAddr> {
        let reply = match family {
            Family::V4 => {
                self.state.v4_calls.fetch_add(1, Ordering::SeqCst);
                self.state.v4.lock().unwrap().clone()
            }
            Family::V6 => {
                self.state.v6_calls.fetch_add(1, Ordering::SeqCst);
                self.state.v6.lock().unwrap().clone()
            }
        };

        let delay = *self.state.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match reply {
            Reply::Address(text) => parse_address(text, family),
            Reply::Unreachable => Err(Error::transport("connection refused")),
            Reply::Garbage => parse_address("<html>rate limited</html>", family),
            Reply::Hang => std::future::pending().await,
        }
    }
}

/// A PushTransport that records every message
#[derive(Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingTransport {
    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, m)| m.clone()).collect()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        self.messages().iter().filter(|m| m.contains(needle)).count()
    }
}

#[async_trait::async_trait]
impl PushTransport for RecordingTransport {
    async fn push(&self, tag: &str, message: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((tag.to_string(), message.to_string()));
        Ok(())
    }
}

/// All the moving parts of one updater, wired the way the daemon wires them
pub struct Harness {
    pub provider: MockDnsProvider,
    pub source: ScriptedSource,
    pub transport: RecordingTransport,
    pub notifier: Arc<NotificationSink>,
    pub updater: Arc<RecordUpdater>,
    pub poll: PollLoop,
}

impl Harness {
    pub fn new(v4: Reply, v6: Reply) -> Self {
        Self::with_config(v4, v6, poll_config())
    }

    pub fn with_config(v4: Reply, v6: Reply, config: PollConfig) -> Self {
        let provider = MockDnsProvider::new();
        let source = ScriptedSource::new(v4, v6);
        let transport = RecordingTransport::default();
        let notifier = Arc::new(NotificationSink::Push(PushNotifier::new(
            Box::new(transport.clone()),
            GRACE,
        )));
        let updater = Arc::new(RecordUpdater::new(
            Arc::new(provider.clone()),
            notifier.clone(),
        ));
        let poll = PollLoop::new(
            Arc::new(source.clone()),
            updater.clone(),
            notifier.clone(),
            config,
        )
        .expect("valid poll config");

        Self {
            provider,
            source,
            transport,
            notifier,
            updater,
            poll,
        }
    }
}

/// Poll configuration for zone "example.com" with a 60 s interval
pub fn poll_config() -> PollConfig {
    PollConfig::new("example.com").with_interval_secs(60)
}

pub fn ip(text: &str) -> IpAddr {
    text.parse().expect("valid test address")
}
