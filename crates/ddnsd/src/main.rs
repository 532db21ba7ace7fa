// # ddnsd - DDNS Daemon
//
// This is a THIN integration layer: it reads configuration, builds the
// components from ddns-core and the adapter crates, and runs them until a
// signal arrives. All DDNS logic lives in ddns-core.
//
// The daemon is responsible for:
// 1. Reading configuration from flags and environment variables
// 2. Initializing tracing and the runtime
// 3. Serving the webhook
// 4. Running the poll loop when polling is enabled
//
// ## Configuration
//
// Every flag has an environment fallback (`ddnsd --help` lists them). The
// Cloudflare token is read from `CLOUDFLARE_API_TOKEN` only.
//
// ## Example
//
// ```bash
// export CLOUDFLARE_API_TOKEN=your_token
// export DDNS_NTFY_TOKEN=your_topic
//
// ddnsd --polling --zone example.com --interval 60
// ```

mod webhook;

use anyhow::{Context, Result};
use clap::Parser;
use ddns_core::config::{DEFAULT_IPV4_URL, DEFAULT_IPV6_URL, NotifyConfig, PollConfig};
use ddns_core::address::Family;
use ddns_core::notify::NotificationSink;
use ddns_core::poll::PollLoop;
use ddns_core::traits::PushTransport;
use ddns_core::updater::RecordUpdater;
use ddns_ip_http::HttpAddressSource;
use ddns_provider_cloudflare::CloudflareProvider;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Public ntfy server
const DEFAULT_NTFY_SERVER: &str = "https://ntfy.sh";

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Keep a Cloudflare address record in sync with this host's public IP
#[derive(Debug, Parser)]
#[command(name = "ddnsd", version, about)]
struct Args {
    /// Webhook listen address; a bare ":port" binds all interfaces
    #[arg(long, env = "DDNS_ADDR", default_value = ":8081")]
    addr: String,

    /// Poll the public address periodically
    #[arg(long, env = "DDNS_POLLING")]
    polling: bool,

    /// Seconds between polls
    #[arg(long, env = "DDNS_INTERVAL", default_value_t = 60)]
    interval: u64,

    /// Zone whose records the poll loop keeps in sync
    #[arg(long, env = "DDNS_ZONE")]
    zone: Option<String>,

    /// ntfy topic; notifications are disabled without it
    #[arg(long = "ntfy", env = "DDNS_NTFY_TOKEN", hide_env_values = true)]
    ntfy_token: Option<String>,

    /// ntfy server
    #[arg(long, env = "DDNS_NTFY_SERVER", default_value = DEFAULT_NTFY_SERVER)]
    ntfy_server: String,

    /// Seconds before a failure is alerted, and between repeated alerts
    #[arg(long, env = "DDNS_GRACE", default_value_t = 300)]
    grace: u64,

    /// IPv4 discovery endpoint
    #[arg(long, env = "DDNS_IPV4_URL", default_value = DEFAULT_IPV4_URL)]
    ipv4_url: String,

    /// IPv6 discovery endpoint
    #[arg(long, env = "DDNS_IPV6_URL", default_value = DEFAULT_IPV6_URL)]
    ipv6_url: String,

    /// Do not poll or update the AAAA record
    #[arg(long, env = "DDNS_NO_IPV6")]
    no_ipv6: bool,

    /// Seconds before a single address fetch is abandoned
    #[arg(long, env = "DDNS_FETCH_TIMEOUT", default_value_t = 10)]
    fetch_timeout: u64,

    /// Debug logging
    #[arg(long, env = "DDNS_DEBUG")]
    debug: bool,

    /// Log level when --debug is not given
    #[arg(long, env = "DDNS_LOG_LEVEL", default_value_t = Level::INFO)]
    log_level: Level,
}

impl Args {
    fn log_level(&self) -> Level {
        if self.debug { Level::DEBUG } else { self.log_level }
    }

    /// `host:port` to bind, expanding a bare `:port`
    fn bind_address(&self) -> String {
        bind_address(&self.addr)
    }

    /// Poll loop configuration, `None` when polling is off
    fn poll_config(&self) -> Result<Option<PollConfig>> {
        if !self.polling {
            return Ok(None);
        }
        let zone = self
            .zone
            .clone()
            .context("--zone (DDNS_ZONE) is required when polling is enabled")?;

        let mut config = PollConfig::new(zone)
            .with_interval_secs(self.interval)
            .with_endpoint(Family::V4, Some(self.ipv4_url.clone()))
            .with_endpoint(
                Family::V6,
                (!self.no_ipv6).then(|| self.ipv6_url.clone()),
            );
        config.fetch_timeout_secs = self.fetch_timeout;
        config.validate()?;
        Ok(Some(config))
    }

    fn notify_config(&self) -> NotifyConfig {
        NotifyConfig {
            grace_secs: self.grace,
            ..NotifyConfig::default()
        }
    }
}

fn bind_address(addr: &str) -> String {
    if addr.starts_with(':') {
        format!("0.0.0.0{}", addr)
    } else {
        addr.to_string()
    }
}

/// Every poll tick lands past the grace period, so each fetch success
/// after the first reads as a recovery.
fn interval_exceeds_grace(poll: &PollConfig, notify: &NotifyConfig) -> bool {
    poll.interval() >= notify.grace()
}

/// Everything the daemon runs, built before the runtime starts
struct Daemon {
    bind: String,
    state: webhook::AppState,
    poll: Option<PollLoop>,
}

fn build(args: &Args, cloudflare_token: String) -> Result<Daemon> {
    let provider = CloudflareProvider::new(cloudflare_token)
        .context("Failed to create Cloudflare client")?;

    let notify = args.notify_config();
    let notifier = Arc::new(NotificationSink::new(push_transport(args, &notify)?, &notify));
    match notifier.as_ref() {
        NotificationSink::Push(_) => info!(grace = ?notify.grace(), "ntfy notifications enabled"),
        NotificationSink::Disabled => info!("Notifications disabled"),
    }

    let updater = Arc::new(RecordUpdater::new(Arc::new(provider), notifier.clone()));

    let poll = match args.poll_config()? {
        Some(config) => {
            if matches!(notifier.as_ref(), NotificationSink::Push(_))
                && interval_exceeds_grace(&config, &notify)
            {
                tracing::warn!(
                    interval = ?config.interval(),
                    grace = ?notify.grace(),
                    "poll interval is not shorter than the grace period, every fetch will be reported as repaired"
                );
            }
            let source = HttpAddressSource::new()?;
            Some(PollLoop::new(
                Arc::new(source),
                updater.clone(),
                notifier.clone(),
                config,
            )?)
        }
        None => None,
    };

    Ok(Daemon {
        bind: args.bind_address(),
        state: webhook::AppState { updater, notifier },
        poll,
    })
}

#[cfg(feature = "ntfy")]
fn push_transport(args: &Args, notify: &NotifyConfig) -> Result<Option<Box<dyn PushTransport>>> {
    let Some(token) = args.ntfy_token.as_deref() else {
        return Ok(None);
    };
    let transport = ddns_notify_ntfy::NtfyTransport::new(&args.ntfy_server, token, notify.title.clone())?;
    Ok(Some(Box::new(transport)))
}

#[cfg(not(feature = "ntfy"))]
fn push_transport(args: &Args, _notify: &NotifyConfig) -> Result<Option<Box<dyn PushTransport>>> {
    if args.ntfy_token.is_some() {
        tracing::warn!("ntfy token given but ddnsd was built without the ntfy feature");
    }
    Ok(None)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!("Starting ddnsd daemon");

    let token = match std::env::var("CLOUDFLARE_API_TOKEN") {
        Ok(token) if !token.trim().is_empty() => token,
        _ => {
            error!(
                "CLOUDFLARE_API_TOKEN is required. \
                Set it via: export CLOUDFLARE_API_TOKEN=your_token"
            );
            return DdnsExitCode::ConfigError.into();
        }
    };

    let daemon = match build(&args, token) {
        Ok(daemon) => daemon,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run_daemon(daemon)).into()
}

/// Run the daemon until a shutdown signal or a fatal server error
async fn run_daemon(daemon: Daemon) -> DdnsExitCode {
    let listener = match tokio::net::TcpListener::bind(&daemon.bind).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", daemon.bind, e);
            return DdnsExitCode::ConfigError;
        }
    };
    info!("Webhook listening on {}", daemon.bind);

    let cancel = CancellationToken::new();

    let app = webhook::router(daemon.state);
    let server_cancel = cancel.clone();
    let server = tokio::spawn(async move {
        let shutdown = server_cancel.clone();
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await;
        if let Err(ref e) = result {
            error!("Webhook server error: {}", e);
            server_cancel.cancel();
        }
        result
    });

    let poller = daemon.poll.map(|poll| {
        let token = cancel.clone();
        tokio::spawn(async move { poll.run(token).await })
    });
    if poller.is_none() {
        info!("Polling disabled, serving webhook only");
    }

    let mut exit = tokio::select! {
        signal = wait_for_shutdown() => match signal {
            Ok(signal) => {
                info!("Received shutdown signal: {}", signal);
                DdnsExitCode::CleanShutdown
            }
            Err(e) => {
                error!("Shutdown error: {}", e);
                DdnsExitCode::RuntimeError
            }
        },
        _ = cancel.cancelled() => DdnsExitCode::RuntimeError,
    };

    info!("Shutting down daemon");
    cancel.cancel();

    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(_)) => exit = DdnsExitCode::RuntimeError,
        Err(e) => {
            error!("Webhook server task failed: {}", e);
            exit = DdnsExitCode::RuntimeError;
        }
    }

    if let Some(poller) = poller {
        match poller.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!("Poll loop error: {}", e);
                exit = DdnsExitCode::RuntimeError;
            }
            Err(e) => {
                error!("Poll loop task failed: {}", e);
                exit = DdnsExitCode::RuntimeError;
            }
        }
    }

    info!("Shutdown complete");
    exit
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(signal)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
