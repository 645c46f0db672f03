//! The message loop.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use brass_runtime::BrassRuntime;
//!
//! // Loads brass.toml from the current directory
//! let runtime = BrassRuntime::new(host)?;
//!
//! // Custom configuration
//! let runtime = BrassRuntime::builder()
//!     .config_file("config/bot.toml")
//!     .profile("production")
//!     .build(host)?;
//!
//! runtime.run(messages).await;
//! ```

use std::future::Future;
use std::path::Path;

use futures::{Stream, StreamExt};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::{BrassConfig, ConfigLoader, validate_config};
use crate::error::RuntimeResult;
use crate::logging;
use brass_core::{BoxedHost, IncomingMessage};
use brass_framework::{DispatchOutcome, Dispatcher};

/// Counts of what a [`BrassRuntime::run`] call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub handled: usize,
    pub failed: usize,
    pub ignored: usize,
}

impl RunStats {
    fn record(&mut self, outcome: &DispatchOutcome) {
        match outcome {
            DispatchOutcome::Ignored(_) => self.ignored += 1,
            DispatchOutcome::Handled { .. } => self.handled += 1,
            DispatchOutcome::Failed { .. } => self.failed += 1,
        }
    }

    /// Messages seen in total.
    pub fn total(&self) -> usize {
        self.handled + self.failed + self.ignored
    }
}

/// Owns the configuration and the dispatcher, and feeds messages through it.
///
/// Messages are dispatched one at a time; the next message is not read
/// until the previous one's handler has finished.
pub struct BrassRuntime {
    config: BrassConfig,
    dispatcher: Dispatcher,
    shutdown: CancellationToken,
}

impl BrassRuntime {
    /// Creates a runtime, loading `brass.toml` from the current directory.
    ///
    /// A configuration file that fails to load is reported and defaults are
    /// used instead. Plugin failures still abort.
    pub fn new(host: BoxedHost) -> RuntimeResult<Self> {
        let config = ConfigLoader::new()
            .with_current_dir()
            .load()
            .unwrap_or_else(|e| {
                eprintln!("Warning: Failed to load config ({e}), using defaults");
                BrassConfig::default()
            });

        Self::from_config(&config, host)
    }

    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from an already loaded configuration.
    ///
    /// Validates the configuration, initializes logging, registers the
    /// default help command if enabled and installs every compiled-in plugin
    /// that is not disabled.
    pub fn from_config(config: &BrassConfig, host: BoxedHost) -> RuntimeResult<Self> {
        validate_config(config)?;
        logging::init_from_config(&config.logging);

        let dispatcher = Dispatcher::new(host, (&config.commands).into());
        if config.commands.default_help {
            dispatcher.register_default_help()?;
        }

        let loaded =
            dispatcher.load_plugins(&config.plugins.disabled, &config.plugins.settings)?;

        info!(
            prefix = %config.commands.prefix,
            plugins = loaded.len(),
            commands = dispatcher.commands().len(),
            "Runtime initialized from configuration"
        );

        Ok(Self {
            config: config.clone(),
            dispatcher,
            shutdown: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &BrassConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// A token that stops [`run`](Self::run) when cancelled.
    ///
    /// The message being dispatched at that moment is finished first.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Dispatches messages until the stream ends, the shutdown token is
    /// cancelled, or Ctrl+C / SIGTERM is received.
    pub async fn run<S>(&self, messages: S) -> RunStats
    where
        S: Stream<Item = IncomingMessage>,
    {
        info!("Brass runtime is now running. Press Ctrl+C to stop.");
        self.run_until(messages, wait_for_shutdown()).await
    }

    /// Like [`run`](Self::run), with a custom shutdown future in place of
    /// the process signals.
    pub async fn run_until<S, F>(&self, messages: S, shutdown: F) -> RunStats
    where
        S: Stream<Item = IncomingMessage>,
        F: Future<Output = ()>,
    {
        let mut messages = std::pin::pin!(messages);
        let mut shutdown = std::pin::pin!(shutdown);
        let mut stats = RunStats::default();

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    info!("Shutdown requested");
                    break;
                }
                _ = &mut shutdown => break,
                next = messages.next() => {
                    let Some(message) = next else {
                        debug!("Message stream ended");
                        break;
                    };
                    let outcome = self.dispatcher.dispatch(message).await;
                    trace!(?outcome, "Message processed");
                    stats.record(&outcome);
                }
            }
        }

        self.shutdown.cancel();
        info!(
            handled = stats.handled,
            failed = stats.failed,
            ignored = stats.ignored,
            "Runtime stopped"
        );
        stats
    }
}

/// Waits for Ctrl+C or, on unix, SIGTERM.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                warn!(error = %e, "Failed to register SIGTERM handler, waiting for Ctrl+C only");
                wait_for_ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = wait_for_ctrl_c() => {}
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for a [`BrassRuntime`] with custom configuration loading.
///
/// ```rust,ignore
/// let runtime = BrassRuntime::builder()
///     .config_file("config/bot.toml")
///     .set("commands.prefix", "!")
///     .build(host)?;
/// ```
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
        }
    }

    /// Loads this file instead of searching for one.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g. "development", "production").
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges a whole configuration over the loaded one.
    pub fn merge(mut self, config: BrassConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Overrides a single dotted key, e.g. `commands.prefix`.
    pub fn set<V: serde::Serialize>(mut self, key: &str, value: V) -> Self {
        self.config_loader = self.config_loader.set(key, value);
        self
    }

    /// Loads the configuration and builds the runtime around `host`.
    pub fn build(self, host: BoxedHost) -> RuntimeResult<BrassRuntime> {
        let config = self.config_loader.load()?;
        BrassRuntime::from_config(&config, host)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use brass_core::{Channel, MemoryHost, User};
    use futures::stream;

    use super::*;
    use crate::error::RuntimeError;

    fn message(id: &str, content: &str) -> IncomingMessage {
        IncomingMessage::new(
            id,
            content,
            User::new("1", "ada"),
            Channel::new("10", "general"),
        )
    }

    fn runtime(host: &Arc<MemoryHost>, config: BrassConfig) -> BrassRuntime {
        let runtime = BrassRuntime::from_config(&config, host.clone()).unwrap();
        runtime
            .dispatcher()
            .register("ping", "", || async { "pong" }, None)
            .unwrap();
        runtime
    }

    #[tokio::test]
    async fn test_run_until_stream_ends() {
        let host = Arc::new(MemoryHost::new());
        let runtime = runtime(&host, BrassConfig::default());

        let stats = runtime
            .run_until(
                stream::iter(vec![
                    message("1", "?ping"),
                    message("2", "hello"),
                    message("3", "?nope"),
                ]),
                std::future::pending(),
            )
            .await;

        assert_eq!(
            stats,
            RunStats {
                handled: 1,
                failed: 0,
                ignored: 2
            }
        );
        let sent = host.drain();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].content, "<@1>, pong");
        assert!(runtime.shutdown_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_panicking_handler_does_not_stop_the_loop() {
        async fn boom() {
            panic!("handler bug");
        }

        let host = Arc::new(MemoryHost::new());
        let runtime = runtime(&host, BrassConfig::default());
        runtime.dispatcher().register("boom", "", boom, None).unwrap();

        let stats = runtime
            .run_until(
                stream::iter(vec![message("1", "?boom"), message("2", "?ping")]),
                std::future::pending(),
            )
            .await;

        assert_eq!(stats.failed, 1);
        assert_eq!(stats.handled, 1);
        assert_eq!(host.drain()[0].content, "<@1>, pong");
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_before_reading() {
        let host = Arc::new(MemoryHost::new());
        let runtime = runtime(&host, BrassConfig::default());
        runtime.shutdown_token().cancel();

        let stats = runtime
            .run_until(stream::iter(vec![message("1", "?ping")]), std::future::pending())
            .await;

        assert_eq!(stats.total(), 0);
        assert!(host.sent().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_future_stops_pending_stream() {
        let host = Arc::new(MemoryHost::new());
        let runtime = runtime(&host, BrassConfig::default());

        let stats = runtime
            .run_until(stream::pending::<IncomingMessage>(), async {})
            .await;

        assert_eq!(stats, RunStats::default());
    }

    #[tokio::test]
    async fn test_config_prefix_and_help() {
        let host = Arc::new(MemoryHost::new());
        let mut config = BrassConfig::default();
        config.commands.prefix = "!".into();
        let runtime = runtime(&host, config);

        assert!(runtime.dispatcher().commands().contains("help"));
        let stats = runtime
            .run_until(
                stream::iter(vec![message("1", "!ping"), message("2", "?ping")]),
                std::future::pending(),
            )
            .await;
        assert_eq!(stats.handled, 1);
        assert_eq!(stats.ignored, 1);
    }

    #[test]
    fn test_default_help_can_be_disabled() {
        let host = Arc::new(MemoryHost::new());
        let mut config = BrassConfig::default();
        config.commands.default_help = false;

        let runtime = BrassRuntime::from_config(&config, host).unwrap();
        assert!(!runtime.dispatcher().commands().contains("help"));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let host = Arc::new(MemoryHost::new());
        let mut config = BrassConfig::default();
        config.commands.prefix = String::new();

        let result = BrassRuntime::from_config(&config, host);
        assert!(matches!(result, Err(RuntimeError::Config(_))));
    }
}
