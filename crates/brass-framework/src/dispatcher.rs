//! Message dispatch.
//!
//! [`Dispatcher::dispatch`] takes one incoming message through these steps:
//!
//! 1. Drop it silently if the author is blocked.
//! 2. Match the prefix: the configured literal, or a mention of the bot once
//!    its own id is known. No match means the message is ignored.
//! 3. Drop messages from bot accounts when `ignore_bots` is set.
//! 4. Split off the first word as the command name and look it up
//!    case-insensitively. Unknown names are ignored.
//! 5. Tokenize and bind the remainder against the command's argument map,
//!    build a [`CommandContext`] and run the handler.
//!
//! Failures in step 5 never escape `dispatch`. They go to the observer set
//! with [`Dispatcher::on_error`], or are logged when there is none.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::{RwLock, RwLockReadGuard};
use serde_json::Value as JsonValue;
use tower::Service;
use tracing::{Instrument, Level, debug, error, info, span, trace, warn};

use brass_core::{BoxedHost, IncomingMessage};

use crate::binder::{Arguments, bind};
use crate::context::CommandContext;
use crate::converter::{ConvertContext, Converter, ConverterRegistry};
use crate::error::{CommandError, CommandResult};
use crate::handler::Handler;
use crate::plugin::{PluginContext, PluginDescriptor, PluginError, compiled_plugins};
use crate::registry::{CommandEntry, CommandRegistry};
use crate::split::{split_command, tokenize};

/// Receives every command failure caught at the dispatch boundary.
pub type ErrorObserver =
    Arc<dyn Fn(&CommandEntry, &CommandContext, &CommandError) + Send + Sync>;

// ============================================================================
// Options and outcomes
// ============================================================================

/// Dispatcher behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherOptions {
    /// Literal prefix that starts a command.
    pub prefix: String,
    /// Whether mentioning the bot also starts a command.
    pub mentionable: bool,
    /// Whether messages from bot accounts are dropped.
    pub ignore_bots: bool,
    /// Author ids whose messages are dropped before anything else.
    pub blocked_users: HashSet<String>,
}

impl Default for DispatcherOptions {
    fn default() -> Self {
        Self {
            prefix: "?".to_string(),
            mentionable: true,
            ignore_bots: true,
            blocked_users: HashSet::new(),
        }
    }
}

impl DispatcherOptions {
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn mentionable(mut self, mentionable: bool) -> Self {
        self.mentionable = mentionable;
        self
    }

    pub fn ignore_bots(mut self, ignore_bots: bool) -> Self {
        self.ignore_bots = ignore_bots;
        self
    }

    pub fn block_user(mut self, id: impl Into<String>) -> Self {
        self.blocked_users.insert(id.into());
        self
    }
}

/// Why a message was not treated as a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IgnoreReason {
    Blocked,
    NoPrefix,
    Bot,
    UnknownCommand,
}

/// What [`Dispatcher::dispatch`] did with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Ignored(IgnoreReason),
    /// The handler ran to completion.
    Handled { command: String },
    /// Binding or the handler failed; the error went to the observer.
    Failed { command: String },
}

impl DispatchOutcome {
    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored(_))
    }

    /// The resolved command name, unless the message was ignored.
    pub fn command(&self) -> Option<&str> {
        match self {
            Self::Ignored(_) => None,
            Self::Handled { command } | Self::Failed { command } => Some(command),
        }
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

struct Inner {
    host: BoxedHost,
    options: DispatcherOptions,
    self_id: RwLock<Option<String>>,
    registry: RwLock<CommandRegistry>,
    converters: RwLock<ConverterRegistry>,
    observer: RwLock<Option<ErrorObserver>>,
}

/// Routes incoming messages to registered commands.
///
/// Cheap to clone; clones share the same registry.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

/// A non-owning handle to a [`Dispatcher`], for handlers that need to look
/// back at the registry without keeping it alive.
#[derive(Clone)]
pub struct WeakDispatcher {
    inner: Weak<Inner>,
}

impl WeakDispatcher {
    pub fn upgrade(&self) -> Option<Dispatcher> {
        self.inner.upgrade().map(|inner| Dispatcher { inner })
    }
}

impl Dispatcher {
    /// Creates a dispatcher with the built-in converters and no commands.
    pub fn new(host: BoxedHost, options: DispatcherOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                host,
                options,
                self_id: RwLock::new(None),
                registry: RwLock::new(CommandRegistry::new()),
                converters: RwLock::new(ConverterRegistry::builtin()),
                observer: RwLock::new(None),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakDispatcher {
        WeakDispatcher {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn options(&self) -> &DispatcherOptions {
        &self.inner.options
    }

    pub fn host(&self) -> &BoxedHost {
        &self.inner.host
    }

    /// Records the bot's own id, enabling the mention prefix.
    pub fn set_self_id(&self, id: impl Into<String>) {
        let id = id.into();
        debug!(self_id = %id, "Self id set");
        *self.inner.self_id.write() = Some(id);
    }

    pub fn self_id(&self) -> Option<String> {
        self.inner.self_id.read().clone()
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Registers a command, replacing any command with the same name.
    ///
    /// `map` is compiled here; an empty map registers a command that takes
    /// no arguments. A malformed map is returned as
    /// [`CommandError::InvalidArgumentMap`].
    pub fn register<H, T>(
        &self,
        name: &str,
        map: &str,
        handler: H,
        help: Option<&str>,
    ) -> CommandResult<()>
    where
        H: Handler<T>,
        T: 'static,
    {
        let entry = CommandEntry::new(name, Some(map), handler, help)?;
        self.insert(entry);
        Ok(())
    }

    /// Stores a prepared entry, returning the one it replaced.
    pub fn insert(&self, entry: CommandEntry) -> Option<CommandEntry> {
        self.inner.registry.write().insert(entry)
    }

    /// Read access to the command table.
    ///
    /// Do not hold the guard across an `.await`.
    pub fn commands(&self) -> RwLockReadGuard<'_, CommandRegistry> {
        self.inner.registry.read()
    }

    /// Registers a converter, replacing any with the same name.
    pub fn register_converter<C>(&self, name: impl Into<String>, converter: C)
    where
        C: Converter + 'static,
    {
        self.inner.converters.write().register(name, converter);
    }

    /// Read access to the converter table.
    pub fn converters(&self) -> RwLockReadGuard<'_, ConverterRegistry> {
        self.inner.converters.read()
    }

    /// Sets the error observer, replacing any previous one.
    pub fn on_error<F>(&self, observer: F)
    where
        F: Fn(&CommandEntry, &CommandContext, &CommandError) + Send + Sync + 'static,
    {
        *self.inner.observer.write() = Some(Arc::new(observer));
    }

    /// Registers the built-in `help [command]` command.
    pub fn register_default_help(&self) -> CommandResult<()> {
        crate::help::install(self)
    }

    /// Builder form of [`register_default_help`](Self::register_default_help).
    pub fn with_default_help(self) -> CommandResult<Self> {
        self.register_default_help()?;
        Ok(self)
    }

    // ========================================================================
    // Plugins
    // ========================================================================

    /// Installs one plugin and merges its registrations.
    ///
    /// Returns the number of commands merged. Nothing is merged if the
    /// plugin's `install` fails.
    pub fn load_plugin(
        &self,
        plugin: &PluginDescriptor,
        config: &JsonValue,
    ) -> Result<usize, PluginError> {
        let mut ctx = PluginContext::new(plugin.name, config);
        (plugin.install)(&mut ctx).map_err(|e| {
            error!(plugin = plugin.name, error = %e, "Plugin install failed");
            PluginError::new(plugin.name, e)
        })?;

        let (commands, converters) = ctx.into_parts();
        let count = commands.len();

        if !converters.is_empty() {
            self.inner.converters.write().extend(converters);
        }

        let mut registry = self.inner.registry.write();
        for entry in commands {
            registry.insert(entry);
        }
        drop(registry);

        info!(plugin = plugin.name, commands = count, "Plugin loaded");
        Ok(count)
    }

    /// Installs every compiled-in plugin not listed in `disabled`, in name
    /// order, handing each its entry from `settings`.
    ///
    /// Stops at the first plugin that fails.
    pub fn load_plugins(
        &self,
        disabled: &[String],
        settings: &HashMap<String, JsonValue>,
    ) -> Result<Vec<&'static str>, PluginError> {
        let mut loaded = Vec::new();
        for plugin in compiled_plugins() {
            if disabled.iter().any(|name| name == plugin.name) {
                debug!(plugin = plugin.name, "Plugin disabled, skipping");
                continue;
            }
            let config = settings.get(plugin.name).unwrap_or(&JsonValue::Null);
            self.load_plugin(plugin, config)?;
            loaded.push(plugin.name);
        }
        Ok(loaded)
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Processes one message to completion. Never fails; see
    /// [`DispatchOutcome`] for what happened.
    pub async fn dispatch(&self, message: IncomingMessage) -> DispatchOutcome {
        let span = span!(
            Level::DEBUG,
            "dispatch",
            message = %message.id,
            author = %message.author.id,
        );
        self.dispatch_inner(message).instrument(span).await
    }

    async fn dispatch_inner(&self, message: IncomingMessage) -> DispatchOutcome {
        let options = &self.inner.options;

        if options.blocked_users.contains(&message.author.id) {
            trace!("Author is blocked");
            return DispatchOutcome::Ignored(IgnoreReason::Blocked);
        }

        let Some((prefix, body)) = self.strip_prefix(&message.content) else {
            return DispatchOutcome::Ignored(IgnoreReason::NoPrefix);
        };

        if options.ignore_bots && message.author.bot {
            trace!("Author is a bot");
            return DispatchOutcome::Ignored(IgnoreReason::Bot);
        }

        let (name, rest) = split_command(body).unwrap_or_default();
        let name = name.to_lowercase();
        let rest = rest.to_owned();

        let entry = self.inner.registry.read().get(&name).cloned();
        let Some(entry) = entry else {
            trace!(command = %name, "Unknown command");
            return DispatchOutcome::Ignored(IgnoreReason::UnknownCommand);
        };

        let bound = self.bind_arguments(&entry, &message, &rest);
        let ctx = CommandContext::new(message, prefix, name, rest, self.inner.host.clone());

        let (ctx, result) = match bound {
            Ok(args) => {
                let ctx = Arc::new(ctx.with_args(args));
                debug!(command = %entry.name, "Invoking handler");
                let result = run_handler(&entry, ctx.clone()).await;
                (ctx, result)
            }
            Err(err) => (Arc::new(ctx), Err(err)),
        };

        let command = entry.name.clone();
        match result {
            Ok(()) => DispatchOutcome::Handled { command },
            Err(err) => {
                self.report(&entry, &ctx, &err);
                DispatchOutcome::Failed { command }
            }
        }
    }

    /// Returns the matched prefix text and the body after it.
    fn strip_prefix<'a>(&self, content: &'a str) -> Option<(String, &'a str)> {
        let options = &self.inner.options;
        if let Some(body) = content.strip_prefix(options.prefix.as_str()) {
            return Some((options.prefix.clone(), body));
        }

        if !options.mentionable {
            return None;
        }
        let self_id = self.inner.self_id.read();
        let id = self_id.as_deref()?;
        [format!("<@{id}>"), format!("<@!{id}>")]
            .into_iter()
            .find_map(|mention| {
                content
                    .strip_prefix(mention.as_str())
                    .map(|body| (mention.clone(), body))
            })
    }

    fn bind_arguments(
        &self,
        entry: &CommandEntry,
        message: &IncomingMessage,
        raw: &str,
    ) -> CommandResult<Option<Arguments>> {
        if !entry.spec.takes_arguments() {
            return Ok(None);
        }
        let tokens = tokenize(raw)?;
        let converters = self.inner.converters.read();
        let ctx = ConvertContext::new(message, self.inner.host.directory());
        bind(&entry.spec, tokens, &converters, &ctx)
    }

    fn report(&self, entry: &CommandEntry, ctx: &CommandContext, err: &CommandError) {
        let observer = self.inner.observer.read().clone();
        match observer {
            Some(observer) => {
                debug!(command = %entry.name, error = %err, "Command failed");
                observer(entry, ctx, err);
            }
            None => error!("Ignoring unhandled command error: {err}"),
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("options", &self.inner.options)
            .field("self_id", &*self.inner.self_id.read())
            .field("commands", &self.inner.registry.read().names())
            .finish_non_exhaustive()
    }
}

/// Runs the handler, turning a panic into [`CommandError::Handler`].
async fn run_handler(entry: &CommandEntry, ctx: Arc<CommandContext>) -> CommandResult<()> {
    let handler = entry.handler.clone();
    AssertUnwindSafe(async move { handler(ctx).await })
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| {
            let reason = panic_message(payload.as_ref());
            warn!(command = %entry.name, reason = %reason, "Command handler panicked");
            Err(CommandError::handler(format!("handler panicked: {reason}")))
        })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic"
    }
}

// ============================================================================
// tower integration
// ============================================================================

impl Service<IncomingMessage> for Dispatcher {
    type Response = DispatchOutcome;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<DispatchOutcome, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, message: IncomingMessage) -> Self::Future {
        let dispatcher = self.clone();
        Box::pin(async move { Ok(dispatcher.dispatch(message).await) })
    }
}

#[cfg(test)]
mod tests {
    use brass_core::{Channel, MemoryHost, User};
    use parking_lot::Mutex;
    use tower::ServiceExt;

    use super::*;
    use crate::error::ErrorKind;

    fn setup(options: DispatcherOptions) -> (Arc<MemoryHost>, Dispatcher) {
        let host = Arc::new(MemoryHost::new());
        let dispatcher = Dispatcher::new(host.clone(), options);
        dispatcher
            .register("ping", "", || async { "pong" }, Some("Replies pong."))
            .unwrap();
        (host, dispatcher)
    }

    fn message(author: User, content: &str) -> IncomingMessage {
        IncomingMessage::new("m", content, author, Channel::new("c", "c"))
    }

    fn human(content: &str) -> IncomingMessage {
        message(User::new("1", "ada"), content)
    }

    #[tokio::test]
    async fn test_prefix_and_case_insensitive_name() {
        let (host, dispatcher) = setup(DispatcherOptions::default().with_prefix("!"));
        let outcome = dispatcher.dispatch(human("!PiNg")).await;
        assert_eq!(outcome, DispatchOutcome::Handled { command: "ping".into() });
        assert_eq!(host.sent()[0].content, "<@1>, pong");

        assert_eq!(
            dispatcher.dispatch(human("ping")).await,
            DispatchOutcome::Ignored(IgnoreReason::NoPrefix)
        );
        assert_eq!(
            dispatcher.dispatch(human("!nope")).await,
            DispatchOutcome::Ignored(IgnoreReason::UnknownCommand)
        );
        assert_eq!(
            dispatcher.dispatch(human("!")).await,
            DispatchOutcome::Ignored(IgnoreReason::UnknownCommand)
        );
    }

    #[tokio::test]
    async fn test_blocked_and_bot_authors() {
        let options = DispatcherOptions::default().block_user("666");
        let (host, dispatcher) = setup(options);

        let blocked = message(User::new("666", "mallory"), "?ping");
        assert_eq!(
            dispatcher.dispatch(blocked).await,
            DispatchOutcome::Ignored(IgnoreReason::Blocked)
        );

        let bot = message(User::new("2", "robot").with_bot(true), "?ping");
        assert_eq!(
            dispatcher.dispatch(bot).await,
            DispatchOutcome::Ignored(IgnoreReason::Bot)
        );
        assert!(host.sent().is_empty());
    }

    #[tokio::test]
    async fn test_bots_allowed_when_configured() {
        let (_, dispatcher) = setup(DispatcherOptions::default().ignore_bots(false));
        let bot = message(User::new("2", "robot").with_bot(true), "?ping");
        assert!(!dispatcher.dispatch(bot).await.is_ignored());
    }

    #[tokio::test]
    async fn test_mention_prefix_needs_self_id() {
        let (_, dispatcher) = setup(DispatcherOptions::default());
        assert!(dispatcher.dispatch(human("<@42> ping")).await.is_ignored());

        dispatcher.set_self_id("42");
        assert_eq!(dispatcher.dispatch(human("<@42> ping")).await.command(), Some("ping"));
        assert_eq!(dispatcher.dispatch(human("<@!42>ping")).await.command(), Some("ping"));
        assert!(dispatcher.dispatch(human("<@43> ping")).await.is_ignored());
    }

    #[tokio::test]
    async fn test_mention_prefix_disabled() {
        let (_, dispatcher) = setup(DispatcherOptions::default().mentionable(false));
        dispatcher.set_self_id("42");
        assert!(dispatcher.dispatch(human("<@42> ping")).await.is_ignored());
    }

    #[tokio::test]
    async fn test_errors_reach_observer() {
        let (_, dispatcher) = setup(DispatcherOptions::default());
        dispatcher
            .register("add", "<a:int> <b:int>", |args: Arguments| async move {
                let sum = args.get::<i64>("a").unwrap_or(0) + args.get::<i64>("b").unwrap_or(0);
                sum.to_string()
            }, None)
            .unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        dispatcher.on_error(move |entry, ctx, err| {
            sink.lock()
                .push((entry.name.clone(), ctx.raw_args().to_owned(), err.kind()));
        });

        let outcomes = [
            dispatcher.dispatch(human("?add 1")).await,
            dispatcher.dispatch(human("?add 1 2 3")).await,
            dispatcher.dispatch(human("?add one 2")).await,
            dispatcher.dispatch(human("?add \"1 2")).await,
        ];
        assert!(outcomes.iter().all(|o| matches!(o, DispatchOutcome::Failed { .. })));

        let seen = seen.lock();
        let kinds: Vec<ErrorKind> = seen.iter().map(|(_, _, kind)| *kind).collect();
        assert_eq!(
            kinds,
            vec![
                ErrorKind::RequiredArgumentMissing,
                ErrorKind::TooManyArguments,
                ErrorKind::BadArgument,
                ErrorKind::Parsing,
            ]
        );
        assert_eq!(seen[0].0, "add");
        assert_eq!(seen[0].1, "1");
    }

    #[tokio::test]
    async fn test_unobserved_errors_do_not_escape() {
        let (_, dispatcher) = setup(DispatcherOptions::default());
        dispatcher
            .register("fail", "", || async { Err::<(), _>("nope") }, None)
            .unwrap();
        assert_eq!(
            dispatcher.dispatch(human("?fail")).await,
            DispatchOutcome::Failed { command: "fail".into() }
        );
    }

    #[tokio::test]
    async fn test_panicking_handler_is_reported() {
        async fn boom() {
            panic!("handler bug");
        }

        let (host, dispatcher) = setup(DispatcherOptions::default());
        dispatcher.register("boom", "", boom, None).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        dispatcher.on_error(move |_, _, err| sink.lock().push((err.kind(), err.to_string())));

        assert_eq!(
            dispatcher.dispatch(human("?boom")).await,
            DispatchOutcome::Failed { command: "boom".into() }
        );
        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, ErrorKind::Handler);
        assert!(seen[0].1.contains("handler bug"));

        drop(seen);
        assert_eq!(
            dispatcher.dispatch(human("?ping")).await,
            DispatchOutcome::Handled { command: "ping".into() }
        );
        assert_eq!(host.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_commands_without_map_skip_tokenizing() {
        let (_, dispatcher) = setup(DispatcherOptions::default());
        dispatcher
            .register("raw", "", |ctx: Arc<CommandContext>| async move {
                assert!(ctx.args().is_none());
                ctx.raw_args().to_owned()
            }, None)
            .unwrap();
        let outcome = dispatcher.dispatch(human("?raw \"unbalanced")).await;
        assert_eq!(outcome.command(), Some("raw"));
        assert!(matches!(outcome, DispatchOutcome::Handled { .. }));
    }

    #[tokio::test]
    async fn test_register_rejects_bad_map() {
        let (_, dispatcher) = setup(DispatcherOptions::default());
        let err = dispatcher
            .register("bad", "no units here", || async {}, None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgumentMap);
        assert!(!dispatcher.commands().contains("bad"));
    }

    #[tokio::test]
    async fn test_load_plugin_merges_and_shadows() {
        fn install(ctx: &mut PluginContext<'_>) -> CommandResult<()> {
            ctx.command("ping", "", || async { "plugin pong" }, None)?
                .command("echo", "<text...>", |args: Arguments| async move {
                    args.text("text").unwrap_or_default().to_owned()
                }, None)?;
            Ok(())
        }
        fn broken(ctx: &mut PluginContext<'_>) -> CommandResult<()> {
            ctx.command("half", "", || async {}, None)?;
            Err(CommandError::argument_parsing("broken on purpose"))
        }

        let (host, dispatcher) = setup(DispatcherOptions::default());
        let count = dispatcher
            .load_plugin(&PluginDescriptor::new("extra", "", install), &JsonValue::Null)
            .unwrap();
        assert_eq!(count, 2);

        dispatcher.dispatch(human("?ping")).await;
        dispatcher.dispatch(human("?echo a  b")).await;
        let sent: Vec<String> = host.drain().into_iter().map(|m| m.content).collect();
        assert_eq!(sent, vec!["<@1>, plugin pong", "<@1>, a b"]);

        let err = dispatcher
            .load_plugin(&PluginDescriptor::new("broken", "", broken), &JsonValue::Null)
            .unwrap_err();
        assert_eq!(err.name, "broken");
        assert!(!dispatcher.commands().contains("half"));
    }

    #[tokio::test]
    async fn test_service_interface() {
        let (host, dispatcher) = setup(DispatcherOptions::default());
        let outcome = dispatcher.oneshot(human("?ping")).await.unwrap();
        assert_eq!(outcome.command(), Some("ping"));
        assert_eq!(host.sent().len(), 1);
    }

    #[test]
    fn test_weak_handle() {
        let (_, dispatcher) = setup(DispatcherOptions::default());
        let weak = dispatcher.downgrade();
        assert!(weak.upgrade().is_some());
        drop(dispatcher);
        assert!(weak.upgrade().is_none());
    }
}
