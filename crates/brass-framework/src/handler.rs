//! Command handlers.
//!
//! Any async function (or closure returning a future) whose parameters all
//! implement [`FromContext`] and whose output implements [`HandleResponse`]
//! is a [`Handler`]:
//!
//! ```rust,ignore
//! async fn ping() -> &'static str {
//!     "pong"
//! }
//!
//! async fn greet(args: Arguments) -> String {
//!     format!("hello {}", args.text("name").unwrap_or("stranger"))
//! }
//!
//! async fn roll(ctx: Arc<CommandContext>) -> Result<(), BoxError> {
//!     ctx.send("rolling...").await?;
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::context::CommandContext;
use crate::error::{BoxError, CommandError, CommandResult};
use crate::extract::FromContext;

// ============================================================================
// HandleResponse - Handle handler return values
// ============================================================================

/// Turns a handler's return value into an action.
///
/// Text is sent as a reply to the invoking message. Errors surface as
/// [`CommandError::Handler`] and reach the dispatcher's error observer.
#[async_trait]
pub trait HandleResponse: Send {
    async fn into_response(self, ctx: Arc<CommandContext>) -> CommandResult<()>;
}

#[async_trait]
impl HandleResponse for () {
    async fn into_response(self, _ctx: Arc<CommandContext>) -> CommandResult<()> {
        Ok(())
    }
}

#[async_trait]
impl HandleResponse for String {
    async fn into_response(self, ctx: Arc<CommandContext>) -> CommandResult<()> {
        ctx.reply(&self).await.map_err(CommandError::handler)
    }
}

#[async_trait]
impl HandleResponse for &'static str {
    async fn into_response(self, ctx: Arc<CommandContext>) -> CommandResult<()> {
        ctx.reply(self).await.map_err(CommandError::handler)
    }
}

#[async_trait]
impl<T: HandleResponse> HandleResponse for Option<T> {
    async fn into_response(self, ctx: Arc<CommandContext>) -> CommandResult<()> {
        match self {
            Some(t) => t.into_response(ctx).await,
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<T, E> HandleResponse for Result<T, E>
where
    T: HandleResponse,
    E: Into<BoxError> + Send,
{
    async fn into_response(self, ctx: Arc<CommandContext>) -> CommandResult<()> {
        match self {
            Ok(t) => t.into_response(ctx).await,
            Err(e) => Err(CommandError::handler(e)),
        }
    }
}

// ============================================================================
// Handler Trait
// ============================================================================

/// An invocable command body.
///
/// Implemented for async functions taking up to eight [`FromContext`]
/// parameters.
#[async_trait]
pub trait Handler<T>: Clone + Send + Sync + 'static {
    async fn call(self, ctx: Arc<CommandContext>) -> CommandResult<()>;
}

// ============================================================================
// BoxedHandler - Type-erased handler stored in the registry
// ============================================================================

/// A type-erased handler.
pub type BoxedHandler =
    Arc<dyn Fn(Arc<CommandContext>) -> BoxFuture<'static, CommandResult<()>> + Send + Sync>;

/// Erases a handler so it can be stored in a
/// [`CommandRegistry`](crate::registry::CommandRegistry).
pub fn into_handler<F, T>(f: F) -> BoxedHandler
where
    F: Handler<T>,
    T: 'static,
{
    Arc::new(move |ctx| f.clone().call(ctx))
}

// ============================================================================
// Handler implementations for functions
// ============================================================================

macro_rules! impl_handler {
    (
        $($ty:ident),*
    ) => {
        #[allow(non_snake_case)]
        #[async_trait]
        impl<F, Fut, Res, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: FnOnce($($ty,)*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = Res> + Send + 'static,
            Res: HandleResponse + 'static,
            $( $ty: FromContext + Send + 'static, )*
        {
            async fn call(self, ctx: Arc<CommandContext>) -> CommandResult<()> {
                $(
                    let $ty = $ty::from_context(&ctx)?;
                )*

                let res = (self)($($ty,)*).await;
                res.into_response(ctx).await
            }
        }
    };
}

impl_handler!();
impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);
impl_handler!(T1, T2, T3, T4, T5);
impl_handler!(T1, T2, T3, T4, T5, T6);
impl_handler!(T1, T2, T3, T4, T5, T6, T7);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8);
