//! Handler trait, chain signals and type erasure.
//!
//! # How async handlers are stored
//!
//! A [`Chain`](crate::Chain) holds handlers of *different* types in one
//! `Vec`. Rust collections can only hold one concrete type, so each handler
//! is hidden behind a trait object (`dyn ErasedHandler<C>`) and stored
//! uniformly.
//!
//! The chain from user code to vtable call is:
//!
//! ```text
//! async fn get_doc(ctx: HttpContext) -> Signal<HttpContext> { … }  ← user writes this
//!        ↓ Chain::new().then(get_doc)
//! get_doc.into_boxed_handler()                                     ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(get_doc))                                     ← heap-allocated wrapper
//!        ↓  stored as BoxedHandler<C> = Arc<dyn ErasedHandler<C>>
//! handler.call(ctx)  at request time                               ← one vtable dispatch
//!        ↓
//! Box::pin(get_doc(ctx))                                           ← BoxFuture<C>
//! ```
//!
//! # Passing the context on
//!
//! A handler receives the context by value and gives it back inside a
//! [`Signal`]. Returning `Signal::Continue(ctx)` hands exclusive ownership to
//! the next handler. `Signal::Halt(ctx)` ends the chain with `ctx` as the
//! result. `Signal::Fail(err)` ends it with an error and no context.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::Error;

/// What a handler tells the chain runner to do next.
#[derive(Debug)]
pub enum Signal<C> {
    /// Run the next handler with this context.
    Continue(C),
    /// Stop here; `C` is the final context.
    Halt(C),
    /// Stop here with an error for the host to translate.
    Fail(Error),
}

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future resolving to a [`Signal`].
///
/// `Send + 'static` lets tokio move the future across worker threads.
pub(crate) type BoxFuture<C> = Pin<Box<dyn Future<Output = Signal<C>> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler<C> {
    fn call(&self, ctx: C) -> BoxFuture<C>;
}

/// A type-erased handler shared by every invocation of its chain.
#[doc(hidden)]
pub type BoxedHandler<C> = Arc<dyn ErasedHandler<C> + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid chain handler over context type `C`.
///
/// You never implement this yourself. It is satisfied by any `async fn`
/// (or closure returning a future) with the shape:
///
/// ```text
/// async fn name(ctx: C) -> Signal<C>
/// ```
///
/// Handlers that need shared state capture an `Arc` in a closure:
///
/// ```rust
/// use std::sync::Arc;
/// use quill::{Chain, HttpContext, Signal};
///
/// let greeting = Arc::new(String::from("hello"));
/// let chain = Chain::new().then(move |mut ctx: HttpContext| {
///     let greeting = Arc::clone(&greeting);
///     async move {
///         ctx.response.set_text(quill::Status::Ok, greeting.as_str());
///         Signal::Continue(ctx)
///     }
/// });
/// assert_eq!(chain.len(), 1);
/// ```
///
/// The trait is **sealed**: only the blanket impl below can satisfy it.
pub trait Handler<C>: private::Sealed<C> + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler<C>;
}

mod private {
    pub trait Sealed<C> {}
}

// ── Blanket implementations ───────────────────────────────────────────────────

impl<F, Fut, C> private::Sealed<C> for F
where
    F: Fn(C) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Signal<C>> + Send + 'static,
    C: Send + 'static,
{
}

impl<F, Fut, C> Handler<C> for F
where
    F: Fn(C) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Signal<C>> + Send + 'static,
    C: Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler<C> {
        Arc::new(FnHandler(self))
    }
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

/// Newtype bridging a concrete handler `F` to [`ErasedHandler`].
struct FnHandler<F>(F);

impl<F, Fut, C> ErasedHandler<C> for FnHandler<F>
where
    F: Fn(C) -> Fut + Send + Sync,
    Fut: Future<Output = Signal<C>> + Send + 'static,
{
    fn call(&self, ctx: C) -> BoxFuture<C> {
        Box::pin((self.0)(ctx))
    }
}
