//! # rescind
//!
//! Cooperative cancellation with a source/token split and sequentially
//! awaited callback notification.
//!
//! A [`CancellationTokenSource`] owns the cancellation state, the ordered
//! callback registry, and the trigger ([`cancel()`] or the deferred
//! [`cancel_after()`]). A [`CancellationToken`] is the read-only capability a
//! producer hands to consumers: it can observe cancellation, subscribe
//! callbacks, and assert non-cancellation, but never trigger.
//!
//! ## Basic Usage
//!
//! ```rust
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! use rescind::CancellationTokenSource;
//!
//! // Producer owns the source
//! let source = CancellationTokenSource::new();
//!
//! // Consumers get tokens
//! let token = source.token();
//!
//! // Consumers subscribe; the handle removes the subscription again
//! let registration = token
//!     .register(|| async {
//!         // release resources, abort I/O, ...
//!         Ok(())
//!     })
//!     .await
//!     .unwrap();
//!
//! // Or poll at checkpoints
//! assert!(token.check().is_ok());
//!
//! // Producer cancels; resolves once every callback has completed
//! source.cancel().await.unwrap();
//!
//! assert!(token.is_cancellation_requested());
//! registration.unregister(); // safe no-op after firing
//! # }
//! ```
//!
//! ## Notification Protocol
//!
//! Callbacks are stored newest-first and notified in that order (the callback
//! registered last runs first). Each callback's future is awaited to
//! completion before the next one starts - notification is strictly
//! sequential, never concurrent. A callback error aborts the remaining
//! sequence and propagates out of [`cancel()`].
//!
//! ## Composition
//!
//! [`CancellationTokenSource::linked()`] derives a source that cancels when
//! any of a set of input tokens cancels. [`CancellationToken::cancelled()`]
//! and [`CancellationToken::none()`] are process-wide constant tokens for
//! callers that need a token value without owning a source.
//!
//! ## Concurrency
//!
//! All types are `Send + Sync` and cheap to clone. Cancellation is
//! advisory - nothing is preempted; consumers must check or subscribe.
//!
//! [`cancel()`]: CancellationTokenSource::cancel
//! [`cancel_after()`]: CancellationTokenSource::cancel_after

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod linked;
mod registration;
mod source;
mod token;

pub use error::{CallbackError, Cancelled, InvalidTimeout};
pub use registration::Registration;
pub use source::CancellationTokenSource;
pub use token::CancellationToken;
