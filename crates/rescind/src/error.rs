//! Error types for the cancellation primitive.

use thiserror::Error;

/// Error produced by a registered cancellation callback.
///
/// Callbacks report failure with any boxed error. The first callback to fail
/// aborts the remaining notification sequence and the error propagates out of
/// [`cancel()`](crate::CancellationTokenSource::cancel).
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// Cancellation has been requested.
///
/// Returned by [`CancellationToken::check()`](crate::CancellationToken::check)
/// so that cooperative work can bail out with `?`:
///
/// ```rust
/// use rescind::{CancellationToken, Cancelled};
///
/// fn step(token: &CancellationToken) -> Result<(), Cancelled> {
///     token.check()?;
///     // do one unit of work...
///     Ok(())
/// }
///
/// assert!(step(&CancellationToken::none()).is_ok());
/// assert_eq!(step(&CancellationToken::cancelled()), Err(Cancelled));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error("user cancelled")]
pub struct Cancelled;

/// A negative delay was passed to
/// [`cancel_after()`](crate::CancellationTokenSource::cancel_after).
///
/// Rejected synchronously, before any timer is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error("cancellation delay must be non-negative, got {millis}ms")]
pub struct InvalidTimeout {
    /// The rejected delay in milliseconds.
    pub millis: i64,
}
