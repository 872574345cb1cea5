//! Cancellation token - the read/subscribe capability handed to consumers.

use std::future::Future;
use std::sync::{Arc, OnceLock};

use futures::FutureExt;

use crate::error::{CallbackError, Cancelled};
use crate::registration::Registration;
use crate::source::{CancellationTokenSource, Inner};

/// A read-only view of one [`CancellationTokenSource`].
///
/// Tokens observe cancellation and subscribe callbacks but cannot trigger
/// anything. They are cheap to clone; every clone (and every token minted
/// from the same source) observes identical state.
///
/// Only a source can construct a token for itself - there is no public
/// constructor binding a token to arbitrary state.
///
/// # Example
///
/// ```rust
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use rescind::CancellationTokenSource;
///
/// let source = CancellationTokenSource::new();
/// let token = source.token();
///
/// assert!(token.check().is_ok());
///
/// source.cancel().await.unwrap();
///
/// assert!(token.is_cancellation_requested());
/// assert_eq!(token.check().unwrap_err().to_string(), "user cancelled");
/// # }
/// ```
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl CancellationToken {
    pub(crate) fn from_inner(inner: Arc<Inner>) -> Self {
        Self { inner }
    }

    /// Check if cancellation has been requested on the owning source.
    #[inline]
    pub fn is_cancellation_requested(&self) -> bool {
        self.inner.cancellation_requested()
    }

    /// Check if the owning source can be cancelled at all.
    #[inline]
    pub fn can_be_cancelled(&self) -> bool {
        self.inner.can_be_cancelled()
    }

    /// Register a callback to run when the owning source is cancelled.
    ///
    /// If the source can never be cancelled the callback is silently ignored
    /// and a no-op handle comes back without touching the source. Otherwise
    /// this behaves exactly like
    /// [`CancellationTokenSource::register()`](crate::CancellationTokenSource::register):
    /// newest-first ordering, immediate awaited invocation when cancellation
    /// was already requested.
    ///
    /// # Errors
    ///
    /// Only immediate invocation can fail, with the callback's own error.
    pub async fn register<F, Fut>(&self, callback: F) -> Result<Registration, CallbackError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), CallbackError>> + Send + 'static,
    {
        if !self.can_be_cancelled() {
            return Ok(Registration::noop());
        }
        Arc::clone(&self.inner)
            .register(Box::new(move || callback().boxed()))
            .await
    }

    /// Return `Err(Cancelled)` if cancellation has been requested.
    ///
    /// Poll this at safe checkpoints in long-running cooperative work:
    ///
    /// ```rust
    /// use rescind::{CancellationToken, Cancelled};
    ///
    /// fn crunch(data: &[u8], token: &CancellationToken) -> Result<u64, Cancelled> {
    ///     let mut sum = 0u64;
    ///     for (i, chunk) in data.chunks(1024).enumerate() {
    ///         if i % 16 == 0 {
    ///             token.check()?;
    ///         }
    ///         sum += chunk.iter().map(|&b| u64::from(b)).sum::<u64>();
    ///     }
    ///     Ok(sum)
    /// }
    /// # let _ = crunch(&[1, 2, 3], &CancellationToken::none());
    /// ```
    #[inline]
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancellation_requested() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// A constant token that is already cancelled.
    ///
    /// Backed by a process-wide pre-cancelled source. Every call returns an
    /// equivalent token: `is_cancellation_requested()` and
    /// `can_be_cancelled()` are both always true.
    pub fn cancelled() -> Self {
        static CANCELLED: OnceLock<CancellationTokenSource> = OnceLock::new();
        CANCELLED
            .get_or_init(CancellationTokenSource::cancelled)
            .token()
    }

    /// A constant token that can never be cancelled.
    ///
    /// Backed by a process-wide never-cancellable source. Useful as a default
    /// for callers that need a token value without owning a source.
    pub fn none() -> Self {
        static NONE: OnceLock<CancellationTokenSource> = OnceLock::new();
        NONE.get_or_init(CancellationTokenSource::never).token()
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field(
                "cancellation_requested",
                &self.is_cancellation_requested(),
            )
            .finish()
    }
}
