//! Cancellation source - owns the state machine and the callback registry.

use std::collections::VecDeque;
use std::future::Future;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::task::AbortHandle;

use crate::error::{CallbackError, InvalidTimeout};
use crate::registration::Registration;
use crate::token::CancellationToken;

/// Lifecycle of a source. The derived ordering is load-bearing:
/// "cancellation requested" is exactly `state >= Notifying`, and the state
/// only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum State {
    /// Terminal from construction; `cancel()` can never fire.
    CannotBeCancelled,
    /// Default starting state.
    NotCancelled,
    /// `cancel()` has been requested; callbacks are being notified.
    Notifying,
    /// All callbacks have completed.
    NotifyingComplete,
}

/// A registered callback, boxed for storage. Invoked at most once.
pub(crate) type BoxCallback =
    Box<dyn FnOnce() -> BoxFuture<'static, Result<(), CallbackError>> + Send>;

struct Shared {
    state: State,
    /// Newest registration first; notification walks front-to-back.
    registrations: VecDeque<(u64, BoxCallback)>,
    /// The single live deferred-cancellation timer, if any.
    timer: Option<AbortHandle>,
    next_id: u64,
}

/// State shared between a source and every token it has minted.
pub(crate) struct Inner {
    shared: Mutex<Shared>,
}

impl Inner {
    fn new(state: State) -> Self {
        Self {
            shared: Mutex::new(Shared {
                state,
                registrations: VecDeque::new(),
                timer: None,
                next_id: 0,
            }),
        }
    }

    /// The lock is only ever held for field access, never across an await,
    /// so a poisoned guard cannot hide a half-finished transition.
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn cancellation_requested(&self) -> bool {
        self.lock().state >= State::Notifying
    }

    pub(crate) fn cancellation_completed(&self) -> bool {
        self.lock().state == State::NotifyingComplete
    }

    pub(crate) fn can_be_cancelled(&self) -> bool {
        self.lock().state != State::CannotBeCancelled
    }

    /// Remove a registration by identity. No-op if it already fired or was
    /// already removed.
    pub(crate) fn remove(&self, id: u64) {
        self.lock().registrations.retain(|(entry, _)| *entry != id);
    }

    /// Shared registration path for sources and tokens.
    ///
    /// If cancellation has already been requested the callback runs (and is
    /// awaited) right here, and the returned handle is a no-op.
    pub(crate) async fn register(
        self: Arc<Self>,
        callback: BoxCallback,
    ) -> Result<Registration, CallbackError> {
        {
            let mut shared = self.lock();
            if shared.state < State::Notifying {
                let id = shared.next_id;
                shared.next_id += 1;
                shared.registrations.push_front((id, callback));
                return Ok(Registration::live(&self, id));
            }
        }
        callback().await?;
        Ok(Registration::noop())
    }
}

/// Owns cancellation state and the ordered registry of callbacks.
///
/// Create a source, hand [`token()`](Self::token)s to consumers, and call
/// [`cancel()`](Self::cancel) when the work should stop. Callbacks registered
/// on the source (or on any of its tokens) are notified newest-first, each
/// awaited to completion before the next begins.
///
/// Cloning a source shares the same state; any clone can cancel.
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
/// assert!(!token.is_cancellation_requested());
///
/// source.cancel().await.unwrap();
///
/// assert!(token.is_cancellation_requested());
/// assert!(source.is_cancellation_completed());
/// # }
/// ```
#[derive(Clone)]
pub struct CancellationTokenSource {
    inner: Arc<Inner>,
}

impl CancellationTokenSource {
    /// Create a new source: cancellable, not yet cancelled.
    #[inline]
    pub fn new() -> Self {
        Self::with_state(State::NotCancelled)
    }

    /// Create a source that is already cancelled.
    ///
    /// Its tokens report cancellation immediately and callbacks registered
    /// on them run at registration time.
    #[inline]
    pub fn cancelled() -> Self {
        Self::with_state(State::NotifyingComplete)
    }

    /// Create a source that can never be cancelled.
    ///
    /// `cancel()` and `cancel_after()` on it are permanent no-ops, and its
    /// tokens silently ignore registrations.
    #[inline]
    pub fn never() -> Self {
        Self::with_state(State::CannotBeCancelled)
    }

    fn with_state(state: State) -> Self {
        Self {
            inner: Arc::new(Inner::new(state)),
        }
    }

    /// Get a token to hand to consumers.
    ///
    /// Tokens are a read/subscribe capability only - they cannot trigger
    /// cancellation. Every call returns a new instance, all observing the
    /// same state.
    #[inline]
    pub fn token(&self) -> CancellationToken {
        CancellationToken::from_inner(Arc::clone(&self.inner))
    }

    /// Check if cancellation has been requested.
    ///
    /// True from the moment `cancel()` starts notifying, which may be before
    /// [`is_cancellation_completed()`](Self::is_cancellation_completed).
    #[inline]
    pub fn is_cancellation_requested(&self) -> bool {
        self.inner.cancellation_requested()
    }

    /// Check if cancellation has been requested *and* every callback has run.
    #[inline]
    pub fn is_cancellation_completed(&self) -> bool {
        self.inner.cancellation_completed()
    }

    /// Check if this source can be cancelled at all.
    ///
    /// Only false for sources built with [`never()`](Self::never).
    #[inline]
    pub fn can_be_cancelled(&self) -> bool {
        self.inner.can_be_cancelled()
    }

    /// Request cancellation and notify every registered callback.
    ///
    /// Callbacks run newest-registration-first, strictly one at a time: each
    /// callback's future is awaited to completion before the next starts. The
    /// returned future resolves once the whole sequence has finished.
    ///
    /// Idempotent: if cancellation was already requested (or the source can
    /// never be cancelled) this returns `Ok(())` without doing anything, so
    /// re-entrant calls from inside a callback are safe.
    ///
    /// # Errors
    ///
    /// The first callback to return an error aborts the remaining sequence
    /// and that error propagates out. Completion is then never reported; this
    /// is a contract, not an oversight - callers that need all callbacks to
    /// run must register infallible ones.
    pub async fn cancel(&self) -> Result<(), CallbackError> {
        let callbacks = {
            let mut shared = self.inner.lock();
            if shared.state != State::NotCancelled {
                return Ok(());
            }
            shared.state = State::Notifying;
            if let Some(timer) = shared.timer.take() {
                timer.abort();
            }
            // Snapshot: callbacks that unregister themselves or each other
            // mid-notification cannot skip or shift the traversal.
            mem::take(&mut shared.registrations)
        };
        tracing::debug!(callbacks = callbacks.len(), "cancellation requested");
        for (_, callback) in callbacks {
            callback().await?;
        }
        self.inner.lock().state = State::NotifyingComplete;
        tracing::debug!("cancellation completed");
        Ok(())
    }

    /// Schedule an automatic `cancel()` after `millis` milliseconds.
    ///
    /// Calling this again before the delay elapses replaces the pending
    /// timer - the delay resets, timers never accumulate. Calling it after
    /// cancellation was requested is a no-op.
    ///
    /// Requires a running tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTimeout`] if `millis` is negative; nothing is
    /// scheduled and no state changes.
    pub fn cancel_after(&self, millis: i64) -> Result<(), InvalidTimeout> {
        if millis < 0 {
            return Err(InvalidTimeout { millis });
        }
        let mut shared = self.inner.lock();
        if shared.state != State::NotCancelled {
            return Ok(());
        }
        if let Some(previous) = shared.timer.take() {
            previous.abort();
        }
        let source = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(millis as u64)).await;
            // No caller to propagate to on the timer path.
            if let Err(error) = source.cancel().await {
                tracing::warn!(%error, "deferred cancellation callback failed");
            }
        });
        shared.timer = Some(handle.abort_handle());
        tracing::debug!(millis, "cancellation scheduled");
        Ok(())
    }

    /// Register a callback to run when this source is cancelled.
    ///
    /// Registration inserts at the front of the registry, so the callback
    /// registered last is notified first. If cancellation has already been
    /// requested the callback runs immediately (awaited here) and the
    /// returned handle's `unregister()` is a no-op.
    ///
    /// # Errors
    ///
    /// Only the immediate-invocation path can fail: the callback's own error
    /// is returned.
    ///
    /// # Example
    ///
    /// ```rust
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// use rescind::CancellationTokenSource;
    ///
    /// let source = CancellationTokenSource::new();
    /// let registration = source
    ///     .register(|| async {
    ///         println!("cancelled!");
    ///         Ok(())
    ///     })
    ///     .await
    ///     .unwrap();
    ///
    /// // Changed our mind - remove it again.
    /// registration.unregister();
    ///
    /// source.cancel().await.unwrap(); // prints nothing
    /// # }
    /// ```
    pub async fn register<F, Fut>(&self, callback: F) -> Result<Registration, CallbackError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), CallbackError>> + Send + 'static,
    {
        Arc::clone(&self.inner)
            .register(Box::new(move || callback().boxed()))
            .await
    }
}

impl Default for CancellationTokenSource {
    fn default() -> Self {
        Self::new()
    }
}

// Debug impl that doesn't expose the registry
impl std::fmt::Debug for CancellationTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationTokenSource")
            .field("state", &self.inner.lock().state)
            .finish()
    }
}
