//! Linked-source composition: cancel when any of several tokens cancels.

use crate::error::CallbackError;
use crate::source::CancellationTokenSource;
use crate::token::CancellationToken;

impl CancellationTokenSource {
    /// Build a source that cancels when any of the input tokens cancels.
    ///
    /// Every cancellable input token gets a callback that cancels the new
    /// source; the new source itself carries one final callback that
    /// unregisters all of those upstream subscriptions once its own
    /// cancellation runs, so upstream sources don't keep dead registrations
    /// (or a strong reference to the linked source) alive afterwards.
    ///
    /// An input that is already cancelled cancels the new source during
    /// construction. If no input can be cancelled the result is an ordinary
    /// independent source; it never triggers from the inputs but can still be
    /// cancelled directly.
    ///
    /// # Errors
    ///
    /// Construction only fails if an already-cancelled input forces immediate
    /// notification and one of the new source's callbacks fails - impossible
    /// here since the new source starts empty, but the registration plumbing
    /// is fallible.
    ///
    /// # Example
    ///
    /// ```rust
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// use rescind::CancellationTokenSource;
    ///
    /// let a = CancellationTokenSource::new();
    /// let b = CancellationTokenSource::new();
    /// let linked = CancellationTokenSource::linked(&[a.token(), b.token()])
    ///     .await
    ///     .unwrap();
    ///
    /// b.cancel().await.unwrap();
    ///
    /// assert!(linked.is_cancellation_requested());
    /// assert!(!a.is_cancellation_requested());
    /// # }
    /// ```
    pub async fn linked(tokens: &[CancellationToken]) -> Result<Self, CallbackError> {
        let source = Self::new();

        let mut upstream = Vec::with_capacity(tokens.len());
        for token in tokens {
            if !token.can_be_cancelled() {
                continue;
            }
            let linked = source.clone();
            let registration = token
                .register(move || async move { linked.cancel().await })
                .await?;
            upstream.push(registration);
        }

        source
            .register(move || async move {
                for registration in &upstream {
                    registration.unregister();
                }
                Ok(())
            })
            .await?;

        Ok(source)
    }
}
