//! Unregister handles returned by callback registration.

use std::sync::{Arc, Weak};

use crate::source::Inner;

/// Handle for removing a registered cancellation callback.
///
/// Returned by every `register()` call. Calling
/// [`unregister()`](Self::unregister) removes that exact callback from its
/// source if it is still present; calling it again, or after the callback has
/// already fired, is a safe no-op.
///
/// Dropping a `Registration` does *not* unregister the callback.
pub struct Registration {
    slot: Option<(Weak<Inner>, u64)>,
}

impl Registration {
    pub(crate) fn live(inner: &Arc<Inner>, id: u64) -> Self {
        Self {
            slot: Some((Arc::downgrade(inner), id)),
        }
    }

    /// A handle bound to nothing. Returned when the callback already ran at
    /// registration time, or when registering through a token that can never
    /// be cancelled.
    pub(crate) fn noop() -> Self {
        Self { slot: None }
    }

    /// Remove the callback from its source, if it is still registered.
    ///
    /// Idempotent, and safe to call after the source has been cancelled or
    /// dropped.
    pub fn unregister(&self) {
        let Some((inner, id)) = &self.slot else {
            return;
        };
        if let Some(inner) = inner.upgrade() {
            inner.remove(*id);
        }
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("live", &self.slot.is_some())
            .finish()
    }
}
