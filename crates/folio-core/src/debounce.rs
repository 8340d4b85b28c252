#![forbid(unsafe_code)]

//! Trailing-edge debouncing over host-supplied time.
//!
//! [`Debounce`] collapses a burst of calls into a single execution that fires
//! once `wait` has elapsed since the last call. It uses a "latest wins"
//! strategy: only the argument of the final call in a burst is delivered.
//!
//! Time never advances on its own. The caller passes the current monotonic
//! time to [`Debounce::call`] and polls with [`Debounce::poll`]; the host is
//! expected to wake up at [`Debounce::deadline`].
//!
//! ```
//! use folio_core::debounce::Debounce;
//! use std::time::Duration;
//!
//! let ms = Duration::from_millis;
//! let mut scroll = Debounce::new(ms(100));
//! scroll.call(ms(0), 10.0);
//! scroll.call(ms(40), 25.0);
//! assert_eq!(scroll.poll(ms(120)), None); // 80ms since the last call
//! assert_eq!(scroll.poll(ms(140)), Some(25.0));
//! assert_eq!(scroll.poll(ms(500)), None);
//! ```

use std::time::Duration;

/// Latest-wins trailing debouncer.
#[derive(Debug, Clone)]
pub struct Debounce<T> {
    wait: Duration,
    pending: Option<(Duration, T)>,
}

impl<T> Debounce<T> {
    /// Create a debouncer with the given quiet window.
    #[must_use]
    pub const fn new(wait: Duration) -> Self {
        Self {
            wait,
            pending: None,
        }
    }

    /// Quiet window length.
    #[must_use]
    pub const fn wait(&self) -> Duration {
        self.wait
    }

    /// Record a call, cancelling any pending execution.
    pub fn call(&mut self, now: Duration, arg: T) {
        self.pending = Some((now.saturating_add(self.wait), arg));
    }

    /// Deliver the pending argument if its deadline has passed.
    pub fn poll(&mut self, now: Duration) -> Option<T> {
        match &self.pending {
            Some((deadline, _)) if *deadline <= now => self.pending.take().map(|(_, arg)| arg),
            _ => None,
        }
    }

    /// When the pending call will fire, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Duration> {
        self.pending.as_ref().map(|(deadline, _)| *deadline)
    }

    /// Whether a call is waiting for its quiet window.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop any pending call.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
