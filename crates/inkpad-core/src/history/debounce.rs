//! Cancellable single-slot scheduled task.
//!
//! The debouncer owns no timer; it records a deadline against the injected
//! clock and the event loop asks for due work. At most one task is pending.

/// A pending task bound to its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Armed<T> {
    payload: T,
    deadline: i64,
}

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    quiet_period_ms: i64,
    pending: Option<Armed<T>>,
}

impl<T> Debouncer<T> {
    pub const fn new(quiet_period_ms: i64) -> Self {
        Self {
            quiet_period_ms,
            pending: None,
        }
    }

    /// Schedule `payload`, replacing whatever was pending.
    pub fn arm(&mut self, payload: T, now: i64) -> Option<T> {
        let previous = self.pending.replace(Armed {
            payload,
            deadline: now.saturating_add(self.quiet_period_ms),
        });
        previous.map(|armed| armed.payload)
    }

    /// Push the deadline of the pending task out by a full quiet period,
    /// keeping its payload. Returns `false` when nothing is pending.
    pub fn reset(&mut self, now: i64) -> bool {
        match &mut self.pending {
            Some(armed) => {
                armed.deadline = now.saturating_add(self.quiet_period_ms);
                true
            }
            None => false,
        }
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|armed| armed.payload)
    }

    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref().map(|armed| &armed.payload)
    }

    pub fn deadline(&self) -> Option<i64> {
        self.pending.as_ref().map(|armed| armed.deadline)
    }

    /// Take the pending payload if its quiet period has elapsed.
    pub fn take_due(&mut self, now: i64) -> Option<T> {
        if self.deadline().is_some_and(|deadline| now >= deadline) {
            self.cancel()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_only_after_quiet_period() {
        let mut debouncer = Debouncer::new(3_000);
        debouncer.arm("a", 1_000);

        assert_eq!(debouncer.take_due(3_999), None);
        assert_eq!(debouncer.take_due(4_000), Some("a"));
        assert_eq!(debouncer.pending(), None);
        assert_eq!(debouncer.take_due(10_000), None);
    }

    #[test]
    fn reset_extends_deadline_and_keeps_payload() {
        let mut debouncer = Debouncer::new(3_000);
        debouncer.arm("first", 0);
        assert!(debouncer.reset(2_000));

        assert_eq!(debouncer.take_due(3_000), None);
        assert_eq!(debouncer.deadline(), Some(5_000));
        assert_eq!(debouncer.take_due(5_000), Some("first"));
    }

    #[test]
    fn arm_replaces_pending_payload() {
        let mut debouncer = Debouncer::new(100);
        assert_eq!(debouncer.arm(1, 0), None);
        assert_eq!(debouncer.arm(2, 50), Some(1));
        assert_eq!(debouncer.pending(), Some(&2));
        assert_eq!(debouncer.deadline(), Some(150));
    }

    #[test]
    fn cancel_clears_pending() {
        let mut debouncer = Debouncer::new(100);
        debouncer.arm("x", 0);
        assert_eq!(debouncer.cancel(), Some("x"));
        assert_eq!(debouncer.cancel(), None);
        assert!(!debouncer.reset(10));
    }
}
