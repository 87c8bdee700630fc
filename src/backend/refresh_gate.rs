//! In-flight guard for provider refreshes
//!
//! A provider holds one `RefreshGate`. `try_begin` hands out a guard only when no
//! refresh is running; dropping the guard reopens the gate. Requests that find the
//! gate closed are coalesced: they are not queued, the next request after completion
//! rescans current state instead.
//!
//! # Usage
//!
//! ```ignore
//! let Some(_guard) = self.gate.try_begin() else {
//!     return RefreshOutcome::Coalesced;
//! };
//! // ... rescan ...
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct RefreshGate {
    in_flight: AtomicBool,
    /// Requests turned away while a refresh was running
    coalesced: AtomicU64,
}

impl RefreshGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_begin(&self) -> Option<RefreshGuard<'_>> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            Some(RefreshGuard { gate: self })
        } else {
            self.coalesced.fetch_add(1, Ordering::Relaxed);
            None
        }
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn coalesced_count(&self) -> u64 {
        self.coalesced.load(Ordering::Relaxed)
    }
}

/// Reopens the gate on drop, including when the refresh future is cancelled
#[derive(Debug)]
pub struct RefreshGuard<'a> {
    gate: &'a RefreshGate,
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.gate.in_flight.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_begin_is_coalesced() {
        let gate = RefreshGate::new();
        let guard = gate.try_begin();
        assert!(guard.is_some());
        assert!(gate.is_running());
        assert!(gate.try_begin().is_none());
        assert_eq!(gate.coalesced_count(), 1);

        drop(guard);
        assert!(!gate.is_running());
        assert!(gate.try_begin().is_some());
    }
}
