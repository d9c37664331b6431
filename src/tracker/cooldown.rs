use std::sync::atomic::{AtomicU64, Ordering};

const NEVER: u64 = u64::MAX;

/// Rate limit for audible alerts.
///
/// Holds the wall-clock time of the last alert that was allowed through. A
/// new alert fires only if strictly more than the cooldown has passed since
/// then. The check and the update are a single compare-and-swap, so two
/// callers can never both fire inside one window.
#[derive(Debug)]
pub struct CooldownGate {
    last_fired: AtomicU64,
    cooldown_ms: u64,
}

impl CooldownGate {
    pub fn new(cooldown_ms: u64) -> Self {
        Self {
            last_fired: AtomicU64::new(NEVER),
            cooldown_ms,
        }
    }

    pub fn cooldown_ms(&self) -> u64 {
        self.cooldown_ms
    }

    /// Wall-clock time of the last allowed alert.
    pub fn last_fired(&self) -> Option<u64> {
        match self.last_fired.load(Ordering::Acquire) {
            NEVER => None,
            ms => Some(ms),
        }
    }

    /// Try to fire at `now_ms`. Returns true and records `now_ms` if the
    /// cooldown has elapsed.
    ///
    /// A `now_ms` earlier than the last firing (the wall clock was set back)
    /// counts as inside the cooldown, so the recorded time never decreases.
    pub fn try_fire(&self, now_ms: u64) -> bool {
        let mut current = self.last_fired.load(Ordering::Acquire);
        loop {
            if current != NEVER && now_ms.saturating_sub(current) <= self.cooldown_ms {
                return false;
            }
            match self.last_fired.compare_exchange_weak(
                current,
                now_ms,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }
}
