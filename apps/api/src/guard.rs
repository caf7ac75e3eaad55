//! Guards against re-entrant and rapid repeated actions.
//!
//! `InFlightGuard` refuses a second operation on a key while one is
//! outstanding. `CooldownGuard` refuses a repeat of the same action on the
//! same target within a cooldown window. Both use in-process state and never
//! hold a lock across an `.await`.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Tracks keys with an operation in flight.
#[derive(Debug, Clone, Default)]
pub struct InFlightGuard {
    active: Arc<Mutex<HashSet<String>>>,
}

/// Held while an operation is in flight; releases its key on drop.
#[derive(Debug)]
pub struct InFlightTicket {
    key: String,
    active: Arc<Mutex<HashSet<String>>>,
}

impl InFlightGuard {
    /// Claims `key`, or returns `None` if it is already claimed.
    pub fn try_begin(&self, key: impl Into<String>) -> Option<InFlightTicket> {
        let key = key.into();
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if !active.insert(key.clone()) {
            return None;
        }
        Some(InFlightTicket {
            key,
            active: Arc::clone(&self.active),
        })
    }

    #[cfg(test)]
    pub fn is_active(&self, key: &str) -> bool {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(key)
    }
}

impl Drop for InFlightTicket {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.key);
    }
}

/// Per-key cooldown measured on the monotonic clock.
#[derive(Debug, Clone)]
pub struct CooldownGuard {
    cooldown: Duration,
    last: Arc<Mutex<HashMap<String, Instant>>>,
}

impl CooldownGuard {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Records an attempt at `now`. Returns the remaining wait if the previous
    /// accepted attempt on the same key is still within the cooldown.
    pub fn check_at(&self, key: &str, now: Instant) -> Result<(), Duration> {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(prev) = last.get(key) {
            let elapsed = now.saturating_duration_since(*prev);
            if elapsed < self.cooldown {
                return Err(self.cooldown - elapsed);
            }
        }
        last.insert(key.to_string(), now);
        // Forget keys that can no longer block anything.
        let cooldown = self.cooldown;
        last.retain(|_, t| now.saturating_duration_since(*t) < cooldown);
        Ok(())
    }

    pub fn check(&self, key: &str) -> Result<(), Duration> {
        self.check_at(key, Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_flight_rejects_same_key() {
        let guard = InFlightGuard::default();
        let ticket = guard.try_begin("p1/1.0.0").unwrap();
        assert!(guard.try_begin("p1/1.0.0").is_none());
        assert!(guard.is_active("p1/1.0.0"));
        drop(ticket);
        assert!(!guard.is_active("p1/1.0.0"));
        assert!(guard.try_begin("p1/1.0.0").is_some());
    }

    #[test]
    fn test_in_flight_allows_other_keys() {
        let guard = InFlightGuard::default();
        let _a = guard.try_begin("p1/1.0.0").unwrap();
        assert!(guard.try_begin("p1/1.0.1").is_some());
    }

    #[test]
    fn test_cooldown_blocks_rapid_repeat() {
        let guard = CooldownGuard::new(Duration::from_millis(1000));
        let t0 = Instant::now();
        assert!(guard.check_at("delete:v1", t0).is_ok());
        let wait = guard
            .check_at("delete:v1", t0 + Duration::from_millis(300))
            .unwrap_err();
        assert_eq!(wait, Duration::from_millis(700));
        assert!(guard
            .check_at("delete:v1", t0 + Duration::from_millis(1000))
            .is_ok());
    }

    #[test]
    fn test_cooldown_is_per_key() {
        let guard = CooldownGuard::new(Duration::from_secs(1));
        let t0 = Instant::now();
        assert!(guard.check_at("delete:v1", t0).is_ok());
        assert!(guard.check_at("delete:v2", t0).is_ok());
    }

    #[test]
    fn test_rejected_attempt_does_not_extend_cooldown() {
        let guard = CooldownGuard::new(Duration::from_millis(1000));
        let t0 = Instant::now();
        guard.check_at("k", t0).unwrap();
        assert!(guard.check_at("k", t0 + Duration::from_millis(900)).is_err());
        assert!(guard.check_at("k", t0 + Duration::from_millis(1001)).is_ok());
    }
}
