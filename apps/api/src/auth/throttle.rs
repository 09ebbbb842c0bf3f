//! Login throttling — counts failed sign-in attempts per client and locks the
//! client out once the limit is reached.
//!
//! The window slides with the most recent failure: a client is locked until
//! `last_attempt + window`, after which its counter starts over. Only failed
//! credential checks count; a successful login clears the client's record.
//!
//! Storage and time are both injected (`AttemptStore`, `Clock`) so the policy
//! can be tested without sleeping and moved to a shared store later.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::errors::AppError;

const UNKNOWN_CLIENT: &str = "unknown";

// ────────────────────────────────────────────────────────────────────────────
// Seams
// ────────────────────────────────────────────────────────────────────────────

/// Failed attempts recorded for one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    pub count: u32,
    pub last_attempt: DateTime<Utc>,
}

pub trait AttemptStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Attempt>;
    fn put(&self, key: &str, attempt: Attempt);
    fn remove(&self, key: &str);
    /// Drops every record whose last attempt is older than `cutoff`.
    fn evict_before(&self, cutoff: DateTime<Utc>);
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Process-local store. Counters are lost on restart and not shared between replicas.
#[derive(Debug, Default)]
pub struct InMemoryAttemptStore {
    attempts: Mutex<HashMap<String, Attempt>>,
}

impl InMemoryAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AttemptStore for InMemoryAttemptStore {
    fn get(&self, key: &str) -> Option<Attempt> {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied()
    }

    fn put(&self, key: &str, attempt: Attempt) {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), attempt);
    }

    fn remove(&self, key: &str) {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    fn evict_before(&self, cutoff: DateTime<Utc>) {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|_, attempt| attempt.last_attempt >= cutoff);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Policy
// ────────────────────────────────────────────────────────────────────────────

pub struct LoginThrottle {
    store: Arc<dyn AttemptStore>,
    clock: Arc<dyn Clock>,
    max_attempts: u32,
    window: Duration,
}

impl LoginThrottle {
    pub fn new(
        store: Arc<dyn AttemptStore>,
        clock: Arc<dyn Clock>,
        max_attempts: u32,
        window: std::time::Duration,
    ) -> Self {
        Self {
            store,
            clock,
            max_attempts,
            window: Duration::from_std(window).unwrap_or_else(|_| Duration::minutes(15)),
        }
    }

    /// Rejects the client with `TooManyRequests` while it is locked out.
    pub fn check(&self, key: &str) -> Result<(), AppError> {
        let Some(attempt) = self.store.get(key) else {
            return Ok(());
        };
        if self.expired(&attempt) {
            return Ok(());
        }
        if attempt.count >= self.max_attempts {
            let reset_at = attempt.last_attempt + self.window;
            warn!("Login locked for client {key} until {reset_at}");
            return Err(AppError::TooManyRequests { reset_at });
        }
        Ok(())
    }

    /// Attempts left before the client is locked out.
    pub fn remaining(&self, key: &str) -> u32 {
        match self.store.get(key) {
            Some(attempt) if !self.expired(&attempt) => {
                self.max_attempts.saturating_sub(attempt.count)
            }
            _ => self.max_attempts,
        }
    }

    /// Counts a failed attempt. Records of clients idle for longer than the
    /// window are evicted first, so rotating keys cannot grow the store.
    pub fn record_failure(&self, key: &str) {
        let now = self.clock.now();
        self.store.evict_before(now - self.window);
        let count = match self.store.get(key) {
            Some(attempt) if !self.expired(&attempt) => attempt.count + 1,
            _ => 1,
        };
        self.store.put(
            key,
            Attempt {
                count,
                last_attempt: now,
            },
        );
        info!("Failed login {count}/{} for client {key}", self.max_attempts);
    }

    pub fn clear(&self, key: &str) {
        self.store.remove(key);
    }

    fn expired(&self, attempt: &Attempt) -> bool {
        self.clock.now() - attempt.last_attempt > self.window
    }
}

/// The throttle key for a request: the first `x-forwarded-for` hop, then
/// `x-real-ip`, else a shared "unknown" bucket.
pub fn client_key(headers: &HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(first) = header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return first.to_string();
    }
    header("x-real-ip")
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    struct FakeClock(Mutex<DateTime<Utc>>);

    impl FakeClock {
        fn at(now: DateTime<Utc>) -> Arc<Self> {
            Arc::new(Self(Mutex::new(now)))
        }

        fn advance(&self, by: Duration) {
            let mut now = self.0.lock().unwrap();
            *now = *now + by;
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn throttle(clock: Arc<FakeClock>) -> LoginThrottle {
        LoginThrottle::new(
            Arc::new(InMemoryAttemptStore::new()),
            clock,
            5,
            std::time::Duration::from_secs(15 * 60),
        )
    }

    fn start() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-03-05T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_locks_after_max_failures() {
        let clock = FakeClock::at(start());
        let throttle = throttle(clock.clone());

        for _ in 0..4 {
            throttle.record_failure("1.2.3.4");
            clock.advance(Duration::seconds(10));
        }
        assert!(throttle.check("1.2.3.4").is_ok());
        assert_eq!(throttle.remaining("1.2.3.4"), 1);

        throttle.record_failure("1.2.3.4");
        match throttle.check("1.2.3.4") {
            Err(AppError::TooManyRequests { reset_at }) => {
                assert_eq!(reset_at, start() + Duration::seconds(40) + Duration::minutes(15));
            }
            other => panic!("expected lockout, got {other:?}"),
        }
        assert!(throttle.check("5.6.7.8").is_ok());
    }

    #[test]
    fn test_lockout_expires_after_window() {
        let clock = FakeClock::at(start());
        let throttle = throttle(clock.clone());
        for _ in 0..5 {
            throttle.record_failure("k");
        }
        assert!(throttle.check("k").is_err());

        clock.advance(Duration::minutes(15));
        assert!(throttle.check("k").is_err(), "boundary is still locked");

        clock.advance(Duration::seconds(1));
        assert!(throttle.check("k").is_ok());

        throttle.record_failure("k");
        assert_eq!(throttle.remaining("k"), 4, "counter restarts after the window");
    }

    #[test]
    fn test_success_clears_counter() {
        let clock = FakeClock::at(start());
        let throttle = throttle(clock);
        for _ in 0..3 {
            throttle.record_failure("k");
        }
        throttle.clear("k");
        assert_eq!(throttle.remaining("k"), 5);
    }

    #[test]
    fn test_expired_clients_are_evicted() {
        let clock = FakeClock::at(start());
        let store = Arc::new(InMemoryAttemptStore::new());
        let throttle = LoginThrottle::new(
            store.clone(),
            clock.clone(),
            5,
            std::time::Duration::from_secs(15 * 60),
        );

        for i in 0..1_000 {
            throttle.record_failure(&format!("198.51.100.{i}"));
        }
        assert_eq!(store.len(), 1_000);

        clock.advance(Duration::minutes(10));
        throttle.record_failure("203.0.113.7");
        assert_eq!(store.len(), 1_001, "records inside the window are kept");

        clock.advance(Duration::minutes(6));
        throttle.record_failure("203.0.113.8");
        assert_eq!(store.len(), 2);
        assert!(store.get("198.51.100.0").is_none());
        assert_eq!(store.get("203.0.113.7").map(|a| a.count), Some(1));
    }

    #[test]
    fn test_client_key_precedence() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_key(&headers), "unknown");

        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        assert_eq!(client_key(&headers), "10.0.0.9");

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static(" 203.0.113.7 , 10.0.0.1"),
        );
        assert_eq!(client_key(&headers), "203.0.113.7");
    }
}
