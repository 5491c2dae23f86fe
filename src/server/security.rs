// src/server/security.rs
//! Login throttling for the admin endpoints
//!
//! Failed logins are counted per identifier. Reaching the threshold inside
//! the failure window locks the identifier out for the lockout duration.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::warn;

/// Per-identifier failure tracking with temporary lockouts
pub struct LoginThrottle {
    /// Active lockouts: identifier -> lockout start
    lockouts: RwLock<HashMap<String, Instant>>,
    /// Recent failures: identifier -> (count, first failure)
    failures: RwLock<HashMap<String, (u32, Instant)>>,
    lockout: Duration,
    threshold: u32,
    /// Failures older than this no longer count
    failure_window: Duration,
}

impl LoginThrottle {
    pub fn new(threshold: u32, lockout: Duration) -> Self {
        Self {
            lockouts: RwLock::new(HashMap::new()),
            failures: RwLock::new(HashMap::new()),
            lockout,
            threshold: threshold.max(1),
            failure_window: Duration::from_secs(60).max(lockout),
        }
    }

    pub async fn is_locked(&self, identifier: &str) -> bool {
        let lockouts = self.lockouts.read().await;
        lockouts
            .get(identifier)
            .is_some_and(|since| since.elapsed() < self.lockout)
    }

    /// Count a failed login; returns true if the identifier is now locked
    pub async fn record_failure(&self, identifier: &str) -> bool {
        if self.is_locked(identifier).await {
            return true;
        }

        let mut failures = self.failures.write().await;
        let now = Instant::now();
        let (count, first_failure) = failures.entry(identifier.to_string()).or_insert((0, now));

        if now.duration_since(*first_failure) > self.failure_window {
            *count = 0;
            *first_failure = now;
        }
        *count += 1;

        if *count >= self.threshold {
            failures.remove(identifier);
            drop(failures);
            self.lockouts
                .write()
                .await
                .insert(identifier.to_string(), now);
            warn!(
                identifier = identifier,
                "Login locked for {} seconds after repeated failures",
                self.lockout.as_secs()
            );
            return true;
        }

        false
    }

    /// Forget failures after a successful login
    pub async fn record_success(&self, identifier: &str) {
        self.failures.write().await.remove(identifier);
    }

    /// Drop expired lockouts and stale failure records
    pub async fn cleanup(&self) {
        let now = Instant::now();
        self.lockouts
            .write()
            .await
            .retain(|_, since| since.elapsed() < self.lockout);
        self.failures
            .write()
            .await
            .retain(|_, (_, first)| now.duration_since(*first) < self.failure_window);
    }
}
