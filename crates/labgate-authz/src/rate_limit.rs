//! Per-key token bucket rate limiter.
//!
//! # Purpose
//! Bounds each client key to a sustained rate with a finite burst allowance.
//! Buckets are created lazily on first sight of a key and reclaimed by a
//! periodic sweep once they have been idle for the sweep interval.
//!
//! # Key invariants
//! - A bucket's token count stays within `[0, burst]` after every operation.
//! - A key's first request is admitted and charged one token.
//! - Admission requires at least one whole token; exactly `1.0` admits.
//! - The registry lock is held for arithmetic only. No logging, allocation
//!   beyond first-sight insertion, or await happens under it.
//!
//! # Important configuration
//! - `rate_per_second` and `burst` are process-wide; every key gets the same
//!   bucket shape.
//! - The sweep interval doubles as the idle threshold.
//!
//! # Common pitfalls
//! - Dropping the [`SweeperHandle`] stops the sweeper. Keep it alive for as
//!   long as the limiter serves traffic, and call
//!   [`SweeperHandle::shutdown`] on teardown.
use crate::clock::Clock;
use crate::errors::{AuthzError, AuthzResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub const DEFAULT_RATE_PER_SECOND: f64 = 100.0;
pub const DEFAULT_BURST: u32 = 200;
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitSettings {
    pub rate_per_second: f64,
    pub burst: u32,
    pub sweep_interval: Duration,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            rate_per_second: DEFAULT_RATE_PER_SECOND,
            burst: DEFAULT_BURST,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl RateLimitSettings {
    pub fn validate(&self) -> AuthzResult<()> {
        if !self.rate_per_second.is_finite() || self.rate_per_second <= 0.0 {
            return Err(AuthzError::InvalidRateLimitSettings(format!(
                "rate must be a positive number, got {}",
                self.rate_per_second
            )));
        }
        if self.burst == 0 {
            return Err(AuthzError::InvalidRateLimitSettings(
                "burst must be at least 1".to_string(),
            ));
        }
        if self.sweep_interval.is_zero() {
            return Err(AuthzError::InvalidRateLimitSettings(
                "sweep interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    /// Not enough tokens. `retry_after` is the wait until one token accrues.
    Rejected { retry_after: Duration },
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted)
    }
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Duration,
}

pub struct RateLimiter {
    settings: RateLimitSettings,
    buckets: Mutex<HashMap<String, Bucket>>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(settings: RateLimitSettings, clock: Arc<dyn Clock>) -> AuthzResult<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            buckets: Mutex::new(HashMap::new()),
            clock,
        })
    }

    pub fn settings(&self) -> &RateLimitSettings {
        &self.settings
    }

    /// Charge one token to `key`, creating its bucket on first sight.
    pub fn check(&self, key: &str) -> Admission {
        let now = self.clock.now();
        let burst = f64::from(self.settings.burst);
        let rate = self.settings.rate_per_second;

        let mut buckets = self.buckets.lock();
        let Some(bucket) = buckets.get_mut(key) else {
            buckets.insert(
                key.to_string(),
                Bucket {
                    tokens: burst - 1.0,
                    last_refill: now,
                },
            );
            return Admission::Admitted;
        };

        // A clock that steps backwards yields no refill.
        let elapsed = now.saturating_sub(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * rate).min(burst);
        bucket.last_refill = bucket.last_refill.max(now);

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            Admission::Admitted
        } else {
            let missing = 1.0 - bucket.tokens;
            Admission::Rejected {
                retry_after: Duration::try_from_secs_f64(missing / rate).unwrap_or(Duration::MAX),
            }
        }
    }

    /// Drop buckets idle for longer than the sweep interval. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let idle_after = self.settings.sweep_interval;
        let mut buckets = self.buckets.lock();
        let before = buckets.len();
        buckets.retain(|_, bucket| now.saturating_sub(bucket.last_refill) <= idle_after);
        before - buckets.len()
    }

    pub fn tracked_keys(&self) -> usize {
        self.buckets.lock().len()
    }

    /// Start the periodic sweep on the current tokio runtime.
    pub fn spawn_sweeper(self: &Arc<Self>) -> SweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let limiter = Arc::clone(self);
        let period = self.settings.sweep_interval;
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = limiter.sweep();
                        if removed > 0 {
                            tracing::debug!(
                                removed,
                                remaining = limiter.tracked_keys(),
                                "rate limiter swept idle buckets"
                            );
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("rate limiter sweeper stopped");
        });
        SweeperHandle {
            shutdown: shutdown_tx,
            task,
        }
    }

    #[cfg(test)]
    fn tokens(&self, key: &str) -> Option<f64> {
        self.buckets.lock().get(key).map(|bucket| bucket.tokens)
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("settings", &self.settings)
            .field("tracked_keys", &self.tracked_keys())
            .finish()
    }
}

/// Owner of the background sweep task. Dropping it also stops the task.
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signal the sweeper and wait for it to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.task.await {
            tracing::warn!(error = %err, "rate limiter sweeper task failed");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
