use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, TimeZone, Utc};

/// Source of "now" for record timestamps and ledger commit times.
///
/// Injected everywhere a wall-clock reading is needed so tests can control
/// ordering deterministically.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Current instant truncated to whole seconds since the UNIX epoch.
    fn now_secs(&self) -> i64 {
        self.now().timestamp()
    }
}

/// Wall-clock time from the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-driven clock with one-second resolution.
///
/// Starts at a fixed instant and only moves when told to. Safe to share
/// across threads.
pub struct ManualClock {
    secs: AtomicI64,
}

impl ManualClock {
    /// Create a clock reading `secs` seconds since the UNIX epoch.
    pub fn new(secs: i64) -> Self {
        Self {
            secs: AtomicI64::new(secs),
        }
    }

    /// Jump to `secs`. Moving backwards is allowed.
    pub fn set(&self, secs: i64) {
        self.secs.store(secs, Ordering::SeqCst);
    }

    /// Move forward by `delta` seconds and return the new reading.
    pub fn advance(&self, delta: i64) -> i64 {
        self.secs.fetch_add(delta, Ordering::SeqCst) + delta
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        // 2023-11-14T22:13:20Z
        Self::new(1_700_000_000)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let secs = self.secs.load(Ordering::SeqCst);
        Utc.timestamp_opt(secs, 0)
            .single()
            .unwrap_or_default()
    }

    fn now_secs(&self) -> i64 {
        self.secs.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualClock")
            .field("secs", &self.secs.load(Ordering::SeqCst))
            .finish()
    }
}
