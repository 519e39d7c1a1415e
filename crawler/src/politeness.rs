//! Per-host politeness scheduling.
//!
//! [`BackHeap`] keeps every host that has pages waiting, ordered by the time
//! it may next be contacted. Crawler workers pop the most eligible host,
//! sleep for the returned wait, fetch one page and push the host back.

use parking_lot::Mutex;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Default pause between two requests to the same host.
pub const DEFAULT_HOST_DELAY: Duration = Duration::from_millis(1000);

pub trait Clock: Send + Sync {
    /// Milliseconds since an arbitrary fixed origin.
    fn now_millis(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_millis: u64) -> Self {
        Self { now: AtomicU64::new(start_millis) }
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 { self.now.load(Ordering::SeqCst) }
}

#[derive(Default)]
struct Schedule {
    heap: BinaryHeap<Reverse<(u64, String)>>,
    pending: HashSet<String>,
}

/// Min-heap of `(eligible_at, host)` shared by all crawler workers.
///
/// Both operations run under one lock. A host is in the heap at most once.
pub struct BackHeap<C: Clock = SystemClock> {
    schedule: Mutex<Schedule>,
    clock: C,
    delay: Duration,
}

impl BackHeap<SystemClock> {
    pub fn new(delay: Duration) -> Self {
        Self::with_clock(delay, SystemClock)
    }
}

impl<C: Clock> BackHeap<C> {
    pub fn with_clock(delay: Duration, clock: C) -> Self {
        Self { schedule: Mutex::new(Schedule::default()), clock, delay }
    }

    pub fn clock(&self) -> &C { &self.clock }

    /// Schedule `host`. With `delay` it becomes eligible after the host delay,
    /// otherwise right away. Pushing a host that is already scheduled is
    /// logged and ignored.
    pub fn push_host(&self, host: &str, delay: bool) {
        let mut schedule = self.schedule.lock();
        if schedule.pending.contains(host) {
            tracing::error!(host, "attempted to push host when already in heap");
            return;
        }
        let eligible_at = if delay { self.clock.now_millis() + self.delay.as_millis() as u64 } else { 0 };
        schedule.pending.insert(host.to_string());
        schedule.heap.push(Reverse((eligible_at, host.to_string())));
    }

    /// Take the host that becomes eligible first, with how long the caller
    /// must wait before contacting it (zero if it already is).
    pub fn pop_host(&self) -> Option<(Duration, String)> {
        let mut schedule = self.schedule.lock();
        let Reverse((eligible_at, host)) = schedule.heap.pop()?;
        schedule.pending.remove(&host);
        let wait = eligible_at.saturating_sub(self.clock.now_millis());
        Some((Duration::from_millis(wait), host))
    }

    /// Hosts currently scheduled, in no particular order.
    pub fn hosts(&self) -> Vec<String> {
        self.schedule.lock().pending.iter().cloned().collect()
    }

    pub fn len(&self) -> usize { self.schedule.lock().heap.len() }

    pub fn is_empty(&self) -> bool { self.schedule.lock().heap.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn heap() -> BackHeap<ManualClock> {
        BackHeap::with_clock(DEFAULT_HOST_DELAY, ManualClock::new(10_000))
    }

    #[test]
    fn undelayed_hosts_come_first() {
        let h = heap();
        h.push_host("slow.example", true);
        h.push_host("fast.example", false);
        assert_eq!(h.pop_host(), Some((Duration::ZERO, "fast.example".to_string())));
        assert_eq!(h.pop_host(), Some((Duration::from_millis(1000), "slow.example".to_string())));
        assert_eq!(h.pop_host(), None);
    }

    #[test]
    fn wait_shrinks_as_time_passes_and_never_goes_negative() {
        let h = heap();
        h.push_host("a.example", true);
        h.clock().advance(Duration::from_millis(600));
        assert_eq!(h.pop_host(), Some((Duration::from_millis(400), "a.example".to_string())));

        h.push_host("a.example", true);
        h.clock().advance(Duration::from_millis(5000));
        assert_eq!(h.pop_host(), Some((Duration::ZERO, "a.example".to_string())));
    }

    #[test]
    fn duplicate_push_is_ignored() {
        let h = heap();
        h.push_host("a.example", true);
        h.push_host("a.example", false);
        assert_eq!(h.len(), 1);
        assert_eq!(h.hosts(), vec!["a.example".to_string()]);
        // The first schedule wins.
        assert_eq!(h.pop_host().map(|(w, _)| w), Some(Duration::from_millis(1000)));
        assert!(h.is_empty());
        h.push_host("a.example", false);
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn concurrent_workers_share_one_schedule() {
        let h = Arc::new(heap());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let h = Arc::clone(&h);
                thread::spawn(move || {
                    for j in 0..50 {
                        h.push_host(&format!("host{}", (i * 50 + j) % 100), j % 2 == 0);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(h.len(), 100);

        let mut popped = HashSet::new();
        while let Some((_, host)) = h.pop_host() {
            assert!(popped.insert(host));
        }
        assert_eq!(popped.len(), 100);
    }
}
