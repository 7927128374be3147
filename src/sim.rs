//! Injectable time, randomness and latency
//!
//! The partition selector and schema cache draw on these instead of calling
//! the wall clock, the thread RNG or `tokio::time::sleep` directly, so tests
//! can force cache hits, misses and injected faults deterministically.

use futures::future::BoxFuture;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

/// Source of wall-clock time in epoch milliseconds
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Real wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now_ms: AtomicI64::new(start_ms),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now_ms
            .fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }

    pub fn set(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// Uniform integer source
pub trait RandomSource: Send + Sync {
    /// Uniform draw from `0..bound`. `bound` is always greater than zero.
    fn below(&self, bound: u64) -> u64;
}

/// Thread-local RNG, the production default
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn below(&self, bound: u64) -> u64 {
        rand::thread_rng().gen_range(0..bound)
    }
}

/// Reproducible RNG for load tests and benchmarks
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn below(&self, bound: u64) -> u64 {
        self.rng.lock().gen_range(0..bound)
    }
}

/// Replays a fixed sequence of draws, then repeats `fallback` forever.
/// Each draw is reduced modulo the requested bound.
#[derive(Debug)]
pub struct SequenceRandom {
    values: Mutex<VecDeque<u64>>,
    fallback: u64,
}

impl SequenceRandom {
    pub fn new(values: impl IntoIterator<Item = u64>, fallback: u64) -> Self {
        Self {
            values: Mutex::new(values.into_iter().collect()),
            fallback,
        }
    }

    /// Always returns `value % bound`
    pub fn constant(value: u64) -> Self {
        Self::new([], value)
    }
}

impl RandomSource for SequenceRandom {
    fn below(&self, bound: u64) -> u64 {
        let next = self.values.lock().pop_front().unwrap_or(self.fallback);
        next % bound
    }
}

/// Simulated slow-backend wait. Must suspend only the calling task.
pub trait Latency: Send + Sync {
    fn pause(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

/// Real async sleep on the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioLatency;

impl Latency for TokioLatency {
    fn pause(&self, duration: Duration) -> BoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Returns immediately but remembers every requested pause
#[derive(Debug, Default)]
pub struct RecordingLatency {
    pauses: Mutex<Vec<Duration>>,
}

impl RecordingLatency {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().clone()
    }
}

impl Latency for RecordingLatency {
    fn pause(&self, duration: Duration) -> BoxFuture<'static, ()> {
        self.pauses.lock().push(duration);
        Box::pin(futures::future::ready(()))
    }
}
