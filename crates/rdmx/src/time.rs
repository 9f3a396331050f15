// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Monotonic microsecond clock and the physical-framing wait primitive.
//!
//! Every timeout in the engine — the RDM response window, the full-universe
//! refresh, the discovery interval — is polled against [`Clock::now_micros`]
//! from the task tick. Nothing is delivered asynchronously.
//!
//! [`Clock::busy_wait_micros`] is the one deliberately blocking primitive in
//! the crate. It exists for the physical framing contract: break and
//! mark-after-break are level-hold times on the wire, and the line must stay
//! put for the whole duration. Do not call it from contexts with unbounded
//! preemption latency; the engine only uses it at frame start, bounded to a
//! few hundred microseconds.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic microsecond time source.
///
/// The engine is written against this trait so tests can drive state
/// machines through multi-millisecond timeout windows without wall-clock
/// delay. Production code uses [`SystemClock`].
pub trait Clock {
    /// Microseconds since an arbitrary fixed origin. Must never go
    /// backwards.
    fn now_micros(&self) -> u64;

    /// Hold the caller for `us` microseconds of clock time.
    ///
    /// # Performance
    ///
    /// Blocking by contract. Implementations must guarantee *at least* the
    /// requested duration; overshoot is acceptable (DMX receivers accept any
    /// break at or above the minimum, so stretching the hold is harmless,
    /// truncating it is not).
    fn busy_wait_micros(&self, us: u64) {
        let deadline = self.now_micros() + us;
        while self.now_micros() < deadline {
            std::hint::spin_loop();
        }
    }
}

/// Production clock backed by [`Instant`].
///
/// `busy_wait_micros` sleeps for the bulk of long holds and spins the final
/// stretch, so the hold lands close to the target without burning a core
/// for milliseconds. On a general-purpose scheduler the sleep can overshoot;
/// per the [`Clock`] contract that only lengthens the low/high period, which
/// receivers tolerate.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Clock with its origin at the moment of creation.
    pub fn new() -> Self {
        SystemClock {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_micros(&self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }

    fn busy_wait_micros(&self, us: u64) {
        let deadline = self.now_micros() + us;
        // Sleep through all but the tail, then spin to the deadline.
        const SPIN_TAIL_US: u64 = 100;
        if us > SPIN_TAIL_US {
            std::thread::sleep(Duration::from_micros(us - SPIN_TAIL_US));
        }
        while self.now_micros() < deadline {
            std::hint::spin_loop();
        }
    }
}

/// Manually advanced clock for tests.
///
/// Clones share one counter, so a test can hold a handle while the port
/// under test holds another. `busy_wait_micros` advances the counter
/// instead of spinning: framing holds are instant and exact, and a test can
/// read how far time has moved.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    micros: Arc<AtomicU64>,
}

impl ManualClock {
    /// Clock starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward by `us` microseconds.
    pub fn advance(&self, us: u64) {
        self.micros.fetch_add(us, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_micros(&self) -> u64 {
        self.micros.load(Ordering::SeqCst)
    }

    fn busy_wait_micros(&self, us: u64) {
        self.advance(us);
    }
}
