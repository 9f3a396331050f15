// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Engine configuration: protocol timing, buffer sizing, and per-port options.
//!
//! Single source of truth for every tunable the state machines consume.
//! Wire-format constants (start codes, PIDs, packet offsets) live in
//! [`crate::protocol::constants`]; this module holds the *behavioral* knobs:
//! how long a break is driven, how often a full universe is refreshed, how
//! large the command queue is.
//!
//! Timing values follow ANSI E1.11 (DMX512-A) and ANSI E1.20 (RDM). Where
//! the standard gives a minimum, the engine drives a comfortable margin
//! above it (e.g. break: minimum 92 us, driven 120 us).

// ============================================================================
// DMX physical layer (ANSI E1.11)
// ============================================================================

/// Number of channel slots in one DMX universe.
pub const DMX_UNIVERSE_SIZE: usize = 512;

/// Line rate for DMX512 and RDM, bits per second (8N2 framing).
pub const DMX_BAUD: u32 = 250_000;

/// Wire time of one slot (start bit + 8 data + 2 stop = 11 bits at 250 kbaud).
///
/// Used at frame start to let the final byte of the previous frame clear the
/// transmitter's shift register before the line is pulled low for break.
pub const DMX_SLOT_TIME_US: u64 = 44;

/// Break duration the engine drives, in microseconds.
///
/// E1.11 requires a transmitter to hold break for at least 92 us; 120 us
/// keeps slow receivers comfortable.
pub const DMX_BREAK_US: u64 = 120;

/// Shortest break a receiver recognizes as valid framing, in microseconds.
///
/// E1.11 obliges receivers to accept breaks of 88 us and up. Anything
/// shorter is line noise and must not complete a frame.
pub const DMX_BREAK_MIN_US: u64 = 88;

/// Mark-after-break duration, in microseconds (E1.11 minimum 12 us).
pub const DMX_MAB_US: u64 = 12;

/// Interval between forced full-universe (512 channel) frames, milliseconds.
///
/// Regular frames carry only the active channel count; some receivers need a
/// periodic refresh of every slot to notice channels that went quiet.
pub const DMX_FULL_UNIVERSE_MS: u64 = 1_000;

// ============================================================================
// Active channel count policy
// ============================================================================

/// Floor for the active channel count. Tiny writes still produce frames of
/// at least this many slots so receivers keep a stable refresh rate.
pub const DMX_MIN_CHANS: u16 = 30;

/// Margin added above the highest channel carrying new data when the active
/// count grows.
pub const DMX_CHANS_MARGIN: u16 = 6;

// ============================================================================
// RDM transactions (ANSI E1.20)
// ============================================================================

/// Capacity of the per-port RDM command queue. Push beyond this fails and is
/// the engine's only RDM backpressure signal.
pub const RDM_QUEUE_CAPACITY: usize = 30;

/// Guard deadline armed when an RDM frame starts transmitting, microseconds.
///
/// Covers the whole transmit phase; if the transmit-empty event never
/// arrives the transaction is still reaped at this deadline.
pub const RDM_TX_GUARD_US: u64 = 5_000;

/// Response-capture window armed when the last RDM byte drains, microseconds.
///
/// Expiry of this window is what resolves a transaction; zero captured bytes
/// at expiry is the "nobody answered" signal discovery depends on.
pub const RDM_RESPONSE_WINDOW_US: u64 = 3_000;

/// Interval between unprompted incremental discovery passes, milliseconds.
pub const RDM_DISCOVERY_INTERVAL_MS: u64 = 30_000;

// ============================================================================
// Per-port options
// ============================================================================

use crate::core::universe::UniverseStorage;

/// Build-time options for one [`crate::engine::DmxPort`].
///
/// `Default` gives an output port with direction control, driving the
/// standard break/MAB timing above.
pub struct PortConfig {
    /// Whether the transport can steer an RS-485 direction pin. RDM needs
    /// this to turn the line around for response capture; ports without it
    /// are transmit-only.
    pub direction_control: bool,
    /// Break duration driven at frame start, microseconds.
    pub break_us: u64,
    /// Mark-after-break duration, microseconds.
    pub mab_us: u64,
    /// Front-buffer storage. `None` allocates engine-owned storage;
    /// callers may lend a buffer instead and reclaim it from
    /// [`crate::engine::DmxPort::shutdown`].
    pub storage: Option<UniverseStorage>,
}

impl Default for PortConfig {
    fn default() -> Self {
        PortConfig {
            direction_control: true,
            break_us: DMX_BREAK_US,
            mab_us: DMX_MAB_US,
            storage: None,
        }
    }
}
