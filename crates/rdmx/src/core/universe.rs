// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Double-buffered 512-channel DMX universe.
//!
//! One [`Universe`] per port. The **front** buffer is the application's
//! view: channel writes merge into it between frames. The **back** buffer
//! is the transmitter's private snapshot, copied from the front only at
//! frame start, so a frame in flight never observes a mid-frame mutation —
//! whole-frame snapshots are the only thing that crosses the boundary.
//!
//! On the receive side the roles invert: inbound bytes fill the back
//! buffer, and a completed frame swaps the pair so the application reads a
//! stable frame while the next one fills.
//!
//! The active channel count (`num_chans`) is grow-only: it rises to the
//! highest channel carrying new data plus a margin, floored at
//! [`DMX_MIN_CHANS`](crate::config::DMX_MIN_CHANS), clamped to 512, and
//! only shrinks on an explicit clear.

use crate::config::{DMX_CHANS_MARGIN, DMX_MIN_CHANS, DMX_UNIVERSE_SIZE};
use crate::error::{Error, Result};

/// Front-buffer storage with an explicit ownership tag.
///
/// A caller may lend its own 512-byte buffer at port construction and
/// reclaim it from [`crate::engine::DmxPort::shutdown`]; the tag records
/// whose buffer it is, so shutdown knows what to hand back.
pub enum UniverseStorage {
    /// Engine-allocated storage; dropped with the port.
    Owned(Box<[u8; DMX_UNIVERSE_SIZE]>),
    /// Caller-supplied storage; returned at shutdown.
    Caller(Box<[u8; DMX_UNIVERSE_SIZE]>),
}

impl UniverseStorage {
    /// Fresh zeroed engine-owned storage.
    pub fn owned() -> Self {
        UniverseStorage::Owned(Box::new([0; DMX_UNIVERSE_SIZE]))
    }

    /// Wrap a caller-supplied buffer.
    pub fn caller(buf: Box<[u8; DMX_UNIVERSE_SIZE]>) -> Self {
        UniverseStorage::Caller(buf)
    }

    /// True for caller-supplied storage.
    pub fn is_caller(&self) -> bool {
        matches!(self, UniverseStorage::Caller(_))
    }

    fn as_slice(&self) -> &[u8; DMX_UNIVERSE_SIZE] {
        match self {
            UniverseStorage::Owned(b) | UniverseStorage::Caller(b) => b,
        }
    }

    fn as_mut_slice(&mut self) -> &mut [u8; DMX_UNIVERSE_SIZE] {
        match self {
            UniverseStorage::Owned(b) | UniverseStorage::Caller(b) => b,
        }
    }
}

impl std::fmt::Debug for UniverseStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UniverseStorage::Owned(_) => write!(f, "UniverseStorage::Owned"),
            UniverseStorage::Caller(_) => write!(f, "UniverseStorage::Caller"),
        }
    }
}

/// Front/back channel buffer pair with the grow-only channel-count policy.
#[derive(Debug)]
pub struct Universe {
    front: UniverseStorage,
    back: Box<[u8; DMX_UNIVERSE_SIZE]>,
    num_chans: u16,
    started: bool,
}

impl Universe {
    /// Build with the given storage, or engine-owned storage if `None`.
    pub fn new(storage: Option<UniverseStorage>) -> Self {
        let mut front = storage.unwrap_or_else(UniverseStorage::owned);
        front.as_mut_slice().fill(0);
        Universe {
            front,
            back: Box::new([0; DMX_UNIVERSE_SIZE]),
            num_chans: DMX_MIN_CHANS,
            started: false,
        }
    }

    /// Merge `data` into the front buffer starting at 1-based channel
    /// `start`, growing the active count if any byte actually changed.
    ///
    /// Data running past channel 512 is truncated, matching the clamp the
    /// count policy applies. Returns [`Error::ChannelRange`] for a start
    /// outside 1..=512 or an empty span.
    pub fn write_channels(&mut self, start: u16, data: &[u8]) -> Result<()> {
        if start == 0 || start as usize > DMX_UNIVERSE_SIZE || data.is_empty() {
            return Err(Error::ChannelRange);
        }
        let lo = start as usize - 1;
        let len = data.len().min(DMX_UNIVERSE_SIZE - lo);
        let data = &data[..len];

        self.started = true;

        let front = self.front.as_mut_slice();
        if front[lo..lo + len] == *data {
            // Nothing changed; the count must not move.
            return Ok(());
        }

        // Highest 1-based channel whose value actually changed.
        let mut high = lo + len;
        while high > lo && front[high - 1] == data[high - 1 - lo] {
            high -= 1;
        }
        front[lo..lo + len].copy_from_slice(data);
        self.grow_to(high as u16);
        Ok(())
    }

    /// Recompute the active count from a hint with no new data: scan down
    /// from `hint` for the highest non-zero channel, then grow as usual.
    /// A hint backed by no data above the current count leaves it alone.
    pub fn update_channel_count(&mut self, hint: u16) {
        if hint <= self.num_chans {
            return;
        }
        self.started = true;
        let mut n = hint.min(DMX_UNIVERSE_SIZE as u16);
        let front = self.front.as_slice();
        while n > self.num_chans && front[n as usize - 1] == 0 {
            n -= 1;
        }
        // The scan only justifies growth when it stopped on actual data.
        if n > self.num_chans {
            self.grow_to(n);
        }
    }

    fn grow_to(&mut self, highest: u16) {
        let want = (highest + DMX_CHANS_MARGIN)
            .max(DMX_MIN_CHANS)
            .min(DMX_UNIVERSE_SIZE as u16);
        if want > self.num_chans {
            self.num_chans = want;
        }
    }

    /// Zero the front buffer and drop the count back to the floor. This is
    /// the only path that shrinks the count.
    pub fn clear(&mut self) {
        self.front.as_mut_slice().fill(0);
        self.num_chans = DMX_MIN_CHANS;
    }

    /// Zero both buffers and forget that data was ever written. Used when
    /// a port changes duty (entering or leaving DMX-input mode).
    pub fn reset(&mut self) {
        self.front.as_mut_slice().fill(0);
        self.back.fill(0);
        self.num_chans = DMX_MIN_CHANS;
        self.started = false;
    }

    /// Copy the first `len` front-buffer bytes into the back buffer. The
    /// whole-frame snapshot is the only writer/transmitter crossing point.
    pub fn snapshot(&mut self, len: usize) {
        let len = len.min(DMX_UNIVERSE_SIZE);
        self.back[..len].copy_from_slice(&self.front.as_slice()[..len]);
    }

    /// Exchange front and back contents. Receive-side handoff: the filled
    /// capture buffer becomes the application's view in one move.
    pub fn swap(&mut self) {
        self.front.as_mut_slice().swap_with_slice(&mut self.back[..]);
    }

    /// Application view of the channel data (slot 0 = channel 1).
    pub fn channels(&self) -> &[u8] {
        &self.front.as_slice()[..]
    }

    /// Transmitter's snapshot / receiver's capture buffer.
    pub fn back(&self) -> &[u8] {
        &self.back[..]
    }

    /// Mutable access to the back buffer (RDM frames are encoded here, and
    /// inbound DMX bytes land here).
    pub fn back_mut(&mut self) -> &mut [u8] {
        &mut self.back[..]
    }

    /// Active channel count.
    pub fn num_chans(&self) -> u16 {
        self.num_chans
    }

    /// Force the count (receive side: the count is whatever the wire
    /// delivered).
    pub fn set_num_chans(&mut self, n: u16) {
        self.num_chans = n.min(DMX_UNIVERSE_SIZE as u16);
    }

    /// True once channel data has been written at least once; the transmit
    /// pipeline stays idle until then.
    pub fn started(&self) -> bool {
        self.started
    }

    /// Tear down, handing back caller-supplied storage if that is what the
    /// port was built with.
    pub fn into_caller_storage(self) -> Option<Box<[u8; DMX_UNIVERSE_SIZE]>> {
        match self.front {
            UniverseStorage::Caller(b) => Some(b),
            UniverseStorage::Owned(_) => None,
        }
    }
}
