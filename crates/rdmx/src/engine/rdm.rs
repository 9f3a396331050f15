// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RDM response capture.
//!
//! While a transaction's response window is open, every received byte
//! lands in a [`ResponseCapture`]. Two quirks of real buses are handled
//! here:
//!
//! - leading 0x00 bytes are DMX bleed from the line turnaround and are
//!   skipped until the first meaningful byte arrives;
//! - some devices drive a filler break before their actual reply. A break
//!   mid-response therefore *resets* the capture position instead of
//!   ending the transaction — only the response window's deadline ends it.
//!
//! The deadline-ends-it rule is load-bearing: RDM devices never NAK an
//! absent command, so "the window expired with zero bytes" is the only
//! observable form of "nobody answered", and the discovery engine treats
//! it as a positive signal (empty branch).

use crate::protocol::constants::RDM_MAX_PACKET_SIZE;

/// Ceiling on captured bytes: a full packet plus room for preamble and
/// line garbage.
const CAPTURE_LIMIT: usize = RDM_MAX_PACKET_SIZE + 64;

/// Accumulator for the bytes of one RDM response window.
#[derive(Debug, Default)]
pub struct ResponseCapture {
    buf: Vec<u8>,
}

impl ResponseCapture {
    /// Empty capture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one received byte. Leading zeros are dropped; bytes past
    /// the capture ceiling are discarded (a longer "response" is garbage
    /// by definition).
    pub fn feed(&mut self, byte: u8) {
        if self.buf.is_empty() && byte == 0x00 {
            return;
        }
        if self.buf.len() < CAPTURE_LIMIT {
            self.buf.push(byte);
        }
    }

    /// A break arrived mid-window: whatever came before it was filler.
    pub fn on_break(&mut self) {
        if !self.buf.is_empty() {
            log::trace!("[rdm] break mid-response, restarting capture");
        }
        self.buf.clear();
    }

    /// Bytes captured so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True when nothing (meaningful) has been captured.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Take the captured bytes, leaving the capture empty for the next
    /// transaction.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}
