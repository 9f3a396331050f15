// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! DMX input frame assembly.
//!
//! Byte-fed state machine: `Idle -> Break -> Data -> Idle`. A valid break
//! always forces `Break` — completing any frame in progress first — and
//! the next byte decides the frame's fate: start code 0 opens a DMX data
//! frame, anything else (RDM, text packets, garbage) drops back to `Idle`
//! and the frame is ignored.
//!
//! Completion hands the frame over with a true buffer swap: the filled
//! capture (back) buffer and the application's (front) buffer exchange
//! places, so the application reads a stable whole frame while the next
//! one fills. A frame also completes the moment slot 512 lands, without
//! waiting for the trailing break.
//!
//! A frame error (break below the recognition minimum, or line noise)
//! discards the partial frame silently; protocol noise never reaches the
//! application.

use crate::config::DMX_UNIVERSE_SIZE;
use crate::core::Universe;
use crate::protocol::constants::SC_DMX;

/// Receive-side state, exposed through
/// [`crate::engine::DmxPort::state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxState {
    /// Waiting for a break.
    Idle,
    /// Break seen; the next byte is the start code.
    Break,
    /// Accumulating channel data.
    Data,
}

/// Inbound DMX frame assembler for one port.
#[derive(Debug)]
pub struct DmxReceiver {
    state: RxState,
    pos: usize,
}

impl DmxReceiver {
    /// Assembler in `Idle`, waiting for the first break.
    pub fn new() -> Self {
        DmxReceiver {
            state: RxState::Idle,
            pos: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> RxState {
        self.state
    }

    /// Back to `Idle`, dropping any partial frame.
    pub fn reset(&mut self) {
        self.state = RxState::Idle;
        self.pos = 0;
    }

    /// Feed one received byte. Returns the channel count when this byte
    /// completed a frame (slot 512 landed); the completed frame is already
    /// swapped into the front buffer.
    pub fn feed(&mut self, byte: u8, universe: &mut Universe) -> Option<u16> {
        match self.state {
            RxState::Idle => None,
            RxState::Break => {
                if byte == SC_DMX {
                    self.state = RxState::Data;
                    self.pos = 0;
                } else {
                    // Not a channel-data frame; ignore until the next
                    // break.
                    log::trace!("[dmx_rx] non-DMX start code {:#04x}", byte);
                    self.state = RxState::Idle;
                }
                None
            }
            RxState::Data => {
                universe.back_mut()[self.pos] = byte;
                self.pos += 1;
                if self.pos >= DMX_UNIVERSE_SIZE {
                    let count = self.complete(universe);
                    self.state = RxState::Idle;
                    Some(count)
                } else {
                    None
                }
            }
        }
    }

    /// Handle a valid break. Returns the channel count if the break
    /// completed a frame in progress.
    pub fn on_break(&mut self, universe: &mut Universe) -> Option<u16> {
        let completed = if self.state == RxState::Data && self.pos > 0 {
            Some(self.complete(universe))
        } else {
            None
        };
        self.state = RxState::Break;
        completed
    }

    /// Handle a frame error: the partial frame is noise, not data.
    pub fn on_frame_error(&mut self) {
        if self.pos > 0 {
            log::debug!("[dmx_rx] frame error, dropping {} captured bytes", self.pos);
        }
        self.reset();
    }

    fn complete(&mut self, universe: &mut Universe) -> u16 {
        let count = self.pos as u16;
        universe.set_num_chans(count);
        universe.swap();
        self.pos = 0;
        count
    }
}

impl Default for DmxReceiver {
    fn default() -> Self {
        Self::new()
    }
}
