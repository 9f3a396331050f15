// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! One DMX/RDM port: the multi-mode state machine sharing a single
//! transceiver among DMX transmit, DMX receive, and RDM transactions.
//!
//! The three duties are mutually exclusive and a full frame always
//! completes before the port changes duty. [`DmxPort::tick`] is the
//! cooperative task-context poll: it pumps transport events (the
//! interrupt-context analogue — byte moves only), checks the polled
//! deadlines, and drives the per-frame transitions:
//!
//! ```text
//!            +--------------- DMX output ----------------+
//!            |  Stop -> DmxStart -> DmxTx -> Stop         |
//! tick ----->+                                            |
//!            |  Stop -> RdmStart -> RdmTx -> RdmRx -> Stop|
//!            +--------------- RDM transact ---------------+
//!            input mode:  RxIdle -> RxBreak -> RxData -> RxIdle
//! ```
//!
//! RDM takes priority over DMX when the queue holds a command, matching
//! the source discipline: configuration traffic is rare and
//! latency-sensitive, channel data is continuous and tolerant.

use std::sync::Arc;

use crate::config::{
    DMX_FULL_UNIVERSE_MS, DMX_SLOT_TIME_US, DMX_UNIVERSE_SIZE, PortConfig, RDM_RESPONSE_WINDOW_US,
    RDM_TX_GUARD_US,
};
use crate::core::{BusArbiter, CommandQueue, Universe};
use crate::engine::discovery::{DiscoveryEngine, DiscoveryMode};
use crate::engine::rdm::ResponseCapture;
use crate::engine::receiver::{DmxReceiver, RxState};
use crate::error::{Error, Result};
use crate::protocol::constants::{
    CC_DISCOVERY_COMMAND, PID_DISC_MUTE, PID_DISC_UNIQUE_BRANCH, PID_DISC_UN_MUTE, SC_DMX, SC_RDM,
};
use crate::protocol::{RdmCommand, RdmPacket, Uid};
use crate::time::Clock;
use crate::transport::{LineDirection, LineMode, SerialEvent, SerialTransport};

/// Externally visible port state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortState {
    /// Idle between frames.
    Stop,
    /// DMX frame chosen; physical framing about to run.
    DmxStart,
    /// DMX channel bytes streaming out.
    DmxTx,
    /// RDM command framed; physical framing about to run.
    RdmStart,
    /// RDM command bytes streaming out.
    RdmTx,
    /// Response window open, capturing.
    RdmRx,
    /// Input mode: waiting for a break.
    RxIdle,
    /// Input mode: break seen, start code pending.
    RxBreak,
    /// Input mode: channel data arriving.
    RxData,
}

/// Everything that exists only while RDM is enabled on the port.
struct RdmSession {
    source: Uid,
    trans_no: u8,
    queue: CommandQueue,
    capture: ResponseCapture,
    response_deadline_us: u64,
    guard_deadline_us: u64,
    discovery: DiscoveryEngine,
}

impl RdmSession {
    fn stamp(&mut self, cmd: &mut RdmCommand) {
        cmd.source = self.source;
        cmd.transaction = self.trans_no;
        self.trans_no = self.trans_no.wrapping_add(1);
    }

    /// Move backlogged discovery commands into the queue as space allows,
    /// stamping each with a fresh transaction number. Order is preserved;
    /// anything that does not fit stays backlogged for the next tick.
    fn drain_backlog(&mut self) {
        while self.discovery.backlog_pending() && !self.queue.is_full() {
            if let Some(mut cmd) = self.discovery.next_backlog() {
                self.stamp(&mut cmd);
                let _ = self.queue.push(cmd);
            }
        }
    }
}

/// One physical DMX512/RDM port.
pub struct DmxPort<T: SerialTransport> {
    id: u8,
    transport: T,
    arbiter: Arc<BusArbiter>,
    clock: Box<dyn Clock>,
    direction_control: bool,
    break_us: u64,
    mab_us: u64,

    state: PortState,
    paused: bool,
    input: bool,

    universe: Universe,
    receiver: DmxReceiver,
    tx_pos: usize,
    tx_size: usize,
    full_universe_at_us: u64,

    rdm: Option<RdmSession>,

    frame_cb: Option<Box<dyn FnMut(u16)>>,
    rdm_cb: Option<Box<dyn FnMut(&RdmPacket)>>,
    tod_cb: Option<Box<dyn FnMut()>>,
}

impl<T: SerialTransport> DmxPort<T> {
    /// Bring up a port over `transport`. The port starts idle in output
    /// duty; nothing is transmitted until channel data is written.
    pub fn new(
        id: u8,
        mut transport: T,
        arbiter: Arc<BusArbiter>,
        clock: Box<dyn Clock>,
        config: PortConfig,
    ) -> Self {
        if config.direction_control {
            transport.set_direction(LineDirection::Transmit);
        }
        DmxPort {
            id,
            transport,
            arbiter,
            clock,
            direction_control: config.direction_control,
            break_us: config.break_us,
            mab_us: config.mab_us,
            state: PortState::Stop,
            paused: false,
            input: false,
            universe: Universe::new(config.storage),
            receiver: DmxReceiver::new(),
            tx_pos: 0,
            tx_size: 0,
            // First frame carries the whole universe.
            full_universe_at_us: 0,
            rdm: None,
            frame_cb: None,
            rdm_cb: None,
            tod_cb: None,
        }
    }

    // ========================================================================
    // Task-context tick
    // ========================================================================

    /// The cooperative poll. Call periodically from one task context; all
    /// state transitions, queue draining, and discovery run here.
    pub fn tick(&mut self) {
        self.pump_events();
        self.check_deadlines();
        if self.paused || self.input {
            return;
        }
        if self.state == PortState::Stop {
            self.try_start_rdm();
        }
        if self.state == PortState::Stop {
            self.try_start_dmx();
        }
        if matches!(self.state, PortState::DmxStart | PortState::RdmStart) {
            self.start_frame();
        }
    }

    fn pump_events(&mut self) {
        while let Some(event) = self.transport.poll() {
            match event {
                SerialEvent::TransmitEmpty => self.on_transmit_empty(),
                SerialEvent::ReceiveReady => self.on_receive_ready(),
                SerialEvent::Break => self.on_break(),
                SerialEvent::FrameError => self.on_frame_error(),
            }
        }
    }

    fn on_transmit_empty(&mut self) {
        if self.tx_pos < self.tx_size {
            self.fill_tx();
            return;
        }
        self.transport.disarm_transmit_empty();
        match self.state {
            PortState::DmxTx => {
                self.state = PortState::Stop;
            }
            PortState::RdmTx => {
                if self.arbiter.rdm_paused() {
                    self.arbiter.end_rdm();
                    self.state = PortState::Stop;
                } else {
                    self.enter_rdm_rx();
                }
            }
            _ => {}
        }
    }

    fn on_receive_ready(&mut self) {
        if self.input {
            while let Some(byte) = self.transport.read() {
                if let Some(count) = self.receiver.feed(byte, &mut self.universe) {
                    log::debug!("[dmx_port] port {} received {}-channel frame", self.id, count);
                    if let Some(cb) = self.frame_cb.as_mut() {
                        cb(count);
                    }
                }
            }
        } else if self.state == PortState::RdmRx {
            if let Some(rdm) = self.rdm.as_mut() {
                while let Some(byte) = self.transport.read() {
                    rdm.capture.feed(byte);
                }
            }
        } else {
            // Bytes with nobody listening: line garbage.
            while self.transport.read().is_some() {}
        }
    }

    fn on_break(&mut self) {
        if self.input {
            if let Some(count) = self.receiver.on_break(&mut self.universe) {
                log::debug!("[dmx_port] port {} received {}-channel frame", self.id, count);
                if let Some(cb) = self.frame_cb.as_mut() {
                    cb(count);
                }
            }
        } else if self.state == PortState::RdmRx {
            if let Some(rdm) = self.rdm.as_mut() {
                rdm.capture.on_break();
            }
        }
    }

    fn on_frame_error(&mut self) {
        if self.input {
            self.receiver.on_frame_error();
        } else if self.state == PortState::RdmRx {
            // Same treatment as a filler break: restart the capture.
            if let Some(rdm) = self.rdm.as_mut() {
                rdm.capture.on_break();
            }
        }
    }

    fn check_deadlines(&mut self) {
        let now = self.clock.now_micros();
        match self.state {
            PortState::RdmRx => {
                let expired = self
                    .rdm
                    .as_ref()
                    .is_some_and(|r| now >= r.response_deadline_us);
                if expired {
                    self.finish_rdm(now);
                }
            }
            PortState::RdmTx => {
                let expired = self.rdm.as_ref().is_some_and(|r| now >= r.guard_deadline_us);
                if expired {
                    log::warn!("[rdm] port {} transmit guard expired, reaping", self.id);
                    self.transport.disarm_transmit_empty();
                    self.finish_rdm(now);
                }
            }
            _ => {}
        }
    }

    // ========================================================================
    // RDM transaction sequencing
    // ========================================================================

    fn try_start_rdm(&mut self) {
        if self.arbiter.rdm_paused() {
            return;
        }
        let now = self.clock.now_micros();
        let Some(rdm) = self.rdm.as_mut() else {
            return;
        };

        rdm.drain_backlog();
        if rdm.queue.is_empty() && !rdm.discovery.backlog_pending() && rdm.discovery.due(now) {
            rdm.discovery.step_incremental();
            rdm.drain_backlog();
        }
        // Frame the head command (peek, not pop: it stays queued until the
        // response window resolves it).
        let Some(cmd) = rdm.queue.peek() else {
            return;
        };
        if !self.arbiter.try_begin_rdm(self.id) {
            return;
        }
        self.transport.clear_rx();
        let back = self.universe.back_mut();
        let wire_len = cmd.encode(back);
        // One trailing pad byte so the final transmit-empty event trails
        // the last real byte on the wire.
        back[wire_len] = 0x00;
        self.tx_size = wire_len + 1;
        log::debug!(
            "[rdm] port {} transacting {:?} ({} wire bytes)",
            self.id,
            cmd,
            wire_len
        );
        self.state = PortState::RdmStart;
    }

    fn enter_rdm_rx(&mut self) {
        if !self.arbiter.claim_receive(self.id) {
            // Another port holds the receive side; resolve as a timeout
            // with nothing captured rather than wedging.
            let now = self.clock.now_micros();
            self.finish_rdm(now);
            return;
        }
        self.transport.set_direction(LineDirection::Receive);
        let now = self.clock.now_micros();
        if let Some(rdm) = self.rdm.as_mut() {
            rdm.capture.clear();
            rdm.response_deadline_us = now + RDM_RESPONSE_WINDOW_US;
        }
        self.transport.arm_receive();
        self.state = PortState::RdmRx;
    }

    /// Close the response window: line back to transmit duty, arbiter
    /// released, and — unless RDM is paused — the head command popped and
    /// dispatched on whatever was captured.
    fn finish_rdm(&mut self, now_us: u64) {
        let paused = self.arbiter.rdm_paused();
        if !paused {
            // The window may have closed with bytes still in hardware.
            if let Some(rdm) = self.rdm.as_mut() {
                while let Some(byte) = self.transport.read() {
                    rdm.capture.feed(byte);
                }
            }
        }
        self.transport.disarm_receive();
        self.transport.clear_rx();
        self.transport.set_direction(LineDirection::Transmit);
        self.arbiter.release_receive(self.id);
        self.arbiter.end_rdm();
        self.state = PortState::Stop;

        if paused {
            // Quiesce without consuming the command; it goes out again on
            // resume.
            if let Some(rdm) = self.rdm.as_mut() {
                rdm.capture.clear();
            }
            return;
        }
        self.dispatch_rdm(now_us);
    }

    fn dispatch_rdm(&mut self, now_us: u64) {
        let Some(rdm) = self.rdm.as_mut() else {
            return;
        };
        let Some(cmd) = rdm.queue.pop() else {
            return;
        };
        let capture = rdm.capture.take();

        if cmd.command_class == CC_DISCOVERY_COMMAND {
            match cmd.pid {
                PID_DISC_UNIQUE_BRANCH => {
                    // Zero bytes is itself meaningful; always dispatch.
                    if rdm.discovery.on_branch_response(&cmd, &capture, now_us) {
                        if let Some(cb) = self.tod_cb.as_mut() {
                            cb();
                        }
                    }
                    return;
                }
                PID_DISC_MUTE => {
                    rdm.discovery.on_mute_response(&cmd, &capture);
                    return;
                }
                PID_DISC_UN_MUTE => {
                    // No response is ever expected.
                    return;
                }
                _ => {}
            }
        }

        if capture.is_empty() {
            // Timeout with nobody answering: resolved as empty, not an
            // error.
            log::debug!("[rdm] port {} transaction {} timed out", self.id, cmd.transaction);
            return;
        }
        match RdmPacket::decode(&capture) {
            Ok(packet) => {
                if let Some(cb) = self.rdm_cb.as_mut() {
                    cb(&packet);
                }
            }
            Err(err) => {
                // Collision or line garbage; dropped, never surfaced.
                log::debug!("[rdm] port {} dropping garbled response: {}", self.id, err);
            }
        }
    }

    // ========================================================================
    // DMX transmit pipeline
    // ========================================================================

    fn try_start_dmx(&mut self) {
        if !self.universe.started() {
            return;
        }
        let now = self.clock.now_micros();
        let size = if now >= self.full_universe_at_us {
            self.full_universe_at_us = now + DMX_FULL_UNIVERSE_MS * 1_000;
            DMX_UNIVERSE_SIZE
        } else {
            self.universe.num_chans() as usize
        };
        self.universe.snapshot(size);
        self.tx_size = size;
        self.state = PortState::DmxStart;
    }

    /// Physical frame start, shared by DMX and RDM: drain, break, mark,
    /// start code. The waits here are the one deliberately blocking part
    /// of the engine — level-hold times on the wire, bounded to a few
    /// hundred microseconds.
    fn start_frame(&mut self) {
        while self.transport.tx_pending() > 0 {
            std::hint::spin_loop();
        }
        // Let the final byte of the previous frame clear the shift
        // register before the line goes low.
        self.clock.busy_wait_micros(DMX_SLOT_TIME_US);
        self.transport.set_line_mode(LineMode::Break);
        self.clock.busy_wait_micros(self.break_us);
        self.transport.set_line_mode(LineMode::Mark);
        self.clock.busy_wait_micros(self.mab_us);
        self.transport.set_line_mode(LineMode::Uart);
        self.transport.clear_tx();

        match self.state {
            PortState::DmxStart => {
                self.state = PortState::DmxTx;
                self.tx_pos = 0;
                self.transport.write(SC_DMX);
            }
            PortState::RdmStart => {
                self.state = PortState::RdmTx;
                let guard = self.clock.now_micros() + RDM_TX_GUARD_US;
                if let Some(rdm) = self.rdm.as_mut() {
                    rdm.guard_deadline_us = guard;
                }
                // Slot 0 of the encoded wire image is the start code.
                self.tx_pos = 1;
                self.transport.write(SC_RDM);
            }
            _ => return,
        }
        self.fill_tx();
    }

    fn fill_tx(&mut self) {
        while self.tx_pos < self.tx_size && self.transport.tx_space() > 0 {
            self.transport.write(self.universe.back()[self.tx_pos]);
            self.tx_pos += 1;
        }
        self.transport.arm_transmit_empty();
    }

    // ========================================================================
    // Channel data API (network collaborator surface)
    // ========================================================================

    /// Merge channel data into the front buffer starting at 1-based
    /// channel `start`; the active channel count grows per the grow-only
    /// policy. Rejected while the port is in input mode.
    pub fn write_channels(&mut self, start: u16, data: &[u8]) -> Result<()> {
        if self.input {
            return Err(Error::InvalidState);
        }
        self.universe.write_channels(start, data)
    }

    /// Recompute the active channel count from a hint, with no new data.
    pub fn update_channel_count(&mut self, hint: u16) {
        if !self.input {
            self.universe.update_channel_count(hint);
        }
    }

    /// Zero the front buffer; the channel count falls back to its floor.
    pub fn clear_channels(&mut self) {
        self.universe.clear();
    }

    /// Current channel data (output: what the application wrote; input:
    /// the last completed received frame).
    pub fn channels(&self) -> &[u8] {
        self.universe.channels()
    }

    /// Active channel count.
    pub fn channel_count(&self) -> u16 {
        self.universe.num_chans()
    }

    // ========================================================================
    // Mode control
    // ========================================================================

    /// Current state, input mode reported through the receive states.
    pub fn state(&self) -> PortState {
        if self.input {
            match self.receiver.state() {
                RxState::Idle => PortState::RxIdle,
                RxState::Break => PortState::RxBreak,
                RxState::Data => PortState::RxData,
            }
        } else {
            self.state
        }
    }

    /// Quiesce the transmit side. Synchronous: the hardware queues are
    /// drained when this returns, so the caller can rely on an idle wire
    /// (e.g. to hand the window to a different output path).
    pub fn pause(&mut self) {
        self.transport.disarm_transmit_empty();
        while self.transport.tx_pending() > 0 {
            std::hint::spin_loop();
        }
        self.transport.clear_tx();
        self.paused = true;
    }

    /// Resume output after [`DmxPort::pause`].
    pub fn resume(&mut self) {
        self.paused = false;
        if !self.input {
            self.state = PortState::Stop;
        }
    }

    /// Switch DMX-input duty on or off.
    ///
    /// Entering claims the process-wide receive side (failing with
    /// [`Error::InvalidState`] if another port holds it), pauses RDM, and
    /// clears both channel buffers. Leaving releases everything, returns
    /// the port to output duty, and restarts full discovery on
    /// RDM-enabled ports.
    pub fn set_input(&mut self, input: bool) -> Result<()> {
        if input == self.input {
            return Ok(());
        }
        if input {
            self.arbiter.set_rdm_paused(true);
            self.transport.disarm_transmit_empty();
            if matches!(self.state, PortState::RdmTx | PortState::RdmRx) {
                let now = self.clock.now_micros();
                self.finish_rdm(now);
            }
            if !self.arbiter.claim_receive(self.id) {
                self.arbiter.set_rdm_paused(false);
                return Err(Error::InvalidState);
            }
            self.universe.reset();
            self.receiver.reset();
            self.transport.set_direction(LineDirection::Receive);
            self.transport.clear_rx();
            self.transport.arm_receive();
            self.input = true;
            self.state = PortState::Stop;
            log::debug!("[dmx_port] port {} entering input mode", self.id);
        } else {
            self.transport.disarm_receive();
            self.transport.clear_rx();
            self.transport.set_direction(LineDirection::Transmit);
            self.arbiter.release_receive(self.id);
            self.universe.reset();
            self.receiver.reset();
            self.input = false;
            self.state = PortState::Stop;
            self.arbiter.set_rdm_paused(false);
            if let Some(rdm) = self.rdm.as_mut() {
                rdm.discovery.start_full();
            }
            log::debug!("[dmx_port] port {} leaving input mode", self.id);
        }
        Ok(())
    }

    /// True while the port is in DMX-input duty.
    pub fn is_input(&self) -> bool {
        self.input
    }

    /// Tear the port down: disarm, drain, release every arbiter claim.
    /// Returns the front-buffer storage if the caller lent it at
    /// construction.
    pub fn shutdown(mut self) -> Option<Box<[u8; DMX_UNIVERSE_SIZE]>> {
        self.transport.disarm_transmit_empty();
        self.transport.disarm_receive();
        while self.transport.tx_pending() > 0 {
            std::hint::spin_loop();
        }
        self.transport.clear_tx();
        self.transport.clear_rx();
        if matches!(self.state, PortState::RdmTx | PortState::RdmRx) {
            self.arbiter.end_rdm();
        }
        self.arbiter.release_receive(self.id);
        if self.input {
            self.arbiter.set_rdm_paused(false);
        }
        self.universe.into_caller_storage()
    }

    // ========================================================================
    // RDM API
    // ========================================================================

    /// Enable RDM with `source` as the controller UID. Resets all
    /// transaction and discovery state and kicks a full discovery pass;
    /// a transaction in flight from a previous session is wound down
    /// first.
    pub fn rdm_enable(&mut self, source: Uid) -> Result<()> {
        if !self.direction_control {
            return Err(Error::DirectionControlRequired);
        }
        if self.input {
            return Err(Error::InvalidState);
        }
        self.abort_rdm_transaction();
        let mut session = RdmSession {
            source,
            trans_no: 0,
            queue: CommandQueue::new(),
            capture: ResponseCapture::new(),
            response_deadline_us: 0,
            guard_deadline_us: 0,
            discovery: DiscoveryEngine::new(),
        };
        session.discovery.start_full();
        self.rdm = Some(session);
        log::info!("[dmx_port] port {} RDM enabled, controller {}", self.id, source);
        Ok(())
    }

    /// Disable RDM, winding down any in-flight transaction.
    pub fn rdm_disable(&mut self) {
        self.abort_rdm_transaction();
        self.rdm = None;
    }

    /// Wind down an in-flight transaction without dispatching it: line
    /// back to transmit duty, arbiter claims released, port idle.
    fn abort_rdm_transaction(&mut self) {
        if matches!(
            self.state,
            PortState::RdmStart | PortState::RdmTx | PortState::RdmRx
        ) {
            self.transport.disarm_transmit_empty();
            self.transport.disarm_receive();
            self.transport.clear_rx();
            self.transport.set_direction(LineDirection::Transmit);
            self.arbiter.release_receive(self.id);
            self.arbiter.end_rdm();
            self.state = PortState::Stop;
        }
    }

    /// True while RDM is enabled.
    pub fn rdm_enabled(&self) -> bool {
        self.rdm.is_some()
    }

    /// Checksum, stamp, and enqueue an RDM command. [`Error::QueueFull`]
    /// is the backpressure signal: retry on a later tick.
    pub fn send_rdm(&mut self, mut cmd: RdmCommand) -> Result<()> {
        let Some(rdm) = self.rdm.as_mut() else {
            return Err(Error::InvalidState);
        };
        rdm.stamp(&mut cmd);
        if rdm.queue.push(cmd) {
            Ok(())
        } else {
            Err(Error::QueueFull)
        }
    }

    /// Set or clear the process-wide RDM pause. Pausing force-finishes a
    /// transaction in flight on *this* port (without consuming its
    /// command); other ports wind down on their next tick. Unpausing
    /// restarts full discovery.
    pub fn rdm_pause(&mut self, paused: bool) {
        if paused {
            self.arbiter.set_rdm_paused(true);
            if matches!(self.state, PortState::RdmTx | PortState::RdmRx) {
                self.transport.disarm_transmit_empty();
                let now = self.clock.now_micros();
                self.finish_rdm(now);
            }
        } else {
            if self.input {
                // Input mode owns the pause; it lifts on exit.
                return;
            }
            self.arbiter.set_rdm_paused(false);
            if let Some(rdm) = self.rdm.as_mut() {
                rdm.discovery.start_full();
            }
        }
    }

    /// Kick a discovery pass explicitly.
    pub fn discover(&mut self, mode: DiscoveryMode) -> Result<()> {
        let Some(rdm) = self.rdm.as_mut() else {
            return Err(Error::InvalidState);
        };
        rdm.discovery.start(mode);
        Ok(())
    }

    /// Snapshot of the table of discovered devices. The borrow ends at
    /// the next `tick`, which is exactly how long the snapshot stays
    /// valid.
    pub fn tod(&self) -> &[Uid] {
        self.rdm.as_ref().map_or(&[], |r| r.discovery.tod())
    }

    /// Number of confirmed devices.
    pub fn tod_count(&self) -> usize {
        self.rdm.as_ref().map_or(0, |r| r.discovery.tod_count())
    }

    /// True once discovery has converged on the current population.
    pub fn tod_ready(&self) -> bool {
        self.rdm.as_ref().is_some_and(|r| r.discovery.tod_ready())
    }

    /// Number of commands waiting in the RDM queue.
    pub fn rdm_queue_len(&self) -> usize {
        self.rdm.as_ref().map_or(0, |r| r.queue.len())
    }

    // ========================================================================
    // Callbacks
    // ========================================================================

    /// Called once per completed DMX input frame with its channel count;
    /// the frame is readable via [`DmxPort::channels`].
    pub fn set_frame_callback(&mut self, cb: impl FnMut(u16) + 'static) {
        self.frame_cb = Some(Box::new(cb));
    }

    /// Called once per resolved non-discovery RDM transaction that
    /// captured a checksum-valid response.
    pub fn set_rdm_callback(&mut self, cb: impl FnMut(&RdmPacket) + 'static) {
        self.rdm_cb = Some(Box::new(cb));
    }

    /// Called once per discovery convergence with a net TOD change.
    pub fn set_tod_callback(&mut self, cb: impl FnMut() + 'static) {
        self.tod_cb = Some(Box::new(cb));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::ManualClock;
    use crate::transport::sim::SimBus;

    fn port_on(bus: &SimBus, clock: &ManualClock) -> DmxPort<crate::transport::sim::SimTransport> {
        DmxPort::new(
            0,
            bus.controller(),
            Arc::new(BusArbiter::new()),
            Box::new(clock.clone()),
            PortConfig::default(),
        )
    }

    fn run(port: &mut DmxPort<crate::transport::sim::SimTransport>, clock: &ManualClock, ticks: usize) {
        for _ in 0..ticks {
            port.tick();
            clock.advance(500);
        }
    }

    #[test]
    fn test_idle_until_first_write() {
        let bus = SimBus::new();
        let clock = ManualClock::new();
        let mut port = port_on(&bus, &clock);
        run(&mut port, &clock, 5);
        assert!(bus.frames().is_empty());
        assert_eq!(port.state(), PortState::Stop);
    }

    #[test]
    fn test_first_frame_is_full_universe() {
        let bus = SimBus::new();
        let clock = ManualClock::new();
        let mut port = port_on(&bus, &clock);
        port.write_channels(10, &[1, 2, 3]).unwrap();
        run(&mut port, &clock, 3);

        let frames = bus.frames();
        let first = &frames[0];
        assert_eq!(first.len(), 513);
        assert_eq!(first[0], SC_DMX);
        assert_eq!(&first[10..13], &[1, 2, 3]);
    }

    #[test]
    fn test_steady_state_frames_carry_active_count() {
        let bus = SimBus::new();
        let clock = ManualClock::new();
        let mut port = port_on(&bus, &clock);
        port.write_channels(1, &[9; 40]).unwrap();
        run(&mut port, &clock, 4);

        let frames = bus.frames();
        assert!(frames.len() >= 2);
        // After the initial full-universe frame, frames shrink to the
        // active count plus the start code.
        let expected = port.channel_count() as usize + 1;
        assert_eq!(frames.last().unwrap().len(), expected);
    }

    #[test]
    fn test_framing_order() {
        let bus = SimBus::new();
        let clock = ManualClock::new();
        let mut port = port_on(&bus, &clock);
        port.write_channels(1, &[1]).unwrap();
        run(&mut port, &clock, 1);
        assert_eq!(
            bus.framing_log(),
            vec![LineMode::Break, LineMode::Mark, LineMode::Uart]
        );
    }

    #[test]
    fn test_snapshot_isolated_from_later_writes() {
        let bus = SimBus::new();
        let clock = ManualClock::new();
        let mut port = port_on(&bus, &clock);
        port.write_channels(1, &[5; 8]).unwrap();
        port.tick();
        // Mutate after the frame was snapshotted and sent; the next tick's
        // break closes the first frame on the wire.
        port.write_channels(1, &[7; 8]).unwrap();
        clock.advance(500);
        port.tick();
        let first = bus.frames()[0].clone();
        assert_eq!(&first[1..9], &[5; 8]);
    }

    #[test]
    fn test_pause_quiesces_and_resume_restarts() {
        let bus = SimBus::new();
        let clock = ManualClock::new();
        let mut port = port_on(&bus, &clock);
        port.write_channels(1, &[1]).unwrap();
        run(&mut port, &clock, 2);
        port.pause();
        let frames_at_pause = bus.frames().len();
        run(&mut port, &clock, 5);
        assert_eq!(bus.frames().len(), frames_at_pause);
        port.resume();
        run(&mut port, &clock, 2);
        assert!(bus.frames().len() > frames_at_pause);
    }

    #[test]
    fn test_rdm_requires_direction_control() {
        let bus = SimBus::new();
        let clock = ManualClock::new();
        let mut port = DmxPort::new(
            0,
            bus.controller(),
            Arc::new(BusArbiter::new()),
            Box::new(clock.clone()),
            PortConfig {
                direction_control: false,
                ..PortConfig::default()
            },
        );
        assert_eq!(
            port.rdm_enable(Uid::new(0x7FF0, 1)).unwrap_err(),
            Error::DirectionControlRequired
        );
    }

    #[test]
    fn test_reenable_rdm_winds_down_in_flight_transaction() {
        let bus = SimBus::new();
        let clock = ManualClock::new();
        let arbiter = Arc::new(BusArbiter::new());
        let mut port = DmxPort::new(
            0,
            bus.controller(),
            Arc::clone(&arbiter),
            Box::new(clock.clone()),
            PortConfig::default(),
        );
        port.rdm_enable(Uid::new(0x7FF0, 1)).unwrap();

        // Two ticks: the first frames and transmits the un-mute, the
        // second drains it and opens the response window.
        run(&mut port, &clock, 2);
        assert_eq!(port.state(), PortState::RdmRx);

        port.rdm_enable(Uid::new(0x7FF0, 2)).unwrap();
        assert_eq!(port.state(), PortState::Stop);
        assert!(!arbiter.rdm_in_progress());
        assert_eq!(arbiter.receive_owner(), None);
        assert_eq!(port.rdm_queue_len(), 0);

        // The fresh session's discovery starts over cleanly.
        run(&mut port, &clock, 60);
        assert!(port.tod_ready());
    }

    #[test]
    fn test_send_rdm_needs_enablement() {
        let bus = SimBus::new();
        let clock = ManualClock::new();
        let mut port = port_on(&bus, &clock);
        let cmd = RdmCommand::get(Uid::new(1, 1), 0x0060, &[]).unwrap();
        assert_eq!(port.send_rdm(cmd).unwrap_err(), Error::InvalidState);
    }

    #[test]
    fn test_input_mode_rejects_channel_writes() {
        let bus = SimBus::new();
        let clock = ManualClock::new();
        let mut port = port_on(&bus, &clock);
        port.set_input(true).unwrap();
        assert_eq!(port.state(), PortState::RxIdle);
        assert_eq!(
            port.write_channels(1, &[1]).unwrap_err(),
            Error::InvalidState
        );
        port.set_input(false).unwrap();
        assert!(port.write_channels(1, &[1]).is_ok());
    }

    #[test]
    fn test_input_mode_claims_receive_exclusively() {
        let arbiter = Arc::new(BusArbiter::new());
        let clock = ManualClock::new();
        let bus_a = SimBus::new();
        let bus_b = SimBus::new();
        let mut a = DmxPort::new(
            0,
            bus_a.controller(),
            Arc::clone(&arbiter),
            Box::new(clock.clone()),
            PortConfig::default(),
        );
        let mut b = DmxPort::new(
            1,
            bus_b.controller(),
            Arc::clone(&arbiter),
            Box::new(clock.clone()),
            PortConfig::default(),
        );
        a.set_input(true).unwrap();
        assert_eq!(b.set_input(true).unwrap_err(), Error::InvalidState);
        a.set_input(false).unwrap();
        assert!(b.set_input(true).is_ok());
    }

    #[test]
    fn test_shutdown_returns_caller_storage() {
        let bus = SimBus::new();
        let clock = ManualClock::new();
        let storage = crate::core::UniverseStorage::caller(Box::new([0; DMX_UNIVERSE_SIZE]));
        let mut port = DmxPort::new(
            0,
            bus.controller(),
            Arc::new(BusArbiter::new()),
            Box::new(clock.clone()),
            PortConfig {
                storage: Some(storage),
                ..PortConfig::default()
            },
        );
        port.write_channels(1, &[0xAB]).unwrap();
        let buf = port.shutdown().expect("caller storage handed back");
        assert_eq!(buf[0], 0xAB);
    }
}
