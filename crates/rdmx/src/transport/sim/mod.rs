// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-memory transceiver for tests and hardware-free development.
//!
//! [`SimBus`] models one DMX/RDM wire: a controller endpoint
//! ([`SimTransport`], the [`SerialTransport`] implementation handed to a
//! port) plus any number of attached responders. The wire is infinitely
//! fast — written bytes deliver immediately and `tx_pending` is always
//! zero — so tests exercise state-machine ordering, not serialization
//! delay.
//!
//! Frame boundaries follow the physical framing: driving
//! [`LineMode::Break`] closes the frame in progress. Turning the
//! direction to [`LineDirection::Receive`] hands the just-completed frame
//! to the responders; if two or more answer at once their bytes merge by
//! byte-wise AND, which is what a real bus does with open-collector-style
//! contention and exactly what makes collisions detectable.
//!
//! Tests inject inbound traffic directly with [`SimBus::inject_break`]
//! and [`SimBus::inject_bytes`].

mod device;

pub use device::SimRdmDevice;

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::DMX_BREAK_MIN_US;
use crate::transport::{LineDirection, LineMode, SerialEvent, SerialTransport};

/// Hardware FIFO depth the simulator reports; matches a common UART.
const SIM_FIFO_SIZE: usize = 128;

/// A responder's reply to a frame it saw on the wire.
#[derive(Debug, Clone)]
pub struct SimReply {
    /// Whether the device drives a break before its bytes (normal for
    /// mute/GET/SET responses; never for discovery responses).
    pub break_first: bool,
    /// Raw reply slots.
    pub bytes: Vec<u8>,
}

/// A device attached to the bus. Sees every completed frame once the
/// controller turns the line around to listen.
pub trait SimResponder: Send {
    /// React to a frame; `None` means stay silent.
    fn on_frame(&mut self, frame: &[u8]) -> Option<SimReply>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RxItem {
    Byte(u8),
    Break,
    FrameError,
}

struct BusCore {
    line_mode: LineMode,
    direction: LineDirection,
    tx_frame: Vec<u8>,
    frames: Vec<Vec<u8>>,
    rx: VecDeque<RxItem>,
    tx_empty_armed: bool,
    rx_armed: bool,
    framing_log: Vec<LineMode>,
    responders: Vec<Box<dyn SimResponder>>,
}

impl BusCore {
    fn finish_frame(&mut self) {
        if !self.tx_frame.is_empty() {
            self.frames.push(std::mem::take(&mut self.tx_frame));
        }
    }

    fn deliver_to_responders(&mut self) {
        let Some(frame) = self.frames.last().cloned() else {
            return;
        };
        let replies: Vec<SimReply> = self
            .responders
            .iter_mut()
            .filter_map(|r| r.on_frame(&frame))
            .collect();
        if replies.is_empty() {
            return;
        }
        if replies.iter().any(|r| r.break_first) {
            self.rx.push_back(RxItem::Break);
        }
        if replies.len() == 1 {
            for &b in &replies[0].bytes {
                self.rx.push_back(RxItem::Byte(b));
            }
            return;
        }
        // Collision: the wire sees the AND of all drive levels, idle
        // high (0xFF) where a shorter reply has already finished.
        log::warn!("[sim_bus] {} simultaneous replies, merging", replies.len());
        let longest = replies.iter().map(|r| r.bytes.len()).max().unwrap_or(0);
        let mut merged = vec![0xFFu8; longest];
        for reply in &replies {
            for (slot, &b) in merged.iter_mut().zip(reply.bytes.iter()) {
                *slot &= b;
            }
        }
        for b in merged {
            self.rx.push_back(RxItem::Byte(b));
        }
    }
}

/// Cloneable handle to one simulated wire.
#[derive(Clone)]
pub struct SimBus {
    core: Arc<Mutex<BusCore>>,
}

impl SimBus {
    /// Fresh bus with no responders and an idle line.
    pub fn new() -> Self {
        SimBus {
            core: Arc::new(Mutex::new(BusCore {
                line_mode: LineMode::Uart,
                direction: LineDirection::Transmit,
                tx_frame: Vec::new(),
                frames: Vec::new(),
                rx: VecDeque::new(),
                tx_empty_armed: false,
                rx_armed: false,
                framing_log: Vec::new(),
                responders: Vec::new(),
            })),
        }
    }

    /// The controller endpoint to hand to a [`crate::engine::DmxPort`].
    pub fn controller(&self) -> SimTransport {
        SimTransport {
            core: Arc::clone(&self.core),
        }
    }

    /// Attach a responder to the wire.
    pub fn attach(&self, responder: impl SimResponder + 'static) {
        self.core.lock().responders.push(Box::new(responder));
    }

    /// Every frame the controller has completed so far (bytes between
    /// breaks, start code first).
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.core.lock().frames.clone()
    }

    /// Take and clear the completed-frame record.
    pub fn take_frames(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.core.lock().frames)
    }

    /// The most recently completed frame.
    pub fn last_frame(&self) -> Option<Vec<u8>> {
        self.core.lock().frames.last().cloned()
    }

    /// Line-mode transitions in the order the controller drove them.
    pub fn framing_log(&self) -> Vec<LineMode> {
        self.core.lock().framing_log.clone()
    }

    /// Present a break of `duration_us` to the controller's receive side:
    /// a [`SerialEvent::Break`] at or above the recognition minimum, a
    /// [`SerialEvent::FrameError`] below it.
    pub fn inject_break(&self, duration_us: u64) {
        let item = if duration_us >= DMX_BREAK_MIN_US {
            RxItem::Break
        } else {
            RxItem::FrameError
        };
        self.core.lock().rx.push_back(item);
    }

    /// Present raw inbound bytes to the controller's receive side.
    pub fn inject_bytes(&self, bytes: &[u8]) {
        let mut core = self.core.lock();
        for &b in bytes {
            core.rx.push_back(RxItem::Byte(b));
        }
    }
}

impl Default for SimBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Controller endpoint of a [`SimBus`].
pub struct SimTransport {
    core: Arc<Mutex<BusCore>>,
}

impl SerialTransport for SimTransport {
    fn arm_transmit_empty(&mut self) {
        self.core.lock().tx_empty_armed = true;
    }

    fn disarm_transmit_empty(&mut self) {
        self.core.lock().tx_empty_armed = false;
    }

    fn arm_receive(&mut self) {
        self.core.lock().rx_armed = true;
    }

    fn disarm_receive(&mut self) {
        self.core.lock().rx_armed = false;
    }

    fn tx_pending(&self) -> usize {
        // Infinite-speed wire: writes hit the wire immediately.
        0
    }

    fn tx_space(&self) -> usize {
        SIM_FIFO_SIZE
    }

    fn write(&mut self, byte: u8) {
        self.core.lock().tx_frame.push(byte);
    }

    fn read(&mut self) -> Option<u8> {
        let mut core = self.core.lock();
        match core.rx.front() {
            Some(RxItem::Byte(_)) => match core.rx.pop_front() {
                Some(RxItem::Byte(b)) => Some(b),
                _ => None,
            },
            // A break marker ends the readable run; poll() reports it.
            _ => None,
        }
    }

    fn clear_tx(&mut self) {
        // Nothing ever sits in the transmit queue at infinite wire speed.
    }

    fn clear_rx(&mut self) {
        self.core.lock().rx.clear();
    }

    fn set_line_mode(&mut self, mode: LineMode) {
        let mut core = self.core.lock();
        core.framing_log.push(mode);
        if mode == LineMode::Break {
            core.finish_frame();
        }
        core.line_mode = mode;
    }

    fn set_direction(&mut self, direction: LineDirection) {
        let mut core = self.core.lock();
        if direction == LineDirection::Receive && core.direction == LineDirection::Transmit {
            // Line turnaround: the frame is done, responders get to see
            // it and answer.
            core.finish_frame();
            core.deliver_to_responders();
        }
        core.direction = direction;
    }

    fn poll(&mut self) -> Option<SerialEvent> {
        let mut core = self.core.lock();
        if core.rx_armed {
            match core.rx.front() {
                Some(RxItem::Break) => {
                    core.rx.pop_front();
                    return Some(SerialEvent::Break);
                }
                Some(RxItem::FrameError) => {
                    core.rx.pop_front();
                    return Some(SerialEvent::FrameError);
                }
                Some(RxItem::Byte(_)) => return Some(SerialEvent::ReceiveReady),
                None => {}
            }
        }
        if core.tx_empty_armed {
            return Some(SerialEvent::TransmitEmpty);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_break_closes_frame() {
        let bus = SimBus::new();
        let mut t = bus.controller();
        t.write(0x00);
        t.write(0x12);
        t.set_line_mode(LineMode::Break);
        t.set_line_mode(LineMode::Mark);
        t.set_line_mode(LineMode::Uart);
        assert_eq!(bus.frames(), vec![vec![0x00, 0x12]]);
        assert_eq!(
            bus.framing_log(),
            vec![LineMode::Break, LineMode::Mark, LineMode::Uart]
        );
    }

    #[test]
    fn test_events_respect_arming() {
        let bus = SimBus::new();
        let mut t = bus.controller();
        bus.inject_bytes(&[0xAB]);
        // Unarmed: nothing reported, but the byte is still readable.
        assert_eq!(t.poll(), None);
        t.arm_receive();
        assert_eq!(t.poll(), Some(SerialEvent::ReceiveReady));
        assert_eq!(t.read(), Some(0xAB));
        assert_eq!(t.read(), None);
        assert_eq!(t.poll(), None);
    }

    #[test]
    fn test_break_marker_stops_read_run() {
        let bus = SimBus::new();
        let mut t = bus.controller();
        t.arm_receive();
        bus.inject_bytes(&[1, 2]);
        bus.inject_break(120);
        bus.inject_bytes(&[3]);

        assert_eq!(t.poll(), Some(SerialEvent::ReceiveReady));
        assert_eq!(t.read(), Some(1));
        assert_eq!(t.read(), Some(2));
        // The break marker blocks further reads until polled out.
        assert_eq!(t.read(), None);
        assert_eq!(t.poll(), Some(SerialEvent::Break));
        assert_eq!(t.read(), Some(3));
    }

    #[test]
    fn test_short_break_is_frame_error() {
        let bus = SimBus::new();
        let mut t = bus.controller();
        t.arm_receive();
        bus.inject_break(50);
        assert_eq!(t.poll(), Some(SerialEvent::FrameError));
    }

    #[test]
    fn test_transmit_empty_while_armed() {
        let bus = SimBus::new();
        let mut t = bus.controller();
        assert_eq!(t.poll(), None);
        t.arm_transmit_empty();
        assert_eq!(t.poll(), Some(SerialEvent::TransmitEmpty));
        t.disarm_transmit_empty();
        assert_eq!(t.poll(), None);
    }

    struct Echo(Vec<u8>);
    impl SimResponder for Echo {
        fn on_frame(&mut self, _frame: &[u8]) -> Option<SimReply> {
            Some(SimReply {
                break_first: false,
                bytes: self.0.clone(),
            })
        }
    }

    #[test]
    fn test_turnaround_delivers_frame_and_reply() {
        let bus = SimBus::new();
        bus.attach(Echo(vec![0x55, 0x66]));
        let mut t = bus.controller();
        t.write(0xCC);
        t.write(0x01);
        t.set_direction(LineDirection::Receive);
        t.arm_receive();
        assert_eq!(bus.last_frame(), Some(vec![0xCC, 0x01]));
        assert_eq!(t.poll(), Some(SerialEvent::ReceiveReady));
        assert_eq!(t.read(), Some(0x55));
        assert_eq!(t.read(), Some(0x66));
    }

    #[test]
    fn test_collision_merges_by_and() {
        let bus = SimBus::new();
        bus.attach(Echo(vec![0xF0, 0xFF]));
        bus.attach(Echo(vec![0x0F]));
        let mut t = bus.controller();
        t.write(0xCC);
        t.set_direction(LineDirection::Receive);
        t.arm_receive();
        assert_eq!(t.read(), Some(0x00));
        // Second slot: only the longer reply drives; the other idles high.
        assert_eq!(t.read(), Some(0xFF));
    }
}
