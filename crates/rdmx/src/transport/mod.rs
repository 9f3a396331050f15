// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Serial transceiver abstraction.
//!
//! One trait, [`SerialTransport`], stands in for the UART the engine
//! drives. It is a capability, not a state machine: byte-level push/pop,
//! queue control, line framing, and an event pump — no protocol knowledge.
//! The port state machines in [`crate::engine`] are written against this
//! trait only, so platform code implements it once per hardware instance
//! and the engine never duplicates per-instance handlers.
//!
//! [`sim`] provides an in-memory implementation with attachable RDM
//! responder devices for tests and development without hardware.

pub mod sim;

/// Events the transport surfaces to the engine, drained one at a time via
/// [`SerialTransport::poll`].
///
/// Implementations clear the underlying hardware status synchronously
/// with the event they report, so a handled event does not re-trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialEvent {
    /// Transmit queue fell below its threshold; more bytes fit.
    TransmitEmpty,
    /// At least one received byte is waiting in the hardware queue.
    ReceiveReady,
    /// A valid break (>= the recognition minimum) was detected on the
    /// line.
    Break,
    /// A framing error: a too-short break or line noise.
    FrameError,
}

/// Physical line state driven during frame framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineMode {
    /// Normal UART operation (8N2 at 250 kbaud).
    Uart,
    /// Line held low: the break preceding a frame.
    Break,
    /// Line held high: mark-after-break.
    Mark,
}

/// RS-485 direction pin state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineDirection {
    /// Driving the wire.
    Transmit,
    /// Listening; required for RDM response capture and DMX input.
    Receive,
}

/// Interrupt-driven byte pump for one physical transceiver.
///
/// Everything here must be non-blocking; the one place the engine waits
/// on the transport is the frame-start poll of [`tx_pending`], bounded to
/// microseconds by the line rate.
///
/// [`tx_pending`]: SerialTransport::tx_pending
pub trait SerialTransport {
    /// Start reporting [`SerialEvent::TransmitEmpty`].
    fn arm_transmit_empty(&mut self);

    /// Stop reporting [`SerialEvent::TransmitEmpty`].
    fn disarm_transmit_empty(&mut self);

    /// Start reporting receive-side events (`ReceiveReady`, `Break`,
    /// `FrameError`).
    fn arm_receive(&mut self);

    /// Stop reporting receive-side events.
    fn disarm_receive(&mut self);

    /// Bytes still queued toward the wire in hardware. The frame-start
    /// sequence polls this to zero before pulling the line low.
    fn tx_pending(&self) -> usize;

    /// Free slots in the hardware transmit queue.
    fn tx_space(&self) -> usize;

    /// Queue one byte toward the wire. Callers check [`tx_space`] first;
    /// a byte written without room may be dropped by hardware.
    ///
    /// [`tx_space`]: SerialTransport::tx_space
    fn write(&mut self, byte: u8);

    /// Pop one received byte, or `None` when the queue is empty. Works
    /// whether or not receive events are armed (used to drain the tail of
    /// a response after disarming).
    fn read(&mut self) -> Option<u8>;

    /// Discard everything in the hardware transmit queue. Mode
    /// transitions only.
    fn clear_tx(&mut self);

    /// Discard everything in the hardware receive queue, pending events
    /// included. Mode transitions only.
    fn clear_rx(&mut self);

    /// Drive the physical line state (break / mark / UART).
    fn set_line_mode(&mut self, mode: LineMode);

    /// Drive the RS-485 direction pin. Implementations without direction
    /// control treat this as a no-op.
    fn set_direction(&mut self, direction: LineDirection);

    /// Drain one pending event, honoring the arm/disarm state. Returns
    /// `None` when nothing armed is pending.
    fn poll(&mut self) -> Option<SerialEvent>;
}
