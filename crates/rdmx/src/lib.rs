// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # rdmx - Real-time DMX512/RDM protocol engine
//!
//! A pure Rust implementation of the ANSI E1.11 (DMX512-A) transmit/receive
//! pipelines and the ANSI E1.20 (RDM) transaction and discovery protocols,
//! written for lighting controllers that multiplex channel data and device
//! management over one RS-485 wire per port.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use rdmx::core::BusArbiter;
//! use rdmx::engine::DmxPort;
//! use rdmx::time::ManualClock;
//! use rdmx::transport::sim::SimBus;
//! use rdmx::{PortConfig, Result};
//!
//! fn main() -> Result<()> {
//!     // A simulated wire; hardware ports implement SerialTransport instead.
//!     let bus = SimBus::new();
//!     let clock = ManualClock::new();
//!     let mut port = DmxPort::new(
//!         0,
//!         bus.controller(),
//!         Arc::new(BusArbiter::new()),
//!         Box::new(clock.clone()),
//!         PortConfig::default(),
//!     );
//!
//!     // Write channel data; the tick loop frames and transmits it.
//!     port.write_channels(1, &[255, 128, 0])?;
//!     for _ in 0..3 {
//!         port.tick();
//!         clock.advance(500);
//!     }
//!     assert!(!bus.frames().is_empty());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                        Application Layer                            |
//! |   write_channels / send_rdm / discover / callbacks                  |
//! +---------------------------------------------------------------------+
//! |                         Engine Layer                                |
//! |   DmxPort tick | DmxReceiver | RDM transactions | DiscoveryEngine   |
//! +---------------------------------------------------------------------+
//! |                          Core Layer                                 |
//! |   Universe (double buffer) | CommandQueue | DeviceTable | Arbiter   |
//! +---------------------------------------------------------------------+
//! |                        Protocol Layer                               |
//! |   RdmCommand / RdmPacket codecs | UIDs | discovery responses        |
//! +---------------------------------------------------------------------+
//! |                       Transport Layer                               |
//! |   SerialTransport trait | simulated bus with RDM responders         |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`engine::DmxPort`] | One physical port; owns every state machine |
//! | [`transport::SerialTransport`] | The UART capability platform code implements |
//! | [`core::Universe`] | Double-buffered 512-channel frame store |
//! | [`protocol::RdmCommand`] | Outbound RDM request builder and encoder |
//! | [`protocol::Uid`] | 48-bit E1.20 device identifier |
//! | [`time::Clock`] | Microsecond time source; manual in tests |
//!
//! ## Concurrency model
//!
//! Each port is single-threaded by construction: every state transition
//! happens inside [`engine::DmxPort::tick`], and the transport event pump
//! within it only moves bytes. Cross-port coordination (one receive path,
//! one RDM transaction in flight) goes through the shared
//! [`core::BusArbiter`].
//!
//! ## Modules Overview
//!
//! - [`engine`] - Port state machines (start here)
//! - [`protocol`] - E1.20 wire formats and codecs
//! - [`core`] - Buffers, queues, and arbitration
//! - [`transport`] - The transceiver trait and the simulated bus
//! - [`config`] - Timing constants and per-port options
//! - [`time`] - Clock trait with system and manual implementations
//!
//! ## See Also
//!
//! - ANSI E1.11 (DMX512-A), Entertainment Technology - USITT DMX512-A
//! - ANSI E1.20 (RDM), Remote Device Management over DMX512 Networks

#![warn(missing_docs)]
#![deny(unsafe_code)]

/// Timing constants and per-port build options.
pub mod config;
/// Shared building blocks (universe buffers, command queue, TOD, arbiter).
pub mod core;
/// Port state machines: DMX TX/RX, RDM transactions, discovery.
pub mod engine;
/// Wire formats: packets, UIDs, discovery responses, checksums.
pub mod protocol;
/// Monotonic microsecond clock and the framing wait primitive.
pub mod time;
/// Serial transceiver abstraction and the in-memory simulated bus.
pub mod transport;

mod error;

pub use config::PortConfig;
pub use engine::{DiscoveryMode, DmxPort, PortState};
pub use error::{Error, Result};
pub use protocol::{RdmCommand, RdmPacket, Uid};

/// rdmx version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
