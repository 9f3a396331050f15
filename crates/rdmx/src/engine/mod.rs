// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Port state machines: DMX transmit, DMX receive, RDM transactions, and
//! discovery, multiplexed over one transceiver.
//!
//! [`DmxPort`] is the entry point. Its [`DmxPort::tick`] is the
//! cooperative task-context poll that owns every state transition; the
//! transport event pump inside it is the interrupt-context analogue and
//! only ever moves bytes.

pub mod discovery;
pub mod port;
pub mod rdm;
pub mod receiver;

pub use discovery::{DiscoveryEngine, DiscoveryMode};
pub use port::{DmxPort, PortState};
pub use rdm::ResponseCapture;
pub use receiver::{DmxReceiver, RxState};
