// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire formats: RDM packets, UIDs, discovery responses, checksums.
//!
//! Everything in this module is pure data transformation — no I/O, no
//! state machines. The engine layers ([`crate::engine`]) drive these
//! encoders and decoders from the task tick; the simulated responders in
//! [`crate::transport::sim`] reuse the same code from the other side of
//! the wire.

pub mod command;
pub mod constants;
pub mod discovery;
pub mod packet;
pub mod uid;

pub use command::RdmCommand;
pub use discovery::{decode_discovery_response, encode_discovery_response, DiscoveryBranch};
pub use packet::{DecodeError, RdmPacket};
pub use uid::Uid;

/// 16-bit additive checksum used throughout E1.20: the sum of all bytes,
/// modulo 65536.
///
/// Used for both the packet trailer and the discovery-response masked
/// checksum. Wrapping addition on `u16` is exactly the mod-65536 the
/// standard asks for.
pub fn checksum16(bytes: &[u8]) -> u16 {
    bytes
        .iter()
        .fold(0u16, |sum, &b| sum.wrapping_add(u16::from(b)))
}
