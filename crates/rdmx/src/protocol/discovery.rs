// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Discovery branch arithmetic and the masked DISC_UNIQUE_BRANCH response.
//!
//! # Response format (E1.20 Sec.7.5)
//!
//! A lone unmuted responder inside the queried range answers without a
//! break, as raw slots:
//!
//! ```text
//! +--------------+------+------------------------+------------------+
//! | 0xFE x 1..7  | 0xAA | masked UID (12 bytes)  | masked sum (4)   |
//! +--------------+------+------------------------+------------------+
//! ```
//!
//! Each UID byte `b` travels twice, as `b | 0xAA` then `b | 0x55`; AND-ing
//! the pair recovers `b`, and any bus collision breaks the redundancy in a
//! way the trailing checksum (16-bit sum of the 12 *masked* bytes) almost
//! surely catches. Two devices answering at once therefore decode to
//! "garbled", which is precisely the signal to split the range.

use crate::protocol::checksum16;
use crate::protocol::constants::{DISC_PREAMBLE, DISC_RESPONSE_PAYLOAD, DISC_SEPARATOR};
use crate::protocol::uid::Uid;

/// Inclusive sub-range `[lower, upper]` of the 48-bit UID space.
///
/// Consumed once per DISC_UNIQUE_BRANCH query; a garbled reply splits it at
/// the numeric midpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryBranch {
    /// Lowest UID in range.
    pub lower: Uid,
    /// Highest UID in range.
    pub upper: Uid,
}

impl DiscoveryBranch {
    /// The whole UID space, `[0, 2^48 - 1]`.
    pub fn full() -> Self {
        DiscoveryBranch {
            lower: Uid::ZERO,
            upper: Uid::from_u64(Uid::MAX),
        }
    }

    /// Branch over an explicit range.
    pub fn new(lower: Uid, upper: Uid) -> Self {
        DiscoveryBranch { lower, upper }
    }

    /// True when this branch spans the entire UID space. An empty reply to
    /// the full range is the discovery convergence signal.
    pub fn is_full_range(&self) -> bool {
        self.lower == Uid::ZERO && self.upper.to_u64() == Uid::MAX
    }

    /// True when the bounds differ only in the final bit: splitting further
    /// would produce single-address queries, so discovery probes with a
    /// direct DISC_MUTE instead.
    pub fn is_leaf(&self) -> bool {
        self.upper.to_u64().saturating_sub(self.lower.to_u64()) <= 1
    }

    /// Split at the numeric midpoint into `[lower, mid]` and
    /// `[mid + 1, upper]`. Caller must not split a leaf.
    pub fn split(&self) -> (DiscoveryBranch, DiscoveryBranch) {
        let lo = self.lower.to_u64();
        let hi = self.upper.to_u64();
        debug_assert!(hi > lo + 1);
        let mid = lo + (hi - lo) / 2;
        (
            DiscoveryBranch::new(self.lower, Uid::from_u64(mid)),
            DiscoveryBranch::new(Uid::from_u64(mid + 1), self.upper),
        )
    }
}

impl std::fmt::Display for DiscoveryBranch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.lower, self.upper)
    }
}

/// Encode the masked response a responder with `uid` sends, preceded by
/// `preamble` filler bytes (1..=7 on real hardware).
pub fn encode_discovery_response(uid: Uid, preamble: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(preamble + 1 + DISC_RESPONSE_PAYLOAD);
    out.resize(preamble, DISC_PREAMBLE);
    out.push(DISC_SEPARATOR);

    let mut masked = [0u8; 12];
    for (i, b) in uid.to_bytes().iter().enumerate() {
        masked[i * 2] = b | 0xAA;
        masked[i * 2 + 1] = b | 0x55;
    }
    out.extend_from_slice(&masked);

    let sum = checksum16(&masked);
    let hi = (sum >> 8) as u8;
    let lo = (sum & 0xFF) as u8;
    out.extend_from_slice(&[hi | 0xAA, hi | 0x55, lo | 0xAA, lo | 0x55]);
    out
}

/// Decode a captured DISC_UNIQUE_BRANCH reply.
///
/// Returns the responder's UID for a clean single-device answer, `None` for
/// anything garbled — wrong preamble, short capture, or checksum mismatch.
/// Garble is not an error: it is the collision signal that drives the
/// branch split.
///
/// Accepts any run of preamble bytes (at least one) before the separator,
/// and ignores bytes past the 16-byte masked payload.
pub fn decode_discovery_response(bytes: &[u8]) -> Option<Uid> {
    let fill = bytes.iter().take_while(|&&b| b == DISC_PREAMBLE).count();
    if fill == 0 {
        return None;
    }
    let rest = &bytes[fill..];
    if rest.first() != Some(&DISC_SEPARATOR) {
        return None;
    }
    let payload = &rest[1..];
    if payload.len() < DISC_RESPONSE_PAYLOAD {
        return None;
    }

    let masked = &payload[..12];
    let mut uid_bytes = [0u8; 6];
    for (i, pair) in masked.chunks_exact(2).enumerate() {
        uid_bytes[i] = pair[0] & pair[1];
    }

    let stated_hi = payload[12] & payload[13];
    let stated_lo = payload[14] & payload[15];
    let stated = u16::from_be_bytes([stated_hi, stated_lo]);
    if stated != checksum16(masked) {
        return None;
    }
    Some(Uid::from_bytes(uid_bytes))
}
