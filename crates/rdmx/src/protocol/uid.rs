// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! 48-bit RDM unique identifier (E1.20 Sec.3.2).
//!
//! Every RDM responder carries a UID: a 16-bit ESTA manufacturer ID
//! followed by a 32-bit device ID. On the wire it travels as 6 big-endian
//! bytes; as a number it orders the discovery binary search.

/// RDM device identifier: manufacturer ID + device ID.
///
/// Ordering is numeric over the packed 48-bit value, which is exactly the
/// order `DISC_UNIQUE_BRANCH` ranges are expressed in.
///
/// # Examples
///
/// ```rust
/// use rdmx::protocol::Uid;
///
/// let uid = Uid::new(0x02B0, 0x0001_0203);
/// assert_eq!(uid.to_string(), "02b0:00010203");
/// assert_eq!(Uid::from_bytes(uid.to_bytes()), uid);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uid {
    /// ESTA manufacturer ID.
    pub manufacturer: u16,
    /// Manufacturer-scoped device ID.
    pub device: u32,
}

impl Uid {
    /// All-ones UID addressing every device (E1.20 Sec.5.5).
    pub const BROADCAST: Uid = Uid {
        manufacturer: 0xFFFF,
        device: 0xFFFF_FFFF,
    };

    /// Numerically smallest UID, lower bound of the full discovery range.
    pub const ZERO: Uid = Uid {
        manufacturer: 0,
        device: 0,
    };

    /// Largest assignable 48-bit value, upper bound of the full discovery
    /// range. Identical bytes to [`Uid::BROADCAST`]; kept separate so range
    /// code reads as arithmetic, not addressing.
    pub const MAX: u64 = 0xFFFF_FFFF_FFFF;

    /// Build from manufacturer and device IDs.
    pub const fn new(manufacturer: u16, device: u32) -> Self {
        Uid {
            manufacturer,
            device,
        }
    }

    /// Pack into the 48-bit numeric value used by discovery range math.
    pub const fn to_u64(self) -> u64 {
        ((self.manufacturer as u64) << 32) | self.device as u64
    }

    /// Unpack from a 48-bit numeric value (upper 16 bits ignored).
    pub const fn from_u64(value: u64) -> Self {
        Uid {
            manufacturer: ((value >> 32) & 0xFFFF) as u16,
            device: (value & 0xFFFF_FFFF) as u32,
        }
    }

    /// Wire form: 6 big-endian bytes, manufacturer first.
    pub fn to_bytes(self) -> [u8; 6] {
        let m = self.manufacturer.to_be_bytes();
        let d = self.device.to_be_bytes();
        [m[0], m[1], d[0], d[1], d[2], d[3]]
    }

    /// Parse the 6-byte wire form.
    pub fn from_bytes(bytes: [u8; 6]) -> Self {
        Uid {
            manufacturer: u16::from_be_bytes([bytes[0], bytes[1]]),
            device: u32::from_be_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]),
        }
    }

    /// True for the all-ones broadcast address.
    pub fn is_broadcast(self) -> bool {
        self == Uid::BROADCAST
    }
}

impl std::fmt::Display for Uid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04x}:{:08x}", self.manufacturer, self.device)
    }
}
