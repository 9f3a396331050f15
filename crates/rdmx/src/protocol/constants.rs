// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RDM protocol constants (ANSI E1.20-2010)
//!
//! Centralizes the E1.20 magic numbers — start codes, command classes,
//! discovery PIDs, response types, packet offsets and sizes — so no parser
//! or encoder carries its own copies.
//!
//! # Packet layout
//!
//! Offsets below index the wire image of a request or response packet
//! starting at the RDM start code:
//!
//! ```text
//! +------+------+------+---------------+---------------+----------+
//! | 0xCC | 0x01 | Len  | Dest UID (6)  | Source UID(6) | TransNo  |
//! +------+------+------+---------------+---------------+----------+
//! | Port/Resp | MsgCnt | SubDev (2) | CC | PID (2) | PDL | PD ... |
//! +-----------+--------+------------+----+---------+-----+--------+
//! | Checksum (2, big-endian, sum mod 65536 of all prior bytes)    |
//! +---------------------------------------------------------------+
//! ```
//!
//! `Len` counts every byte from the start code up to but excluding the
//! checksum, i.e. `24 + PDL`.

/// DMX512 null start code: an ordinary channel-data frame (E1.11 Sec.8.5.2).
pub const SC_DMX: u8 = 0x00;

/// RDM start code (E1.20 Sec.5): first slot of every RDM packet.
pub const SC_RDM: u8 = 0xCC;

/// RDM sub-start code (E1.20 Sec.5.1): second slot of every RDM packet.
pub const SC_SUB_MESSAGE: u8 = 0x01;

/// Preamble byte of a discovery response (E1.20 Sec.7.5): devices send up
/// to seven of these ahead of the separator.
pub const DISC_PREAMBLE: u8 = 0xFE;

/// Preamble separator of a discovery response (E1.20 Sec.7.5).
pub const DISC_SEPARATOR: u8 = 0xAA;

// ============================================================================
// Command classes (E1.20 Table A-1)
// ============================================================================

/// DISCOVERY_COMMAND class.
pub const CC_DISCOVERY_COMMAND: u8 = 0x10;
/// DISCOVERY_COMMAND_RESPONSE class.
pub const CC_DISCOVERY_COMMAND_RESPONSE: u8 = 0x11;
/// GET_COMMAND class.
pub const CC_GET_COMMAND: u8 = 0x20;
/// GET_COMMAND_RESPONSE class.
pub const CC_GET_COMMAND_RESPONSE: u8 = 0x21;
/// SET_COMMAND class.
pub const CC_SET_COMMAND: u8 = 0x30;
/// SET_COMMAND_RESPONSE class.
pub const CC_SET_COMMAND_RESPONSE: u8 = 0x31;

// ============================================================================
// Discovery parameter IDs (E1.20 Table A-3)
// ============================================================================

/// DISC_UNIQUE_BRANCH: query a UID sub-range; unmuted devices in range
/// answer with the masked-UID response.
pub const PID_DISC_UNIQUE_BRANCH: u16 = 0x0001;
/// DISC_MUTE: silence one device for subsequent branch queries. The ACK
/// doubles as the device-present confirmation.
pub const PID_DISC_MUTE: u16 = 0x0002;
/// DISC_UN_MUTE: lift mutes; broadcast before a fresh scan. No response.
pub const PID_DISC_UN_MUTE: u16 = 0x0003;

// ============================================================================
// Response types (E1.20 Table A-2)
// ============================================================================

/// RESPONSE_TYPE_ACK.
pub const RESPONSE_TYPE_ACK: u8 = 0x00;
/// RESPONSE_TYPE_ACK_TIMER.
pub const RESPONSE_TYPE_ACK_TIMER: u8 = 0x01;
/// RESPONSE_TYPE_NACK_REASON.
pub const RESPONSE_TYPE_NACK_REASON: u8 = 0x02;
/// RESPONSE_TYPE_ACK_OVERFLOW.
pub const RESPONSE_TYPE_ACK_OVERFLOW: u8 = 0x03;

/// Port ID byte carried in request packets (response packets reuse the
/// slot as the response type).
pub const DEFAULT_PORT_ID: u8 = 0x01;

// ============================================================================
// Packet geometry
// ============================================================================

/// Bytes from start code through PDL inclusive: the fixed header.
pub const RDM_HEADER_SIZE: usize = 24;

/// Trailing checksum width.
pub const RDM_CHECKSUM_SIZE: usize = 2;

/// Largest parameter-data payload a packet may carry (E1.20 Sec.6.2.3).
pub const RDM_MAX_PARAMETER_DATA: usize = 231;

/// Smallest complete packet: header + checksum, zero parameter data.
pub const RDM_MIN_PACKET_SIZE: usize = RDM_HEADER_SIZE + RDM_CHECKSUM_SIZE;

/// Largest complete packet: header + 231 bytes of data + checksum.
pub const RDM_MAX_PACKET_SIZE: usize = RDM_HEADER_SIZE + RDM_MAX_PARAMETER_DATA + RDM_CHECKSUM_SIZE;

/// Masked payload of a discovery response after the separator: 12 UID
/// bytes plus 4 checksum bytes.
pub const DISC_RESPONSE_PAYLOAD: usize = 16;

// Wire offsets into an RDM packet (from the start code).
/// Offset of the message-length byte.
pub const OFS_MESSAGE_LENGTH: usize = 2;
/// Offset of the destination UID.
pub const OFS_DEST_UID: usize = 3;
/// Offset of the source UID.
pub const OFS_SOURCE_UID: usize = 9;
/// Offset of the transaction number.
pub const OFS_TRANSACTION: usize = 15;
/// Offset of the port-id / response-type byte.
pub const OFS_PORT_OR_RESPONSE: usize = 16;
/// Offset of the message count.
pub const OFS_MESSAGE_COUNT: usize = 17;
/// Offset of the sub-device field.
pub const OFS_SUB_DEVICE: usize = 18;
/// Offset of the command class.
pub const OFS_COMMAND_CLASS: usize = 20;
/// Offset of the parameter ID.
pub const OFS_PID: usize = 21;
/// Offset of the parameter-data length.
pub const OFS_PDL: usize = 23;
/// Offset of the parameter data itself.
pub const OFS_PARAMETER_DATA: usize = 24;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_codes() {
        assert_eq!(SC_DMX, 0x00);
        assert_eq!(SC_RDM, 0xCC);
        assert_eq!(SC_SUB_MESSAGE, 0x01);
    }

    #[test]
    fn test_packet_geometry() {
        assert_eq!(RDM_MIN_PACKET_SIZE, 26);
        assert_eq!(RDM_MAX_PACKET_SIZE, 257);
        // PDL sits in the last header slot.
        assert_eq!(OFS_PDL + 1, RDM_HEADER_SIZE);
        assert_eq!(OFS_PARAMETER_DATA, RDM_HEADER_SIZE);
    }

    #[test]
    fn test_discovery_pids_distinct() {
        assert_ne!(PID_DISC_UNIQUE_BRANCH, PID_DISC_MUTE);
        assert_ne!(PID_DISC_MUTE, PID_DISC_UN_MUTE);
    }
}
