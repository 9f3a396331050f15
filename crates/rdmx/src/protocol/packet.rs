// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Inbound RDM packet parsing and checksum validation.
//!
//! Requests and responses share one wire layout; [`RdmPacket`] decodes
//! either. The controller uses it on captured response bytes after the
//! response window closes; the simulated responders use it to read the
//! requests the engine transmits.

use crate::protocol::checksum16;
use crate::protocol::constants::{
    OFS_COMMAND_CLASS, OFS_DEST_UID, OFS_MESSAGE_COUNT, OFS_MESSAGE_LENGTH, OFS_PARAMETER_DATA,
    OFS_PDL, OFS_PID, OFS_PORT_OR_RESPONSE, OFS_SOURCE_UID, OFS_SUB_DEVICE, OFS_TRANSACTION,
    RDM_CHECKSUM_SIZE, RDM_HEADER_SIZE, RDM_MAX_PARAMETER_DATA, RDM_MIN_PACKET_SIZE, SC_RDM,
    SC_SUB_MESSAGE,
};
use crate::protocol::uid::Uid;

/// Why a byte capture failed to parse as an RDM packet.
///
/// None of these is surfaced to the application as a fault: a garbled
/// response is a collision (or line noise) and is silently dropped or, for
/// discovery, drives branch splitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Fewer bytes than the fixed header plus checksum.
    TooShort,
    /// First two slots are not `0xCC 0x01`.
    BadStartCode,
    /// Message-length byte disagrees with the bytes actually captured, or
    /// states an impossible length.
    LengthMismatch,
    /// Stated checksum does not match the sum of the preceding bytes.
    ChecksumMismatch,
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::TooShort => write!(f, "packet shorter than RDM minimum"),
            DecodeError::BadStartCode => write!(f, "missing RDM start code pair"),
            DecodeError::LengthMismatch => write!(f, "message length disagrees with capture"),
            DecodeError::ChecksumMismatch => write!(f, "checksum mismatch"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// One decoded RDM packet (request or response; the layouts are shared).
#[derive(Clone)]
pub struct RdmPacket {
    /// Destination UID.
    pub destination: Uid,
    /// Source UID — for a response, the device that answered.
    pub source: Uid,
    /// Transaction number echoed from the request.
    pub transaction: u8,
    /// Port ID (requests) or response type (responses); see
    /// [`RdmPacket::response_type`].
    pub port_or_response: u8,
    /// Queued-message count advertised by the responder.
    pub message_count: u8,
    /// Sub-device address.
    pub sub_device: u16,
    /// Command class.
    pub command_class: u8,
    /// Parameter ID.
    pub pid: u16,
    data: [u8; RDM_MAX_PARAMETER_DATA],
    data_len: u8,
}

impl RdmPacket {
    /// Parse and checksum-validate a captured packet.
    ///
    /// Accepts trailing bytes after the checksum (the capture window can
    /// pick up line garbage after a response); everything past the stated
    /// message length + checksum is ignored.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() < RDM_MIN_PACKET_SIZE {
            return Err(DecodeError::TooShort);
        }
        if bytes[0] != SC_RDM || bytes[1] != SC_SUB_MESSAGE {
            return Err(DecodeError::BadStartCode);
        }
        let msg_len = bytes[OFS_MESSAGE_LENGTH] as usize;
        if msg_len < RDM_HEADER_SIZE || msg_len + RDM_CHECKSUM_SIZE > bytes.len() {
            return Err(DecodeError::LengthMismatch);
        }
        let stated = u16::from_be_bytes([bytes[msg_len], bytes[msg_len + 1]]);
        if stated != checksum16(&bytes[..msg_len]) {
            return Err(DecodeError::ChecksumMismatch);
        }
        let pdl = bytes[OFS_PDL] as usize;
        if RDM_HEADER_SIZE + pdl != msg_len {
            return Err(DecodeError::LengthMismatch);
        }

        let mut dest = [0u8; 6];
        dest.copy_from_slice(&bytes[OFS_DEST_UID..OFS_DEST_UID + 6]);
        let mut src = [0u8; 6];
        src.copy_from_slice(&bytes[OFS_SOURCE_UID..OFS_SOURCE_UID + 6]);

        let mut data = [0u8; RDM_MAX_PARAMETER_DATA];
        data[..pdl].copy_from_slice(&bytes[OFS_PARAMETER_DATA..OFS_PARAMETER_DATA + pdl]);

        Ok(RdmPacket {
            destination: Uid::from_bytes(dest),
            source: Uid::from_bytes(src),
            transaction: bytes[OFS_TRANSACTION],
            port_or_response: bytes[OFS_PORT_OR_RESPONSE],
            message_count: bytes[OFS_MESSAGE_COUNT],
            sub_device: u16::from_be_bytes([bytes[OFS_SUB_DEVICE], bytes[OFS_SUB_DEVICE + 1]]),
            command_class: bytes[OFS_COMMAND_CLASS],
            pid: u16::from_be_bytes([bytes[OFS_PID], bytes[OFS_PID + 1]]),
            data,
            data_len: pdl as u8,
        })
    }

    /// Parameter data of the packet.
    pub fn data(&self) -> &[u8] {
        &self.data[..self.data_len as usize]
    }

    /// The port-id/response-type slot read as a response type.
    pub fn response_type(&self) -> u8 {
        self.port_or_response
    }
}

impl std::fmt::Debug for RdmPacket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RdmPacket")
            .field("destination", &self.destination)
            .field("source", &self.source)
            .field("transaction", &self.transaction)
            .field("response_type", &self.port_or_response)
            .field("command_class", &format_args!("{:#04x}", self.command_class))
            .field("pid", &format_args!("{:#06x}", self.pid))
            .field("data_len", &self.data_len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::command::RdmCommand;
    use crate::protocol::constants::CC_GET_COMMAND;

    fn encoded(cmd: &RdmCommand) -> Vec<u8> {
        let mut buf = [0u8; 300];
        let n = cmd.encode(&mut buf);
        buf[..n].to_vec()
    }

    #[test]
    fn test_decode_what_encode_produced() {
        let mut cmd = RdmCommand::get(Uid::new(0x02B0, 9), 0x0082, &[1, 2, 3]).unwrap();
        cmd.source = Uid::new(0x7FF0, 0xAABB_CCDD);
        cmd.transaction = 42;
        let wire = encoded(&cmd);

        let pkt = RdmPacket::decode(&wire).unwrap();
        assert_eq!(pkt.destination, cmd.destination);
        assert_eq!(pkt.source, cmd.source);
        assert_eq!(pkt.transaction, 42);
        assert_eq!(pkt.command_class, CC_GET_COMMAND);
        assert_eq!(pkt.pid, 0x0082);
        assert_eq!(pkt.data(), &[1, 2, 3]);
    }

    #[test]
    fn test_corrupt_byte_fails_checksum() {
        let cmd = RdmCommand::disc_mute(Uid::new(5, 6));
        let mut wire = encoded(&cmd);
        wire[10] ^= 0x40;
        assert_eq!(
            RdmPacket::decode(&wire).unwrap_err(),
            DecodeError::ChecksumMismatch
        );
    }

    #[test]
    fn test_trailing_garbage_tolerated() {
        let cmd = RdmCommand::disc_mute(Uid::new(5, 6));
        let mut wire = encoded(&cmd);
        wire.extend_from_slice(&[0x00, 0xFF, 0x13]);
        assert!(RdmPacket::decode(&wire).is_ok());
    }

    #[test]
    fn test_short_capture_rejected() {
        assert_eq!(
            RdmPacket::decode(&[0xCC, 0x01, 24]).unwrap_err(),
            DecodeError::TooShort
        );
    }

    #[test]
    fn test_wrong_start_code_rejected() {
        let cmd = RdmCommand::disc_mute(Uid::new(5, 6));
        let mut wire = encoded(&cmd);
        wire[0] = 0x00;
        assert_eq!(
            RdmPacket::decode(&wire).unwrap_err(),
            DecodeError::BadStartCode
        );
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let cmd = RdmCommand::disc_mute(Uid::new(5, 6));
        let mut wire = encoded(&cmd);
        // Claim a longer message than was captured.
        wire[2] = 60;
        assert_eq!(
            RdmPacket::decode(&wire).unwrap_err(),
            DecodeError::LengthMismatch
        );
    }
}
