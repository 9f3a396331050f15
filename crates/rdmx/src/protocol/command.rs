// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Outbound RDM command construction and wire encoding.
//!
//! A [`RdmCommand`] is built in task context, stamped with a transaction
//! number when it enters the port's queue, and encoded into the transmit
//! buffer when its turn on the wire comes. Parameter data is stored inline
//! (231-byte maximum per E1.20) so queue slots own their commands without
//! allocation.

use crate::error::{Error, Result};
use crate::protocol::checksum16;
use crate::protocol::constants::{
    CC_DISCOVERY_COMMAND, CC_GET_COMMAND, CC_SET_COMMAND, DEFAULT_PORT_ID, PID_DISC_MUTE,
    PID_DISC_UNIQUE_BRANCH, PID_DISC_UN_MUTE, RDM_CHECKSUM_SIZE, RDM_HEADER_SIZE,
    RDM_MAX_PARAMETER_DATA, SC_RDM, SC_SUB_MESSAGE,
};
use crate::protocol::uid::Uid;

/// One outbound RDM request.
///
/// Immutable once enqueued, except that the queue stamps a fresh
/// transaction number each time the command is (re)submitted — discovery
/// re-issues the same branch query after a mute, and the retry must not
/// look like a duplicate to responders.
#[derive(Clone)]
pub struct RdmCommand {
    /// Destination UID ([`Uid::BROADCAST`] for discovery sweeps).
    pub destination: Uid,
    /// Controller UID stamped by the owning port.
    pub source: Uid,
    /// Transaction number, assigned at enqueue.
    pub transaction: u8,
    /// Port ID byte (requests) — responses reuse this slot for the
    /// response type.
    pub port_id: u8,
    /// Queued-message count; always 0 for requests.
    pub message_count: u8,
    /// Sub-device address, 0 for the root device.
    pub sub_device: u16,
    /// Command class (`CC_*`).
    pub command_class: u8,
    /// Parameter ID (`PID_*`).
    pub pid: u16,
    data: [u8; RDM_MAX_PARAMETER_DATA],
    data_len: u8,
}

impl RdmCommand {
    /// Bare command with no parameter data.
    pub fn new(command_class: u8, pid: u16, destination: Uid) -> Self {
        RdmCommand {
            destination,
            source: Uid::ZERO,
            transaction: 0,
            port_id: DEFAULT_PORT_ID,
            message_count: 0,
            sub_device: 0,
            command_class,
            pid,
            data: [0; RDM_MAX_PARAMETER_DATA],
            data_len: 0,
        }
    }

    /// GET_COMMAND with optional parameter data.
    pub fn get(destination: Uid, pid: u16, data: &[u8]) -> Result<Self> {
        Self::new(CC_GET_COMMAND, pid, destination).with_data(data)
    }

    /// SET_COMMAND carrying `data`.
    pub fn set(destination: Uid, pid: u16, data: &[u8]) -> Result<Self> {
        Self::new(CC_SET_COMMAND, pid, destination).with_data(data)
    }

    /// DISC_MUTE aimed at one device.
    pub fn disc_mute(destination: Uid) -> Self {
        Self::new(CC_DISCOVERY_COMMAND, PID_DISC_MUTE, destination)
    }

    /// Broadcast DISC_UN_MUTE. No response is ever expected.
    pub fn disc_un_mute() -> Self {
        Self::new(CC_DISCOVERY_COMMAND, PID_DISC_UN_MUTE, Uid::BROADCAST)
    }

    /// DISC_UNIQUE_BRANCH over `[lower, upper]`, bounds as 6-byte
    /// big-endian UID strings in the parameter data.
    pub fn disc_unique_branch(lower: Uid, upper: Uid) -> Self {
        let mut cmd = Self::new(CC_DISCOVERY_COMMAND, PID_DISC_UNIQUE_BRANCH, Uid::BROADCAST);
        cmd.data[..6].copy_from_slice(&lower.to_bytes());
        cmd.data[6..12].copy_from_slice(&upper.to_bytes());
        cmd.data_len = 12;
        cmd
    }

    /// Attach parameter data. Fails with [`Error::ParameterTooLong`] past
    /// the 231-byte E1.20 limit.
    pub fn with_data(mut self, data: &[u8]) -> Result<Self> {
        if data.len() > RDM_MAX_PARAMETER_DATA {
            return Err(Error::ParameterTooLong);
        }
        self.data[..data.len()].copy_from_slice(data);
        self.data_len = data.len() as u8;
        Ok(self)
    }

    /// Parameter data carried by this command.
    pub fn data(&self) -> &[u8] {
        &self.data[..self.data_len as usize]
    }

    /// Message-length byte: start code through parameter data, excluding
    /// the checksum.
    pub fn message_length(&self) -> u8 {
        (RDM_HEADER_SIZE + self.data_len as usize) as u8
    }

    /// Total bytes this command occupies on the wire, checksum included.
    pub fn wire_len(&self) -> usize {
        RDM_HEADER_SIZE + self.data_len as usize + RDM_CHECKSUM_SIZE
    }

    /// True for DISC_UNIQUE_BRANCH queries, whose timeout dispatches to the
    /// discovery branch handler even when nothing was captured.
    pub fn is_unique_branch(&self) -> bool {
        self.command_class == CC_DISCOVERY_COMMAND && self.pid == PID_DISC_UNIQUE_BRANCH
    }

    /// Branch bounds of a DISC_UNIQUE_BRANCH command.
    pub fn branch_bounds(&self) -> Option<(Uid, Uid)> {
        if !self.is_unique_branch() || self.data_len != 12 {
            return None;
        }
        let mut lo = [0u8; 6];
        let mut hi = [0u8; 6];
        lo.copy_from_slice(&self.data[..6]);
        hi.copy_from_slice(&self.data[6..12]);
        Some((Uid::from_bytes(lo), Uid::from_bytes(hi)))
    }

    /// Encode the full packet (checksum included) into `out`, returning the
    /// number of bytes written. `out` must hold at least
    /// [`RdmCommand::wire_len`] bytes.
    ///
    /// All multi-byte fields are big-endian; the trailing checksum is the
    /// 16-bit sum of every preceding byte, modulo 65536.
    pub fn encode(&self, out: &mut [u8]) -> usize {
        let len = self.wire_len();
        debug_assert!(out.len() >= len);

        out[0] = SC_RDM;
        out[1] = SC_SUB_MESSAGE;
        out[2] = self.message_length();
        out[3..9].copy_from_slice(&self.destination.to_bytes());
        out[9..15].copy_from_slice(&self.source.to_bytes());
        out[15] = self.transaction;
        out[16] = self.port_id;
        out[17] = self.message_count;
        out[18..20].copy_from_slice(&self.sub_device.to_be_bytes());
        out[20] = self.command_class;
        out[21..23].copy_from_slice(&self.pid.to_be_bytes());
        out[23] = self.data_len;
        let end = 24 + self.data_len as usize;
        out[24..end].copy_from_slice(self.data());

        let sum = checksum16(&out[..end]);
        out[end] = (sum >> 8) as u8;
        out[end + 1] = (sum & 0xFF) as u8;
        len
    }
}

impl std::fmt::Debug for RdmCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RdmCommand")
            .field("destination", &self.destination)
            .field("source", &self.source)
            .field("transaction", &self.transaction)
            .field("command_class", &format_args!("{:#04x}", self.command_class))
            .field("pid", &format_args!("{:#06x}", self.pid))
            .field("data_len", &self.data_len)
            .finish()
    }
}
