// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RDM device discovery: binary search over the 48-bit UID space.
//!
//! The algorithm queries UID ranges with `DISC_UNIQUE_BRANCH`. A range
//! with exactly one unmuted device yields a clean masked response: mute
//! that device and query the *same* range again (muting removed it from
//! contention, so the retry reveals whether others remain). A garbled
//! response is a collision: split the range at its midpoint and query
//! both halves. An empty response means the range holds no unmuted
//! devices — and an empty response to the *full* range means discovery
//! has converged.
//!
//! Two scan modes:
//! - **Full**: wipe the TOD, broadcast `DISC_UN_MUTE`, query the full
//!   range.
//! - **Incremental**: walk the known TOD muting each entry as a liveness
//!   probe (a dead entry is removed), then one full-range query to find
//!   newcomers.
//!
//! Commands the engine wants sent go through an ordered backlog rather
//! than straight into the port queue: if the queue is momentarily full
//! the sub-ranges wait there instead of being dropped — losing a range
//! would permanently lose any devices inside it. The port drains the
//! backlog cooperatively, one tick at a time, preserving the
//! mute-before-requery order.

use std::collections::VecDeque;

use crate::config::RDM_DISCOVERY_INTERVAL_MS;
use crate::core::DeviceTable;
use crate::protocol::constants::{CC_DISCOVERY_COMMAND_RESPONSE, RESPONSE_TYPE_ACK};
use crate::protocol::{
    decode_discovery_response, DiscoveryBranch, RdmCommand, RdmPacket, Uid,
};

/// How a discovery pass is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryMode {
    /// Wipe the TOD and re-scan the whole population.
    Full,
    /// Probe known devices for liveness, then look for newcomers.
    Incremental,
}

/// Per-port discovery state machine. Owns the TOD; nothing else mutates
/// it.
#[derive(Debug)]
pub struct DiscoveryEngine {
    tod: DeviceTable,
    ready: bool,
    changed: bool,
    cursor: usize,
    last_convergence_us: Option<u64>,
    backlog: VecDeque<RdmCommand>,
}

impl DiscoveryEngine {
    /// Engine with an empty TOD, not yet converged.
    pub fn new() -> Self {
        DiscoveryEngine {
            tod: DeviceTable::new(),
            ready: false,
            changed: false,
            cursor: 0,
            last_convergence_us: None,
            backlog: VecDeque::new(),
        }
    }

    /// The table of confirmed devices.
    pub fn tod(&self) -> &[Uid] {
        self.tod.as_slice()
    }

    /// Number of confirmed devices.
    pub fn tod_count(&self) -> usize {
        self.tod.len()
    }

    /// True once a full-range query has come back empty, i.e. every
    /// device on the line is accounted for.
    pub fn tod_ready(&self) -> bool {
        self.ready
    }

    /// Next backlogged command to move into the port queue, if any.
    pub fn next_backlog(&mut self) -> Option<RdmCommand> {
        self.backlog.pop_front()
    }

    /// True when there are backlogged commands waiting for queue space.
    pub fn backlog_pending(&self) -> bool {
        !self.backlog.is_empty()
    }

    /// Whether an unprompted pass should run now: the TOD has never
    /// converged, or the incremental interval has elapsed since it last
    /// did.
    pub fn due(&self, now_us: u64) -> bool {
        match self.last_convergence_us {
            None => true,
            Some(t) => !self.ready || now_us >= t + RDM_DISCOVERY_INTERVAL_MS * 1_000,
        }
    }

    /// Kick a pass in the given mode.
    pub fn start(&mut self, mode: DiscoveryMode) {
        match mode {
            DiscoveryMode::Full => self.start_full(),
            DiscoveryMode::Incremental => self.step_incremental(),
        }
    }

    /// Full scan: wipe everything, unmute the population, query the whole
    /// UID space.
    pub fn start_full(&mut self) {
        log::info!("[discovery] full scan");
        // Wiping an empty table is not a change; an empty line must
        // converge without a notification.
        if !self.tod.is_empty() {
            self.changed = true;
        }
        self.tod.clear();
        self.ready = false;
        self.cursor = 0;
        self.backlog.clear();
        self.backlog.push_back(RdmCommand::disc_un_mute());
        self.push_branch(DiscoveryBranch::full());
    }

    /// One incremental step: probe the next known device, or — past the
    /// end of the walk — query the full range for newcomers.
    pub fn step_incremental(&mut self) {
        match self.tod.get(self.cursor) {
            Some(uid) => {
                log::debug!("[discovery] liveness probe {}", uid);
                self.backlog.push_back(RdmCommand::disc_mute(uid));
                self.cursor += 1;
            }
            None => {
                log::debug!("[discovery] incremental sweep for newcomers");
                self.push_branch(DiscoveryBranch::full());
            }
        }
    }

    /// Resolve a `DISC_UNIQUE_BRANCH` transaction. `capture` holds
    /// whatever the response window collected (possibly nothing — that is
    /// itself meaningful). Returns `true` when discovery just converged
    /// with a net TOD change and the TOD-changed notification should
    /// fire.
    pub fn on_branch_response(&mut self, cmd: &RdmCommand, capture: &[u8], now_us: u64) -> bool {
        let Some((lower, upper)) = cmd.branch_bounds() else {
            return false;
        };
        let branch = DiscoveryBranch::new(lower, upper);

        if capture.is_empty() {
            if branch.is_full_range() {
                // Nothing unmuted anywhere: every device is found.
                log::info!("[discovery] converged, {} device(s)", self.tod.len());
                self.last_convergence_us = Some(now_us);
                self.cursor = 0;
                self.ready = true;
                let fire = self.changed;
                self.changed = false;
                // Lift the mutes so the next incremental sweep can see
                // everyone again.
                self.backlog.push_back(RdmCommand::disc_un_mute());
                return fire;
            }
            // Empty sub-range: resolved, nothing lives here.
            return false;
        }

        match decode_discovery_response(capture) {
            Some(uid) => {
                // Exactly one device answered. Mute it, then re-query the
                // same range: with that device silenced, the retry shows
                // whether others remain.
                log::debug!("[discovery] {} single responder {}", branch, uid);
                self.backlog.push_back(RdmCommand::disc_mute(uid));
                self.push_branch(branch);
            }
            None => {
                if branch.is_leaf() {
                    // Can't split further; probe the address directly.
                    log::debug!("[discovery] {} leaf, probing {}", branch, branch.upper);
                    self.backlog.push_back(RdmCommand::disc_mute(branch.upper));
                } else {
                    let (low_half, high_half) = branch.split();
                    log::debug!("[discovery] {} collision, splitting", branch);
                    self.push_branch(low_half);
                    self.push_branch(high_half);
                }
            }
        }
        false
    }

    /// Resolve a `DISC_MUTE` transaction: a validated ACK from the
    /// addressed device confirms it; silence while probing a known entry
    /// removes it.
    pub fn on_mute_response(&mut self, cmd: &RdmCommand, capture: &[u8]) {
        if let Some(uid) = mute_ack_source(cmd, capture) {
            match self.tod.index_of(uid) {
                Some(index) => {
                    // Already known. If the branch search re-confirmed the
                    // entry the walk is currently parked on, step past it.
                    if index == self.cursor {
                        self.cursor += 1;
                    }
                }
                None => {
                    self.tod.add(uid);
                    self.changed = true;
                }
            }
            return;
        }
        // No valid ACK. If this was a liveness probe of a known entry,
        // the device is gone: drop it and restart the walk so compaction
        // doesn't skip the entry that slid into its place.
        if self.tod.remove(cmd.destination) {
            log::info!("[discovery] {} no longer responding, removed", cmd.destination);
            self.changed = true;
            self.cursor = 0;
        }
    }
}

impl Default for DiscoveryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscoveryEngine {
    fn push_branch(&mut self, branch: DiscoveryBranch) {
        self.backlog
            .push_back(RdmCommand::disc_unique_branch(branch.lower, branch.upper));
    }
}

/// Decode a mute-response capture; returns the responding UID only for a
/// checksum-valid ACK whose source matches the command's destination.
fn mute_ack_source(cmd: &RdmCommand, capture: &[u8]) -> Option<Uid> {
    let pkt = RdmPacket::decode(capture).ok()?;
    if pkt.command_class == CC_DISCOVERY_COMMAND_RESPONSE
        && pkt.response_type() == RESPONSE_TYPE_ACK
        && pkt.source == cmd.destination
    {
        Some(pkt.source)
    } else {
        None
    }
}
