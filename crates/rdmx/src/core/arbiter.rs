// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Process-wide transceiver arbitration shared by all ports.
//!
//! The hardware wiring allows only one receive path at a time: a port must
//! own the receive side of the wire before arming RDM response capture or
//! DMX-input reception. Likewise, only one RDM transaction may be in
//! flight across the whole process. Both rules live here as an explicit
//! object — injected into each port via `Arc` — instead of free-floating
//! process state, so they are enforceable and testable in isolation.
//!
//! A third flag, the RDM pause, is the cancellation mechanism: while set,
//! no new transaction starts and an in-flight one winds down without
//! consuming its command.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

const NO_OWNER: u8 = u8::MAX;

/// Shared receive-owner / RDM-in-progress / RDM-pause flags.
#[derive(Debug, Default)]
pub struct BusArbiter {
    receive_owner: AtomicU8,
    rdm_in_progress: AtomicBool,
    rdm_paused: AtomicBool,
}

impl BusArbiter {
    /// Arbiter with no owner and no transaction in flight.
    pub fn new() -> Self {
        BusArbiter {
            receive_owner: AtomicU8::new(NO_OWNER),
            rdm_in_progress: AtomicBool::new(false),
            rdm_paused: AtomicBool::new(false),
        }
    }

    /// Try to mark an RDM transaction in flight for `port`. Fails while
    /// RDM is paused or another transaction is already running.
    pub fn try_begin_rdm(&self, port: u8) -> bool {
        if self.rdm_paused.load(Ordering::Acquire) {
            return false;
        }
        let ok = self
            .rdm_in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if !ok {
            log::warn!("[arbiter] port {} denied: RDM already in flight", port);
        }
        ok
    }

    /// Mark the in-flight RDM transaction resolved.
    pub fn end_rdm(&self) {
        self.rdm_in_progress.store(false, Ordering::Release);
    }

    /// True while any port has an RDM transaction in flight.
    pub fn rdm_in_progress(&self) -> bool {
        self.rdm_in_progress.load(Ordering::Acquire)
    }

    /// Claim the receive side of the wire for `port`. Idempotent for the
    /// current owner; fails while another port holds it.
    pub fn claim_receive(&self, port: u8) -> bool {
        match self.receive_owner.compare_exchange(
            NO_OWNER,
            port,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => true,
            Err(owner) => {
                if owner == port {
                    true
                } else {
                    log::warn!(
                        "[arbiter] port {} denied receive: port {} owns it",
                        port,
                        owner
                    );
                    false
                }
            }
        }
    }

    /// Release the receive side if `port` owns it.
    pub fn release_receive(&self, port: u8) {
        let _ = self
            .receive_owner
            .compare_exchange(port, NO_OWNER, Ordering::AcqRel, Ordering::Acquire);
    }

    /// Current receive owner, if any.
    pub fn receive_owner(&self) -> Option<u8> {
        match self.receive_owner.load(Ordering::Acquire) {
            NO_OWNER => None,
            port => Some(port),
        }
    }

    /// Set or clear the process-wide RDM pause.
    pub fn set_rdm_paused(&self, paused: bool) {
        self.rdm_paused.store(paused, Ordering::Release);
    }

    /// True while RDM traffic is paused.
    pub fn rdm_paused(&self) -> bool {
        self.rdm_paused.load(Ordering::Acquire)
    }
}
