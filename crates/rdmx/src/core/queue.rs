// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounded FIFO of outbound RDM commands.
//!
//! Decouples command producers (application calls, the discovery engine)
//! from the single in-flight RDM transaction. `push` failing is the
//! engine's only RDM backpressure signal; callers retry on a later tick
//! once the head transaction resolves.
//!
//! All operations are O(1). The queue lives in task context only — the
//! event pump never produces or consumes commands — so no atomics are
//! needed.

use crate::config::RDM_QUEUE_CAPACITY;
use crate::protocol::RdmCommand;

/// Fixed-capacity ring of owned command slots.
pub struct CommandQueue {
    slots: Box<[Option<RdmCommand>]>,
    head: usize,
    len: usize,
}

impl CommandQueue {
    /// Queue with the standard capacity
    /// ([`RDM_QUEUE_CAPACITY`](crate::config::RDM_QUEUE_CAPACITY)).
    pub fn new() -> Self {
        Self::with_capacity(RDM_QUEUE_CAPACITY)
    }

    /// Queue with an explicit capacity (tests exercise small rings).
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        CommandQueue {
            slots: slots.into_boxed_slice(),
            head: 0,
            len: 0,
        }
    }

    /// Append a command. Returns `false` — the backpressure signal — when
    /// the queue is full; the command is dropped and the caller retries.
    pub fn push(&mut self, cmd: RdmCommand) -> bool {
        if self.is_full() {
            return false;
        }
        let tail = (self.head + self.len) % self.slots.len();
        self.slots[tail] = Some(cmd);
        self.len += 1;
        true
    }

    /// Non-destructive view of the head command.
    pub fn peek(&self) -> Option<&RdmCommand> {
        self.slots[self.head].as_ref()
    }

    /// Remove and return the head command.
    pub fn pop(&mut self) -> Option<RdmCommand> {
        let cmd = self.slots[self.head].take()?;
        self.head = (self.head + 1) % self.slots.len();
        self.len -= 1;
        Some(cmd)
    }

    /// True when no commands are queued.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True when a push would fail.
    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    /// Number of queued commands.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Remaining free slots.
    pub fn space(&self) -> usize {
        self.slots.len() - self.len
    }

    /// Drop every queued command.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CommandQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandQueue")
            .field("len", &self.len)
            .field("capacity", &self.slots.len())
            .finish()
    }
}
