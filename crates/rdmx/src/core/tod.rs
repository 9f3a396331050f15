// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Table of Devices: confirmed RDM responder UIDs for one port.
//!
//! Mutated only by the discovery engine. Consumers read a `&[Uid]`
//! snapshot; the borrow cannot outlive the next `tick(&mut self)`, which
//! is exactly the "valid until the next scheduler tick" rule, enforced by
//! the borrow checker instead of a convention.

use crate::protocol::Uid;

/// Ordered, duplicate-free store of discovered device UIDs.
#[derive(Debug, Default)]
pub struct DeviceTable {
    devices: Vec<Uid>,
}

impl DeviceTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device, ignoring duplicates. Returns `true` if the table
    /// changed.
    pub fn add(&mut self, uid: Uid) -> bool {
        if self.devices.contains(&uid) {
            return false;
        }
        log::debug!("[tod] add {}", uid);
        self.devices.push(uid);
        true
    }

    /// Remove a device, compacting the table and preserving relative
    /// order. Returns `true` if the device was present.
    pub fn remove(&mut self, uid: Uid) -> bool {
        match self.index_of(uid) {
            Some(i) => {
                log::debug!("[tod] remove {}", uid);
                self.devices.remove(i);
                true
            }
            None => false,
        }
    }

    /// Position of `uid`, if present.
    pub fn index_of(&self, uid: Uid) -> Option<usize> {
        self.devices.iter().position(|&d| d == uid)
    }

    /// True if `uid` is in the table.
    pub fn contains(&self, uid: Uid) -> bool {
        self.devices.contains(&uid)
    }

    /// Entry at `index`.
    pub fn get(&self, index: usize) -> Option<Uid> {
        self.devices.get(index).copied()
    }

    /// Number of confirmed devices.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// True when no devices are known.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.devices.clear();
    }

    /// Read-only snapshot of the table.
    pub fn as_slice(&self) -> &[Uid] {
        &self.devices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_dedupes() {
        let mut tod = DeviceTable::new();
        assert!(tod.add(Uid::new(1, 1)));
        assert!(tod.add(Uid::new(1, 2)));
        assert!(!tod.add(Uid::new(1, 1)));
        assert_eq!(tod.len(), 2);
    }

    #[test]
    fn test_remove_compacts_preserving_order() {
        let mut tod = DeviceTable::new();
        tod.add(Uid::new(1, 1));
        tod.add(Uid::new(1, 2));
        tod.add(Uid::new(1, 3));
        assert!(tod.remove(Uid::new(1, 2)));
        assert_eq!(tod.as_slice(), &[Uid::new(1, 1), Uid::new(1, 3)]);
        assert!(!tod.remove(Uid::new(1, 2)));
    }

    #[test]
    fn test_index_and_contains() {
        let mut tod = DeviceTable::new();
        tod.add(Uid::new(2, 9));
        assert_eq!(tod.index_of(Uid::new(2, 9)), Some(0));
        assert!(tod.contains(Uid::new(2, 9)));
        assert!(!tod.contains(Uid::new(2, 8)));
        assert_eq!(tod.get(0), Some(Uid::new(2, 9)));
        assert_eq!(tod.get(1), None);
    }

    #[test]
    fn test_clear() {
        let mut tod = DeviceTable::new();
        tod.add(Uid::new(1, 1));
        tod.clear();
        assert!(tod.is_empty());
    }
}
