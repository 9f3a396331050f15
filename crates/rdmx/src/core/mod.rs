// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shared building blocks consumed by the engine state machines: the
//! double-buffered channel universe, the bounded RDM command queue, the
//! table of discovered devices, and the process-wide bus arbiter.

pub mod arbiter;
pub mod queue;
pub mod tod;
pub mod universe;

pub use arbiter::BusArbiter;
pub use queue::CommandQueue;
pub use tod::DeviceTable;
pub use universe::{Universe, UniverseStorage};
