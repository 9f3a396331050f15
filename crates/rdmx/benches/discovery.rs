// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Discovery and codec benchmarks.
//!
//! Measures the hot paths of the RDM side of the engine:
//! - full binary-search discovery over simulated device populations
//! - outbound command encoding
//! - the bounded command queue cycle
//!
//! Discovery runs against the simulated bus with a manual clock, so the
//! numbers capture state-machine and codec work, not wire time.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use rdmx::core::{BusArbiter, CommandQueue};
use rdmx::engine::DmxPort;
use rdmx::time::ManualClock;
use rdmx::transport::sim::{SimBus, SimRdmDevice, SimTransport};
use rdmx::{PortConfig, RdmCommand, Uid};

const CONTROLLER: Uid = Uid::new(0x7FF0, 0x0000_0001);

fn random_population(count: usize, seed: u64) -> Vec<SimRdmDevice> {
    fastrand::seed(seed);
    let mut uids = Vec::with_capacity(count);
    while uids.len() < count {
        let uid = Uid::new(fastrand::u16(1..0xFFFF), fastrand::u32(..));
        if !uids.contains(&uid) {
            uids.push(uid);
        }
    }
    uids.into_iter().map(SimRdmDevice::new).collect()
}

/// Drive a port until discovery converges; returns the tick count.
fn run_to_convergence(port: &mut DmxPort<SimTransport>, clock: &ManualClock) -> usize {
    let mut ticks = 0;
    while !port.tod_ready() {
        port.tick();
        clock.advance(500);
        ticks += 1;
        assert!(ticks < 1_000_000, "discovery failed to converge");
    }
    ticks
}

fn bench_full_discovery(c: &mut Criterion) {
    let mut group = c.benchmark_group("discovery_full_scan");
    for &population in &[1usize, 4, 16] {
        group.bench_function(format!("{population}_devices"), |b| {
            b.iter(|| {
                let bus = SimBus::new();
                for device in random_population(population, 0x5EED) {
                    bus.attach(device);
                }
                let clock = ManualClock::new();
                let mut port = DmxPort::new(
                    0,
                    bus.controller(),
                    Arc::new(BusArbiter::new()),
                    Box::new(clock.clone()),
                    PortConfig::default(),
                );
                port.rdm_enable(CONTROLLER).expect("rdm enable");

                let ticks = run_to_convergence(&mut port, &clock);
                assert_eq!(port.tod_count(), population);
                black_box(ticks)
            });
        });
    }
    group.finish();
}

fn bench_command_encode(c: &mut Criterion) {
    let mut buf = [0u8; 300];
    let branch = RdmCommand::disc_unique_branch(Uid::ZERO, Uid::from_u64(Uid::MAX));
    let get = RdmCommand::get(Uid::new(0x02B0, 7), 0x0060, &[1, 2, 3, 4]).expect("pdl in range");

    c.bench_function("encode_disc_unique_branch", |b| {
        b.iter(|| black_box(branch.encode(black_box(&mut buf))));
    });
    c.bench_function("encode_get", |b| {
        b.iter(|| black_box(get.encode(black_box(&mut buf))));
    });
}

fn bench_queue_cycle(c: &mut Criterion) {
    c.bench_function("command_queue_push_pop", |b| {
        let mut queue = CommandQueue::new();
        let cmd = RdmCommand::disc_mute(Uid::new(1, 2));
        b.iter(|| {
            assert!(queue.push(cmd.clone()));
            black_box(queue.pop());
        });
    });
}

criterion_group!(
    benches,
    bench_full_discovery,
    bench_command_encode,
    bench_queue_cycle
);
criterion_main!(benches);
