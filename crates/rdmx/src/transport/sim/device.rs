// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Simulated E1.20 responder.
//!
//! Behaves like a well-mannered RDM fixture: answers DISC_UNIQUE_BRANCH
//! with the masked discovery response while unmuted and in range, ACKs
//! DISC_MUTE addressed to it, honors DISC_UN_MUTE silently, and ACK-echoes
//! GET/SET. The handle is cloneable so a test can attach one clone to the
//! bus and keep another to inspect or reconfigure the device mid-test
//! (e.g. making it vanish for incremental-removal scenarios).

use std::sync::Arc;

use parking_lot::Mutex;

use super::{SimReply, SimResponder};
use crate::protocol::constants::{
    CC_DISCOVERY_COMMAND, CC_GET_COMMAND, CC_SET_COMMAND, PID_DISC_MUTE, PID_DISC_UNIQUE_BRANCH,
    PID_DISC_UN_MUTE, RESPONSE_TYPE_ACK,
};
use crate::protocol::{encode_discovery_response, RdmCommand, RdmPacket, Uid};

#[derive(Debug)]
struct DeviceState {
    uid: Uid,
    muted: bool,
    responsive: bool,
    preamble: usize,
}

/// One simulated RDM device on a [`super::SimBus`].
#[derive(Clone)]
pub struct SimRdmDevice {
    state: Arc<Mutex<DeviceState>>,
}

impl SimRdmDevice {
    /// Responsive, unmuted device with the given UID.
    pub fn new(uid: Uid) -> Self {
        SimRdmDevice {
            state: Arc::new(Mutex::new(DeviceState {
                uid,
                muted: false,
                responsive: true,
                preamble: 3,
            })),
        }
    }

    /// The device's UID.
    pub fn uid(&self) -> Uid {
        self.state.lock().uid
    }

    /// True once a DISC_MUTE addressed to this device has been ACKed.
    pub fn is_muted(&self) -> bool {
        self.state.lock().muted
    }

    /// Silence the device entirely (models a fixture unplugged from the
    /// line); incremental discovery should then drop it from the TOD.
    pub fn set_responsive(&self, responsive: bool) {
        self.state.lock().responsive = responsive;
    }

    /// Number of 0xFE filler bytes ahead of discovery responses (real
    /// devices send 1..=7).
    pub fn set_preamble(&self, preamble: usize) {
        self.state.lock().preamble = preamble;
    }

    fn ack(state: &DeviceState, request: &RdmPacket, data: &[u8]) -> SimReply {
        let mut response =
            RdmCommand::new(request.command_class + 0x01, request.pid, request.source);
        response.source = state.uid;
        response.transaction = request.transaction;
        response.port_id = RESPONSE_TYPE_ACK;
        response.sub_device = request.sub_device;
        let response = response
            .with_data(data)
            .expect("ack payload within E1.20 limit");
        let mut wire = vec![0u8; response.wire_len()];
        response.encode(&mut wire);
        SimReply {
            break_first: true,
            bytes: wire,
        }
    }
}

impl SimResponder for SimRdmDevice {
    fn on_frame(&mut self, frame: &[u8]) -> Option<SimReply> {
        let mut state = self.state.lock();
        if !state.responsive {
            return None;
        }
        let pkt = RdmPacket::decode(frame).ok()?;
        match (pkt.command_class, pkt.pid) {
            (CC_DISCOVERY_COMMAND, PID_DISC_UNIQUE_BRANCH) => {
                if state.muted {
                    return None;
                }
                let data = pkt.data();
                if data.len() != 12 {
                    return None;
                }
                let mut lo = [0u8; 6];
                lo.copy_from_slice(&data[..6]);
                let mut hi = [0u8; 6];
                hi.copy_from_slice(&data[6..12]);
                let me = state.uid.to_u64();
                if Uid::from_bytes(lo).to_u64() <= me && me <= Uid::from_bytes(hi).to_u64() {
                    // Discovery responses carry no break and no RDM
                    // framing, just preamble + masked payload.
                    Some(SimReply {
                        break_first: false,
                        bytes: encode_discovery_response(state.uid, state.preamble),
                    })
                } else {
                    None
                }
            }
            (CC_DISCOVERY_COMMAND, PID_DISC_MUTE) if pkt.destination == state.uid => {
                state.muted = true;
                // Control field: no managed proxy, no sub-devices.
                Some(Self::ack(&state, &pkt, &[0x00, 0x00]))
            }
            (CC_DISCOVERY_COMMAND, PID_DISC_UN_MUTE) => {
                if pkt.destination == state.uid || pkt.destination.is_broadcast() {
                    state.muted = false;
                }
                None
            }
            (CC_GET_COMMAND | CC_SET_COMMAND, _) if pkt.destination == state.uid => {
                Some(Self::ack(&state, &pkt, pkt.data()))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::decode_discovery_response;

    fn encoded(cmd: &RdmCommand, source: Uid) -> Vec<u8> {
        let mut cmd = cmd.clone();
        cmd.source = source;
        let mut buf = vec![0u8; cmd.wire_len()];
        cmd.encode(&mut buf);
        buf
    }

    const CONTROLLER: Uid = Uid::new(0x7FF0, 0x0000_0001);

    #[test]
    fn test_answers_branch_in_range_until_muted() {
        let uid = Uid::new(0x02B0, 0x0000_0042);
        let mut dev = SimRdmDevice::new(uid);
        let branch = encoded(
            &RdmCommand::disc_unique_branch(Uid::ZERO, Uid::from_u64(Uid::MAX)),
            CONTROLLER,
        );

        let reply = dev.on_frame(&branch).expect("unmuted device answers");
        assert!(!reply.break_first);
        assert_eq!(decode_discovery_response(&reply.bytes), Some(uid));

        let mute = encoded(&RdmCommand::disc_mute(uid), CONTROLLER);
        let ack = dev.on_frame(&mute).expect("mute is acked");
        assert!(ack.break_first);
        let pkt = RdmPacket::decode(&ack.bytes).unwrap();
        assert_eq!(pkt.source, uid);
        assert_eq!(pkt.response_type(), RESPONSE_TYPE_ACK);
        assert!(dev.is_muted());

        // Muted: silent on further branch queries.
        assert!(dev.on_frame(&branch).is_none());
    }

    #[test]
    fn test_silent_outside_branch_range() {
        let mut dev = SimRdmDevice::new(Uid::new(0x9000, 1));
        let branch = encoded(
            &RdmCommand::disc_unique_branch(Uid::ZERO, Uid::from_u64(Uid::MAX / 2)),
            CONTROLLER,
        );
        assert!(dev.on_frame(&branch).is_none());
    }

    #[test]
    fn test_broadcast_unmute_lifts_mute() {
        let uid = Uid::new(1, 2);
        let mut dev = SimRdmDevice::new(uid);
        let _ = dev.on_frame(&encoded(&RdmCommand::disc_mute(uid), CONTROLLER));
        assert!(dev.is_muted());
        assert!(dev
            .on_frame(&encoded(&RdmCommand::disc_un_mute(), CONTROLLER))
            .is_none());
        assert!(!dev.is_muted());
    }

    #[test]
    fn test_get_is_ack_echoed() {
        let uid = Uid::new(3, 4);
        let mut dev = SimRdmDevice::new(uid);
        let get = encoded(
            &RdmCommand::get(uid, 0x0082, &[9, 8]).unwrap(),
            CONTROLLER,
        );
        let reply = dev.on_frame(&get).unwrap();
        let pkt = RdmPacket::decode(&reply.bytes).unwrap();
        assert_eq!(pkt.command_class, CC_GET_COMMAND + 1);
        assert_eq!(pkt.destination, CONTROLLER);
        assert_eq!(pkt.data(), &[9, 8]);
    }

    #[test]
    fn test_unresponsive_device_is_silent() {
        let uid = Uid::new(5, 6);
        let mut dev = SimRdmDevice::new(uid);
        dev.set_responsive(false);
        let branch = encoded(
            &RdmCommand::disc_unique_branch(Uid::ZERO, Uid::from_u64(Uid::MAX)),
            CONTROLLER,
        );
        assert!(dev.on_frame(&branch).is_none());
        assert!(dev
            .on_frame(&encoded(&RdmCommand::disc_mute(uid), CONTROLLER))
            .is_none());
    }

    #[test]
    fn test_ignores_frames_for_other_devices() {
        let mut dev = SimRdmDevice::new(Uid::new(7, 8));
        let mute = encoded(&RdmCommand::disc_mute(Uid::new(7, 9)), CONTROLLER);
        assert!(dev.on_frame(&mute).is_none());
        assert!(!dev.is_muted());
    }
}
