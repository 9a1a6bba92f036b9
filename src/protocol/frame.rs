//! Status and control frames
//!
//! Both frames are four bytes, one per socket, with socket 4 first on the
//! wire. Each byte is obfuscated with the session Task and the Key:
//!
//! ```text
//! encode: byte = (((code ^ task[2]) + task[3]) ^ key[0]) + key[1]
//! decode: code = (((byte - key[1]) ^ key[0]) - task[3]) ^ task[2]
//! ```
//!
//! All arithmetic wraps at 8 bits.
//!
//! ## Status Codes
//! | Firmware  | On   | Off  |
//! |-----------|------|------|
//! | 2.0       | 0x11 | 0x22 |
//! | 2.1       | 0x41 | 0x82 |
//! | WLAN      | 0x51 | 0x92 |
//!
//! Any other code reads as "off".

use std::collections::BTreeMap;

use super::{Key, Task};
use crate::socket::Socket;

/// Size of a status or control frame
pub const FRAME_SIZE: usize = 4;

/// Known status codes: (code, on, firmware)
const STATUS_CODES: [(u8, bool, FirmwareRevision); 6] = [
    (0x11, true, FirmwareRevision::V20),
    (0x22, false, FirmwareRevision::V20),
    (0x41, true, FirmwareRevision::V21),
    (0x82, false, FirmwareRevision::V21),
    (0x51, true, FirmwareRevision::Wlan),
    (0x92, false, FirmwareRevision::Wlan),
];

/// Firmware family that produced a status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirmwareRevision {
    /// Protocol version 2.0
    V20,
    /// Protocol version 2.1
    V21,
    /// WLAN models
    Wlan,
}

/// Per-socket command carried in a control frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SwitchCode {
    On = 0x01,
    Off = 0x02,
    Unchanged = 0x04,
}

impl SwitchCode {
    /// Command for a socket given an optional desired state
    pub fn from_desired(desired: Option<bool>) -> Self {
        match desired {
            Some(true) => SwitchCode::On,
            Some(false) => SwitchCode::Off,
            None => SwitchCode::Unchanged,
        }
    }
}

// =============================================================================
// Wire Position Mapping
// =============================================================================

/// Socket addressed by a byte at the given wire position
///
/// # Panics
/// Panics if `position >= FRAME_SIZE`.
pub fn socket_for_wire_position(position: usize) -> Socket {
    assert!(
        position < FRAME_SIZE,
        "wire position {} out of range (max {})",
        position,
        FRAME_SIZE - 1
    );
    Socket((FRAME_SIZE - position) as u8)
}

/// Wire position of the byte that addresses a socket
pub fn wire_position_for_socket(socket: Socket) -> usize {
    FRAME_SIZE - socket.number() as usize
}

// =============================================================================
// Status Codes
// =============================================================================

/// Map a plain status code to on/off; unknown codes are off
pub fn decode_status_code(code: u8) -> bool {
    STATUS_CODES
        .iter()
        .find(|(known, _, _)| *known == code)
        .map(|(_, on, _)| *on)
        .unwrap_or(false)
}

/// Firmware family a status code belongs to, if known
pub fn firmware_revision(code: u8) -> Option<FirmwareRevision> {
    STATUS_CODES
        .iter()
        .find(|(known, _, _)| *known == code)
        .map(|(_, _, revision)| *revision)
}

#[inline]
fn obfuscate(code: u8, task: &Task, key: &Key) -> u8 {
    let t = task.as_bytes();
    ((code ^ t[2]).wrapping_add(t[3]) ^ key.byte(0)).wrapping_add(key.byte(1))
}

#[inline]
fn deobfuscate(byte: u8, task: &Task, key: &Key) -> u8 {
    let t = task.as_bytes();
    ((byte.wrapping_sub(key.byte(1)) ^ key.byte(0)).wrapping_sub(t[3])) ^ t[2]
}

// =============================================================================
// Status Frame
// =============================================================================

/// Obfuscated outlet states as received from the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusFrame(pub [u8; FRAME_SIZE]);

impl StatusFrame {
    /// Plain status codes, in wire order
    pub fn codes(&self, task: &Task, key: &Key) -> [u8; FRAME_SIZE] {
        self.0.map(|byte| deobfuscate(byte, task, key))
    }

    /// Decode into on/off per socket
    pub fn decode(&self, task: &Task, key: &Key) -> BTreeMap<Socket, bool> {
        self.codes(task, key)
            .iter()
            .enumerate()
            .map(|(position, code)| (socket_for_wire_position(position), decode_status_code(*code)))
            .collect()
    }

    pub fn as_bytes(&self) -> &[u8; FRAME_SIZE] {
        &self.0
    }
}

// =============================================================================
// Control Frame
// =============================================================================

/// Obfuscated switch command sent to the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlFrame(pub [u8; FRAME_SIZE]);

impl ControlFrame {
    /// Encode a switch request; sockets missing from `desired` stay unchanged
    pub fn encode(desired: &BTreeMap<Socket, bool>, task: &Task, key: &Key) -> Self {
        let mut bytes = [0u8; FRAME_SIZE];
        for (position, byte) in bytes.iter_mut().enumerate() {
            let socket = socket_for_wire_position(position);
            let code = SwitchCode::from_desired(desired.get(&socket).copied());
            *byte = obfuscate(code as u8, task, key);
        }
        ControlFrame(bytes)
    }

    /// A frame that leaves every socket as it is
    pub fn unchanged(task: &Task, key: &Key) -> Self {
        Self::encode(&BTreeMap::new(), task, key)
    }

    pub fn as_bytes(&self) -> &[u8; FRAME_SIZE] {
        &self.0
    }
}
