//! Protocol Module
//!
//! Defines the native binary protocol spoken by the power strip on TCP port
//! 5000.
//!
//! ## Session Layout
//!
//! ```text
//! client                                   device
//!   │ ── 0x11 (handshake start, 1) ──────────▶ │
//!   │ ◀───────────────────── Task (4) ──────── │
//!   │ ── Solution (4) ───────────────────────▶ │
//!   │ ◀────────────── StatusFrame #1 (4) ───── │   decoded, then discarded
//!   │ ── ControlFrame (4) ───────────────────▶ │
//!   │ ◀────────────── StatusFrame #2 (4) ───── │   authoritative
//! ```
//!
//! ## Frame Layout
//! Status and control frames carry one byte per socket, in reverse order:
//! ```text
//! ┌──────────┬──────────┬──────────┬──────────┐
//! │ Socket 4 │ Socket 3 │ Socket 2 │ Socket 1 │
//! └──────────┴──────────┴──────────┴──────────┘
//! ```
//!
//! Every byte is obfuscated with the session's Task and the password Key.

mod key;
mod handshake;
mod frame;

pub use key::{Key, KEY_SIZE};
pub use handshake::{solve_task, Solution, Task, HANDSHAKE_START, TASK_SIZE};
pub use frame::{
    decode_status_code, firmware_revision, socket_for_wire_position, wire_position_for_socket,
    ControlFrame, FirmwareRevision, StatusFrame, SwitchCode, FRAME_SIZE,
};
