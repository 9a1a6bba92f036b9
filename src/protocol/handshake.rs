//! Challenge-response handshake
//!
//! The device opens every session with a 4-byte Task. The client answers with
//! a Solution built from two 16-bit words:
//!
//! ```text
//! word0 = ((task[0] ^ key[2]) * key[0]) ^ (key[6] | key[4] << 8) ^ task[2]
//! word1 = ((task[1] ^ key[3]) * key[1]) ^ (key[7] | key[5] << 8) ^ task[3]
//!
//! ┌───────────┬───────────┬───────────┬───────────┐
//! │ word0 lo  │ word0 hi  │ word1 lo  │ word1 hi  │
//! └───────────┴───────────┴───────────┴───────────┘
//! ```
//!
//! All arithmetic wraps at 16 bits.

use super::Key;

/// Byte sent by the client to start a session
pub const HANDSHAKE_START: u8 = 0x11;

/// Size of the challenge and of its solution
pub const TASK_SIZE: usize = 4;

/// Device-issued challenge, valid for one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Task(pub [u8; TASK_SIZE]);

/// Client answer to a Task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Solution(pub [u8; TASK_SIZE]);

impl Task {
    /// Compute the solution for this task
    pub fn solve(&self, key: &Key) -> Solution {
        solve_task(self, key)
    }

    pub fn as_bytes(&self) -> &[u8; TASK_SIZE] {
        &self.0
    }
}

impl Solution {
    pub fn as_bytes(&self) -> &[u8; TASK_SIZE] {
        &self.0
    }
}

/// Compute the Solution for a Task under a Key
pub fn solve_task(task: &Task, key: &Key) -> Solution {
    let t = &task.0;
    let word0 = solve_word(t[0], t[2], key.byte(2), key.byte(0), key.byte(6), key.byte(4));
    let word1 = solve_word(t[1], t[3], key.byte(3), key.byte(1), key.byte(7), key.byte(5));

    let [w0_lo, w0_hi] = word0.to_le_bytes();
    let [w1_lo, w1_hi] = word1.to_le_bytes();
    Solution([w0_lo, w0_hi, w1_lo, w1_hi])
}

#[inline]
fn solve_word(challenge: u8, salt: u8, mask: u8, factor: u8, mix_lo: u8, mix_hi: u8) -> u16 {
    let product = u16::from(challenge ^ mask).wrapping_mul(u16::from(factor));
    let mix = u16::from_le_bytes([mix_lo, mix_hi]);
    product ^ mix ^ u16::from(salt)
}
