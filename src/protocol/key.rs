//! Session key
//!
//! The key is the login password, space-padded to exactly eight bytes.

use std::fmt;

use crate::error::{EnergenieError, Result};

/// Size of the derived key in bytes
pub const KEY_SIZE: usize = 8;

/// Eight-byte secret derived from the login password
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Key([u8; KEY_SIZE]);

impl Key {
    /// Derive a key from a password of at most 8 bytes
    pub fn derive(password: &str) -> Result<Self> {
        let raw = password.as_bytes();
        if raw.len() > KEY_SIZE {
            return Err(EnergenieError::Config(format!(
                "Password too long: {} bytes (max {})",
                raw.len(),
                KEY_SIZE
            )));
        }

        let mut key = [b' '; KEY_SIZE];
        key[..raw.len()].copy_from_slice(raw);
        Ok(Key(key))
    }

    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    #[inline]
    pub(crate) fn byte(&self, index: usize) -> u8 {
        self.0[index]
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Key(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_key_bytes() {
        let key = Key::derive("hunter2").unwrap();
        assert_eq!(format!("{:?}", key), "Key(..)");
    }

    #[test]
    fn test_exactly_eight_bytes_is_not_padded() {
        let key = Key::derive("abcdefgh").unwrap();
        assert_eq!(key.as_bytes(), b"abcdefgh");
    }
}
