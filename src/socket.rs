//! Socket numbering and socket-spec parsing
//!
//! A power strip has four outlets, numbered 1 to 4. A socket spec is what a
//! user types to select some of them:
//!
//! ```text
//! "3"        -> [3]
//! "1,2-3"    -> [1, 2, 3]
//! "4-2"      -> [2, 3, 4]
//! "all"      -> [1, 2, 3, 4]
//! ```

use std::fmt;

use crate::error::{EnergenieError, Result};

/// An addressable outlet, always within `Socket::MIN..=Socket::MAX`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Socket(pub(crate) u8);

impl Socket {
    /// Lowest socket number
    pub const MIN: Socket = Socket(1);

    /// Highest socket number
    pub const MAX: Socket = Socket(4);

    /// Number of sockets on the strip
    pub const COUNT: usize = 4;

    /// Validate a socket number
    pub fn new(number: u8) -> Result<Self> {
        if (Self::MIN.0..=Self::MAX.0).contains(&number) {
            Ok(Socket(number))
        } else {
            Err(EnergenieError::InvalidSocket(format!(
                "Invalid socket number {}, must be between {} and {}",
                number,
                Self::MIN.0,
                Self::MAX.0
            )))
        }
    }

    /// All sockets in ascending order
    pub fn all() -> impl Iterator<Item = Socket> {
        (Self::MIN.0..=Self::MAX.0).map(Socket)
    }

    /// The socket number (1-4)
    pub fn number(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Socket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for Socket {
    type Error = EnergenieError;

    fn try_from(number: u8) -> Result<Self> {
        Socket::new(number)
    }
}

/// Parser for comma-separated socket selections
pub struct SocketSpec;

impl SocketSpec {
    /// Parse a socket spec into a sorted, de-duplicated list of sockets
    pub fn parse(spec: &str) -> Result<Vec<Socket>> {
        let mut seen = [false; Socket::COUNT];

        for part in spec.split(',') {
            let part = part.trim();
            if part == "all" {
                seen = [true; Socket::COUNT];
            } else if let Some((low, high)) = split_range(part) {
                let mut low = parse_socket(low)?;
                let mut high = parse_socket(high)?;
                if low > high {
                    std::mem::swap(&mut low, &mut high);
                }
                for n in low.0..=high.0 {
                    seen[index(Socket(n))] = true;
                }
            } else {
                seen[index(parse_socket(part)?)] = true;
            }
        }

        Ok(Socket::all().filter(|s| seen[index(*s)]).collect())
    }
}

/// A dash only counts as a range separator when something precedes it
fn split_range(part: &str) -> Option<(&str, &str)> {
    match part.find('-') {
        Some(pos) if pos > 0 => Some((&part[..pos], &part[pos + 1..])),
        _ => None,
    }
}

fn parse_socket(raw: &str) -> Result<Socket> {
    let raw = raw.trim();
    let number: u8 = raw
        .parse()
        .map_err(|_| EnergenieError::InvalidSocket(format!("{:?} is not a valid integer", raw)))?;
    Socket::new(number)
}

fn index(socket: Socket) -> usize {
    (socket.0 - Socket::MIN.0) as usize
}
