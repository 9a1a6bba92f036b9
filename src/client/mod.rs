//! Client Module
//!
//! Transports that can query and switch a power strip.
//!
//! ## Architecture
//! - `PowerStrip` is the capability every transport offers
//! - `NativeClient` speaks the binary TCP protocol
//! - `HttpClient` scrapes the device's web interface
//!
//! Callers pick a transport once (see [`open`]) and only ever talk to the
//! trait afterwards.

pub mod native;
pub mod http;

use std::collections::BTreeMap;

use crate::config::{Config, Transport};
use crate::error::Result;
use crate::socket::Socket;

pub use native::NativeClient;
pub use http::HttpClient;

/// Outlet states, plus names when the transport knows them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StripStatus {
    /// On/off per socket
    pub states: BTreeMap<Socket, bool>,

    /// Human-readable socket names; `None` when the transport has no names
    pub names: Option<BTreeMap<Socket, String>>,
}

impl StripStatus {
    /// Whether a socket is on (unknown sockets read as off)
    pub fn is_on(&self, socket: Socket) -> bool {
        self.states.get(&socket).copied().unwrap_or(false)
    }

    /// Name of a socket, if the transport provided one
    pub fn name(&self, socket: Socket) -> Option<&str> {
        self.names.as_ref()?.get(&socket).map(String::as_str)
    }
}

/// What a power strip can do, regardless of transport
pub trait PowerStrip: Send + Sync {
    /// Switch every socket in `desired` on or off; others are left alone
    fn switch(&self, desired: &BTreeMap<Socket, bool>) -> Result<()>;

    /// Query all socket states
    fn status(&self) -> Result<StripStatus>;
}

/// Build the transport selected in the config
pub fn open(config: &Config) -> Result<Box<dyn PowerStrip>> {
    tracing::debug!("Using {} transport for {}", config.transport, config.address);
    match config.transport {
        Transport::Native => Ok(Box::new(NativeClient::from_config(config)?)),
        Transport::Http => Ok(Box::new(HttpClient::from_config(config)?)),
    }
}
