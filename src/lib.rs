//! # energenie
//!
//! Remote control for EnerGenie 4-outlet networked power strips:
//! - Native binary protocol over TCP (challenge-response handshake)
//! - HTML-scraping HTTP transport
//! - Status decoding across firmware revisions 2.0, 2.1 and WLAN
//! - One shared `PowerStrip` capability for both transports
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        CLI (clap)                            │
//! │               status / on / off <socket-spec>                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  PowerStrip (trait)                          │
//! │           switch(desired) / status() -> StripStatus          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ NativeClient│          │ HttpClient  │
//!   │ (TCP :5000) │          │  (scraping) │
//!   └──────┬──────┘          └─────────────┘
//!          │
//!          ▼
//!   ┌─────────────┐
//!   │  Protocol   │
//!   │ Key / Task  │
//!   │   Frames    │
//!   └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod socket;
pub mod protocol;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{EnergenieError, Result};
pub use config::{Config, Transport};
pub use socket::{Socket, SocketSpec};
pub use client::{HttpClient, NativeClient, PowerStrip, StripStatus};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of energenie
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
