//! # kiosk-session
//!
//! Session lifecycle management for public kiosk terminals.
//!
//! This crate provides:
//! - Session start and best-effort termination against a session store
//! - A 1 s inactivity timer closing idle sessions after three minutes
//! - A fire-and-forget activity log queue
//! - In-memory and REST session stores
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it depends on kiosk-core for
//! types and is driven by the kiosk-mcp service binary.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod identity;
pub mod logger;
pub mod manager;
pub mod store;
pub mod timer;

// Re-export commonly used types
pub use clock::ActivityClock;
pub use identity::{IdentityProvider, SharedIdentity, StaticIdentity};
pub use logger::ActivityLogger;
pub use manager::{KioskManagerConfig, KioskSessionManager};
pub use store::{MemoryStore, RestStore, SessionStore, SharedStore, DEFAULT_KIOSK_ID};
pub use timer::{InactivityTimer, Tick};
