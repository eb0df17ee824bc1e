//! # kiosk-core
//!
//! Core types for the kiosk session service.
//!
//! This crate contains all fundamental types with **no internal dependencies**
//! on other kiosk crates. It provides:
//!
//! - Session types (SessionId, UserId, KioskId, KioskSession, SessionState)
//! - Activity events and audit log records
//! - Departments and dashboard reporting
//! - Configuration and error types
//!
//! ## Architecture
//!
//! This is Layer 0 in the architecture - the other crates depend on this one,
//! but this crate has no dependencies on other kiosk crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod activity;
pub mod config;
pub mod dashboard;
pub mod department;
pub mod error;
pub mod session;

// Re-export commonly used types
pub use activity::{ActivityDetails, ActivityEvent, ActivityLogEntry, DetailValue, NewActivityLog};
pub use config::{BackendKind, BackendSettings, KioskConfig, KioskSettings};
pub use dashboard::{ComplaintRow, DashboardStats, PaymentRow, DASHBOARD_ROW_LIMIT};
pub use department::Department;
pub use error::{Error, Result};
pub use session::{
    KioskId, KioskSession, SessionId, SessionState, SessionStatus, UserId, SESSION_TIMEOUT,
    TICK_INTERVAL,
};
