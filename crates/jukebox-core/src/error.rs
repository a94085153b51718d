// ── Core error types ──
//
// Errors surfaced by device seams and the navigator actor. Expected
// control flow (idle/activation cycles, back at root, repeated shutdown
// triggers) is modelled as state checks and never reaches this type.

use thiserror::Error;

use crate::navigation::ViewIdentity;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Device errors ────────────────────────────────────────────────
    #[error("Device '{device}' failed: {message}")]
    Device { device: String, message: String },

    #[error("Failed to render {view} view: {message}")]
    Render { view: ViewIdentity, message: String },

    #[error("Hardware shutdown could not be cancelled: {message}")]
    ShutdownCancel { message: String },

    // ── Lifecycle errors ─────────────────────────────────────────────
    #[error("View navigator is no longer running")]
    NavigatorClosed,

    #[error("Coordinator already started")]
    AlreadyStarted,

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a device failure.
    pub fn device(device: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Device {
            device: device.into(),
            message: message.into(),
        }
    }
}
