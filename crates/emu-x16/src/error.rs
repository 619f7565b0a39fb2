//! Error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::joystick::InstanceId;

/// Machine-level failures. Only construction and state dumps can fail;
/// the stepping loop itself never does.
#[derive(Debug, Error)]
pub enum X16Error {
    #[error("boot image not found: {}", .path.display())]
    MissingBootImage { path: PathBuf },

    #[error("invalid boot image: {len} bytes (expected 1 to {max})")]
    InvalidBootImage { len: usize, max: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Controller-port failures. These are reported and then ignored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoystickError {
    #[error("could not open controller {index}: {reason}")]
    OpenFailed { index: u32, reason: String },

    #[error("no controller with instance id {0}")]
    UnknownInstance(InstanceId),

    #[error("invalid controller port {0}")]
    InvalidSlot(usize),
}
