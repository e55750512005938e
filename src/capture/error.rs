use std::io;
use thiserror::Error;

/// Failure to obtain a usable camera.
#[derive(Error, Debug)]
pub enum DeviceError {
    /// Access to the device was refused.
    #[error("Camera permission denied: {0}")]
    PermissionDenied(String),

    /// No device matching the request exists.
    #[error("No camera found: {0}")]
    NotFound(String),

    /// The device exists but cannot produce frames.
    #[error("Camera unusable: {0}")]
    Unusable(String),
}

impl DeviceError {
    /// Maps an I/O failure while opening `what` to the matching device error.
    pub fn from_io(what: &str, err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => DeviceError::NotFound(what.to_string()),
            io::ErrorKind::PermissionDenied => DeviceError::PermissionDenied(what.to_string()),
            _ => DeviceError::Unusable(format!("{}: {}", what, err)),
        }
    }
}
