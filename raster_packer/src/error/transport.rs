use crate::model::ResultCode;
use std::io;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to connect to {device}")]
    Connect {
        device: String,
        #[source]
        source: io::Error,
    },
    #[error("Failed to send data to the device")]
    Send(#[source] io::Error),
    #[error("Timed out talking to the device")]
    TimedOut,
    #[error("Device {0} is used by another job packer")]
    DeviceBusy(String),
    #[error("Device {device} is cooling down for another {remaining:?}")]
    CoolingDown { device: String, remaining: Duration },
    #[error("No device session is attached to this job packer")]
    NoDevice,
}

impl TransportError {
    /// Classifies an I/O error raised while writing to the device.
    pub fn from_send(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TransportError::TimedOut,
            _ => TransportError::Send(err),
        }
    }

    pub fn result_code(&self) -> ResultCode {
        match self {
            TransportError::TimedOut => ResultCode::ErrorTimeout,
            TransportError::Connect { .. }
            | TransportError::Send(_)
            | TransportError::DeviceBusy(_)
            | TransportError::CoolingDown { .. }
            | TransportError::NoDevice => ResultCode::ErrorConnection,
        }
    }
}
