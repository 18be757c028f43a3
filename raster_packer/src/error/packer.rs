use super::{ConfigError, RasterConfigKeyError, TransportError};
use crate::model::{PageId, RasterLibState, ResultCode};
use thiserror::Error;

/// How a failure affects the protocol state of the packer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Rejected input; the state is left unchanged and the call may be retried.
    Parameter,
    /// Call issued out of order; the packer moves to `RasterLibState::Error`.
    Sequencing,
    /// Codec, memory or internal failure; the packer moves to `RasterLibState::Error`.
    Resource,
    /// Device connection failure; never retried by the packer.
    Transport,
    /// A blocking wait was interrupted by the cancel token.
    Cancelled,
}

#[derive(Error, Debug)]
pub enum PackerError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Invalid raster configuration key")]
    InvalidRasterConfigKey(#[from] RasterConfigKeyError),
    #[error("Invalid configuration")]
    Config(#[from] ConfigError),
    #[error("Unsupported raster format: {0}")]
    UnsupportedRasterFormat(String),
    #[error("Operation `{operation}` is not allowed in state {state:?}")]
    InvalidUsageSequence {
        operation: &'static str,
        state: RasterLibState,
    },
    #[error("Page {0} is not the open page")]
    PageNotOpen(PageId),
    #[error("Single page printer cannot take another page")]
    MultiPageNotSupported,
    #[error("Compressor error")]
    Compressor(#[source] std::io::Error),
    #[error("Memory handler could not supply a buffer of {0} bytes")]
    Memory(usize),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("Mandatory setting `{0}` is not set")]
    SettingMandatoryNotSet(String),
    #[error("Operation not supported by the printer model")]
    NotSupported,
    #[error("Transport error")]
    Transport(#[from] TransportError),
    #[error("Job was cancelled")]
    Cancelled,
}

impl PackerError {
    pub fn result_code(&self) -> ResultCode {
        match self {
            PackerError::InvalidParameter(_)
            | PackerError::InvalidRasterConfigKey(_)
            | PackerError::Config(_) => ResultCode::ErrorInvalidParameter,
            PackerError::UnsupportedRasterFormat(_) => ResultCode::ErrorUnsupportedRasterFmt,
            PackerError::InvalidUsageSequence { .. }
            | PackerError::PageNotOpen(_)
            | PackerError::MultiPageNotSupported => ResultCode::ErrorInvalidUsageSequence,
            PackerError::Compressor(_) => ResultCode::ErrorCompressor,
            PackerError::Memory(_) => ResultCode::ErrorMemory,
            PackerError::Internal(_) => ResultCode::ErrorInternal,
            PackerError::SettingMandatoryNotSet(_) => ResultCode::ErrorSettingMandatoryNotSet,
            PackerError::NotSupported => ResultCode::NotSupported,
            PackerError::Transport(err) => err.result_code(),
            PackerError::Cancelled => ResultCode::Error,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PackerError::InvalidParameter(_)
            | PackerError::InvalidRasterConfigKey(_)
            | PackerError::Config(_)
            | PackerError::UnsupportedRasterFormat(_)
            | PackerError::NotSupported => ErrorKind::Parameter,
            PackerError::InvalidUsageSequence { .. }
            | PackerError::PageNotOpen(_)
            | PackerError::MultiPageNotSupported => ErrorKind::Sequencing,
            PackerError::Compressor(_)
            | PackerError::Memory(_)
            | PackerError::Internal(_)
            | PackerError::SettingMandatoryNotSet(_) => ErrorKind::Resource,
            PackerError::Transport(_) => ErrorKind::Transport,
            PackerError::Cancelled => ErrorKind::Cancelled,
        }
    }
}

/// Result code of a packer call, `ResultCode::Ok` on success.
pub fn result_code<T>(result: &Result<T, PackerError>) -> ResultCode {
    match result {
        Ok(_) => ResultCode::Ok,
        Err(err) => err.result_code(),
    }
}
