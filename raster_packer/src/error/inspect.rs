use thiserror::Error;

#[derive(Error, Debug)]
pub enum InspectError {
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    #[error("Unknown record tag {0:#04x}")]
    UnknownTag(u8),
    #[error("Record is shorter than its header declares")]
    Truncated,
    #[error("Invalid string")]
    InvalidString(#[from] std::string::FromUtf8Error),
    #[error("Unknown codec {0}")]
    UnknownCodec(u8),
    #[error("Data layout error")]
    DataLayoutError,
}
