use std::num::ParseIntError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RasterConfigKeyError {
    #[error("Expected 5 or 6 dash separated fields, found {0}")]
    FieldCount(usize),
    #[error("Unknown packing kind `{0}`")]
    UnknownPacking(String),
    #[error("Invalid channel layout `{0}`")]
    InvalidLayout(String),
    #[error("Invalid bits per pixel")]
    InvalidBitsPerPixel(#[source] ParseIntError),
    #[error("Bits per pixel {0} out of range")]
    BitsPerPixelOutOfRange(u32),
    #[error("Invalid resolution `{0}`")]
    InvalidResolution(String),
    #[error("Resolution `{0}` does not match the packing kind")]
    ResolutionMismatch(String),
    #[error("Unknown language and compression `{0}`")]
    UnknownLanguage(String),
    #[error("Plane order `{0}` is not a permutation of the layout")]
    InvalidPlaneOrder(String),
}
