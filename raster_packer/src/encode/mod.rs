mod band;
mod compressed;
mod encoder;
pub mod packbits;
mod uncompressed;
pub use band::*;
pub use compressed::*;
pub use encoder::*;
pub use uncompressed::*;
