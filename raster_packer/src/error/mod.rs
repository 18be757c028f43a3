pub mod config;
pub mod config_key;
pub mod inspect;
pub mod packer;
pub mod transport;
pub use config::*;
pub use config_key::*;
pub use inspect::*;
pub use packer::*;
pub use transport::*;
