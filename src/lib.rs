pub mod basic;
pub mod decode;
pub mod engine;
pub mod error;
pub mod timer;

pub use error::Error;
