
pub mod error;

pub mod log;

pub mod serialize;
pub use self::serialize::*;
