//! Record file loading

pub mod records;

pub use self::records::*;
