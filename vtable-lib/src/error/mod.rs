//! Error types

mod config;
mod field;
mod table;

pub use config::*;
pub use field::*;
pub use table::*;
