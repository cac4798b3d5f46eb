//! Runner Core Library
//!
//! This crate provides the error type and the small math types shared by
//! the format and export crates.

pub mod error;
pub mod types;

pub use error::{Error, Result, ResultExt};
pub use types::*;
