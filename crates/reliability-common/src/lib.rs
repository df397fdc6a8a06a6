//! Shared error type and arbitrary-precision numeric facade used by both
//! `reliability-core` and `reliability-cli`.

pub mod bigreal;
pub mod error;

pub use bigreal::BigReal;
pub use error::{Error, Result};
