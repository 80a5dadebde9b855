//! `evently-core` — foundation building blocks for the event codec.
//!
//! This crate contains the error model and value objects shared by every
//! spec version (no transport concerns).

pub mod error;
pub mod value_object;

pub use error::{CodecError, CodecResult};
pub use value_object::{Timestamp, UriRef};
