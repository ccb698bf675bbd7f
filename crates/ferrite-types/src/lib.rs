#![forbid(unsafe_code)]
#![doc = "Common types and error codes for the ferrite TLS client."]

pub mod error;

pub use error::*;
