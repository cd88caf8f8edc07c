//! Grid fixture configuration

pub mod fixture;

pub use fixture::*;
