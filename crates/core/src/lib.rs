//! Core business logic for TAISEN.
//!
//! Every service takes the caller's [`Session`] explicitly; nothing reads an
//! ambient "current user".

pub mod services;

pub use services::*;
