//! Core traits defined in `chathub-core` and implemented by other crates.

pub mod identity;

pub use identity::IdentityVerifier;
