//! Sieve DNS Infrastructure Layer
pub mod dns;
