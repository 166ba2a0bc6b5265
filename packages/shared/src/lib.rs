//! Shared library for the Pollroom polling application.
//!
//! Holds the pieces that are meaningful to both the server and any
//! client implementation: the wire protocol DTOs, time utilities and
//! logging setup.

pub mod logger;
pub mod protocol;
pub mod time;
