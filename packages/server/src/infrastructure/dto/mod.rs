//! DTO handling for the server.
//!
//! The wire DTOs themselves live in `pollroom-shared` so clients can
//! reuse them; this module only holds the conversions from domain
//! entities to those DTOs.

pub mod conversion;
