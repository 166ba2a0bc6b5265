//! Classroom polling server library.
//!
//! A single-session realtime service: one teacher runs timed
//! multiple-choice polls, students vote once each, and everyone sees
//! live tallies plus a shared side chat.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// configuration
pub mod config;
