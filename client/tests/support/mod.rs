//! Shared helpers for the client integration suites.

pub mod recording_double_macro;

pub mod doubles;
