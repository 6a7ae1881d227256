//! Core components, types, and utilities for the rsvp-bot.
//!
//! This module contains fundamental building blocks used throughout the application:
//! - Configuration handling and environment variables.
//! - Common types and result handling.

pub mod config;
/// Common result and error type aliases.
pub mod types;
