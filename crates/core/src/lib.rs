//! Rwaya Core - Shared types library.
//!
//! This crate provides common types used across the Rwaya components:
//! - `storefront` - Public-facing cart, checkout and order tracking site
//! - `cli` - Command-line tools for migrations and order lookups
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. This keeps it lightweight and allows it
//! to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, tracking codes, prices, quantities,
//!   emails, shipping methods and delivery statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
