//! Tavola Core - Domain types and business rules.
//!
//! This crate provides the domain model shared across all Tavola components:
//! - `server` - JSON API for customers and restaurant owners
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure business rules - no I/O, no
//! database access, no HTTP. This keeps it lightweight and allows it to be
//! used anywhere, including in tests that never touch a database.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money rounding, emails, and roles
//! - [`cart`] - Single-restaurant cart aggregate and pricing policy
//! - [`order`] - Order status lifecycle and transition rules
//! - [`promotion`] - Discount code validation and application

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod order;
pub mod promotion;
pub mod types;

pub use cart::{Cart, CartLine, CartTotals, PricingPolicy};
pub use order::{OrderStatus, PaymentMethod, PaymentStatus, TransitionError};
pub use promotion::{PromotionKind, PromotionTerms, PromotionVerdict};
pub use types::*;
