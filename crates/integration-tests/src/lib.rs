//! Integration tests for Tavola.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tavola-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_pricing` - Cart aggregation and totals across the full pipeline
//! - `order_lifecycle` - Status machine behavior end to end
//! - `promotions` - Promotion terms against checkout totals
//!
//! The tests here exercise the domain crate the way the server composes it:
//! whole scenarios rather than single functions. Database-backed tests live
//! with the server crate and need a running `PostgreSQL`.

#![cfg_attr(not(test), forbid(unsafe_code))]
