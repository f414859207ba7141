//! Tienda Core - Shared types library.
//!
//! This crate provides the domain types used by the Tienda storefront service:
//! - typed WooCommerce ids and lenient numeric coercion for loosely-typed payloads
//! - order and payment status enums, including the payment -> order status mapping
//! - the shipping quoter
//! - the browser-side cart and favorites models
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, amounts, statuses
//! - [`shipping`] - Subtotal-based shipping quotes
//! - [`cart`] - Cart line items and favorites

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod shipping;
pub mod types;

pub use cart::{Cart, CartItem, Favorites};
pub use shipping::{Destination, ShippingQuote, quote};
pub use types::*;
