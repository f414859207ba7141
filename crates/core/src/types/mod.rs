//! Core types for Tienda.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod lenient;
pub mod money;
pub mod status;

pub use id::*;
pub use lenient::{LenientNumber, normalize_quantity, parse_amount};
pub use money::{CurrencyCode, ParseCurrencyError};
pub use status::*;
