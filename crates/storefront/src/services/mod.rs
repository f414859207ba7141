//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `webhook_ledger` - Idempotency record for payment notifications

pub mod webhook_ledger;

pub use webhook_ledger::{InMemoryWebhookLedger, WebhookKey, WebhookLedger};
