//! Status enums for orders and payments.
//!
//! Both backends report statuses as free-form strings and add new ones over
//! time, so each enum keeps an `Other` variant and round-trips unknown values
//! unchanged through serde.

use serde::{Deserialize, Serialize};

/// Order status as stored by the commerce backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    /// Created, awaiting payment.
    #[default]
    Pending,
    /// Payment received, order is being prepared.
    Processing,
    /// Awaiting payment confirmation.
    OnHold,
    /// Fulfilled.
    Completed,
    /// Cancelled by an admin or because payment was rejected.
    Cancelled,
    /// Refunded.
    Refunded,
    /// Payment failed.
    Failed,
    /// Draft created by the block checkout.
    CheckoutDraft,
    /// Any status added by plugins.
    Other(String),
}

impl OrderStatus {
    /// The wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::OnHold => "on-hold",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
            Self::Failed => "failed",
            Self::CheckoutDraft => "checkout-draft",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pending" => Self::Pending,
            "processing" => Self::Processing,
            "on-hold" => Self::OnHold,
            "completed" => Self::Completed,
            "cancelled" => Self::Cancelled,
            "refunded" => Self::Refunded,
            "failed" => Self::Failed,
            "checkout-draft" => Self::CheckoutDraft,
            _ => Self::Other(value),
        }
    }
}

impl From<OrderStatus> for String {
    fn from(value: OrderStatus) -> Self {
        match value {
            OrderStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment status as reported by the payment provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    /// Payment accredited.
    Approved,
    /// Authorized but not captured.
    Authorized,
    /// Waiting for the payer (e.g., cash voucher not yet paid).
    Pending,
    /// Under review.
    InProcess,
    /// Disputed by the payer.
    InMediation,
    /// Rejected by the issuer or the fraud engine.
    Rejected,
    /// Cancelled or expired.
    Cancelled,
    /// Refunded to the payer.
    Refunded,
    /// Chargeback issued.
    ChargedBack,
    /// Anything else, including merchant-order statuses like `paid` or `opened`.
    Other(String),
}

impl PaymentStatus {
    /// The wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Approved => "approved",
            Self::Authorized => "authorized",
            Self::Pending => "pending",
            Self::InProcess => "in_process",
            Self::InMediation => "in_mediation",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
            Self::ChargedBack => "charged_back",
            Self::Other(s) => s,
        }
    }

    /// The order status a payment notification moves the order to.
    ///
    /// | payment status            | order status |
    /// |---------------------------|--------------|
    /// | `approved`                | `processing` |
    /// | `rejected`, `cancelled`   | `cancelled`  |
    /// | anything else             | `on-hold`    |
    #[must_use]
    pub fn order_status(&self) -> OrderStatus {
        match self {
            Self::Approved => OrderStatus::Processing,
            Self::Rejected | Self::Cancelled => OrderStatus::Cancelled,
            _ => OrderStatus::OnHold,
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "approved" => Self::Approved,
            "authorized" => Self::Authorized,
            "pending" => Self::Pending,
            "in_process" => Self::InProcess,
            "in_mediation" => Self::InMediation,
            "rejected" => Self::Rejected,
            "cancelled" => Self::Cancelled,
            "refunded" => Self::Refunded,
            "charged_back" => Self::ChargedBack,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for PaymentStatus {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<PaymentStatus> for String {
    fn from(value: PaymentStatus) -> Self {
        match value {
            PaymentStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
