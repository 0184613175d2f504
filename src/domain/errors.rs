use thiserror::Error;

/// Failure taxonomy for the checkout domain.
///
/// `PaymentDeclined` and `PaymentTimedOut` are recoverable: the user is
/// returned to payment-method selection. `OrderNotRecorded` is the severe
/// post-capture class: money was collected but no order row exists, so the
/// captured identifiers must reach the user for support reconciliation and
/// the operation must not be retried blindly.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found")]
    NotFound,
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Payment declined: {reason}")]
    PaymentDeclined { reason: String },
    #[error("Payment capture timed out")]
    PaymentTimedOut,
    #[error("Payment {payment_id} captured but the order was not recorded: {reason}")]
    OrderNotRecorded {
        payment_id: String,
        gateway_order_id: String,
        reason: String,
    },
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("Internal error: {0}")]
    Internal(String),
}
