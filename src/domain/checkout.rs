//! The checkout flow: a linear sequence of states driving when totals are
//! computed and when the order is frozen.
//!
//! Transitions are synchronous steps triggered one at a time by the order
//! service. Once payment collection begins the flow cannot be navigated
//! backwards or abandoned; a captured-but-unrecorded payment is a
//! data-consistency hazard and gets its own terminal failure class.

use uuid::Uuid;

use super::errors::DomainError;
use super::ports::CaptureOutcome;
use super::pricing::PaymentMethod;

/// Identifiers returned by a successful external capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureReceipt {
    pub payment_id: String,
    pub gateway_order_id: String,
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutFailure {
    CaptureDeclined { reason: String },
    CaptureTimedOut,
    /// Order creation failed before any payment was captured (collect on
    /// delivery); safe to retry.
    OrderRejected { reason: String },
    /// Order creation failed after a successful capture. Not retryable: the
    /// captured identifiers are preserved for support reconciliation.
    OrderNotRecorded {
        payment_id: String,
        gateway_order_id: String,
        reason: String,
    },
}

impl CheckoutFailure {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, CheckoutFailure::OrderNotRecorded { .. })
    }
}

impl From<CheckoutFailure> for DomainError {
    fn from(failure: CheckoutFailure) -> Self {
        match failure {
            CheckoutFailure::CaptureDeclined { reason } => {
                DomainError::PaymentDeclined { reason }
            }
            CheckoutFailure::CaptureTimedOut => DomainError::PaymentTimedOut,
            CheckoutFailure::OrderRejected { reason } => DomainError::Internal(reason),
            CheckoutFailure::OrderNotRecorded {
                payment_id,
                gateway_order_id,
                reason,
            } => DomainError::OrderNotRecorded {
                payment_id,
                gateway_order_id,
                reason,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutState {
    AddressSelection,
    PaymentMethodSelection,
    Ready,
    PaymentCollection,
    OrderSubmission,
    Confirmed { order_id: Uuid },
    Failed(CheckoutFailure),
}

#[derive(Debug)]
pub struct CheckoutFlow {
    state: CheckoutState,
    address_id: Option<Uuid>,
    payment_method: Option<PaymentMethod>,
    capture: Option<CaptureReceipt>,
}

impl CheckoutFlow {
    pub fn new() -> Self {
        CheckoutFlow {
            state: CheckoutState::AddressSelection,
            address_id: None,
            payment_method: None,
            capture: None,
        }
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    pub fn address_id(&self) -> Option<Uuid> {
        self.address_id
    }

    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method
    }

    pub fn capture(&self) -> Option<&CaptureReceipt> {
        self.capture.as_ref()
    }

    /// True while an external call is in flight; every other
    /// transition-triggering action is rejected in these states.
    pub fn is_busy(&self) -> bool {
        matches!(
            self.state,
            CheckoutState::PaymentCollection | CheckoutState::OrderSubmission
        )
    }

    fn guard_not_busy(&self, action: &str) -> Result<(), DomainError> {
        if self.is_busy() {
            return Err(DomainError::Validation(format!(
                "cannot {action} while payment is being processed"
            )));
        }
        Ok(())
    }

    pub fn select_address(&mut self, address_id: Uuid) -> Result<(), DomainError> {
        self.guard_not_busy("change the address")?;
        match self.state {
            CheckoutState::AddressSelection
            | CheckoutState::PaymentMethodSelection
            | CheckoutState::Ready => {
                self.address_id = Some(address_id);
                Ok(())
            }
            _ => Err(DomainError::Validation(
                "address can no longer be changed".to_string(),
            )),
        }
    }

    /// Leaves the state unchanged and fails when no address is selected.
    pub fn confirm_address(&mut self) -> Result<(), DomainError> {
        if self.state != CheckoutState::AddressSelection {
            return Err(DomainError::Validation(
                "address selection is already confirmed".to_string(),
            ));
        }
        if self.address_id.is_none() {
            return Err(DomainError::Validation(
                "no delivery address selected".to_string(),
            ));
        }
        self.state = CheckoutState::PaymentMethodSelection;
        Ok(())
    }

    pub fn select_payment_method(&mut self, method: PaymentMethod) -> Result<(), DomainError> {
        match self.state {
            CheckoutState::PaymentMethodSelection | CheckoutState::Ready => {
                self.payment_method = Some(method);
                self.state = CheckoutState::Ready;
                Ok(())
            }
            _ => Err(DomainError::Validation(
                "payment method cannot be selected now".to_string(),
            )),
        }
    }

    /// Starts the irreversible part of the flow. Methods with an external
    /// capture step go through `PaymentCollection`; collect-on-delivery
    /// methods skip straight to `OrderSubmission`.
    pub fn begin(&mut self) -> Result<(), DomainError> {
        if self.state != CheckoutState::Ready {
            return Err(DomainError::Validation(
                "checkout is not ready to be submitted".to_string(),
            ));
        }
        let method = self.payment_method.ok_or_else(|| {
            DomainError::Validation("no payment method selected".to_string())
        })?;
        self.state = if method.requires_capture() {
            CheckoutState::PaymentCollection
        } else {
            CheckoutState::OrderSubmission
        };
        Ok(())
    }

    pub fn complete_capture(&mut self, outcome: CaptureOutcome) -> Result<(), DomainError> {
        if self.state != CheckoutState::PaymentCollection {
            return Err(DomainError::Validation(
                "no payment capture is in progress".to_string(),
            ));
        }
        match outcome {
            CaptureOutcome::Captured {
                payment_id,
                gateway_order_id,
                signature,
            } => {
                self.capture = Some(CaptureReceipt {
                    payment_id,
                    gateway_order_id,
                    signature,
                });
                self.state = CheckoutState::OrderSubmission;
            }
            CaptureOutcome::Declined { reason } => {
                self.state = CheckoutState::Failed(CheckoutFailure::CaptureDeclined { reason });
            }
            CaptureOutcome::TimedOut => {
                self.state = CheckoutState::Failed(CheckoutFailure::CaptureTimedOut);
            }
        }
        Ok(())
    }

    pub fn complete_submission(
        &mut self,
        result: Result<Uuid, String>,
    ) -> Result<(), DomainError> {
        if self.state != CheckoutState::OrderSubmission {
            return Err(DomainError::Validation(
                "no order submission is in progress".to_string(),
            ));
        }
        match result {
            Ok(order_id) => {
                self.state = CheckoutState::Confirmed { order_id };
            }
            Err(reason) => {
                self.state = CheckoutState::Failed(match self.capture.take() {
                    Some(receipt) => CheckoutFailure::OrderNotRecorded {
                        payment_id: receipt.payment_id,
                        gateway_order_id: receipt.gateway_order_id,
                        reason,
                    },
                    None => CheckoutFailure::OrderRejected { reason },
                });
            }
        }
        Ok(())
    }

    /// Recoverable failures return to `Ready` with the selections intact so
    /// the user can change the payment method and submit again.
    pub fn retry(&mut self) -> Result<(), DomainError> {
        match &self.state {
            CheckoutState::Failed(failure) if failure.is_retryable() => {
                self.capture = None;
                self.state = CheckoutState::Ready;
                Ok(())
            }
            CheckoutState::Failed(_) => Err(DomainError::Validation(
                "this order cannot be retried; contact support with your payment reference"
                    .to_string(),
            )),
            _ => Err(DomainError::Validation("nothing to retry".to_string())),
        }
    }

    /// Backward navigation between the selection states; blocked once an
    /// external call is in flight.
    pub fn go_back(&mut self) -> Result<(), DomainError> {
        self.guard_not_busy("navigate back")?;
        match self.state {
            CheckoutState::PaymentMethodSelection => {
                self.state = CheckoutState::AddressSelection;
                Ok(())
            }
            CheckoutState::Ready => {
                self.state = CheckoutState::PaymentMethodSelection;
                Ok(())
            }
            _ => Err(DomainError::Validation(
                "cannot navigate back from here".to_string(),
            )),
        }
    }
}

impl Default for CheckoutFlow {
    fn default() -> Self {
        CheckoutFlow::new()
    }
}
