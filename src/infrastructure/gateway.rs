use uuid::Uuid;

use crate::domain::ports::{CaptureOutcome, CaptureRequest, PaymentGateway};

/// Test-mode capture gateway. Fulfills the external capture contract with
/// synthetic identifiers so the checkout flow can run end to end without a
/// live payment provider; swap in a real adapter behind the same port for
/// production.
#[derive(Debug, Default)]
pub struct SandboxGateway;

impl PaymentGateway for SandboxGateway {
    fn capture(&self, request: CaptureRequest) -> CaptureOutcome {
        if request.amount.is_zero() || request.amount.is_negative() {
            return CaptureOutcome::Declined {
                reason: "capture amount must be positive".to_string(),
            };
        }
        let outcome = CaptureOutcome::Captured {
            payment_id: format!("pay_{}", Uuid::new_v4().simple()),
            gateway_order_id: format!("gwo_{}", Uuid::new_v4().simple()),
            signature: format!("sig_{}", Uuid::new_v4().simple()),
        };
        log::info!(
            "sandbox capture of {} {} for {}",
            request.amount,
            request.currency.code(),
            request.payer_email
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Currency;

    fn request(amount: &str) -> CaptureRequest {
        CaptureRequest {
            amount: amount.parse().expect("valid decimal"),
            currency: Currency::Usd,
            description: "Storefront order ORD-TEST".to_string(),
            payer_email: "jo@example.com".to_string(),
        }
    }

    #[test]
    fn positive_amount_is_captured_with_identifiers() {
        match SandboxGateway.capture(request("10.00")) {
            CaptureOutcome::Captured {
                payment_id,
                gateway_order_id,
                signature,
            } => {
                assert!(payment_id.starts_with("pay_"));
                assert!(gateway_order_id.starts_with("gwo_"));
                assert!(signature.starts_with("sig_"));
            }
            other => panic!("expected capture, got {other:?}"),
        }
    }

    #[test]
    fn zero_amount_is_declined() {
        assert!(matches!(
            SandboxGateway.capture(request("0.00")),
            CaptureOutcome::Declined { .. }
        ));
    }
}
