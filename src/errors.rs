use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Payment declined: {0}")]
    PaymentDeclined(String),

    #[error("Payment capture timed out")]
    PaymentTimedOut,

    #[error("Payment captured but the order was not recorded")]
    OrderNotRecorded {
        payment_id: String,
        gateway_order_id: String,
    },

    #[error("Service temporarily unavailable")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound => AppError::NotFound,
            DomainError::Validation(msg) => AppError::Validation(msg),
            DomainError::PaymentDeclined { reason } => AppError::PaymentDeclined(reason),
            DomainError::PaymentTimedOut => AppError::PaymentTimedOut,
            DomainError::OrderNotRecorded {
                payment_id,
                gateway_order_id,
                reason,
            } => {
                log::error!(
                    "payment {payment_id} captured but order not recorded: {reason}"
                );
                AppError::OrderNotRecorded {
                    payment_id,
                    gateway_order_id,
                }
            }
            DomainError::Unavailable(msg) => AppError::Unavailable(msg),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::NotFound => HttpResponse::NotFound().json(serde_json::json!({
                "error": self.to_string()
            })),
            AppError::Validation(_) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": self.to_string()
            })),
            AppError::PaymentDeclined(_) => {
                HttpResponse::PaymentRequired().json(serde_json::json!({
                    "error": self.to_string()
                }))
            }
            AppError::PaymentTimedOut => {
                HttpResponse::GatewayTimeout().json(serde_json::json!({
                    "error": self.to_string()
                }))
            }
            AppError::OrderNotRecorded {
                payment_id,
                gateway_order_id,
            } => HttpResponse::InternalServerError().json(serde_json::json!({
                "error": self.to_string(),
                "payment_id": payment_id,
                "gateway_order_id": gateway_order_id,
                "support": "Contact support with these payment references. Do not retry the payment.",
            })),
            AppError::Unavailable(detail) => {
                log::warn!("collaborator unavailable: {detail}");
                HttpResponse::ServiceUnavailable().json(serde_json::json!({
                    "error": "Service temporarily unavailable, please retry"
                }))
            }
            AppError::Internal(detail) => {
                // Raw detail is logged, never echoed to the client.
                log::error!("internal error: {detail}");
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "Internal server error"
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::ResponseError;

    #[test]
    fn not_found_returns_404() {
        assert_eq!(AppError::NotFound.error_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn validation_returns_400() {
        let err = AppError::Validation("no delivery address selected".to_string());
        assert_eq!(err.error_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn payment_declined_returns_402() {
        let err = AppError::PaymentDeclined("insufficient funds".to_string());
        assert_eq!(err.error_response().status(), StatusCode::PAYMENT_REQUIRED);
    }

    #[test]
    fn payment_timeout_returns_504() {
        assert_eq!(
            AppError::PaymentTimedOut.error_response().status(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn order_not_recorded_returns_500_with_references() {
        let err = AppError::OrderNotRecorded {
            payment_id: "pay_abc".to_string(),
            gateway_order_id: "gwo_def".to_string(),
        };
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unavailable_returns_503() {
        let err = AppError::Unavailable("pool exhausted".to_string());
        assert_eq!(err.error_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn internal_error_returns_500() {
        let err = AppError::Internal("something went wrong".to_string());
        assert_eq!(
            err.error_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_web::test]
    async fn internal_error_body_is_generic() {
        // The raw detail must not leak into the response body.
        let err = AppError::Internal("password=hunter2".to_string());
        let resp = err.error_response();
        let bytes = actix_web::body::to_bytes(resp.into_body())
            .await
            .expect("body");
        let body = String::from_utf8_lossy(&bytes);
        assert!(!body.contains("hunter2"));
        assert!(body.contains("Internal server error"));
    }

    #[test]
    fn domain_not_found_maps_to_app_not_found() {
        let app_err: AppError = DomainError::NotFound.into();
        assert!(matches!(app_err, AppError::NotFound));
    }

    #[test]
    fn domain_order_not_recorded_keeps_payment_references() {
        let app_err: AppError = DomainError::OrderNotRecorded {
            payment_id: "pay_abc".to_string(),
            gateway_order_id: "gwo_def".to_string(),
            reason: "db down".to_string(),
        }
        .into();
        match app_err {
            AppError::OrderNotRecorded {
                payment_id,
                gateway_order_id,
            } => {
                assert_eq!(payment_id, "pay_abc");
                assert_eq!(gateway_order_id, "gwo_def");
            }
            other => panic!("expected OrderNotRecorded, got {other:?}"),
        }
    }

    #[test]
    fn domain_validation_maps_to_app_validation() {
        let app_err: AppError = DomainError::Validation("bad value".to_string()).into();
        assert!(matches!(app_err, AppError::Validation(_)));
    }
}
