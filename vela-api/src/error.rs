use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use vela_booking::{BookingError, InvoiceError, PaymentError};
use vela_catalog::{CatalogError, ListingError};
use vela_core::CoreError;
use vela_membership::{EligibilityError, MembershipError};

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    PaymentRequired(String),
    Gone(String),
    BadGateway(String),
    ServiceUnavailable(String),
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::PaymentRequired(msg) => (StatusCode::PAYMENT_REQUIRED, msg),
            AppError::Gone(msg) => (StatusCode::GONE, msg),
            AppError::BadGateway(msg) => {
                tracing::error!("Upstream failure: {}", msg);
                (StatusCode::BAD_GATEWAY, "Payment provider unavailable".to_string())
            }
            AppError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ValidationError(msg) => AppError::ValidationError(msg),
            CoreError::NotFound(msg) => AppError::NotFoundError(msg),
            CoreError::StorageError(msg) | CoreError::InternalError(msg) => {
                AppError::InternalServerError(msg)
            }
        }
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        let msg = err.to_string();
        match err {
            BookingError::NotFound(_) => AppError::NotFoundError(msg),
            BookingError::InvalidTransition { .. }
            | BookingError::DuplicateBooking(_)
            | BookingError::AlreadyPaid => AppError::ConflictError(msg),
            BookingError::NotEligible(e) => e.into(),
            BookingError::Forbidden(_) => AppError::AuthorizationError(msg),
            BookingError::DeadlinePassed { .. } => AppError::Gone(msg),
            BookingError::Schedule(e) => e.into(),
            BookingError::Listing(e) => e.into(),
            BookingError::Validation(_) => AppError::ValidationError(msg),
        }
    }
}

impl From<EligibilityError> for AppError {
    fn from(err: EligibilityError) -> Self {
        AppError::AuthorizationError(err.to_string())
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<ListingError> for AppError {
    fn from(err: ListingError) -> Self {
        match err {
            ListingError::Inactive(_) => AppError::ConflictError(err.to_string()),
            _ => AppError::ValidationError(err.to_string()),
        }
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::InvalidCard(_) => AppError::ValidationError(err.to_string()),
            PaymentError::Declined(_) => AppError::PaymentRequired(err.to_string()),
            PaymentError::Provider(msg) => AppError::BadGateway(msg),
        }
    }
}

impl From<InvoiceError> for AppError {
    fn from(err: InvoiceError) -> Self {
        match err {
            InvoiceError::InvalidTransition { .. } => AppError::ConflictError(err.to_string()),
            _ => AppError::ValidationError(err.to_string()),
        }
    }
}

impl From<MembershipError> for AppError {
    fn from(err: MembershipError) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use vela_core::BookingStatus;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_booking_errors_map_to_status_codes() {
        assert_eq!(
            status_of(BookingError::InvalidTransition { from: BookingStatus::Cancelled, action: "pay" }.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(BookingError::DeadlinePassed { deadline: Utc::now() }.into()),
            StatusCode::GONE
        );
        assert_eq!(
            status_of(BookingError::NotEligible(EligibilityError::BookingLimitReached { count: 10, limit: 10 }).into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(BookingError::Schedule(CatalogError::UnknownAirport("ZZZ".into())).into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_payment_errors_map_to_status_codes() {
        assert_eq!(status_of(PaymentError::Declined("no".into()).into()), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(status_of(PaymentError::Provider("down".into()).into()), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_storage_errors_are_hidden() {
        assert_eq!(
            status_of(CoreError::StorageError("redis: refused".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
