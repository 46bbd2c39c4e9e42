//! Error to HTTP response mapping.
//!
//! | error                         | status | `error`             |
//! |-------------------------------|--------|---------------------|
//! | validation                    | 400    | `invalid_payload`   |
//! | malformed JSON / query        | 400    | `bad_json`          |
//! | unknown reservation or bet    | 404    | `not_found`         |
//! | insufficient funds            | 409    | `insufficient_funds`|
//! | balance would overflow        | 409    | `balance_overflow`  |
//! | stale odd                     | 409    | `odd_changed`       |
//! | reservation failed upstream   | 409    | `reserve_failed`    |
//! | anything else                 | 500    | `internal`          |

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use crate::adapter::wire::ApiErrorBody;
use crate::error::{Error, LedgerError, PlacementError};

/// An error on its way to the caller.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ApiErrorBody,
}

impl ApiError {
    fn new(status: StatusCode, error: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiErrorBody {
                error: error.to_string(),
                message: message.into(),
                current_odd: None,
            },
        }
    }

    /// 404 for a lookup that found nothing.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn body(&self) -> &ApiErrorBody {
        &self.body
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let message = err.to_string();
        match err {
            Error::Domain(_) => Self::new(StatusCode::BAD_REQUEST, "invalid_payload", message),
            Error::Ledger(LedgerError::InsufficientFunds { .. }) => {
                Self::new(StatusCode::CONFLICT, "insufficient_funds", message)
            }
            Error::Ledger(LedgerError::BalanceOverflow { .. }) => {
                Self::new(StatusCode::CONFLICT, "balance_overflow", message)
            }
            Error::Ledger(LedgerError::NotFound { .. }) | Error::NotFound { .. } => {
                Self::not_found(message)
            }
            Error::Placement(PlacementError::OddChanged { current, .. }) => {
                let mut api = Self::new(StatusCode::CONFLICT, "odd_changed", message);
                api.body.current_odd = Some(current);
                api
            }
            Error::Placement(PlacementError::ReserveFailed { .. }) => {
                Self::new(StatusCode::CONFLICT, "reserve_failed", message)
            }
            other => {
                error!(error = %other, "Request failed");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "internal error",
                )
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_json", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_json", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;
    use rust_decimal_macros::dec;

    #[test]
    fn validation_is_bad_request() {
        let api = ApiError::from(Error::from(DomainError::MissingField { field: "userId" }));
        assert_eq!(api.status(), StatusCode::BAD_REQUEST);
        assert_eq!(api.body().error, "invalid_payload");
    }

    #[test]
    fn stale_odd_carries_current_quote() {
        let api = ApiError::from(Error::from(PlacementError::OddChanged {
            submitted: dec!(2.0),
            current: dec!(2.5),
        }));
        assert_eq!(api.status(), StatusCode::CONFLICT);
        assert_eq!(api.body().current_odd, Some(dec!(2.5)));
    }

    #[test]
    fn missing_reservation_is_not_found() {
        let api = ApiError::from(Error::from(LedgerError::NotFound {
            external_ref: "bet-1".into(),
        }));
        assert_eq!(api.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn balance_overflow_is_a_conflict() {
        let api = ApiError::from(Error::from(LedgerError::BalanceOverflow { requested: 1 }));
        assert_eq!(api.status(), StatusCode::CONFLICT);
        assert_eq!(api.body().error, "balance_overflow");
    }

    #[test]
    fn infrastructure_failures_hide_details() {
        let api = ApiError::from(Error::Database("disk I/O error".into()));
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.body().message, "internal error");
    }
}
