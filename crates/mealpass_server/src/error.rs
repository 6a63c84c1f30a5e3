use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mealpass::ErrorKind;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    MealPass(#[from] mealpass::Error),
    #[error("Invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("Invalid day count {0:?}")]
    InvalidDays(String),
    #[error("Failed to render QR code: {0}")]
    QrCode(#[from] qrcode::types::QrError),
}

#[derive(Serialize)]
struct ErrorBody {
    kind: String,
    /// 前端直接展示这个字段
    message: String,
}

fn status_of(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::IdentityNotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidPlan | ErrorKind::InvalidDuration | ErrorKind::InvalidMember | ErrorKind::InvalidMealType => {
            StatusCode::BAD_REQUEST
        }
        ErrorKind::DuplicatePhone => StatusCode::CONFLICT,
        ErrorKind::NoSubscription | ErrorKind::Expired | ErrorKind::Exhausted => StatusCode::FORBIDDEN,
        ErrorKind::PersistenceFailure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            ApiError::MealPass(e) => (status_of(e.kind()), e.kind().to_string()),
            ApiError::InvalidDate(_) => (StatusCode::BAD_REQUEST, "InvalidDate".to_owned()),
            ApiError::InvalidDays(_) => (StatusCode::BAD_REQUEST, "InvalidDays".to_owned()),
            ApiError::QrCode(_) => (StatusCode::INTERNAL_SERVER_ERROR, "QrCode".to_owned()),
        };
        if status.is_server_error() {
            error!("Request failed: {self}");
        }
        let body = ErrorBody {
            kind,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use mealpass::Denial;

    use super::*;

    #[test]
    fn test_status_of_errors() {
        let testcases = [
            (ApiError::from(mealpass::Error::IdentityNotFound("x".to_owned())), StatusCode::NOT_FOUND),
            (ApiError::from(mealpass::Error::InvalidDuration(0)), StatusCode::BAD_REQUEST),
            (ApiError::from(mealpass::Error::from(Denial::Exhausted)), StatusCode::FORBIDDEN),
            (ApiError::from(mealpass::Error::DuplicatePhone("9".to_owned())), StatusCode::CONFLICT),
            (ApiError::InvalidDate("tomorrow".to_owned()), StatusCode::BAD_REQUEST),
            (ApiError::InvalidDays("thirty".to_owned()), StatusCode::BAD_REQUEST),
            (
                ApiError::from(qrcode::types::QrError::DataTooLong),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in testcases {
            assert_eq!(error.into_response().status(), status);
        }
    }
}
