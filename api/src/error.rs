use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chronolog::ChronoLogError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Session(#[from] ChronoLogError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Session(err) if err.is_validation() => StatusCode::BAD_REQUEST,
            ApiError::Session(err) => match err {
                ChronoLogError::WalletUnavailable
                | ChronoLogError::NoAccounts
                | ChronoLogError::NotConnected
                | ChronoLogError::WrongNetwork { .. }
                | ChronoLogError::ContractNotInitialized
                | ChronoLogError::ReadOnlyHandle => StatusCode::CONFLICT,
                ChronoLogError::SubmissionPending => StatusCode::TOO_MANY_REQUESTS,
                _ => StatusCode::BAD_GATEWAY,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ChronoLogError::EmptyContent, StatusCode::BAD_REQUEST),
            (ChronoLogError::UnlockTimeNotInFuture, StatusCode::BAD_REQUEST),
            (ChronoLogError::NotConnected, StatusCode::CONFLICT),
            (
                ChronoLogError::WrongNetwork {
                    chain_name: "Arbitrum Sepolia".to_string(),
                    expected: 421614,
                    actual: 1,
                },
                StatusCode::CONFLICT,
            ),
            (ChronoLogError::SubmissionPending, StatusCode::TOO_MANY_REQUESTS),
            (
                ChronoLogError::TransactionFailed("boom".to_string()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ChronoLogError::FetchFailed("boom".to_string()),
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn test_message_passes_through() {
        let err = ApiError::from(ChronoLogError::EmptyContent);
        assert_eq!(err.to_string(), "Content cannot be empty.");
    }

    #[test]
    fn test_invalid_request_is_bad_request() {
        let err = ApiError::InvalidRequest("missing field `content`".to_string());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid request: missing field `content`");
    }
}
