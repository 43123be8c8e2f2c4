use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use thiserror::Error;
use trading_engine::OrderFlowError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("The X-User-Id header is missing or unreadable")]
    MissingUserId,
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error(transparent)]
    OrderFlow(#[from] OrderFlowError),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::MissingUserId => StatusCode::UNAUTHORIZED,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::OrderFlow(e) => match e {
                OrderFlowError::Validation(_) => StatusCode::BAD_REQUEST,
                OrderFlowError::NoReferencePrice(_) => StatusCode::BAD_REQUEST,
                OrderFlowError::KycRequired => StatusCode::FORBIDDEN,
                OrderFlowError::UserNotFound(_) => StatusCode::NOT_FOUND,
                OrderFlowError::CompanyNotFound(_) => StatusCode::NOT_FOUND,
                OrderFlowError::OrderNotFound(_) => StatusCode::NOT_FOUND,
                OrderFlowError::CompanyInactive(_) => StatusCode::CONFLICT,
                OrderFlowError::InsufficientFunds { .. } => StatusCode::CONFLICT,
                OrderFlowError::InsufficientHoldings { .. } => StatusCode::CONFLICT,
                OrderFlowError::InvalidState { .. } => StatusCode::CONFLICT,
                OrderFlowError::Concurrency(_) => StatusCode::SERVICE_UNAVAILABLE,
                OrderFlowError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}
