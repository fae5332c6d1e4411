use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use dispatch_engine::DispatchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Payload deserialization error")]
    CouldNotDeserializePayload,
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The rider is not eligible for this order. {0}")]
    NotEligible(String),
    #[error("The request is no longer actionable. {0}")]
    NoLongerActionable(String),
    #[error("The order was claimed by another rider. {0}")]
    LostRace(DispatchError),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::CouldNotDeserializePayload => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::NotEligible(_) => StatusCode::FORBIDDEN,
            Self::NoLongerActionable(_) => StatusCode::PRECONDITION_FAILED,
            Self::LostRace(_) => StatusCode::CONFLICT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            // Give race losers a machine-readable outcome so rider apps can tell "someone else
            // got it" apart from "the order went away"
            Self::LostRace(DispatchError::AlreadyAssigned { winner }) => serde_json::json!({
                "error": self.to_string(),
                "outcome": "already_assigned",
                "winner": winner,
            }),
            Self::LostRace(DispatchError::NoLongerReady { status }) => serde_json::json!({
                "error": self.to_string(),
                "outcome": "no_longer_ready",
                "status": status.to_string(),
            }),
            Self::LostRace(_) => serde_json::json!({
                "error": self.to_string(),
                "outcome": "conflict",
            }),
            _ => serde_json::json!({ "error": self.to_string() }),
        };
        HttpResponse::build(self.status_code()).insert_header(ContentType::json()).body(body.to_string())
    }
}

impl From<DispatchError> for ServerError {
    fn from(e: DispatchError) -> Self {
        match e {
            DispatchError::DatabaseError(msg) => Self::BackendError(format!("Database error: {msg}")),
            DispatchError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            DispatchError::RiderNotFound(_) => Self::NoRecordFound(e.to_string()),
            DispatchError::RequestNotFound => Self::NoRecordFound(e.to_string()),
            DispatchError::RiderInactive(_) => Self::NotEligible(e.to_string()),
            DispatchError::NoVendorAffiliation => Self::NotEligible(e.to_string()),
            DispatchError::NotNotified => Self::NotEligible(e.to_string()),
            DispatchError::RequestNotPending { .. } => Self::NoLongerActionable(e.to_string()),
            DispatchError::AlreadyAssigned { .. } | DispatchError::NoLongerReady { .. } | DispatchError::Conflict => {
                Self::LostRace(e)
            },
        }
    }
}
