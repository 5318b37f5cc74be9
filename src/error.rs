use actix_web::{
    http::{header, StatusCode},
    HttpResponse, ResponseError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Empty index: {0}")]
    EmptyIndex(String),

    #[error("No document indexed yet. Please upload a PDF first.")]
    NoIndex,

    #[error("No query provided.")]
    InvalidQuery,

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Generation error: {0}")]
    Generation(#[source] anyhow::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        let message = match self {
            AppError::Extraction(ref e) => {
                tracing::error!("Extraction error: {:?}", e);
                self.to_string()
            }
            AppError::EmptyIndex(ref e) => {
                tracing::error!("Empty index: {:?}", e);
                self.to_string()
            }
            AppError::Embedding(ref e) => {
                tracing::error!("Embedding error: {:?}", e);
                self.to_string()
            }
            AppError::Generation(ref e) => {
                tracing::error!("Generation error: {:?}", e);
                self.to_string()
            }
            AppError::Io(ref e) => {
                tracing::error!("IO error: {:?}", e);
                "IO error".to_string()
            }
            _ => self.to_string(),
        };

        // CORS headers are set here as well so they are present even when an
        // error short-circuits before the CORS middleware runs.
        HttpResponse::build(status)
            .insert_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
            .json(ErrorResponse { error: message })
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Extraction(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::EmptyIndex(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NoIndex => StatusCode::BAD_REQUEST,
            AppError::InvalidQuery => StatusCode::BAD_REQUEST,
            AppError::Embedding(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Generation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
