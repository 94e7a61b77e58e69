use std::fmt::Debug;

use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use serde_json::{json, Value};
use thiserror::Error;

use crate::constants::{EXIT_GENERIC_ERROR, EXIT_PROVIDER_ERROR};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("File not found: {path}")]
    NotFound { path: String },
    #[error("{message}")]
    InvalidArgument { message: String },
    #[error("Unsupported AWS account: {account_id}. This tool only supports the prod/dev accounts of the environment table.")]
    UnrecognizedEnvironment { account_id: String },
    #[error("{code}: {message}")]
    StoreClient { code: String, message: String },
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("{0}")]
    Unclassified(String),
}

impl AppError {
    /// Converts an SDK error. Only responses from the remote API become
    /// `StoreClient`; credential, connection and timeout failures never
    /// reached the provider and stay `Unclassified`.
    pub fn provider<E, R>(err: SdkError<E, R>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + 'static,
        R: Debug,
    {
        match err.as_service_error() {
            Some(service) => AppError::StoreClient {
                code: service.code().unwrap_or("Unknown").to_string(),
                message: match service.message() {
                    Some(message) => message.to_string(),
                    None => DisplayErrorContext(service).to_string(),
                },
            },
            None => AppError::Unclassified(DisplayErrorContext(&err).to_string()),
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::StoreClient { .. } => EXIT_PROVIDER_ERROR,
            _ => EXIT_GENERIC_ERROR,
        }
    }

    /// The single JSON object printed on stdout for a failed run.
    pub fn to_json(&self) -> Value {
        match self {
            AppError::StoreClient { code, message } => json!({
                "error": { "code": code, "message": message }
            }),
            other => json!({ "error": other.to_string() }),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        AppError::Unclassified(error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        AppError::Config(error.to_string())
    }
}
