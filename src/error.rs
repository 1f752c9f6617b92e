//! Error types for the SELFNET NBI gateways
//!
//! Every fallible operation in the crate returns `Result<T, Error>`. Each
//! variant knows the HTTP status and the stable short code it is reported
//! with, so handlers can simply propagate with `?` and let the
//! [`IntoResponse`] implementation shape the `{title, description, code}`
//! body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

/// Stable error codes carried in the `code` field of error bodies
pub mod code {
    pub const INVALID_JSON: &str = "001";
    pub const SCHEMA_VALIDATION: &str = "002";
    pub const BACKEND_TIMEOUT: &str = "100";
    pub const BACKEND_CONNECTION: &str = "101";
    pub const BACKEND_FAILURE: &str = "102";
    pub const BACKEND_STATUS: &str = "103";
    pub const DATABASE: &str = "105";
    pub const INVALID_LIMIT: &str = "202";
    pub const INVALID_SEARCH: &str = "203";
    pub const INVALID_DATE: &str = "204";
    pub const INVALID_CURSOR: &str = "205";
    pub const NO_UPDATE_DATA: &str = "211";
    pub const NO_PACKAGE: &str = "215";
    pub const MISSING_METRIC: &str = "300";
    pub const UNAUTHORIZED: &str = "401";
    pub const FORBIDDEN: &str = "403";
    pub const NOT_FOUND: &str = "404";
    pub const INTERNAL: &str = "500";
}

/// The main error type for the gateways
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Client Errors
    // ============================================================================
    #[error("{title}: {description}")]
    InvalidParameter {
        title: String,
        description: String,
        code: &'static str,
    },

    #[error("Invalid data: {description}")]
    InvalidBody { description: String },

    #[error("Failed data validation: {description}")]
    SchemaValidation { description: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("Unauthorized: {description}")]
    Unauthorized { description: String },

    #[error("Permission denied")]
    Forbidden,

    // ============================================================================
    // Backend Errors
    // ============================================================================
    #[error("{service} timeout")]
    Timeout { service: String },

    #[error("{service} connection error")]
    Connection { service: String },

    #[error("Failed to process request on {service}")]
    BackendFailure { service: String },

    #[error("{service} returned HTTP {status}: {body}")]
    BackendStatus {
        service: String,
        status: u16,
        body: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    // ============================================================================
    // Database Errors
    // ============================================================================
    #[error("Database error: {message}")]
    Database { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a 400 error for a malformed query parameter
    pub fn invalid_parameter(description: impl Into<String>, code: &'static str) -> Self {
        Self::InvalidParameter {
            title: "Invalid Parameter".to_string(),
            description: description.into(),
            code,
        }
    }

    /// Create a 400 error with a custom title
    pub fn bad_request(
        title: impl Into<String>,
        description: impl Into<String>,
        code: &'static str,
    ) -> Self {
        Self::InvalidParameter {
            title: title.into(),
            description: description.into(),
            code,
        }
    }

    /// Create a schema validation error
    pub fn schema(description: impl Into<String>) -> Self {
        Self::SchemaValidation {
            description: description.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized(description: impl Into<String>) -> Self {
        Self::Unauthorized {
            description: description.into(),
        }
    }

    /// Create a database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Create a backend status error
    pub fn backend_status(service: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::BackendStatus {
            service: service.into(),
            status,
            body: body.into(),
        }
    }

    /// HTTP status this error is reported with
    pub fn status(&self) -> StatusCode {
        match self {
            Error::InvalidParameter { .. }
            | Error::InvalidBody { .. }
            | Error::SchemaValidation { .. } => StatusCode::BAD_REQUEST,
            Error::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
            Error::BackendStatus { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable short code identifying the failure category
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidParameter { code, .. } => *code,
            Error::InvalidBody { .. } => code::INVALID_JSON,
            Error::SchemaValidation { .. } => code::SCHEMA_VALIDATION,
            Error::Unauthorized { .. } => code::UNAUTHORIZED,
            Error::Forbidden => code::FORBIDDEN,
            Error::NotFound { .. } => code::NOT_FOUND,
            Error::Timeout { .. } => code::BACKEND_TIMEOUT,
            Error::Connection { .. } | Error::Http(_) => code::BACKEND_CONNECTION,
            Error::BackendFailure { .. } => code::BACKEND_FAILURE,
            Error::BackendStatus { .. } => code::BACKEND_STATUS,
            Error::Database { .. } => code::DATABASE,
            _ => code::INTERNAL,
        }
    }

    /// Short human title for the error body
    pub fn title(&self) -> String {
        match self {
            Error::InvalidParameter { title, .. } => title.clone(),
            Error::InvalidBody { .. } => "Invalid data".to_string(),
            Error::SchemaValidation { .. } => "Failed data validation".to_string(),
            Error::Unauthorized { .. } => "You are not authorized".to_string(),
            Error::Forbidden => "Permission Denied".to_string(),
            Error::NotFound { .. } => "Not Found".to_string(),
            Error::Timeout { service } => format!("{service} Timeout"),
            Error::Connection { service } => format!("{service} Connection Error"),
            Error::BackendFailure { service } => format!("Failed to process request on {service}"),
            Error::BackendStatus { service, .. } => format!("{service} Error"),
            Error::Database { .. } => "Database Error".to_string(),
            _ => "Internal Server Error".to_string(),
        }
    }

    /// Longer description for the error body
    pub fn description(&self) -> String {
        match self {
            Error::InvalidParameter { description, .. }
            | Error::InvalidBody { description }
            | Error::SchemaValidation { description }
            | Error::Unauthorized { description } => description.clone(),
            Error::Forbidden => "You Are not allowed to consume this resource".to_string(),
            Error::NotFound { resource } => format!("{resource} not found"),
            Error::Timeout { service } => format!("{service} connection timeout"),
            Error::Connection { service } => format!("{service} connection error"),
            Error::BackendStatus { body, .. } => body.clone(),
            // Internal details stay in the logs
            Error::Config { .. }
            | Error::InvalidConfigValue { .. }
            | Error::YamlParse(_)
            | Error::Io(_)
            | Error::Other(_) => "The server failed to process the request".to_string(),
            other => other.to_string(),
        }
    }

    /// Timeouts and connection failures may succeed when the client retries;
    /// the gateway itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Timeout { .. } | Error::Connection { .. } | Error::Http(_)
        )
    }

    /// Build the wire body for this error
    pub fn body(&self) -> ApiErrorBody {
        ApiErrorBody {
            title: self.title(),
            description: self.description(),
            code: self.code().to_string(),
        }
    }
}

/// Structured error body returned to HTTP callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub title: String,
    pub description: String,
    pub code: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.is_retryable() {
            warn!(code = self.code(), "{self}");
        } else if status.is_server_error() {
            error!("{self}");
        }
        (status, Json(self.body())).into_response()
    }
}

/// Result type alias for the gateways
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
