//! Mapping raw failures onto the taxonomy.
//!
//! Everything here is a pure function of its inputs. The handler adds
//! logging and notification on top.

use crate::error::PipelineError;
use crate::taxonomy::{Category, ErrorContext, ErrorRecord, ErrorRecordBuilder, RaisedError, Severity};
use serde::Serialize;
use std::collections::BTreeMap;

/// Shape of a failed REST call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiFailure {
    /// The server replied with a non-success status.
    Response { status: u16, body: Option<String> },
    /// The request was sent but no reply arrived.
    NoResponse { message: String },
    /// The request could not even be built or sent.
    Setup { message: String },
}

impl ApiFailure {
    pub fn status(status: u16) -> Self {
        Self::Response { status, body: None }
    }

    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            return Self::Response {
                status: status.as_u16(),
                body: None,
            };
        }
        if error.is_builder() {
            return Self::Setup {
                message: error.to_string(),
            };
        }
        Self::NoResponse {
            message: error.to_string(),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Response {
                status,
                body: Some(body),
            } => format!("status {status}: {body}"),
            Self::Response { status, body: None } => format!("status {status}"),
            Self::NoResponse { message } => format!("no response: {message}"),
            Self::Setup { message } => format!("request setup failed: {message}"),
        }
    }
}

/// Classify a failed REST call to `method endpoint`.
///
/// | Failure | Category | Severity | Retryable |
/// |---------|----------|----------|-----------|
/// | 400 | validation | low | no |
/// | 401 | auth | high | yes |
/// | 403 | permission | medium | no |
/// | 404 | notfound | low | no |
/// | 429 | api | medium | yes |
/// | 5xx | api | medium | yes |
/// | no response | network | medium | yes |
/// | anything else | unknown | medium | no |
pub fn classify_api_error(failure: &ApiFailure, endpoint: &str, method: &str) -> ErrorRecord {
    api_builder(failure, endpoint, method).build()
}

pub(crate) fn api_builder(failure: &ApiFailure, endpoint: &str, method: &str) -> ErrorRecordBuilder {
    let message = format!(
        "API {} {} failed with {}",
        method.to_uppercase(),
        endpoint,
        failure.describe()
    );

    let mut context = ErrorContext::new()
        .with_metadata("endpoint", endpoint)
        .with_metadata("method", method.to_uppercase());

    let (category, severity, code, retryable) = match failure {
        ApiFailure::Response { status, .. } => {
            context = context.with_metadata("status", status);
            match status {
                400 => (Category::Validation, Severity::Low, "BAD_REQUEST".to_string(), false),
                401 => (Category::Auth, Severity::High, "UNAUTHORIZED".to_string(), true),
                403 => (Category::Permission, Severity::Medium, "FORBIDDEN".to_string(), false),
                404 => (Category::NotFound, Severity::Low, "NOT_FOUND".to_string(), false),
                429 => (Category::Api, Severity::Medium, "RATE_LIMITED".to_string(), true),
                500..=599 => (Category::Api, Severity::Medium, "SERVER_ERROR".to_string(), true),
                other => (Category::Unknown, Severity::Medium, format!("HTTP_{other}"), false),
            }
        }
        ApiFailure::NoResponse { .. } => (
            Category::Network,
            Severity::Medium,
            "NETWORK_ERROR".to_string(),
            true,
        ),
        ApiFailure::Setup { .. } => (
            Category::Unknown,
            Severity::Medium,
            "REQUEST_SETUP".to_string(),
            false,
        ),
    };

    ErrorRecord::builder(category, message)
        .severity(severity)
        .code(code)
        .retryable(retryable)
        .recoverable(true)
        .context(context)
}

/// Classify client-side form validation. Field messages are user-authored
/// validation text, so the field names appear in the user message.
pub fn classify_form_error(form: &str, field_errors: &BTreeMap<String, String>) -> ErrorRecord {
    let fields: Vec<&str> = field_errors.keys().map(String::as_str).collect();
    let message = format!(
        "Form '{form}' failed validation: {}",
        field_errors
            .iter()
            .map(|(field, error)| format!("{field}: {error}"))
            .collect::<Vec<_>>()
            .join("; ")
    );

    let user_message = match field_errors.iter().next() {
        Some((field, error)) if field_errors.len() == 1 => format!("{field}: {error}"),
        _ => format!("Please correct the following fields: {}.", fields.join(", ")),
    };

    ErrorRecord::builder(Category::Validation, message)
        .name("FormError")
        .code("FORM_VALIDATION")
        .user_message(user_message)
        .context(
            ErrorContext::new()
                .with_metadata("form", form)
                .with_metadata("fields", field_errors),
        )
        .build()
}

/// Metadata of a file involved in a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMeta {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: Option<String>,
}

/// Why a file operation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileFailure {
    TooLarge { max_bytes: u64 },
    UnsupportedType { allowed: Vec<String> },
    UploadFailed { message: String },
    ReadFailed { message: String },
}

/// Classify a file failure. Upload failures are the only retryable kind.
pub fn classify_file_error(file: &FileMeta, failure: &FileFailure) -> ErrorRecord {
    let (message, code, user_message, retryable) = match failure {
        FileFailure::TooLarge { max_bytes } => (
            format!(
                "File '{}' is {} bytes, limit is {max_bytes}",
                file.name, file.size_bytes
            ),
            "FILE_TOO_LARGE",
            format!(
                "The file is too large. The maximum size is {}.",
                human_size(*max_bytes)
            ),
            false,
        ),
        FileFailure::UnsupportedType { allowed } => (
            format!(
                "File '{}' has unsupported type {}",
                file.name,
                file.mime_type.as_deref().unwrap_or("unknown")
            ),
            "FILE_TYPE_UNSUPPORTED",
            format!(
                "This file type is not supported. Allowed types: {}.",
                allowed.join(", ")
            ),
            false,
        ),
        FileFailure::UploadFailed { message } => (
            format!("Upload of '{}' failed: {message}", file.name),
            "FILE_UPLOAD_FAILED",
            "The file could not be uploaded. Please try again.".to_string(),
            true,
        ),
        FileFailure::ReadFailed { message } => (
            format!("Reading '{}' failed: {message}", file.name),
            "FILE_READ_FAILED",
            Category::File.default_user_message().to_string(),
            false,
        ),
    };

    ErrorRecord::builder(Category::File, message)
        .code(code)
        .user_message(user_message)
        .retryable(retryable)
        .context(ErrorContext::new().with_metadata("file", file))
        .build()
}

/// Classify a Postgres / PostgREST error code.
pub fn classify_database_error(code: Option<&str>, message: &str) -> ErrorRecord {
    let context = ErrorContext::new().with_metadata("db_code", code);
    let builder = match code {
        Some("PGRST116") => ErrorRecord::builder(Category::NotFound, message).code("NOT_FOUND"),
        Some("23505") => ErrorRecord::builder(Category::Validation, message)
            .code("DUPLICATE")
            .user_message("A record with these details already exists."),
        Some("42501") => ErrorRecord::builder(Category::Permission, message).code("FORBIDDEN"),
        Some(other) => ErrorRecord::builder(Category::Database, message).code(other),
        None => ErrorRecord::builder(Category::Database, message).code("DATABASE_ERROR"),
    };
    builder.context(context).build()
}

/// Classify a failed payment or donation. Always critical and final.
pub fn classify_payment_error(message: &str, provider_code: Option<&str>) -> ErrorRecord {
    ErrorRecord::builder(Category::Payment, message)
        .code(provider_code.unwrap_or("PAYMENT_FAILED"))
        .context(ErrorContext::new().with_metadata("provider_code", provider_code))
        .build()
}

/// Classify whatever an operation raised.
pub fn classify_raised(error: &RaisedError) -> ErrorRecord {
    match error {
        RaisedError::Classified(record) => record.clone(),
        RaisedError::Unclassified(raw) => classify_unclassified(raw),
    }
}

/// Classify a raw error by looking for known types anywhere in its chain.
pub fn classify_unclassified(error: &anyhow::Error) -> ErrorRecord {
    let stack = format!("{error:?}");

    if let Some(record) = error.chain().find_map(|e| e.downcast_ref::<ErrorRecord>()) {
        return record.clone();
    }

    if let Some(pipeline) = error.chain().find_map(|e| e.downcast_ref::<PipelineError>()) {
        return ErrorRecord::from(pipeline);
    }

    if let Some(http) = error.chain().find_map(|e| e.downcast_ref::<reqwest::Error>()) {
        let endpoint = http
            .url()
            .map(|u| u.path().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        return api_builder(&ApiFailure::from_reqwest(http), &endpoint, "UNKNOWN")
            .stack(stack)
            .build();
    }

    if let Some(io) = error.chain().find_map(|e| e.downcast_ref::<std::io::Error>()) {
        return io_builder(io, error.to_string()).stack(stack).build();
    }

    if error
        .chain()
        .any(|e| e.downcast_ref::<serde_json::Error>().is_some())
    {
        return ErrorRecord::builder(Category::Validation, error.to_string())
            .code("MALFORMED_DATA")
            .stack(stack)
            .build();
    }

    ErrorRecord::builder(Category::Unknown, error.to_string())
        .name("Error")
        .stack(stack)
        .build()
}

fn io_builder(error: &std::io::Error, message: String) -> ErrorRecordBuilder {
    use std::io::ErrorKind;

    match error.kind() {
        ErrorKind::ConnectionRefused
        | ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::NotConnected
        | ErrorKind::BrokenPipe
        | ErrorKind::TimedOut => {
            ErrorRecord::builder(Category::Network, message).code("NETWORK_ERROR")
        }
        ErrorKind::PermissionDenied => {
            ErrorRecord::builder(Category::Permission, message).code("FORBIDDEN")
        }
        ErrorKind::NotFound => ErrorRecord::builder(Category::NotFound, message).code("NOT_FOUND"),
        _ => ErrorRecord::builder(Category::File, message).code("IO_ERROR"),
    }
}

fn human_size(bytes: u64) -> String {
    const MB: u64 = 1024 * 1024;
    const KB: u64 = 1024;
    if bytes >= MB && bytes % MB == 0 {
        format!("{} MB", bytes / MB)
    } else if bytes >= KB && bytes % KB == 0 {
        format!("{} KB", bytes / KB)
    } else {
        format!("{bytes} bytes")
    }
}
