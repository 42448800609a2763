//! RPC status codes and the backend error mapping.

use std::fmt;

use fluxq_kubehub::BackendError;
use serde::{Deserialize, Serialize};

/// Status codes the query API can answer with. Numeric values follow gRPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Code {
    InvalidArgument,
    NotFound,
    Internal,
}

impl Code {
    pub fn as_i32(self) -> i32 {
        match self {
            Code::InvalidArgument => 3,
            Code::NotFound => 5,
            Code::Internal => 13,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Code::InvalidArgument => "invalid_argument",
            Code::NotFound => "not_found",
            Code::Internal => "internal",
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by every query API call: a code plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct Status {
    code: Code,
    message: String,
}

impl Status {
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self { Self::new(Code::InvalidArgument, message) }
    pub fn not_found(message: impl Into<String>) -> Self { Self::new(Code::NotFound, message) }
    pub fn internal(message: impl Into<String>) -> Self { Self::new(Code::Internal, message) }

    pub fn code(&self) -> Code { self.code }
    pub fn message(&self) -> &str { &self.message }
}

pub type ApiResult<T> = Result<T, Status>;

impl From<BackendError> for Status {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::NotFound { kind, namespace, name } => {
                Status::not_found(format!("{} \"{}\" not found in namespace \"{}\"", kind, name, namespace))
            }
            // `{:#}` renders the whole context chain on one line.
            BackendError::Other(cause) => Status::internal(format!("backend request failed: {:#}", cause)),
        }
    }
}

/// Reject an empty required request field before anything is sent to the backend.
pub fn require(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(Status::invalid_argument(format!("{} is required", field)));
    }
    Ok(())
}

/// A namespace must be a DNS-1123 label: at most 63 chars of `[a-z0-9-]`,
/// starting and ending alphanumeric.
pub fn valid_namespace(value: &str) -> ApiResult<()> {
    require("namespace", value)?;
    if value.len() > 63 || !dns_label(value) {
        return Err(Status::invalid_argument(format!("namespace {:?} is not a valid DNS-1123 label", value)));
    }
    Ok(())
}

/// An object name must be a DNS-1123 subdomain: at most 253 chars, dot-separated labels.
/// This keeps path separators and dot segments out of request URLs.
pub fn valid_name(value: &str) -> ApiResult<()> {
    require("name", value)?;
    if value.len() > 253 || !value.split('.').all(dns_label) {
        return Err(Status::invalid_argument(format!("name {:?} is not a valid DNS-1123 subdomain", value)));
    }
    Ok(())
}

fn dns_label(s: &str) -> bool {
    let alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    match (s.chars().next(), s.chars().last()) {
        (Some(first), Some(last)) => alnum(first) && alnum(last) && s.chars().all(|c| alnum(c) || c == '-'),
        _ => false,
    }
}
