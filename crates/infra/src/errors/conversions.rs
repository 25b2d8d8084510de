//! Conversions from external infrastructure errors into domain errors.

use calrelay_domain::CalRelayError;
use reqwest::Error as HttpError;
use reqwest::StatusCode;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub CalRelayError);

impl From<InfraError> for CalRelayError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<CalRelayError> for InfraError {
    fn from(value: CalRelayError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoCalRelayError {
    fn into_calrelay(self) -> CalRelayError;
}

/// Map a non-success HTTP status to a domain error.
///
/// `410 Gone` is left to callers that attach meaning to it; here it is an
/// ordinary client error.
pub fn status_error(status: StatusCode, body: &str) -> CalRelayError {
    let code = status.as_u16();
    let mut message = format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));
    let body = body.trim();
    if !body.is_empty() {
        message.push_str(": ");
        message.extend(body.chars().take(512));
    }

    match code {
        401 | 403 => CalRelayError::Auth(message),
        404 => CalRelayError::NotFound(message),
        429 => CalRelayError::Network(message),
        400..=499 => CalRelayError::InvalidInput(message),
        _ => CalRelayError::Network(message),
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → CalRelayError */
/* -------------------------------------------------------------------------- */

impl IntoCalRelayError for HttpError {
    fn into_calrelay(self) -> CalRelayError {
        if self.is_timeout() {
            return CalRelayError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return CalRelayError::Network("HTTP connection failure".into());
        }

        if self.is_decode() {
            return CalRelayError::Provider(format!("failed to decode HTTP response: {self}"));
        }

        if let Some(status) = self.status() {
            return status_error(status, "");
        }

        CalRelayError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_calrelay())
    }
}

/* -------------------------------------------------------------------------- */
/* I/O and serialization errors → CalRelayError */
/* -------------------------------------------------------------------------- */

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        InfraError(CalRelayError::Storage(value.to_string()))
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(CalRelayError::Storage(format!("invalid JSON record: {value}")))
    }
}

impl From<tempfile::PersistError> for InfraError {
    fn from(value: tempfile::PersistError) -> Self {
        InfraError(CalRelayError::Storage(format!("atomic rename failed: {}", value.error)))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
