//! Response envelope returned for every request.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of a request.
///
/// Successful invocations carry the handler result in `data`. Failures carry
/// an `error` with a message and set `data` to `null`, which is always
/// serialised.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use slicknode_runtime::RuntimeResponse;
///
/// let response = RuntimeResponse::failure("boom");
/// assert_eq!(
///     serde_json::to_value(&response).expect("serialise"),
///     json!({"data": null, "error": {"message": "boom"}}),
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeResponse {
    #[serde(default)]
    data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<ResponseError>,
}

/// Error details of a failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseError {
    message: String,
}

impl ResponseError {
    /// Returns the error message.
    #[must_use]
    pub const fn message(&self) -> &str {
        self.message.as_str()
    }
}

impl RuntimeResponse {
    /// Wraps a handler result.
    #[must_use]
    pub const fn success(data: Value) -> Self {
        Self { data, error: None }
    }

    /// Builds a failure envelope with `data` set to `null`.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            data: Value::Null,
            error: Some(ResponseError {
                message: message.into(),
            }),
        }
    }

    /// Returns the result data (`null` on failure).
    #[must_use]
    pub const fn data(&self) -> &Value {
        &self.data
    }

    /// Returns the error, if the request failed.
    #[must_use]
    pub const fn error(&self) -> Option<&ResponseError> {
        self.error.as_ref()
    }

    /// Returns the error message, if the request failed.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(ResponseError::message)
    }

    /// Returns `true` when the request succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Consumes the response and returns the data.
    #[must_use]
    pub fn into_data(self) -> Value {
        self.data
    }
}
