//! Request envelope parsing.
//!
//! A request body is a JSON object carrying the module id, the handler
//! reference, the payload and the request context. [`parse_request`] checks
//! the fields in a fixed order so that the first violation always produces
//! the same message.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RequestError;

/// A validated request envelope.
///
/// The payload and context are kept as raw JSON and handed to the handler
/// unchanged. [`RuntimeRequest::typed_context`] decodes the context into
/// [`RuntimeContext`] for callers that want to inspect it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeRequest {
    module: String,
    handler: String,
    payload: Value,
    context: Value,
}

impl RuntimeRequest {
    /// Builds a request envelope from typed parts.
    ///
    /// # Errors
    ///
    /// Returns an error if the context cannot be serialised to JSON.
    pub fn new(
        module: impl Into<String>,
        handler: impl Into<String>,
        payload: Value,
        context: &RuntimeContext,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            module: module.into(),
            handler: handler.into(),
            payload,
            context: serde_json::to_value(context)?,
        })
    }

    /// Returns the module id.
    #[must_use]
    pub const fn module(&self) -> &str {
        self.module.as_str()
    }

    /// Returns the handler reference within the module.
    #[must_use]
    pub const fn handler(&self) -> &str {
        self.handler.as_str()
    }

    /// Returns the payload passed to the handler.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.payload
    }

    /// Returns the raw request context.
    #[must_use]
    pub const fn context(&self) -> &Value {
        &self.context
    }

    /// Returns the request id from the context, when present.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.context.pointer("/request/id").and_then(Value::as_str)
    }

    /// Decodes the context into its structured form.
    ///
    /// # Errors
    ///
    /// Returns an error if the context does not have the expected shape.
    pub fn typed_context(&self) -> Result<RuntimeContext, serde_json::Error> {
        RuntimeContext::deserialize(&self.context)
    }

    /// Serialises the envelope to the JSON body format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation fails.
    pub fn to_body(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Information about the originating request, passed to the handler as its
/// second argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeContext {
    /// API access for the handler.
    pub api: ApiContext,
    /// The client request that triggered the invocation.
    pub request: RequestContext,
    /// The project the module belongs to.
    pub project: ProjectContext,
    /// Module settings.
    #[serde(default)]
    pub settings: BTreeMap<String, SettingValue>,
}

/// API endpoint and temporary credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiContext {
    /// The GraphQL API endpoint.
    pub endpoint: String,
    /// Access token with the runtime role plus the roles of the caller.
    pub access_token: String,
}

/// Details of the client request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Client IP address.
    pub ip: String,
    /// Unique request id.
    pub id: String,
}

/// Project identification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectContext {
    /// Project alias.
    pub alias: String,
}

/// A single module setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    /// Boolean setting.
    Bool(bool),
    /// Numeric setting.
    Number(serde_json::Number),
    /// String setting.
    String(String),
}

/// Parses and validates a raw request body.
///
/// Fields are checked in this order: the body is an object, `module` is a
/// string, `handler` is a string, `context` is an object, and the `payload`
/// key is present (any value, including `null`).
///
/// # Example
///
/// ```
/// use slicknode_runtime::request::parse_request;
///
/// let body = br#"{"module":"m","handler":"h","payload":null,"context":{}}"#;
/// let request = parse_request(body).expect("valid body");
/// assert_eq!(request.module(), "m");
/// assert!(request.payload().is_null());
/// ```
///
/// # Errors
///
/// Returns the [`RequestError`] for the first violated rule.
pub fn parse_request(body: &[u8]) -> Result<RuntimeRequest, RequestError> {
    let value: Value = serde_json::from_slice(body).map_err(|err| RequestError::Syntax {
        message: err.to_string(),
    })?;
    let Value::Object(mut fields) = value else {
        return Err(RequestError::NotAnObject);
    };

    let module = take_string(&mut fields, "module").ok_or(RequestError::MissingModule)?;
    let handler = take_string(&mut fields, "handler").ok_or(RequestError::MissingHandler)?;
    let context = match fields.remove("context") {
        Some(context @ Value::Object(_)) => context,
        _ => return Err(RequestError::MissingContext),
    };
    let payload = fields
        .remove("payload")
        .ok_or(RequestError::MissingPayload)?;

    Ok(RuntimeRequest {
        module,
        handler,
        payload,
        context,
    })
}

fn take_string(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    match fields.remove(key) {
        Some(Value::String(value)) => Some(value),
        _ => None,
    }
}
