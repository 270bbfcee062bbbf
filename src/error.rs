//! Error type shared by the library.

/// Errors returned by arcgis-hub operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Domain error raised by a named operation (e.g. `getCollection`).
    #[error("{message}")]
    Hub { operation: String, message: String },

    /// Structural problem with a search query, detected before any request.
    #[error("{0}")]
    Query(String),

    /// The entity instance was deleted and can no longer be used.
    #[error("Entity is already destroyed.")]
    Destroyed,

    /// Error body returned by the Portal sharing API.
    #[error("{message}")]
    Portal { code: u16, message: String },

    /// 404 Not Found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Network / connection error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build a domain error for the given operation.
    pub fn hub(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Hub {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Stable error name, independent of the message text.
    pub fn name(&self) -> &'static str {
        match self {
            Error::Hub { .. } | Error::Query(_) | Error::Destroyed => "HubError",
            Error::Portal { .. } => "ArcGISRequestError",
            Error::NotFound(_) => "NotFound",
            Error::Network(_) => "NetworkError",
            Error::Json(_) => "JsonError",
        }
    }

    /// The operation that raised a domain error, if any.
    pub fn operation(&self) -> Option<&str> {
        match self {
            Error::Hub { operation, .. } => Some(operation),
            _ => None,
        }
    }
}

/// Map an HTTP status + body to the appropriate error variant.
pub fn error_from_status(status: u16, body: &str) -> Error {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| portal_error_message(&v))
        .unwrap_or_else(|| body.to_string());

    match status {
        404 => Error::NotFound(message),
        _ => Error::Portal {
            code: status,
            message,
        },
    }
}

/// The Portal API reports most failures as `200 OK` with an `error` object.
pub fn error_from_portal_body(body: &serde_json::Value) -> Option<Error> {
    let error = body.get("error")?;
    let code = error
        .get("code")
        .and_then(|c| c.as_u64())
        .map(|c| c as u16)
        .unwrap_or(500);
    let message = portal_error_message(body).unwrap_or_else(|| "Unknown error".to_string());
    Some(Error::Portal { code, message })
}

fn portal_error_message(body: &serde_json::Value) -> Option<String> {
    let error = body.get("error")?;
    match error {
        serde_json::Value::String(s) => Some(s.clone()),
        other => other
            .get("message")
            .and_then(|m| m.as_str())
            .map(String::from),
    }
}
