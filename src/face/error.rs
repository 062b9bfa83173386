use serde_json::Value;
use thiserror::Error;

/// Statuses the recognition service returns while it is restarting or
/// overloaded. Only these (and transport failures) are retried.
pub const RETRY_STATUSES: [u16; 3] = [502, 503, 504];

#[derive(Debug, Error)]
pub enum FaceApiError {
    #[error("face API is disabled by settings")]
    Disabled,

    #[error("no face images provided for enrollment")]
    NoImages,

    #[error("could not reach face API: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("{path} returned {status}: {detail}")]
    Service {
        path: String,
        status: u16,
        /// Parsed JSON body, or the raw text as a JSON string.
        detail: Value,
    },
}

impl FaceApiError {
    pub(crate) async fn from_response(path: &str, response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let detail = match response.text().await {
            Ok(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
            Err(e) => Value::String(e.to_string()),
        };

        FaceApiError::Service {
            path: path.to_string(),
            status,
            detail,
        }
    }

    /// Whether another attempt might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FaceApiError::Transport(_) => true,
            FaceApiError::Service { status, .. } => RETRY_STATUSES.contains(status),
            FaceApiError::Disabled | FaceApiError::NoImages => false,
        }
    }
}
