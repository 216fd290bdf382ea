//! Error types for engine interactions

/// Errors from the workflow engine and the artifact crawl.
#[derive(Debug, thiserror::Error)]
pub enum ArgoError {
    /// Transport-level failure or unreadable response
    #[error("engine request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Engine answered with a non-success status
    #[error("engine returned status {status} for {url}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Definition rejected by the engine's lint call
    #[error("workflow rejected by lint: {0}")]
    Validation(String),

    /// Run document missing a part the operation needs
    #[error("malformed run document: {0}")]
    MalformedRun(String),

    /// Artifact URL could not be built or joined
    #[error("invalid artifact url: {0}")]
    Url(String),

    /// Content-disposition header carried no usable filename
    #[error("unparseable content disposition: {0}")]
    BadDisposition(String),
}

/// Pass a response through, or turn a non-success status into an error.
pub(crate) fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ArgoError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ArgoError::Status {
            status: status.as_u16(),
            url: response.url().to_string(),
        })
    }
}
