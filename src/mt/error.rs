/// Error types for translation providers
///
/// These never cross the provider boundary: `TranslationProvider::translate`
/// logs them and reports an absent result so the chain can fall through.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider lacks the key or URL it needs
    #[error("provider not configured: {0}")]
    NotConfigured(&'static str),
    /// Transport failure, including request timeouts
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Back-end answered with a non-success status
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    /// Back-end answered 2xx with a payload we cannot read
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ProviderError {
    /// Build a `Status` error from a failed response, keeping a short body excerpt
    pub(crate) async fn from_response(response: reqwest::Response, limit: usize) -> Self {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        ProviderError::Status {
            status,
            body: body.chars().take(limit).collect(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Network(e) if e.is_timeout())
    }
}

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;
