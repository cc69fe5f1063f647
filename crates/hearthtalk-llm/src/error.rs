//! Error types for the remote chat client.

/// Remote chat API failure, tagged by kind.
///
/// The client performs no retries; every failure propagates to the caller
/// unchanged so the turn boundary can decide how to present it.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The credential was rejected (HTTP 401/403).
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Any other non-success status from the remote API (rate limit,
    /// malformed request, server error).
    #[error("remote API error (HTTP {status}): {message}")]
    Status { status: u16, message: String },

    /// The request did not complete within the configured timeout.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// The remote API was unreachable.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The response body could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Outcome of a credential validation probe.
///
/// Splits failures into "the key is bad" (block setup) and "the API is
/// unreachable right now" (retry setup later).
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// The API rejected the credential; setup should not proceed.
    #[error("invalid API key: {0}")]
    InvalidAuth(#[source] ChatError),

    /// The API could not be reached; setup may be retried later.
    #[error("unable to connect to the chat API: {0}")]
    CannotConnect(#[source] ChatError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ChatError::Status {
            status: 429,
            message: "rate limited".to_string(),
        };
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("rate limited"));
    }
}
