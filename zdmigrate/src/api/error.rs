//! Transport-level error types produced by the API client

/// A read or write HTTP call failed, after the retry policy was exhausted.
///
/// During the read phase this is whole-run fatal: a partial catalog is
/// unsafe to plan against.
#[derive(Debug, Clone)]
pub struct TransportError {
    /// What was being attempted, e.g. "GET /api/v2/ticket_fields"
    pub operation: String,
    pub message: String,
    pub status: Option<u16>,
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed: {}", self.operation, self.message)
    }
}

impl std::error::Error for TransportError {}

/// A single entity's creation call was rejected or failed.
///
/// Entity-scoped: recorded in the migration report, never aborts the run.
#[derive(Debug, Clone)]
pub struct CreationError {
    pub status: Option<u16>,
    pub message: String,
}

impl std::fmt::Display for CreationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "creation rejected (HTTP {}): {}", status, self.message),
            None => write!(f, "creation failed: {}", self.message),
        }
    }
}

impl std::error::Error for CreationError {}

impl From<TransportError> for CreationError {
    fn from(err: TransportError) -> Self {
        Self {
            status: err.status,
            message: err.to_string(),
        }
    }
}
