use thiserror::Error;

/// Errors local to one client connection. None of these ever reach an accept loop.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The client closed the stream before sending a required line.
    #[error("missing {0} line")]
    MissingLine(&'static str),

    /// The session token line did not parse as an integer.
    #[error("invalid session token '{0}'")]
    InvalidToken(String),

    /// A request line exceeded the configured byte limit.
    #[error("request line exceeds {0} bytes")]
    LineTooLong(usize),

    /// The request line was not valid UTF-8.
    #[error("request line is not valid utf-8")]
    InvalidUtf8,

    /// A read or write did not finish within the per-connection deadline.
    #[error("connection timed out")]
    Timeout,

    /// Transport failure (reset, broken pipe, ...).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    /// Transport-level failures a client may simply retry on a new connection.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProtocolError::Timeout | ProtocolError::Io(_))
    }

    /// Text sent back to the client for a malformed request, if the request
    /// was malformed (as opposed to the transport failing).
    pub fn reject_reason(&self) -> Option<String> {
        if self.is_retryable() {
            None
        } else {
            Some(self.to_string())
        }
    }
}
