//! Error taxonomy shared by every Markflow surface.
//!
//! Handlers return [`MarkflowError`]; the HTTP server maps each variant to
//! a status code and the CLI prints the message.

/// Why a page-metadata fetch failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// Missing, unparseable, or non-http(s) URL.
    InvalidUrl,
    /// The upstream answered with a non-2xx status.
    Status(u16),
    /// Connection, TLS, or body read failure.
    Network,
    /// No response within the configured timeout.
    Timeout,
}

/// Errors surfaced by request handlers.
#[derive(Debug)]
pub enum MarkflowError {
    /// A required field is missing or malformed. Nothing was persisted.
    Validation(String),
    /// No record matches the given id.
    NotFound(String),
    /// Scraping a page failed. Never fatal to the surrounding form flow.
    UpstreamFetch { kind: FetchFailure, message: String },
    /// The persistence layer failed.
    Store(String),
}

impl MarkflowError {
    pub fn validation(message: impl Into<String>) -> Self {
        MarkflowError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        MarkflowError::NotFound(message.into())
    }

    pub fn fetch(kind: FetchFailure, message: impl Into<String>) -> Self {
        MarkflowError::UpstreamFetch {
            kind,
            message: message.into(),
        }
    }

    /// Wraps a store failure. The full chain is kept for logging.
    pub fn store(err: anyhow::Error) -> Self {
        MarkflowError::Store(format!("{:#}", err))
    }

    /// Machine-readable error code used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            MarkflowError::Validation(_) => "validation",
            MarkflowError::NotFound(_) => "not_found",
            MarkflowError::UpstreamFetch { .. } => "upstream_fetch",
            MarkflowError::Store(_) => "store",
        }
    }

    /// True for failures caused by the caller's input rather than the system.
    pub fn is_client_error(&self) -> bool {
        match self {
            MarkflowError::Validation(_) | MarkflowError::NotFound(_) => true,
            MarkflowError::UpstreamFetch { kind, .. } => {
                matches!(kind, FetchFailure::InvalidUrl | FetchFailure::Status(_))
            }
            MarkflowError::Store(_) => false,
        }
    }
}

impl std::fmt::Display for MarkflowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarkflowError::Validation(msg) => write!(f, "{}", msg),
            MarkflowError::NotFound(msg) => write!(f, "{}", msg),
            MarkflowError::UpstreamFetch { message, .. } => write!(
                f,
                "{}. You can still enter the title and description manually.",
                message
            ),
            MarkflowError::Store(msg) => write!(f, "storage failure: {}", msg),
        }
    }
}

impl std::error::Error for MarkflowError {}
