//! Directory client error types.
//!
//! Every failure inside the connect/bind/search sequence is represented by
//! one variant of [`DirectoryError`], carrying the native transport error
//! text where one exists. Error messages must not leak bind credentials.

use thiserror::Error;

/// Errors surfaced by directory client operations.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Invalid client configuration.
    #[error("invalid directory configuration: {0}")]
    InvalidConfig(String),

    /// Username or password missing where credentials are required.
    ///
    /// Uses a fixed message to avoid echoing credential material.
    #[error("invalid directory credentials")]
    InvalidCredentials,

    /// A requested capability is not available in this build of the
    /// transport (e.g. SASL/GSSAPI without the `sso` feature).
    #[error("directory feature not supported: {0}")]
    UnsupportedFeature(String),

    /// The transport could not be opened.
    #[error("directory connection failed: {0}")]
    Connect(String),

    /// StartTLS negotiation failed.
    #[error("directory TLS negotiation failed: {0}")]
    Tls(String),

    /// The server refused to bind.
    #[error("directory bind failed: {0}")]
    Bind(String),

    /// The search call failed at the transport.
    #[error("directory search failed: {0}")]
    Search(String),

    /// The server reported a non-success result while retrieving entries.
    #[error("directory entry retrieval failed: {0}")]
    Entries(String),
}

impl DirectoryError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Creates an unsupported-feature error.
    #[must_use]
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedFeature(msg.into())
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connect(msg: impl Into<String>) -> Self {
        Self::Connect(msg.into())
    }

    /// Creates a TLS error.
    #[must_use]
    pub fn tls(msg: impl Into<String>) -> Self {
        Self::Tls(msg.into())
    }

    /// Creates a bind error.
    #[must_use]
    pub fn bind(msg: impl Into<String>) -> Self {
        Self::Bind(msg.into())
    }

    /// Creates a search error.
    #[must_use]
    pub fn search(msg: impl Into<String>) -> Self {
        Self::Search(msg.into())
    }

    /// Creates an entry-retrieval error.
    #[must_use]
    pub fn entries(msg: impl Into<String>) -> Self {
        Self::Entries(msg.into())
    }

    /// Stable numeric code for this error.
    ///
    /// The numbering is inherited from the long-lived wire surface of the
    /// project: TLS failures share 1403 with connection failures, and a
    /// refused bind shares 1402 with malformed credentials.
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            Self::InvalidConfig(_) => 1401,
            Self::InvalidCredentials | Self::Bind(_) => 1402,
            Self::Connect(_) | Self::Tls(_) => 1403,
            Self::Search(_) => 1404,
            Self::UnsupportedFeature(_) => 1408,
            Self::Entries(_) => 1412,
        }
    }

    /// Checks if this is an authentication-related error.
    #[must_use]
    pub const fn is_auth_error(&self) -> bool {
        matches!(self, Self::InvalidCredentials | Self::Bind(_))
    }

    /// Checks if this is a connection-related error.
    #[must_use]
    pub const fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connect(_) | Self::Tls(_))
    }
}

/// Result type for directory client operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;
