use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

/// Failure of the HTTP transport itself: timeout, refused connection, DNS.
#[derive(Debug, Clone, Error)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError(err.to_string())
    }
}

/// Credential exchange did not yield a usable bearer token.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("token request failed: {0}")]
    Transport(#[from] TransportError),

    #[error("token endpoint rejected credentials (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("token endpoint returned an empty body")]
    EmptyBody,

    #[error("malformed token response: {0}")]
    Malformed(String),

    #[error("token response has no access_token")]
    MissingToken,

    #[error("unsupported token type: {0}")]
    UnsupportedTokenType(String),
}

/// Response body is present but not shaped like a search result page.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("response has no `statuses` array")]
    MissingStatuses,
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        ParseError::InvalidJson(err.to_string())
    }
}

/// Why the search request itself failed.
#[derive(Debug, Clone, Error)]
pub enum RequestFailure {
    #[error("{0}")]
    Transport(#[from] TransportError),

    #[error("API error (status {status}): {message}")]
    Status { status: u16, message: String },

    #[error("search endpoint returned an empty body")]
    EmptyBody,

    #[error("search center is not a finite coordinate")]
    InvalidCenter,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid search radius: {0:?}")]
pub struct InvalidRadius(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchErrorKind {
    AuthFailed,
    RequestFailed,
    ParseFailed,
}

/// Caller-facing failure of a nearby search. A successful empty page is never
/// represented as an error, and an error is never collapsed into an empty page.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    #[error("authentication failed: {0}")]
    AuthFailed(AuthError),

    #[error("search request failed: {0}")]
    RequestFailed(#[from] RequestFailure),

    #[error("failed to parse search results: {0}")]
    ParseFailed(#[from] ParseError),
}

/// A token call that never reached the server is a request failure, not a
/// credential problem, so callers can retry it like any other network fault.
impl From<AuthError> for SearchError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Transport(e) => SearchError::RequestFailed(RequestFailure::Transport(e)),
            other => SearchError::AuthFailed(other),
        }
    }
}

impl SearchError {
    pub fn kind(&self) -> SearchErrorKind {
        match self {
            SearchError::AuthFailed(_) => SearchErrorKind::AuthFailed,
            SearchError::RequestFailed(_) => SearchErrorKind::RequestFailed,
            SearchError::ParseFailed(_) => SearchErrorKind::ParseFailed,
        }
    }

    /// HTTP status carried by the failure, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            SearchError::AuthFailed(AuthError::Rejected { status, .. }) => Some(*status),
            SearchError::RequestFailed(RequestFailure::Status { status, .. }) => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_follows_variant() {
        let auth = SearchError::from(AuthError::MissingToken);
        let request = SearchError::from(RequestFailure::EmptyBody);
        let parse = SearchError::from(ParseError::MissingStatuses);

        assert_eq!(auth.kind(), SearchErrorKind::AuthFailed);
        assert_eq!(request.kind(), SearchErrorKind::RequestFailed);
        assert_eq!(parse.kind(), SearchErrorKind::ParseFailed);
    }

    #[test]
    fn status_is_exposed_for_http_failures() {
        let err = SearchError::from(RequestFailure::Status {
            status: 503,
            message: "over capacity".into(),
        });
        assert_eq!(err.status(), Some(503));

        let err = SearchError::from(AuthError::Rejected {
            status: 401,
            message: String::new(),
        });
        assert_eq!(err.status(), Some(401));

        let err = SearchError::from(RequestFailure::Transport(TransportError("refused".into())));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn token_transport_failure_maps_to_request_failed() {
        let err = SearchError::from(AuthError::Transport(TransportError(
            "operation timed out".into(),
        )));
        assert_eq!(err.kind(), SearchErrorKind::RequestFailed);
        assert!(matches!(
            err,
            SearchError::RequestFailed(RequestFailure::Transport(_))
        ));

        let err = SearchError::from(AuthError::EmptyBody);
        assert_eq!(err.kind(), SearchErrorKind::AuthFailed);
    }
}
