use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Not connected: call connect() before syncing records")]
    NotConnected,

    #[error("Config parse error: {0}")]
    ConfigParseError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Http(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<ureq::Error> for Error {
    fn from(e: ureq::Error) -> Self {
        let message = match &e {
            ureq::Error::StatusCode(code) => format!("HTTP {} error", code),
            ureq::Error::Timeout(_) => format!("Request timed out: {}", e),
            ureq::Error::HostNotFound | ureq::Error::ConnectionFailed => {
                format!("Connection failed: {}", e)
            }
            _ => format!("HTTP error: {}", e),
        };
        Error::Http(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_message() {
        let err: Error = ureq::Error::StatusCode(503).into();
        assert_eq!(err.to_string(), "HTTP 503 error");
    }

    #[test]
    fn test_not_connected_is_distinct() {
        assert!(matches!(Error::NotConnected, Error::NotConnected));
        assert!(Error::NotConnected.to_string().contains("connect()"));
    }
}
