use reqwest::StatusCode;

/// Errors produced by the scraper.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The transport could not deliver the request.
    #[error("unable to send request: {0}")]
    Network(String),

    /// The backend answered with a status that is not a success for this call.
    #[error("response status {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// A JSON body did not match the expected shape.
    #[error("unable to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A payload decoded but its structure could not be interpreted.
    #[error("unable to parse response: {0}")]
    Parse(String),

    /// A login flow step returned a structured error or a terminal subtask.
    #[error("auth error ({code}): {message}")]
    Auth { code: i64, message: String },

    #[error("confirmation data required for {0}")]
    ConfirmationRequired(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("scraper is not logged in")]
    NotLoggedIn,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("account suspended: {0}")]
    Suspended(String),

    /// The backend reported an error object that has no dedicated variant.
    #[error("api error ({code}): {message}")]
    Api { code: i64, message: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Coarse classification of an [`Error`] for callers that only need to know
/// what went wrong, not exactly where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Unauthorized,
    NotFound,
    Cancelled,
    Other,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) | Self::Status { .. } | Self::Decode(_) | Self::Parse(_) => {
                ErrorKind::Transport
            }
            Self::Auth { .. }
            | Self::ConfirmationRequired(_)
            | Self::InvalidCredentials
            | Self::NotLoggedIn => ErrorKind::Unauthorized,
            Self::NotFound(_) | Self::Suspended(_) => ErrorKind::NotFound,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Api { .. } | Self::Config(_) => ErrorKind::Other,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_separate_network_auth_and_missing() {
        let status = Error::Status {
            status: StatusCode::BAD_GATEWAY,
            body: "upstream".into(),
        };
        assert_eq!(status.kind(), ErrorKind::Transport);
        assert_eq!(
            Error::ConfirmationRequired("LoginAcid".into()).kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(Error::Suspended("jack".into()).kind(), ErrorKind::NotFound);
        assert_eq!(Error::Cancelled.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn status_error_keeps_body_for_diagnostics() {
        let err = Error::Status {
            status: StatusCode::UNAUTHORIZED,
            body: r#"{"errors":[{"code":32}]}"#.into(),
        };
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains(r#""code":32"#));
    }

    #[test]
    fn confirmation_message_names_subtask() {
        let err = Error::ConfirmationRequired("LoginTwoFactorAuthChallenge".into());
        assert_eq!(
            err.to_string(),
            "confirmation data required for LoginTwoFactorAuthChallenge"
        );
    }
}
