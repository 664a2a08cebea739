use thiserror::Error;

/// Transport-level failures talking to the inference service.
#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Server is offline or unreachable")]
    Offline,

    #[error("Request timed out")]
    Timeout,

    #[error("No API key configured for the inference service")]
    MissingCredentials,

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl IntegrationError {
    /// HTTP status, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            IntegrationError::ServerError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for IntegrationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            IntegrationError::Timeout
        } else if err.is_connect() {
            IntegrationError::Offline
        } else {
            IntegrationError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for IntegrationError {
    fn from(err: serde_json::Error) -> Self {
        IntegrationError::Serialization(err.to_string())
    }
}

/// Why a reply could not be used as an analysis result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("reply contains no JSON object")]
    NoJsonObject,

    #[error("reply JSON does not match the analysis shape: {0}")]
    Malformed(String),

    #[error("drag coefficient {0} is outside (0, 1)")]
    DragOutOfRange(f64),

    #[error("reply lists no improvements")]
    NoImprovements,

    #[error("improvement {0} has no area")]
    MissingArea(usize),
}

/// Rejected orchestrator commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestratorError {
    #[error("an analysis is already in progress")]
    Busy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_type_mapping() {
        let offline = IntegrationError::Offline;
        assert!(offline.to_string().contains("offline"));

        let server = IntegrationError::ServerError { status: 500, message: "Internal".into() };
        assert!(server.to_string().contains("500"));
        assert_eq!(server.status(), Some(500));

        let timeout = IntegrationError::Timeout;
        assert!(timeout.to_string().contains("timed out"));
        assert_eq!(timeout.status(), None);

        assert!(IntegrationError::MissingCredentials.to_string().contains("API key"));
    }

    #[test]
    fn test_serde_error_conversion() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(IntegrationError::from(err), IntegrationError::Serialization(_)));
    }
}
