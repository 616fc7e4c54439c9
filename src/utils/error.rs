use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Invalid request field '{field}': {message}")]
    ValidationError { field: String, message: String },

    #[error("Malformed request body: {message}")]
    MalformedRequestError { message: String },

    #[error("No valid satellite data found")]
    NoDataError,

    #[error("No recent imagery found for this location")]
    NoImageryError,

    // 只顯示分類後的訊息，原始回應內容僅寫入日誌
    #[error("{kind}")]
    RemoteError { kind: RemoteErrorKind, detail: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// 遠端平台錯誤的分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    NotInitialized,
    Unreachable,
    Timeout,
    Unauthorized,
    QuotaExceeded,
    Rejected,
    Unavailable,
    MalformedResponse,
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            RemoteErrorKind::NotInitialized => "Remote platform credentials are not configured",
            RemoteErrorKind::Unreachable => "Remote platform is unreachable",
            RemoteErrorKind::Timeout => "Remote platform request timed out",
            RemoteErrorKind::Unauthorized => "Remote platform rejected the credentials",
            RemoteErrorKind::QuotaExceeded => "Remote platform quota exceeded",
            RemoteErrorKind::Rejected => "Remote platform rejected the computation",
            RemoteErrorKind::Unavailable => "Remote platform is temporarily unavailable",
            RemoteErrorKind::MalformedResponse => "Remote platform returned an unexpected response",
        };
        f.write_str(message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Remote,
    Configuration,
    Internal,
}

impl GatewayError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        GatewayError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn remote(kind: RemoteErrorKind, detail: impl Into<String>) -> Self {
        GatewayError::RemoteError {
            kind,
            detail: detail.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            GatewayError::ValidationError { .. } | GatewayError::MalformedRequestError { .. } => {
                ErrorCategory::Validation
            }
            GatewayError::NoDataError => ErrorCategory::NotFound,
            GatewayError::NoImageryError | GatewayError::RemoteError { .. } => ErrorCategory::Remote,
            GatewayError::ConfigError { .. }
            | GatewayError::InvalidConfigValueError { .. }
            | GatewayError::MissingConfigError { .. } => ErrorCategory::Configuration,
            GatewayError::IoError(_) | GatewayError::SerializationError(_) => {
                ErrorCategory::Internal
            }
        }
    }

    /// 回傳給客戶端的訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            GatewayError::IoError(_) | GatewayError::SerializationError(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            RemoteErrorKind::Timeout
        } else if err.is_decode() {
            RemoteErrorKind::MalformedResponse
        } else if let Some(status) = err.status() {
            RemoteErrorKind::from_status(status.as_u16())
        } else {
            RemoteErrorKind::Unreachable
        };
        GatewayError::remote(kind, err.to_string())
    }
}

impl RemoteErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => RemoteErrorKind::Unauthorized,
            429 => RemoteErrorKind::QuotaExceeded,
            400..=499 => RemoteErrorKind::Rejected,
            _ => RemoteErrorKind::Unavailable,
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(RemoteErrorKind::from_status(401), RemoteErrorKind::Unauthorized);
        assert_eq!(RemoteErrorKind::from_status(403), RemoteErrorKind::Unauthorized);
        assert_eq!(RemoteErrorKind::from_status(429), RemoteErrorKind::QuotaExceeded);
        assert_eq!(RemoteErrorKind::from_status(400), RemoteErrorKind::Rejected);
        assert_eq!(RemoteErrorKind::from_status(503), RemoteErrorKind::Unavailable);
    }

    #[test]
    fn test_remote_error_hides_detail() {
        let err = GatewayError::remote(
            RemoteErrorKind::QuotaExceeded,
            "projects/secret-project: too many requests",
        );
        assert_eq!(err.to_string(), "Remote platform quota exceeded");
        assert_eq!(err.category(), ErrorCategory::Remote);
    }

    #[test]
    fn test_categories() {
        assert_eq!(GatewayError::NoDataError.category(), ErrorCategory::NotFound);
        assert_eq!(
            GatewayError::validation("latitude", "out of range").category(),
            ErrorCategory::Validation
        );
        assert_eq!(GatewayError::NoImageryError.category(), ErrorCategory::Remote);
        assert_eq!(
            GatewayError::NoDataError.user_friendly_message(),
            "No valid satellite data found"
        );
    }
}
