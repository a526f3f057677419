//! Gemini-specific error handling.

use geovision_core::Error;

/// Gemini error classes, derived from HTTP status and canonical status name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeminiErrorCode {
    /// Missing, invalid, or unauthorized API key.
    AuthenticationError,
    /// Quota or rate limit exhausted.
    QuotaExceeded,
    /// Model not found or not available to this key.
    ModelNotFound,
    /// Malformed request (bad image payload, unsupported mime type).
    InvalidArgument,
    /// Server error.
    ServerError,
    /// Unknown error.
    Unknown,
}

impl GeminiErrorCode {
    /// Determine error code from HTTP status, status name and message.
    pub fn from_response(status: u16, status_name: &str, message: &str) -> Self {
        match (status, status_name) {
            (401, _) | (403, _) | (_, "UNAUTHENTICATED") | (_, "PERMISSION_DENIED") => {
                Self::AuthenticationError
            }
            // An invalid key is reported as a 400 INVALID_ARGUMENT.
            (400, _) if message.contains("API key") => Self::AuthenticationError,
            (429, _) | (_, "RESOURCE_EXHAUSTED") => Self::QuotaExceeded,
            (404, _) | (_, "NOT_FOUND") => Self::ModelNotFound,
            (400, _) | (_, "INVALID_ARGUMENT") | (_, "FAILED_PRECONDITION") => {
                Self::InvalidArgument
            }
            (500..=599, _) => Self::ServerError,
            _ => Self::Unknown,
        }
    }
}

/// Convert a Gemini error to a geovision Error.
pub fn to_geovision_error(code: GeminiErrorCode, message: &str) -> Error {
    match code {
        GeminiErrorCode::AuthenticationError => {
            Error::Config(format!("Authentication failed: {}", message))
        }
        GeminiErrorCode::QuotaExceeded => Error::Inference(format!("Quota exceeded: {}", message)),
        GeminiErrorCode::ModelNotFound => Error::Config(format!("Model not found: {}", message)),
        GeminiErrorCode::InvalidArgument => {
            Error::Inference(format!("Invalid request: {}", message))
        }
        GeminiErrorCode::ServerError => Error::Inference(format!("Server error: {}", message)),
        GeminiErrorCode::Unknown => Error::Inference(message.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_from_401() {
        let code = GeminiErrorCode::from_response(401, "UNAUTHENTICATED", "");
        assert_eq!(code, GeminiErrorCode::AuthenticationError);
    }

    #[test]
    fn test_error_code_from_403() {
        let code = GeminiErrorCode::from_response(403, "PERMISSION_DENIED", "");
        assert_eq!(code, GeminiErrorCode::AuthenticationError);
    }

    #[test]
    fn test_error_code_from_invalid_key() {
        let code = GeminiErrorCode::from_response(
            400,
            "INVALID_ARGUMENT",
            "API key not valid. Please pass a valid API key.",
        );
        assert_eq!(code, GeminiErrorCode::AuthenticationError);
    }

    #[test]
    fn test_error_code_from_429() {
        let code = GeminiErrorCode::from_response(429, "RESOURCE_EXHAUSTED", "");
        assert_eq!(code, GeminiErrorCode::QuotaExceeded);
    }

    #[test]
    fn test_error_code_from_404() {
        let code = GeminiErrorCode::from_response(404, "NOT_FOUND", "");
        assert_eq!(code, GeminiErrorCode::ModelNotFound);
    }

    #[test]
    fn test_error_code_from_400() {
        let code = GeminiErrorCode::from_response(400, "INVALID_ARGUMENT", "bad mime type");
        assert_eq!(code, GeminiErrorCode::InvalidArgument);
    }

    #[test]
    fn test_error_code_from_503() {
        let code = GeminiErrorCode::from_response(503, "UNAVAILABLE", "");
        assert_eq!(code, GeminiErrorCode::ServerError);
    }

    #[test]
    fn test_error_code_from_unknown() {
        let code = GeminiErrorCode::from_response(418, "", "");
        assert_eq!(code, GeminiErrorCode::Unknown);
    }

    #[test]
    fn test_to_geovision_error_auth_is_config() {
        let err = to_geovision_error(GeminiErrorCode::AuthenticationError, "Invalid key");
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("Authentication failed"));
    }

    #[test]
    fn test_to_geovision_error_quota() {
        let err = to_geovision_error(GeminiErrorCode::QuotaExceeded, "Too many requests");
        assert!(matches!(err, Error::Inference(_)));
        assert!(err.to_string().contains("Quota exceeded"));
    }
}
