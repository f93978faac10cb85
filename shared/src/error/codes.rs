//! Unified error codes for the Docket backend
//!
//! This module defines all error codes used across the cloud service and frontend.
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Account / subscription errors
//! - 3xxx: Quota and usage errors
//! - 4xxx: Message errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 1xxx: Auth ====================
    /// Caller is not authenticated
    NotAuthenticated = 1001,
    /// Permission denied
    PermissionDenied = 1002,

    // ==================== 2xxx: Account ====================
    /// Account not found
    AccountNotFound = 2001,
    /// No active subscription for account
    NoActiveSubscription = 2002,
    /// Subscription plan not recognized
    PlanNotRecognized = 2003,

    // ==================== 3xxx: Quota ====================
    /// Quota exceeded for the requested metric
    QuotaExceeded = 3001,
    /// Usage data temporarily unavailable
    UsageUnavailable = 3002,
    /// Feature not available in current subscription plan
    FeatureNotAvailable = 3003,

    // ==================== 4xxx: Message ====================
    /// Message not found
    MessageNotFound = 4001,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database operation failed
    DatabaseError = 9002,
    /// Network communication error
    NetworkError = 9003,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",

            // Auth
            ErrorCode::NotAuthenticated => "Caller is not authenticated",
            ErrorCode::PermissionDenied => "Permission denied",

            // Account
            ErrorCode::AccountNotFound => "Account not found",
            ErrorCode::NoActiveSubscription => "No active subscription",
            ErrorCode::PlanNotRecognized => "Subscription plan not recognized",

            // Quota
            ErrorCode::QuotaExceeded => "Quota exceeded for the requested metric",
            ErrorCode::UsageUnavailable => "Usage data temporarily unavailable",
            ErrorCode::FeatureNotAvailable => "Feature not available in current subscription plan",

            // Message
            ErrorCode::MessageNotFound => "Message not found",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database operation failed",
            ErrorCode::NetworkError => "Network communication error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error type for invalid error code conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::PermissionDenied),

            // Account
            2001 => Ok(ErrorCode::AccountNotFound),
            2002 => Ok(ErrorCode::NoActiveSubscription),
            2003 => Ok(ErrorCode::PlanNotRecognized),

            // Quota
            3001 => Ok(ErrorCode::QuotaExceeded),
            3002 => Ok(ErrorCode::UsageUnavailable),
            3003 => Ok(ErrorCode::FeatureNotAvailable),

            // Message
            4001 => Ok(ErrorCode::MessageNotFound),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        // General
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::Unknown.code(), 1);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::NotFound.code(), 3);
        assert_eq!(ErrorCode::AlreadyExists.code(), 4);
        assert_eq!(ErrorCode::InvalidRequest.code(), 5);

        // Auth
        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::PermissionDenied.code(), 1002);

        // Account
        assert_eq!(ErrorCode::AccountNotFound.code(), 2001);
        assert_eq!(ErrorCode::NoActiveSubscription.code(), 2002);
        assert_eq!(ErrorCode::PlanNotRecognized.code(), 2003);

        // Quota
        assert_eq!(ErrorCode::QuotaExceeded.code(), 3001);
        assert_eq!(ErrorCode::UsageUnavailable.code(), 3002);
        assert_eq!(ErrorCode::FeatureNotAvailable.code(), 3003);

        // Message
        assert_eq!(ErrorCode::MessageNotFound.code(), 4001);

        // System
        assert_eq!(ErrorCode::InternalError.code(), 9001);
        assert_eq!(ErrorCode::DatabaseError.code(), 9002);
        assert_eq!(ErrorCode::NetworkError.code(), 9003);
        assert_eq!(ErrorCode::TimeoutError.code(), 9004);
        assert_eq!(ErrorCode::ConfigError.code(), 9005);
    }

    #[test]
    fn test_is_success() {
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::Unknown.is_success());
        assert!(!ErrorCode::QuotaExceeded.is_success());
        assert!(!ErrorCode::InternalError.is_success());
    }

    #[test]
    fn test_try_from_valid() {
        assert_eq!(ErrorCode::try_from(0), Ok(ErrorCode::Success));
        assert_eq!(ErrorCode::try_from(1001), Ok(ErrorCode::NotAuthenticated));
        assert_eq!(ErrorCode::try_from(3001), Ok(ErrorCode::QuotaExceeded));
        assert_eq!(ErrorCode::try_from(4001), Ok(ErrorCode::MessageNotFound));
        assert_eq!(ErrorCode::try_from(9001), Ok(ErrorCode::InternalError));
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(999), Err(InvalidErrorCode(999)));
        assert_eq!(ErrorCode::try_from(10000), Err(InvalidErrorCode(10000)));
        assert_eq!(ErrorCode::try_from(5001), Err(InvalidErrorCode(5001)));
    }

    #[test]
    fn test_serde_roundtrip() {
        let code = ErrorCode::QuotaExceeded;
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "3001");
        let back: ErrorCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, code);
    }

    #[test]
    fn test_message_is_stable() {
        assert_eq!(
            ErrorCode::NoActiveSubscription.message(),
            "No active subscription"
        );
        assert_eq!(
            ErrorCode::QuotaExceeded.message(),
            "Quota exceeded for the requested metric"
        );
    }
}
