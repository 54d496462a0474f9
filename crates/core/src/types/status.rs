//! Machine-readable failure kinds and operation status.

use serde::{Deserialize, Serialize};

/// Machine-readable classification of a failed operation.
///
/// Every error the engine surfaces maps to exactly one kind, so callers can
/// branch on recovery strategy (re-authenticate, fix input, retry later)
/// without parsing messages. The serialized form matches the wire codes the
/// commerce backend uses (`auth-required`, `not-found`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// The caller must be signed in, or the session expired mid-call.
    AuthRequired,
    /// The input was rejected (bad quantity, malformed address, weak password).
    Validation,
    /// The referenced entity does not exist.
    NotFound,
    /// The operation conflicts with current remote state.
    Conflict,
    /// The backend is throttling; retry after the advertised delay.
    RateLimited,
    /// The request never completed (DNS, timeout, offline).
    NetworkError,
    /// The backend failed internally.
    ServerError,
}

impl ErrorKind {
    /// The wire code for this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AuthRequired => "auth-required",
            Self::Validation => "validation",
            Self::NotFound => "not-found",
            Self::Conflict => "conflict",
            Self::RateLimited => "rate-limited",
            Self::NetworkError => "network-error",
            Self::ServerError => "server-error",
        }
    }

    /// Whether retrying the same call later could succeed without changes.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::NetworkError | Self::ServerError)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ErrorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auth-required" => Ok(Self::AuthRequired),
            "validation" => Ok(Self::Validation),
            "not-found" => Ok(Self::NotFound),
            "conflict" => Ok(Self::Conflict),
            "rate-limited" => Ok(Self::RateLimited),
            "network-error" => Ok(Self::NetworkError),
            "server-error" => Ok(Self::ServerError),
            _ => Err(format!("invalid error kind: {s}")),
        }
    }
}

/// Lifecycle of a single engine operation, for UI layers that mirror it.
///
/// Exactly one state holds at a time; a failed operation carries the
/// [`ErrorKind`] so views can render recovery hints without a side channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OpStatus {
    /// No operation has been issued.
    #[default]
    Idle,
    /// The operation is in flight.
    Pending,
    /// The operation completed.
    Succeeded,
    /// The operation failed with the given kind.
    Failed(ErrorKind),
}

impl OpStatus {
    /// Whether an operation is currently in flight.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// The failure kind, if the operation failed.
    #[must_use]
    pub const fn failure(&self) -> Option<ErrorKind> {
        match self {
            Self::Failed(kind) => Some(*kind),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_wire_codes() {
        assert_eq!(ErrorKind::AuthRequired.to_string(), "auth-required");
        assert_eq!(ErrorKind::NetworkError.to_string(), "network-error");
        assert_eq!(
            serde_json::to_string(&ErrorKind::RateLimited).unwrap(),
            "\"rate-limited\""
        );
    }

    #[test]
    fn test_error_kind_round_trip() {
        for kind in [
            ErrorKind::AuthRequired,
            ErrorKind::Validation,
            ErrorKind::NotFound,
            ErrorKind::Conflict,
            ErrorKind::RateLimited,
            ErrorKind::NetworkError,
            ErrorKind::ServerError,
        ] {
            let parsed: ErrorKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
        }
        assert!("teapot".parse::<ErrorKind>().is_err());
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(ErrorKind::NetworkError.is_retryable());
        assert!(ErrorKind::RateLimited.is_retryable());
        assert!(!ErrorKind::Validation.is_retryable());
        assert!(!ErrorKind::AuthRequired.is_retryable());
    }

    #[test]
    fn test_op_status_default_and_failure() {
        assert_eq!(OpStatus::default(), OpStatus::Idle);
        assert!(OpStatus::Pending.is_pending());
        assert_eq!(
            OpStatus::Failed(ErrorKind::Conflict).failure(),
            Some(ErrorKind::Conflict)
        );
        assert_eq!(OpStatus::Succeeded.failure(), None);
    }
}
