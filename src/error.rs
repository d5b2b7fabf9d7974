//! Domain-specific errors for the account ledger.
//!
//! Contains error variants for common failure cases like:
//! - Input validation (age floor, PIN shape, amounts, missing fields)
//! - Lookups that match no record (accounts, staff)
//! - Persistence failures (I/O, JSON encoding)
//!
//! Callers that only care about the broad class of failure use
//! [`Error::kind`].

use thiserror::Error;

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input shape or range.
    Validation,
    /// No record matches the identifying fields.
    NotFound,
    /// The backing file could not be read or written.
    Io,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Age must be {minimum} or over (got {age})")]
    AgeBelowMinimum { age: u32, minimum: u32 },
    #[error("PIN must be exactly 4 digits")]
    InvalidPin,
    #[error("Field `{0}` is required")]
    MissingField(&'static str),
    #[error("Amount must be positive")]
    AmountMustBePositive,
    #[error("Deposit of {amount} exceeds the per-transaction limit of {limit}")]
    DepositLimitExceeded { amount: i64, limit: i64 },
    #[error("Deposit of {amount} would overflow the balance of {balance}")]
    BalanceOverflow { balance: u64, amount: i64 },
    #[error("Insufficient balance (asked {asked} while {available} available)")]
    InsufficientFunds { asked: i64, available: u64 },
    #[error("Could not generate an unused account number")]
    AccountNumberSpaceExhausted,
    #[error("Staff member `{0}` already exists")]
    DuplicateStaff(String),
    #[error("Invalid account number or PIN")]
    AccountNotFound,
    #[error("Staff member `{0}` not found")]
    StaffNotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::AgeBelowMinimum { .. }
            | Error::InvalidPin
            | Error::MissingField(_)
            | Error::AmountMustBePositive
            | Error::DepositLimitExceeded { .. }
            | Error::BalanceOverflow { .. }
            | Error::InsufficientFunds { .. }
            | Error::AccountNumberSpaceExhausted
            | Error::DuplicateStaff(_) => ErrorKind::Validation,
            Error::AccountNotFound | Error::StaffNotFound(_) => ErrorKind::NotFound,
            Error::Io(_) | Error::Json(_) => ErrorKind::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(Error::InvalidPin.kind(), ErrorKind::Validation);
        assert_eq!(
            Error::DepositLimitExceeded {
                amount: 10001,
                limit: 10000
            }
            .kind(),
            ErrorKind::Validation
        );
        assert_eq!(Error::AccountNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(
            Error::StaffNotFound("s1".into()).kind(),
            ErrorKind::NotFound
        );
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(Error::from(io).kind(), ErrorKind::Io);
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            Error::InsufficientFunds {
                asked: 600,
                available: 500
            }
            .to_string(),
            "Insufficient balance (asked 600 while 500 available)"
        );
        assert_eq!(
            Error::MissingField("email").to_string(),
            "Field `email` is required"
        );
    }
}
