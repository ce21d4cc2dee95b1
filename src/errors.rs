use thiserror::Error;

use crate::decimal::Money;
use crate::types::{EntryId, LoanId};

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("loan not found: {loan_id}")]
    LoanNotFound {
        loan_id: LoanId,
    },

    #[error("ledger entry not found: {entry_id}")]
    EntryNotFound {
        entry_id: EntryId,
    },

    #[error("invalid payment amount: {amount}")]
    InvalidAmount {
        amount: Money,
    },

    #[error("payment exceeds outstanding balance: maximum acceptable is {max_accepted}")]
    OverpaymentRejected {
        max_accepted: Money,
    },

    #[error("loan already fully repaid: {loan_id}")]
    AlreadySettled {
        loan_id: LoanId,
    },

    #[error("concurrent ledger modification for loan {loan_id}, retry the request")]
    ConcurrentModification {
        loan_id: LoanId,
    },

    #[error("only the most recent entry of a loan may be deleted: {entry_id}")]
    EntryNotDeletable {
        entry_id: EntryId,
    },

    #[error("store unavailable: {message}")]
    StoreUnavailable {
        message: String,
    },
}

impl LedgerError {
    /// true for failures the caller can fix and resubmit
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            LedgerError::InvalidAmount { .. }
                | LedgerError::OverpaymentRejected { .. }
                | LedgerError::AlreadySettled { .. }
                | LedgerError::EntryNotDeletable { .. }
        )
    }

    /// true for failures worth retrying unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LedgerError::ConcurrentModification { .. } | LedgerError::StoreUnavailable { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_overpayment_message_reports_maximum() {
        let err = LedgerError::OverpaymentRejected {
            max_accepted: Money::from_major(10_000),
        };
        assert!(err.to_string().contains("10000"));
    }

    #[test]
    fn test_error_classes() {
        let loan_id = Uuid::new_v4();
        assert!(LedgerError::AlreadySettled { loan_id }.is_user_correctable());
        assert!(LedgerError::ConcurrentModification { loan_id }.is_retryable());
        assert!(!LedgerError::StoreUnavailable {
            message: "connection refused".into()
        }
        .is_user_correctable());
    }
}
