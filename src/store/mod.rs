pub mod memory;

use thiserror::Error;

use crate::types::{EntryId, Loan, LoanId, LoanStatus, RepaymentEntry};

pub use memory::InMemoryStore;

/// persistence-level failures, converted to LedgerError at the service
/// boundary
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("conditional write failed, a newer entry exists")]
    Conflict,

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// loan record store (read principal/status, write status)
pub trait LoanStore: Send + Sync {
    fn get_loan(&self, loan_id: LoanId) -> StoreResult<Option<Loan>>;

    /// update the loan status, NotFound if the loan does not exist
    fn set_status(&self, loan_id: LoanId, status: LoanStatus) -> StoreResult<()>;
}

/// append-only repayment ledger store
///
/// The conditional operations carry the serialization guarantee: an
/// implementation must check `expected_latest` against the loan's actual
/// latest entry and the write atomically, failing with `Conflict` on any
/// mismatch. That check is what makes concurrent read-modify-write cycles
/// observe a total order per loan.
pub trait LedgerStore: Send + Sync {
    /// most recent entry for the loan, if any
    fn latest_entry(&self, loan_id: LoanId) -> StoreResult<Option<RepaymentEntry>>;

    /// append one entry, conditional on the loan's latest entry id
    ///
    /// `expected_latest` of `None` asserts the loan has no entries yet.
    fn append_entry(
        &self,
        entry: RepaymentEntry,
        expected_latest: Option<EntryId>,
    ) -> StoreResult<()>;

    fn get_entry(&self, entry_id: EntryId) -> StoreResult<Option<RepaymentEntry>>;

    /// entries for one loan, or all entries, most recent first
    fn list_entries(&self, loan_id: Option<LoanId>) -> StoreResult<Vec<RepaymentEntry>>;

    /// remove the loan's latest entry, conditional on its id
    fn remove_latest(&self, loan_id: LoanId, expected_latest: EntryId)
        -> StoreResult<RepaymentEntry>;
}
