use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::types::{EntryId, Loan, LoanId, LoanStatus, RepaymentEntry};

use super::{LedgerStore, LoanStore, StoreError, StoreResult};

/// in-memory reference store implementing both seams
///
/// Entries live in one vector in insertion order, so "latest" is the last
/// matching element and global listings come straight off the tail. The
/// conditional append and removal hold the write lock across check and
/// mutation, which is what the LedgerStore contract requires.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    loans: RwLock<HashMap<LoanId, Loan>>,
    entries: RwLock<Vec<RepaymentEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// register a loan record
    pub fn insert_loan(&self, loan: Loan) {
        write_lock(&self.loans).insert(loan.loan_id, loan);
    }

    fn latest_for(entries: &[RepaymentEntry], loan_id: LoanId) -> Option<&RepaymentEntry> {
        entries.iter().rev().find(|e| e.loan_id == loan_id)
    }
}

// a poisoned lock only means another test thread panicked mid-write;
// the data is still the last consistent state for this store's operations
fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl LoanStore for InMemoryStore {
    fn get_loan(&self, loan_id: LoanId) -> StoreResult<Option<Loan>> {
        Ok(read_lock(&self.loans).get(&loan_id).cloned())
    }

    fn set_status(&self, loan_id: LoanId, status: LoanStatus) -> StoreResult<()> {
        match write_lock(&self.loans).get_mut(&loan_id) {
            Some(loan) => {
                loan.status = status;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }
}

impl LedgerStore for InMemoryStore {
    fn latest_entry(&self, loan_id: LoanId) -> StoreResult<Option<RepaymentEntry>> {
        Ok(Self::latest_for(&read_lock(&self.entries), loan_id).cloned())
    }

    fn append_entry(
        &self,
        entry: RepaymentEntry,
        expected_latest: Option<EntryId>,
    ) -> StoreResult<()> {
        let mut entries = write_lock(&self.entries);
        let actual = Self::latest_for(&entries, entry.loan_id).map(|e| e.entry_id);
        if actual != expected_latest {
            return Err(StoreError::Conflict);
        }
        entries.push(entry);
        Ok(())
    }

    fn get_entry(&self, entry_id: EntryId) -> StoreResult<Option<RepaymentEntry>> {
        Ok(read_lock(&self.entries)
            .iter()
            .find(|e| e.entry_id == entry_id)
            .cloned())
    }

    fn list_entries(&self, loan_id: Option<LoanId>) -> StoreResult<Vec<RepaymentEntry>> {
        let entries = read_lock(&self.entries);
        Ok(entries
            .iter()
            .rev()
            .filter(|e| loan_id.map_or(true, |id| e.loan_id == id))
            .cloned()
            .collect())
    }

    fn remove_latest(
        &self,
        loan_id: LoanId,
        expected_latest: EntryId,
    ) -> StoreResult<RepaymentEntry> {
        let mut entries = write_lock(&self.entries);
        let position = entries
            .iter()
            .rposition(|e| e.loan_id == loan_id)
            .ok_or(StoreError::NotFound)?;
        if entries[position].entry_id != expected_latest {
            return Err(StoreError::Conflict);
        }
        Ok(entries.remove(position))
    }
}
