use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hourglass_rs::SafeTimeProvider;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::LedgerConfig;
use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::events::{Event, EventStore};
use crate::store::{LedgerStore, LoanStore, StoreError};
use crate::types::{
    DeletedRepayment, EntryId, Loan, LoanId, LoanStatus, RepaymentEntry, RepaymentReceipt,
    RepaymentRequest,
};

/// repayment ledger service
///
/// Serializes balance mutations per loan through the ledger store's
/// conditional append: the current balance is read together with the latest
/// entry id, and the new entry is written conditional on that id still being
/// the latest. A concurrent writer makes the condition fail, and the losing
/// call re-reads and retries within the configured budget, so the second
/// writer always computes from the first writer's completed balance.
pub struct RepaymentLedger {
    loan_store: Arc<dyn LoanStore>,
    ledger_store: Arc<dyn LedgerStore>,
    config: LedgerConfig,
    events: Mutex<EventStore>,
}

impl RepaymentLedger {
    pub fn new(
        loan_store: Arc<dyn LoanStore>,
        ledger_store: Arc<dyn LedgerStore>,
        config: LedgerConfig,
    ) -> Self {
        Self {
            loan_store,
            ledger_store,
            config,
            events: Mutex::new(EventStore::new()),
        }
    }

    /// record a payment against a loan and return the updated balance
    ///
    /// Validation happens before any store access; every failure path leaves
    /// both stores untouched. Exactly one entry is appended on success, plus
    /// one status write when the balance reaches zero.
    pub fn record_repayment(
        &self,
        request: RepaymentRequest,
        time_provider: &SafeTimeProvider,
    ) -> Result<RepaymentReceipt> {
        if !request.amount_paid.is_positive() {
            return Err(LedgerError::InvalidAmount {
                amount: request.amount_paid,
            });
        }

        let loan_id = request.loan_id;
        let loan = self.fetch_loan(loan_id)?;
        if loan.status == LoanStatus::Completed {
            return Err(LedgerError::AlreadySettled { loan_id });
        }

        let mut attempts = 0;
        loop {
            let latest = self
                .ledger_store
                .latest_entry(loan_id)
                .map_err(|err| loan_store_failure(err, loan_id))?;
            let (current_balance, expected_latest) = match &latest {
                Some(entry) => (entry.balance, Some(entry.entry_id)),
                None => (loan.principal, None),
            };

            if !current_balance.is_positive() {
                return Err(LedgerError::AlreadySettled { loan_id });
            }

            let new_balance = current_balance - request.amount_paid;
            if new_balance.is_negative() {
                return Err(LedgerError::OverpaymentRejected {
                    max_accepted: current_balance,
                });
            }

            let entry = RepaymentEntry {
                entry_id: Uuid::new_v4(),
                loan_id,
                repayment_date: request.repayment_date,
                amount_paid: request.amount_paid,
                balance: new_balance,
                payment_method_id: request.payment_method_id,
                staff_id: request.staff_id,
                notes: request.notes.clone(),
                recorded_at: time_provider.now(),
            };
            let entry_id = entry.entry_id;
            let recorded_at = entry.recorded_at;

            match self.ledger_store.append_entry(entry, expected_latest) {
                Ok(()) => {
                    let loan_settled = new_balance.is_zero();
                    if loan_settled {
                        // the entry landed but the loan could not be closed;
                        // take the entry back out so the caller sees a clean
                        // failure with nothing persisted
                        if let Err(err) = self.set_status(loan_id, LoanStatus::Completed) {
                            self.rollback_append(loan_id, entry_id);
                            return Err(err);
                        }
                    }

                    let mut events = self.events_lock();
                    events.emit(Event::RepaymentRecorded {
                        loan_id,
                        entry_id,
                        amount_paid: request.amount_paid,
                        new_balance,
                        repayment_date: request.repayment_date,
                        timestamp: recorded_at,
                    });
                    if loan_settled {
                        events.emit(Event::LoanSettled {
                            loan_id,
                            final_entry_id: entry_id,
                            total_principal: loan.principal,
                            timestamp: recorded_at,
                        });
                    }
                    drop(events);

                    info!(
                        %loan_id,
                        %entry_id,
                        amount = %request.amount_paid,
                        balance = %new_balance,
                        settled = loan_settled,
                        "repayment recorded"
                    );

                    return Ok(RepaymentReceipt {
                        entry_id,
                        loan_id,
                        new_balance,
                        loan_settled,
                    });
                }
                Err(StoreError::Conflict) => {
                    attempts += 1;
                    if attempts > self.config.max_conflict_retries {
                        warn!(%loan_id, attempts, "conflict retry budget exhausted");
                        return Err(LedgerError::ConcurrentModification { loan_id });
                    }
                    // another writer got in first, re-read its balance
                    continue;
                }
                Err(err) => return Err(read_failure(err)),
            }
        }
    }

    /// entries for one loan, or the whole ledger, most recent first
    pub fn list_repayments(&self, loan_id: Option<LoanId>) -> Result<Vec<RepaymentEntry>> {
        self.ledger_store
            .list_entries(loan_id)
            .map_err(|err| match (err, loan_id) {
                (StoreError::NotFound, Some(id)) => LedgerError::LoanNotFound { loan_id: id },
                (other, _) => read_failure(other),
            })
    }

    /// current outstanding balance: latest entry balance, or the principal
    /// when nothing has been repaid yet
    pub fn outstanding_balance(&self, loan_id: LoanId) -> Result<Money> {
        match self
            .ledger_store
            .latest_entry(loan_id)
            .map_err(|err| loan_store_failure(err, loan_id))?
        {
            Some(entry) => Ok(entry.balance),
            None => Ok(self.fetch_loan(loan_id)?.principal),
        }
    }

    /// delete a ledger entry
    ///
    /// Only the most recent entry of a loan is deletable: balances are
    /// cached per row, so removing an earlier entry would leave every later
    /// balance inconsistent with a recomputation. Deleting the settling
    /// entry reopens the loan; the status write lands before the removal,
    /// so a concurrent repayment in that window still reads the zero
    /// balance and is rejected, never a stale one.
    pub fn delete_repayment(
        &self,
        entry_id: EntryId,
        time_provider: &SafeTimeProvider,
    ) -> Result<DeletedRepayment> {
        let entry = self
            .ledger_store
            .get_entry(entry_id)
            .map_err(|err| match err {
                StoreError::NotFound => LedgerError::EntryNotFound { entry_id },
                other => read_failure(other),
            })?
            .ok_or(LedgerError::EntryNotFound { entry_id })?;
        let loan_id = entry.loan_id;

        let latest = self
            .ledger_store
            .latest_entry(loan_id)
            .map_err(|err| loan_store_failure(err, loan_id))?;
        if latest.map(|e| e.entry_id) != Some(entry_id) {
            return Err(LedgerError::EntryNotDeletable { entry_id });
        }

        // the balance before this entry is recoverable without a store
        // read: balance = previous - amount, so previous = balance + amount
        let restored_balance = entry.balance + entry.amount_paid;

        // reopen first: either both writes land, or the status write is
        // compensated back, so ledger and loan never disagree on a failure
        let loan_reopened = entry.balance.is_zero();
        if loan_reopened {
            self.set_status(loan_id, LoanStatus::Active)?;
        }

        let removed = match self.ledger_store.remove_latest(loan_id, entry_id) {
            Ok(removed) => removed,
            Err(err) => {
                if loan_reopened {
                    self.rollback_status(loan_id, LoanStatus::Completed);
                }
                return Err(match err {
                    StoreError::Conflict => LedgerError::ConcurrentModification { loan_id },
                    StoreError::NotFound => LedgerError::EntryNotFound { entry_id },
                    StoreError::Unavailable(message) => LedgerError::StoreUnavailable { message },
                });
            }
        };

        let timestamp = time_provider.now();
        let mut events = self.events_lock();
        events.emit(Event::RepaymentDeleted {
            loan_id,
            entry_id,
            amount_paid: removed.amount_paid,
            restored_balance,
            timestamp,
        });
        if loan_reopened {
            events.emit(Event::LoanReopened {
                loan_id,
                outstanding_balance: restored_balance,
                timestamp,
            });
        }
        drop(events);

        info!(
            %loan_id,
            %entry_id,
            restored = %restored_balance,
            reopened = loan_reopened,
            "repayment deleted"
        );

        Ok(DeletedRepayment {
            entry: removed,
            loan_reopened,
        })
    }

    /// drain events collected since the last call
    pub fn take_events(&self) -> Vec<Event> {
        self.events_lock().take_events()
    }

    /// snapshot of collected events
    pub fn events(&self) -> Vec<Event> {
        self.events_lock().events().to_vec()
    }

    fn fetch_loan(&self, loan_id: LoanId) -> Result<Loan> {
        match self.loan_store.get_loan(loan_id) {
            Ok(Some(loan)) => Ok(loan),
            Ok(None) | Err(StoreError::NotFound) => Err(LedgerError::LoanNotFound { loan_id }),
            Err(err) => Err(read_failure(err)),
        }
    }

    fn set_status(&self, loan_id: LoanId, status: LoanStatus) -> Result<()> {
        self.loan_store
            .set_status(loan_id, status)
            .map_err(|err| match err {
                StoreError::NotFound => LedgerError::LoanNotFound { loan_id },
                other => read_failure(other),
            })
    }

    // compensating writes for the two-store failure paths; best effort,
    // a failure here leaves the stores disagreeing and is logged
    fn rollback_append(&self, loan_id: LoanId, entry_id: EntryId) {
        if let Err(err) = self.ledger_store.remove_latest(loan_id, entry_id) {
            error!(%loan_id, %entry_id, error = %err, "rollback of appended entry failed");
        }
    }

    fn rollback_status(&self, loan_id: LoanId, status: LoanStatus) {
        if let Err(err) = self.loan_store.set_status(loan_id, status) {
            error!(%loan_id, ?status, error = %err, "status rollback failed");
        }
    }

    fn events_lock(&self) -> MutexGuard<'_, EventStore> {
        // a poisoned event log is still readable
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn loan_store_failure(err: StoreError, loan_id: LoanId) -> LedgerError {
    match err {
        StoreError::NotFound => LedgerError::LoanNotFound { loan_id },
        StoreError::Conflict => LedgerError::ConcurrentModification { loan_id },
        StoreError::Unavailable(message) => LedgerError::StoreUnavailable { message },
    }
}

fn read_failure(err: StoreError) -> LedgerError {
    LedgerError::StoreUnavailable {
        message: err.to_string(),
    }
}
