use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{EntryId, LoanId};

/// all events emitted by the repayment ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    RepaymentRecorded {
        loan_id: LoanId,
        entry_id: EntryId,
        amount_paid: Money,
        new_balance: Money,
        repayment_date: NaiveDate,
        timestamp: DateTime<Utc>,
    },
    LoanSettled {
        loan_id: LoanId,
        final_entry_id: EntryId,
        total_principal: Money,
        timestamp: DateTime<Utc>,
    },
    RepaymentDeleted {
        loan_id: LoanId,
        entry_id: EntryId,
        amount_paid: Money,
        restored_balance: Money,
        timestamp: DateTime<Utc>,
    },
    LoanReopened {
        loan_id: LoanId,
        outstanding_balance: Money,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_take_events_drains() {
        let mut store = EventStore::new();
        store.emit(Event::LoanReopened {
            loan_id: Uuid::new_v4(),
            outstanding_balance: Money::from_major(1000),
            timestamp: Utc::now(),
        });

        assert_eq!(store.events().len(), 1);
        let taken = store.take_events();
        assert_eq!(taken.len(), 1);
        assert!(store.events().is_empty());
    }
}
