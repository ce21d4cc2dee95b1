pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod store;
pub mod types;

// re-export key types
pub use config::LedgerConfig;
pub use decimal::Money;
pub use errors::{LedgerError, Result};
pub use events::{Event, EventStore};
pub use ledger::RepaymentLedger;
pub use store::{InMemoryStore, LedgerStore, LoanStore, StoreError, StoreResult};
pub use types::{
    DeletedRepayment, EntryId, Loan, LoanId, LoanStatus, PaymentMethodId, RepaymentEntry,
    RepaymentReceipt, RepaymentRequest, StaffId,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
