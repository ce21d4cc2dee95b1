use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;

/// unique identifier for a loan
pub type LoanId = Uuid;

/// unique identifier for a ledger entry
pub type EntryId = Uuid;

/// unique identifier for a payment method
pub type PaymentMethodId = Uuid;

/// unique identifier for a staff member
pub type StaffId = Uuid;

/// loan lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    /// disbursed and accepting repayments
    Active,
    /// fully repaid, outstanding balance exactly zero
    Completed,
    /// in default, still accepting recovery payments
    Defaulted,
    /// administratively suspended
    Suspended,
}

/// a disbursed loan as held by the loan record store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub loan_id: LoanId,
    pub principal: Money,
    pub status: LoanStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Loan {
    /// create an active loan
    pub fn new(principal: Money, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            loan_id: Uuid::new_v4(),
            principal,
            status: LoanStatus::Active,
            start_date,
            end_date,
        }
    }
}

/// one recorded payment against a loan, carrying the balance after it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepaymentEntry {
    pub entry_id: EntryId,
    pub loan_id: LoanId,
    pub repayment_date: NaiveDate,
    pub amount_paid: Money,
    /// outstanding balance after this payment, never negative
    pub balance: Money,
    pub payment_method_id: PaymentMethodId,
    pub staff_id: Option<StaffId>,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// repayment submission
#[derive(Debug, Clone, PartialEq)]
pub struct RepaymentRequest {
    pub loan_id: LoanId,
    pub amount_paid: Money,
    pub repayment_date: NaiveDate,
    pub payment_method_id: PaymentMethodId,
    pub staff_id: Option<StaffId>,
    pub notes: Option<String>,
}

impl RepaymentRequest {
    pub fn new(
        loan_id: LoanId,
        amount_paid: Money,
        repayment_date: NaiveDate,
        payment_method_id: PaymentMethodId,
    ) -> Self {
        Self {
            loan_id,
            amount_paid,
            repayment_date,
            payment_method_id,
            staff_id: None,
            notes: None,
        }
    }

    pub fn with_staff(mut self, staff_id: StaffId) -> Self {
        self.staff_id = Some(staff_id);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// result of a successful repayment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepaymentReceipt {
    pub entry_id: EntryId,
    pub loan_id: LoanId,
    pub new_balance: Money,
    /// true when this payment brought the balance to exactly zero
    pub loan_settled: bool,
}

/// result of deleting a ledger entry
#[derive(Debug, Clone, PartialEq)]
pub struct DeletedRepayment {
    pub entry: RepaymentEntry,
    /// true when the deleted entry was the settling one and the loan
    /// went back to Active
    pub loan_reopened: bool,
}
