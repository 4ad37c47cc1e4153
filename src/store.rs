//! Persistence contract the schedule engine is fed from, plus an in-process
//! implementation.
//!
//! Every read and write is scoped to an owning user; a record owned by
//! someone else behaves exactly like a missing one. Payments are keyed by
//! (parent, date) and recording one again on the same date replaces it.

use chrono::NaiveDate;
use log::{debug, info};
use std::collections::BTreeMap;

use crate::bill::{generate_bill_schedule, Bill, BillEntry, BillPayment};
use crate::calendar::{month_range, DateRange};
use crate::error::{Error, Id, Result};
use crate::loan::{generate_loan_schedule, Loan, LoanPayment, ScheduleEntry};
use crate::money::Money;
use crate::savings::SavingsAccount;
use crate::summary::{aggregate_range, calendar_items, PaymentMap, Totals};
use crate::validate::{BillDraft, LoanDraft, PaymentDraft, SavingsDraft};

pub trait Store {
    fn create_loan(&mut self, owner: Id, draft: LoanDraft) -> Loan;
    fn loan(&self, owner: Id, id: Id) -> Result<Loan>;
    /// Newest first.
    fn loans(&self, owner: Id) -> Vec<Loan>;
    fn update_loan(&mut self, owner: Id, id: Id, draft: LoanDraft) -> Result<Loan>;
    /// Also deletes the loan's payments.
    fn delete_loan(&mut self, owner: Id, id: Id) -> Result<()>;

    fn upsert_loan_payment(
        &mut self,
        owner: Id,
        loan_id: Id,
        payment: PaymentDraft,
    ) -> Result<LoanPayment>;
    fn remove_loan_payment(&mut self, owner: Id, loan_id: Id, date: NaiveDate) -> Result<()>;
    /// Oldest date first.
    fn loan_payments(&self, owner: Id) -> Vec<LoanPayment>;

    fn create_bill(&mut self, owner: Id, draft: BillDraft) -> Bill;
    fn bill(&self, owner: Id, id: Id) -> Result<Bill>;
    /// Newest first.
    fn bills(&self, owner: Id) -> Vec<Bill>;
    fn update_bill(&mut self, owner: Id, id: Id, draft: BillDraft) -> Result<Bill>;
    /// Also deletes the bill's payments.
    fn delete_bill(&mut self, owner: Id, id: Id) -> Result<()>;

    fn upsert_bill_payment(
        &mut self,
        owner: Id,
        bill_id: Id,
        payment: PaymentDraft,
    ) -> Result<BillPayment>;
    fn remove_bill_payment(&mut self, owner: Id, bill_id: Id, date: NaiveDate) -> Result<()>;
    /// Oldest date first.
    fn bill_payments(&self, owner: Id) -> Vec<BillPayment>;

    fn create_savings(&mut self, owner: Id, draft: SavingsDraft) -> SavingsAccount;
    fn savings_account(&self, owner: Id, id: Id) -> Result<SavingsAccount>;
    /// Newest first.
    fn savings(&self, owner: Id) -> Vec<SavingsAccount>;
    fn update_savings(&mut self, owner: Id, id: Id, draft: SavingsDraft)
        -> Result<SavingsAccount>;
    fn delete_savings(&mut self, owner: Id, id: Id) -> Result<()>;

    fn loan_schedule(&self, owner: Id, loan_id: Id) -> Result<Vec<ScheduleEntry>> {
        let loan = self.loan(owner, loan_id)?;
        Ok(generate_loan_schedule(&loan, &self.loan_payments(owner)))
    }

    fn bill_schedule(&self, owner: Id, bill_id: Id, horizon: NaiveDate) -> Result<Vec<BillEntry>> {
        let bill = self.bill(owner, bill_id)?;
        Ok(generate_bill_schedule(&bill, &self.bill_payments(owner), horizon))
    }

    fn calendar(&self, owner: Id, horizon: NaiveDate) -> PaymentMap {
        calendar_items(
            &self.loans(owner),
            &self.loan_payments(owner),
            &self.bills(owner),
            &self.bill_payments(owner),
            horizon,
        )
    }

    fn range_totals(&self, owner: Id, range: DateRange) -> Totals {
        aggregate_range(
            &self.loans(owner),
            &self.loan_payments(owner),
            &self.bills(owner),
            &self.bill_payments(owner),
            range,
        )
    }

    /// Totals for a calendar month; zero for an invalid month.
    fn month_totals(&self, owner: Id, year: i32, month: u32) -> Totals {
        month_range(year, month)
            .map(|range| self.range_totals(owner, range))
            .unwrap_or_default()
    }
}

#[derive(Debug)]
struct Owned<T> {
    owner: Id,
    record: T,
}

/// Auto-increment table of owned records.
#[derive(Debug)]
struct Table<T> {
    next_id: Id,
    rows: BTreeMap<Id, Owned<T>>,
}

impl<T: Clone> Table<T> {
    fn new() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }

    fn insert(&mut self, owner: Id, make: impl FnOnce(Id) -> T) -> T {
        let id = self.next_id;
        self.next_id += 1;
        let record = make(id);
        self.rows.insert(
            id,
            Owned {
                owner,
                record: record.clone(),
            },
        );
        record
    }

    fn get(&self, owner: Id, id: Id) -> Option<&T> {
        self.rows
            .get(&id)
            .filter(|row| row.owner == owner)
            .map(|row| &row.record)
    }

    fn get_mut(&mut self, owner: Id, id: Id) -> Option<&mut T> {
        self.rows
            .get_mut(&id)
            .filter(|row| row.owner == owner)
            .map(|row| &mut row.record)
    }

    fn remove(&mut self, owner: Id, id: Id) -> bool {
        if self.get(owner, id).is_none() {
            return false;
        }
        self.rows.remove(&id).is_some()
    }

    fn newest_first(&self, owner: Id) -> Vec<T> {
        self.rows
            .values()
            .rev()
            .filter(|row| row.owner == owner)
            .map(|row| row.record.clone())
            .collect()
    }

    fn owns(&self, owner: Id, id: Id) -> bool {
        self.get(owner, id).is_some()
    }
}

/// Payment amounts keyed by (parent id, date).
type PaymentTable = BTreeMap<(Id, NaiveDate), Money>;

fn remove_payments_of(payments: &mut PaymentTable, parent: Id) -> usize {
    let before = payments.len();
    payments.retain(|(id, _), _| *id != parent);
    before - payments.len()
}

/// Payments whose parent passes `owns`, oldest date first.
fn payments_by_date(
    payments: &PaymentTable,
    owns: impl Fn(Id) -> bool,
) -> Vec<(Id, NaiveDate, Money)> {
    let mut rows: Vec<(Id, NaiveDate, Money)> = payments
        .iter()
        .filter(|((id, _), _)| owns(*id))
        .map(|((id, date), amount)| (*id, *date, *amount))
        .collect();
    rows.sort_by_key(|(id, date, _)| (*date, *id));
    rows
}

/// Keeps everything in memory. Wrap it in a lock to share it between threads.
#[derive(Debug)]
pub struct MemoryStore {
    loans: Table<Loan>,
    bills: Table<Bill>,
    savings: Table<SavingsAccount>,
    loan_payments: PaymentTable,
    bill_payments: PaymentTable,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            loans: Table::new(),
            bills: Table::new(),
            savings: Table::new(),
            loan_payments: PaymentTable::new(),
            bill_payments: PaymentTable::new(),
        }
    }
}

impl Store for MemoryStore {
    fn create_loan(&mut self, owner: Id, draft: LoanDraft) -> Loan {
        let loan = self.loans.insert(owner, |id| draft.into_loan(id));
        info!("user {} created loan {} ({})", owner, loan.id, loan.name);
        loan
    }

    fn loan(&self, owner: Id, id: Id) -> Result<Loan> {
        self.loans
            .get(owner, id)
            .cloned()
            .ok_or(Error::LoanNotFound(id))
    }

    fn loans(&self, owner: Id) -> Vec<Loan> {
        self.loans.newest_first(owner)
    }

    fn update_loan(&mut self, owner: Id, id: Id, draft: LoanDraft) -> Result<Loan> {
        let loan = self
            .loans
            .get_mut(owner, id)
            .ok_or(Error::LoanNotFound(id))?;
        *loan = draft.into_loan(id);
        debug!("user {} updated loan {}", owner, id);
        Ok(loan.clone())
    }

    fn delete_loan(&mut self, owner: Id, id: Id) -> Result<()> {
        if !self.loans.remove(owner, id) {
            return Err(Error::LoanNotFound(id));
        }
        let removed = remove_payments_of(&mut self.loan_payments, id);
        info!("user {} deleted loan {} and {} payments", owner, id, removed);
        Ok(())
    }

    fn upsert_loan_payment(
        &mut self,
        owner: Id,
        loan_id: Id,
        payment: PaymentDraft,
    ) -> Result<LoanPayment> {
        if !self.loans.owns(owner, loan_id) {
            return Err(Error::LoanNotFound(loan_id));
        }
        self.loan_payments
            .insert((loan_id, payment.date), payment.amount);
        debug!(
            "loan {} payment on {} set to {}",
            loan_id, payment.date, payment.amount
        );
        Ok(LoanPayment::new(loan_id, payment.date, payment.amount))
    }

    fn remove_loan_payment(&mut self, owner: Id, loan_id: Id, date: NaiveDate) -> Result<()> {
        if !self.loans.owns(owner, loan_id) {
            return Err(Error::LoanNotFound(loan_id));
        }
        match self.loan_payments.remove(&(loan_id, date)) {
            Some(_) => {
                debug!("loan {} payment on {} undone", loan_id, date);
                Ok(())
            }
            None => Err(Error::PaymentNotFound {
                parent: loan_id,
                date,
            }),
        }
    }

    fn loan_payments(&self, owner: Id) -> Vec<LoanPayment> {
        payments_by_date(&self.loan_payments, |id| self.loans.owns(owner, id))
            .into_iter()
            .map(|(id, date, amount)| LoanPayment::new(id, date, amount))
            .collect()
    }

    fn create_bill(&mut self, owner: Id, draft: BillDraft) -> Bill {
        let bill = self.bills.insert(owner, |id| draft.into_bill(id));
        info!(
            "user {} created {} {} ({})",
            owner, bill.kind, bill.id, bill.name
        );
        bill
    }

    fn bill(&self, owner: Id, id: Id) -> Result<Bill> {
        self.bills
            .get(owner, id)
            .cloned()
            .ok_or(Error::BillNotFound(id))
    }

    fn bills(&self, owner: Id) -> Vec<Bill> {
        self.bills.newest_first(owner)
    }

    fn update_bill(&mut self, owner: Id, id: Id, draft: BillDraft) -> Result<Bill> {
        let bill = self
            .bills
            .get_mut(owner, id)
            .ok_or(Error::BillNotFound(id))?;
        *bill = draft.into_bill(id);
        debug!("user {} updated bill {}", owner, id);
        Ok(bill.clone())
    }

    fn delete_bill(&mut self, owner: Id, id: Id) -> Result<()> {
        if !self.bills.remove(owner, id) {
            return Err(Error::BillNotFound(id));
        }
        let removed = remove_payments_of(&mut self.bill_payments, id);
        info!("user {} deleted bill {} and {} payments", owner, id, removed);
        Ok(())
    }

    fn upsert_bill_payment(
        &mut self,
        owner: Id,
        bill_id: Id,
        payment: PaymentDraft,
    ) -> Result<BillPayment> {
        if !self.bills.owns(owner, bill_id) {
            return Err(Error::BillNotFound(bill_id));
        }
        self.bill_payments
            .insert((bill_id, payment.date), payment.amount);
        debug!(
            "bill {} payment on {} set to {}",
            bill_id, payment.date, payment.amount
        );
        Ok(BillPayment::new(bill_id, payment.date, payment.amount))
    }

    fn remove_bill_payment(&mut self, owner: Id, bill_id: Id, date: NaiveDate) -> Result<()> {
        if !self.bills.owns(owner, bill_id) {
            return Err(Error::BillNotFound(bill_id));
        }
        match self.bill_payments.remove(&(bill_id, date)) {
            Some(_) => {
                debug!("bill {} payment on {} undone", bill_id, date);
                Ok(())
            }
            None => Err(Error::PaymentNotFound {
                parent: bill_id,
                date,
            }),
        }
    }

    fn bill_payments(&self, owner: Id) -> Vec<BillPayment> {
        payments_by_date(&self.bill_payments, |id| self.bills.owns(owner, id))
            .into_iter()
            .map(|(id, date, amount)| BillPayment::new(id, date, amount))
            .collect()
    }

    fn create_savings(&mut self, owner: Id, draft: SavingsDraft) -> SavingsAccount {
        let account = self.savings.insert(owner, |id| draft.into_account(id));
        info!("user {} created savings account {}", owner, account.id);
        account
    }

    fn savings_account(&self, owner: Id, id: Id) -> Result<SavingsAccount> {
        self.savings
            .get(owner, id)
            .cloned()
            .ok_or(Error::SavingsNotFound(id))
    }

    fn savings(&self, owner: Id) -> Vec<SavingsAccount> {
        self.savings.newest_first(owner)
    }

    fn update_savings(
        &mut self,
        owner: Id,
        id: Id,
        draft: SavingsDraft,
    ) -> Result<SavingsAccount> {
        let account = self
            .savings
            .get_mut(owner, id)
            .ok_or(Error::SavingsNotFound(id))?;
        *account = draft.into_account(id);
        Ok(account.clone())
    }

    fn delete_savings(&mut self, owner: Id, id: Id) -> Result<()> {
        if self.savings.remove(owner, id) {
            Ok(())
        } else {
            Err(Error::SavingsNotFound(id))
        }
    }
}
