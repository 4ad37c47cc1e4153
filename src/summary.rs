//! Folds loan and bill schedules into what the payment calendar shows: the
//! items due on each day and loan, bill and income totals over a range.
//!
//! Schedules are regenerated on every call; nothing here is cached.

use chrono::NaiveDate;
use log::debug;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::bill::{generate_bill_schedule, Bill, BillKind, BillPayment};
use crate::calendar::DateRange;
use crate::error::Id;
use crate::loan::{generate_loan_schedule, Loan, LoanPayment};
use crate::money::Money;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ItemKind {
    Loan,
    Bill,
    Income,
}

impl From<BillKind> for ItemKind {
    fn from(kind: BillKind) -> Self {
        match kind {
            BillKind::Expense => ItemKind::Bill,
            BillKind::Income => ItemKind::Income,
        }
    }
}

/// One loan installment or bill occurrence on a calendar day.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalendarItem {
    pub kind: ItemKind,
    pub item_id: Id,
    pub name: String,
    pub scheduled_amount: Money,
    pub paid: bool,
    pub paid_amount: Option<Money>,
    /// Always true for bills and income.
    pub can_pay: bool,
}

/// Calendar items grouped by day, days in order. Within a day loans come
/// first, then bills, each in input order.
pub type PaymentMap = BTreeMap<NaiveDate, Vec<CalendarItem>>;

/// Builds the per-day view of every schedule. Loans run to payoff; bills
/// run through `horizon`.
pub fn calendar_items(
    loans: &[Loan],
    loan_payments: &[LoanPayment],
    bills: &[Bill],
    bill_payments: &[BillPayment],
    horizon: NaiveDate,
) -> PaymentMap {
    let mut map = PaymentMap::new();

    for loan in loans {
        for entry in generate_loan_schedule(loan, loan_payments) {
            map.entry(entry.date).or_default().push(CalendarItem {
                kind: ItemKind::Loan,
                item_id: loan.id,
                name: loan.name.clone(),
                scheduled_amount: entry.scheduled_amount,
                paid: entry.paid,
                paid_amount: entry.paid_amount,
                can_pay: entry.can_pay,
            });
        }
    }

    for bill in bills {
        for entry in generate_bill_schedule(bill, bill_payments, horizon) {
            map.entry(entry.date).or_default().push(CalendarItem {
                kind: bill.kind.into(),
                item_id: bill.id,
                name: bill.name.clone(),
                scheduled_amount: entry.scheduled_amount,
                paid: entry.paid,
                paid_amount: entry.paid_amount,
                can_pay: true,
            });
        }
    }

    debug!(
        "calendar built for {} loans and {} bills across {} days",
        loans.len(),
        bills.len(),
        map.len()
    );
    map
}

/// Scheduled amounts split by kind.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Totals {
    pub loan_total: Money,
    pub bill_total: Money,
    pub income_total: Money,
}

impl Totals {
    /// Sums saturate at `Money::MAX` rather than overflowing.
    pub fn add(&mut self, item: &CalendarItem) {
        let total = match item.kind {
            ItemKind::Loan => &mut self.loan_total,
            ItemKind::Bill => &mut self.bill_total,
            ItemKind::Income => &mut self.income_total,
        };
        *total = total.saturating_add(item.scheduled_amount);
    }

    pub fn expense_total(&self) -> Money {
        self.loan_total.saturating_add(self.bill_total)
    }

    /// Income minus loan and bill outgoings.
    pub fn net(&self) -> Money {
        self.income_total.saturating_sub(self.expense_total())
    }
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RangeEntry {
    pub date: NaiveDate,
    pub item: CalendarItem,
}

/// Everything due in a date range, in date order, with totals.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RangeSummary {
    pub range: DateRange,
    pub entries: Vec<RangeEntry>,
    pub totals: Totals,
    pub paid_count: usize,
    /// Paid amounts of settled entries, falling back to the scheduled amount.
    pub total_paid: Money,
}

pub fn summarize_range(map: &PaymentMap, range: DateRange) -> RangeSummary {
    let mut summary = RangeSummary {
        range,
        entries: Vec::new(),
        totals: Totals::default(),
        paid_count: 0,
        total_paid: Money::ZERO,
    };
    if range.end < range.start {
        return summary;
    }

    for (date, items) in map.range(range.start..=range.end) {
        for item in items {
            summary.totals.add(item);
            if item.paid {
                summary.paid_count += 1;
                summary.total_paid = summary
                    .total_paid
                    .saturating_add(item.paid_amount.unwrap_or(item.scheduled_amount));
            }
            summary.entries.push(RangeEntry {
                date: *date,
                item: item.clone(),
            });
        }
    }
    summary
}

/// Totals of everything scheduled within `range`, inclusive.
pub fn aggregate_range(
    loans: &[Loan],
    loan_payments: &[LoanPayment],
    bills: &[Bill],
    bill_payments: &[BillPayment],
    range: DateRange,
) -> Totals {
    let map = calendar_items(loans, loan_payments, bills, bill_payments, range.end);
    summarize_range(&map, range).totals
}

pub fn aggregate_month(
    loans: &[Loan],
    loan_payments: &[LoanPayment],
    bills: &[Bill],
    bill_payments: &[BillPayment],
    month_start: NaiveDate,
    month_end: NaiveDate,
) -> Totals {
    aggregate_range(
        loans,
        loan_payments,
        bills,
        bill_payments,
        DateRange::new(month_start, month_end),
    )
}

/// Totals over an explicit set of days, such as a drag-selected span.
/// A day listed more than once is counted once.
pub fn aggregate_dates(
    loans: &[Loan],
    loan_payments: &[LoanPayment],
    bills: &[Bill],
    bill_payments: &[BillPayment],
    dates: &[NaiveDate],
) -> Totals {
    let days: BTreeSet<NaiveDate> = dates.iter().copied().collect();
    let Some(horizon) = days.last().copied() else {
        return Totals::default();
    };

    let map = calendar_items(loans, loan_payments, bills, bill_payments, horizon);
    let mut totals = Totals::default();
    for item in days.iter().filter_map(|d| map.get(d)).flatten() {
        totals.add(item);
    }
    totals
}
