use chrono::NaiveDate;
use log::{debug, trace, warn};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::calendar::{amounts_by_date, date_at_offset, Step};
use crate::error::{Id, ParseEnumError};
use crate::money::Money;
use crate::MAX_ITERATIONS;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BillFrequency {
    Once,
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Yearly,
}

impl BillFrequency {
    /// `None` for one-time bills.
    pub fn occurrence_step(&self) -> Option<Step> {
        match self {
            BillFrequency::Once => None,
            BillFrequency::Daily => Some(Step::Days(1)),
            BillFrequency::Weekly => Some(Step::Days(7)),
            BillFrequency::Biweekly => Some(Step::Days(14)),
            BillFrequency::Monthly => Some(Step::Months(1)),
            BillFrequency::Yearly => Some(Step::Months(12)),
        }
    }
}

impl fmt::Display for BillFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BillFrequency::Once => "once",
            BillFrequency::Daily => "daily",
            BillFrequency::Weekly => "weekly",
            BillFrequency::Biweekly => "biweekly",
            BillFrequency::Monthly => "monthly",
            BillFrequency::Yearly => "yearly",
        };
        write!(f, "{name}")
    }
}

impl FromStr for BillFrequency {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "once" => Ok(BillFrequency::Once),
            "daily" => Ok(BillFrequency::Daily),
            "weekly" => Ok(BillFrequency::Weekly),
            "biweekly" => Ok(BillFrequency::Biweekly),
            "monthly" => Ok(BillFrequency::Monthly),
            "yearly" => Ok(BillFrequency::Yearly),
            _ => Err(ParseEnumError {
                what: "bill frequency",
                value: s.to_string(),
            }),
        }
    }
}

/// Whether a bill takes money out or brings it in.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BillKind {
    #[default]
    Expense,
    Income,
}

impl fmt::Display for BillKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BillKind::Expense => write!(f, "expense"),
            BillKind::Income => write!(f, "income"),
        }
    }
}

impl FromStr for BillKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expense" => Ok(BillKind::Expense),
            "income" => Ok(BillKind::Income),
            _ => Err(ParseEnumError {
                what: "bill type",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bill {
    pub id: Id,
    pub name: String,
    pub amount: Money,
    pub frequency: BillFrequency,
    pub kind: BillKind,
    pub start_date: NaiveDate,
}

impl Bill {
    pub fn new(
        id: Id,
        name: impl Into<String>,
        amount: Money,
        frequency: BillFrequency,
        kind: BillKind,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            amount,
            frequency,
            kind,
            start_date,
        }
    }

    pub fn is_income(&self) -> bool {
        self.kind == BillKind::Income
    }

    pub fn schedule(&self, payments: &[BillPayment], horizon: NaiveDate) -> Vec<BillEntry> {
        generate_bill_schedule(self, payments, horizon)
    }
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BillPayment {
    pub bill_id: Id,
    pub date: NaiveDate,
    pub amount: Money,
}

impl BillPayment {
    pub fn new(bill_id: Id, date: NaiveDate, amount: Money) -> Self {
        Self {
            bill_id,
            date,
            amount,
        }
    }
}

/// One occurrence of a bill. Unpaid occurrences are always payable, in any
/// order, so there is no `can_pay` flag.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BillEntry {
    pub date: NaiveDate,
    pub scheduled_amount: Money,
    pub paid: bool,
    pub paid_amount: Option<Money>,
}

impl fmt::Display for BillEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "date {}, amount ${:.2}", self.date, self.scheduled_amount)?;
        match self.paid_amount {
            Some(amt) => write!(f, ", paid ${amt:.2}"),
            None => write!(f, ", unpaid"),
        }
    }
}

/// Projects occurrences of `bill` from its start date through `horizon`.
///
/// A one-time bill yields its single occurrence even when it lies past the
/// horizon.
pub fn generate_bill_schedule(
    bill: &Bill,
    payments: &[BillPayment],
    horizon: NaiveDate,
) -> Vec<BillEntry> {
    let paid_by_date = amounts_by_date(
        payments
            .iter()
            .filter(|p| p.bill_id == bill.id)
            .map(|p| (p.date, p.amount)),
    );
    let entry_on = |date: NaiveDate| {
        let paid_amount = paid_by_date.get(&date).copied();
        BillEntry {
            date,
            scheduled_amount: bill.amount,
            paid: paid_amount.is_some(),
            paid_amount,
        }
    };

    let Some(step) = bill.frequency.occurrence_step() else {
        return vec![entry_on(bill.start_date)];
    };

    let mut schedule: Vec<BillEntry> = Vec::new();
    let mut offset: u32 = 0;
    loop {
        if schedule.len() >= MAX_ITERATIONS {
            warn!(
                "bill {} stopped after {} occurrences before reaching {}",
                bill.id, MAX_ITERATIONS, horizon
            );
            break;
        }
        let Some(date) = date_at_offset(&bill.start_date, offset, step) else {
            warn!("bill {} ran past the last representable date", bill.id);
            break;
        };
        if date > horizon {
            break;
        }

        let entry = entry_on(date);
        trace!("bill {} occurrence {}: {}", bill.id, offset + 1, entry);
        schedule.push(entry);
        offset += 1;
    }

    debug!(
        "bill {} projected {} occurrences through {}",
        bill.id,
        schedule.len(),
        horizon
    );
    schedule
}

pub fn show_schedule(schedule: &[BillEntry]) {
    for entry in schedule {
        println!("{}", entry);
    }
}
