//! Calendar stepping shared by the loan and bill generators.
//!
//! Occurrence `n` is always computed from the start date, never from the
//! previous occurrence. For month-based steps this means a start on the 31st
//! is clamped to the end of shorter months and recovers to the 31st whenever
//! the target month has one.

use std::collections::HashMap;

use chrono::{Datelike, Days, Months, NaiveDate};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// Distance between two consecutive occurrences.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Step {
    Days(u32),
    Months(u32),
}

/// Date of the `offset`-th occurrence after `start` (offset 0 is `start`).
///
/// Returns `None` when the result falls outside chrono's representable range.
pub fn date_at_offset(start: &NaiveDate, offset: u32, step: Step) -> Option<NaiveDate> {
    match step {
        Step::Days(days) => {
            let total = u64::from(days) * u64::from(offset);
            start.checked_add_days(Days::new(total))
        }
        // chrono clamps to the last day of the target month
        Step::Months(months) => {
            let total = months.checked_mul(offset)?;
            start.checked_add_months(Months::new(total))
        }
    }
}

/// Recorded amounts keyed by date. Duplicate rows for one date are summed.
pub(crate) fn amounts_by_date(
    rows: impl Iterator<Item = (NaiveDate, Money)>,
) -> HashMap<NaiveDate, Money> {
    let mut paid_by_date = HashMap::new();
    for (date, amount) in rows {
        let sum = paid_by_date.entry(date).or_insert(Money::ZERO);
        *sum = sum.saturating_add(amount);
    }
    paid_by_date
}

/// Inclusive range of calendar dates.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.start <= *date && *date <= self.end
    }

    /// Every day in the range, in order. Empty when `end < start`.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }
}

/// First through last day of the given month.
pub fn month_range(year: i32, month: u32) -> Option<DateRange> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let end = start.checked_add_months(Months::new(1))?.pred_opt()?;
    Some(DateRange::new(start, end))
}

/// Furthest date recurring bills are projected to when the calendar is
/// showing `today`: the end of the following year.
pub fn default_horizon(today: &NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(today.year() + 1, 12, 31).unwrap_or(NaiveDate::MAX)
}
