use chrono::NaiveDate;
use log::{debug, trace, warn};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::calendar::{amounts_by_date, date_at_offset, Step};
use crate::error::{Id, ParseEnumError};
use crate::money::{round_money, Money, BALANCE_EPSILON};
use crate::MAX_ITERATIONS;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LoanFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl LoanFrequency {
    pub fn installment_step(&self) -> Step {
        match self {
            LoanFrequency::Daily => Step::Days(1),
            LoanFrequency::Weekly => Step::Days(7),
            LoanFrequency::Monthly => Step::Months(1),
        }
    }
}

impl fmt::Display for LoanFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoanFrequency::Daily => "daily",
            LoanFrequency::Weekly => "weekly",
            LoanFrequency::Monthly => "monthly",
        };
        write!(f, "{name}")
    }
}

impl FromStr for LoanFrequency {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(LoanFrequency::Daily),
            "weekly" => Ok(LoanFrequency::Weekly),
            "monthly" => Ok(LoanFrequency::Monthly),
            _ => Err(ParseEnumError {
                what: "loan frequency",
                value: s.to_string(),
            }),
        }
    }
}

/// Terms of an amortizing loan. `installment_amount` is expected to be
/// positive and no larger than `total_amount`; the generator tolerates
/// anything but only validated terms produce meaningful schedules.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Loan {
    pub id: Id,
    pub name: String,
    pub total_amount: Money,
    pub installment_amount: Money,
    pub frequency: LoanFrequency,
    pub start_date: NaiveDate,
}

impl Loan {
    pub fn new(
        id: Id,
        name: impl Into<String>,
        total_amount: Money,
        installment_amount: Money,
        frequency: LoanFrequency,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            total_amount,
            installment_amount,
            frequency,
            start_date,
        }
    }

    pub fn schedule(&self, payments: &[LoanPayment]) -> Vec<ScheduleEntry> {
        generate_loan_schedule(self, payments)
    }
}

/// A payment actually recorded against a loan. One per (loan, date).
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LoanPayment {
    pub loan_id: Id,
    pub date: NaiveDate,
    pub amount: Money,
}

impl LoanPayment {
    pub fn new(loan_id: Id, date: NaiveDate, amount: Money) -> Self {
        Self {
            loan_id,
            date,
            amount,
        }
    }
}

/// One installment of a loan schedule.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScheduleEntry {
    pub date: NaiveDate,
    pub scheduled_amount: Money,
    pub paid: bool,
    pub paid_amount: Option<Money>,
    /// Set only on the earliest unpaid installment.
    pub can_pay: bool,
}

impl fmt::Display for ScheduleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "date {}, scheduled ${:.2}", self.date, self.scheduled_amount)?;
        match self.paid_amount {
            Some(amt) => write!(f, ", paid ${amt:.2}"),
            None if self.can_pay => write!(f, ", due"),
            None => write!(f, ", unpaid"),
        }
    }
}

/// Projects the installments of `loan` until its balance reaches zero.
///
/// A date with a recorded payment is settled by the recorded amount, so over-
/// and underpayments shorten or lengthen the rest of the schedule. Dates
/// without one are projected at `min(installment, balance)`. Installments must
/// be paid in order: only the earliest unpaid entry has `can_pay` set, even when
/// later entries were paid out of order.
pub fn generate_loan_schedule(loan: &Loan, payments: &[LoanPayment]) -> Vec<ScheduleEntry> {
    let paid_by_date = amounts_by_date(
        payments
            .iter()
            .filter(|p| p.loan_id == loan.id)
            .map(|p| (p.date, p.amount)),
    );

    let step = loan.frequency.installment_step();
    let mut schedule: Vec<ScheduleEntry> = Vec::new();
    let mut balance = loan.total_amount;
    let mut offset: u32 = 0;

    while balance > BALANCE_EPSILON {
        if schedule.len() >= MAX_ITERATIONS {
            warn!(
                "loan {} stopped after {} installments with balance ${:.2} left",
                loan.id, MAX_ITERATIONS, balance
            );
            break;
        }
        let Some(date) = date_at_offset(&loan.start_date, offset, step) else {
            warn!("loan {} ran past the last representable date", loan.id);
            break;
        };

        let paid_amount = paid_by_date.get(&date).copied();
        let scheduled_amount = round_money(loan.installment_amount.min(balance));
        let Some(next) = balance.checked_sub(paid_amount.unwrap_or(scheduled_amount)) else {
            warn!("loan {} balance overflowed at installment {}", loan.id, offset + 1);
            break;
        };
        balance = round_money(next);
        trace!(
            "loan {} installment {}, date {}, scheduled {}, paid {:?}, balance {}",
            loan.id,
            offset + 1,
            date,
            scheduled_amount,
            paid_amount,
            balance
        );

        schedule.push(ScheduleEntry {
            date,
            scheduled_amount,
            paid: paid_amount.is_some(),
            paid_amount,
            can_pay: false,
        });
        offset += 1;
    }

    if let Some(entry) = schedule.iter_mut().find(|e| !e.paid) {
        entry.can_pay = true;
    }
    debug!("loan {} projected {} installments", loan.id, schedule.len());
    schedule
}

/// Date of the final installment, or `None` for an empty schedule.
pub fn payoff_date(loan: &Loan, payments: &[LoanPayment]) -> Option<NaiveDate> {
    generate_loan_schedule(loan, payments)
        .last()
        .map(|entry| entry.date)
}

/// Sum of every payment recorded for the loan, scheduled date or not.
pub fn total_paid(loan_id: Id, payments: &[LoanPayment]) -> Money {
    payments
        .iter()
        .filter(|p| p.loan_id == loan_id)
        .fold(Money::ZERO, |sum, p| sum.saturating_add(p.amount))
}

/// What is still owed, never below zero.
pub fn remaining_balance(loan: &Loan, payments: &[LoanPayment]) -> Money {
    loan.total_amount
        .saturating_sub(total_paid(loan.id, payments))
        .max(Money::ZERO)
}

pub fn show_schedule(schedule: &[ScheduleEntry]) {
    for entry in schedule {
        println!("{}", entry);
    }
}

#[cfg(test)]
mod tests {
    use super::{
        generate_loan_schedule, payoff_date, remaining_balance, total_paid, Loan, LoanFrequency,
        LoanPayment, ScheduleEntry,
    };
    use crate::MAX_ITERATIONS;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use test_log::test;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn monthly_loan() -> Loan {
        Loan::new(
            1,
            "car",
            dec!(1000),
            dec!(200),
            LoanFrequency::Monthly,
            ymd(2024, 1, 1),
        )
    }

    #[test]
    fn test_projection_without_payments() {
        let loan = monthly_loan();
        let schedule = generate_loan_schedule(&loan, &[]);

        assert_eq!(schedule.len(), 5);
        assert!(schedule.iter().all(|e| e.scheduled_amount == dec!(200)));
        assert!(schedule.iter().all(|e| !e.paid && e.paid_amount.is_none()));
        assert_eq!(schedule[4].date, ymd(2024, 5, 1));
        assert_eq!(payoff_date(&loan, &[]), Some(ymd(2024, 5, 1)));
    }

    #[test]
    fn test_last_installment_is_remainder() {
        let loan = Loan::new(
            2,
            "phone",
            dec!(1000),
            dec!(300),
            LoanFrequency::Weekly,
            ymd(2024, 3, 4),
        );
        let schedule = generate_loan_schedule(&loan, &[]);
        let amounts: Vec<_> = schedule.iter().map(|e| e.scheduled_amount).collect();

        assert_eq!(amounts, vec![dec!(300), dec!(300), dec!(300), dec!(100)]);
        assert_eq!(schedule[3].date, ymd(2024, 3, 25));
    }

    #[test]
    fn test_lump_sum_pays_off() {
        let loan = monthly_loan();
        let payments = vec![LoanPayment::new(1, ymd(2024, 1, 1), dec!(1000))];
        let schedule = generate_loan_schedule(&loan, &payments);

        assert_eq!(
            schedule,
            vec![ScheduleEntry {
                date: ymd(2024, 1, 1),
                scheduled_amount: dec!(200),
                paid: true,
                paid_amount: Some(dec!(1000)),
                can_pay: false,
            }]
        );
    }

    #[test]
    fn test_underpayment_extends_schedule() {
        let loan = monthly_loan();
        let payments = vec![LoanPayment::new(1, ymd(2024, 1, 1), dec!(100))];
        let schedule = generate_loan_schedule(&loan, &payments);

        assert_eq!(schedule.len(), 6);
        assert_eq!(schedule[5].date, ymd(2024, 6, 1));
        assert_eq!(schedule[5].scheduled_amount, dec!(100));
        assert!(schedule[1].can_pay);
    }

    #[test]
    fn test_overpayment_shortens_schedule() {
        let loan = monthly_loan();
        let payments = vec![LoanPayment::new(1, ymd(2024, 1, 1), dec!(450))];
        let schedule = generate_loan_schedule(&loan, &payments);
        let amounts: Vec<_> = schedule.iter().map(|e| e.scheduled_amount).collect();

        assert_eq!(amounts, vec![dec!(200), dec!(200), dec!(200), dec!(150)]);
    }

    #[test]
    fn test_only_first_unpaid_can_pay() {
        let loan = monthly_loan();
        let payments = vec![
            LoanPayment::new(1, ymd(2024, 1, 1), dec!(200)),
            LoanPayment::new(1, ymd(2024, 3, 1), dec!(200)),
        ];
        let schedule = generate_loan_schedule(&loan, &payments);
        let can_pay: Vec<bool> = schedule.iter().map(|e| e.can_pay).collect();

        assert_eq!(can_pay, vec![false, true, false, false, false]);
        assert!(schedule[2].paid);
    }

    #[test]
    fn test_fully_paid_has_nothing_payable() {
        let loan = monthly_loan();
        let payments: Vec<LoanPayment> = (1..=5)
            .map(|m| LoanPayment::new(1, ymd(2024, m, 1), dec!(200)))
            .collect();
        let schedule = generate_loan_schedule(&loan, &payments);

        assert_eq!(schedule.len(), 5);
        assert!(schedule.iter().all(|e| e.paid && !e.can_pay));
    }

    #[test]
    fn test_month_end_start() {
        let loan = Loan::new(
            3,
            "rent advance",
            dec!(500),
            dec!(100),
            LoanFrequency::Monthly,
            ymd(2024, 1, 31),
        );
        let dates: Vec<_> = generate_loan_schedule(&loan, &[])
            .iter()
            .map(|e| e.date)
            .collect();

        assert_eq!(
            dates,
            vec![
                ymd(2024, 1, 31),
                ymd(2024, 2, 29),
                ymd(2024, 3, 31),
                ymd(2024, 4, 30),
                ymd(2024, 5, 31),
            ]
        );
    }

    #[test]
    fn test_payment_lookup_is_per_loan() {
        let loan = monthly_loan();
        let payments = vec![
            LoanPayment::new(1, ymd(2024, 2, 1), dec!(120)),
            LoanPayment::new(1, ymd(2024, 2, 1), dec!(80)),
            LoanPayment::new(9, ymd(2024, 1, 1), dec!(200)),
        ];
        let schedule = generate_loan_schedule(&loan, &payments);

        assert!(!schedule[0].paid);
        assert!(schedule[0].can_pay);
        assert_eq!(schedule[1].paid_amount, Some(dec!(200)));
        assert_eq!(schedule.len(), 5);
    }

    #[test]
    fn test_cents_do_not_drift() {
        let loan = Loan::new(
            4,
            "laptop",
            dec!(100),
            dec!(33.33),
            LoanFrequency::Daily,
            ymd(2024, 1, 1),
        );
        let schedule = generate_loan_schedule(&loan, &[]);
        let amounts: Vec<_> = schedule.iter().map(|e| e.scheduled_amount).collect();

        assert_eq!(amounts, vec![dec!(33.33), dec!(33.33), dec!(33.33), dec!(0.01)]);
    }

    #[test]
    fn test_zero_installment_hits_cap() {
        let loan = Loan::new(
            5,
            "broken",
            dec!(100),
            dec!(0),
            LoanFrequency::Daily,
            ymd(2000, 1, 1),
        );
        let schedule = generate_loan_schedule(&loan, &[]);

        assert_eq!(schedule.len(), MAX_ITERATIONS);
        assert_eq!(schedule[0].date, ymd(2000, 1, 1));
        assert!(schedule[0].can_pay);
    }

    #[test]
    fn test_runaway_balance_stops() {
        let loan = Loan::new(
            6,
            "negative",
            dec!(100),
            -(Decimal::MAX / dec!(2)),
            LoanFrequency::Daily,
            ymd(2024, 1, 1),
        );
        let schedule = generate_loan_schedule(&loan, &[]);

        assert!(!schedule.is_empty());
        assert!(schedule.len() < MAX_ITERATIONS);
        assert!(schedule[0].can_pay);

        let payments = vec![LoanPayment::new(1, ymd(2024, 1, 1), -Decimal::MAX)];
        assert!(generate_loan_schedule(&monthly_loan(), &payments).is_empty());
    }

    #[test]
    fn test_empty_loan() {
        let mut loan = monthly_loan();
        loan.total_amount = dec!(0);

        assert!(generate_loan_schedule(&loan, &[]).is_empty());
        assert_eq!(payoff_date(&loan, &[]), None);
    }

    #[test]
    fn test_idempotent() {
        let loan = monthly_loan();
        let payments = vec![LoanPayment::new(1, ymd(2024, 2, 1), dec!(250))];

        assert_eq!(
            generate_loan_schedule(&loan, &payments),
            generate_loan_schedule(&loan, &payments)
        );
    }

    #[test]
    fn test_totals() {
        let loan = monthly_loan();
        let payments = vec![
            LoanPayment::new(1, ymd(2024, 1, 1), dec!(200)),
            // off-schedule date still counts toward the total
            LoanPayment::new(1, ymd(2024, 1, 15), dec!(50)),
            LoanPayment::new(2, ymd(2024, 1, 1), dec!(999)),
        ];

        assert_eq!(total_paid(1, &payments), dec!(250));
        assert_eq!(remaining_balance(&loan, &payments), dec!(750));

        let overpaid = vec![LoanPayment::new(1, ymd(2024, 1, 1), dec!(1200))];
        assert_eq!(remaining_balance(&loan, &overpaid), dec!(0));

        let huge = vec![
            LoanPayment::new(1, ymd(2024, 1, 1), Decimal::MAX),
            LoanPayment::new(1, ymd(2024, 2, 1), Decimal::MAX),
        ];
        assert_eq!(total_paid(1, &huge), Decimal::MAX);
        assert_eq!(remaining_balance(&loan, &huge), dec!(0));
    }

    #[test]
    fn test_display() {
        let loan = monthly_loan();
        let payments = vec![LoanPayment::new(1, ymd(2024, 1, 1), dec!(200))];
        let schedule = generate_loan_schedule(&loan, &payments);

        assert_eq!(schedule[0].to_string(), "date 2024-01-01, scheduled $200.00, paid $200.00");
        assert_eq!(schedule[1].to_string(), "date 2024-02-01, scheduled $200.00, due");
        assert_eq!(schedule[2].to_string(), "date 2024-03-01, scheduled $200.00, unpaid");
    }

    #[test]
    fn test_frequency_names() {
        for freq in [LoanFrequency::Daily, LoanFrequency::Weekly, LoanFrequency::Monthly] {
            assert_eq!(freq.to_string().parse::<LoanFrequency>(), Ok(freq));
        }
        assert!("biweekly".parse::<LoanFrequency>().is_err());
    }
}
