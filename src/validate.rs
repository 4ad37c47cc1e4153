//! Checks raw request input before it becomes loan, bill, savings or payment
//! terms. Every problem with an input is reported, not just the first.

use chrono::NaiveDate;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bill::{Bill, BillFrequency, BillKind};
use crate::error::{Id, Result, ValidationErrors};
use crate::loan::{Loan, LoanFrequency};
use crate::money::Money;
use crate::savings::SavingsAccount;

/// Parses a `YYYY-MM-DD` calendar date. Anything looser, such as missing
/// zero padding, is rejected.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let shaped = s.len() == 10
        && s.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn required_name(name: &str, errors: &mut ValidationErrors) -> String {
    let name = name.trim();
    if name.is_empty() {
        errors.push("Name is required");
    }
    name.to_string()
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct LoanInput {
    pub name: String,
    pub amount: Money,
    pub payment_amount: Money,
    pub frequency: String,
    pub start_date: String,
}

/// Validated loan terms that have not been given an id yet.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LoanDraft {
    pub name: String,
    pub total_amount: Money,
    pub installment_amount: Money,
    pub frequency: LoanFrequency,
    pub start_date: NaiveDate,
}

impl LoanDraft {
    pub fn into_loan(self, id: Id) -> Loan {
        Loan::new(
            id,
            self.name,
            self.total_amount,
            self.installment_amount,
            self.frequency,
            self.start_date,
        )
    }
}

pub fn validate_loan(input: &LoanInput) -> Result<LoanDraft> {
    let mut errors = ValidationErrors::new();
    let name = required_name(&input.name, &mut errors);

    if input.amount <= Money::ZERO {
        errors.push("Amount must be greater than 0");
    }
    if input.payment_amount <= Money::ZERO {
        errors.push("Payment amount must be greater than 0");
    }
    if input.payment_amount > input.amount {
        errors.push("Payment amount cannot exceed total amount");
    }
    let frequency = input.frequency.parse::<LoanFrequency>().ok();
    if frequency.is_none() {
        errors.push("Invalid frequency");
    }
    let start_date = parse_date(&input.start_date);
    if start_date.is_none() {
        errors.push("Invalid start date format");
    }

    match (frequency, start_date) {
        (Some(frequency), Some(start_date)) if errors.is_empty() => Ok(LoanDraft {
            name,
            total_amount: input.amount,
            installment_amount: input.payment_amount,
            frequency,
            start_date,
        }),
        _ => Err(errors.into()),
    }
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct BillInput {
    pub name: String,
    pub amount: Money,
    pub frequency: String,
    /// `expense` when absent.
    #[cfg_attr(feature = "serde", serde(rename = "type", default))]
    pub kind: Option<String>,
    pub start_date: String,
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BillDraft {
    pub name: String,
    pub amount: Money,
    pub frequency: BillFrequency,
    pub kind: BillKind,
    pub start_date: NaiveDate,
}

impl BillDraft {
    pub fn into_bill(self, id: Id) -> Bill {
        Bill::new(
            id,
            self.name,
            self.amount,
            self.frequency,
            self.kind,
            self.start_date,
        )
    }
}

pub fn validate_bill(input: &BillInput) -> Result<BillDraft> {
    let mut errors = ValidationErrors::new();
    let name = required_name(&input.name, &mut errors);

    if input.amount <= Money::ZERO {
        errors.push("Amount must be greater than 0");
    }
    let frequency = input.frequency.parse::<BillFrequency>().ok();
    if frequency.is_none() {
        errors.push("Invalid frequency");
    }
    let kind = match &input.kind {
        Some(kind) => kind.parse::<BillKind>().ok(),
        None => Some(BillKind::default()),
    };
    if kind.is_none() {
        errors.push("Invalid type");
    }
    let start_date = parse_date(&input.start_date);
    if start_date.is_none() {
        errors.push("Invalid start date format");
    }

    match (frequency, kind, start_date) {
        (Some(frequency), Some(kind), Some(start_date)) if errors.is_empty() => Ok(BillDraft {
            name,
            amount: input.amount,
            frequency,
            kind,
            start_date,
        }),
        _ => Err(errors.into()),
    }
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct SavingsInput {
    pub name: String,
    pub balance: Money,
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SavingsDraft {
    pub name: String,
    pub balance: Money,
}

impl SavingsDraft {
    pub fn into_account(self, id: Id) -> SavingsAccount {
        SavingsAccount::new(id, self.name, self.balance)
    }
}

pub fn validate_savings(input: &SavingsInput) -> Result<SavingsDraft> {
    let mut errors = ValidationErrors::new();
    let name = required_name(&input.name, &mut errors);

    if input.balance < Money::ZERO {
        errors.push("Balance cannot be negative");
    }

    if errors.is_empty() {
        Ok(SavingsDraft {
            name,
            balance: input.balance,
        })
    } else {
        Err(errors.into())
    }
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct PaymentInput {
    pub date: String,
    pub amount: Money,
}

/// A validated payment, not yet attached to a loan or bill.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct PaymentDraft {
    pub date: NaiveDate,
    pub amount: Money,
}

pub fn validate_payment(input: &PaymentInput) -> Result<PaymentDraft> {
    let mut errors = ValidationErrors::new();

    let date = parse_date(&input.date);
    if date.is_none() {
        errors.push("Invalid date format");
    }
    if input.amount <= Money::ZERO {
        errors.push("Amount must be greater than 0");
    }

    match date {
        Some(date) if errors.is_empty() => Ok(PaymentDraft {
            date,
            amount: input.amount,
        }),
        _ => Err(errors.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        parse_date, validate_bill, validate_loan, validate_payment, validate_savings, BillInput,
        LoanInput, PaymentInput, SavingsInput,
    };
    use crate::bill::{BillFrequency, BillKind};
    use crate::error::Error;
    use crate::loan::LoanFrequency;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use test_log::test;

    fn messages(err: Error) -> Vec<String> {
        match err {
            Error::Validation(errors) => errors.messages().to_vec(),
            other => panic!("expected validation error, got {other}"),
        }
    }

    fn loan_input() -> LoanInput {
        LoanInput {
            name: "  car  ".to_string(),
            amount: dec!(1000),
            payment_amount: dec!(200),
            frequency: "monthly".to_string(),
            start_date: "2024-01-31".to_string(),
        }
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-02-29"), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(parse_date("2023-02-29"), None);
        assert_eq!(parse_date("2024-2-9"), None);
        assert_eq!(parse_date("2024/02/09"), None);
        assert_eq!(parse_date("+2024-02-0"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_valid_loan() {
        let draft = validate_loan(&loan_input()).unwrap();
        assert_eq!(draft.name, "car");
        assert_eq!(draft.frequency, LoanFrequency::Monthly);

        let loan = draft.into_loan(42);
        assert_eq!(loan.id, 42);
        assert_eq!(loan.installment_amount, dec!(200));
        assert_eq!(loan.start_date, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
    }

    #[test]
    fn test_installment_over_total() {
        let mut input = loan_input();
        input.payment_amount = dec!(1000.01);

        assert_eq!(
            messages(validate_loan(&input).unwrap_err()),
            vec!["Payment amount cannot exceed total amount"]
        );
    }

    #[test]
    fn test_loan_reports_every_problem() {
        let input = LoanInput {
            name: " ".to_string(),
            amount: dec!(0),
            payment_amount: dec!(0),
            frequency: "yearly".to_string(),
            start_date: "01/02/2024".to_string(),
        };

        assert_eq!(
            messages(validate_loan(&input).unwrap_err()),
            vec![
                "Name is required",
                "Amount must be greater than 0",
                "Payment amount must be greater than 0",
                "Invalid frequency",
                "Invalid start date format",
            ]
        );
    }

    #[test]
    fn test_bill_kind_defaults_to_expense() {
        let mut input = BillInput {
            name: "rent".to_string(),
            amount: dec!(800),
            frequency: "biweekly".to_string(),
            kind: None,
            start_date: "2024-03-01".to_string(),
        };
        let draft = validate_bill(&input).unwrap();
        assert_eq!(draft.kind, BillKind::Expense);
        assert_eq!(draft.frequency, BillFrequency::Biweekly);

        input.kind = Some("income".to_string());
        assert_eq!(validate_bill(&input).unwrap().kind, BillKind::Income);

        input.kind = Some("gift".to_string());
        input.frequency = "hourly".to_string();
        assert_eq!(
            messages(validate_bill(&input).unwrap_err()),
            vec!["Invalid frequency", "Invalid type"]
        );
    }

    #[test]
    fn test_savings() {
        let ok = validate_savings(&SavingsInput {
            name: "rainy day".to_string(),
            balance: dec!(0),
        })
        .unwrap();
        assert_eq!(ok.into_account(3).balance, dec!(0));

        let err = validate_savings(&SavingsInput {
            name: String::new(),
            balance: dec!(-1),
        })
        .unwrap_err();
        assert_eq!(
            messages(err),
            vec!["Name is required", "Balance cannot be negative"]
        );
    }

    #[test]
    fn test_payment() {
        let draft = validate_payment(&PaymentInput {
            date: "2024-05-01".to_string(),
            amount: dec!(200),
        })
        .unwrap();
        assert_eq!(draft.date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());

        let err = validate_payment(&PaymentInput {
            date: "May 1".to_string(),
            amount: dec!(-5),
        })
        .unwrap_err();
        assert_eq!(
            messages(err),
            vec!["Invalid date format", "Amount must be greater than 0"]
        );
    }
}
