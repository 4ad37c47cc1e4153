//! Errors raised around the schedule engine: input validation and the
//! persistence collaborator. The generators themselves never fail.

use std::fmt;

use chrono::NaiveDate;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Record ids as assigned by the store.
pub type Id = u64;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("invalid input: {0}")]
    Validation(ValidationErrors),

    #[error("loan {0} not found")]
    LoanNotFound(Id),

    #[error("bill {0} not found")]
    BillNotFound(Id),

    #[error("savings account {0} not found")]
    SavingsNotFound(Id),

    #[error("no payment recorded for {parent} on {date}")]
    PaymentNotFound { parent: Id, date: NaiveDate },
}

impl From<ValidationErrors> for Error {
    fn from(e: ValidationErrors) -> Self {
        Error::Validation(e)
    }
}

/// Every problem found in one input, reported together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, msg: impl Into<String>) {
        self.0.push(msg.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("; "))
    }
}

/// An enum name that did not match any variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {what} `{value}`")]
pub struct ParseEnumError {
    pub what: &'static str,
    pub value: String,
}
