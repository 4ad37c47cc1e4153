//! Payment calendar engine: loan installment schedules, recurring bill and
//! income schedules, and the calendar totals folded from both.

pub mod bill;
pub mod calendar;
pub mod error;
pub mod loan;
pub mod money;
pub mod savings;
pub mod store;
pub mod summary;
pub mod validate;

pub use error::{Error, Result};
pub use money::Money;

/// Upper bound on the number of entries a single generator call produces.
pub const MAX_ITERATIONS: usize = 10_000;
