use chrono::NaiveDate;
use log::info;
use paycal::bill::{self, BillKind};
use paycal::calendar::{default_horizon, month_range};
use paycal::loan::{self, LoanFrequency, LoanPayment};
use paycal::savings::total_savings;
use paycal::store::{MemoryStore, Store};
use paycal::summary::summarize_range;
use paycal::validate::{
    validate_bill, validate_loan, validate_payment, validate_savings, BillInput, LoanInput,
    PaymentInput, SavingsInput,
};
use rust_decimal_macros::dec;
use simple_logger::SimpleLogger;
use std::error::Error;

const DEMO_USER: u64 = 1;

fn main() -> Result<(), Box<dyn Error>> {
    SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .env()
        .init()?;

    let mut store = MemoryStore::new();

    let car = store.create_loan(
        DEMO_USER,
        validate_loan(&LoanInput {
            name: "Car".to_string(),
            amount: dec!(1000),
            payment_amount: dec!(200),
            frequency: LoanFrequency::Monthly.to_string(),
            start_date: "2024-01-31".to_string(),
        })?,
    );
    let internet = store.create_bill(
        DEMO_USER,
        validate_bill(&BillInput {
            name: "Internet".to_string(),
            amount: dec!(49.99),
            frequency: "monthly".to_string(),
            kind: None,
            start_date: "2024-01-15".to_string(),
        })?,
    );
    store.create_bill(
        DEMO_USER,
        validate_bill(&BillInput {
            name: "Salary".to_string(),
            amount: dec!(1500),
            frequency: "biweekly".to_string(),
            kind: Some(BillKind::Income.to_string()),
            start_date: "2024-01-05".to_string(),
        })?,
    );
    store.create_savings(
        DEMO_USER,
        validate_savings(&SavingsInput {
            name: "Emergency fund".to_string(),
            balance: dec!(2500),
        })?,
    );

    store.upsert_loan_payment(
        DEMO_USER,
        car.id,
        validate_payment(&PaymentInput {
            date: "2024-01-31".to_string(),
            amount: dec!(350),
        })?,
    )?;

    println!("{} ({}):", car.name, car.frequency);
    let schedule = store.loan_schedule(DEMO_USER, car.id)?;
    loan::show_schedule(&schedule);
    let payments: Vec<LoanPayment> = store.loan_payments(DEMO_USER);
    info!(
        "{} paid ${:.2} so far, paid off on {:?}",
        car.name,
        loan::total_paid(car.id, &payments),
        loan::payoff_date(&car, &payments)
    );

    let today = NaiveDate::from_ymd_opt(2024, 3, 1).ok_or("bad demo date")?;
    println!("{}:", internet.name);
    let bills = store.bill_schedule(DEMO_USER, internet.id, default_horizon(&today))?;
    bill::show_schedule(&bills[..3.min(bills.len())]);

    let march = month_range(2024, 3).ok_or("bad demo month")?;
    let summary = summarize_range(&store.calendar(DEMO_USER, march.end), march);
    for entry in &summary.entries {
        println!(
            "{} {:?} {} ${:.2}",
            entry.date, entry.item.kind, entry.item.name, entry.item.scheduled_amount
        );
    }
    println!(
        "March: loans ${:.2}, bills ${:.2}, income ${:.2}, net ${:.2}",
        summary.totals.loan_total,
        summary.totals.bill_total,
        summary.totals.income_total,
        summary.totals.net()
    );
    println!("Savings: ${:.2}", total_savings(&store.savings(DEMO_USER)));

    Ok(())
}

// compile-time check that the public types are Send + Sync + Unpin
#[cfg(test)]
fn is_normal<T: Sized + Send + Sync + Unpin>() {}

#[test]
fn normal_types() {
    is_normal::<paycal::loan::ScheduleEntry>();
    is_normal::<MemoryStore>();
}
