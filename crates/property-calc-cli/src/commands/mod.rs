pub mod batch;
pub mod flip;
pub mod holding;
pub mod irr;
pub mod mortgage;
pub mod multi_unit;
pub mod tax;

use chrono::{Local, NaiveDate};

/// Date used for dated configuration lookups.
fn as_of(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Local::now().date_naive())
}
