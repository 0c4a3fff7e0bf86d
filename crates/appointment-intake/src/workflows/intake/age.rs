use chrono::{Datelike, Local, NaiveDate};

/// Completed years between `birth_date` and `reference`.
///
/// The calendar-year difference is reduced by one when the reference month/day
/// falls before the birthday. Birth dates after `reference` are not rejected and
/// produce a zero or negative age.
pub fn age_on(birth_date: NaiveDate, reference: NaiveDate) -> i32 {
    let mut age = reference.year() - birth_date.year();
    if (reference.month(), reference.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    age
}

/// Age as of the current local date.
pub fn age_today(birth_date: NaiveDate) -> i32 {
    age_on(birth_date, Local::now().date_naive())
}
