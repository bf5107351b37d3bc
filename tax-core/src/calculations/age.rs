use chrono::{Datelike, NaiveDate};

/// Full years elapsed between `date_of_birth` and `today`.
///
/// One year is subtracted when today's (month, day) comes before the
/// birthday's (month, day). A birthdate in the future yields 0.
///
/// ```
/// use chrono::NaiveDate;
/// use tax_core::calculations::age_on;
///
/// let born = NaiveDate::from_ymd_opt(2000, 6, 15).unwrap();
/// assert_eq!(age_on(born, NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()), 23);
/// assert_eq!(age_on(born, NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()), 24);
/// ```
pub fn age_on(
    date_of_birth: NaiveDate,
    today: NaiveDate,
) -> u32 {
    let mut years = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        years -= 1;
    }
    u32::try_from(years).unwrap_or(0)
}
