/// Pure date/time utility functions (Discord-agnostic)
use chrono::{Datelike, NaiveDate};

/// Calculate age from birth year
pub fn calculate_age(birth_year: i32, current_year: i32) -> i32 {
    current_year - birth_year
}

/// Check if a given year is a leap year
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

/// Number of days in a month for the given year, or 0 for an invalid month
pub fn days_in_month(month: u32, year: i32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Check if a date matches month and day (ignoring year)
pub fn matches_birthday(month: u32, day: u32, today: NaiveDate) -> bool {
    month == today.month() && day == today.day()
}

/// Key identifying a calendar day, e.g. "2024-3-7" (no zero padding)
pub fn date_key(date: NaiveDate) -> String {
    format!("{}-{}-{}", date.year(), date.month(), date.day())
}

/// Days from `today` until month/day next falls on the calendar (0 if it is
/// today). Feb 29 only falls in leap years, matching what the scan celebrates.
pub fn days_until_next(month: u32, day: u32, today: NaiveDate) -> Option<i64> {
    // Leap years are never more than 8 years apart
    (today.year()..=today.year() + 8)
        .filter_map(|year| NaiveDate::from_ymd_opt(year, month, day))
        .find(|date| *date >= today)
        .map(|next| (next - today).num_days())
}

/// Format a date as "Day MonthName" (e.g., "15 March")
pub fn format_date_display(month: u32, day: u32) -> String {
    format!("{} {}", day, get_month_name(month))
}

/// Get month name from month number (1-12)
pub fn get_month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Unknown",
    }
}
