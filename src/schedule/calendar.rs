use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// ISO-8601 week: (ISO year, week number)
pub type WeekKey = (i32, u32);

/// Calendar month: (year, month)
pub type MonthKey = (i32, u32);

pub fn week_key(date: NaiveDate) -> WeekKey {
    let week = date.iso_week();
    (week.year(), week.week())
}

pub fn month_key(date: NaiveDate) -> MonthKey {
    (date.year(), date.month())
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Saturday and Sunday of the weekend containing `date`, or `None` on weekdays
pub fn weekend_of(date: NaiveDate) -> Option<[NaiveDate; 2]> {
    match date.weekday() {
        Weekday::Sat => Some([date, date + Duration::days(1)]),
        Weekday::Sun => Some([date - Duration::days(1), date]),
        _ => None,
    }
}
