use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Width of the statistics window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Granularity {
    Week,
    Month,
    Year,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Granularity::Week => "week",
            Granularity::Month => "month",
            Granularity::Year => "year",
        })
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "week" => Ok(Granularity::Week),
            "month" => Ok(Granularity::Month),
            "year" => Ok(Granularity::Year),
            other => Err(format!("unknown range '{}', expected week, month or year", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

/// Inclusive local wall-clock range, from 00:00:00.000 on the first day to
/// 23:59:59.999 on the last
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN)
}

impl DateRange {
    pub fn from_days(first: NaiveDate, last: NaiveDate) -> Self {
        Self {
            start: first.and_time(NaiveTime::MIN),
            end: last.and_time(end_of_day()),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn last_day(&self) -> NaiveDate {
        self.end.date()
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        at >= self.start && at <= self.end
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.first_day() && date <= self.last_day()
    }

    /// Every calendar day in the range, in order
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.first_day()
            .iter_days()
            .take_while(move |day| *day <= self.last_day())
    }
}

fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    // day 0 of the following month
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    first_of_next
        .and_then(|d| d.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

/// The WEEK, MONTH or YEAR containing `reference`. Weeks start on Monday; a
/// Sunday belongs to the week that ends on it.
pub fn resolve_range(reference: NaiveDate, granularity: Granularity) -> DateRange {
    match granularity {
        Granularity::Week => {
            let offset = Days::new(reference.weekday().num_days_from_monday() as u64);
            // clamped at the edges of the representable calendar
            let monday = reference.checked_sub_days(offset).unwrap_or(NaiveDate::MIN);
            let sunday = monday.checked_add_days(Days::new(6)).unwrap_or(NaiveDate::MAX);
            DateRange::from_days(monday, sunday)
        }
        Granularity::Month => {
            let first = reference.with_day(1).unwrap_or(reference);
            DateRange::from_days(first, last_day_of_month(reference.year(), reference.month()))
        }
        Granularity::Year => {
            let year = reference.year();
            let first = NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(reference);
            let last = NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(reference);
            DateRange::from_days(first, last)
        }
    }
}

/// Shift `reference` by one unit of `granularity` without snapping to a
/// period boundary. Month and year steps keep the day of month, rolling over
/// the way calendar arithmetic does when the day does not exist (Jan 31 + 1
/// month lands on Mar 2 or 3). A step past the representable calendar
/// leaves `reference` where it is.
pub fn navigate(reference: NaiveDate, granularity: Granularity, direction: Direction) -> NaiveDate {
    match granularity {
        Granularity::Week => match direction {
            Direction::Next => reference.checked_add_days(Days::new(7)),
            Direction::Prev => reference.checked_sub_days(Days::new(7)),
        }
        .unwrap_or(reference),
        Granularity::Month => shift_months(reference, direction, 1),
        Granularity::Year => shift_months(reference, direction, 12),
    }
}

fn shift_months(reference: NaiveDate, direction: Direction, months: u32) -> NaiveDate {
    let first = reference.with_day(1).unwrap_or(reference);
    let target = match direction {
        Direction::Next => first.checked_add_months(Months::new(months)),
        Direction::Prev => first.checked_sub_months(Months::new(months)),
    };
    target
        .and_then(|target| target.checked_add_days(Days::new(reference.day0() as u64)))
        .unwrap_or(reference)
}

/// The statistics view's position: a granularity and a reference date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeCursor {
    pub granularity: Granularity,
    pub reference: NaiveDate,
}

impl RangeCursor {
    pub fn new(granularity: Granularity, reference: NaiveDate) -> Self {
        Self {
            granularity,
            reference,
        }
    }

    pub fn range(&self) -> DateRange {
        resolve_range(self.reference, self.granularity)
    }

    pub fn step(&mut self, direction: Direction) {
        self.reference = navigate(self.reference, self.granularity, direction);
    }

    /// Change granularity; the reference date resets to `today` rather than
    /// staying on the previously viewed period
    pub fn switch(&mut self, granularity: Granularity, today: NaiveDate) {
        self.granularity = granularity;
        self.reference = today;
    }

    /// Header text for the current period, e.g. `Mar 4 - Mar 10`, `March 2024`, `2024`
    pub fn title(&self) -> String {
        let range = self.range();
        match self.granularity {
            Granularity::Week => format!(
                "{} - {}",
                range.first_day().format("%b %-d"),
                range.last_day().format("%b %-d")
            ),
            Granularity::Month => range.first_day().format("%B %Y").to_string(),
            Granularity::Year => range.first_day().year().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_runs_monday_to_sunday() {
        let mut day = date(2023, 12, 20);
        for _ in 0..40 {
            let range = resolve_range(day, Granularity::Week);
            assert_eq!(range.first_day().weekday(), Weekday::Mon);
            assert_eq!(range.last_day().weekday(), Weekday::Sun);
            assert_eq!(range.last_day() - range.first_day(), Duration::days(6));
            assert!(range.contains_date(day));
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn sunday_belongs_to_the_week_ending_on_it() {
        let range = resolve_range(date(2024, 3, 10), Granularity::Week);
        assert_eq!(range.first_day(), date(2024, 3, 4));
        assert_eq!(range.last_day(), date(2024, 3, 10));
    }

    #[test]
    fn range_bounds_cover_whole_days() {
        let range = resolve_range(date(2024, 3, 6), Granularity::Week);
        assert_eq!(range.start.time(), NaiveTime::MIN);
        assert_eq!(range.end.time(), NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap());
    }

    #[test]
    fn month_ends_on_its_last_day() {
        let cases = [
            (date(2023, 2, 14), 28),
            (date(2024, 2, 14), 29),
            (date(2024, 4, 30), 30),
            (date(2024, 12, 1), 31),
        ];
        for (reference, last) in cases {
            let range = resolve_range(reference, Granularity::Month);
            assert_eq!(range.first_day(), reference.with_day(1).unwrap());
            assert_eq!(range.last_day(), reference.with_day(last).unwrap());
            assert_eq!(range.days().count(), last as usize);
        }
    }

    #[test]
    fn year_spans_jan_to_dec() {
        let range = resolve_range(date(2024, 7, 4), Granularity::Year);
        assert_eq!(range.first_day(), date(2024, 1, 1));
        assert_eq!(range.last_day(), date(2024, 12, 31));
    }

    #[test]
    fn navigation_moves_one_unit() {
        assert_eq!(
            navigate(date(2024, 3, 6), Granularity::Week, Direction::Prev),
            date(2024, 2, 28)
        );
        assert_eq!(
            navigate(date(2024, 3, 15), Granularity::Month, Direction::Next),
            date(2024, 4, 15)
        );
        assert_eq!(
            navigate(date(2024, 1, 15), Granularity::Month, Direction::Prev),
            date(2023, 12, 15)
        );
        assert_eq!(
            navigate(date(2024, 2, 29), Granularity::Year, Direction::Next),
            date(2025, 3, 1)
        );
    }

    #[test]
    fn month_navigation_rolls_over_short_months() {
        assert_eq!(
            navigate(date(2024, 1, 31), Granularity::Month, Direction::Next),
            date(2024, 3, 2)
        );
        assert_eq!(
            navigate(date(2023, 1, 31), Granularity::Month, Direction::Next),
            date(2023, 3, 3)
        );
    }

    #[test]
    fn switching_granularity_resets_to_today() {
        let today = date(2024, 6, 1);
        let mut cursor = RangeCursor::new(Granularity::Week, today);
        cursor.step(Direction::Prev);
        cursor.step(Direction::Prev);
        cursor.switch(Granularity::Month, today);
        assert_eq!(cursor.reference, today);
        assert_eq!(cursor.title(), "June 2024");
    }

    #[test]
    fn calendar_edges_clamp_instead_of_overflowing() {
        let last_week = resolve_range(NaiveDate::MAX, Granularity::Week);
        assert_eq!(last_week.last_day(), NaiveDate::MAX);
        assert!(last_week.contains_date(NaiveDate::MAX));
        assert_eq!(last_week.first_day().weekday(), Weekday::Mon);

        let first_week = resolve_range(NaiveDate::MIN, Granularity::Week);
        assert!(first_week.contains_date(NaiveDate::MIN));

        for granularity in [Granularity::Week, Granularity::Month, Granularity::Year] {
            assert_eq!(navigate(NaiveDate::MAX, granularity, Direction::Next), NaiveDate::MAX);
            assert_eq!(navigate(NaiveDate::MIN, granularity, Direction::Prev), NaiveDate::MIN);
        }
        assert_eq!(
            navigate(NaiveDate::MAX, Granularity::Week, Direction::Prev),
            NaiveDate::MAX - Duration::days(7)
        );
    }

    #[test]
    fn parses_granularity_names() {
        assert_eq!("WEEK".parse::<Granularity>().unwrap(), Granularity::Week);
        assert!("decade".parse::<Granularity>().is_err());
    }
}
