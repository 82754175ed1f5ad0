use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use thiserror::Error;

use crate::util::patterns;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WeekError {
    #[error("Invalid week format '{0}'. Expected YYYYWW (e.g., 202605)")]
    Format(String),
    #[error("Week {week} does not exist in {year} (that year has {max} ISO weeks)")]
    OutOfRange { year: i32, week: u32, max: u32 },
    #[error("Invalid date '{0}'. Expected YYYY-MM-DD")]
    Date(String),
    #[error("Start week {from} is after end week {to}")]
    Reversed { from: IsoWeek, to: IsoWeek },
    #[error("Cutover {cutover} is outside week {week} ({range})")]
    CutoverOutsideWeek {
        cutover: NaiveDate,
        week: IsoWeek,
        range: DateRange,
    },
    #[error("--weeks cannot be combined with --from/--to")]
    AmbiguousSelection,
    #[error("--to requires --from")]
    MissingFrom,
    #[error("--weeks must be at least 1")]
    EmptyWindow,
    #[error("Cannot scan {weeks} weeks at once (at most {max})")]
    WindowTooLarge { weeks: u64, max: u32 },
    #[error("Week before or after {0} is outside the supported calendar")]
    Overflow(IsoWeek),
}

/// An ISO-8601 week, written `YYYYWW`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IsoWeek {
    monday: NaiveDate,
}

/// Number of ISO weeks in `year`. December 28th always falls in the last one.
pub fn weeks_in_year(year: i32) -> u32 {
    NaiveDate::from_ymd_opt(year, 12, 28)
        .map(|d| d.iso_week().week())
        .unwrap_or(52)
}

impl IsoWeek {
    pub fn new(year: i32, week: u32) -> Result<Self, WeekError> {
        let max = weeks_in_year(year);
        if week == 0 || week > max {
            return Err(WeekError::OutOfRange { year, week, max });
        }
        NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
            .map(|monday| Self { monday })
            .ok_or(WeekError::OutOfRange { year, week, max })
    }

    /// The week containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        let offset = i64::from(date.weekday().num_days_from_monday());
        Self {
            monday: date - Duration::days(offset),
        }
    }

    pub fn current() -> Self {
        Self::of(chrono::Local::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.monday.iso_week().year()
    }

    pub fn week(&self) -> u32 {
        self.monday.iso_week().week()
    }

    pub fn monday(&self) -> NaiveDate {
        self.monday
    }

    /// Monday through Sunday.
    pub fn range(&self) -> DateRange {
        DateRange {
            start: self.monday,
            end: self.monday + Duration::days(6),
        }
    }

    pub fn next(&self) -> Result<Self, WeekError> {
        self.monday
            .checked_add_signed(Duration::days(7))
            .map(|monday| Self { monday })
            .ok_or(WeekError::Overflow(*self))
    }

    pub fn previous(&self) -> Result<Self, WeekError> {
        self.monday
            .checked_sub_signed(Duration::days(7))
            .map(|monday| Self { monday })
            .ok_or(WeekError::Overflow(*self))
    }

    /// `count` consecutive weeks ending with (and including) `self`, oldest first.
    pub fn trailing(&self, count: u32) -> Result<Vec<IsoWeek>, WeekError> {
        let mut weeks = Vec::new();
        let mut week = *self;
        for i in 0..count {
            weeks.push(week);
            if i + 1 < count {
                week = week.previous()?;
            }
        }
        weeks.reverse();
        Ok(weeks)
    }

    /// Every week from `from` to `to`, both inclusive.
    pub fn span(from: IsoWeek, to: IsoWeek) -> Result<Vec<IsoWeek>, WeekError> {
        if from > to {
            return Err(WeekError::Reversed { from, to });
        }
        let mut weeks = vec![from];
        let mut week = from;
        while week < to {
            week = week.next()?;
            weeks.push(week);
        }
        Ok(weeks)
    }
}

impl fmt::Display for IsoWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}", self.year(), self.week())
    }
}

impl FromStr for IsoWeek {
    type Err = WeekError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(WeekError::Format(s.to_string()));
        }
        let year: i32 = s[..4].parse().map_err(|_| WeekError::Format(s.to_string()))?;
        let week: u32 = s[4..].parse().map_err(|_| WeekError::Format(s.to_string()))?;
        IsoWeek::new(year, week)
    }
}

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Narrow the range to start at `cutover`, which must lie inside it.
    pub fn starting_at(&self, cutover: NaiveDate, week: IsoWeek) -> Result<DateRange, WeekError> {
        if !self.contains(cutover) {
            return Err(WeekError::CutoverOutsideWeek {
                cutover,
                week,
                range: *self,
            });
        }
        Ok(DateRange {
            start: cutover,
            end: self.end,
        })
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Strict `YYYY-MM-DD`.
pub fn parse_date(s: &str) -> Result<NaiveDate, WeekError> {
    let s = s.trim();
    let well_formed = s.len() == 10
        && s.bytes()
            .enumerate()
            .all(|(i, b)| if i == 4 || i == 7 { b == b'-' } else { b.is_ascii_digit() });
    if !well_formed {
        return Err(WeekError::Date(s.to_string()));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| WeekError::Date(s.to_string()))
}

/// Which weeks of history to scan: a trailing window or an explicit span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekSelection {
    Trailing(u32),
    Span { from: IsoWeek, to: Option<IsoWeek> },
}

impl WeekSelection {
    pub const DEFAULT_WINDOW: u32 = 8;
    /// Ten years of history.
    pub const MAX_WINDOW: u32 = 520;

    pub fn from_args(
        weeks: Option<u32>,
        from: Option<IsoWeek>,
        to: Option<IsoWeek>,
    ) -> Result<Self, WeekError> {
        match (weeks, from, to) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => Err(WeekError::AmbiguousSelection),
            (Some(0), None, None) => Err(WeekError::EmptyWindow),
            (Some(n), None, None) if n > Self::MAX_WINDOW => Err(WeekError::WindowTooLarge {
                weeks: u64::from(n),
                max: Self::MAX_WINDOW,
            }),
            (Some(n), None, None) => Ok(WeekSelection::Trailing(n)),
            (None, Some(from), to) => Ok(WeekSelection::Span { from, to }),
            (None, None, Some(_)) => Err(WeekError::MissingFrom),
            (None, None, None) => Ok(WeekSelection::Trailing(Self::DEFAULT_WINDOW)),
        }
    }

    /// Resolve to concrete weeks. An open span ends at `current`.
    pub fn weeks(&self, current: IsoWeek) -> Result<Vec<IsoWeek>, WeekError> {
        match *self {
            WeekSelection::Trailing(n) => current.trailing(n),
            WeekSelection::Span { from, to } => {
                let to = to.unwrap_or(current);
                let count = (to.monday() - from.monday()).num_weeks() + 1;
                if count > i64::from(Self::MAX_WINDOW) {
                    return Err(WeekError::WindowTooLarge {
                        weeks: count.unsigned_abs(),
                        max: Self::MAX_WINDOW,
                    });
                }
                IsoWeek::span(from, to)
            }
        }
    }
}

/// Date inside `week` named by a grid day label such as `Mo 3/02`.
pub fn label_date(label: &str, week: IsoWeek) -> Option<NaiveDate> {
    let caps = patterns::DAY_DATE.captures(label.trim())?;
    let offset = patterns::weekday_index(caps.get(1)?.as_str())?;
    Some(week.monday() + Duration::days(i64::from(offset)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn week(s: &str) -> IsoWeek {
        s.parse().unwrap()
    }

    #[test]
    fn week_range_is_monday_to_sunday() {
        let range = week("202605").range();
        assert_eq!(range.start, date("2026-01-26"));
        assert_eq!(range.end, date("2026-02-01"));

        let range = week("202606").range();
        assert_eq!(range.start, date("2026-02-02"));
        assert_eq!(range.end, date("2026-02-08"));
    }

    #[test]
    fn week_one_can_start_in_previous_year() {
        // 2025-01-01 is a Wednesday
        assert_eq!(week("202501").monday(), date("2024-12-30"));
        assert_eq!(week("202501").to_string(), "202501");
    }

    #[test]
    fn rejects_bad_formats() {
        assert_eq!("2026-05".parse::<IsoWeek>(), Err(WeekError::Format("2026-05".into())));
        assert!("20265".parse::<IsoWeek>().is_err());
        assert!("abcdef".parse::<IsoWeek>().is_err());
    }

    #[test]
    fn rejects_weeks_beyond_the_year() {
        assert_eq!(weeks_in_year(2026), 53);
        assert_eq!(weeks_in_year(2025), 52);
        assert!("202653".parse::<IsoWeek>().is_ok());
        assert_eq!(
            "202553".parse::<IsoWeek>(),
            Err(WeekError::OutOfRange { year: 2025, week: 53, max: 52 })
        );
        assert!("202600".parse::<IsoWeek>().is_err());
    }

    #[test]
    fn of_maps_any_day_to_its_week() {
        assert_eq!(IsoWeek::of(date("2026-02-04")), week("202606"));
        assert_eq!(IsoWeek::of(date("2026-02-08")), week("202606"));
        assert_eq!(IsoWeek::of(date("2027-01-01")), week("202653"));
    }

    #[test]
    fn span_crosses_year_boundary() {
        let weeks = IsoWeek::span(week("202552"), week("202602")).unwrap();
        let names: Vec<String> = weeks.iter().map(|w| w.to_string()).collect();
        assert_eq!(names, vec!["202552", "202601", "202602"]);
    }

    #[test]
    fn span_includes_week_53() {
        let weeks = IsoWeek::span(week("202652"), week("202701")).unwrap();
        let names: Vec<String> = weeks.iter().map(|w| w.to_string()).collect();
        assert_eq!(names, vec!["202652", "202653", "202701"]);
    }

    #[test]
    fn reversed_span_is_an_error() {
        assert!(matches!(
            IsoWeek::span(week("202610"), week("202601")),
            Err(WeekError::Reversed { .. })
        ));
    }

    #[test]
    fn trailing_window_ends_at_current_week() {
        let weeks = week("202602").trailing(3).unwrap();
        let names: Vec<String> = weeks.iter().map(|w| w.to_string()).collect();
        assert_eq!(names, vec!["202552", "202601", "202602"]);
    }

    #[test]
    fn stepping_past_the_calendar_is_an_error() {
        let mut first = IsoWeek::of(NaiveDate::MIN + Duration::days(14));
        while let Ok(prev) = first.previous() {
            first = prev;
        }
        assert_eq!(first.previous(), Err(WeekError::Overflow(first)));
        assert_eq!(first.trailing(2), Err(WeekError::Overflow(first)));
        assert_eq!(first.trailing(1).unwrap(), vec![first]);

        let mut last = IsoWeek::of(NaiveDate::MAX - Duration::days(14));
        while let Ok(next) = last.next() {
            last = next;
        }
        assert_eq!(last.next(), Err(WeekError::Overflow(last)));
    }

    #[test]
    fn cutover_narrows_range() {
        let w = week("202605");
        let range = w.range().starting_at(date("2026-01-29"), w).unwrap();
        assert_eq!(range.start, date("2026-01-29"));
        assert_eq!(range.end, date("2026-02-01"));
        assert!(w.range().starting_at(date("2026-02-02"), w).is_err());
    }

    #[test]
    fn strict_date_parsing() {
        assert_eq!(parse_date("2026-01-29").unwrap(), date("2026-01-29"));
        assert!(parse_date("2026-1-29").is_err());
        assert!(parse_date("29.01.2026").is_err());
        assert!(parse_date("2026-02-30").is_err());
    }

    #[test]
    fn selection_defaults_to_eight_weeks() {
        let sel = WeekSelection::from_args(None, None, None).unwrap();
        assert_eq!(sel, WeekSelection::Trailing(8));
        assert_eq!(sel.weeks(week("202610")).unwrap().len(), 8);
    }

    #[test]
    fn selection_rejects_ambiguous_combinations() {
        let from = Some(week("202601"));
        let to = Some(week("202610"));
        assert_eq!(
            WeekSelection::from_args(Some(4), from, None),
            Err(WeekError::AmbiguousSelection)
        );
        assert_eq!(
            WeekSelection::from_args(Some(4), None, to),
            Err(WeekError::AmbiguousSelection)
        );
        assert_eq!(WeekSelection::from_args(None, None, to), Err(WeekError::MissingFrom));
        assert_eq!(WeekSelection::from_args(Some(0), None, None), Err(WeekError::EmptyWindow));
    }

    #[test]
    fn selection_rejects_oversized_windows() {
        assert_eq!(
            WeekSelection::from_args(Some(20_000_000), None, None),
            Err(WeekError::WindowTooLarge { weeks: 20_000_000, max: 520 })
        );
        let sel = WeekSelection::from_args(Some(520), None, None).unwrap();
        assert_eq!(sel.weeks(week("202610")).unwrap().len(), 520);

        let sel = WeekSelection::from_args(None, Some(week("000101")), None).unwrap();
        assert!(matches!(
            sel.weeks(week("202610")),
            Err(WeekError::WindowTooLarge { max: 520, .. })
        ));
    }

    #[test]
    fn open_span_ends_at_current_week() {
        let sel = WeekSelection::from_args(None, Some(week("202608")), None).unwrap();
        let weeks = sel.weeks(week("202610")).unwrap();
        assert_eq!(weeks.len(), 3);
        assert_eq!(weeks[2], week("202610"));
    }

    #[test]
    fn explicit_span_from_to() {
        let sel = WeekSelection::from_args(None, Some(week("202601")), Some(week("202610"))).unwrap();
        assert_eq!(sel.weeks(week("202630")).unwrap().len(), 10);
    }

    #[test]
    fn day_labels_resolve_by_weekday() {
        let w = week("202606");
        assert_eq!(label_date("Mo 2/02", w), Some(date("2026-02-02")));
        assert_eq!(label_date("Thu 5.02", w), Some(date("2026-02-05")));
        assert_eq!(label_date("Total 40:00", w), None);
    }
}
