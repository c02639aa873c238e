//! Date-window resolution for ticket filters and analytics.
//!
//! A filter token (`day`, `week`, `month`, `set`, `none`) plus an optional
//! explicit date resolves to an inclusive `[start, end]` range of calendar
//! days. Days are UTC calendar days.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Months, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{TechAidError, TechAidResult};

/// Named date-window strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterToken {
    Day,
    Week,
    Month,
    Set,
    None,
}

impl FromStr for FilterToken {
    type Err = TechAidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(FilterToken::Day),
            "week" => Ok(FilterToken::Week),
            "month" => Ok(FilterToken::Month),
            "set" => Ok(FilterToken::Set),
            "none" => Ok(FilterToken::None),
            other => Err(TechAidError::InvalidFilter(format!(
                "unknown filter token: {other:?}"
            ))),
        }
    }
}

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Sentinel window meaning "no date filtering".
    pub const UNBOUNDED: DateWindow = DateWindow {
        start: NaiveDate::MIN,
        end: NaiveDate::MAX,
    };

    pub fn new(start: NaiveDate, end: NaiveDate) -> TechAidResult<Self> {
        if start > end {
            return Err(TechAidError::InvalidFilter(format!(
                "window start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        *self == Self::UNBOUNDED
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Every calendar day in the window, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }

    /// Half-open instant bounds `[start 00:00, end+1 00:00)` in UTC, or
    /// `None` for the unbounded window.
    pub fn instant_bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        if self.is_unbounded() {
            return None;
        }
        let start = self.start.and_hms_opt(0, 0, 0)?.and_utc();
        let end = self.end.succ_opt()?.and_hms_opt(0, 0, 0)?.and_utc();
        Some((start, end))
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unbounded() {
            f.write_str("unbounded")
        } else {
            write!(f, "[{}, {}]", self.start, self.end)
        }
    }
}

fn shift(day: NaiveDate, days: i64) -> TechAidResult<NaiveDate> {
    day.checked_add_signed(TimeDelta::days(days))
        .ok_or_else(|| TechAidError::InvalidFilter(format!("date {day} is out of range")))
}

/// Resolve a filter token to a window relative to `today`.
pub fn resolve_window(
    token: FilterToken,
    date: Option<NaiveDate>,
    today: NaiveDate,
) -> TechAidResult<DateWindow> {
    match token {
        FilterToken::Day => Ok(DateWindow::single(today)),
        FilterToken::Week => week_of(today),
        FilterToken::Month => month_of(today),
        FilterToken::Set => date.map(DateWindow::single).ok_or_else(|| {
            TechAidError::InvalidFilter("the \"set\" filter requires a date".into())
        }),
        FilterToken::None => Ok(DateWindow::UNBOUNDED),
    }
}

/// Monday through Sunday of the week containing `today`.
pub fn week_of(today: NaiveDate) -> TechAidResult<DateWindow> {
    let offset = i64::from(today.weekday().num_days_from_monday());
    let start = shift(today, -offset)?;
    let end = shift(start, 6)?;
    Ok(DateWindow { start, end })
}

/// First through last day of the month containing `today`.
pub fn month_of(today: NaiveDate) -> TechAidResult<DateWindow> {
    let out_of_range = || TechAidError::InvalidFilter(format!("date {today} is out of range"));
    let start = today.with_day(1).ok_or_else(out_of_range)?;
    let end = start
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or_else(out_of_range)?;
    Ok(DateWindow { start, end })
}

/// The four analytics weeks of the month containing `today`.
///
/// Week 1 runs from the 1st to `1st + (6 - weekday)`, counting weekdays from
/// Sunday = 0, which lands on the first Saturday on or after the 1st. Weeks 2
/// and 3 are the following 7-day blocks, and week 4 runs from there to month
/// end. Together the four windows cover the month exactly.
pub fn month_weeks(today: NaiveDate) -> TechAidResult<[DateWindow; 4]> {
    let month = month_of(today)?;
    let first_len = 6 - i64::from(month.start.weekday().num_days_from_sunday());

    let week1 = DateWindow {
        start: month.start,
        end: shift(month.start, first_len)?,
    };
    let week2 = following_week(week1, month.end)?;
    let week3 = following_week(week2, month.end)?;
    let week4 = DateWindow {
        start: shift(week3.end, 1)?,
        end: month.end,
    };
    Ok([week1, week2, week3, week4])
}

fn following_week(previous: DateWindow, month_end: NaiveDate) -> TechAidResult<DateWindow> {
    let start = shift(previous.end, 1)?;
    let end = shift(start, 6)?.min(month_end);
    Ok(DateWindow { start, end })
}

/// Token accepted by the analytics view. Unlike [`FilterToken`], `month`
/// breaks down by week and `week1`..`week4` select a single one of those
/// weeks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsToken {
    None,
    Month,
    MonthWeek(u8),
    Week,
    Day,
    Set,
}

impl FromStr for AnalyticsToken {
    type Err = TechAidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(AnalyticsToken::None),
            "month" => Ok(AnalyticsToken::Month),
            "week1" => Ok(AnalyticsToken::MonthWeek(1)),
            "week2" => Ok(AnalyticsToken::MonthWeek(2)),
            "week3" => Ok(AnalyticsToken::MonthWeek(3)),
            "week4" => Ok(AnalyticsToken::MonthWeek(4)),
            "week" => Ok(AnalyticsToken::Week),
            "day" => Ok(AnalyticsToken::Day),
            "set" => Ok(AnalyticsToken::Set),
            other => Err(TechAidError::InvalidFilter(format!(
                "unknown analytics filter: {other:?}"
            ))),
        }
    }
}

/// How an analytics request is bucketed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsPlan {
    /// One aggregate bucket with no date breakdown.
    All,
    /// Numbered month weeks.
    Weeks(Vec<(u8, DateWindow)>),
    /// One bucket per calendar day of the window.
    Days(DateWindow),
}

impl AnalyticsPlan {
    pub fn resolve(
        token: AnalyticsToken,
        date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> TechAidResult<Self> {
        match token {
            AnalyticsToken::None => Ok(AnalyticsPlan::All),
            AnalyticsToken::Month => {
                let weeks = month_weeks(today)?;
                Ok(AnalyticsPlan::Weeks((1u8..).zip(weeks).collect()))
            }
            AnalyticsToken::MonthWeek(n) => {
                let weeks = month_weeks(today)?;
                let window = usize::from(n)
                    .checked_sub(1)
                    .and_then(|index| weeks.get(index).copied())
                    .ok_or_else(|| TechAidError::InvalidFilter(format!("no week {n} in a month")))?;
                Ok(AnalyticsPlan::Weeks(vec![(n, window)]))
            }
            AnalyticsToken::Week => Ok(AnalyticsPlan::Days(resolve_window(
                FilterToken::Week,
                date,
                today,
            )?)),
            AnalyticsToken::Day => Ok(AnalyticsPlan::Days(resolve_window(
                FilterToken::Day,
                date,
                today,
            )?)),
            AnalyticsToken::Set => Ok(AnalyticsPlan::Days(resolve_window(
                FilterToken::Set,
                date,
                today,
            )?)),
        }
    }

    /// Smallest window covering every bucket.
    pub fn span(&self) -> DateWindow {
        match self {
            AnalyticsPlan::All => DateWindow::UNBOUNDED,
            AnalyticsPlan::Weeks(weeks) => match (weeks.first(), weeks.last()) {
                (Some((_, first)), Some((_, last))) => DateWindow {
                    start: first.start,
                    end: last.end,
                },
                _ => DateWindow::UNBOUNDED,
            },
            AnalyticsPlan::Days(window) => *window,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn window(start: NaiveDate, end: NaiveDate) -> DateWindow {
        DateWindow { start, end }
    }

    // Wednesday
    fn reference() -> NaiveDate {
        date(2025, 3, 5)
    }

    #[test]
    fn resolves_each_token_for_reference_wednesday() {
        let today = reference();
        let resolve = |t: &str, d| resolve_window(t.parse().unwrap(), d, today).unwrap();

        assert_eq!(resolve("day", None), DateWindow::single(today));
        assert_eq!(
            resolve("week", None),
            window(date(2025, 3, 3), date(2025, 3, 9))
        );
        assert_eq!(
            resolve("month", None),
            window(date(2025, 3, 1), date(2025, 3, 31))
        );
        assert_eq!(
            resolve("set", Some(date(2024, 12, 25))),
            DateWindow::single(date(2024, 12, 25))
        );
        assert!(resolve("none", None).is_unbounded());

        for token in ["day", "week", "month", "none"] {
            let w = resolve(token, None);
            assert!(w.start <= w.end, "{token} produced {w}");
        }
    }

    #[test]
    fn tokens_are_case_insensitive() {
        assert_eq!(" WEEK ".parse::<FilterToken>().unwrap(), FilterToken::Week);
        assert_eq!("None".parse::<FilterToken>().unwrap(), FilterToken::None);
    }

    #[test]
    fn set_without_date_is_invalid_filter() {
        let err = resolve_window(FilterToken::Set, None, reference()).unwrap_err();
        assert!(matches!(err, TechAidError::InvalidFilter(_)));
    }

    #[test]
    fn unknown_token_is_invalid_filter() {
        assert!(matches!(
            "year".parse::<FilterToken>(),
            Err(TechAidError::InvalidFilter(_))
        ));
        assert!(matches!(
            "week5".parse::<AnalyticsToken>(),
            Err(TechAidError::InvalidFilter(_))
        ));
    }

    #[test]
    fn sunday_belongs_to_the_preceding_monday() {
        let sunday = date(2025, 3, 9);
        assert_eq!(
            week_of(sunday).unwrap(),
            window(date(2025, 3, 3), date(2025, 3, 9))
        );
        let monday = date(2025, 3, 10);
        assert_eq!(
            week_of(monday).unwrap(),
            window(date(2025, 3, 10), date(2025, 3, 16))
        );
    }

    #[test]
    fn month_handles_leap_february() {
        assert_eq!(
            month_of(date(2024, 2, 10)).unwrap(),
            window(date(2024, 2, 1), date(2024, 2, 29))
        );
        assert_eq!(
            month_of(date(2025, 12, 31)).unwrap(),
            window(date(2025, 12, 1), date(2025, 12, 31))
        );
    }

    #[test]
    fn march_2025_weeks() {
        let weeks = month_weeks(reference()).unwrap();
        assert_eq!(
            weeks,
            [
                DateWindow::single(date(2025, 3, 1)),
                window(date(2025, 3, 2), date(2025, 3, 8)),
                window(date(2025, 3, 9), date(2025, 3, 15)),
                window(date(2025, 3, 16), date(2025, 3, 31)),
            ]
        );
    }

    #[test]
    fn month_starting_on_sunday_has_full_first_week() {
        let weeks = month_weeks(date(2026, 2, 14)).unwrap();
        assert_eq!(
            weeks,
            [
                window(date(2026, 2, 1), date(2026, 2, 7)),
                window(date(2026, 2, 8), date(2026, 2, 14)),
                window(date(2026, 2, 15), date(2026, 2, 21)),
                window(date(2026, 2, 22), date(2026, 2, 28)),
            ]
        );
    }

    #[test]
    fn first_week_ends_on_saturday() {
        for month in 1..=12 {
            let weeks = month_weeks(date(2025, month, 10)).unwrap();
            assert_eq!(weeks[0].end.weekday(), chrono::Weekday::Sat);
            assert_eq!(weeks[1].start.weekday(), chrono::Weekday::Sun);
        }
    }

    #[test]
    fn month_weeks_cover_every_month_exactly() {
        for month in 1..=12 {
            let today = date(2025, month, 15);
            let span = month_of(today).unwrap();
            let weeks = month_weeks(today).unwrap();

            assert_eq!(weeks[0].start, span.start);
            assert_eq!(weeks[3].end, span.end);
            for pair in weeks.windows(2) {
                assert_eq!(pair[0].end.succ_opt().unwrap(), pair[1].start);
                assert!(pair[0].start <= pair[0].end);
            }
            let covered: usize = weeks.iter().map(|w| w.days().count()).sum();
            assert_eq!(covered, span.days().count());
        }
    }

    #[test]
    fn analytics_month_plans_four_numbered_weeks() {
        let plan = AnalyticsPlan::resolve(AnalyticsToken::Month, None, reference()).unwrap();
        let AnalyticsPlan::Weeks(weeks) = &plan else {
            panic!("expected weekly plan, got {plan:?}");
        };
        let numbers: Vec<u8> = weeks.iter().map(|(n, _)| *n).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert_eq!(plan.span(), month_of(reference()).unwrap());
    }

    #[test]
    fn analytics_single_week_matches_month_breakdown() {
        let plan = AnalyticsPlan::resolve("WEEK3".parse().unwrap(), None, reference()).unwrap();
        assert_eq!(
            plan,
            AnalyticsPlan::Weeks(vec![(3, window(date(2025, 3, 9), date(2025, 3, 15)))])
        );
    }

    #[test]
    fn analytics_week_is_daily() {
        let plan = AnalyticsPlan::resolve(AnalyticsToken::Week, None, reference()).unwrap();
        assert_eq!(
            plan,
            AnalyticsPlan::Days(window(date(2025, 3, 3), date(2025, 3, 9)))
        );
        assert_eq!(plan.span().days().count(), 7);
        assert!(AnalyticsPlan::resolve(AnalyticsToken::Set, None, reference()).is_err());
    }

    #[test]
    fn instant_bounds_are_half_open() {
        let (start, end) = DateWindow::single(reference()).instant_bounds().unwrap();
        assert_eq!(start.to_rfc3339(), "2025-03-05T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2025-03-06T00:00:00+00:00");
        assert!(DateWindow::UNBOUNDED.instant_bounds().is_none());
    }
}
