//! Time-bucketed ticket counts.
//!
//! Bucketing is pure: the ticket service fetches `(created_at, status)`
//! stamps covering the plan's span and this module tallies them.

use chrono::NaiveDate;
use serde::Serialize;
use techaid_core::models::stats::StatusCounts;
use techaid_core::models::ticket::TicketStamp;
use techaid_core::window::{AnalyticsPlan, DateWindow};

/// Counts for one calendar day, or for everything when `day` is `"All"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    /// Weekday name (e.g. `Wednesday`).
    pub day: String,
    /// ISO date (`2025-03-05`), or `N/A` for the aggregate bucket.
    pub date: String,
    #[serde(flatten)]
    pub counts: StatusCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyCount {
    pub week_number: u8,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(flatten)]
    pub counts: StatusCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "granularity", content = "buckets", rename_all = "snake_case")]
pub enum AnalyticsReport {
    All(DailyCount),
    Daily(Vec<DailyCount>),
    Weekly(Vec<WeeklyCount>),
}

impl AnalyticsReport {
    /// Sum of the bucket totals.
    pub fn total(&self) -> u64 {
        match self {
            AnalyticsReport::All(bucket) => bucket.counts.total,
            AnalyticsReport::Daily(days) => days.iter().map(|d| d.counts.total).sum(),
            AnalyticsReport::Weekly(weeks) => weeks.iter().map(|w| w.counts.total).sum(),
        }
    }
}

fn tally(stamps: &[TicketStamp], window: &DateWindow) -> StatusCounts {
    stamps
        .iter()
        .filter(|s| window.contains(s.created_at.date_naive()))
        .map(|s| s.status)
        .collect()
}

pub fn daily_buckets(window: &DateWindow, stamps: &[TicketStamp]) -> Vec<DailyCount> {
    window
        .days()
        .map(|day| DailyCount {
            day: day.format("%A").to_string(),
            date: day.format("%Y-%m-%d").to_string(),
            counts: tally(stamps, &DateWindow::single(day)),
        })
        .collect()
}

pub fn weekly_buckets(weeks: &[(u8, DateWindow)], stamps: &[TicketStamp]) -> Vec<WeeklyCount> {
    weeks
        .iter()
        .map(|(week_number, window)| WeeklyCount {
            week_number: *week_number,
            start: window.start,
            end: window.end,
            counts: tally(stamps, window),
        })
        .collect()
}

/// Tally `stamps` into the buckets described by `plan`.
pub fn build_report(plan: &AnalyticsPlan, stamps: &[TicketStamp]) -> AnalyticsReport {
    match plan {
        AnalyticsPlan::All => AnalyticsReport::All(DailyCount {
            day: "All".into(),
            date: "N/A".into(),
            counts: stamps.iter().map(|s| s.status).collect(),
        }),
        AnalyticsPlan::Weeks(weeks) => AnalyticsReport::Weekly(weekly_buckets(weeks, stamps)),
        AnalyticsPlan::Days(window) => AnalyticsReport::Daily(daily_buckets(window, stamps)),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use techaid_core::models::enums::Status;
    use techaid_core::window::{AnalyticsToken, month_weeks};

    use super::*;

    fn stamp(m: u32, d: u32, status: Status) -> TicketStamp {
        TicketStamp {
            created_at: Utc.with_ymd_and_hms(2025, m, d, 12, 0, 0).unwrap(),
            status,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 5).unwrap()
    }

    fn march() -> Vec<TicketStamp> {
        vec![
            stamp(3, 1, Status::Completed),
            stamp(3, 2, Status::Active),
            stamp(3, 5, Status::NotActive),
            stamp(3, 5, Status::Active),
            stamp(3, 16, Status::Completed),
            stamp(3, 17, Status::NotActive),
            stamp(3, 31, Status::NotActive),
        ]
    }

    #[test]
    fn none_is_a_single_aggregate_bucket() {
        let report = build_report(&AnalyticsPlan::All, &march());
        let AnalyticsReport::All(bucket) = report else {
            panic!("expected aggregate bucket");
        };
        assert_eq!(bucket.day, "All");
        assert_eq!(bucket.date, "N/A");
        assert_eq!(bucket.counts.total, 7);
        assert_eq!(bucket.counts.completed, 2);
        assert!(bucket.counts.is_consistent());
    }

    #[test]
    fn month_weeks_sum_to_month_total() {
        let plan = AnalyticsPlan::resolve(AnalyticsToken::Month, None, today()).unwrap();
        let report = build_report(&plan, &march());

        let AnalyticsReport::Weekly(weeks) = &report else {
            panic!("expected weekly buckets");
        };
        assert_eq!(weeks.len(), 4);
        let totals: Vec<u64> = weeks.iter().map(|w| w.counts.total).collect();
        assert_eq!(totals, vec![1, 3, 0, 3]);
        assert_eq!(weeks[3].end, NaiveDate::from_ymd_opt(2025, 3, 31).unwrap());
        assert_eq!(report.total(), 7);
    }

    #[test]
    fn single_week_reuses_month_boundaries() {
        let plan = AnalyticsPlan::resolve(AnalyticsToken::MonthWeek(4), None, today()).unwrap();
        let AnalyticsReport::Weekly(weeks) = build_report(&plan, &march()) else {
            panic!("expected weekly buckets");
        };
        assert_eq!(weeks.len(), 1);
        assert_eq!(weeks[0].week_number, 4);
        assert_eq!(weeks[0].start, month_weeks(today()).unwrap()[3].start);
        assert_eq!(weeks[0].counts.not_active, 2);
    }

    #[test]
    fn week_is_seven_labelled_days() {
        let plan = AnalyticsPlan::resolve(AnalyticsToken::Week, None, today()).unwrap();
        let AnalyticsReport::Daily(days) = build_report(&plan, &march()) else {
            panic!("expected daily buckets");
        };
        assert_eq!(days.len(), 7);
        assert_eq!(days[0].day, "Monday");
        assert_eq!(days[0].date, "2025-03-03");
        assert_eq!(days[2].day, "Wednesday");
        assert_eq!(days[2].counts.total, 2);
        assert_eq!(days[2].counts.active, 1);
        assert_eq!(days[6].date, "2025-03-09");
    }

    #[test]
    fn empty_day_still_gets_a_bucket() {
        let window = DateWindow::single(NaiveDate::from_ymd_opt(2025, 3, 20).unwrap());
        let days = daily_buckets(&window, &march());
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].counts, StatusCounts::default());
    }
}
