//! Per-day totals over a date range, and goal status for a single day.

use std::collections::BTreeMap;
use std::str::FromStr;

use anyhow::{Result, bail};
use chrono::{Datelike, Duration, NaiveDate, TimeZone};
use serde::Serialize;

use crate::day::logical_day;
use crate::models::{AggregatedDay, DaySummary, Entry, GoalProgress, GoalStatus, Goals, Nutrients};

/// Inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    #[must_use]
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }

    /// Resolves a preset relative to `today`.
    #[must_use]
    pub fn preset(preset: RangePreset, today: NaiveDate) -> Self {
        match preset {
            RangePreset::LastWeek => Self::new(today - Duration::days(6), today),
            RangePreset::LastMonth => Self::new(today - Duration::days(29), today),
            RangePreset::ThisMonth => Self::new(first_of_month(today), today),
            RangePreset::PreviousMonth => {
                let this_month = first_of_month(today);
                let last_day = this_month - Duration::days(1);
                Self::new(first_of_month(last_day), last_day)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePreset {
    /// Today and the six days before it.
    LastWeek,
    /// Today and the 29 days before it.
    LastMonth,
    /// From the first of the current month to today.
    ThisMonth,
    /// The whole previous calendar month.
    PreviousMonth,
}

impl FromStr for RangePreset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "7" | "week" => Ok(Self::LastWeek),
            "30" => Ok(Self::LastMonth),
            "month" | "m0" => Ok(Self::ThisMonth),
            "last-month" | "m1" => Ok(Self::PreviousMonth),
            _ => bail!("Invalid preset '{s}'. Use 7, 30, month or last-month"),
        }
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Sums entries per logical day within `range`.
///
/// Output is ordered by date and only contains days with at least one entry.
#[must_use]
pub fn aggregate_by_day<Tz: TimeZone>(
    entries: &[Entry],
    range: DateRange,
    day_start_hour: u32,
    tz: &Tz,
) -> Vec<AggregatedDay> {
    let mut buckets: BTreeMap<NaiveDate, Nutrients> = BTreeMap::new();
    for entry in entries {
        let day = logical_day(&entry.timestamp, day_start_hour, tz);
        if !range.contains(day) {
            continue;
        }
        buckets.entry(day).or_default().add(&Nutrients::from(entry));
    }

    buckets
        .into_iter()
        .map(|(date, sum)| AggregatedDay {
            date: date.format("%Y-%m-%d").to_string(),
            kcal: sum.kcal,
            prot: sum.protein,
            fat: sum.fat,
            carb: sum.carb,
        })
        .collect()
}

/// Everything logged on logical day `day`, newest first, with totals checked
/// against `goals`.
#[must_use]
pub fn summarize_day<Tz: TimeZone>(
    entries: &[Entry],
    day: NaiveDate,
    day_start_hour: u32,
    tz: &Tz,
    goals: Goals,
) -> DaySummary {
    let mut day_entries: Vec<Entry> = entries
        .iter()
        .filter(|e| logical_day(&e.timestamp, day_start_hour, tz) == day)
        .cloned()
        .collect();
    day_entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let mut totals = Nutrients::default();
    for entry in &day_entries {
        totals.add(&Nutrients::from(entry));
    }

    let progress = GoalProgress {
        kcal: GoalStatus::classify(totals.kcal, goals.kcal),
        protein: GoalStatus::classify(totals.protein, goals.protein),
        fat: GoalStatus::classify(totals.fat, goals.fat),
        carb: GoalStatus::classify(totals.carb, goals.carb),
    };

    DaySummary {
        date: day,
        entries: day_entries,
        totals,
        goals,
        progress,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

    use super::*;

    fn tz() -> FixedOffset {
        FixedOffset::east_opt(3 * 3600).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn entry(id: i64, local: &str, kcal: f64, protein: f64, fat: f64, carb: f64) -> Entry {
        let naive = NaiveDateTime::parse_from_str(local, "%Y-%m-%d %H:%M").unwrap();
        let timestamp: DateTime<Utc> = tz()
            .from_local_datetime(&naive)
            .single()
            .unwrap()
            .with_timezone(&Utc);
        Entry {
            id,
            name: format!("entry {id}"),
            weight: 100.0,
            kcal,
            protein,
            fat,
            carb,
            timestamp,
        }
    }

    fn goals() -> Goals {
        Goals {
            kcal: 2000,
            protein: 120,
            fat: 70,
            carb: 220,
        }
    }

    #[test]
    fn test_empty_entries_yield_empty_sequence() {
        let range = DateRange::new(date("2024-01-01"), date("2024-12-31"));
        assert!(aggregate_by_day(&[], range, 3, &tz()).is_empty());
    }

    #[test]
    fn test_sums_per_day() {
        let entries = vec![
            entry(1, "2024-06-15 08:00", 300.0, 10.0, 5.0, 40.0),
            entry(2, "2024-06-15 13:00", 600.5, 30.25, 20.0, 70.0),
            entry(3, "2024-06-16 09:00", 250.0, 12.0, 8.0, 30.0),
        ];
        let range = DateRange::new(date("2024-06-15"), date("2024-06-16"));
        let days = aggregate_by_day(&entries, range, 3, &tz());

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, "2024-06-15");
        assert_eq!(days[0].kcal, 300.0 + 600.5);
        assert_eq!(days[0].prot, 10.0 + 30.25);
        assert_eq!(days[0].fat, 25.0);
        assert_eq!(days[0].carb, 110.0);
        assert_eq!(days[1].date, "2024-06-16");
        assert_eq!(days[1].kcal, 250.0);
    }

    #[test]
    fn test_night_snack_counts_towards_previous_day() {
        let entries = vec![
            entry(1, "2024-06-15 02:30", 100.0, 0.0, 0.0, 0.0),
            entry(2, "2024-06-15 04:30", 200.0, 0.0, 0.0, 0.0),
        ];
        let range = DateRange::new(date("2024-06-01"), date("2024-06-30"));
        let days = aggregate_by_day(&entries, range, 3, &tz());

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, "2024-06-14");
        assert_eq!(days[0].kcal, 100.0);
        assert_eq!(days[1].date, "2024-06-15");
        assert_eq!(days[1].kcal, 200.0);
    }

    #[test]
    fn test_range_is_inclusive_and_date_only() {
        let entries = vec![
            entry(1, "2024-06-10 23:59", 1.0, 0.0, 0.0, 0.0),
            entry(2, "2024-06-12 23:59", 2.0, 0.0, 0.0, 0.0),
            entry(3, "2024-06-13 12:00", 4.0, 0.0, 0.0, 0.0),
            entry(4, "2024-06-09 12:00", 8.0, 0.0, 0.0, 0.0),
        ];
        let range = DateRange::new(date("2024-06-10"), date("2024-06-12"));
        let days = aggregate_by_day(&entries, range, 0, &tz());

        let dates: Vec<&str> = days.iter().map(|d| d.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-06-10", "2024-06-12"]);
    }

    #[test]
    fn test_output_sorted_and_unique() {
        let entries = vec![
            entry(1, "2024-06-20 12:00", 1.0, 0.0, 0.0, 0.0),
            entry(2, "2024-06-02 12:00", 1.0, 0.0, 0.0, 0.0),
            entry(3, "2024-06-11 12:00", 1.0, 0.0, 0.0, 0.0),
            entry(4, "2024-06-02 18:00", 1.0, 0.0, 0.0, 0.0),
            entry(5, "2024-06-20 07:00", 1.0, 0.0, 0.0, 0.0),
        ];
        let range = DateRange::new(date("2024-06-01"), date("2024-06-30"));
        let days = aggregate_by_day(&entries, range, 3, &tz());

        assert_eq!(days.len(), 3);
        assert!(days.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn test_missing_days_not_filled() {
        let entries = vec![
            entry(1, "2024-06-01 12:00", 1.0, 0.0, 0.0, 0.0),
            entry(2, "2024-06-05 12:00", 1.0, 0.0, 0.0, 0.0),
        ];
        let range = DateRange::new(date("2024-06-01"), date("2024-06-07"));
        assert_eq!(aggregate_by_day(&entries, range, 3, &tz()).len(), 2);
    }

    #[test]
    fn test_summarize_day_newest_first() {
        let entries = vec![
            entry(1, "2024-06-15 08:00", 500.0, 30.0, 20.0, 50.0),
            entry(2, "2024-06-15 20:00", 1600.0, 95.0, 60.0, 175.0),
            entry(3, "2024-06-16 01:00", 100.0, 1.0, 1.0, 1.0),
            entry(4, "2024-06-16 09:00", 999.0, 0.0, 0.0, 0.0),
        ];
        let summary = summarize_day(&entries, date("2024-06-15"), 3, &tz(), goals());

        let ids: Vec<i64> = summary.entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(summary.totals.kcal, 2200.0);
        assert_eq!(summary.progress.kcal, GoalStatus::OnTarget);
        assert_eq!(summary.totals.protein, 126.0);
        assert_eq!(summary.progress.protein, GoalStatus::OnTarget);
        assert_eq!(summary.progress.fat, GoalStatus::Over);
        assert_eq!(summary.progress.carb, GoalStatus::OnTarget);
    }

    #[test]
    fn test_summarize_empty_day() {
        let summary = summarize_day(&[], date("2024-06-15"), 3, &tz(), goals());
        assert!(summary.entries.is_empty());
        assert_eq!(summary.progress.kcal, GoalStatus::Under);
    }

    #[test]
    fn test_presets() {
        let today = date("2024-03-15");
        assert_eq!(
            DateRange::preset(RangePreset::LastWeek, today),
            DateRange::new(date("2024-03-09"), today)
        );
        assert_eq!(
            DateRange::preset(RangePreset::LastMonth, today),
            DateRange::new(date("2024-02-15"), today)
        );
        assert_eq!(
            DateRange::preset(RangePreset::ThisMonth, today),
            DateRange::new(date("2024-03-01"), today)
        );
        assert_eq!(
            DateRange::preset(RangePreset::PreviousMonth, today),
            DateRange::new(date("2024-02-01"), date("2024-02-29"))
        );
    }

    #[test]
    fn test_previous_month_in_january() {
        let range = DateRange::preset(RangePreset::PreviousMonth, date("2025-01-10"));
        assert_eq!(range, DateRange::new(date("2024-12-01"), date("2024-12-31")));
    }

    #[test]
    fn test_preset_from_str() {
        assert_eq!("7".parse::<RangePreset>().unwrap(), RangePreset::LastWeek);
        assert_eq!("last-month".parse::<RangePreset>().unwrap(), RangePreset::PreviousMonth);
        assert!("year".parse::<RangePreset>().is_err());
    }
}
