use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use kcal_core::aggregate::{DateRange, RangePreset};
use kcal_core::chart::{ChartOptions, Palette, render_svg};
use kcal_core::day;
use kcal_core::models::AggregatedDay;
use kcal_core::service::Tracker;

use super::helpers::{no_neg_zero, parse_date};

const CHART_WIDTH: f64 = 800.0;
const CHART_HEIGHT: f64 = 300.0;

/// Explicit `--from`/`--to` win over `--preset`; with neither, the last
/// seven logical days are shown.
pub(crate) fn resolve_range(
    from: Option<&str>,
    to: Option<&str>,
    preset: Option<&str>,
    today: NaiveDate,
) -> Result<DateRange> {
    if from.is_some() || to.is_some() {
        let from = from.map(|s| parse_date(s, today)).transpose()?.unwrap_or(today);
        let to = to.map(|s| parse_date(s, today)).transpose()?.unwrap_or(today);
        if from > to {
            bail!("--from ({from}) is after --to ({to})");
        }
        return Ok(DateRange::new(from, to));
    }
    let preset = match preset {
        Some(p) => p.parse()?,
        None => RangePreset::LastWeek,
    };
    Ok(DateRange::preset(preset, today))
}

/// Date selection flags as given on the command line.
#[derive(Debug, Default)]
pub(crate) struct RangeArgs {
    pub from: Option<String>,
    pub to: Option<String>,
    pub preset: Option<String>,
}

pub(crate) fn cmd_stats(
    tracker: &Tracker,
    args: &RangeArgs,
    options: &ChartOptions,
    chart: Option<&Path>,
    json: bool,
) -> Result<()> {
    let settings = tracker.settings()?;
    let today = day::today(settings.day_start_hour, &Local);
    let range = resolve_range(
        args.from.as_deref(),
        args.to.as_deref(),
        args.preset.as_deref(),
        today,
    )?;
    let data = tracker.stats(range, &settings, &Local)?;

    if let Some(path) = chart {
        let svg = render_svg(
            &data,
            options,
            &Palette::for_settings(&settings),
            CHART_WIDTH,
            CHART_HEIGHT,
        );
        std::fs::write(path, svg)
            .with_context(|| format!("Failed to write chart: {}", path.display()))?;
        eprintln!("Chart written to {}", path.display());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    if data.is_empty() {
        eprintln!("No entries between {} and {}", range.from, range.to);
        process::exit(2);
    }
    print_stats_table(&data, options);

    Ok(())
}

fn print_stats_table(data: &[AggregatedDay], options: &ChartOptions) {
    #[derive(Tabled)]
    struct StatsRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "kcal")]
        kcal: String,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Fat")]
        fat: String,
        #[tabled(rename = "Carbs")]
        carb: String,
    }

    let shown = |visible: bool, v: f64, unit: &str| {
        if visible {
            format!("{:.0}{unit}", no_neg_zero(v))
        } else {
            "-".to_string()
        }
    };
    let visible = options.visible;
    let rows: Vec<StatsRow> = data
        .iter()
        .map(|d| StatsRow {
            date: d.date.clone(),
            kcal: shown(visible.kcal, d.kcal, ""),
            protein: shown(visible.protein, d.prot, "g"),
            fat: shown(visible.fat, d.fat, "g"),
            carb: shown(visible.carb, d.carb, "g"),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use kcal_core::models::{ManualEntry, Per100};

    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_resolve_default_is_last_week() {
        let range = resolve_range(None, None, None, date("2024-06-15")).unwrap();
        assert_eq!(range, DateRange::new(date("2024-06-09"), date("2024-06-15")));
    }

    #[test]
    fn test_resolve_explicit_dates_win() {
        let range = resolve_range(
            Some("2024-06-01"),
            Some("2024-06-03"),
            Some("30"),
            date("2024-06-15"),
        )
        .unwrap();
        assert_eq!(range, DateRange::new(date("2024-06-01"), date("2024-06-03")));
    }

    #[test]
    fn test_resolve_open_ended_to_today() {
        let range = resolve_range(Some("2024-06-10"), None, None, date("2024-06-15")).unwrap();
        assert_eq!(range.to, date("2024-06-15"));
    }

    #[test]
    fn test_resolve_keywords_follow_logical_day() {
        // shortly after midnight, before the day start hour, the logical day is still the 14th
        let logical_today = date("2024-06-14");
        let range = resolve_range(Some("yesterday"), Some("today"), None, logical_today).unwrap();
        assert_eq!(range, DateRange::new(date("2024-06-13"), date("2024-06-14")));
        assert_eq!(
            resolve_range(None, Some("today"), None, logical_today).unwrap().to,
            DateRange::preset(RangePreset::LastWeek, logical_today).to
        );
    }

    #[test]
    fn test_resolve_rejects_reversed_range() {
        assert!(resolve_range(Some("2024-06-10"), Some("2024-06-01"), None, date("2024-06-15")).is_err());
    }

    #[test]
    fn test_resolve_preset() {
        let range = resolve_range(None, None, Some("last-month"), date("2024-03-15")).unwrap();
        assert_eq!(range, DateRange::new(date("2024-02-01"), date("2024-02-29")));
        assert!(resolve_range(None, None, Some("year"), date("2024-03-15")).is_err());
    }

    #[test]
    fn test_stats_writes_chart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.svg");
        let tracker = Tracker::new_in_memory().unwrap();
        tracker
            .log_manual(
                ManualEntry {
                    name: "Каша".to_string(),
                    weight: 200.0,
                    per_100: Per100 {
                        kcal: 110.0,
                        protein: 3.0,
                        fat: 2.0,
                        carb: 20.0,
                    },
                },
                Utc::now(),
            )
            .unwrap();

        let today = Local::now().date_naive();
        let args = RangeArgs {
            from: Some((today - chrono::Duration::days(2)).to_string()),
            to: Some((today + chrono::Duration::days(1)).to_string()),
            preset: None,
        };
        cmd_stats(&tracker, &args, &ChartOptions::default(), Some(&path), true).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.starts_with("<svg"));
        assert_eq!(svg.matches("<polyline").count(), 4);
    }
}
