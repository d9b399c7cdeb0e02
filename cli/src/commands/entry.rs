use anyhow::Result;
use chrono::{Local, Utc};
use std::process;

use kcal_core::models::{DaySummary, EntryEdit, GoalStatus, ManualEntry, Per100};
use kcal_core::service::Tracker;

use super::helpers::{json_error, no_neg_zero, print_entry_table};

pub(crate) fn cmd_today(tracker: &Tracker, json: bool) -> Result<()> {
    let settings = tracker.settings()?;
    let summary = tracker.today(&settings, Utc::now(), &Local)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let date = summary.date;
    println!("=== {date} ===\n");
    if summary.entries.is_empty() {
        println!("  No entries yet.\n");
    } else {
        print_entry_table(&summary.entries);
        println!();
    }
    print_goal_lines(&summary);

    Ok(())
}

fn status_marker(status: GoalStatus) -> &'static str {
    match status {
        GoalStatus::Under => "under",
        GoalStatus::OnTarget => "on target",
        GoalStatus::Over => "over",
    }
}

fn print_goal_lines(summary: &DaySummary) {
    let t = &summary.totals;
    let g = &summary.goals;
    let p = &summary.progress;
    let rows = [
        ("kcal", t.kcal, g.kcal, p.kcal, ""),
        ("Protein", t.protein, g.protein, p.protein, "g"),
        ("Fat", t.fat, g.fat, p.fat, "g"),
        ("Carbs", t.carb, g.carb, p.carb, "g"),
    ];
    for (label, value, goal, status, unit) in rows {
        let value = no_neg_zero(value);
        let marker = status_marker(status);
        println!("  {label:<8} {value:>6.0}{unit} / {goal}{unit}  ({marker})");
    }
}

pub(crate) fn cmd_add(
    tracker: &Tracker,
    name: &str,
    weight: f64,
    per_100: Per100,
    json: bool,
) -> Result<()> {
    let entry = tracker.log_manual(
        ManualEntry {
            name: name.to_string(),
            weight,
            per_100,
        },
        Utc::now(),
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        let id = entry.id;
        let name = &entry.name;
        let kcal = entry.kcal;
        println!("Logged {name}, {weight:.0}g, {kcal:.0} kcal (id: {id})");
    }

    Ok(())
}

pub(crate) fn cmd_use(tracker: &Tracker, product_id: i64, weight: f64, json: bool) -> Result<()> {
    let entry = tracker.log_product(product_id, weight, Utc::now())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        let id = entry.id;
        let name = &entry.name;
        let grams = entry.weight;
        let kcal = entry.kcal;
        println!("Logged {name}, {grams:.0}g, {kcal:.0} kcal (id: {id})");
    }

    Ok(())
}

pub(crate) fn cmd_edit(tracker: &Tracker, entry_id: i64, edit: &EntryEdit, json: bool) -> Result<()> {
    let entry = tracker.edit_entry(entry_id, edit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        let name = &entry.name;
        let grams = entry.weight;
        let kcal = entry.kcal;
        println!("Updated entry {entry_id}: {name}, {grams:.0}g, {kcal:.0} kcal");
    }

    Ok(())
}

pub(crate) fn cmd_delete(tracker: &Tracker, entry_id: i64, json: bool) -> Result<()> {
    if tracker.delete_entry(entry_id)? {
        if json {
            println!("{}", serde_json::json!({ "deleted": entry_id }));
        } else {
            println!("Deleted entry {entry_id}");
        }
    } else {
        if json {
            println!("{}", json_error(&format!("Entry {entry_id} not found")));
        } else {
            eprintln!("Entry {entry_id} not found");
        }
        process::exit(2);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_marker() {
        assert_eq!(status_marker(GoalStatus::Under), "under");
        assert_eq!(status_marker(GoalStatus::OnTarget), "on target");
        assert_eq!(status_marker(GoalStatus::Over), "over");
    }

    #[test]
    fn test_add_and_delete_entry() {
        let tracker = Tracker::new_in_memory().unwrap();
        let per_100 = Per100 {
            kcal: 52.0,
            protein: 0.4,
            fat: 0.4,
            carb: 9.8,
        };
        cmd_add(&tracker, "Яблоко", 150.0, per_100, true).unwrap();
        let entries = tracker.database().get_all_entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kcal, 78.0);

        cmd_delete(&tracker, entries[0].id, true).unwrap();
        assert!(tracker.database().get_all_entries().unwrap().is_empty());
    }

    #[test]
    fn test_add_rejects_negative_weight() {
        let tracker = Tracker::new_in_memory().unwrap();
        assert!(cmd_add(&tracker, "Яблоко", -1.0, Per100::default(), false).is_err());
    }
}
