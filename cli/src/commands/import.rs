use std::path::Path;

use anyhow::{Context, Result};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use kcal_core::csv_codec::{ImportPreview, parse_products};
use kcal_core::service::Tracker;

use super::helpers::{confirm, truncate};

pub(crate) fn cmd_import_products(tracker: &Tracker, path: &Path, yes: bool, json: bool) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let preview = parse_products(&text);

    if preview.rows.is_empty() {
        if json {
            println!(
                "{}",
                serde_json::json!({ "error": "No rows found in CSV file" })
            );
        } else {
            eprintln!("No rows found in CSV file.");
        }
        return Ok(());
    }

    if !json {
        print_preview(&preview);
        let valid = preview.valid_count();
        let invalid = preview.invalid_count();
        println!("\n  Valid rows:   {valid}");
        println!("  Invalid rows: {invalid} (skipped)");
    }

    let proceed = yes || (!json && preview.valid_count() > 0 && confirm("Import valid rows?")?);
    let imported = if proceed {
        tracker.import_products(&preview)?
    } else {
        0
    };

    if json {
        println!(
            "{}",
            serde_json::json!({
                "imported": imported,
                "dry_run": !proceed,
                "rows": preview.rows,
            })
        );
    } else if proceed {
        println!("\nImport complete: {imported} products added.");
    } else {
        println!("\nNothing imported.");
    }

    Ok(())
}

fn print_preview(preview: &ImportPreview) {
    #[derive(Tabled)]
    struct PreviewRow {
        #[tabled(rename = "#")]
        line: usize,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "kcal")]
        kcal: String,
        #[tabled(rename = "P")]
        protein: String,
        #[tabled(rename = "F")]
        fat: String,
        #[tabled(rename = "C")]
        carb: String,
        #[tabled(rename = "Status")]
        status: String,
    }

    let rows: Vec<PreviewRow> = preview
        .rows
        .iter()
        .map(|r| match &r.error {
            None => PreviewRow {
                line: r.line,
                name: truncate(&r.name, 35),
                kcal: format!("{}", r.kcal),
                protein: format!("{}", r.protein),
                fat: format!("{}", r.fat),
                carb: format!("{}", r.carb),
                status: "ok".to_string(),
            },
            Some(err) => PreviewRow {
                line: r.line,
                name: truncate(&r.raw, 35),
                kcal: String::new(),
                protein: String::new(),
                fat: String::new(),
                carb: String::new(),
                status: err.to_string(),
            },
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..6)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}
