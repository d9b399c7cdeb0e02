use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;

use kcal_core::service::Tracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExportKind {
    Products,
    History,
}

/// Writes the CSV to `output`, or to stdout when no file is given.
pub(crate) fn cmd_export(tracker: &Tracker, kind: ExportKind, output: Option<&Path>) -> Result<()> {
    let csv = match kind {
        ExportKind::Products => tracker.export_products()?,
        ExportKind::History => tracker.export_history(&Local)?,
    };

    match output {
        Some(path) => {
            std::fs::write(path, &csv)
                .with_context(|| format!("Failed to write file: {}", path.display()))?;
            let rows = csv.lines().count().saturating_sub(1);
            eprintln!("Exported {rows} rows to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(csv.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kcal_core::models::NewProduct;

    #[test]
    fn test_export_products_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let tracker = Tracker::new_in_memory().unwrap();
        tracker
            .add_product(&NewProduct::with_macros("Яблоко", Some(52.0), 0.4, 0.4, 9.8))
            .unwrap();

        cmd_export(&tracker, ExportKind::Products, Some(&path)).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "Название;Ккал;Белки;Жиры;Углеводы\nЯблоко;52;0.4;0.4;9.8\n"
        );
    }

    #[test]
    fn test_export_empty_history_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        let tracker = Tracker::new_in_memory().unwrap();
        cmd_export(&tracker, ExportKind::History, Some(&path)).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.lines().count(), 1);
        assert!(written.starts_with("Дата;"));
    }
}
