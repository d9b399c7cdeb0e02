//! Semicolon-separated CSV export of products and history, and validated
//! product import.

use std::io::Write;

use anyhow::Result;
use chrono::TimeZone;
use serde::Serialize;
use thiserror::Error;

use crate::day::calendar_day;
use crate::models::{Entry, NewProduct, Product, round1};

pub const PRODUCT_HEADER: [&str; 5] = ["Название", "Ккал", "Белки", "Жиры", "Углеводы"];
pub const HISTORY_HEADER: [&str; 7] = [
    "Дата",
    "Название",
    "Вес (г)",
    "Ккал",
    "Белки",
    "Жиры",
    "Углеводы",
];

const DELIMITER: u8 = b';';

/// Why an imported product row was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowError {
    #[error("expected 5 columns, found {0}")]
    ColumnCount(usize),
    #[error("non-numeric value")]
    NotNumeric,
    #[error("negative value")]
    Negative,
    #[error("empty name")]
    EmptyName,
}

/// One data line of a product import, valid or not.
#[derive(Debug, Clone, Serialize)]
pub struct ImportRow {
    /// 1-based, counted from the first line after the header.
    pub line: usize,
    pub raw: String,
    pub name: String,
    pub kcal: f64,
    pub protein: f64,
    pub fat: f64,
    pub carb: f64,
    pub error: Option<RowError>,
}

impl ImportRow {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    fn rejected(line: usize, raw: &str, name: String, error: RowError) -> Self {
        Self {
            line,
            raw: raw.to_string(),
            name,
            kcal: 0.0,
            protein: 0.0,
            fat: 0.0,
            carb: 0.0,
            error: Some(error),
        }
    }
}

/// Parsed import awaiting confirmation. Nothing is stored until the caller
/// commits [`ImportPreview::valid_products`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportPreview {
    pub rows: Vec<ImportRow>,
}

impl ImportPreview {
    pub fn valid(&self) -> impl Iterator<Item = &ImportRow> {
        self.rows.iter().filter(|r| r.is_valid())
    }

    #[must_use]
    pub fn valid_count(&self) -> usize {
        self.valid().count()
    }

    #[must_use]
    pub fn invalid_count(&self) -> usize {
        self.rows.len() - self.valid_count()
    }

    #[must_use]
    pub fn valid_products(&self) -> Vec<NewProduct> {
        self.valid()
            .map(|r| NewProduct {
                name: r.name.clone(),
                kcal_per_100: r.kcal,
                protein_per_100: r.protein,
                fat_per_100: r.fat,
                carb_per_100: r.carb,
            })
            .collect()
    }
}

fn writer<W: Write>(inner: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(inner)
}

/// Writes the product library; numbers are written unrounded.
pub fn write_products<W: Write>(inner: W, products: &[Product]) -> Result<()> {
    let mut wtr = writer(inner);
    wtr.write_record(PRODUCT_HEADER)?;
    for p in products {
        let kcal = p.kcal_per_100.to_string();
        let protein = p.protein_per_100.to_string();
        let fat = p.fat_per_100.to_string();
        let carb = p.carb_per_100.to_string();
        wtr.write_record([p.name.as_str(), &kcal, &protein, &fat, &carb])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_products(products: &[Product]) -> Result<String> {
    let mut buf = Vec::new();
    write_products(&mut buf, products)?;
    Ok(String::from_utf8(buf)?)
}

/// Writes the entry history oldest first. The date column is the calendar
/// date of each entry in `tz`; weight and kcal are rounded to integers and
/// macros to one decimal, with ties rounded away from zero.
pub fn write_history<W: Write, Tz: TimeZone>(inner: W, entries: &[Entry], tz: &Tz) -> Result<()> {
    let mut sorted: Vec<&Entry> = entries.iter().collect();
    sorted.sort_by_key(|e| e.timestamp);

    let mut wtr = writer(inner);
    wtr.write_record(HISTORY_HEADER)?;
    for e in sorted {
        let date = calendar_day(&e.timestamp, tz).format("%Y-%m-%d").to_string();
        let weight = (e.weight.round() as i64).to_string();
        let kcal = (e.kcal.round() as i64).to_string();
        let protein = format!("{:.1}", round1(e.protein));
        let fat = format!("{:.1}", round1(e.fat));
        let carb = format!("{:.1}", round1(e.carb));
        wtr.write_record([
            date.as_str(),
            e.name.as_str(),
            &weight,
            &kcal,
            &protein,
            &fat,
            &carb,
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_history<Tz: TimeZone>(entries: &[Entry], tz: &Tz) -> Result<String> {
    let mut buf = Vec::new();
    write_history(&mut buf, entries, tz)?;
    Ok(String::from_utf8(buf)?)
}

/// Parses a product file into a preview.
///
/// Blank lines are dropped and the first remaining line is taken as the
/// header. Every other line is validated on its own, so a bad row never
/// affects its neighbours.
#[must_use]
pub fn parse_products(text: &str) -> ImportPreview {
    let rows = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .skip(1)
        .enumerate()
        .map(|(idx, line)| parse_product_row(idx + 1, line))
        .collect();
    ImportPreview { rows }
}

fn split_fields(line: &str) -> Vec<String> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());
    match rdr.records().next() {
        Some(Ok(record)) => record.iter().map(str::to_string).collect(),
        _ => line.split(';').map(str::to_string).collect(),
    }
}

fn parse_number(field: &str) -> Result<f64, RowError> {
    let field = field.trim();
    if field.is_empty() {
        return Ok(0.0);
    }
    match field.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(RowError::NotNumeric),
    }
}

fn parse_product_row(line_no: usize, line: &str) -> ImportRow {
    let fields = split_fields(line);
    if fields.len() != PRODUCT_HEADER.len() {
        return ImportRow::rejected(line_no, line, String::new(), RowError::ColumnCount(fields.len()));
    }

    let name = fields[0].trim().to_string();
    let numbers: Result<Vec<f64>, RowError> = fields[1..].iter().map(|f| parse_number(f)).collect();
    let numbers = match numbers {
        Ok(n) => n,
        Err(e) => return ImportRow::rejected(line_no, line, name, e),
    };
    if numbers.iter().any(|n| *n < 0.0) {
        return ImportRow::rejected(line_no, line, name, RowError::Negative);
    }

    let error = if name.is_empty() {
        Some(RowError::EmptyName)
    } else {
        None
    };
    ImportRow {
        line: line_no,
        raw: line.to_string(),
        name,
        kcal: numbers[0],
        protein: numbers[1],
        fat: numbers[2],
        carb: numbers[3],
        error,
    }
}
