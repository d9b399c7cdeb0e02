//! [`Tracker`], the entry point for every user operation.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tracing::{debug, info};

use crate::aggregate::{self, DateRange};
use crate::csv_codec::{self, ImportPreview};
use crate::day::logical_day;
use crate::db::Database;
use crate::models::{
    AggregatedDay, DaySummary, Entry, EntryEdit, Goals, ManualEntry, NewEntry, NewProduct,
    Per100, Product, ProductEdit, validate_name,
};
use crate::settings::{SettingKey, Settings};

/// The operations the user interface performs, on top of a [`Database`].
///
/// Anything that depends on preferences takes a [`Settings`] value instead of
/// reading them itself; load it once with [`Tracker::settings`].
pub struct Tracker {
    db: Database,
}

impl Tracker {
    /// Opens the database at `path` and seeds missing settings.
    pub fn open(path: &Path) -> Result<Self> {
        Self::with_database(Database::open(path)?)
    }

    pub fn new_in_memory() -> Result<Self> {
        Self::with_database(Database::open_in_memory()?)
    }

    fn with_database(db: Database) -> Result<Self> {
        db.init_default_settings()?;
        Ok(Self { db })
    }

    #[must_use]
    pub fn database(&self) -> &Database {
        &self.db
    }

    // --- Settings ---

    pub fn settings(&self) -> Result<Settings> {
        self.db.load_settings()
    }

    /// Parses and stores one setting, returning the value actually persisted.
    ///
    /// A blank or `auto` kcal goal is derived from the stored macro goals.
    pub fn set_setting(&self, key: SettingKey, input: &str) -> Result<Value> {
        let input = input.trim();
        let value = if key == SettingKey::GoalKcal
            && (input.is_empty() || input.eq_ignore_ascii_case("auto"))
        {
            let current = self.settings()?;
            Value::from(Goals::kcal_from_macros(
                current.goal_prot,
                current.goal_fat,
                current.goal_carb,
            ))
        } else {
            key.parse_value(input)?
        };
        self.db.set_setting(key, &value)?;
        info!(key = %key, value = %value, "setting updated");
        Ok(value)
    }

    // --- Entries ---

    /// Entries of the logical day containing `now`, with totals and goal status.
    pub fn today<Tz: TimeZone>(
        &self,
        settings: &Settings,
        now: DateTime<Utc>,
        tz: &Tz,
    ) -> Result<DaySummary> {
        let day = logical_day(&now, settings.day_start_hour, tz);
        let entries = self.db.get_all_entries()?;
        Ok(aggregate::summarize_day(
            &entries,
            day,
            settings.day_start_hour,
            tz,
            settings.goals(),
        ))
    }

    pub fn log_manual(&self, entry: ManualEntry, at: DateTime<Utc>) -> Result<Entry> {
        let new_entry = entry.into_new_entry(at)?;
        self.db.add_entry(&new_entry)
    }

    /// Logs `weight` grams of a library product. Negative or non-numeric
    /// weights count as zero.
    pub fn log_product(&self, product_id: i64, weight: f64, at: DateTime<Utc>) -> Result<Entry> {
        let product = self
            .db
            .get_product(product_id)?
            .with_context(|| format!("Product {product_id} not found"))?;
        let weight = if weight.is_finite() { weight.max(0.0) } else { 0.0 };
        let totals = Per100::from(&product).scaled(weight);
        self.db.add_entry(&NewEntry {
            name: product.name,
            weight,
            kcal: totals.kcal,
            protein: totals.protein,
            fat: totals.fat,
            carb: totals.carb,
            timestamp: at,
        })
    }

    pub fn edit_entry(&self, id: i64, edit: &EntryEdit) -> Result<Entry> {
        let entry = self
            .db
            .get_entry(id)?
            .with_context(|| format!("Entry {id} not found"))?;
        let updated = edit.apply(&entry)?;
        self.db.put_entry(&updated)?;
        debug!(id, "entry edited");
        Ok(updated)
    }

    pub fn delete_entry(&self, id: i64) -> Result<bool> {
        self.db.delete_entry(id)
    }

    // --- Products ---

    pub fn add_product(&self, product: &NewProduct) -> Result<Product> {
        validate_name(&product.name)?;
        self.db.add_product(product)
    }

    pub fn edit_product(&self, id: i64, edit: &ProductEdit) -> Result<Product> {
        let product = self
            .db
            .get_product(id)?
            .with_context(|| format!("Product {id} not found"))?;
        let updated = edit.apply(&product)?;
        self.db.put_product(&updated)?;
        debug!(id, "product edited");
        Ok(updated)
    }

    pub fn delete_product(&self, id: i64) -> Result<bool> {
        self.db.delete_product(id)
    }

    /// Library products whose name contains `query` (case-insensitive),
    /// sorted by name. An empty query lists everything.
    pub fn search_products(&self, query: &str) -> Result<Vec<Product>> {
        let needle = query.trim().to_lowercase();
        let mut products: Vec<Product> = self
            .db
            .get_all_products()?
            .into_iter()
            .filter(|p| needle.is_empty() || p.name.to_lowercase().contains(&needle))
            .collect();
        products.sort_by_cached_key(|p| p.name.to_lowercase());
        Ok(products)
    }

    // --- Import / export ---

    /// Stores every valid row of a confirmed preview; invalid rows are skipped.
    pub fn import_products(&self, preview: &ImportPreview) -> Result<usize> {
        let products = preview.valid_products();
        for product in &products {
            self.db.add_product(product)?;
        }
        info!(
            imported = products.len(),
            skipped = preview.invalid_count(),
            "products imported"
        );
        Ok(products.len())
    }

    pub fn export_products(&self) -> Result<String> {
        let products = self.db.get_all_products()?;
        info!(count = products.len(), "exporting products");
        csv_codec::export_products(&products)
    }

    pub fn export_history<Tz: TimeZone>(&self, tz: &Tz) -> Result<String> {
        let entries = self.db.get_all_entries()?;
        info!(count = entries.len(), "exporting history");
        csv_codec::export_history(&entries, tz)
    }

    // --- Stats ---

    pub fn stats<Tz: TimeZone>(
        &self,
        range: DateRange,
        settings: &Settings,
        tz: &Tz,
    ) -> Result<Vec<AggregatedDay>> {
        let entries = self.db.get_all_entries()?;
        Ok(aggregate::aggregate_by_day(
            &entries,
            range,
            settings.day_start_hour,
            tz,
        ))
    }
}
