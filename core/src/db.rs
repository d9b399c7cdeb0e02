//! SQLite storage for products, entries and settings.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use tracing::debug;

use crate::models::{Entry, NewEntry, NewProduct, Product};
use crate::settings::{SettingKey, Settings};

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        debug!(path = %path.display(), "database opened");
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS products (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    kcal_per_100 REAL NOT NULL,
                    protein_per_100 REAL NOT NULL,
                    fat_per_100 REAL NOT NULL,
                    carb_per_100 REAL NOT NULL,
                    created_at INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS entries (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    weight REAL NOT NULL,
                    kcal REAL NOT NULL,
                    protein REAL NOT NULL,
                    fat REAL NOT NULL,
                    carb REAL NOT NULL,
                    timestamp INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS settings (
                    key TEXT PRIMARY KEY NOT NULL,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_products_name ON products(name);

                PRAGMA user_version = 1;",
            )?;
        }

        if version < 2 {
            self.conn.execute_batch(
                "CREATE INDEX IF NOT EXISTS idx_entries_timestamp ON entries(timestamp);
                 PRAGMA user_version = 2;",
            )?;
        }

        Ok(())
    }

    // --- Row mapping helpers ---

    fn product_from_row(row: &rusqlite::Row) -> rusqlite::Result<Product> {
        Ok(Product {
            id: row.get(0)?,
            name: row.get(1)?,
            kcal_per_100: row.get(2)?,
            protein_per_100: row.get(3)?,
            fat_per_100: row.get(4)?,
            carb_per_100: row.get(5)?,
            created_at: millis_to_datetime(6, row.get(6)?)?,
        })
    }

    fn entry_from_row(row: &rusqlite::Row) -> rusqlite::Result<Entry> {
        Ok(Entry {
            id: row.get(0)?,
            name: row.get(1)?,
            weight: row.get(2)?,
            kcal: row.get(3)?,
            protein: row.get(4)?,
            fat: row.get(5)?,
            carb: row.get(6)?,
            timestamp: millis_to_datetime(7, row.get(7)?)?,
        })
    }

    // --- Products ---

    pub fn add_product(&self, product: &NewProduct) -> Result<Product> {
        let now = Utc::now();
        self.conn.execute(
            "INSERT INTO products (name, kcal_per_100, protein_per_100, fat_per_100, carb_per_100, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                product.name,
                product.kcal_per_100,
                product.protein_per_100,
                product.fat_per_100,
                product.carb_per_100,
                now.timestamp_millis(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(id, name = %product.name, "product added");
        self.get_product(id)?.context("Product not found after insert")
    }

    /// Inserts or replaces the product stored under `product.id`.
    pub fn put_product(&self, product: &Product) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO products (id, name, kcal_per_100, protein_per_100, fat_per_100, carb_per_100, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                kcal_per_100 = excluded.kcal_per_100,
                protein_per_100 = excluded.protein_per_100,
                fat_per_100 = excluded.fat_per_100,
                carb_per_100 = excluded.carb_per_100,
                created_at = excluded.created_at",
            params![
                product.id,
                product.name,
                product.kcal_per_100,
                product.protein_per_100,
                product.fat_per_100,
                product.carb_per_100,
                product.created_at.timestamp_millis(),
            ],
        )?;
        debug!(id = product.id, "product stored");
        Ok(product.id)
    }

    pub fn get_product(&self, id: i64) -> Result<Option<Product>> {
        let product = self
            .conn
            .query_row(
                "SELECT id, name, kcal_per_100, protein_per_100, fat_per_100, carb_per_100, created_at
                 FROM products WHERE id = ?1",
                params![id],
                Self::product_from_row,
            )
            .optional()?;
        Ok(product)
    }

    pub fn get_all_products(&self) -> Result<Vec<Product>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, kcal_per_100, protein_per_100, fat_per_100, carb_per_100, created_at
             FROM products ORDER BY id",
        )?;
        let products = stmt
            .query_map([], Self::product_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(products)
    }

    pub fn delete_product(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM products WHERE id = ?1", params![id])?;
        debug!(id, deleted = rows > 0, "product delete");
        Ok(rows > 0)
    }

    // --- Entries ---

    pub fn add_entry(&self, entry: &NewEntry) -> Result<Entry> {
        self.conn.execute(
            "INSERT INTO entries (name, weight, kcal, protein, fat, carb, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                entry.name,
                entry.weight,
                entry.kcal,
                entry.protein,
                entry.fat,
                entry.carb,
                entry.timestamp.timestamp_millis(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(id, name = %entry.name, "entry added");
        self.get_entry(id)?.context("Entry not found after insert")
    }

    /// Inserts or replaces the entry stored under `entry.id`.
    pub fn put_entry(&self, entry: &Entry) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO entries (id, name, weight, kcal, protein, fat, carb, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                weight = excluded.weight,
                kcal = excluded.kcal,
                protein = excluded.protein,
                fat = excluded.fat,
                carb = excluded.carb,
                timestamp = excluded.timestamp",
            params![
                entry.id,
                entry.name,
                entry.weight,
                entry.kcal,
                entry.protein,
                entry.fat,
                entry.carb,
                entry.timestamp.timestamp_millis(),
            ],
        )?;
        debug!(id = entry.id, "entry stored");
        Ok(entry.id)
    }

    pub fn get_entry(&self, id: i64) -> Result<Option<Entry>> {
        let entry = self
            .conn
            .query_row(
                "SELECT id, name, weight, kcal, protein, fat, carb, timestamp
                 FROM entries WHERE id = ?1",
                params![id],
                Self::entry_from_row,
            )
            .optional()?;
        Ok(entry)
    }

    pub fn get_all_entries(&self) -> Result<Vec<Entry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, weight, kcal, protein, fat, carb, timestamp
             FROM entries ORDER BY id",
        )?;
        let entries = stmt
            .query_map([], Self::entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn delete_entry(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM entries WHERE id = ?1", params![id])?;
        debug!(id, deleted = rows > 0, "entry delete");
        Ok(rows > 0)
    }

    // --- Settings ---

    pub fn set_setting(&self, key: SettingKey, value: &Value) -> Result<()> {
        let text = serde_json::to_string(value)?;
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key.as_str(), text],
        )?;
        debug!(key = %key, value = %text, "setting stored");
        Ok(())
    }

    /// Returns the stored value, or `None` when the key is absent. A value that
    /// is not valid JSON is treated as a plain string.
    pub fn get_setting(&self, key: SettingKey) -> Result<Option<Value>> {
        let text: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(text.map(|t| serde_json::from_str(&t).unwrap_or(Value::String(t))))
    }

    pub fn delete_setting(&self, key: SettingKey) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM settings WHERE key = ?1", params![key.as_str()])?;
        Ok(rows > 0)
    }

    /// Seeds the default for every key that has never been stored.
    ///
    /// Returns the number of keys seeded.
    pub fn init_default_settings(&self) -> Result<usize> {
        let mut seeded = 0;
        for key in SettingKey::ALL {
            if self.get_setting(key)?.is_none() {
                self.set_setting(key, &key.default_value())?;
                seeded += 1;
            }
        }
        if seeded > 0 {
            debug!(seeded, "default settings seeded");
        }
        Ok(seeded)
    }

    pub fn load_settings(&self) -> Result<Settings> {
        Settings::from_lookup(|key| self.get_setting(key))
    }
}

fn millis_to_datetime(idx: usize, millis: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            format!("timestamp out of range: {millis}").into(),
        )
    })
}
