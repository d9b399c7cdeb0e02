//! Records, nutrient values and the edit types applied to them.

use anyhow::{Result, bail};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Energy density of protein and carbohydrate, kcal per gram.
pub const KCAL_PER_G_PROTEIN: f64 = 4.0;
pub const KCAL_PER_G_CARB: f64 = 4.0;
/// Energy density of fat, kcal per gram.
pub const KCAL_PER_G_FAT: f64 = 9.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub kcal_per_100: f64,
    pub protein_per_100: f64,
    pub fat_per_100: f64,
    pub carb_per_100: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub kcal_per_100: f64,
    pub protein_per_100: f64,
    pub fat_per_100: f64,
    pub carb_per_100: f64,
}

impl NewProduct {
    /// Builds a product, deriving kcal from the macros when `kcal_per_100` is absent.
    #[must_use]
    pub fn with_macros(
        name: &str,
        kcal_per_100: Option<f64>,
        protein_per_100: f64,
        fat_per_100: f64,
        carb_per_100: f64,
    ) -> Self {
        let protein_per_100 = non_negative(protein_per_100);
        let fat_per_100 = non_negative(fat_per_100);
        let carb_per_100 = non_negative(carb_per_100);
        let kcal_per_100 = kcal_per_100.map_or_else(
            || kcal_from_macros(protein_per_100, fat_per_100, carb_per_100),
            non_negative,
        );
        Self {
            name: name.trim().to_string(),
            kcal_per_100,
            protein_per_100,
            fat_per_100,
            carb_per_100,
        }
    }
}

/// Changes to a library product.
///
/// `None` keeps the current value. An unset `kcal_per_100` keeps the stored
/// energy too, unless a macro changes; then it is recomputed from the macros.
#[derive(Debug, Clone, Default)]
pub struct ProductEdit {
    pub name: Option<String>,
    pub kcal_per_100: Option<f64>,
    pub protein_per_100: Option<f64>,
    pub fat_per_100: Option<f64>,
    pub carb_per_100: Option<f64>,
}

impl ProductEdit {
    pub fn apply(&self, product: &Product) -> Result<Product> {
        let name = self.name.as_deref().unwrap_or(&product.name);
        validate_name(name)?;
        let macros_changed = self.protein_per_100.is_some()
            || self.fat_per_100.is_some()
            || self.carb_per_100.is_some();
        let kcal_per_100 = match self.kcal_per_100 {
            Some(kcal) => Some(kcal),
            None if macros_changed => None,
            None => Some(product.kcal_per_100),
        };
        let fields = NewProduct::with_macros(
            name,
            kcal_per_100,
            self.protein_per_100.unwrap_or(product.protein_per_100),
            self.fat_per_100.unwrap_or(product.fat_per_100),
            self.carb_per_100.unwrap_or(product.carb_per_100),
        );
        Ok(Product {
            id: product.id,
            name: fields.name,
            kcal_per_100: fields.kcal_per_100,
            protein_per_100: fields.protein_per_100,
            fat_per_100: fields.fat_per_100,
            carb_per_100: fields.carb_per_100,
            created_at: product.created_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    pub name: String,
    pub weight: f64,
    pub kcal: f64,
    pub protein: f64,
    pub fat: f64,
    pub carb: f64,
    pub timestamp: DateTime<Utc>,
}

impl Entry {
    /// Per-100 g values recovered from the stored totals, rounded the way the
    /// edit form prefills them (kcal to an integer, macros to one decimal).
    #[must_use]
    pub fn per_100(&self) -> Per100 {
        let factor = if self.weight > 0.0 {
            100.0 / self.weight
        } else {
            0.0
        };
        Per100 {
            kcal: (self.kcal * factor).round(),
            protein: round1(self.protein * factor),
            fat: round1(self.fat * factor),
            carb: round1(self.carb * factor),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewEntry {
    pub name: String,
    pub weight: f64,
    pub kcal: f64,
    pub protein: f64,
    pub fat: f64,
    pub carb: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Per100 {
    pub kcal: f64,
    pub protein: f64,
    pub fat: f64,
    pub carb: f64,
}

impl Per100 {
    fn clamped(self) -> Self {
        Self {
            kcal: non_negative(self.kcal),
            protein: non_negative(self.protein),
            fat: non_negative(self.fat),
            carb: non_negative(self.carb),
        }
    }

    /// Absolute totals for `weight` grams.
    #[must_use]
    pub fn scaled(self, weight: f64) -> Nutrients {
        let factor = weight / 100.0;
        Nutrients {
            kcal: self.kcal * factor,
            protein: self.protein * factor,
            fat: self.fat * factor,
            carb: self.carb * factor,
        }
    }
}

impl From<&Product> for Per100 {
    fn from(product: &Product) -> Self {
        Self {
            kcal: product.kcal_per_100,
            protein: product.protein_per_100,
            fat: product.fat_per_100,
            carb: product.carb_per_100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Nutrients {
    pub kcal: f64,
    pub protein: f64,
    pub fat: f64,
    pub carb: f64,
}

impl Nutrients {
    pub fn add(&mut self, other: &Nutrients) {
        self.kcal += other.kcal;
        self.protein += other.protein;
        self.fat += other.fat;
        self.carb += other.carb;
    }
}

impl From<&Entry> for Nutrients {
    fn from(entry: &Entry) -> Self {
        Self {
            kcal: entry.kcal,
            protein: entry.protein,
            fat: entry.fat,
            carb: entry.carb,
        }
    }
}

/// A manually typed entry: name, portion weight and per-100 g values.
#[derive(Debug, Clone)]
pub struct ManualEntry {
    pub name: String,
    pub weight: f64,
    pub per_100: Per100,
}

impl ManualEntry {
    pub fn into_new_entry(self, timestamp: DateTime<Utc>) -> Result<NewEntry> {
        validate_name(&self.name)?;
        validate_weight(self.weight)?;
        let totals = self.per_100.clamped().scaled(self.weight);
        Ok(NewEntry {
            name: self.name.trim().to_string(),
            weight: self.weight,
            kcal: totals.kcal,
            protein: totals.protein,
            fat: totals.fat,
            carb: totals.carb,
            timestamp,
        })
    }
}

/// Edit request for a logged entry. Unset fields fall back to the values the
/// edit form would have been prefilled with (see [`Entry::per_100`]).
#[derive(Debug, Clone, Default)]
pub struct EntryEdit {
    pub name: Option<String>,
    pub weight: Option<f64>,
    pub kcal_per_100: Option<f64>,
    pub protein_per_100: Option<f64>,
    pub fat_per_100: Option<f64>,
    pub carb_per_100: Option<f64>,
}

impl EntryEdit {
    /// Produces the replacement record; the original timestamp and id are kept.
    pub fn apply(&self, entry: &Entry) -> Result<Entry> {
        let prefill = entry.per_100();
        let manual = ManualEntry {
            name: self.name.clone().unwrap_or_else(|| entry.name.clone()),
            weight: self.weight.unwrap_or(entry.weight),
            per_100: Per100 {
                kcal: self.kcal_per_100.unwrap_or(prefill.kcal),
                protein: self.protein_per_100.unwrap_or(prefill.protein),
                fat: self.fat_per_100.unwrap_or(prefill.fat),
                carb: self.carb_per_100.unwrap_or(prefill.carb),
            },
        };
        let updated = manual.into_new_entry(entry.timestamp)?;
        Ok(Entry {
            id: entry.id,
            name: updated.name,
            weight: updated.weight,
            kcal: updated.kcal,
            protein: updated.protein,
            fat: updated.fat,
            carb: updated.carb,
            timestamp: entry.timestamp,
        })
    }
}

/// Per-date totals over all entries whose logical day is `date`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedDay {
    pub date: String,
    pub kcal: f64,
    pub prot: f64,
    pub fat: f64,
    pub carb: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Under,
    OnTarget,
    Over,
}

impl GoalStatus {
    /// Below the goal is `Under`; up to 10% above it still counts as on target.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn classify(value: f64, goal: i64) -> Self {
        let goal = goal as f64;
        if value < goal {
            Self::Under
        } else if value <= goal * 1.10 {
            Self::OnTarget
        } else {
            Self::Over
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GoalProgress {
    pub kcal: GoalStatus,
    pub protein: GoalStatus,
    pub fat: GoalStatus,
    pub carb: GoalStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub entries: Vec<Entry>,
    pub totals: Nutrients,
    pub goals: Goals,
    pub progress: GoalProgress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goals {
    pub kcal: i64,
    pub protein: i64,
    pub fat: i64,
    pub carb: i64,
}

impl Goals {
    /// Calories implied by the macro goals, used when no kcal goal is given.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn kcal_from_macros(protein: i64, fat: i64, carb: i64) -> i64 {
        kcal_from_macros(protein as f64, fat as f64, carb as f64).round() as i64
    }
}

#[must_use]
pub fn kcal_from_macros(protein: f64, fat: f64, carb: f64) -> f64 {
    protein * KCAL_PER_G_PROTEIN + fat * KCAL_PER_G_FAT + carb * KCAL_PER_G_CARB
}

pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        bail!("Name cannot be empty");
    }
    Ok(())
}

pub fn validate_weight(weight: f64) -> Result<()> {
    if !weight.is_finite() || weight < 0.0 {
        bail!("Weight must be a non-negative number (got {weight})");
    }
    Ok(())
}

fn non_negative(v: f64) -> f64 {
    if v.is_finite() { v.max(0.0) } else { 0.0 }
}

#[must_use]
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
