//! Typed user settings with their persisted camelCase keys and defaults.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde_json::Value;

use crate::models::Goals;

/// Keys of the settings collection, spelled as they are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    GoalKcal,
    GoalProt,
    GoalFat,
    GoalCarb,
    DayStartHour,
    DarkTheme,
    SpecRecs,
}

impl SettingKey {
    pub const ALL: [SettingKey; 7] = [
        SettingKey::GoalKcal,
        SettingKey::GoalProt,
        SettingKey::GoalFat,
        SettingKey::GoalCarb,
        SettingKey::DayStartHour,
        SettingKey::DarkTheme,
        SettingKey::SpecRecs,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::GoalKcal => "goalKcal",
            SettingKey::GoalProt => "goalProt",
            SettingKey::GoalFat => "goalFat",
            SettingKey::GoalCarb => "goalCarb",
            SettingKey::DayStartHour => "dayStartHour",
            SettingKey::DarkTheme => "darkTheme",
            SettingKey::SpecRecs => "specRecs",
        }
    }

    #[must_use]
    pub fn default_value(self) -> Value {
        let defaults = Settings::default();
        match self {
            SettingKey::GoalKcal => Value::from(defaults.goal_kcal),
            SettingKey::GoalProt => Value::from(defaults.goal_prot),
            SettingKey::GoalFat => Value::from(defaults.goal_fat),
            SettingKey::GoalCarb => Value::from(defaults.goal_carb),
            SettingKey::DayStartHour => Value::from(defaults.day_start_hour),
            SettingKey::DarkTheme => Value::from(defaults.dark_theme),
            SettingKey::SpecRecs => Value::from(defaults.spec_recs),
        }
    }

    /// Parses user input for this key into the value that gets stored.
    ///
    /// Goals are clamped to be non-negative and the day start hour to 0..=23.
    pub fn parse_value(self, input: &str) -> Result<Value> {
        let input = input.trim();
        match self {
            SettingKey::GoalKcal
            | SettingKey::GoalProt
            | SettingKey::GoalFat
            | SettingKey::GoalCarb => {
                let n: i64 = input
                    .parse()
                    .with_context(|| format!("Invalid value for {self}: '{input}'"))?;
                Ok(Value::from(n.max(0)))
            }
            SettingKey::DayStartHour => {
                let n: i64 = input
                    .parse()
                    .with_context(|| format!("Invalid value for {self}: '{input}'"))?;
                Ok(Value::from(clamp_hour(n)))
            }
            SettingKey::DarkTheme | SettingKey::SpecRecs => match input {
                "true" | "on" | "1" => Ok(Value::Bool(true)),
                "false" | "off" | "0" => Ok(Value::Bool(false)),
                _ => bail!("Invalid value for {self}: '{input}'. Use true or false"),
            },
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        SettingKey::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .with_context(|| {
                let known: Vec<&str> = SettingKey::ALL.iter().map(|k| k.as_str()).collect();
                format!("Unknown setting '{s}'. Known: {}", known.join(", "))
            })
    }
}

/// User preferences, loaded once and passed explicitly to every computation
/// that depends on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub goal_kcal: i64,
    pub goal_prot: i64,
    pub goal_fat: i64,
    pub goal_carb: i64,
    pub day_start_hour: u32,
    pub dark_theme: bool,
    pub spec_recs: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            goal_kcal: 2000,
            goal_prot: 120,
            goal_fat: 70,
            goal_carb: 220,
            day_start_hour: 3,
            dark_theme: false,
            spec_recs: false,
        }
    }
}

impl Settings {
    /// Builds settings from stored values; missing or malformed keys fall
    /// back to their defaults.
    pub fn from_lookup<F>(mut lookup: F) -> Result<Self>
    where
        F: FnMut(SettingKey) -> Result<Option<Value>>,
    {
        let defaults = Settings::default();
        let mut int = |key: SettingKey, default: i64| -> Result<i64> {
            Ok(match lookup(key)? {
                Some(v) => v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)).unwrap_or_else(|| {
                    tracing::warn!(key = %key, value = %v, "malformed setting, using default");
                    default
                }),
                None => default,
            })
        };
        let goal_kcal = int(SettingKey::GoalKcal, defaults.goal_kcal)?.max(0);
        let goal_prot = int(SettingKey::GoalProt, defaults.goal_prot)?.max(0);
        let goal_fat = int(SettingKey::GoalFat, defaults.goal_fat)?.max(0);
        let goal_carb = int(SettingKey::GoalCarb, defaults.goal_carb)?.max(0);
        let day_start_hour = clamp_hour(int(
            SettingKey::DayStartHour,
            i64::from(defaults.day_start_hour),
        )?);

        let mut flag = |key: SettingKey, default: bool| -> Result<bool> {
            Ok(match lookup(key)? {
                Some(v) => v.as_bool().unwrap_or_else(|| {
                    tracing::warn!(key = %key, value = %v, "malformed setting, using default");
                    default
                }),
                None => default,
            })
        };
        let dark_theme = flag(SettingKey::DarkTheme, defaults.dark_theme)?;
        let spec_recs = flag(SettingKey::SpecRecs, defaults.spec_recs)?;

        Ok(Self {
            goal_kcal,
            goal_prot,
            goal_fat,
            goal_carb,
            day_start_hour,
            dark_theme,
            spec_recs,
        })
    }

    #[must_use]
    pub fn goals(&self) -> Goals {
        Goals {
            kcal: self.goal_kcal,
            protein: self.goal_prot,
            fat: self.goal_fat,
            carb: self.goal_carb,
        }
    }
}

#[allow(clippy::cast_sign_loss)]
fn clamp_hour(hour: i64) -> u32 {
    hour.clamp(0, 23) as u32
}
