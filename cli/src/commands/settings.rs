use anyhow::Result;
use tabled::{Table, Tabled, settings::Style};

use kcal_core::service::Tracker;
use kcal_core::settings::SettingKey;

pub(crate) fn cmd_settings_show(tracker: &Tracker, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct SettingRow {
        #[tabled(rename = "Key")]
        key: &'static str,
        #[tabled(rename = "Value")]
        value: String,
    }

    let settings = tracker.settings()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&settings)?);
        return Ok(());
    }

    let rows = vec![
        SettingRow {
            key: SettingKey::GoalKcal.as_str(),
            value: settings.goal_kcal.to_string(),
        },
        SettingRow {
            key: SettingKey::GoalProt.as_str(),
            value: settings.goal_prot.to_string(),
        },
        SettingRow {
            key: SettingKey::GoalFat.as_str(),
            value: settings.goal_fat.to_string(),
        },
        SettingRow {
            key: SettingKey::GoalCarb.as_str(),
            value: settings.goal_carb.to_string(),
        },
        SettingRow {
            key: SettingKey::DayStartHour.as_str(),
            value: settings.day_start_hour.to_string(),
        },
        SettingRow {
            key: SettingKey::DarkTheme.as_str(),
            value: settings.dark_theme.to_string(),
        },
        SettingRow {
            key: SettingKey::SpecRecs.as_str(),
            value: settings.spec_recs.to_string(),
        },
    ];

    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");

    Ok(())
}

pub(crate) fn cmd_settings_set(tracker: &Tracker, key: &str, value: &str, json: bool) -> Result<()> {
    let key: SettingKey = key.parse()?;
    let stored = tracker.set_setting(key, value)?;

    if json {
        println!("{}", serde_json::json!({ "key": key.as_str(), "value": stored }));
    } else {
        println!("{key} = {stored}");
    }

    Ok(())
}
