mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use crate::commands::{
    ExportKind, ProductFields, RangeArgs, cmd_add, cmd_delete, cmd_edit, cmd_export,
    cmd_import_products, cmd_product_add, cmd_product_delete, cmd_product_edit, cmd_product_list,
    cmd_settings_set, cmd_settings_show, cmd_stats, cmd_today, cmd_use,
};
use crate::config::Config;
use kcal_core::chart::{ChartOptions, SeriesVisibility};
use kcal_core::models::{EntryEdit, Per100};
use kcal_core::service::Tracker;

#[derive(Parser)]
#[command(
    name = "kcal",
    version,
    about = "An offline calorie and macronutrient tracker"
)]
struct Cli {
    /// Database file (default: platform data directory)
    #[arg(long, global = true, env = "KCAL_DB")]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show today's entries, totals and goal progress
    Today {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log an entry from per-100g values
    Add {
        /// Entry name
        name: String,
        /// Portion weight in grams
        weight: f64,
        /// kcal per 100g
        #[arg(long, default_value = "0")]
        kcal: f64,
        /// Protein per 100g
        #[arg(long, default_value = "0")]
        protein: f64,
        /// Fat per 100g
        #[arg(long, default_value = "0")]
        fat: f64,
        /// Carbs per 100g
        #[arg(long, default_value = "0")]
        carb: f64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log an entry from a library product
    Use {
        /// Product ID
        product_id: i64,
        /// Portion weight in grams
        weight: f64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit a logged entry (unset values keep the current per-100g figures)
    Edit {
        /// Entry ID
        entry_id: i64,
        #[arg(long)]
        name: Option<String>,
        /// Portion weight in grams
        #[arg(long)]
        weight: Option<f64>,
        /// kcal per 100g
        #[arg(long)]
        kcal: Option<f64>,
        /// Protein per 100g
        #[arg(long)]
        protein: Option<f64>,
        /// Fat per 100g
        #[arg(long)]
        fat: Option<f64>,
        /// Carbs per 100g
        #[arg(long)]
        carb: Option<f64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a logged entry
    Delete {
        /// Entry ID
        entry_id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage the product library
    Product {
        #[command(subcommand)]
        command: ProductCommands,
    },
    /// Import data from CSV
    Import {
        #[command(subcommand)]
        command: ImportCommands,
    },
    /// Export data as semicolon-separated CSV
    Export {
        #[command(subcommand)]
        command: ExportCommands,
    },
    /// Per-day totals over a date range, optionally as an SVG chart
    Stats {
        /// First date (YYYY-MM-DD, today, yesterday)
        #[arg(long)]
        from: Option<String>,
        /// Last date (YYYY-MM-DD, today, yesterday)
        #[arg(long)]
        to: Option<String>,
        /// Range preset: 7, 30, month, last-month (default: 7)
        #[arg(long, conflicts_with_all = ["from", "to"])]
        preset: Option<String>,
        #[arg(long)]
        hide_kcal: bool,
        #[arg(long)]
        hide_protein: bool,
        #[arg(long)]
        hide_fat: bool,
        #[arg(long)]
        hide_carb: bool,
        /// Label chart points with their values
        #[arg(long)]
        values: bool,
        /// Write the chart to this SVG file
        #[arg(long)]
        chart: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or change settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
}

#[derive(Subcommand)]
enum ProductCommands {
    /// Add a product (kcal is computed from macros when omitted)
    Add {
        /// Product name
        name: String,
        /// kcal per 100g
        #[arg(long)]
        kcal: Option<f64>,
        /// Protein per 100g
        #[arg(long)]
        protein: Option<f64>,
        /// Fat per 100g
        #[arg(long)]
        fat: Option<f64>,
        /// Carbs per 100g
        #[arg(long)]
        carb: Option<f64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit a product
    Edit {
        /// Product ID
        id: i64,
        #[arg(long)]
        name: Option<String>,
        /// kcal per 100g (recomputed when omitted and a macro changes)
        #[arg(long)]
        kcal: Option<f64>,
        /// Protein per 100g
        #[arg(long)]
        protein: Option<f64>,
        /// Fat per 100g
        #[arg(long)]
        fat: Option<f64>,
        /// Carbs per 100g
        #[arg(long)]
        carb: Option<f64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List or search products
    List {
        /// Case-insensitive name filter
        #[arg(short, long)]
        search: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a product
    Delete {
        /// Product ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ImportCommands {
    /// Import products from a semicolon-separated CSV file
    Products {
        /// Path to the CSV file
        file: PathBuf,
        /// Import valid rows without asking
        #[arg(short, long)]
        yes: bool,
        /// Output as JSON (without --yes nothing is imported)
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ExportCommands {
    /// Export the product library
    Products {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export the full entry history
    History {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Show all settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set a setting: goalKcal, goalProt, goalFat, goalCarb, dayStartHour, darkTheme, specRecs
    Set {
        key: String,
        /// New value; `goalKcal auto` derives kcal from the macro goals
        value: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.db.as_deref())?;
    let tracker = Tracker::open(&config.db_path)?;

    match cli.command {
        Commands::Today { json } => cmd_today(&tracker, json),
        Commands::Add {
            name,
            weight,
            kcal,
            protein,
            fat,
            carb,
            json,
        } => {
            let per_100 = Per100 {
                kcal,
                protein,
                fat,
                carb,
            };
            cmd_add(&tracker, &name, weight, per_100, json)
        }
        Commands::Use {
            product_id,
            weight,
            json,
        } => cmd_use(&tracker, product_id, weight, json),
        Commands::Edit {
            entry_id,
            name,
            weight,
            kcal,
            protein,
            fat,
            carb,
            json,
        } => {
            let edit = EntryEdit {
                name,
                weight,
                kcal_per_100: kcal,
                protein_per_100: protein,
                fat_per_100: fat,
                carb_per_100: carb,
            };
            cmd_edit(&tracker, entry_id, &edit, json)
        }
        Commands::Delete { entry_id, json } => cmd_delete(&tracker, entry_id, json),
        Commands::Product { command } => match command {
            ProductCommands::Add {
                name,
                kcal,
                protein,
                fat,
                carb,
                json,
            } => {
                let fields = ProductFields {
                    kcal,
                    protein,
                    fat,
                    carb,
                };
                cmd_product_add(&tracker, &name, &fields, json)
            }
            ProductCommands::Edit {
                id,
                name,
                kcal,
                protein,
                fat,
                carb,
                json,
            } => {
                let fields = ProductFields {
                    kcal,
                    protein,
                    fat,
                    carb,
                };
                cmd_product_edit(&tracker, id, name, &fields, json)
            }
            ProductCommands::List { search, json } => {
                cmd_product_list(&tracker, search.as_deref(), json)
            }
            ProductCommands::Delete { id, json } => cmd_product_delete(&tracker, id, json),
        },
        Commands::Import { command } => match command {
            ImportCommands::Products { file, yes, json } => {
                cmd_import_products(&tracker, &file, yes, json)
            }
        },
        Commands::Export { command } => match command {
            ExportCommands::Products { output } => {
                cmd_export(&tracker, ExportKind::Products, output.as_deref())
            }
            ExportCommands::History { output } => {
                cmd_export(&tracker, ExportKind::History, output.as_deref())
            }
        },
        Commands::Stats {
            from,
            to,
            preset,
            hide_kcal,
            hide_protein,
            hide_fat,
            hide_carb,
            values,
            chart,
            json,
        } => {
            let args = RangeArgs { from, to, preset };
            let options = ChartOptions {
                visible: SeriesVisibility {
                    kcal: !hide_kcal,
                    protein: !hide_protein,
                    fat: !hide_fat,
                    carb: !hide_carb,
                },
                show_values: values,
            };
            cmd_stats(&tracker, &args, &options, chart.as_deref(), json)
        }
        Commands::Settings { command } => match command {
            SettingsCommands::Show { json } => cmd_settings_show(&tracker, json),
            SettingsCommands::Set { key, value, json } => {
                cmd_settings_set(&tracker, &key, &value, json)
            }
        },
    }
}
