mod entry;
mod export;
mod helpers;
mod import;
mod product;
mod settings;
mod stats;

pub(crate) use entry::{cmd_add, cmd_delete, cmd_edit, cmd_today, cmd_use};
pub(crate) use export::{ExportKind, cmd_export};
pub(crate) use import::cmd_import_products;
pub(crate) use product::{
    ProductFields, cmd_product_add, cmd_product_delete, cmd_product_edit, cmd_product_list,
};
pub(crate) use settings::{cmd_settings_set, cmd_settings_show};
pub(crate) use stats::{RangeArgs, cmd_stats};
