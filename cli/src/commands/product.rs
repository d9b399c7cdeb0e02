use anyhow::Result;
use std::process;

use kcal_core::models::{NewProduct, ProductEdit};
use kcal_core::service::Tracker;

use super::helpers::{json_error, print_product_table};

pub(crate) struct ProductFields {
    pub kcal: Option<f64>,
    pub protein: Option<f64>,
    pub fat: Option<f64>,
    pub carb: Option<f64>,
}

pub(crate) fn cmd_product_add(
    tracker: &Tracker,
    name: &str,
    fields: &ProductFields,
    json: bool,
) -> Result<()> {
    let product = tracker.add_product(&NewProduct::with_macros(
        name,
        fields.kcal,
        fields.protein.unwrap_or(0.0),
        fields.fat.unwrap_or(0.0),
        fields.carb.unwrap_or(0.0),
    ))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&product)?);
    } else {
        let name = &product.name;
        let id = product.id;
        let kcal = product.kcal_per_100;
        println!("Added product: {name}, {kcal:.0} kcal/100g (id: {id})");
    }

    Ok(())
}

/// Unset flags keep their stored value. Without `--kcal`, energy is only
/// recomputed when a macro flag is given.
pub(crate) fn cmd_product_edit(
    tracker: &Tracker,
    id: i64,
    name: Option<String>,
    fields: &ProductFields,
    json: bool,
) -> Result<()> {
    let product = tracker.edit_product(
        id,
        &ProductEdit {
            name,
            kcal_per_100: fields.kcal,
            protein_per_100: fields.protein,
            fat_per_100: fields.fat,
            carb_per_100: fields.carb,
        },
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&product)?);
    } else {
        let name = &product.name;
        let kcal = product.kcal_per_100;
        println!("Updated product {id}: {name}, {kcal:.0} kcal/100g");
    }

    Ok(())
}

pub(crate) fn cmd_product_list(tracker: &Tracker, search: Option<&str>, json: bool) -> Result<()> {
    let products = tracker.search_products(search.unwrap_or_default())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&products)?);
        return Ok(());
    }

    if products.is_empty() {
        eprintln!("No products found");
        process::exit(2);
    }
    print_product_table(&products);

    Ok(())
}

pub(crate) fn cmd_product_delete(tracker: &Tracker, id: i64, json: bool) -> Result<()> {
    if tracker.delete_product(id)? {
        if json {
            println!("{}", serde_json::json!({ "deleted": id }));
        } else {
            println!("Deleted product {id}");
        }
    } else {
        if json {
            println!("{}", json_error(&format!("Product {id} not found")));
        } else {
            eprintln!("Product {id} not found");
        }
        process::exit(2);
    }

    Ok(())
}
