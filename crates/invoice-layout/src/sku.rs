//! SKU suggestion for catalog products
//!
//! A SKU is an uppercase prefix built from the product name followed by a
//! three digit counter: "3D Printed Phone Stand" becomes `DPPS-001`.

use crate::model::present;
use crate::Product;

const FALLBACK_PREFIX: &str = "SKU";

/// First ASCII letter of each word of `name`, uppercased
///
/// Words are separated by whitespace, `-` and `_`; words without letters
/// are skipped.
pub fn sku_prefix(name: &str) -> String {
    let prefix: String = name
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter_map(|word| word.chars().find(char::is_ascii_alphabetic))
        .map(|letter| letter.to_ascii_uppercase())
        .collect();

    if prefix.is_empty() {
        FALLBACK_PREFIX.to_string()
    } else {
        prefix
    }
}

/// Counter of an existing SKU if it belongs to `prefix`
fn sku_counter(sku: &str, prefix: &str) -> Option<u32> {
    let rest = sku.trim().strip_prefix(prefix)?.strip_prefix('-')?;
    let last = rest.rsplit('-').next()?;
    let digits: String = last.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Next free SKU for a product name
///
/// The counter is one above the highest numeric counter among `existing`
/// SKUs with the same prefix.
pub fn suggest_sku<I, S>(name: &str, existing: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let prefix = sku_prefix(name);
    let highest = existing
        .into_iter()
        .filter_map(|sku| sku_counter(sku.as_ref(), &prefix))
        .max()
        .unwrap_or(0);

    format!("{prefix}-{:03}", highest.saturating_add(1))
}

/// Give every product without a SKU a fresh one
///
/// Products are visited in id order and each new SKU is taken into
/// account for the next suggestion.
///
/// # Returns
/// `(product id, assigned SKU)` pairs in assignment order
pub fn assign_missing_skus(products: &mut [Product]) -> Vec<(i64, String)> {
    let mut taken: Vec<String> = products
        .iter()
        .filter_map(|product| present(&product.sku).map(str::to_string))
        .collect();

    let mut order: Vec<usize> = (0..products.len()).collect();
    order.sort_by_key(|&index| products[index].id);

    let mut assigned = Vec::new();
    for index in order {
        let product = &mut products[index];
        if present(&product.sku).is_some() {
            continue;
        }
        let sku = suggest_sku(&product.name, &taken);
        product.sku = Some(sku.clone());
        taken.push(sku.clone());
        assigned.push((product.id, sku));
    }
    assigned
}
