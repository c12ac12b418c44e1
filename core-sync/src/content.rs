//! # Product Content Builder
//!
//! Turns a catalog product into the plain-text document stored in the
//! File Search index. The output is deterministic and always ends with the
//! `ID del producto: {id}` line, which search uses to map retrieved passages
//! back to products.

use bridge_traits::catalog::{Product, ProductCatalog, ProductId};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::Result;

static SCRIPT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("script pattern is valid")
});

static STYLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").expect("style pattern is valid")
});

static TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag pattern is valid"));

static PRODUCT_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)ID del producto:\s*(\d+)").expect("product id pattern is valid")
});

/// Remove HTML tags, including the bodies of `<script>` and `<style>` elements
pub fn strip_html(html: &str) -> String {
    let without_scripts = SCRIPT_PATTERN.replace_all(html, "");
    let without_styles = STYLE_PATTERN.replace_all(&without_scripts, "");
    TAG_PATTERN
        .replace_all(&without_styles, "")
        .trim()
        .to_string()
}

/// Build the indexed text for a product
pub fn build_content(product: &Product) -> String {
    let mut lines = vec![
        format!("Nombre del producto: {}", product.name),
        format!("SKU: {}", product.sku),
        format!("Precio: {} {}", product.price, product.currency),
    ];

    if !product.description.is_empty() {
        lines.push(format!("Descripción: {}", strip_html(&product.description)));
    }
    if !product.short_description.is_empty() {
        lines.push(format!(
            "Descripción corta: {}",
            strip_html(&product.short_description)
        ));
    }
    if !product.categories.is_empty() {
        lines.push(format!("Categorías: {}", product.categories.join(", ")));
    }
    if !product.tags.is_empty() {
        lines.push(format!("Etiquetas: {}", product.tags.join(", ")));
    }

    let stock = if product.stock_status.is_in_stock() {
        "En stock"
    } else {
        "Sin stock"
    };
    lines.push(format!("Estado de stock: {}", stock));

    if !product.attributes.is_empty() {
        let attributes = product
            .attributes
            .iter()
            .map(|attr| format!("{}: {}", attr.name, attr.options.join(", ")))
            .collect::<Vec<_>>()
            .join("; ");
        let label = if product.is_variable() {
            "Atributos variables"
        } else {
            "Atributos"
        };
        lines.push(format!("{}: {}", label, attributes));
    }

    lines.push(format!("URL: {}", product.permalink));
    lines.push(format!("ID del producto: {}", product.id));

    lines.join("\n")
}

/// Display name given to a product's remote document
pub fn display_name(product: &Product) -> String {
    format!("{} (ID: {})", product.name, product.id)
}

/// Look the product up and build its content.
///
/// Returns an empty string when the catalog has no such product.
pub async fn build_for_id(catalog: &dyn ProductCatalog, product_id: ProductId) -> Result<String> {
    Ok(catalog
        .get_product(product_id)
        .await?
        .map(|product| build_content(&product))
        .unwrap_or_default())
}

/// Recover the product id from indexed text (first `ID del producto:` line)
pub fn extract_product_id(text: &str) -> Option<ProductId> {
    PRODUCT_ID_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .filter(|id| *id > 0)
        .map(ProductId::new)
}
