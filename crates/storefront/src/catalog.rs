//! Static product catalog loaded from a JSON file at startup.

use std::collections::HashSet;
use std::path::Path;

use ezcentials_core::Catalog;

/// Load and check the catalog file.
///
/// Products whose category is not listed are kept (they still show up on
/// the "all products" page) but logged.
///
/// # Errors
///
/// Returns `CatalogLoadError` if the file cannot be read or parsed, or if
/// two products share an id.
pub fn load_catalog(path: &Path) -> Result<Catalog, CatalogLoadError> {
    let raw = std::fs::read_to_string(path).map_err(|e| CatalogLoadError::Io(e.to_string()))?;
    let catalog: Catalog =
        serde_json::from_str(&raw).map_err(|e| CatalogLoadError::Parse(e.to_string()))?;

    let mut seen = HashSet::new();
    for product in &catalog.products {
        if !seen.insert(&product.id) {
            return Err(CatalogLoadError::DuplicateProduct(product.id.to_string()));
        }
        if catalog.category(&product.category).is_none() {
            tracing::warn!(
                product = %product.id,
                category = %product.category,
                "Product references an unknown category"
            );
        }
    }

    tracing::info!(
        categories = catalog.categories.len(),
        products = catalog.products.len(),
        "Loaded catalog from {:?}",
        path
    );
    Ok(catalog)
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogLoadError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Duplicate product id: {0}")]
    DuplicateProduct(String),
}
