//! Catalog listing command.

use std::path::Path;

use ezcentials_core::{ALL_PRODUCTS_SLUG, CatalogError, Language};
use ezcentials_storefront::catalog::{CatalogLoadError, load_catalog};
use thiserror::Error;

/// Errors from the catalog commands.
#[derive(Debug, Error)]
pub enum CatalogCommandError {
    #[error(transparent)]
    Load(#[from] CatalogLoadError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Render a category listing (every product when `category` is `None`).
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded or the category is
/// unknown.
pub fn list(
    catalog_path: &Path,
    category: Option<&str>,
    lang: &str,
) -> Result<Vec<String>, CatalogCommandError> {
    let catalog = load_catalog(catalog_path)?;
    let language = Language::from_code(Some(lang));

    let page = match category {
        None | Some(ALL_PRODUCTS_SLUG) => catalog.all_products_page(language),
        Some(slug) => catalog.category_page(slug, language)?,
    };

    let mut lines = vec![page.document_title()];
    if let Some(message) = page.empty_message(language) {
        lines.push(message.to_string());
    }
    lines.extend(page.products.iter().map(|product| {
        format!(
            "{:<10} {:<40} {}",
            product.id.as_str(),
            product.localized_name(language),
            product.price.display()
        )
    }));
    Ok(lines)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn bundled_catalog() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../storefront/content/catalog.json")
    }

    #[test]
    fn test_list_all() {
        let lines = list(&bundled_catalog(), None, "de").unwrap();
        assert!(lines.len() > 1);
        assert!(lines[1].starts_with("ezc-001"));
    }

    #[test]
    fn test_list_unknown_category() {
        let err = list(&bundled_catalog(), Some("nope"), "de").unwrap_err();
        assert!(matches!(
            err,
            CatalogCommandError::Catalog(CatalogError::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_list_empty_category() {
        let lines = list(&bundled_catalog(), Some("geschenksets"), "fr").unwrap();
        assert_eq!(lines.len(), 2);
    }
}
