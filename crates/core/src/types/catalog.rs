//! Product catalog: categories, products and category page resolution.
//!
//! The catalog is static data. It is loaded once at startup and only read
//! afterwards, so every operation here borrows from it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Price, ProductId};

/// Slug of the pseudo-category that lists every product.
pub const ALL_PRODUCTS_SLUG: &str = "all";

/// Brand suffix appended to every document title.
const BRAND: &str = "EZCENTIALS";

/// Display language of the storefront.
///
/// German is the default; French and English are translations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    De,
    Fr,
    En,
}

impl Language {
    /// Parse a language code, falling back to German for anything unknown.
    #[must_use]
    pub fn from_code(code: Option<&str>) -> Self {
        match code.map(str::to_ascii_lowercase).as_deref() {
            Some("fr") => Self::Fr,
            Some("en") => Self::En,
            _ => Self::De,
        }
    }

    /// Pick the string for this language.
    #[must_use]
    pub const fn pick<'a>(self, de: &'a str, fr: &'a str, en: &'a str) -> &'a str {
        match self {
            Self::De => de,
            Self::Fr => fr,
            Self::En => en,
        }
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub slug: String,
    /// German name.
    pub name: String,
    pub name_fr: String,
    pub name_en: String,
}

impl Category {
    /// Category name in the given language.
    #[must_use]
    pub fn localized_name(&self, language: Language) -> &str {
        language.pick(&self.name, &self.name_fr, &self.name_en)
    }
}

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub slug: String,
    /// Slug of the category this product belongs to.
    pub category: String,
    /// German name.
    pub name: String,
    pub name_fr: String,
    pub name_en: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    #[serde(default)]
    pub image: Option<String>,
}

impl Product {
    /// Product name in the given language.
    #[must_use]
    pub fn localized_name(&self, language: Language) -> &str {
        language.pick(&self.name, &self.name_fr, &self.name_en)
    }
}

/// Errors raised while resolving catalog pages.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// No category with this slug exists.
    #[error("unknown category: {0}")]
    UnknownCategory(String),
}

/// A resolved category listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryPage<'a> {
    pub slug: String,
    pub title: String,
    pub products: Vec<&'a Product>,
}

impl CategoryPage<'_> {
    /// The `<title>` of the page.
    #[must_use]
    pub fn document_title(&self) -> String {
        format!("{} | {BRAND}", self.title)
    }

    /// Message shown instead of the grid when the listing is empty.
    #[must_use]
    pub fn empty_message(&self, language: Language) -> Option<&'static str> {
        self.products.is_empty().then(|| {
            language.pick(
                "Keine Produkte in dieser Kategorie gefunden.",
                "Aucun produit trouvé dans cette catégorie.",
                "No products found in this category.",
            )
        })
    }
}

/// The product catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
}

impl Catalog {
    /// Look up a category by slug.
    #[must_use]
    pub fn category(&self, slug: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.slug == slug)
    }

    /// Look up a product by id.
    #[must_use]
    pub fn product(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }

    /// Products in a category, sorted by slug for a stable order.
    ///
    /// The `all` slug selects every product.
    #[must_use]
    pub fn products_by_category(&self, slug: &str) -> Vec<&Product> {
        let mut products: Vec<&Product> = self
            .products
            .iter()
            .filter(|p| slug == ALL_PRODUCTS_SLUG || p.category == slug)
            .collect();
        products.sort_by(|a, b| a.slug.cmp(&b.slug));
        products
    }

    /// Every product, sorted by id.
    #[must_use]
    pub fn all_products(&self) -> Vec<&Product> {
        let mut products: Vec<&Product> = self.products.iter().collect();
        products.sort_by(|a, b| a.id.cmp(&b.id));
        products
    }

    /// Localized page heading for a category slug.
    #[must_use]
    pub fn page_title(&self, slug: &str, language: Language) -> String {
        if slug == ALL_PRODUCTS_SLUG {
            return language
                .pick("Alle Produkte", "Tous les produits", "All Products")
                .to_string();
        }
        self.category(slug).map_or_else(
            || "Produkte".to_string(),
            |c| c.localized_name(language).to_string(),
        )
    }

    /// Resolve a category listing page.
    ///
    /// A known category without products resolves to an empty page; an
    /// unknown slug with no matching products is not found.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownCategory`] for slugs that are neither
    /// a category nor `all` and match no product.
    pub fn category_page(
        &self,
        slug: &str,
        language: Language,
    ) -> Result<CategoryPage<'_>, CatalogError> {
        let products = self.products_by_category(slug);
        if products.is_empty() && slug != ALL_PRODUCTS_SLUG && self.category(slug).is_none() {
            return Err(CatalogError::UnknownCategory(slug.to_string()));
        }
        Ok(CategoryPage {
            slug: slug.to_string(),
            title: self.page_title(slug, language),
            products,
        })
    }

    /// The dedicated "all products" page, sorted by id.
    #[must_use]
    pub fn all_products_page(&self, language: Language) -> CategoryPage<'_> {
        CategoryPage {
            slug: ALL_PRODUCTS_SLUG.to_string(),
            title: self.page_title(ALL_PRODUCTS_SLUG, language),
            products: self.all_products(),
        }
    }
}
