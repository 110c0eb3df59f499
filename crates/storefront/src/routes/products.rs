//! Product listing route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use ezcentials_core::{CategoryPage, Language, Price, Product, ProductId};

use crate::error::Result;
use crate::state::AppState;

/// Display language query parameter (`?lang=de|fr|en`).
#[derive(Debug, Default, Deserialize)]
pub struct LanguageQuery {
    pub lang: Option<String>,
}

impl LanguageQuery {
    /// Requested language, defaulting to German.
    #[must_use]
    pub fn language(&self) -> Language {
        Language::from_code(self.lang.as_deref())
    }
}

/// Product display data.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    pub id: ProductId,
    pub slug: String,
    pub category: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub price_display: String,
    pub image: Option<String>,
}

impl ProductView {
    fn new(product: &Product, language: Language) -> Self {
        Self {
            id: product.id.clone(),
            slug: product.slug.clone(),
            category: product.category.clone(),
            name: product.localized_name(language).to_string(),
            description: product.description.clone(),
            price: product.price,
            price_display: product.price.display(),
            image: product.image.clone(),
        }
    }
}

/// Category listing display data.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryPageView {
    pub slug: String,
    pub language: Language,
    pub title: String,
    pub document_title: String,
    /// Set when the listing is empty.
    pub empty_message: Option<&'static str>,
    pub products: Vec<ProductView>,
}

impl CategoryPageView {
    fn new(page: &CategoryPage<'_>, language: Language) -> Self {
        Self {
            slug: page.slug.clone(),
            language,
            title: page.title.clone(),
            document_title: page.document_title(),
            empty_message: page.empty_message(language),
            products: page
                .products
                .iter()
                .map(|p| ProductView::new(p, language))
                .collect(),
        }
    }
}

/// GET /products/all
///
/// Every product, sorted by id.
#[instrument(skip(state))]
pub async fn all(
    State(state): State<AppState>,
    Query(query): Query<LanguageQuery>,
) -> Json<CategoryPageView> {
    let language = query.language();
    let page = state.catalog().all_products_page(language);
    Json(CategoryPageView::new(&page, language))
}

/// GET /products/{category}
///
/// Products of one category, sorted by slug. Unknown categories are 404.
#[instrument(skip(state))]
pub async fn category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<LanguageQuery>,
) -> Result<Json<CategoryPageView>> {
    let language = query.language();
    let page = state.catalog().category_page(&slug, language)?;
    Ok(Json(CategoryPageView::new(&page, language)))
}
