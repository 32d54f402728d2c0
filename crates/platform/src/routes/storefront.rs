//! Customer-facing storefront pages.
//!
//! `GET /store/{key}` renders HTML and `GET /api/store/{key}` returns the
//! same page as JSON. Both accept the catalog filters and the preview flags
//! on the query string.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use bazaar_core::{BorderRadius, ContainerWidth, CurrencyCode, StoreCustomization};

use crate::error::{AppError, Result};
use crate::middleware::OptionalUser;
use crate::models::{Category, Product};
use crate::services::resolution::PreviewQuery;
use crate::services::storefront::{CatalogQuery, ResolvedStore, StorefrontPage};
use crate::state::AppState;

// =============================================================================
// View Types
// =============================================================================

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductCard {
    pub id: String,
    pub name: String,
    pub price: String,
    pub original_price: Option<String>,
    /// e.g. `20` for a "-20%" badge.
    pub discount_percent: Option<String>,
    pub image: Option<String>,
    pub rating: String,
    pub in_stock: bool,
}

impl ProductCard {
    fn new(product: &Product, currency: CurrencyCode) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: currency.format(product.price),
            original_price: product
                .original_price
                .filter(|original| *original > product.price)
                .map(|original| currency.format(original)),
            discount_percent: product.discount_percent().map(|p| p.to_string()),
            image: product.images.first().cloned(),
            rating: format!("{:.1}", product.rating),
            in_stock: product.stock > 0,
        }
    }
}

/// CSS values derived from the store's customization.
#[derive(Clone)]
pub struct ThemeView {
    pub primary: String,
    pub secondary: String,
    pub background: String,
    pub text: String,
    pub accent: String,
    pub header_background: String,
    pub footer_background: String,
    pub card_background: String,
    pub border_color: String,
    pub heading_font: String,
    pub body_font: String,
    pub columns: u8,
    pub container_width: &'static str,
    pub radius: &'static str,
}

impl From<&StoreCustomization> for ThemeView {
    fn from(c: &StoreCustomization) -> Self {
        Self {
            primary: c.colors.primary.clone(),
            secondary: c.colors.secondary.clone(),
            background: c.colors.background.clone(),
            text: c.colors.text.clone(),
            accent: c.colors.accent.clone(),
            header_background: c.colors.header_background.clone(),
            footer_background: c.colors.footer_background.clone(),
            card_background: c.colors.card_background.clone(),
            border_color: c.colors.border_color.clone(),
            heading_font: c.fonts.heading.clone(),
            body_font: c.fonts.body.clone(),
            columns: c.layout.product_grid_columns.clamp(1, 6),
            container_width: match c.layout.container_width {
                ContainerWidth::Narrow => "960px",
                ContainerWidth::Normal => "1200px",
                ContainerWidth::Wide => "1440px",
            },
            radius: match c.layout.border_radius {
                BorderRadius::None => "0",
                BorderRadius::Small => "4px",
                BorderRadius::Medium => "8px",
                BorderRadius::Large => "16px",
            },
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Storefront home page template.
#[derive(Template, WebTemplate)]
#[template(path = "storefront/home.html")]
pub struct StorefrontTemplate {
    pub key: String,
    pub store_name: String,
    pub description: String,
    pub logo: Option<String>,
    pub theme: ThemeView,
    pub hero_title: Option<String>,
    pub hero_subtitle: Option<String>,
    pub show_featured: bool,
    pub show_categories: bool,
    pub show_powered_by: bool,
    pub preview: bool,
    pub featured: Vec<ProductCard>,
    pub products: Vec<ProductCard>,
    pub categories: Vec<Category>,
    pub search: String,
    pub selected_category: String,
}

impl StorefrontTemplate {
    fn new(key: String, page: &StorefrontPage) -> Self {
        let store = &page.store;
        let customization = &store.customization;
        let currency = store.settings.currency;
        let hero = customization.homepage.hero_texts.first();
        let cards = |products: &[Product]| {
            products
                .iter()
                .map(|p| ProductCard::new(p, currency))
                .collect::<Vec<_>>()
        };

        Self {
            key,
            store_name: store.name.clone(),
            description: store.description.clone(),
            logo: store
                .logo
                .clone()
                .or_else(|| Some(customization.branding.logo.clone()))
                .filter(|l| !l.is_empty()),
            theme: ThemeView::from(customization),
            hero_title: hero.map(|h| h.title.clone()),
            hero_subtitle: hero.map(|h| h.subtitle.clone()),
            show_featured: customization.homepage.show_featured_products && !page.featured.is_empty(),
            show_categories: customization.homepage.show_categories && !page.categories.is_empty(),
            show_powered_by: customization.branding.show_powered_by,
            preview: page.preview,
            featured: cards(&page.featured),
            products: cards(&page.products),
            categories: page.categories.clone(),
            search: page.query.q.clone().unwrap_or_default(),
            selected_category: page.query.category.clone().unwrap_or_default(),
        }
    }
}

/// Store not found page template.
#[derive(Template, WebTemplate)]
#[template(path = "storefront/not_found.html")]
pub struct StoreNotFoundTemplate {
    pub key: String,
}

// =============================================================================
// Handlers
// =============================================================================

async fn load_page(
    state: &AppState,
    key: &str,
    preview: &PreviewQuery,
    viewer: OptionalUser,
    query: CatalogQuery,
) -> Result<Option<StorefrontPage>> {
    let storefront = state.storefront();
    let params = preview.params();
    let viewer = viewer.0.map(|user| user.id);
    let Some(resolved): Option<ResolvedStore> = storefront
        .resolve_store(key, params.as_ref(), viewer.as_ref())
        .await?
    else {
        return Ok(None);
    };
    Ok(Some(storefront.page(resolved, query).await?))
}

/// Render a storefront.
///
/// GET /store/{key}
#[instrument(skip(state, preview, viewer, query))]
pub async fn show_html(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(preview): Query<PreviewQuery>,
    Query(query): Query<CatalogQuery>,
    viewer: OptionalUser,
) -> Result<Response> {
    Ok(
        match load_page(&state, &key, &preview, viewer, query).await? {
            Some(page) => StorefrontTemplate::new(key, &page).into_response(),
            None => (StatusCode::NOT_FOUND, StoreNotFoundTemplate { key }).into_response(),
        },
    )
}

/// The storefront page as JSON.
///
/// GET /api/store/{key}
#[instrument(skip(state, preview, viewer, query))]
pub async fn show_json(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(preview): Query<PreviewQuery>,
    Query(query): Query<CatalogQuery>,
    viewer: OptionalUser,
) -> Result<Json<StorefrontPage>> {
    load_page(&state, &key, &preview, viewer, query)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("store '{key}'")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_theme_from_defaults() {
        let theme = ThemeView::from(&StoreCustomization::default());
        assert_eq!(theme.primary, "#2563eb");
        assert_eq!(theme.columns, 4);
        assert_eq!(theme.container_width, "1200px");
    }

    #[test]
    fn test_product_card_discount_only_when_higher() {
        let json = serde_json::json!({
            "id": "product_1", "storeId": "store_1", "name": "Mug",
            "price": "20", "originalPrice": "25", "images": ["/mug.png"],
            "category": "", "sku": "", "stock": 0, "rating": 4.25,
            "createdAt": "2026-01-01T00:00:00Z", "updatedAt": "2026-01-01T00:00:00Z"
        });
        let mut product: Product = serde_json::from_value(json).unwrap();
        let card = ProductCard::new(&product, CurrencyCode::USD);
        assert!(card.original_price.is_some());
        assert_eq!(card.discount_percent.as_deref(), Some("20"));
        assert_eq!(card.image.as_deref(), Some("/mug.png"));
        assert!(!card.in_stock);

        product.original_price = Some(Decimal::from(10));
        let card = ProductCard::new(&product, CurrencyCode::USD);
        assert!(card.original_price.is_none());
        assert!(card.discount_percent.is_none());
    }
}
