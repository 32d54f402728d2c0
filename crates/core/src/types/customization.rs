//! Storefront appearance document.
//!
//! Stored verbatim inside the store document under `customization`. Every
//! section is `#[serde(default)]` so older or partial documents (and preview
//! overrides) still deserialize.

use serde::{Deserialize, Serialize};

/// Full appearance configuration of a storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreCustomization {
    pub colors: ColorScheme,
    pub fonts: Fonts,
    pub layout: Layout,
    pub homepage: Homepage,
    pub pages: PageToggles,
    pub branding: Branding,
    pub effects: Effects,
}

/// Colors chosen on the application form; the rest of the palette keeps
/// its defaults until the merchant customizes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandColors {
    pub primary: String,
    pub secondary: String,
    pub background: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColorScheme {
    pub primary: String,
    pub secondary: String,
    pub background: String,
    pub text: String,
    pub accent: String,
    pub header_background: String,
    pub footer_background: String,
    pub card_background: String,
    pub border_color: String,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            primary: "#2563eb".to_owned(),
            secondary: "#64748b".to_owned(),
            background: "#ffffff".to_owned(),
            text: "#1e293b".to_owned(),
            accent: "#3b82f6".to_owned(),
            header_background: "#ffffff".to_owned(),
            footer_background: "#f8fafc".to_owned(),
            card_background: "#ffffff".to_owned(),
            border_color: "#e5e7eb".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Fonts {
    pub heading: String,
    pub body: String,
    pub size: FontSizes,
}

impl Default for Fonts {
    fn default() -> Self {
        Self {
            heading: "Cairo".to_owned(),
            body: "Cairo".to_owned(),
            size: FontSizes::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FontSizes {
    pub small: String,
    pub medium: String,
    pub large: String,
    pub xlarge: String,
}

impl Default for FontSizes {
    fn default() -> Self {
        Self {
            small: "14px".to_owned(),
            medium: "16px".to_owned(),
            large: "18px".to_owned(),
            xlarge: "24px".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HeaderStyle {
    #[default]
    Modern,
    Classic,
    Minimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FooterStyle {
    Simple,
    #[default]
    Detailed,
    Compact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContainerWidth {
    Narrow,
    #[default]
    Normal,
    Wide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BorderRadius {
    None,
    Small,
    #[default]
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Spacing {
    Compact,
    #[default]
    Normal,
    Relaxed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Layout {
    pub header_style: HeaderStyle,
    pub footer_style: FooterStyle,
    pub product_grid_columns: u8,
    pub container_width: ContainerWidth,
    pub border_radius: BorderRadius,
    pub spacing: Spacing,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            header_style: HeaderStyle::default(),
            footer_style: FooterStyle::default(),
            product_grid_columns: 4,
            container_width: ContainerWidth::default(),
            border_radius: BorderRadius::default(),
            spacing: Spacing::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct HeroText {
    pub title: String,
    pub subtitle: String,
    pub button_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(clippy::struct_excessive_bools)]
pub struct Homepage {
    pub show_hero_slider: bool,
    pub show_featured_products: bool,
    pub show_categories: bool,
    pub show_newsletter: bool,
    pub show_testimonials: bool,
    pub show_stats: bool,
    pub show_brands: bool,
    pub hero_images: Vec<String>,
    pub hero_texts: Vec<HeroText>,
    pub sections_order: Vec<String>,
}

impl Default for Homepage {
    fn default() -> Self {
        Self {
            show_hero_slider: true,
            show_featured_products: true,
            show_categories: true,
            show_newsletter: true,
            show_testimonials: false,
            show_stats: true,
            show_brands: false,
            hero_images: Vec::new(),
            hero_texts: Vec::new(),
            sections_order: ["hero", "categories", "featured", "stats"]
                .map(str::to_owned)
                .to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(clippy::struct_excessive_bools)]
pub struct PageToggles {
    pub enable_blog: bool,
    pub enable_reviews: bool,
    pub enable_wishlist: bool,
    pub enable_compare: bool,
    pub enable_live_chat: bool,
    #[serde(rename = "enableFAQ")]
    pub enable_faq: bool,
    pub enable_about_us: bool,
    pub enable_contact_us: bool,
}

impl Default for PageToggles {
    fn default() -> Self {
        Self {
            enable_blog: false,
            enable_reviews: true,
            enable_wishlist: true,
            enable_compare: false,
            enable_live_chat: false,
            enable_faq: true,
            enable_about_us: true,
            enable_contact_us: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Branding {
    pub logo: String,
    pub favicon: String,
    pub watermark: String,
    pub show_powered_by: bool,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            logo: String::new(),
            favicon: String::new(),
            watermark: String::new(),
            show_powered_by: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(clippy::struct_excessive_bools)]
pub struct Effects {
    pub animations: bool,
    pub transitions: bool,
    pub shadows: bool,
    pub gradients: bool,
}

impl Default for Effects {
    fn default() -> Self {
        Self {
            animations: true,
            transitions: true,
            shadows: true,
            gradients: true,
        }
    }
}

/// Reasons a customization document is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CustomizationError {
    #[error("color {field} must be a hex value like #1e293b, got {value:?}")]
    InvalidColor { field: &'static str, value: String },
    #[error("product grid columns must be between 1 and 6, got {0}")]
    GridColumns(u8),
    #[error("font {field} must be a plain font family name, got {value:?}")]
    InvalidFont { field: &'static str, value: String },
    #[error("font size {field} must be a CSS length like 16px, got {value:?}")]
    InvalidFontSize { field: &'static str, value: String },
}

impl StoreCustomization {
    /// Defaults for a freshly approved store: the applicant's colors plus a
    /// welcome slide naming the store.
    #[must_use]
    pub fn for_new_store(store_name: &str, brand: &BrandColors) -> Self {
        let mut customization = Self::default();
        customization.colors.primary.clone_from(&brand.primary);
        customization.colors.secondary.clone_from(&brand.secondary);
        customization.colors.background.clone_from(&brand.background);
        customization.homepage.hero_texts = vec![HeroText {
            title: format!("مرحباً بكم في {store_name}"),
            subtitle: "أفضل المنتجات بأسعار مميزة".to_owned(),
            button_text: "تسوق الآن".to_owned(),
        }];
        customization
    }

    /// Check colors, fonts and grid size.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), CustomizationError> {
        let c = &self.colors;
        let colors = [
            ("primary", &c.primary),
            ("secondary", &c.secondary),
            ("background", &c.background),
            ("text", &c.text),
            ("accent", &c.accent),
            ("headerBackground", &c.header_background),
            ("footerBackground", &c.footer_background),
            ("cardBackground", &c.card_background),
            ("borderColor", &c.border_color),
        ];
        for (field, value) in colors {
            if !is_hex_color(value) {
                return Err(CustomizationError::InvalidColor {
                    field,
                    value: value.clone(),
                });
            }
        }
        for (field, value) in [("heading", &self.fonts.heading), ("body", &self.fonts.body)] {
            if !is_font_family(value) {
                return Err(CustomizationError::InvalidFont {
                    field,
                    value: value.clone(),
                });
            }
        }
        let s = &self.fonts.size;
        let sizes = [
            ("small", &s.small),
            ("medium", &s.medium),
            ("large", &s.large),
            ("xlarge", &s.xlarge),
        ];
        for (field, value) in sizes {
            if !is_css_length(value) {
                return Err(CustomizationError::InvalidFontSize {
                    field,
                    value: value.clone(),
                });
            }
        }
        if !(1..=6).contains(&self.layout.product_grid_columns) {
            return Err(CustomizationError::GridColumns(
                self.layout.product_grid_columns,
            ));
        }
        Ok(())
    }
}

/// `#rgb` or `#rrggbb`.
#[must_use]
pub fn is_hex_color(value: &str) -> bool {
    value.strip_prefix('#').is_some_and(|hex| {
        matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
    })
}

const MAX_FONT_NAME: usize = 64;

/// A font family name safe to drop into a stylesheet: letters, digits,
/// spaces, `-` and `_`.
#[must_use]
pub fn is_font_family(value: &str) -> bool {
    !value.trim().is_empty()
        && value.chars().count() <= MAX_FONT_NAME
        && value
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
}

/// A number followed by an optional unit, e.g. `16px`, `1.25rem`, `90%`.
#[must_use]
pub fn is_css_length(value: &str) -> bool {
    let unit_start = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(unit_start);
    number.parse::<f64>().is_ok()
        && matches!(unit, "" | "px" | "rem" | "em" | "%" | "pt")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_document_uses_defaults() {
        let parsed: StoreCustomization =
            serde_json::from_str(r##"{"colors":{"primary":"#FF6B35"},"pages":{"enableFAQ":false}}"##)
                .unwrap();
        assert_eq!(parsed.colors.primary, "#FF6B35");
        assert_eq!(parsed.colors.text, "#1e293b");
        assert!(!parsed.pages.enable_faq);
        assert_eq!(parsed.layout.product_grid_columns, 4);
        assert_eq!(parsed.fonts.heading, "Cairo");
    }

    #[test]
    fn test_for_new_store() {
        let brand = BrandColors {
            primary: "#0F172A".to_owned(),
            secondary: "#3B82F6".to_owned(),
            background: "#FFFFFF".to_owned(),
        };
        let c = StoreCustomization::for_new_store("تقنيات المستقبل", &brand);
        assert_eq!(c.colors.secondary, "#3B82F6");
        assert_eq!(c.homepage.hero_texts.len(), 1);
        assert!(c.homepage.hero_texts[0].title.contains("تقنيات المستقبل"));
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut c = StoreCustomization::default();
        c.colors.accent = "blue".to_owned();
        assert!(matches!(
            c.validate(),
            Err(CustomizationError::InvalidColor { field: "accent", .. })
        ));

        let mut c = StoreCustomization::default();
        c.layout.product_grid_columns = 9;
        assert_eq!(c.validate(), Err(CustomizationError::GridColumns(9)));
    }

    #[test]
    fn test_validate_rejects_unsafe_fonts() {
        let mut c = StoreCustomization::default();
        c.fonts.heading = "Cairo\"; } body { display: none; } /*".to_owned();
        assert!(matches!(
            c.validate(),
            Err(CustomizationError::InvalidFont { field: "heading", .. })
        ));

        let mut c = StoreCustomization::default();
        c.fonts.body = "Noto Sans Arabic".to_owned();
        assert!(c.validate().is_ok());
        c.fonts.body = "خط_عربي".to_owned();
        assert!(c.validate().is_ok());
        c.fonts.body = "  ".to_owned();
        assert!(c.validate().is_err());

        let mut c = StoreCustomization::default();
        c.fonts.size.large = "18px;color:red".to_owned();
        assert!(matches!(
            c.validate(),
            Err(CustomizationError::InvalidFontSize { field: "large", .. })
        ));
    }

    #[test]
    fn test_css_length() {
        assert!(is_css_length("16px"));
        assert!(is_css_length("1.25rem"));
        assert!(is_css_length("90%"));
        assert!(!is_css_length("px"));
        assert!(!is_css_length("16 px"));
    }

    #[test]
    fn test_hex_color() {
        assert!(is_hex_color("#fff"));
        assert!(is_hex_color("#A1b2C3"));
        assert!(!is_hex_color("fff"));
        assert!(!is_hex_color("#ggg"));
        assert!(!is_hex_color("#12345"));
    }
}
