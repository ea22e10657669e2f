//! Template catalog.
//!
//! A fixed, ordered, read-only list of website templates and their default
//! visual attributes. The catalog never changes during a session; the store
//! consults it to seed colors when a template is selected.
//!
//! Lookups by id are forgiving: an unknown id resolves to the first record,
//! so a selection always lands on a real template.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// Sentinel category that matches every template.
pub const ALL_CATEGORIES: &str = "All";

/// A template's default color palette (hex strings).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub background: String,
    pub text: String,
}

/// One entry in the template catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRecord {
    pub id: String,
    pub name: String,
    pub category: String,
    pub preview_image: String,
    pub features: Vec<String>,
    pub colors: Palette,
}

impl TemplateRecord {
    fn stock(
        id: &str,
        name: &str,
        category: &str,
        features: [&str; 4],
        [primary, secondary, accent, background, text]: [&str; 5],
    ) -> Self {
        Self {
            id: id.to_owned(),
            name: name.to_owned(),
            category: category.to_owned(),
            preview_image: format!("/images/templates/{id}.webp"),
            features: features.iter().map(|f| (*f).to_owned()).collect(),
            colors: Palette {
                primary: primary.to_owned(),
                secondary: secondary.to_owned(),
                accent: accent.to_owned(),
                background: background.to_owned(),
                text: text.to_owned(),
            },
        }
    }
}

/// An ordered, non-empty list of templates.
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    templates: Vec<TemplateRecord>,
}

impl TemplateCatalog {
    /// Build a catalog from an ordered list of records.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Empty`] if `templates` is empty.
    /// - [`CatalogError::DuplicateId`] if two records share an id.
    pub fn new(templates: Vec<TemplateRecord>) -> Result<Self, CatalogError> {
        if templates.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        for t in &templates {
            if !seen.insert(t.id.as_str()) {
                return Err(CatalogError::DuplicateId { id: t.id.clone() });
            }
        }

        Ok(Self { templates })
    }

    /// The stock templates shipped with the product.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            templates: vec![
                TemplateRecord::stock(
                    "modern-business",
                    "Modern Business",
                    "Business",
                    ["Responsive", "Contact Form", "About Section", "Services"],
                    ["#3B82F6", "#10B981", "#8B5CF6", "#F9FAFB", "#1F2937"],
                ),
                TemplateRecord::stock(
                    "creative-portfolio",
                    "Creative Portfolio",
                    "Portfolio",
                    ["Gallery", "Project Showcase", "Skills Section", "Contact Form"],
                    ["#EC4899", "#8B5CF6", "#F59E0B", "#0F172A", "#F1F5F9"],
                ),
                TemplateRecord::stock(
                    "restaurant-cafe",
                    "Restaurant & Cafe",
                    "Food",
                    ["Menu Display", "Reservation Form", "Gallery", "Testimonials"],
                    ["#F59E0B", "#10B981", "#EF4444", "#FFFBEB", "#1F2937"],
                ),
                TemplateRecord::stock(
                    "tech-startup",
                    "Tech Startup",
                    "Technology",
                    ["Feature Showcase", "Pricing Table", "Team Section", "Blog"],
                    ["#6366F1", "#10B981", "#F43F5E", "#0F172A", "#F1F5F9"],
                ),
                TemplateRecord::stock(
                    "ecommerce-store",
                    "E-Commerce Store",
                    "E-Commerce",
                    ["Product Grid", "Shopping Cart", "Product Details", "Checkout"],
                    ["#10B981", "#6366F1", "#F59E0B", "#F9FAFB", "#1F2937"],
                ),
            ],
        }
    }

    /// The first record, used as the fallback for unknown ids.
    #[must_use]
    pub fn first(&self) -> &TemplateRecord {
        // `new` and `builtin` both guarantee at least one record.
        &self.templates[0]
    }

    /// Look up a template by id, falling back to the first record.
    #[must_use]
    pub fn get_by_id(&self, id: &str) -> &TemplateRecord {
        self.find(id).unwrap_or_else(|| self.first())
    }

    /// Strict lookup by id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&TemplateRecord> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Every template, in catalog order.
    #[must_use]
    pub fn all(&self) -> &[TemplateRecord] {
        &self.templates
    }

    /// Templates in a category, in catalog order.
    ///
    /// `None` or the [`ALL_CATEGORIES`] sentinel returns every template.
    #[must_use]
    pub fn by_category(&self, category: Option<&str>) -> Vec<&TemplateRecord> {
        match category {
            None | Some(ALL_CATEGORIES) => self.templates.iter().collect(),
            Some(c) => self.templates.iter().filter(|t| t.category == c).collect(),
        }
    }

    /// [`ALL_CATEGORIES`] followed by each distinct category in order of first appearance.
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        std::iter::once(ALL_CATEGORIES.to_owned())
            .chain(
                self.templates
                    .iter()
                    .filter(|t| seen.insert(t.category.as_str()))
                    .map(|t| t.category.clone()),
            )
            .collect()
    }
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn builtin_order_and_first() {
        let catalog = TemplateCatalog::builtin();
        let ids: Vec<&str> = catalog.all().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(
            ids,
            [
                "modern-business",
                "creative-portfolio",
                "restaurant-cafe",
                "tech-startup",
                "ecommerce-store"
            ]
        );
        assert_eq!(catalog.first().id, "modern-business");
    }

    #[test]
    fn get_by_id_resolves_known_and_falls_back() {
        let catalog = TemplateCatalog::builtin();
        let portfolio = catalog.get_by_id("creative-portfolio");
        assert_eq!(portfolio.colors.primary, "#EC4899");
        assert_eq!(portfolio.colors.secondary, "#8B5CF6");

        assert_eq!(catalog.get_by_id("no-such-template").id, "modern-business");
        assert!(catalog.find("no-such-template").is_none());
    }

    #[test]
    fn categories_start_with_all_and_keep_order() {
        let catalog = TemplateCatalog::builtin();
        assert_eq!(
            catalog.categories(),
            ["All", "Business", "Portfolio", "Food", "Technology", "E-Commerce"]
        );
    }

    #[test]
    fn by_category_filters_exactly() {
        let catalog = TemplateCatalog::builtin();
        assert_eq!(catalog.by_category(None).len(), 5);
        assert_eq!(catalog.by_category(Some("All")).len(), 5);

        let food = catalog.by_category(Some("Food"));
        assert_eq!(food.len(), 1);
        assert_eq!(food[0].id, "restaurant-cafe");

        assert!(catalog.by_category(Some("food")).is_empty());
    }

    #[test]
    fn categories_are_deduplicated() {
        let mut second = TemplateCatalog::builtin().all()[0].clone();
        second.id = "classic-business".to_owned();
        let catalog =
            TemplateCatalog::new(vec![TemplateCatalog::builtin().all()[0].clone(), second])
                .unwrap();
        assert_eq!(catalog.categories(), ["All", "Business"]);
        assert_eq!(catalog.by_category(Some("Business")).len(), 2);
    }

    #[test]
    fn new_rejects_empty_and_duplicates() {
        assert!(matches!(
            TemplateCatalog::new(Vec::new()),
            Err(CatalogError::Empty)
        ));

        let record = TemplateCatalog::builtin().all()[1].clone();
        let result = TemplateCatalog::new(vec![record.clone(), record]);
        assert!(matches!(
            result,
            Err(CatalogError::DuplicateId { id }) if id == "creative-portfolio"
        ));
    }

    #[test]
    fn record_serializes_with_camel_case() {
        let json = serde_json::to_value(TemplateCatalog::builtin().first()).unwrap();
        assert_eq!(json["previewImage"], "/images/templates/modern-business.webp");
        assert_eq!(json["colors"]["accent"], "#8B5CF6");
    }
}
