//! Customization state: the visitor's in-progress website preferences.
//!
//! [`CustomizationState`] is a single aggregate with a defined default for
//! every field. Its serialized shape is the durable storage schema, so field
//! names stay camelCase and every field except `logo` is required on decode.
//! A missing `logo` decodes as no logo. A snapshot with a different
//! structure fails to decode and is treated as absent.
//!
//! Each mutation is a small pure transition on the aggregate. The store and
//! the tests apply the same functions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::TemplateRecord;
use crate::error::ParseKeyError;

pub const DEFAULT_BUSINESS_NAME: &str = "Your Business";
pub const DEFAULT_TEMPLATE_ID: &str = "modern-business";
pub const DEFAULT_PRIMARY_COLOR: &str = "#3B82F6";
pub const DEFAULT_SECONDARY_COLOR: &str = "#10B981";
pub const DEFAULT_HEADING_FONT: &str = "Inter";
pub const DEFAULT_BODY_FONT: &str = "Roboto";

/// The visitor's whole customization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomizationState {
    pub business_name: String,
    /// Logo as a data URI; `None` means "no logo".
    pub logo: Option<String>,
    #[serde(rename = "selectedTemplate")]
    pub selected_template_id: String,
    pub customizations: Customizations,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customizations {
    pub colors: ColorChoice,
    pub fonts: FontChoice,
    pub sections: SectionToggles,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorChoice {
    pub primary: String,
    pub secondary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontChoice {
    pub heading: String,
    pub body: String,
}

/// Independent visibility toggles for the generated site's sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct SectionToggles {
    pub hero: bool,
    pub features: bool,
    pub testimonials: bool,
    pub contact: bool,
}

impl Default for CustomizationState {
    fn default() -> Self {
        Self {
            business_name: DEFAULT_BUSINESS_NAME.to_owned(),
            logo: None,
            selected_template_id: DEFAULT_TEMPLATE_ID.to_owned(),
            customizations: Customizations {
                colors: ColorChoice {
                    primary: DEFAULT_PRIMARY_COLOR.to_owned(),
                    secondary: DEFAULT_SECONDARY_COLOR.to_owned(),
                },
                fonts: FontChoice {
                    heading: DEFAULT_HEADING_FONT.to_owned(),
                    body: DEFAULT_BODY_FONT.to_owned(),
                },
                sections: SectionToggles::default(),
            },
        }
    }
}

impl Default for SectionToggles {
    fn default() -> Self {
        Self {
            hero: true,
            features: true,
            testimonials: true,
            contact: true,
        }
    }
}

// ── Keys ─────────────────────────────────────────────────────────────

/// Which color channel to edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSlot {
    Primary,
    Secondary,
}

/// Which font channel to edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSlot {
    Heading,
    Body,
}

/// A toggleable site section, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Hero,
    Features,
    Testimonials,
    Contact,
}

impl Section {
    /// Every section in display order.
    pub const ALL: [Section; 4] = [
        Section::Hero,
        Section::Features,
        Section::Testimonials,
        Section::Contact,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hero => "hero",
            Self::Features => "features",
            Self::Testimonials => "testimonials",
            Self::Contact => "contact",
        }
    }
}

impl ColorSlot {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }
}

impl FontSlot {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Heading => "heading",
            Self::Body => "body",
        }
    }
}

impl FromStr for ColorSlot {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(Self::Primary),
            "secondary" => Ok(Self::Secondary),
            other => Err(ParseKeyError {
                kind: "color slot",
                value: other.to_owned(),
                expected: "primary, secondary",
            }),
        }
    }
}

impl FromStr for FontSlot {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "heading" => Ok(Self::Heading),
            "body" => Ok(Self::Body),
            other => Err(ParseKeyError {
                kind: "font slot",
                value: other.to_owned(),
                expected: "heading, body",
            }),
        }
    }
}

impl FromStr for Section {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|section| section.as_str() == s)
            .ok_or_else(|| ParseKeyError {
                kind: "section",
                value: s.to_owned(),
                expected: "hero, features, testimonials, contact",
            })
    }
}

impl fmt::Display for ColorSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for FontSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Transitions ──────────────────────────────────────────────────────

impl SectionToggles {
    #[must_use]
    pub fn is_enabled(&self, section: Section) -> bool {
        match section {
            Section::Hero => self.hero,
            Section::Features => self.features,
            Section::Testimonials => self.testimonials,
            Section::Contact => self.contact,
        }
    }

    fn flag_mut(&mut self, section: Section) -> &mut bool {
        match section {
            Section::Hero => &mut self.hero,
            Section::Features => &mut self.features,
            Section::Testimonials => &mut self.testimonials,
            Section::Contact => &mut self.contact,
        }
    }

    /// Enabled sections in display order.
    #[must_use]
    pub fn enabled(&self) -> Vec<Section> {
        Section::ALL
            .into_iter()
            .filter(|s| self.is_enabled(*s))
            .collect()
    }
}

impl CustomizationState {
    /// Replace the business name. Empty names are allowed.
    pub fn set_business_name(&mut self, name: impl Into<String>) {
        self.business_name = name.into();
    }

    /// Replace the logo wholesale. The caller provides a valid image reference.
    pub fn set_logo(&mut self, data_ref: impl Into<String>) {
        self.logo = Some(data_ref.into());
    }

    pub fn clear_logo(&mut self) {
        self.logo = None;
    }

    /// Switch to `template` and overwrite both colors with its defaults.
    ///
    /// Manual color edits made before the switch are discarded; there is no
    /// merge.
    pub fn apply_template(&mut self, template: &TemplateRecord) {
        self.selected_template_id.clone_from(&template.id);
        self.customizations.colors = ColorChoice {
            primary: template.colors.primary.clone(),
            secondary: template.colors.secondary.clone(),
        };
    }

    /// Update exactly one color channel.
    pub fn set_color(&mut self, slot: ColorSlot, value: impl Into<String>) {
        let colors = &mut self.customizations.colors;
        match slot {
            ColorSlot::Primary => colors.primary = value.into(),
            ColorSlot::Secondary => colors.secondary = value.into(),
        }
    }

    /// Update exactly one font channel.
    pub fn set_font(&mut self, slot: FontSlot, value: impl Into<String>) {
        let fonts = &mut self.customizations.fonts;
        match slot {
            FontSlot::Heading => fonts.heading = value.into(),
            FontSlot::Body => fonts.body = value.into(),
        }
    }

    /// Flip one section's visibility.
    pub fn toggle_section(&mut self, section: Section) {
        let flag = self.customizations.sections.flag_mut(section);
        *flag = !*flag;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::TemplateCatalog;

    #[test]
    fn default_matches_documented_values() {
        let state = CustomizationState::default();
        assert_eq!(state.business_name, "Your Business");
        assert_eq!(state.logo, None);
        assert_eq!(state.selected_template_id, "modern-business");
        assert_eq!(state.customizations.colors.primary, "#3B82F6");
        assert_eq!(state.customizations.colors.secondary, "#10B981");
        assert_eq!(state.customizations.fonts.heading, "Inter");
        assert_eq!(state.customizations.fonts.body, "Roboto");
        assert_eq!(state.customizations.sections.enabled(), Section::ALL);
    }

    #[test]
    fn serialized_shape_is_the_storage_schema() {
        let json = serde_json::to_value(CustomizationState::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "businessName": "Your Business",
                "logo": null,
                "selectedTemplate": "modern-business",
                "customizations": {
                    "colors": { "primary": "#3B82F6", "secondary": "#10B981" },
                    "fonts": { "heading": "Inter", "body": "Roboto" },
                    "sections": {
                        "hero": true,
                        "features": true,
                        "testimonials": true,
                        "contact": true
                    }
                }
            })
        );
    }

    #[test]
    fn incompatible_shape_does_not_decode() {
        let missing_sections = serde_json::json!({
            "businessName": "Acme",
            "logo": null,
            "selectedTemplate": "modern-business",
            "customizations": {
                "colors": { "primary": "#000000", "secondary": "#FFFFFF" },
                "fonts": { "heading": "Inter", "body": "Roboto" }
            }
        });
        assert!(serde_json::from_value::<CustomizationState>(missing_sections).is_err());

        let wrong_type = serde_json::json!({ "businessName": 42 });
        assert!(serde_json::from_value::<CustomizationState>(wrong_type).is_err());
    }

    #[test]
    fn missing_logo_decodes_as_no_logo() {
        let mut json = serde_json::to_value(CustomizationState::default()).unwrap();
        json.as_object_mut().unwrap().remove("logo");

        let state: CustomizationState = serde_json::from_value(json).unwrap();
        assert_eq!(state, CustomizationState::default());

        let mut json = serde_json::to_value(CustomizationState::default()).unwrap();
        json.as_object_mut().unwrap().remove("businessName");
        assert!(serde_json::from_value::<CustomizationState>(json).is_err());
    }

    #[test]
    fn apply_template_overwrites_manual_colors() {
        let catalog = TemplateCatalog::builtin();
        let mut state = CustomizationState::default();
        state.set_color(ColorSlot::Primary, "#111111");
        state.set_color(ColorSlot::Secondary, "#222222");

        state.apply_template(catalog.get_by_id("tech-startup"));
        assert_eq!(state.selected_template_id, "tech-startup");
        assert_eq!(state.customizations.colors.primary, "#6366F1");
        assert_eq!(state.customizations.colors.secondary, "#10B981");
    }

    #[test]
    fn set_color_touches_one_channel() {
        let mut state = CustomizationState::default();
        let before = state.clone();
        state.set_color(ColorSlot::Primary, "#ABCDEF");

        assert_eq!(state.customizations.colors.primary, "#ABCDEF");
        assert_eq!(
            state.customizations.colors.secondary,
            before.customizations.colors.secondary
        );
        assert_eq!(state.selected_template_id, before.selected_template_id);
        assert_eq!(state.business_name, before.business_name);
        assert_eq!(state.customizations.fonts, before.customizations.fonts);
        assert_eq!(state.customizations.sections, before.customizations.sections);
    }

    #[test]
    fn set_font_touches_one_channel() {
        let mut state = CustomizationState::default();
        state.set_font(FontSlot::Body, "Lora");
        assert_eq!(state.customizations.fonts.body, "Lora");
        assert_eq!(state.customizations.fonts.heading, "Inter");
    }

    #[test]
    fn toggle_section_twice_restores() {
        for section in Section::ALL {
            let mut state = CustomizationState::default();
            state.toggle_section(section);
            assert!(!state.customizations.sections.is_enabled(section));
            let others: Vec<Section> = Section::ALL
                .into_iter()
                .filter(|s| *s != section)
                .collect();
            assert_eq!(state.customizations.sections.enabled(), others);

            state.toggle_section(section);
            assert_eq!(state, CustomizationState::default());
        }
    }

    #[test]
    fn logo_is_replaced_and_cleared() {
        let mut state = CustomizationState::default();
        state.set_logo("data:image/png;base64,AAAA");
        state.set_logo("data:image/png;base64,BBBB");
        assert_eq!(state.logo.as_deref(), Some("data:image/png;base64,BBBB"));
        state.clear_logo();
        assert_eq!(state.logo, None);
    }

    #[test]
    fn keys_parse_from_lowercase_names() {
        assert_eq!("primary".parse::<ColorSlot>().unwrap(), ColorSlot::Primary);
        assert_eq!("body".parse::<FontSlot>().unwrap(), FontSlot::Body);
        assert_eq!(
            "testimonials".parse::<Section>().unwrap(),
            Section::Testimonials
        );

        let err = "footer".parse::<Section>().unwrap_err();
        assert_eq!(err.value, "footer");
        assert!(err.to_string().contains("hero, features"));
        assert!("Primary".parse::<ColorSlot>().is_err());
    }
}
