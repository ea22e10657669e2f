//! Mock site preview derived from a customization.
//!
//! Nothing is rendered or generated here. A [`SitePreview`] is the data a
//! demo front end needs to draw its mock: the resolved template, the
//! effective palette, the heading shown in the preview frame, and the
//! sections that remain visible.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::{Palette, TemplateCatalog, TemplateRecord};
use crate::customization::{CustomizationState, DEFAULT_BUSINESS_NAME, FontChoice, Section};
use crate::error::ParseKeyError;

/// Device frame the preview is drawn in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Viewport {
    #[default]
    Desktop,
    Tablet,
    Mobile,
}

impl Viewport {
    /// Fixed frame width in CSS pixels; `None` fills the available width.
    #[must_use]
    pub fn width_px(self) -> Option<u32> {
        match self {
            Self::Desktop => None,
            Self::Tablet => Some(768),
            Self::Mobile => Some(375),
        }
    }
}

impl FromStr for Viewport {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "desktop" => Ok(Self::Desktop),
            "tablet" => Ok(Self::Tablet),
            "mobile" => Ok(Self::Mobile),
            other => Err(ParseKeyError {
                kind: "viewport",
                value: other.to_owned(),
                expected: "desktop, tablet, mobile",
            }),
        }
    }
}

/// Everything needed to draw the mock preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SitePreview {
    /// Name shown on the mock site; the default name stands in for an empty one.
    pub display_name: String,
    /// Frame title, e.g. `Acme - Modern Business Template`.
    pub title: String,
    pub logo: Option<String>,
    /// Placeholder monogram drawn when there is no logo.
    pub monogram: Option<String>,
    pub template: TemplateRecord,
    /// Template palette with the customized primary/secondary applied.
    pub palette: Palette,
    pub fonts: FontChoice,
    pub sections: Vec<Section>,
    pub viewport: Viewport,
    pub frame_width_px: Option<u32>,
}

impl SitePreview {
    /// Derive the preview for `state`.
    ///
    /// A selected template id missing from the catalog resolves to the
    /// catalog's first template.
    #[must_use]
    pub fn build(
        state: &CustomizationState,
        catalog: &TemplateCatalog,
        viewport: Viewport,
    ) -> Self {
        let template = catalog.get_by_id(&state.selected_template_id).clone();

        let display_name = if state.business_name.trim().is_empty() {
            DEFAULT_BUSINESS_NAME.to_owned()
        } else {
            state.business_name.clone()
        };

        let monogram = match state.logo {
            Some(_) => None,
            None => display_name
                .chars()
                .find(|c| !c.is_whitespace())
                .map(|c| c.to_uppercase().collect::<String>()),
        };

        let colors = &state.customizations.colors;
        let palette = Palette {
            primary: colors.primary.clone(),
            secondary: colors.secondary.clone(),
            ..template.colors.clone()
        };

        Self {
            title: format!("{display_name} - {} Template", template.name),
            display_name,
            logo: state.logo.clone(),
            monogram,
            palette,
            fonts: state.customizations.fonts.clone(),
            sections: state.customizations.sections.enabled(),
            template,
            viewport,
            frame_width_px: viewport.width_px(),
        }
    }
}
