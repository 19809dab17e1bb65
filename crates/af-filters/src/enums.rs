//! Panel layout and width options

use serde::{Deserialize, Serialize};

/// Where and how a filter panel is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterLayout {
    #[default]
    Dropdown,
    Modal,
    AboveContent,
    AboveContentCollapsible,
    BelowContent,
    Sidebar,
    SidebarCollapsible,
    Inline,
}

impl FilterLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dropdown => "dropdown",
            Self::Modal => "modal",
            Self::AboveContent => "above-content",
            Self::AboveContentCollapsible => "above-content-collapsible",
            Self::BelowContent => "below-content",
            Self::Sidebar => "sidebar",
            Self::SidebarCollapsible => "sidebar-collapsible",
            Self::Inline => "inline",
        }
    }

    pub fn container_class(&self) -> &'static str {
        match self {
            Self::Dropdown => "filter-layout-dropdown",
            Self::Modal => "filter-layout-modal",
            Self::AboveContent => "filter-layout-above",
            Self::AboveContentCollapsible => "filter-layout-above filter-layout-collapsible",
            Self::BelowContent => "filter-layout-below",
            Self::Sidebar => "filter-layout-sidebar",
            Self::SidebarCollapsible => "filter-layout-sidebar filter-layout-collapsible",
            Self::Inline => "filter-layout-inline",
        }
    }

    pub fn is_collapsible(&self) -> bool {
        matches!(self, Self::AboveContentCollapsible | Self::SidebarCollapsible)
    }

    /// Layouts opened from a trigger button
    pub fn uses_trigger(&self) -> bool {
        matches!(self, Self::Dropdown | Self::Modal)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Dropdown => "Dropdown",
            Self::Modal => "Modal",
            Self::AboveContent => "Above Content",
            Self::AboveContentCollapsible => "Above Content (Collapsible)",
            Self::BelowContent => "Below Content",
            Self::Sidebar => "Sidebar",
            Self::SidebarCollapsible => "Sidebar (Collapsible)",
            Self::Inline => "Inline",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilterWidth {
    #[serde(rename = "xs")]
    ExtraSmall,
    #[serde(rename = "sm")]
    Small,
    #[default]
    #[serde(rename = "md")]
    Medium,
    #[serde(rename = "lg")]
    Large,
    #[serde(rename = "xl")]
    ExtraLarge,
    #[serde(rename = "2xl")]
    TwoExtraLarge,
    #[serde(rename = "3xl")]
    ThreeExtraLarge,
    #[serde(rename = "4xl")]
    FourExtraLarge,
    #[serde(rename = "5xl")]
    FiveExtraLarge,
    #[serde(rename = "6xl")]
    SixExtraLarge,
    #[serde(rename = "full")]
    Full,
}

impl FilterWidth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExtraSmall => "xs",
            Self::Small => "sm",
            Self::Medium => "md",
            Self::Large => "lg",
            Self::ExtraLarge => "xl",
            Self::TwoExtraLarge => "2xl",
            Self::ThreeExtraLarge => "3xl",
            Self::FourExtraLarge => "4xl",
            Self::FiveExtraLarge => "5xl",
            Self::SixExtraLarge => "6xl",
            Self::Full => "full",
        }
    }

    /// CSS max-width
    pub fn max_width(&self) -> &'static str {
        match self {
            Self::ExtraSmall => "20rem",
            Self::Small => "24rem",
            Self::Medium => "28rem",
            Self::Large => "32rem",
            Self::ExtraLarge => "36rem",
            Self::TwoExtraLarge => "42rem",
            Self::ThreeExtraLarge => "48rem",
            Self::FourExtraLarge => "56rem",
            Self::FiveExtraLarge => "64rem",
            Self::SixExtraLarge => "72rem",
            Self::Full => "100%",
        }
    }

    pub fn tailwind_class(&self) -> String {
        format!("max-w-{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_serde_names() {
        for layout in [
            FilterLayout::Dropdown,
            FilterLayout::AboveContentCollapsible,
            FilterLayout::SidebarCollapsible,
            FilterLayout::Inline,
        ] {
            let encoded = serde_json::to_value(layout).unwrap();
            assert_eq!(encoded, serde_json::json!(layout.as_str()));
        }
    }

    #[test]
    fn test_layout_behaviour() {
        assert!(FilterLayout::SidebarCollapsible.is_collapsible());
        assert!(!FilterLayout::Sidebar.is_collapsible());
        assert!(FilterLayout::Modal.uses_trigger());
        assert!(!FilterLayout::Inline.uses_trigger());
        assert_eq!(
            FilterLayout::AboveContentCollapsible.container_class(),
            "filter-layout-above filter-layout-collapsible"
        );
    }

    #[test]
    fn test_width_helpers() {
        assert_eq!(FilterWidth::default(), FilterWidth::Medium);
        assert_eq!(FilterWidth::TwoExtraLarge.max_width(), "42rem");
        assert_eq!(FilterWidth::Full.tailwind_class(), "max-w-full");
        let parsed: FilterWidth = serde_json::from_str(r#""3xl""#).unwrap();
        assert_eq!(parsed, FilterWidth::ThreeExtraLarge);
    }
}
