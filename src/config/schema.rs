use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::element::Flavor;
use crate::environment::{ColorScheme, HostCapabilities, MediaType, Viewport};

/// a scripted session: initial host state, elements, then steps
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub environment: EnvironmentConfig,
    /// extra tag definitions on top of the default tags
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub definitions: BTreeMap<String, Flavor>,
    #[serde(default)]
    pub elements: Vec<ElementConfig>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    #[serde(default = "default_true")]
    pub online: bool,
    #[serde(default)]
    pub viewport: Viewport,
    /// supported declarations, e.g. "display: grid" or "gap: *"
    #[serde(default)]
    pub supports: Vec<String>,
    #[serde(default)]
    pub capabilities: HostCapabilities,
}

fn default_url() -> String {
    "/".to_string()
}

fn default_languages() -> Vec<String> {
    vec!["en-US".to_string(), "en".to_string()]
}

fn default_true() -> bool {
    true
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            languages: default_languages(),
            online: true,
            viewport: Viewport::default(),
            supports: vec![],
            capabilities: HostCapabilities::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementConfig {
    pub id: String,
    pub tag: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default = "default_true")]
    pub connected: bool,
}

/// one scripted change, tagged by `action`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    SetHash {
        value: String,
    },
    Navigate {
        url: String,
    },
    SetLanguages {
        value: Vec<String>,
    },
    SetOnline {
        value: bool,
    },
    Resize {
        width: u32,
        height: u32,
    },
    SetColorScheme {
        value: ColorScheme,
    },
    SetReducedMotion {
        value: bool,
    },
    SetMediaType {
        value: MediaType,
    },
    SetHover {
        value: bool,
    },
    AllowSupport {
        value: String,
    },
    SetAttribute {
        element: String,
        name: String,
        #[serde(default)]
        value: String,
    },
    RemoveAttribute {
        element: String,
        name: String,
    },
    ToggleAttribute {
        element: String,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        force: Option<bool>,
    },
    Connect {
        element: String,
    },
    Disconnect {
        element: String,
    },
    /// re-evaluate one element, or every element when none is named
    Refresh {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        element: Option<String>,
    },
}

impl Step {
    pub fn action(&self) -> &'static str {
        match self {
            Step::SetHash { .. } => "set_hash",
            Step::Navigate { .. } => "navigate",
            Step::SetLanguages { .. } => "set_languages",
            Step::SetOnline { .. } => "set_online",
            Step::Resize { .. } => "resize",
            Step::SetColorScheme { .. } => "set_color_scheme",
            Step::SetReducedMotion { .. } => "set_reduced_motion",
            Step::SetMediaType { .. } => "set_media_type",
            Step::SetHover { .. } => "set_hover",
            Step::AllowSupport { .. } => "allow_support",
            Step::SetAttribute { .. } => "set_attribute",
            Step::RemoveAttribute { .. } => "remove_attribute",
            Step::ToggleAttribute { .. } => "toggle_attribute",
            Step::Connect { .. } => "connect",
            Step::Disconnect { .. } => "disconnect",
            Step::Refresh { .. } => "refresh",
        }
    }

    /// element id the step targets, if any
    pub fn element(&self) -> Option<&str> {
        match self {
            Step::SetAttribute { element, .. }
            | Step::RemoveAttribute { element, .. }
            | Step::ToggleAttribute { element, .. }
            | Step::Connect { element }
            | Step::Disconnect { element } => Some(element),
            Step::Refresh { element } => element.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::SetHash { value } => write!(f, "set_hash #{}", value.trim_start_matches('#')),
            Step::Navigate { url } => write!(f, "navigate {}", url),
            Step::SetLanguages { value } => write!(f, "set_languages [{}]", value.join(", ")),
            Step::SetOnline { value } => {
                write!(f, "set_online {}", if *value { "online" } else { "offline" })
            }
            Step::Resize { width, height } => write!(f, "resize {}x{}", width, height),
            Step::SetColorScheme { value } => write!(f, "set_color_scheme {}", value),
            Step::SetReducedMotion { value } => write!(f, "set_reduced_motion {}", value),
            Step::SetMediaType { value } => write!(f, "set_media_type {}", value.as_str()),
            Step::SetHover { value } => write!(f, "set_hover {}", value),
            Step::AllowSupport { value } => write!(f, "allow_support '{}'", value),
            Step::SetAttribute {
                element,
                name,
                value,
            } => write!(f, "{}: set {}=\"{}\"", element, name, value),
            Step::RemoveAttribute { element, name } => write!(f, "{}: remove {}", element, name),
            Step::ToggleAttribute {
                element,
                name,
                force,
            } => match force {
                Some(force) => write!(f, "{}: toggle {} (force {})", element, name, force),
                None => write!(f, "{}: toggle {}", element, name),
            },
            Step::Connect { element } => write!(f, "{}: connect", element),
            Step::Disconnect { element } => write!(f, "{}: disconnect", element),
            Step::Refresh { element: Some(id) } => write!(f, "{}: refresh", id),
            Step::Refresh { element: None } => write!(f, "refresh all"),
        }
    }
}
