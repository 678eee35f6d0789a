//! media query evaluation against a simulated viewport
//!
//! supports:
//! - comma-separated query lists (any query may match)
//! - `only` / `not` prefixes
//! - media types: all, screen, print
//! - features joined with `and`: width, height (plain/min/max), orientation,
//!   prefers-color-scheme, prefers-reduced-motion, hover
//!
//! unknown features and malformed text never match, even under `not`.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// root font size used for em/rem lengths
const ROOT_FONT_SIZE_PX: f64 = 16.0;

lazy_static! {
    static ref AND_SEPARATOR: Regex = Regex::new(r"\s+and\s+").unwrap();
    static ref FEATURE: Regex = Regex::new(r"^\(\s*([a-z-]+)\s*(?::\s*(.*?))?\s*\)$").unwrap();
    static ref LENGTH: Regex = Regex::new(r"^(\d+(?:\.\d+)?)(px|em|rem)?$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    #[default]
    Light,
    Dark,
}

impl ColorScheme {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Some(ColorScheme::Light),
            "dark" => Some(ColorScheme::Dark),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorScheme::Light => "light",
            ColorScheme::Dark => "dark",
        }
    }
}

impl fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// output medium of the simulated host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Screen,
    Print,
}

impl MediaType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "screen" => Some(MediaType::Screen),
            "print" => Some(MediaType::Print),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Screen => "screen",
            MediaType::Print => "print",
        }
    }
}

/// the state media queries are evaluated against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub color_scheme: ColorScheme,
    pub reduced_motion: bool,
    pub media_type: MediaType,
    /// primary pointer can hover
    pub hover: bool,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            color_scheme: ColorScheme::Light,
            reduced_motion: false,
            media_type: MediaType::Screen,
            hover: true,
        }
    }
}

impl Viewport {
    /// evaluate a media query list against this viewport
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_ascii_lowercase();
        if query.is_empty() {
            // an empty list matches everything
            return true;
        }

        query.split(',').any(|single| {
            parse_query(single.trim())
                .and_then(|q| q.evaluate(self))
                .unwrap_or(false)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TypeSelector {
    All,
    Media(MediaType),
}

#[derive(Debug)]
struct Feature {
    name: String,
    value: Option<String>,
}

#[derive(Debug)]
struct MediaQuery {
    negated: bool,
    media_type: Option<TypeSelector>,
    features: Vec<Feature>,
}

fn strip_keyword<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(keyword)?;
    if rest.starts_with(char::is_whitespace) {
        Some(rest.trim_start())
    } else {
        None
    }
}

fn parse_query(text: &str) -> Option<MediaQuery> {
    if text.is_empty() {
        return None;
    }

    let mut rest = text;
    let mut negated = false;
    if let Some(r) = strip_keyword(rest, "not") {
        negated = true;
        rest = r;
    } else if let Some(r) = strip_keyword(rest, "only") {
        rest = r;
    }

    let mut media_type = None;
    let mut features = Vec::new();

    for (i, part) in AND_SEPARATOR.split(rest).enumerate() {
        let part = part.trim();
        if part.starts_with('(') {
            let caps = FEATURE.captures(part)?;
            features.push(Feature {
                name: caps[1].to_string(),
                value: caps
                    .get(2)
                    .map(|m| m.as_str().trim().to_string())
                    .filter(|v| !v.is_empty()),
            });
        } else if i == 0 {
            media_type = Some(match part {
                "all" => TypeSelector::All,
                other => TypeSelector::Media(MediaType::parse(other)?),
            });
        } else {
            return None;
        }
    }

    if media_type.is_none() && features.is_empty() {
        return None;
    }

    Some(MediaQuery {
        negated,
        media_type,
        features,
    })
}

impl MediaQuery {
    /// None when a feature is unknown or malformed
    fn evaluate(&self, viewport: &Viewport) -> Option<bool> {
        let type_ok = match self.media_type {
            None | Some(TypeSelector::All) => true,
            Some(TypeSelector::Media(t)) => t == viewport.media_type,
        };

        let mut all_features = true;
        for feature in &self.features {
            if !feature.evaluate(viewport)? {
                all_features = false;
            }
        }

        let result = type_ok && all_features;
        Some(if self.negated { !result } else { result })
    }
}

impl Feature {
    fn evaluate(&self, viewport: &Viewport) -> Option<bool> {
        let width = viewport.width as f64;
        let height = viewport.height as f64;
        let value = self.value.as_deref();

        match (self.name.as_str(), value) {
            ("width", None) => Some(width > 0.0),
            ("height", None) => Some(height > 0.0),
            ("width", Some(v)) => Some(width == parse_length(v)?),
            ("min-width", Some(v)) => Some(width >= parse_length(v)?),
            ("max-width", Some(v)) => Some(width <= parse_length(v)?),
            ("height", Some(v)) => Some(height == parse_length(v)?),
            ("min-height", Some(v)) => Some(height >= parse_length(v)?),
            ("max-height", Some(v)) => Some(height <= parse_length(v)?),

            ("orientation", None) => Some(true),
            ("orientation", Some("portrait")) => Some(height >= width),
            ("orientation", Some("landscape")) => Some(width > height),

            ("prefers-color-scheme", None) => Some(true),
            ("prefers-color-scheme", Some(v)) => {
                ColorScheme::parse(v).map(|scheme| scheme == viewport.color_scheme)
            }

            ("prefers-reduced-motion", None) => Some(viewport.reduced_motion),
            ("prefers-reduced-motion", Some("reduce")) => Some(viewport.reduced_motion),
            ("prefers-reduced-motion", Some("no-preference")) => Some(!viewport.reduced_motion),

            ("hover", None) => Some(viewport.hover),
            ("hover", Some("hover")) => Some(viewport.hover),
            ("hover", Some("none")) => Some(!viewport.hover),

            _ => None,
        }
    }
}

/// parse a CSS length into px; unitless lengths are only valid for zero
fn parse_length(value: &str) -> Option<f64> {
    let caps = LENGTH.captures(value.trim())?;
    let number: f64 = caps[1].parse().ok()?;
    match caps.get(2).map(|m| m.as_str()) {
        Some("px") => Some(number),
        Some("em") | Some("rem") => Some(number * ROOT_FONT_SIZE_PX),
        None if number == 0.0 => Some(0.0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport(width: u32, height: u32) -> Viewport {
        Viewport {
            width,
            height,
            ..Default::default()
        }
    }

    #[test]
    fn test_min_max_width() {
        let vp = viewport(800, 600);
        assert!(vp.matches("(min-width: 600px)"));
        assert!(!vp.matches("(min-width: 900px)"));
        assert!(vp.matches("(max-width: 800px)"));
        assert!(!vp.matches("(max-width: 799px)"));
        assert!(vp.matches("(width: 800px)"));
    }

    #[test]
    fn test_em_lengths() {
        let vp = viewport(800, 600);
        // 40em = 640px
        assert!(vp.matches("(min-width: 40em)"));
        assert!(!vp.matches("(min-width: 60rem)"));
    }

    #[test]
    fn test_unitless_length_only_zero() {
        let vp = viewport(800, 600);
        assert!(vp.matches("(min-width: 0)"));
        assert!(!vp.matches("(min-width: 600)"));
    }

    #[test]
    fn test_and_combination() {
        let vp = viewport(800, 600);
        assert!(vp.matches("screen and (min-width: 600px) and (max-width: 1000px)"));
        assert!(!vp.matches("screen and (min-width: 600px) and (max-width: 700px)"));
        assert!(!vp.matches("print and (min-width: 600px)"));
    }

    #[test]
    fn test_query_list_is_or() {
        let vp = viewport(500, 600);
        assert!(vp.matches("(min-width: 900px), (orientation: portrait)"));
        assert!(!vp.matches("(min-width: 900px), print"));
    }

    #[test]
    fn test_not_and_only() {
        let vp = viewport(800, 600);
        assert!(vp.matches("not print"));
        assert!(!vp.matches("not screen"));
        assert!(vp.matches("only screen and (min-width: 100px)"));
        assert!(!vp.matches("not screen and (min-width: 100px)"));
    }

    #[test]
    fn test_orientation() {
        assert!(viewport(800, 600).matches("(orientation: landscape)"));
        assert!(viewport(600, 800).matches("(orientation: portrait)"));
        assert!(viewport(600, 600).matches("(orientation: portrait)"));
    }

    #[test]
    fn test_preferences() {
        let mut vp = viewport(800, 600);
        assert!(vp.matches("(prefers-color-scheme: light)"));
        vp.color_scheme = ColorScheme::Dark;
        assert!(vp.matches("(prefers-color-scheme: dark)"));
        assert!(!vp.matches("(prefers-color-scheme: light)"));

        assert!(vp.matches("(prefers-reduced-motion: no-preference)"));
        vp.reduced_motion = true;
        assert!(vp.matches("(prefers-reduced-motion: reduce)"));
        assert!(vp.matches("(prefers-reduced-motion)"));

        assert!(vp.matches("(hover: hover)"));
        vp.hover = false;
        assert!(vp.matches("(hover: none)"));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(viewport(800, 600).matches("SCREEN AND (MIN-WIDTH: 600PX)"));
    }

    #[test]
    fn test_unknown_and_malformed_never_match() {
        let vp = viewport(800, 600);
        assert!(!vp.matches("(min-resolution: 2dppx)"));
        assert!(!vp.matches("not (min-resolution: 2dppx)"));
        assert!(!vp.matches("(min-width 600px)"));
        assert!(!vp.matches("tv"));
        assert!(!vp.matches("(min-width: 600px) (max-width: 900px)"));
        assert!(!vp.matches("(min-width: wide)"));
    }

    #[test]
    fn test_empty_query_matches() {
        assert!(viewport(1, 1).matches(""));
        assert!(viewport(1, 1).matches("all"));
    }
}
