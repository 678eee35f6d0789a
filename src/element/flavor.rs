//! element flavors and their capability table

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::conditions::{AttributeSchema, PredicateKind};

/// whether the element is shown or hidden when its conditions hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// hidden by default, shown when conditions hold
    Direct,
    /// shown by default, hidden when conditions hold
    Inverted,
}

impl Polarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Polarity::Direct => "direct",
            Polarity::Inverted => "inverted",
        }
    }

    /// value of the hidden flag for an evaluation result
    pub fn hidden_for(&self, matched: bool) -> bool {
        match self {
            Polarity::Direct => !matched,
            Polarity::Inverted => matched,
        }
    }
}

/// what a flavor supports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlavorProfile {
    pub default_tag: &'static str,
    pub schema: AttributeSchema,
    /// re-evaluates on environment changes while attached
    pub live: bool,
    pub polarity: Polarity,
    pub description: &'static str,
}

const STATIC_KINDS: &[PredicateKind] = &[
    PredicateKind::Param,
    PredicateKind::Hash,
    PredicateKind::Lang,
    PredicateKind::Media,
    PredicateKind::Support,
];

const LIVE_KINDS: &[PredicateKind] = &[
    PredicateKind::Param,
    PredicateKind::Hash,
    PredicateKind::Lang,
    PredicateKind::Media,
    PredicateKind::Support,
    PredicateKind::Network,
];

const ONLY_SHOW: FlavorProfile = FlavorProfile {
    default_tag: "only-show",
    schema: AttributeSchema {
        prefix: "when-",
        kinds: STATIC_KINDS,
    },
    live: false,
    polarity: Polarity::Direct,
    description: "Shown when its conditions hold; checked on attribute changes only",
};

const SHOW_WHEN: FlavorProfile = FlavorProfile {
    default_tag: "show-when",
    schema: AttributeSchema {
        prefix: "has-",
        kinds: LIVE_KINDS,
    },
    live: true,
    polarity: Polarity::Direct,
    description: "Shown when its conditions hold; follows hash, network and media changes",
};

const HIDE_WHEN: FlavorProfile = FlavorProfile {
    default_tag: "hide-when",
    schema: AttributeSchema {
        prefix: "has-",
        kinds: LIVE_KINDS,
    },
    live: true,
    polarity: Polarity::Inverted,
    description: "Hidden when its conditions hold; follows hash, network and media changes",
};

/// the element variants sharing one evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flavor {
    #[serde(alias = "only-show")]
    OnlyShow,
    #[serde(alias = "show-when")]
    ShowWhen,
    #[serde(alias = "hide-when")]
    HideWhen,
}

impl Flavor {
    pub fn all() -> &'static [Flavor] {
        &[Flavor::OnlyShow, Flavor::ShowWhen, Flavor::HideWhen]
    }

    pub fn profile(&self) -> &'static FlavorProfile {
        match self {
            Flavor::OnlyShow => &ONLY_SHOW,
            Flavor::ShowWhen => &SHOW_WHEN,
            Flavor::HideWhen => &HIDE_WHEN,
        }
    }

    pub fn default_tag(&self) -> &'static str {
        self.profile().default_tag
    }

    pub fn schema(&self) -> &'static AttributeSchema {
        &self.profile().schema
    }

    pub fn is_live(&self) -> bool {
        self.profile().live
    }

    pub fn polarity(&self) -> Polarity {
        self.profile().polarity
    }

    pub fn observed_attributes(&self) -> Vec<String> {
        self.schema().observed_attributes()
    }

    /// flavor registered under a default tag name
    pub fn from_default_tag(tag: &str) -> Option<Flavor> {
        Self::all().iter().copied().find(|f| f.default_tag() == tag)
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.default_tag())
    }
}
