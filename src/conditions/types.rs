//! core types for the condition system

use std::fmt;

use serde::Serialize;

/// how predicate outcomes are folded into one visibility decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Combinator {
    /// every configured predicate must match (AND)
    #[default]
    All,
    /// at least one configured predicate must match (OR)
    Any,
}

impl Combinator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Combinator::All => "all",
            Combinator::Any => "any",
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// required network state for the network predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkState {
    Online,
    Offline,
}

impl NetworkState {
    /// parse "online" / "offline" (exact, lowercase)
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "online" => Some(NetworkState::Online),
            "offline" => Some(NetworkState::Offline),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkState::Online => "online",
            NetworkState::Offline => "offline",
        }
    }

    /// check whether the host's online flag satisfies this state
    pub fn is_satisfied_by(&self, online: bool) -> bool {
        match self {
            NetworkState::Online => online,
            NetworkState::Offline => !online,
        }
    }
}

impl fmt::Display for NetworkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// query parameter requirement: `name` or `name=value`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamSpec {
    /// parameter must be present, any value
    Name(String),
    /// parameter must be present with exactly this value
    NameValue { name: String, value: String },
}

impl ParamSpec {
    /// parse a param spec, splitting on the first `=` only
    ///
    /// returns None for an empty spec or an empty parameter name
    pub fn parse(s: &str) -> Option<Self> {
        match s.split_once('=') {
            Some((name, _)) if name.is_empty() => None,
            Some((name, value)) => Some(ParamSpec::NameValue {
                name: name.to_string(),
                value: value.to_string(),
            }),
            None if s.is_empty() => None,
            None => Some(ParamSpec::Name(s.to_string())),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ParamSpec::Name(name) => name,
            ParamSpec::NameValue { name, .. } => name,
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            ParamSpec::Name(_) => None,
            ParamSpec::NameValue { value, .. } => Some(value),
        }
    }
}

impl fmt::Display for ParamSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamSpec::Name(name) => write!(f, "{}", name),
            ParamSpec::NameValue { name, value } => write!(f, "{}={}", name, value),
        }
    }
}

/// the kinds of predicates a configuration can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateKind {
    Param,
    Hash,
    Lang,
    Media,
    Support,
    Network,
}

impl PredicateKind {
    /// attribute suffix, e.g. "param" in "has-param"
    pub fn as_str(&self) -> &'static str {
        match self {
            PredicateKind::Param => "param",
            PredicateKind::Hash => "hash",
            PredicateKind::Lang => "lang",
            PredicateKind::Media => "media",
            PredicateKind::Support => "support",
            PredicateKind::Network => "network",
        }
    }

    /// all predicate kinds in evaluation order
    pub fn all() -> &'static [PredicateKind] {
        &[
            PredicateKind::Param,
            PredicateKind::Hash,
            PredicateKind::Lang,
            PredicateKind::Media,
            PredicateKind::Support,
            PredicateKind::Network,
        ]
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.as_str() == s)
    }

    pub fn description(&self) -> &'static str {
        match self {
            PredicateKind::Param => "query parameter `name` or `name=value` is present",
            PredicateKind::Hash => "URL fragment equals the value (without '#')",
            PredicateKind::Lang => "language tag is among the preferred languages",
            PredicateKind::Media => "media query currently matches",
            PredicateKind::Support => "feature-support query is supported",
            PredicateKind::Network => "network is 'online' or 'offline'",
        }
    }
}

impl fmt::Display for PredicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// tri-state result of a single predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Matched,
    Unmatched,
    /// predicate not configured (or not checkable on this host)
    Absent,
}

impl Outcome {
    pub fn from_bool(matched: bool) -> Self {
        if matched {
            Outcome::Matched
        } else {
            Outcome::Unmatched
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, Outcome::Matched)
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Outcome::Absent)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Matched => write!(f, "matched"),
            Outcome::Unmatched => write!(f, "unmatched"),
            Outcome::Absent => write!(f, "absent"),
        }
    }
}

/// immutable snapshot of the declared conditions of one element
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Configuration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<ParamSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub support: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkState>,
    pub combinator: Combinator,
}

impl Configuration {
    /// check if a predicate of the given kind is configured
    pub fn has(&self, kind: PredicateKind) -> bool {
        match kind {
            PredicateKind::Param => self.param.is_some(),
            PredicateKind::Hash => self.hash.is_some(),
            PredicateKind::Lang => self.lang.is_some(),
            PredicateKind::Media => self.media.is_some(),
            PredicateKind::Support => self.support.is_some(),
            PredicateKind::Network => self.network.is_some(),
        }
    }

    /// configured predicate kinds, in evaluation order
    pub fn configured(&self) -> Vec<PredicateKind> {
        PredicateKind::all()
            .iter()
            .copied()
            .filter(|k| self.has(*k))
            .collect()
    }

    /// true when no predicate is configured
    pub fn is_empty(&self) -> bool {
        self.configured().is_empty()
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.combinator)?;
        let mut first = true;
        let mut part = |f: &mut fmt::Formatter<'_>, kind: &str, value: &dyn fmt::Display| {
            let sep = if first { "" } else { ", " };
            first = false;
            write!(f, "{}{}={}", sep, kind, value)
        };
        if let Some(p) = &self.param {
            part(f, "param", p)?;
        }
        if let Some(h) = &self.hash {
            part(f, "hash", h)?;
        }
        if let Some(l) = &self.lang {
            part(f, "lang", l)?;
        }
        if let Some(m) = &self.media {
            part(f, "media", m)?;
        }
        if let Some(s) = &self.support {
            part(f, "support", s)?;
        }
        if let Some(n) = &self.network {
            part(f, "network", n)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_spec_parse() {
        assert_eq!(
            ParamSpec::parse("debug"),
            Some(ParamSpec::Name("debug".to_string()))
        );
        assert_eq!(
            ParamSpec::parse("mode=dark"),
            Some(ParamSpec::NameValue {
                name: "mode".to_string(),
                value: "dark".to_string()
            })
        );
        // split on the first '=' only
        assert_eq!(
            ParamSpec::parse("q=a=b").and_then(|p| p.value().map(str::to_string)),
            Some("a=b".to_string())
        );
        // empty value is still a value requirement
        assert_eq!(ParamSpec::parse("mode=").unwrap().value(), Some(""));

        assert_eq!(ParamSpec::parse(""), None);
        assert_eq!(ParamSpec::parse("=dark"), None);
    }

    #[test]
    fn test_param_spec_display() {
        assert_eq!(ParamSpec::parse("mode=dark").unwrap().to_string(), "mode=dark");
        assert_eq!(ParamSpec::parse("debug").unwrap().to_string(), "debug");
    }

    #[test]
    fn test_network_state_parse() {
        assert_eq!(NetworkState::parse("online"), Some(NetworkState::Online));
        assert_eq!(NetworkState::parse("offline"), Some(NetworkState::Offline));
        assert_eq!(NetworkState::parse("Online"), None);
        assert_eq!(NetworkState::parse(""), None);

        assert!(NetworkState::Offline.is_satisfied_by(false));
        assert!(!NetworkState::Offline.is_satisfied_by(true));
        assert!(NetworkState::Online.is_satisfied_by(true));
    }

    #[test]
    fn test_predicate_kind_roundtrip_names() {
        for kind in PredicateKind::all() {
            assert_eq!(PredicateKind::parse(kind.as_str()), Some(*kind));
        }
        assert_eq!(PredicateKind::parse("container"), None);
    }

    #[test]
    fn test_configuration_configured() {
        let config = Configuration {
            hash: Some("intro".to_string()),
            network: Some(NetworkState::Offline),
            ..Default::default()
        };
        assert_eq!(
            config.configured(),
            vec![PredicateKind::Hash, PredicateKind::Network]
        );
        assert!(!config.is_empty());
        assert!(Configuration::default().is_empty());
    }

    #[test]
    fn test_configuration_display() {
        let config = Configuration {
            param: ParamSpec::parse("mode=dark"),
            media: Some("(min-width: 600px)".to_string()),
            combinator: Combinator::Any,
            ..Default::default()
        };
        assert_eq!(
            config.to_string(),
            "any(param=mode=dark, media=(min-width: 600px))"
        );
        assert_eq!(Configuration::default().to_string(), "all()");
    }
}
