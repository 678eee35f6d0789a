//! condition evaluator
//!
//! evaluates a configuration against the host's oracles. pure: reads the
//! environment, never mutates anything.

use serde::Serialize;
use tracing::trace;

use super::types::{Combinator, Configuration, NetworkState, Outcome, ParamSpec, PredicateKind};
use crate::environment::{Environment, QueryString};

/// per-predicate breakdown of one evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub combinator: Combinator,
    pub outcomes: Vec<PredicateOutcome>,
    pub matched: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredicateOutcome {
    pub kind: PredicateKind,
    pub outcome: Outcome,
}

impl Evaluation {
    /// outcome of one predicate kind
    pub fn outcome(&self, kind: PredicateKind) -> Outcome {
        self.outcomes
            .iter()
            .find(|p| p.kind == kind)
            .map(|p| p.outcome)
            .unwrap_or(Outcome::Absent)
    }
}

/// evaluate a configuration: true when its conditions hold
pub fn evaluate<E: Environment + ?Sized>(config: &Configuration, env: &E) -> bool {
    let outcomes = PredicateKind::all()
        .iter()
        .map(|kind| evaluate_predicate(*kind, config, env));
    combine(config.combinator, outcomes)
}

/// evaluate a configuration and keep every predicate's outcome
pub fn evaluate_detailed<E: Environment + ?Sized>(config: &Configuration, env: &E) -> Evaluation {
    let outcomes: Vec<PredicateOutcome> = PredicateKind::all()
        .iter()
        .map(|kind| PredicateOutcome {
            kind: *kind,
            outcome: evaluate_predicate(*kind, config, env),
        })
        .collect();
    let matched = combine(config.combinator, outcomes.iter().map(|p| p.outcome));

    Evaluation {
        combinator: config.combinator,
        outcomes,
        matched,
    }
}

/// fold outcomes with the combinator
///
/// - all: absent never vetoes, so no predicates at all is true
/// - any: absent contributes nothing, so no predicates at all is false
pub fn combine(combinator: Combinator, outcomes: impl IntoIterator<Item = Outcome>) -> bool {
    let mut outcomes = outcomes.into_iter();
    match combinator {
        Combinator::All => outcomes.all(|o| o != Outcome::Unmatched),
        Combinator::Any => outcomes.any(|o| o.is_matched()),
    }
}

/// evaluate one predicate of a configuration
pub fn evaluate_predicate<E: Environment + ?Sized>(
    kind: PredicateKind,
    config: &Configuration,
    env: &E,
) -> Outcome {
    let outcome = match kind {
        PredicateKind::Param => config
            .param
            .as_ref()
            .map_or(Outcome::Absent, |spec| check_param(spec, env)),
        PredicateKind::Hash => config
            .hash
            .as_deref()
            .map_or(Outcome::Absent, |hash| check_hash(hash, env)),
        PredicateKind::Lang => config
            .lang
            .as_deref()
            .map_or(Outcome::Absent, |lang| check_lang(lang, env)),
        PredicateKind::Media => config
            .media
            .as_deref()
            .map_or(Outcome::Absent, |media| check_media(media, env)),
        PredicateKind::Support => config
            .support
            .as_deref()
            .map_or(Outcome::Absent, |support| check_support(support, env)),
        PredicateKind::Network => config
            .network
            .map_or(Outcome::Absent, |network| check_network(network, env)),
    };
    trace!(kind = %kind, outcome = %outcome, "predicate evaluated");
    outcome
}

// ============================================================================
// Predicates
// ============================================================================

fn check_param<E: Environment + ?Sized>(spec: &ParamSpec, env: &E) -> Outcome {
    let query = QueryString::parse(&env.query_string());
    let matched = match spec {
        ParamSpec::Name(name) => query.has(name),
        ParamSpec::NameValue { name, value } => query.has_value(name, value),
    };
    Outcome::from_bool(matched)
}

fn check_hash<E: Environment + ?Sized>(hash: &str, env: &E) -> Outcome {
    Outcome::from_bool(env.fragment() == hash)
}

fn check_lang<E: Environment + ?Sized>(lang: &str, env: &E) -> Outcome {
    Outcome::from_bool(env.languages().iter().any(|l| l == lang))
}

// readers the host lacks degrade to absent

fn check_media<E: Environment + ?Sized>(media: &str, env: &E) -> Outcome {
    env.media_matches(media)
        .map_or(Outcome::Absent, Outcome::from_bool)
}

fn check_support<E: Environment + ?Sized>(support: &str, env: &E) -> Outcome {
    env.supports(support).map_or(Outcome::Absent, Outcome::from_bool)
}

fn check_network<E: Environment + ?Sized>(network: NetworkState, env: &E) -> Outcome {
    env.online().map_or(Outcome::Absent, |online| {
        Outcome::from_bool(network.is_satisfied_by(online))
    })
}
