//! condition evaluation system for conditional elements
//!
//! a configuration holds up to six independently optional predicates:
//! - param: query parameter `name` or `name=value`
//! - hash: URL fragment
//! - lang: preferred language
//! - media: media query
//! - support: feature-support query
//! - network: online / offline
//!
//! each predicate evaluates to matched, unmatched or absent (not configured).
//! the combinator folds them: `all` lets absent predicates pass, `any` needs
//! at least one match.

mod eval;
mod parser;
mod types;

pub use eval::{
    combine, evaluate, evaluate_detailed, evaluate_predicate, Evaluation, PredicateOutcome,
};
pub use parser::{check_attributes, parse_attributes, AttributeSchema, MATCH_ANY_ATTRIBUTE};
pub use types::{Combinator, Configuration, NetworkState, Outcome, ParamSpec, PredicateKind};
