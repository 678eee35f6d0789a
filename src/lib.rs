//! declarative conditional visibility
//!
//! elements declare conditions on the page URL, preferred languages, media
//! queries, feature support and network state; the engine evaluates them
//! against an injected host and keeps the result current while attached.

pub mod cli;
pub mod conditions;
pub mod config;
pub mod element;
pub mod environment;
pub mod logging;
pub mod runner;
