//! host environment seen by conditional elements
//!
//! the engine never reads global state; everything it needs comes through
//! two injected traits:
//! - [`Environment`]: read-only oracles (query string, fragment, languages,
//!   media/support/network state)
//! - [`Notifier`]: change notifications for the sources that can change
//!   while an element is attached (fragment, network, media queries)
//!
//! [`SimulatedHost`] implements both over in-memory state.

mod events;
mod host;
mod location;
mod media;
mod supports;

pub use events::{Event, EventBus, EventData, EventType, Listener, Source, Subscription};
pub use host::{HostCapabilities, SimulatedHost};
pub use location::{Location, QueryString};
pub use media::{ColorScheme, MediaType, Viewport};
pub use supports::SupportTable;

/// read-only oracles for predicate evaluation
///
/// readers returning `Option` report `None` when the host lacks the
/// capability; the corresponding predicate then degrades to absent.
pub trait Environment {
    /// raw query string, with or without the leading '?'
    fn query_string(&self) -> String;

    /// current fragment without the leading '#'
    fn fragment(&self) -> String;

    /// preferred languages, most preferred first
    fn languages(&self) -> Vec<String>;

    /// whether a media query currently matches
    fn media_matches(&self, query: &str) -> Option<bool>;

    /// whether a feature-support query is supported
    fn supports(&self, query: &str) -> Option<bool>;

    /// current online flag
    fn online(&self) -> Option<bool>;
}

/// registers change listeners on external sources
pub trait Notifier {
    /// install a listener for `source`
    ///
    /// returns None when the host has no change notifications for that
    /// source; nothing is installed in that case.
    fn listen(&self, source: &Source, listener: Listener) -> Option<Subscription>;
}

/// a host provides both oracles and notifications
pub trait Host: Environment + Notifier {}

impl<T: Environment + Notifier + ?Sized> Host for T {}
