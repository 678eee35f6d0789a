//! event system for host environment changes
//!
//! provides event types, an event bus that keeps listeners keyed by id,
//! and revocable subscription handles. everything here is single-threaded:
//! listeners run synchronously inside `emit`.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::rc::{Rc, Weak};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// how many events the bus keeps for inspection
const RECENT_EVENTS_LIMIT: usize = 100;

// ============================================================================
// Event Types
// ============================================================================

/// all supported event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventType {
    /// fragment changed
    #[serde(rename = "hashchange")]
    HashChange,
    /// host went online
    #[serde(rename = "online")]
    Online,
    /// host went offline
    #[serde(rename = "offline")]
    Offline,
    /// a media query flipped between matching and not matching
    #[serde(rename = "media.change")]
    MediaChange,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::HashChange => "hashchange",
            EventType::Online => "online",
            EventType::Offline => "offline",
            EventType::MediaChange => "media.change",
        }
    }

    pub fn all() -> &'static [EventType] {
        &[
            EventType::HashChange,
            EventType::Online,
            EventType::Offline,
            EventType::MediaChange,
        ]
    }

    pub fn parse(s: &str) -> Option<EventType> {
        Self::all().iter().copied().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Event Data
// ============================================================================

/// event-specific data
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventData {
    Hash { old_hash: String, new_hash: String },
    Network { online: bool },
    Media { media: String, matches: bool },
}

/// a single event
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// timestamp (ISO 8601)
    pub ts: DateTime<Utc>,
    pub data: EventData,
}

impl Event {
    pub fn new(event_type: EventType, data: EventData) -> Self {
        Self {
            event_type,
            ts: Utc::now(),
            data,
        }
    }

    pub fn hash_change(old_hash: impl Into<String>, new_hash: impl Into<String>) -> Self {
        Self::new(
            EventType::HashChange,
            EventData::Hash {
                old_hash: old_hash.into(),
                new_hash: new_hash.into(),
            },
        )
    }

    pub fn network(online: bool) -> Self {
        let event_type = if online {
            EventType::Online
        } else {
            EventType::Offline
        };
        Self::new(event_type, EventData::Network { online })
    }

    pub fn media_change(media: impl Into<String>, matches: bool) -> Self {
        Self::new(
            EventType::MediaChange,
            EventData::Media {
                media: media.into(),
                matches,
            },
        )
    }
}

// ============================================================================
// Sources
// ============================================================================

/// an observable external source
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Source {
    /// fragment changes
    Hash,
    /// online and offline transitions
    Network,
    /// match changes of one media query
    Media(String),
}

impl Source {
    /// check whether a listener on this source receives the event
    pub fn receives(&self, event: &Event) -> bool {
        match (self, event.event_type) {
            (Source::Hash, EventType::HashChange) => true,
            (Source::Network, EventType::Online | EventType::Offline) => true,
            (Source::Media(query), EventType::MediaChange) => {
                matches!(&event.data, EventData::Media { media, .. } if media == query)
            }
            _ => false,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Hash => write!(f, "hash"),
            Source::Network => write!(f, "network"),
            Source::Media(query) => write!(f, "media:{}", query),
        }
    }
}

// ============================================================================
// Subscription
// ============================================================================

/// callback invoked for every event delivered to a listener
pub type Listener = Rc<dyn Fn(&Event)>;

/// revocable handle to one listener registration
///
/// revoking is idempotent; dropping the handle revokes it.
pub struct Subscription {
    source: Source,
    revoker: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl Subscription {
    /// create a handle that runs `revoke` the first time it is revoked
    pub fn new(source: Source, revoke: impl FnOnce() + 'static) -> Self {
        Self {
            source,
            revoker: RefCell::new(Some(Box::new(revoke))),
        }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn is_revoked(&self) -> bool {
        self.revoker.borrow().is_none()
    }

    /// remove the listener; later calls do nothing
    pub fn revoke(&self) {
        let revoker = self.revoker.borrow_mut().take();
        if let Some(revoke) = revoker {
            revoke();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.revoke();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("source", &self.source)
            .field("revoked", &self.is_revoked())
            .finish()
    }
}

// ============================================================================
// EventBus
// ============================================================================

struct Registration {
    source: Source,
    listener: Listener,
}

#[derive(Default)]
struct BusState {
    next_id: Cell<u64>,
    listeners: RefCell<BTreeMap<u64, Registration>>,
    recent_events: RefCell<VecDeque<Event>>,
}

impl BusState {
    fn remove(&self, id: u64) {
        self.listeners.borrow_mut().remove(&id);
    }
}

/// manages listeners and dispatches events to them
///
/// cloning yields another handle to the same bus.
#[derive(Clone, Default)]
pub struct EventBus {
    state: Rc<BusState>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// register a listener for a source
    pub fn subscribe(&self, source: Source, listener: Listener) -> Subscription {
        let id = self.state.next_id.get() + 1;
        self.state.next_id.set(id);

        self.state.listeners.borrow_mut().insert(
            id,
            Registration {
                source: source.clone(),
                listener,
            },
        );

        let bus: Weak<BusState> = Rc::downgrade(&self.state);
        Subscription::new(source, move || {
            if let Some(bus) = bus.upgrade() {
                bus.remove(id);
            }
        })
    }

    /// deliver an event to every listener of a matching source
    ///
    /// listeners run after the registry borrow is released, so they may
    /// subscribe or revoke; a listener revoked mid-dispatch is skipped.
    pub fn emit(&self, event: Event) {
        {
            let mut recent = self.state.recent_events.borrow_mut();
            recent.push_back(event.clone());
            while recent.len() > RECENT_EVENTS_LIMIT {
                recent.pop_front();
            }
        }

        let targets: Vec<(u64, Listener)> = self
            .state
            .listeners
            .borrow()
            .iter()
            .filter(|(_, reg)| reg.source.receives(&event))
            .map(|(id, reg)| (*id, Rc::clone(&reg.listener)))
            .collect();

        for (id, listener) in targets {
            let still_registered = self.state.listeners.borrow().contains_key(&id);
            if still_registered {
                listener(&event);
            }
        }
    }

    /// number of live listeners
    pub fn listener_count(&self) -> usize {
        self.state.listeners.borrow().len()
    }

    /// distinct media queries that currently have listeners
    pub fn observed_media(&self) -> Vec<String> {
        let mut queries: Vec<String> = self
            .state
            .listeners
            .borrow()
            .values()
            .filter_map(|reg| match &reg.source {
                Source::Media(query) => Some(query.clone()),
                _ => None,
            })
            .collect();
        queries.sort();
        queries.dedup();
        queries
    }

    /// take and clear the recent event log
    pub fn drain_recent(&self) -> Vec<Event> {
        self.state.recent_events.borrow_mut().drain(..).collect()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
