//! in-process host environment
//!
//! holds location, languages, network flag, viewport and supported
//! declarations, and emits change events on its bus when they change.

use std::cell::RefCell;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::events::{Event, EventBus, Listener, Source, Subscription};
use super::location::Location;
use super::media::{ColorScheme, MediaType, Viewport};
use super::supports::SupportTable;
use super::{Environment, Notifier};

/// which host mechanisms are available
///
/// a missing reader makes the matching predicate absent; a missing event
/// source makes `listen` decline for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostCapabilities {
    /// media queries can be evaluated
    pub media: bool,
    /// media queries report match changes
    pub media_events: bool,
    /// support queries can be evaluated
    pub supports: bool,
    /// the online flag is readable
    pub network: bool,
    /// online/offline transitions are reported
    pub network_events: bool,
    /// fragment changes are reported
    pub hash_events: bool,
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self {
            media: true,
            media_events: true,
            supports: true,
            network: true,
            network_events: true,
            hash_events: true,
        }
    }
}

#[derive(Debug, Clone)]
struct HostState {
    location: Location,
    languages: Vec<String>,
    online: bool,
    viewport: Viewport,
    supports: SupportTable,
}

/// a host environment backed by in-memory state
#[derive(Debug)]
pub struct SimulatedHost {
    state: RefCell<HostState>,
    capabilities: HostCapabilities,
    bus: EventBus,
}

impl Default for SimulatedHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedHost {
    /// host at "/" with languages ["en-US", "en"], online, default viewport
    pub fn new() -> Self {
        Self::with_capabilities(HostCapabilities::default())
    }

    pub fn with_capabilities(capabilities: HostCapabilities) -> Self {
        Self {
            state: RefCell::new(HostState {
                location: Location::parse("/"),
                languages: vec!["en-US".to_string(), "en".to_string()],
                online: true,
                viewport: Viewport::default(),
                supports: SupportTable::new(),
            }),
            capabilities,
            bus: EventBus::new(),
        }
    }

    pub fn capabilities(&self) -> HostCapabilities {
        self.capabilities
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn location(&self) -> Location {
        self.state.borrow().location.clone()
    }

    pub fn viewport(&self) -> Viewport {
        self.state.borrow().viewport.clone()
    }

    pub fn is_online(&self) -> bool {
        self.state.borrow().online
    }

    // ------------------------------------------------------------------
    // mutators; each releases the state borrow before emitting
    // ------------------------------------------------------------------

    /// move to a new URL; emits hashchange if the fragment changed
    pub fn navigate(&self, url: &str) {
        let new_location = Location::parse(url);
        let old_hash = {
            let mut state = self.state.borrow_mut();
            let old_hash = state.location.hash.clone();
            state.location = new_location;
            old_hash
        };
        debug!(url, "navigated");
        self.emit_hash_change(old_hash);
    }

    /// change only the fragment (leading '#' optional)
    pub fn set_hash(&self, hash: &str) {
        let hash = hash.strip_prefix('#').unwrap_or(hash).to_string();
        let old_hash = {
            let mut state = self.state.borrow_mut();
            std::mem::replace(&mut state.location.hash, hash)
        };
        self.emit_hash_change(old_hash);
    }

    fn emit_hash_change(&self, old_hash: String) {
        let new_hash = self.state.borrow().location.hash.clone();
        if old_hash != new_hash {
            self.bus.emit(Event::hash_change(old_hash, new_hash));
        }
    }

    pub fn set_languages<I, S>(&self, languages: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.borrow_mut().languages = languages.into_iter().map(Into::into).collect();
    }

    /// change the online flag; emits online/offline on transitions
    pub fn set_online(&self, online: bool) {
        let changed = {
            let mut state = self.state.borrow_mut();
            let changed = state.online != online;
            state.online = online;
            changed
        };
        if changed {
            debug!(online, "network state changed");
            self.bus.emit(Event::network(online));
        }
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.update_viewport(|vp| {
            vp.width = width;
            vp.height = height;
        });
    }

    pub fn set_color_scheme(&self, scheme: ColorScheme) {
        self.update_viewport(|vp| vp.color_scheme = scheme);
    }

    pub fn set_reduced_motion(&self, reduced: bool) {
        self.update_viewport(|vp| vp.reduced_motion = reduced);
    }

    pub fn set_media_type(&self, media_type: MediaType) {
        self.update_viewport(|vp| vp.media_type = media_type);
    }

    pub fn set_hover(&self, hover: bool) {
        self.update_viewport(|vp| vp.hover = hover);
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        self.update_viewport(|vp| *vp = viewport);
    }

    /// apply a viewport change and emit `change` for observed queries that flipped
    fn update_viewport(&self, change: impl FnOnce(&mut Viewport)) {
        let observed = self.bus.observed_media();
        let before: BTreeMap<String, bool> = {
            let state = self.state.borrow();
            observed
                .iter()
                .map(|q| (q.clone(), state.viewport.matches(q)))
                .collect()
        };

        let after: BTreeMap<String, bool> = {
            let mut state = self.state.borrow_mut();
            change(&mut state.viewport);
            observed
                .iter()
                .map(|q| (q.clone(), state.viewport.matches(q)))
                .collect()
        };

        for (query, matches) in after {
            if before.get(&query) != Some(&matches) {
                debug!(query = %query, matches, "media query changed");
                self.bus.emit(Event::media_change(query, matches));
            }
        }
    }

    /// allow a supported declaration, e.g. "display: grid" or "gap: *"
    pub fn allow_support(&self, entry: &str) -> bool {
        self.state.borrow_mut().supports.allow(entry)
    }

    pub fn set_support_table(&self, table: SupportTable) {
        self.state.borrow_mut().supports = table;
    }
}

impl Environment for SimulatedHost {
    fn query_string(&self) -> String {
        self.state.borrow().location.search.clone()
    }

    fn fragment(&self) -> String {
        self.state.borrow().location.hash.clone()
    }

    fn languages(&self) -> Vec<String> {
        self.state.borrow().languages.clone()
    }

    fn media_matches(&self, query: &str) -> Option<bool> {
        if !self.capabilities.media {
            return None;
        }
        Some(self.state.borrow().viewport.matches(query))
    }

    fn supports(&self, query: &str) -> Option<bool> {
        if !self.capabilities.supports {
            return None;
        }
        Some(self.state.borrow().supports.supports(query))
    }

    fn online(&self) -> Option<bool> {
        if !self.capabilities.network {
            return None;
        }
        Some(self.state.borrow().online)
    }
}

impl Notifier for SimulatedHost {
    fn listen(&self, source: &Source, listener: Listener) -> Option<Subscription> {
        let available = match source {
            Source::Hash => self.capabilities.hash_events,
            Source::Network => self.capabilities.network_events,
            Source::Media(_) => self.capabilities.media && self.capabilities.media_events,
        };
        if !available {
            trace!(source = %source, "no change notifications for source");
            return None;
        }
        Some(self.bus.subscribe(source.clone(), listener))
    }
}
