//! conditional elements
//!
//! one implementation for every flavor: declared attributes are parsed into a
//! configuration, evaluated against the host, and the result is reflected as
//! the `hidden` flag. live flavors keep a subscription per changing source
//! while attached and re-evaluate when the host notifies them.

mod flavor;
mod registry;
mod subscriptions;

pub use flavor::{Flavor, FlavorProfile, Polarity};
pub use registry::{is_valid_tag, ElementRegistry, RegistryError};
pub use subscriptions::{required_keys, ReconcileReport, SubscriptionKey, SubscriptionManager};

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::conditions::{evaluate_detailed, parse_attributes, Configuration, Evaluation};
use crate::environment::{Event, Host, Listener};

/// attribute reflecting the hidden flag
pub const HIDDEN_ATTRIBUTE: &str = "hidden";

/// state shared with subscription listeners
struct ElementState {
    flavor: Flavor,
    attributes: BTreeMap<String, String>,
    config: Configuration,
    evaluation: Evaluation,
    hidden: bool,
    connected: bool,
    evaluations: u64,
    visibility_changes: u64,
}

impl ElementState {
    fn recompute(&mut self) {
        self.config = parse_attributes(&self.attributes, self.flavor.schema());
    }

    /// evaluate and set the hidden flag; returns true when it changed
    ///
    /// the `hidden` attribute is re-asserted even when the flag is unchanged.
    fn apply(&mut self, host: &dyn Host) -> bool {
        let evaluation = evaluate_detailed(&self.config, host);
        let hidden = self.flavor.polarity().hidden_for(evaluation.matched);
        self.evaluation = evaluation;
        self.evaluations += 1;

        let changed = hidden != self.hidden;
        self.set_hidden(hidden);
        if changed {
            self.visibility_changes += 1;
        }
        changed
    }

    fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
        if hidden {
            self.attributes
                .insert(HIDDEN_ATTRIBUTE.to_string(), String::new());
        } else {
            self.attributes.remove(HIDDEN_ATTRIBUTE);
        }
    }
}

/// a conditionally visible element bound to a host
pub struct ConditionalElement {
    tag: String,
    state: Rc<RefCell<ElementState>>,
    host: Rc<dyn Host>,
    subscriptions: SubscriptionManager,
}

impl ConditionalElement {
    /// detached element under the flavor's default tag
    pub fn new(flavor: Flavor, host: Rc<dyn Host>) -> Self {
        Self::with_tag(flavor.default_tag(), flavor, host)
    }

    /// detached element under a custom tag; evaluated immediately
    pub fn with_tag(tag: &str, flavor: Flavor, host: Rc<dyn Host>) -> Self {
        let attributes = BTreeMap::new();
        let config = parse_attributes(&attributes, flavor.schema());
        let evaluation = evaluate_detailed(&config, host.as_ref());
        let hidden = flavor.polarity().hidden_for(evaluation.matched);

        let mut state = ElementState {
            flavor,
            attributes,
            config,
            evaluation,
            hidden: false,
            connected: false,
            evaluations: 1,
            visibility_changes: 0,
        };
        state.set_hidden(hidden);

        Self {
            tag: tag.to_string(),
            state: Rc::new(RefCell::new(state)),
            host,
            subscriptions: SubscriptionManager::new(),
        }
    }

    // ------------------------------------------------------------------
    // attributes
    // ------------------------------------------------------------------

    /// set an attribute; names are case-insensitive
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        let previous = self
            .state
            .borrow_mut()
            .attributes
            .insert(name.clone(), value.to_string());
        if previous.as_deref() != Some(value) {
            self.attribute_changed(&name);
        }
    }

    pub fn remove_attribute(&mut self, name: &str) {
        let name = name.to_ascii_lowercase();
        let previous = self.state.borrow_mut().attributes.remove(&name);
        if previous.is_some() {
            self.attribute_changed(&name);
        }
    }

    /// toggle a boolean attribute; returns whether it is now present
    pub fn toggle_attribute(&mut self, name: &str, force: Option<bool>) -> bool {
        let present = self.has_attribute(name);
        match (present, force) {
            (true, Some(true)) => true,
            (false, Some(false)) => false,
            (true, _) => {
                self.remove_attribute(name);
                false
            }
            (false, _) => {
                self.set_attribute(name, "");
                true
            }
        }
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.state
            .borrow()
            .attributes
            .get(&name.to_ascii_lowercase())
            .cloned()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.state
            .borrow()
            .attributes
            .contains_key(&name.to_ascii_lowercase())
    }

    pub fn attributes(&self) -> BTreeMap<String, String> {
        self.state.borrow().attributes.clone()
    }

    fn attribute_changed(&mut self, name: &str) {
        let observed = self.flavor().schema().is_observed(name);
        if !observed {
            trace!(tag = %self.tag, attribute = name, "unobserved attribute changed");
            return;
        }
        debug!(tag = %self.tag, attribute = name, "observed attribute changed");
        self.update();
    }

    // ------------------------------------------------------------------
    // lifecycle
    // ------------------------------------------------------------------

    /// attach to the document; no-op when already attached
    pub fn connect(&mut self) {
        {
            let mut state = self.state.borrow_mut();
            if state.connected {
                return;
            }
            state.connected = true;
        }
        debug!(tag = %self.tag, "connected");
        self.update();
    }

    /// detach; every subscription is revoked before this returns
    pub fn disconnect(&mut self) {
        {
            let mut state = self.state.borrow_mut();
            if !state.connected {
                return;
            }
            state.connected = false;
        }
        let revoked = self.subscriptions.teardown_all();
        debug!(tag = %self.tag, revoked = revoked.len(), "disconnected");
    }

    /// re-evaluate against the current environment
    ///
    /// returns true when the hidden flag changed.
    pub fn refresh(&self) -> bool {
        self.state.borrow_mut().apply(self.host.as_ref())
    }

    /// recompute the configuration, reconcile subscriptions, evaluate
    fn update(&mut self) -> ReconcileReport {
        let (config, connected, live) = {
            let mut guard = self.state.borrow_mut();
            guard.recompute();
            (guard.config.clone(), guard.connected, guard.flavor.is_live())
        };

        let report = if connected && live {
            let state = &self.state;
            let host = &self.host;
            self.subscriptions
                .reconcile(&config, host.as_ref(), |key| listener(state, host, key))
        } else {
            ReconcileReport::default()
        };

        self.refresh();
        report
    }

    // ------------------------------------------------------------------
    // accessors
    // ------------------------------------------------------------------

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn flavor(&self) -> Flavor {
        self.state.borrow().flavor
    }

    pub fn is_connected(&self) -> bool {
        self.state.borrow().connected
    }

    pub fn is_hidden(&self) -> bool {
        self.state.borrow().hidden
    }

    pub fn is_visible(&self) -> bool {
        !self.is_hidden()
    }

    /// whether the conditions held at the last evaluation
    pub fn matches(&self) -> bool {
        self.state.borrow().evaluation.matched
    }

    pub fn evaluation(&self) -> Evaluation {
        self.state.borrow().evaluation.clone()
    }

    pub fn configuration(&self) -> Configuration {
        self.state.borrow().config.clone()
    }

    pub fn subscription_keys(&self) -> Vec<SubscriptionKey> {
        self.subscriptions.keys()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn evaluation_count(&self) -> u64 {
        self.state.borrow().evaluations
    }

    pub fn visibility_changes(&self) -> u64 {
        self.state.borrow().visibility_changes
    }
}

impl fmt::Debug for ConditionalElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ConditionalElement")
            .field("tag", &self.tag)
            .field("flavor", &state.flavor)
            .field("attributes", &state.attributes)
            .field("hidden", &state.hidden)
            .field("connected", &state.connected)
            .field("subscriptions", &self.subscriptions.keys())
            .finish()
    }
}

/// listener re-evaluating an element when one of its sources changes
///
/// holds only weak references, so the host never keeps an element alive.
fn listener(
    state: &Rc<RefCell<ElementState>>,
    host: &Rc<dyn Host>,
    key: &SubscriptionKey,
) -> Listener {
    let state = Rc::downgrade(state);
    let host = Rc::downgrade(host);
    let key = key.clone();

    Rc::new(move |event: &Event| {
        let (Some(state), Some(host)) = (state.upgrade(), host.upgrade()) else {
            return;
        };
        let mut state = state.borrow_mut();
        if !state.connected {
            return;
        }
        trace!(key = %key, event = %event.event_type, "re-evaluating on notification");
        state.apply(host.as_ref());
    })
}
