//! scenario execution
//!
//! builds a simulated host and the declared elements, applies each step and
//! records the visibility of every element after it.

use std::rc::Rc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{EnvironmentConfig, Scenario, Step};
use crate::element::{ConditionalElement, ElementRegistry, RegistryError, SubscriptionKey};
use crate::environment::{Event, Host, SimulatedHost, SupportTable};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScenarioError {
    #[error("step {step}: unknown element '{id}'")]
    UnknownElement { step: usize, id: String },

    #[error("duplicate element id '{0}'")]
    DuplicateElement(String),

    #[error("element '{id}': {source}")]
    Registry {
        id: String,
        #[source]
        source: RegistryError,
    },

    #[error("invalid definition: {0}")]
    Definition(#[from] RegistryError),

    #[error("invalid support entry '{0}', expected 'property: value'")]
    InvalidSupport(String),
}

/// state of one element after a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementSnapshot {
    pub id: String,
    pub tag: String,
    pub visible: bool,
    /// visibility differs from the previous record
    pub changed: bool,
    pub connected: bool,
    pub configuration: String,
    pub subscriptions: Vec<SubscriptionKey>,
    pub evaluations: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    /// 0 is the initial state, steps count from 1
    pub index: usize,
    pub description: String,
    pub events: Vec<Event>,
    pub elements: Vec<ElementSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub records: Vec<StepRecord>,
}

impl Trace {
    /// snapshot of an element in the last record
    pub fn final_state(&self, id: &str) -> Option<&ElementSnapshot> {
        self.records
            .last()
            .and_then(|r| r.elements.iter().find(|e| e.id == id))
    }

    /// visibility of an element after every record
    pub fn visibility_of(&self, id: &str) -> Vec<bool> {
        self.records
            .iter()
            .filter_map(|r| r.elements.iter().find(|e| e.id == id))
            .map(|e| e.visible)
            .collect()
    }
}

/// build a simulated host from its scenario description
pub fn build_host(env: &EnvironmentConfig) -> Result<Rc<SimulatedHost>, ScenarioError> {
    let host = SimulatedHost::with_capabilities(env.capabilities);
    host.navigate(&env.url);
    host.set_languages(env.languages.iter().cloned());
    host.set_online(env.online);
    host.set_viewport(env.viewport.clone());

    let table = SupportTable::from_entries(&env.supports).map_err(ScenarioError::InvalidSupport)?;
    host.set_support_table(table);

    // setup events are not part of the trace
    host.bus().drain_recent();
    Ok(Rc::new(host))
}

struct ScenarioElement {
    id: String,
    element: ConditionalElement,
    last_visible: bool,
}

/// a running scenario
pub struct Session {
    host: Rc<SimulatedHost>,
    elements: Vec<ScenarioElement>,
}

impl Session {
    pub fn new(scenario: &Scenario) -> Result<Self, ScenarioError> {
        let host = build_host(&scenario.environment)?;

        let mut registry = ElementRegistry::with_defaults();
        for (tag, flavor) in &scenario.definitions {
            registry.define(tag, *flavor)?;
        }

        let mut elements: Vec<ScenarioElement> = Vec::with_capacity(scenario.elements.len());
        for config in &scenario.elements {
            if elements.iter().any(|e| e.id == config.id) {
                return Err(ScenarioError::DuplicateElement(config.id.clone()));
            }

            let dyn_host: Rc<dyn Host> = host.clone();
            let mut element =
                registry
                    .create(&config.tag, dyn_host)
                    .map_err(|source| ScenarioError::Registry {
                        id: config.id.clone(),
                        source,
                    })?;
            for (name, value) in &config.attributes {
                element.set_attribute(name, value);
            }
            if config.connected {
                element.connect();
            }

            debug!(id = %config.id, tag = %config.tag, visible = element.is_visible(), "element created");
            elements.push(ScenarioElement {
                id: config.id.clone(),
                last_visible: element.is_visible(),
                element,
            });
        }

        Ok(Self { host, elements })
    }

    pub fn host(&self) -> &Rc<SimulatedHost> {
        &self.host
    }

    pub fn element(&self, id: &str) -> Option<&ConditionalElement> {
        self.elements
            .iter()
            .find(|e| e.id == id)
            .map(|e| &e.element)
    }

    fn element_mut(&mut self, step: usize, id: &str) -> Result<&mut ConditionalElement, ScenarioError> {
        self.elements
            .iter_mut()
            .find(|e| e.id == id)
            .map(|e| &mut e.element)
            .ok_or_else(|| ScenarioError::UnknownElement {
                step,
                id: id.to_string(),
            })
    }

    /// apply one step; `index` is used for error reporting
    pub fn apply(&mut self, index: usize, step: &Step) -> Result<(), ScenarioError> {
        debug!(step = index, action = step.action(), "applying step");
        let host = Rc::clone(&self.host);

        match step {
            Step::SetHash { value } => host.set_hash(value),
            Step::Navigate { url } => host.navigate(url),
            Step::SetLanguages { value } => host.set_languages(value.iter().cloned()),
            Step::SetOnline { value } => host.set_online(*value),
            Step::Resize { width, height } => host.resize(*width, *height),
            Step::SetColorScheme { value } => host.set_color_scheme(*value),
            Step::SetReducedMotion { value } => host.set_reduced_motion(*value),
            Step::SetMediaType { value } => host.set_media_type(*value),
            Step::SetHover { value } => host.set_hover(*value),
            Step::AllowSupport { value } => {
                if !host.allow_support(value) {
                    return Err(ScenarioError::InvalidSupport(value.clone()));
                }
            }
            Step::SetAttribute {
                element,
                name,
                value,
            } => self.element_mut(index, element)?.set_attribute(name, value),
            Step::RemoveAttribute { element, name } => {
                self.element_mut(index, element)?.remove_attribute(name)
            }
            Step::ToggleAttribute {
                element,
                name,
                force,
            } => {
                self.element_mut(index, element)?
                    .toggle_attribute(name, *force);
            }
            Step::Connect { element } => self.element_mut(index, element)?.connect(),
            Step::Disconnect { element } => self.element_mut(index, element)?.disconnect(),
            Step::Refresh { element: Some(id) } => {
                self.element_mut(index, id)?.refresh();
            }
            Step::Refresh { element: None } => {
                for e in &self.elements {
                    e.element.refresh();
                }
            }
        }

        Ok(())
    }

    /// snapshot every element and take the events emitted since the last record
    pub fn record(&mut self, index: usize, description: impl Into<String>) -> StepRecord {
        let events = self.host.bus().drain_recent();
        let elements = self
            .elements
            .iter_mut()
            .map(|e| {
                let visible = e.element.is_visible();
                let changed = visible != e.last_visible;
                e.last_visible = visible;
                ElementSnapshot {
                    id: e.id.clone(),
                    tag: e.element.tag().to_string(),
                    visible,
                    changed,
                    connected: e.element.is_connected(),
                    configuration: e.element.configuration().to_string(),
                    subscriptions: e.element.subscription_keys(),
                    evaluations: e.element.evaluation_count(),
                }
            })
            .collect();

        StepRecord {
            index,
            description: description.into(),
            events,
            elements,
        }
    }
}

/// run a scenario from start to finish
pub fn run(scenario: &Scenario) -> Result<Trace, ScenarioError> {
    let mut session = Session::new(scenario)?;
    let mut records = Vec::with_capacity(scenario.steps.len() + 1);
    records.push(session.record(0, "initial"));

    for (i, step) in scenario.steps.iter().enumerate() {
        let index = i + 1;
        session.apply(index, step)?;
        records.push(session.record(index, step.to_string()));
    }

    info!(
        steps = scenario.steps.len(),
        elements = scenario.elements.len(),
        "scenario finished"
    );
    Ok(Trace {
        name: scenario.name.clone(),
        records,
    })
}
