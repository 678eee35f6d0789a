//! per-element subscription table
//!
//! keys are derived from the configuration, so reconciliation is a plain set
//! difference between the keys the configuration requires and the keys held.
//! the media key carries its query string: changing the query in place yields
//! a different key and therefore a revoke + install.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::conditions::Configuration;
use crate::environment::{Listener, Notifier, Source, Subscription};

/// identifies one external source an element must observe
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SubscriptionKey {
    Hash,
    Network,
    Media(String),
}

impl SubscriptionKey {
    pub fn source(&self) -> Source {
        match self {
            SubscriptionKey::Hash => Source::Hash,
            SubscriptionKey::Network => Source::Network,
            SubscriptionKey::Media(query) => Source::Media(query.clone()),
        }
    }
}

impl fmt::Display for SubscriptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptionKey::Hash => write!(f, "hash"),
            SubscriptionKey::Network => write!(f, "network"),
            SubscriptionKey::Media(query) => write!(f, "media:{}", query),
        }
    }
}

impl Serialize for SubscriptionKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// keys a configuration needs observed
pub fn required_keys(config: &Configuration) -> BTreeSet<SubscriptionKey> {
    let mut keys = BTreeSet::new();
    if config.hash.is_some() {
        keys.insert(SubscriptionKey::Hash);
    }
    if config.network.is_some() {
        keys.insert(SubscriptionKey::Network);
    }
    if let Some(media) = &config.media {
        keys.insert(SubscriptionKey::Media(media.clone()));
    }
    keys
}

/// what one reconciliation changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub installed: Vec<SubscriptionKey>,
    pub revoked: Vec<SubscriptionKey>,
    /// required keys the host could not observe
    pub declined: Vec<SubscriptionKey>,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.installed.is_empty() && self.revoked.is_empty()
    }
}

/// owns the live subscriptions of one element
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    held: BTreeMap<SubscriptionKey, Subscription>,
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// bring held subscriptions in line with the configuration
    ///
    /// `make_listener` is called once per newly installed key.
    pub fn reconcile<N, F>(
        &mut self,
        config: &Configuration,
        notifier: &N,
        mut make_listener: F,
    ) -> ReconcileReport
    where
        N: Notifier + ?Sized,
        F: FnMut(&SubscriptionKey) -> Listener,
    {
        let required = required_keys(config);
        let mut report = ReconcileReport::default();

        // held \ required
        let stale: Vec<SubscriptionKey> = self
            .held
            .keys()
            .filter(|k| !required.contains(*k))
            .cloned()
            .collect();
        for key in stale {
            if let Some(subscription) = self.held.remove(&key) {
                subscription.revoke();
                debug!(key = %key, "subscription revoked");
                report.revoked.push(key);
            }
        }

        // required \ held
        for key in required {
            if self.held.contains_key(&key) {
                continue;
            }
            match notifier.listen(&key.source(), make_listener(&key)) {
                Some(subscription) => {
                    debug!(key = %key, "subscription installed");
                    self.held.insert(key.clone(), subscription);
                    report.installed.push(key);
                }
                None => {
                    warn!(key = %key, "host cannot notify changes, predicate will not auto-refresh");
                    report.declined.push(key);
                }
            }
        }

        report
    }

    /// revoke everything; returns the revoked keys
    pub fn teardown_all(&mut self) -> Vec<SubscriptionKey> {
        let held = std::mem::take(&mut self.held);
        let mut revoked = Vec::with_capacity(held.len());
        for (key, subscription) in held {
            subscription.revoke();
            revoked.push(key);
        }
        if !revoked.is_empty() {
            debug!(count = revoked.len(), "all subscriptions revoked");
        }
        revoked
    }

    pub fn keys(&self) -> Vec<SubscriptionKey> {
        self.held.keys().cloned().collect()
    }

    pub fn contains(&self, key: &SubscriptionKey) -> bool {
        self.held.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}
