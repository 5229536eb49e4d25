//! # concierge-capabilities
//!
//! One `Capability` per integration domain. Remote domains are reached over
//! HTTP; reminders are served locally from the store.

pub mod http;
pub mod reminders;

pub use http::HttpCapability;
pub use reminders::ReminderCapability;

use concierge_core::{
    action::Domain, config::Config, error::CapabilityError, traits::Capability,
};
use concierge_memory::Store;
use std::{collections::HashMap, sync::Arc};
use tracing::{info, warn};

/// Domain → capability lookup used by the dispatcher.
#[derive(Clone, Default)]
pub struct Capabilities {
    services: HashMap<Domain, Arc<dyn Capability>>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability under its own domain, replacing any previous one.
    pub fn register(&mut self, capability: Arc<dyn Capability>) {
        self.services.insert(capability.domain(), capability);
    }

    /// Build the registry from `[capabilities.<domain>]` sections.
    ///
    /// Reminders are always local unless an endpoint overrides them.
    pub fn from_config(config: &Config, store: Store) -> Self {
        let mut caps = Self::new();
        caps.register(Arc::new(ReminderCapability::new(store)));

        for (key, endpoint) in &config.capabilities {
            match Domain::from_key(key) {
                Some(domain) => {
                    info!("capability {key} -> {}", endpoint.endpoint);
                    caps.register(Arc::new(HttpCapability::new(domain, endpoint)));
                }
                None => warn!("ignoring unknown capability section: {key}"),
            }
        }
        caps
    }

    pub fn get(&self, domain: Domain) -> Result<Arc<dyn Capability>, CapabilityError> {
        self.services
            .get(&domain)
            .cloned()
            .ok_or_else(|| CapabilityError::NotConfigured {
                service: domain.label().to_string(),
            })
    }

    /// Registered domains in a stable order.
    pub fn domains(&self) -> Vec<Domain> {
        Domain::ALL
            .into_iter()
            .filter(|d| self.services.contains_key(d))
            .collect()
    }
}
