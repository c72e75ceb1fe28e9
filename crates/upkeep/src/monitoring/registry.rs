use thiserror::Error;

use super::types::Endpoint;
use super::validation::{InvalidEndpoint, validate_endpoint};

/// Maximum number of monitored endpoints
pub const MAX_ENDPOINTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("maximum {capacity} servers allowed")]
    AtCapacity { capacity: usize },
    #[error(transparent)]
    InvalidEndpoint(#[from] InvalidEndpoint),
}

/// Ordered, deduplicated and bounded set of endpoints.
///
/// Insertion order is kept; snapshots map statuses to endpoints by position.
#[derive(Debug, Clone)]
pub struct EndpointRegistry {
    endpoints: Vec<Endpoint>,
    capacity: usize,
}

impl Default for EndpointRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::with_capacity(MAX_ENDPOINTS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { endpoints: Vec::with_capacity(capacity), capacity }
    }

    /// Add an endpoint at the end of the list.
    ///
    /// Capacity is checked before the identifier itself.
    pub fn add(&mut self, raw: &str) -> Result<Endpoint, RegistryError> {
        if self.is_full() {
            return Err(RegistryError::AtCapacity { capacity: self.capacity });
        }

        let endpoint = validate_endpoint(raw)?;
        if self.contains(endpoint.as_str()) {
            return Err(InvalidEndpoint::Duplicate(endpoint.to_string()).into());
        }

        self.endpoints.push(endpoint.clone());
        Ok(endpoint)
    }

    /// Remove an endpoint, returns whether it was present
    pub fn remove(&mut self, raw: &str) -> bool {
        let id = raw.trim();
        let before = self.endpoints.len();
        self.endpoints.retain(|endpoint| endpoint.as_str() != id);
        self.endpoints.len() != before
    }

    pub fn clear(&mut self) {
        self.endpoints.clear();
    }

    pub fn list(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn contains(&self, id: &str) -> bool {
        self.endpoints.iter().any(|endpoint| endpoint.as_str() == id)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.endpoints.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Identifiers in registry order, as stored in the config file
    pub fn to_ids(&self) -> Vec<String> {
        self.endpoints.iter().map(ToString::to_string).collect()
    }
}
