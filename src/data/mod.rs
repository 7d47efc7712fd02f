// src/data/mod.rs
mod container;

pub use container::DataContainer;

use crate::error::{FieldIoError, Result};
use std::collections::BTreeMap;

/// Variable values keyed by variable name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Data {
    containers: BTreeMap<String, DataContainer>,
}

impl Data {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a container under its own name
    ///
    /// The first container stored under a name wins; a later container with
    /// the same name is dropped and `false` is returned.
    pub fn add_container(&mut self, container: DataContainer) -> bool {
        if self.containers.contains_key(container.name()) {
            return false;
        }
        self.containers.insert(container.name().to_string(), container);
        true
    }

    /// Remove a container; a missing name is not an error
    pub fn delete_container(&mut self, name: &str) -> Option<DataContainer> {
        self.containers.remove(name)
    }

    pub fn remove_all_but_these_containers(&mut self, names: &[impl AsRef<str>]) {
        self.containers
            .retain(|key, _| names.iter().any(|name| name.as_ref() == key));
    }

    pub fn is_container_present(&self, name: &str) -> bool {
        self.containers.contains_key(name)
    }

    pub fn container(&self, name: &str) -> Result<&DataContainer> {
        self.containers
            .get(name)
            .ok_or_else(|| FieldIoError::ContainerNotFound(name.to_string()))
    }

    pub fn container_mut(&mut self, name: &str) -> Result<&mut DataContainer> {
        self.containers
            .get_mut(name)
            .ok_or_else(|| FieldIoError::ContainerNotFound(name.to_string()))
    }

    pub fn containers(&self) -> impl Iterator<Item = &DataContainer> {
        self.containers.values()
    }

    pub fn container_names(&self) -> Vec<String> {
        self.containers.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    pub fn clear(&mut self) {
        self.containers.clear();
    }
}
