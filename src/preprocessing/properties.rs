//! Физические свойства элементов

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{DescriptorError, Result};

pub trait PropertyLookup: Send + Sync {
    fn lookup(&self, element: &str, property: &str) -> Result<f64>;
}

impl<T: PropertyLookup + ?Sized> PropertyLookup for Arc<T> {
    fn lookup(&self, element: &str, property: &str) -> Result<f64> {
        (**self).lookup(element, property)
    }
}

/// Таблица `элемент -> свойство -> значение`, в JSON как вложенный объект
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementTable {
    elements: HashMap<String, HashMap<String, f64>>,
}

impl ElementTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, element: &str, property: &str, value: f64) -> Self {
        self.insert(element, property, value);
        self
    }

    pub fn insert(&mut self, element: &str, property: &str, value: f64) {
        self.elements
            .entry(element.to_string())
            .or_default()
            .insert(property.to_string(), value);
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| DescriptorError::Serialization(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            DescriptorError::Serialization(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl PropertyLookup for ElementTable {
    fn lookup(&self, element: &str, property: &str) -> Result<f64> {
        self.elements
            .get(element)
            .and_then(|properties| properties.get(property))
            .copied()
            .ok_or_else(|| DescriptorError::Lookup {
                element: element.to_string(),
                property: property.to_string(),
            })
    }
}
