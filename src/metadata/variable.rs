// src/metadata/variable.rs
use crate::error::{FieldIoError, Result};
use crate::types::{Attribute, AttributeValue, DataType};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Ordered (dimension name, size) pairs; two or three axes is the common case
pub type DimensionList = SmallVec<[(String, usize); 4]>;

/// Variable definition: element type, on-disk shape and attributes
///
/// The order of `dimensions` is the on-disk axis order, outermost first.
///
/// # Example
///
/// ```
/// use fieldio::metadata::Variable;
/// use fieldio::types::DataType;
///
/// let mut variable = Variable::new("theta", DataType::Double);
/// variable.add_dimension("full_levels", 71);
/// variable.add_dimension("nMesh2d_face", 864);
///
/// assert_eq!(variable.total_size(), 71 * 864);
/// assert_eq!(variable.dimension_names(), vec!["full_levels", "nMesh2d_face"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub data_type: DataType,
    pub dimensions: DimensionList,
    pub attributes: BTreeMap<String, Attribute>,
}

impl Variable {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Variable {
            name: name.into(),
            data_type,
            dimensions: SmallVec::new(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a dimension as the next (inner) axis
    pub fn add_dimension(&mut self, name: impl Into<String>, size: usize) {
        self.dimensions.push((name.into(), size));
    }

    /// Remove every entry referencing `name`; returns whether any was removed
    pub fn delete_dimension(&mut self, name: &str) -> bool {
        let before = self.dimensions.len();
        self.dimensions.retain(|(dim_name, _)| dim_name != name);
        self.dimensions.len() != before
    }

    pub fn dimension_names(&self) -> Vec<&str> {
        self.dimensions.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn has_dimension(&self, name: &str) -> bool {
        self.dimensions.iter().any(|(dim_name, _)| dim_name == name)
    }

    /// Product of the dimension sizes, 1 for a scalar
    pub fn total_size(&self) -> usize {
        self.dimensions.iter().map(|(_, size)| *size).product()
    }

    /// Add an attribute; an existing attribute with the same name is kept
    pub fn add_attribute(&mut self, attribute: Attribute) {
        self.attributes
            .entry(attribute.name.clone())
            .or_insert(attribute);
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn remove_attribute(&mut self, name: &str) -> bool {
        self.attributes.remove(name).is_some()
    }

    /// Value of a string attribute
    pub fn str_attr(&self, name: &str) -> Result<&str> {
        match self.attributes.get(name).map(|attr| &attr.value) {
            Some(AttributeValue::String(value)) => Ok(value),
            Some(other) => Err(FieldIoError::TypeMismatch {
                expected: DataType::String.to_string(),
                found: other.data_type().to_string(),
            }),
            None => Err(FieldIoError::AttributeNotFound {
                owner: self.name.clone(),
                attribute: name.to_string(),
            }),
        }
    }
}
