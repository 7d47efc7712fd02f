// src/metadata/mod.rs
mod variable;

pub use variable::{DimensionList, Variable};

use crate::consts;
use crate::error::{FieldIoError, Result};
use crate::types::Attribute;
use std::collections::BTreeMap;
use std::fmt;

/// Variable naming convention recorded in a file's global attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Convention {
    /// Mesh-native names and 71/70 level layout
    #[default]
    Lfric,
    /// Internal names as used by the data assimilation system
    Jedi,
}

impl Convention {
    pub fn name(&self) -> &'static str {
        match self {
            Convention::Lfric => consts::LFRIC_CONVENTION,
            Convention::Jedi => consts::JEDI_CONVENTION,
        }
    }

    /// Parse a convention name; anything unrecognised is None
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            consts::LFRIC_CONVENTION => Some(Convention::Lfric),
            consts::JEDI_CONVENTION => Some(Convention::Jedi),
            _ => None,
        }
    }
}

impl fmt::Display for Convention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// In-memory description of a file: dimensions, variables and global attributes
///
/// All three collections are ordered by name. Equality compares dimensions and
/// variables and ignores global attributes, which only carry provenance.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    dimensions: BTreeMap<String, usize>,
    variables: BTreeMap<String, Variable>,
    global_attributes: BTreeMap<String, Attribute>,
}

impl PartialEq for Metadata {
    fn eq(&self, other: &Self) -> bool {
        self.dimensions == other.dimensions && self.variables == other.variables
    }
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    // Dimensions

    /// Define a dimension; an existing definition is kept and `false` returned
    pub fn add_dimension(&mut self, name: impl Into<String>, size: usize) -> bool {
        let name = name.into();
        if self.dimensions.contains_key(&name) {
            return false;
        }
        self.dimensions.insert(name, size);
        true
    }

    pub fn dimension(&self, name: &str) -> Result<usize> {
        self.dimensions
            .get(name)
            .copied()
            .ok_or_else(|| FieldIoError::DimensionNotFound(name.to_string()))
    }

    pub fn is_dim_defined(&self, name: &str) -> bool {
        self.dimensions.contains_key(name)
    }

    /// Name of the first dimension, in name order, whose size equals `size`
    ///
    /// Two dimensions with the same size make this lookup order dependent;
    /// callers that know the intended name should check it with
    /// [`Metadata::is_dim_defined`] first.
    pub fn dimension_name(&self, size: usize) -> Option<&str> {
        self.dimensions
            .iter()
            .find(|(_, dim_size)| **dim_size == size)
            .map(|(name, _)| name.as_str())
    }

    pub fn dimension_names(&self) -> Vec<String> {
        self.dimensions.keys().cloned().collect()
    }

    pub fn dimensions(&self) -> impl Iterator<Item = (&str, usize)> {
        self.dimensions.iter().map(|(name, size)| (name.as_str(), *size))
    }

    /// Drop a dimension definition without touching the variables using it
    pub fn remove_dimension(&mut self, name: &str) -> Option<usize> {
        self.dimensions.remove(name)
    }

    /// Remove the entry for `name` from every variable's shape
    pub fn strip_dimension_from_variables(&mut self, name: &str) {
        for variable in self.variables.values_mut() {
            variable.delete_dimension(name);
        }
    }

    /// Remove a dimension and its entry in every variable's shape
    ///
    /// Variables referencing the dimension are kept.
    pub fn delete_dimension(&mut self, name: &str) {
        self.remove_dimension(name);
        self.strip_dimension_from_variables(name);
    }

    // Variables

    /// Add a variable; an existing variable with the same name is kept
    pub fn add_variable(&mut self, variable: Variable) -> bool {
        if self.variables.contains_key(&variable.name) {
            return false;
        }
        self.variables.insert(variable.name.clone(), variable);
        true
    }

    pub fn variable(&self, name: &str) -> Result<&Variable> {
        self.variables
            .get(name)
            .ok_or_else(|| FieldIoError::VariableNotFound(name.to_string()))
    }

    pub fn variable_mut(&mut self, name: &str) -> Result<&mut Variable> {
        self.variables
            .get_mut(name)
            .ok_or_else(|| FieldIoError::VariableNotFound(name.to_string()))
    }

    /// Look up several variables, failing on the first missing name
    pub fn variables(&self, names: &[impl AsRef<str>]) -> Result<Vec<&Variable>> {
        names.iter().map(|name| self.variable(name.as_ref())).collect()
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn delete_variable(&mut self, name: &str) -> Result<Variable> {
        self.variables
            .remove(name)
            .ok_or_else(|| FieldIoError::VariableNotFound(name.to_string()))
    }

    /// Names of all variables containing `search_term`
    pub fn find_variable_names(&self, search_term: &str) -> Vec<String> {
        self.variables
            .keys()
            .filter(|name| name.contains(search_term))
            .cloned()
            .collect()
    }

    pub fn variable_names(&self) -> Vec<String> {
        self.variables.keys().cloned().collect()
    }

    pub fn iter_variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    /// Keep only the listed variables; dimensions are left as they are
    pub fn remove_all_but_these_variables(&mut self, keep: &[impl AsRef<str>]) {
        self.variables
            .retain(|name, _| keep.iter().any(|k| k.as_ref() == name));
    }

    /// Value of string attribute `attr_name` for each of `var_names`, in order
    pub fn var_str_attrs(&self, var_names: &[impl AsRef<str>], attr_name: &str) -> Result<Vec<String>> {
        var_names
            .iter()
            .map(|name| {
                self.variable(name.as_ref())
                    .and_then(|variable| variable.str_attr(attr_name))
                    .map(str::to_string)
            })
            .collect()
    }

    // Global attributes

    pub fn add_global_attr(&mut self, attribute: Attribute) -> bool {
        if self.global_attributes.contains_key(&attribute.name) {
            return false;
        }
        self.global_attributes.insert(attribute.name.clone(), attribute);
        true
    }

    pub fn global_attr(&self, name: &str) -> Result<&Attribute> {
        self.global_attributes
            .get(name)
            .ok_or_else(|| FieldIoError::AttributeNotFound {
                owner: "global attributes".to_string(),
                attribute: name.to_string(),
            })
    }

    pub fn global_attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.global_attributes.values()
    }

    pub fn global_attr_names(&self) -> Vec<String> {
        self.global_attributes.keys().cloned().collect()
    }

    pub fn clear_global_attributes(&mut self) {
        self.global_attributes.clear();
    }

    /// Convention recorded in the file, LFRic when absent or unrecognised
    pub fn variable_convention(&self) -> Convention {
        self.global_attributes
            .get(consts::NAMING_CONVENTION_ATTR)
            .and_then(|attr| attr.value.as_str())
            .and_then(Convention::from_name)
            .unwrap_or_default()
    }

    /// Drop variables and global attributes; dimensions stay defined
    pub fn clear(&mut self) {
        self.variables.clear();
        self.global_attributes.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty() && self.variables.is_empty() && self.global_attributes.is_empty()
    }

    /// Emit the CDL dump at debug level
    pub fn log_summary(&self) {
        tracing::debug!(
            dimensions = self.dimensions.len(),
            variables = self.variables.len(),
            global_attributes = self.global_attributes.len(),
            "metadata:\n{}",
            self
        );
    }
}

fn write_attribute(f: &mut fmt::Formatter<'_>, owner: &str, attribute: &Attribute) -> fmt::Result {
    writeln!(f, "\t\t{}:{} = {} ;", owner, attribute.name, attribute.value)
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "dimensions:")?;
        for (name, size) in &self.dimensions {
            writeln!(f, "\t{} = {} ;", name, size)?;
        }
        writeln!(f, "variables:")?;
        for variable in self.variables.values() {
            write!(f, "\t{} {}", variable.data_type, variable.name)?;
            if !variable.dimensions.is_empty() {
                write!(f, "({})", variable.dimension_names().join(", "))?;
            }
            writeln!(f, " ;")?;
            for attribute in variable.attributes.values() {
                write_attribute(f, &variable.name, attribute)?;
            }
        }
        if !self.global_attributes.is_empty() {
            writeln!(f, "\n// global attributes:")?;
            for attribute in self.global_attributes.values() {
                write_attribute(f, "", attribute)?;
            }
        }
        Ok(())
    }
}
