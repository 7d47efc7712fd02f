// src/field.rs
//! Two-dimensional in-memory fields and the services that distribute them
//!
//! A [`Field`] holds `rows × levels` values stored row major, so the value at
//! horizontal point `i` and vertical level `j` lives at `i * levels + j`.
//! Rows follow the mesh-native point order of the field's [`Grid`].

use crate::error::{FieldIoError, Result};
use crate::types::{DataType, Element, TypedBuffer};
use std::sync::Arc;

/// Horizontal grid geometry: one (longitude, latitude) pair per point in
/// mesh-native order
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    name: String,
    lonlat: Vec<(f64, f64)>,
}

impl Grid {
    pub fn new(name: impl Into<String>, lonlat: Vec<(f64, f64)>) -> Self {
        Grid {
            name: name.into(),
            lonlat,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lonlat(&self) -> &[(f64, f64)] {
        &self.lonlat
    }

    pub fn len(&self) -> usize {
        self.lonlat.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lonlat.is_empty()
    }
}

/// Typed `rows × levels` field on a grid
///
/// A non-global field is one process's partition; its trailing `halo` rows
/// are ghost copies of neighbouring points and are never written to files.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use fieldio::field::{Field, Grid};
/// use fieldio::types::DataType;
///
/// let grid = Arc::new(Grid::new("C2", vec![(0.0, 0.0), (90.0, 0.0)]));
/// let mut field = Field::new("theta", DataType::Double, 2, 3, grid).unwrap();
/// field.set(1, 2, 300.0f64).unwrap();
///
/// assert_eq!(field.shape(), (2, 3));
/// assert_eq!(field.values::<f64>().unwrap()[5], 300.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    values: TypedBuffer,
    rows: usize,
    levels: usize,
    global: bool,
    halo: usize,
    grid: Arc<Grid>,
}

impl Field {
    /// Zero-filled global field
    pub fn new(
        name: impl Into<String>,
        data_type: DataType,
        rows: usize,
        levels: usize,
        grid: Arc<Grid>,
    ) -> Result<Self> {
        Ok(Field {
            name: name.into(),
            values: TypedBuffer::zeroed(data_type, rows * levels)?,
            rows,
            levels,
            global: true,
            halo: 0,
            grid,
        })
    }

    /// Global field over existing row-major values
    pub fn from_values<T: Element>(
        name: impl Into<String>,
        values: Vec<T>,
        levels: usize,
        grid: Arc<Grid>,
    ) -> Result<Self> {
        if levels == 0 || values.len() % levels != 0 {
            return Err(FieldIoError::DataShapeMismatch {
                expected: levels,
                found: values.len(),
            });
        }
        Ok(Field {
            name: name.into(),
            rows: values.len() / levels,
            values: T::wrap(values),
            levels,
            global: true,
            halo: 0,
            grid,
        })
    }

    /// Zero-filled field with this field's rows, partitioning and grid
    pub fn like(&self, name: impl Into<String>, levels: usize) -> Result<Self> {
        Ok(Field {
            name: name.into(),
            values: TypedBuffer::zeroed(self.data_type(), self.rows * levels)?,
            rows: self.rows,
            levels,
            global: self.global,
            halo: self.halo,
            grid: Arc::clone(&self.grid),
        })
    }

    /// Mark the field as a local partition whose last `halo` rows are ghosts
    pub fn with_halo(mut self, halo: usize) -> Result<Self> {
        if halo > self.rows {
            return Err(FieldIoError::DataShapeMismatch {
                expected: self.rows,
                found: halo,
            });
        }
        self.global = false;
        self.halo = halo;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.levels)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn levels(&self) -> usize {
        self.levels
    }

    pub fn data_type(&self) -> DataType {
        self.values.data_type()
    }

    pub fn is_global(&self) -> bool {
        self.global
    }

    pub fn halo(&self) -> usize {
        self.halo
    }

    /// Rows that belong to this field, excluding trailing halo rows
    pub fn owned_rows(&self) -> usize {
        if self.global {
            self.rows
        } else {
            self.rows - self.halo
        }
    }

    pub fn grid(&self) -> &Arc<Grid> {
        &self.grid
    }

    pub fn buffer(&self) -> &TypedBuffer {
        &self.values
    }

    pub fn buffer_mut(&mut self) -> &mut TypedBuffer {
        &mut self.values
    }

    pub fn values<T: Element>(&self) -> Result<&[T]> {
        self.values.values::<T>()
    }

    pub fn values_mut<T: Element>(&mut self) -> Result<&mut [T]> {
        Ok(self.values.values_mut::<T>()?.as_mut_slice())
    }

    #[inline]
    pub fn index(&self, row: usize, level: usize) -> usize {
        row * self.levels + level
    }

    pub fn get<T: Element>(&self, row: usize, level: usize) -> Result<T> {
        self.check_bounds(row, level)?;
        Ok(self.values::<T>()?[self.index(row, level)])
    }

    pub fn set<T: Element>(&mut self, row: usize, level: usize, value: T) -> Result<()> {
        self.check_bounds(row, level)?;
        let index = self.index(row, level);
        self.values_mut::<T>()?[index] = value;
        Ok(())
    }

    fn check_bounds(&self, row: usize, level: usize) -> Result<()> {
        if row >= self.rows || level >= self.levels {
            return Err(FieldIoError::OutOfRange {
                index: self.index(row, level),
                len: self.values.len(),
            });
        }
        Ok(())
    }
}

/// Ordered collection of uniquely named fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    fields: Vec<Field>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, replacing any field with the same name in place
    pub fn add(&mut self, field: Field) {
        match self.fields.iter_mut().find(|f| f.name() == field.name()) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
    }

    pub fn get(&self, name: &str) -> Result<&Field> {
        self.fields
            .iter()
            .find(|f| f.name() == name)
            .ok_or_else(|| FieldIoError::FieldNotFound(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Field> {
        self.fields
            .iter_mut()
            .find(|f| f.name() == name)
            .ok_or_else(|| FieldIoError::FieldNotFound(name.to_string()))
    }

    pub fn first(&self) -> Option<&Field> {
        self.fields.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(Field::name).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<Field> for FieldSet {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        let mut set = FieldSet::new();
        for field in iter {
            set.add(field);
        }
        set
    }
}

/// Collective operations over the participants sharing a field
///
/// Every participant must make the same calls in the same order; a
/// participant that fails before a collective call leaves the others waiting.
pub trait Distributor {
    /// This participant's rank
    fn rank(&self) -> usize;

    /// Assemble the global field from every participant's partition
    fn gather(&self, local: &Field) -> Result<Field>;

    /// Distribute the owner's global field into each local partition
    fn scatter(&self, global: &Field, local: &mut Field) -> Result<()>;

    /// Refresh the halo rows of a local partition
    fn halo_exchange(&self, local: &mut Field) -> Result<()>;
}

/// Distributor for a single participant
///
/// The local partition is the whole grid plus optional halo rows. The halo
/// rows have no neighbours to refresh them, so halo exchange leaves them as
/// they are.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialDistributor {
    rank: usize,
}

impl SerialDistributor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `rank` instead of 0, e.g. to act as a non-owning participant
    pub fn with_rank(rank: usize) -> Self {
        SerialDistributor { rank }
    }
}

impl Distributor for SerialDistributor {
    fn rank(&self) -> usize {
        self.rank
    }

    fn gather(&self, local: &Field) -> Result<Field> {
        let count = local.owned_rows() * local.levels();
        let values = match local.buffer() {
            TypedBuffer::Double(v) => TypedBuffer::Double(v[..count].to_vec()),
            TypedBuffer::Float(v) => TypedBuffer::Float(v[..count].to_vec()),
            TypedBuffer::Int(v) => TypedBuffer::Int(v[..count].to_vec()),
        };
        Ok(Field {
            name: local.name().to_string(),
            values,
            rows: local.owned_rows(),
            levels: local.levels(),
            global: true,
            halo: 0,
            grid: Arc::clone(local.grid()),
        })
    }

    fn scatter(&self, global: &Field, local: &mut Field) -> Result<()> {
        if global.rows() != local.owned_rows() || global.levels() != local.levels() {
            return Err(FieldIoError::DataShapeMismatch {
                expected: local.owned_rows() * local.levels(),
                found: global.rows() * global.levels(),
            });
        }
        let count = global.rows() * global.levels();
        match (global.buffer(), local.buffer_mut()) {
            (TypedBuffer::Double(src), TypedBuffer::Double(dst)) => {
                dst[..count].copy_from_slice(&src[..count])
            }
            (TypedBuffer::Float(src), TypedBuffer::Float(dst)) => {
                dst[..count].copy_from_slice(&src[..count])
            }
            (TypedBuffer::Int(src), TypedBuffer::Int(dst)) => {
                dst[..count].copy_from_slice(&src[..count])
            }
            (src, dst) => {
                return Err(FieldIoError::TypeMismatch {
                    expected: dst.data_type().to_string(),
                    found: src.data_type().to_string(),
                })
            }
        }
        Ok(())
    }

    fn halo_exchange(&self, _local: &mut Field) -> Result<()> {
        Ok(())
    }
}
