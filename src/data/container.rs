// src/data/container.rs
use crate::error::{FieldIoError, Result};
use crate::types::{DataType, Element, TypedBuffer};

/// Named, type-tagged buffer of variable values
///
/// The element type is fixed when the container is created. Values are
/// accessed through the [`Element`] types `f64`, `f32` and `i32`; asking for
/// the wrong one fails with `TypeMismatch`.
///
/// # Example
///
/// ```
/// use fieldio::data::DataContainer;
///
/// let mut container = DataContainer::from_values("theta", vec![280.0f64, 281.5]);
/// container.push_datum(282.0f64).unwrap();
///
/// assert_eq!(container.len(), 3);
/// assert_eq!(container.datum::<f64>(2).unwrap(), 282.0);
/// assert!(container.datum::<f64>(3).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DataContainer {
    name: String,
    values: TypedBuffer,
}

impl DataContainer {
    /// Create an empty container; string types are rejected
    pub fn new(name: impl Into<String>, data_type: DataType) -> Result<Self> {
        Ok(DataContainer {
            name: name.into(),
            values: TypedBuffer::empty(data_type)?,
        })
    }

    pub fn from_values<T: Element>(name: impl Into<String>, values: Vec<T>) -> Self {
        DataContainer {
            name: name.into(),
            values: T::wrap(values),
        }
    }

    pub fn from_buffer(name: impl Into<String>, values: TypedBuffer) -> Self {
        DataContainer {
            name: name.into(),
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.values.data_type()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn buffer(&self) -> &TypedBuffer {
        &self.values
    }

    pub fn buffer_mut(&mut self) -> &mut TypedBuffer {
        &mut self.values
    }

    pub fn into_buffer(self) -> TypedBuffer {
        self.values
    }

    /// Whole-buffer typed view
    pub fn data<T: Element>(&self) -> Result<&[T]> {
        self.values.values::<T>()
    }

    pub fn data_mut<T: Element>(&mut self) -> Result<&mut Vec<T>> {
        self.values.values_mut::<T>()
    }

    /// Replace all values; the new values must match the container's type
    pub fn set_data<T: Element>(&mut self, values: Vec<T>) -> Result<()> {
        *self.values.values_mut::<T>()? = values;
        Ok(())
    }

    /// Read one value, failing when `index` is past the end
    pub fn datum<T: Element>(&self, index: usize) -> Result<T> {
        let values = self.values.values::<T>()?;
        values.get(index).copied().ok_or(FieldIoError::OutOfRange {
            index,
            len: values.len(),
        })
    }

    /// Overwrite one value in a pre-sized container
    pub fn set_datum_at<T: Element>(&mut self, index: usize, value: T) -> Result<()> {
        let values = self.values.values_mut::<T>()?;
        let len = values.len();
        match values.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(FieldIoError::OutOfRange { index, len }),
        }
    }

    /// Append one value
    pub fn push_datum<T: Element>(&mut self, value: T) -> Result<()> {
        self.values.values_mut::<T>()?.push(value);
        Ok(())
    }

    /// Resize to `len` values, zero-filling growth
    pub fn set_size(&mut self, len: usize) {
        self.values.resize(len);
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_container_is_empty() {
        for data_type in [DataType::Double, DataType::Float, DataType::Int] {
            let container = DataContainer::new("var", data_type).unwrap();
            assert_eq!(container.data_type(), data_type);
            assert!(container.is_empty());
        }
    }

    #[test]
    fn test_string_container_unsupported() {
        match DataContainer::new("names", DataType::String) {
            Err(FieldIoError::UnsupportedType(_)) => (),
            other => panic!("Expected UnsupportedType, got {:?}", other),
        }
    }

    #[test]
    fn test_datum_bounds() {
        let container = DataContainer::from_values("v", vec![1i32, 2, 3]);
        assert_eq!(container.datum::<i32>(0).unwrap(), 1);
        assert_eq!(container.datum::<i32>(2).unwrap(), 3);

        match container.datum::<i32>(3) {
            Err(FieldIoError::OutOfRange { index, len }) => {
                assert_eq!(index, 3);
                assert_eq!(len, 3);
            }
            other => panic!("Expected OutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn test_set_size_zero_then_append() {
        let mut container = DataContainer::from_values("v", vec![5.0f32, 6.0]);
        container.set_size(0);
        container.push_datum(7.5f32).unwrap();

        assert_eq!(container.len(), 1);
        assert_eq!(container.data::<f32>().unwrap(), &[7.5]);
    }

    #[test]
    fn test_set_datum_at_requires_presizing() {
        let mut container = DataContainer::new("v", DataType::Double).unwrap();
        assert!(container.set_datum_at(0, 1.0f64).is_err());

        container.set_size(2);
        container.set_datum_at(1, 4.0f64).unwrap();
        assert_eq!(container.data::<f64>().unwrap(), &[0.0, 4.0]);
    }

    #[test]
    fn test_wrong_type_access() {
        let mut container = DataContainer::from_values("v", vec![1.0f64]);
        assert!(matches!(container.push_datum(1i32), Err(FieldIoError::TypeMismatch { .. })));
        assert!(matches!(container.set_data(vec![1.0f32]), Err(FieldIoError::TypeMismatch { .. })));
        assert_eq!(container.len(), 1);
    }

    #[test]
    fn test_clear_and_replace() {
        let mut container = DataContainer::from_values("v", vec![1, 2, 3]);
        container.clear();
        assert!(container.is_empty());

        container.set_data(vec![9, 8]).unwrap();
        assert_eq!(container.data::<i32>().unwrap(), &[9, 8]);
    }
}
