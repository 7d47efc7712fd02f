// src/types.rs
use bytemuck::{Pod, Zeroable};
use std::fmt;

use crate::error::{FieldIoError, Result};

/// Element type tag for variables, data containers and attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DataType {
    Double,
    Float,
    Int,
    String,
}

impl DataType {
    /// Size in bytes of one value, or None for strings
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            DataType::Double => Some(8),
            DataType::Float | DataType::Int => Some(4),
            DataType::String => None,
        }
    }

    /// Whether values of this type can live in a data container
    pub fn is_numeric(&self) -> bool {
        !matches!(self, DataType::String)
    }

    pub fn name(&self) -> &'static str {
        match self {
            DataType::Double => "double",
            DataType::Float => "float",
            DataType::Int => "int",
            DataType::String => "string",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value attached to a variable or to the file as a whole
#[derive(Debug, Clone)]
pub enum AttributeValue {
    Double(f64),
    /// Only produced when reading files; the writers never create float attributes
    Float(f32),
    Int(i32),
    String(String),
}

// Floats compare bitwise first so that NaN-valued attributes stay equal to themselves
impl PartialEq for AttributeValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AttributeValue::Double(a), AttributeValue::Double(b)) => a.to_bits() == b.to_bits() || a == b,
            (AttributeValue::Float(a), AttributeValue::Float(b)) => a.to_bits() == b.to_bits() || a == b,
            (AttributeValue::Int(a), AttributeValue::Int(b)) => a == b,
            (AttributeValue::String(a), AttributeValue::String(b)) => a == b,
            _ => false,
        }
    }
}

impl AttributeValue {
    pub fn data_type(&self) -> DataType {
        match self {
            AttributeValue::Double(_) => DataType::Double,
            AttributeValue::Float(_) => DataType::Float,
            AttributeValue::Int(_) => DataType::Int,
            AttributeValue::String(_) => DataType::String,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Double(v) => write!(f, "{}", v),
            AttributeValue::Float(v) => write!(f, "{}f", v),
            AttributeValue::Int(v) => write!(f, "{}", v),
            AttributeValue::String(s) => write!(f, "{:?}", s),
        }
    }
}

/// Named attribute
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: AttributeValue,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: AttributeValue) -> Self {
        Attribute {
            name: name.into(),
            value,
        }
    }

    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, AttributeValue::String(value.into()))
    }
}

/// Homogeneous, type-tagged value buffer shared by data containers and fields
#[derive(Debug, Clone, PartialEq)]
pub enum TypedBuffer {
    Double(Vec<f64>),
    Float(Vec<f32>),
    Int(Vec<i32>),
}

impl TypedBuffer {
    /// Create an empty buffer for a numeric data type
    pub fn empty(data_type: DataType) -> Result<Self> {
        Self::zeroed(data_type, 0)
    }

    /// Create a zero-filled buffer of `len` values
    pub fn zeroed(data_type: DataType, len: usize) -> Result<Self> {
        match data_type {
            DataType::Double => Ok(TypedBuffer::Double(vec![0.0; len])),
            DataType::Float => Ok(TypedBuffer::Float(vec![0.0; len])),
            DataType::Int => Ok(TypedBuffer::Int(vec![0; len])),
            DataType::String => Err(FieldIoError::UnsupportedType(format!(
                "{} values cannot be held in a numeric buffer",
                data_type
            ))),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            TypedBuffer::Double(_) => DataType::Double,
            TypedBuffer::Float(_) => DataType::Float,
            TypedBuffer::Int(_) => DataType::Int,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TypedBuffer::Double(v) => v.len(),
            TypedBuffer::Float(v) => v.len(),
            TypedBuffer::Int(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resize, zero-filling any growth
    pub fn resize(&mut self, len: usize) {
        match self {
            TypedBuffer::Double(v) => v.resize(len, 0.0),
            TypedBuffer::Float(v) => v.resize(len, 0.0),
            TypedBuffer::Int(v) => v.resize(len, 0),
        }
    }

    pub fn clear(&mut self) {
        match self {
            TypedBuffer::Double(v) => v.clear(),
            TypedBuffer::Float(v) => v.clear(),
            TypedBuffer::Int(v) => v.clear(),
        }
    }

    /// Raw bytes in native endianness
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            TypedBuffer::Double(v) => bytemuck::cast_slice(v),
            TypedBuffer::Float(v) => bytemuck::cast_slice(v),
            TypedBuffer::Int(v) => bytemuck::cast_slice(v),
        }
    }

    /// Typed view, failing when `T` does not match the tag
    pub fn values<T: Element>(&self) -> Result<&[T]> {
        T::slice(self).ok_or_else(|| self.mismatch::<T>())
    }

    /// Mutable typed view, failing when `T` does not match the tag
    pub fn values_mut<T: Element>(&mut self) -> Result<&mut Vec<T>> {
        let found = self.data_type();
        T::vec_mut(self).ok_or_else(|| FieldIoError::TypeMismatch {
            expected: T::DATA_TYPE.to_string(),
            found: found.to_string(),
        })
    }

    fn mismatch<T: Element>(&self) -> FieldIoError {
        FieldIoError::TypeMismatch {
            expected: T::DATA_TYPE.to_string(),
            found: self.data_type().to_string(),
        }
    }
}

impl From<Vec<f64>> for TypedBuffer {
    fn from(values: Vec<f64>) -> Self {
        TypedBuffer::Double(values)
    }
}

impl From<Vec<f32>> for TypedBuffer {
    fn from(values: Vec<f32>) -> Self {
        TypedBuffer::Float(values)
    }
}

impl From<Vec<i32>> for TypedBuffer {
    fn from(values: Vec<i32>) -> Self {
        TypedBuffer::Int(values)
    }
}

/// Rust element types that a [`TypedBuffer`] can hold
pub trait Element: Pod + Zeroable + PartialEq + fmt::Debug + Send + Sync + 'static {
    const DATA_TYPE: DataType;

    fn slice(buffer: &TypedBuffer) -> Option<&[Self]>;
    fn vec_mut(buffer: &mut TypedBuffer) -> Option<&mut Vec<Self>>;
    fn wrap(values: Vec<Self>) -> TypedBuffer;
}

macro_rules! impl_element {
    ($ty:ty, $variant:ident) => {
        impl Element for $ty {
            const DATA_TYPE: DataType = DataType::$variant;

            fn slice(buffer: &TypedBuffer) -> Option<&[Self]> {
                match buffer {
                    TypedBuffer::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn vec_mut(buffer: &mut TypedBuffer) -> Option<&mut Vec<Self>> {
                match buffer {
                    TypedBuffer::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn wrap(values: Vec<Self>) -> TypedBuffer {
                TypedBuffer::$variant(values)
            }
        }
    };
}

impl_element!(f64, Double);
impl_element!(f32, Float);
impl_element!(i32, Int);
