// src/backend/payload.rs
//! Little-endian byte encoding of stored variable values

use crate::error::BackendError;
use crate::types::{DataType, TypedBuffer};
use byteorder::{LittleEndian, ReadBytesExt};
use bytes::{BufMut, Bytes, BytesMut};
use std::io::Cursor;

/// Encode values as consecutive little-endian words
///
/// # Example
///
/// ```
/// use fieldio::backend::payload;
/// use fieldio::types::TypedBuffer;
///
/// let bytes = payload::encode(&TypedBuffer::from(vec![1i32, 2]));
/// assert_eq!(&bytes[..], &[1, 0, 0, 0, 2, 0, 0, 0]);
/// ```
pub fn encode(values: &TypedBuffer) -> Bytes {
    let mut buffer = BytesMut::with_capacity(values.as_bytes().len());
    match values {
        TypedBuffer::Double(v) => v.iter().for_each(|x| buffer.put_f64_le(*x)),
        TypedBuffer::Float(v) => v.iter().for_each(|x| buffer.put_f32_le(*x)),
        TypedBuffer::Int(v) => v.iter().for_each(|x| buffer.put_i32_le(*x)),
    }
    buffer.freeze()
}

/// Decode a payload written by [`encode`] for variable `name`
pub fn decode(name: &str, data_type: DataType, bytes: &[u8]) -> Result<TypedBuffer, BackendError> {
    let size = data_type
        .fixed_size()
        .ok_or_else(|| not_numeric(name, data_type))?;
    if bytes.len() % size != 0 {
        return Err(BackendError::Corrupt(name.to_string()));
    }

    let count = bytes.len() / size;
    let mut cursor = Cursor::new(bytes);
    let values = match data_type {
        DataType::Double => {
            let mut v = vec![0.0; count];
            cursor.read_f64_into::<LittleEndian>(&mut v)?;
            TypedBuffer::Double(v)
        }
        DataType::Float => {
            let mut v = vec![0.0; count];
            cursor.read_f32_into::<LittleEndian>(&mut v)?;
            TypedBuffer::Float(v)
        }
        DataType::Int => {
            let mut v = vec![0; count];
            cursor.read_i32_into::<LittleEndian>(&mut v)?;
            TypedBuffer::Int(v)
        }
        DataType::String => return Err(not_numeric(name, data_type)),
    };
    Ok(values)
}

fn not_numeric(name: &str, data_type: DataType) -> BackendError {
    BackendError::TypeMismatch {
        name: name.to_string(),
        expected: "numeric".to_string(),
        found: data_type.to_string(),
    }
}
