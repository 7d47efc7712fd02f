// src/mapping/mod.rs
//! Conversion between flat file buffers and two-dimensional fields
//!
//! Files store a variable as a flat buffer whose horizontal axis follows the
//! file's point order. In mesh-convention files the value for mesh-native
//! point `i` at level `j` sits at `index_map[i] + j * H`, `H` being the number
//! of horizontal points; on disk the vertical axis is outermost, the reverse
//! of the in-memory `(H, L)` field shape.

mod reader;
mod writer;

pub use reader::FieldReader;
pub use writer::{copy_surface_level, FieldWriter};

use crate::error::FieldIoError;
use crate::types::DataType;

fn type_mismatch(field_type: DataType, data_type: DataType) -> FieldIoError {
    FieldIoError::TypeMismatch {
        expected: field_type.to_string(),
        found: data_type.to_string(),
    }
}
