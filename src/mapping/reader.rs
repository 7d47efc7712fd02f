// src/mapping/reader.rs
use super::type_mismatch;
use crate::config::{FieldMetadata, IoConfig};
use crate::data::DataContainer;
use crate::error::{FieldIoError, Result};
use crate::field::Field;
use crate::file_data::FileData;
use crate::types::TypedBuffer;

/// Which file levels land in which field levels
struct ReadPlan<'a> {
    field_name: &'a str,
    field_levels: usize,
    /// File levels `first_level..end_level` fill field levels from 0
    first_level: usize,
    end_level: usize,
    index_map: &'a [usize],
}

fn fill_mesh<T: Copy>(dst: &mut [T], src: &[T], plan: &ReadPlan<'_>) -> Result<()> {
    let points = plan.index_map.len();
    for level in plan.first_level..plan.end_level {
        let field_level = level - plan.first_level;
        for (i, mapped) in plan.index_map.iter().enumerate() {
            let index = mapped + level * points;
            let value = src.get(index).ok_or_else(|| FieldIoError::IndexOutOfRange {
                field: plan.field_name.to_string(),
                index,
                len: src.len(),
            })?;
            dst[i * plan.field_levels + field_level] = *value;
        }
    }
    Ok(())
}

fn fill_native<T: Copy>(dst: &mut [T], src: &[T], field_name: &str, rows: usize, levels: usize) -> Result<()> {
    for i in 0..rows {
        for level in 0..levels {
            let index = i + level * rows;
            let value = src.get(index).ok_or_else(|| FieldIoError::IndexOutOfRange {
                field: field_name.to_string(),
                index,
                len: src.len(),
            })?;
            dst[i * levels + level] = *value;
        }
    }
    Ok(())
}

/// Populates fields from file data containers
#[derive(Debug, Clone)]
pub struct FieldReader {
    rank: usize,
    owner_rank: usize,
    full_levels: usize,
    half_levels: usize,
}

impl FieldReader {
    pub fn new(rank: usize, config: &IoConfig) -> Self {
        FieldReader {
            rank,
            owner_rank: config.owner_rank,
            full_levels: config.full_levels,
            half_levels: config.half_levels,
        }
    }

    fn is_owner(&self) -> bool {
        self.rank == self.owner_rank
    }

    /// Fill `field` from the container named `read_name` in `file_data`
    pub fn populate_field_with_file_data(
        &self,
        field: &mut Field,
        file_data: &FileData,
        field_metadata: &FieldMetadata,
        read_name: &str,
        is_lfric: bool,
    ) -> Result<()> {
        if !self.is_owner() {
            return Ok(());
        }
        tracing::debug!(field = field.name(), read_name, is_lfric, "populating field");
        let container = file_data.data().container(read_name)?;
        self.populate_field_with_container(
            field,
            container,
            file_data.index_map(),
            field_metadata.no_first_level,
            is_lfric,
        )
    }

    /// Fill `field` from a flat mesh-ordered buffer through `index_map`
    ///
    /// With `no_first_level` on an LFRic-convention file the field holds half
    /// levels and file level 0 is skipped: file levels `1..full_levels` fill
    /// field levels `0..half_levels`.
    pub fn populate_field_with_container(
        &self,
        field: &mut Field,
        container: &DataContainer,
        index_map: &[usize],
        no_first_level: bool,
        is_lfric: bool,
    ) -> Result<()> {
        if !self.is_owner() {
            return Ok(());
        }
        let levels = field.levels();
        if no_first_level && levels == self.full_levels {
            return Err(FieldIoError::LevelMisconfiguration {
                field: field.name().to_string(),
                levels,
            });
        }
        if index_map.len() > field.rows() {
            return Err(FieldIoError::DataShapeMismatch {
                expected: field.rows(),
                found: index_map.len(),
            });
        }

        let (first_level, end_level) = if no_first_level && is_lfric && levels == self.half_levels {
            (1, self.full_levels)
        } else {
            (0, levels)
        };
        let field_name = field.name().to_string();
        let field_type = field.data_type();
        let plan = ReadPlan {
            field_name: &field_name,
            field_levels: levels,
            first_level,
            end_level,
            index_map,
        };

        match (container.buffer(), field.buffer_mut()) {
            (TypedBuffer::Double(src), TypedBuffer::Double(dst)) => fill_mesh(dst, src, &plan),
            (TypedBuffer::Float(src), TypedBuffer::Float(dst)) => fill_mesh(dst, src, &plan),
            (TypedBuffer::Int(src), TypedBuffer::Int(dst)) => fill_mesh(dst, src, &plan),
            (src, _) => Err(type_mismatch(field_type, src.data_type())),
        }
    }

    /// Fill `field` from a flat buffer with no point permutation
    ///
    /// The value for point `i` at level `j` is read from `i + j * H`, where `H`
    /// excludes the halo rows of a non-global field.
    pub fn populate_field_native(&self, field: &mut Field, container: &DataContainer) -> Result<()> {
        if !self.is_owner() {
            return Ok(());
        }
        let rows = field.owned_rows();
        let levels = field.levels();
        let field_name = field.name().to_string();
        let field_type = field.data_type();

        match (container.buffer(), field.buffer_mut()) {
            (TypedBuffer::Double(src), TypedBuffer::Double(dst)) => {
                fill_native(dst, src, &field_name, rows, levels)
            }
            (TypedBuffer::Float(src), TypedBuffer::Float(dst)) => {
                fill_native(dst, src, &field_name, rows, levels)
            }
            (TypedBuffer::Int(src), TypedBuffer::Int(dst)) => {
                fill_native(dst, src, &field_name, rows, levels)
            }
            (src, _) => Err(type_mismatch(field_type, src.data_type())),
        }
    }
}
