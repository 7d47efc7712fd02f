// src/mapping/writer.rs
use super::type_mismatch;
use crate::config::{FieldMetadata, IoConfig};
use crate::consts;
use crate::data::{Data, DataContainer};
use crate::error::{FieldIoError, Result};
use crate::field::Field;
use crate::file_data::FileData;
use crate::metadata::{Convention, Metadata, Variable};
use crate::types::{Attribute, DataType, Element, TypedBuffer};

/// Copy `field` into a new field one level taller, repeating the surface
///
/// Level `j` of the input becomes level `j + 1` of the output and input level
/// 0 is also written to output level 0.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use fieldio::field::{Field, Grid};
/// use fieldio::mapping::copy_surface_level;
///
/// let grid = Arc::new(Grid::new("g", vec![(0.0, 0.0)]));
/// let field = Field::from_values("theta", vec![1.0f64, 2.0, 3.0], 3, grid).unwrap();
///
/// let taller = copy_surface_level::<f64>(&field, "theta").unwrap();
/// assert_eq!(taller.values::<f64>().unwrap(), &[1.0, 1.0, 2.0, 3.0]);
/// ```
pub fn copy_surface_level<T: Element>(field: &Field, name: &str) -> Result<Field> {
    let (rows, levels) = field.shape();
    let mut copied = field.like(name, levels + 1)?;
    let src = field.values::<T>()?;
    let dst = copied.values_mut::<T>()?;

    for i in 0..rows {
        let from = &src[i * levels..(i + 1) * levels];
        let to = &mut dst[i * (levels + 1)..(i + 1) * (levels + 1)];
        to[1..].copy_from_slice(from);
        if levels > 0 {
            to[0] = from[0];
        }
    }
    Ok(copied)
}

fn fill_mesh<T: Copy>(dst: &mut [T], src: &[T], index_map: &[usize], levels: usize, name: &str) -> Result<()> {
    let points = index_map.len();
    let len = dst.len();
    for (i, mapped) in index_map.iter().enumerate() {
        for level in 0..levels {
            let index = mapped + level * points;
            let slot = dst.get_mut(index).ok_or_else(|| FieldIoError::IndexOutOfRange {
                field: name.to_string(),
                index,
                len,
            })?;
            *slot = src[i * levels + level];
        }
    }
    Ok(())
}

fn fill_native<T: Copy>(dst: &mut [T], src: &[T], rows: usize, levels: usize) {
    for i in 0..rows {
        for level in 0..levels {
            let index = level + i * levels;
            dst[index] = src[i * levels + level];
        }
    }
}

fn add_global_attributes(metadata: &mut Metadata, convention: Convention) {
    metadata.add_global_attr(Attribute::string(
        consts::NAMING_CONVENTION_ATTR,
        convention.name(),
    ));
    metadata.add_global_attr(Attribute::string(consts::PRODUCED_BY_ATTR, consts::PRODUCED_BY));
}

/// Shape of `field` as written: owned rows and levels, outermost axis first
fn disk_shape(field: &Field) -> [usize; 2] {
    [field.levels(), field.owned_rows()]
}

/// Extracts file data containers and metadata from fields
#[derive(Debug, Clone)]
pub struct FieldWriter {
    rank: usize,
    owner_rank: usize,
    full_levels: usize,
    half_levels: usize,
    missing_variable_names: Vec<String>,
    dim_count: usize,
}

impl FieldWriter {
    pub fn new(rank: usize, config: &IoConfig) -> Self {
        FieldWriter {
            rank,
            owner_rank: config.owner_rank,
            full_levels: config.full_levels,
            half_levels: config.half_levels,
            missing_variable_names: config.missing_variable_names.clone(),
            dim_count: 0,
        }
    }

    fn is_owner(&self) -> bool {
        self.rank == self.owner_rank
    }

    /// Restart automatic `dim<N>` naming at `dim0`
    ///
    /// The count otherwise runs for the writer's lifetime, across files.
    pub fn reset_dimension_count(&mut self) {
        self.dim_count = 0;
    }

    /// Add `field` to `file_data` as variable `write_name` of a
    /// mesh-convention file
    ///
    /// For LFRic naming the field is first adapted to its file shape: a
    /// half-level field flagged `no_first_level` gains a duplicated surface
    /// level, any other field is renamed to `write_name`.
    pub fn populate_file_data_with_field(
        &self,
        file_data: &mut FileData,
        field: &mut Field,
        field_metadata: &FieldMetadata,
        write_name: &str,
        vert_config_name: &str,
        is_lfric: bool,
    ) -> Result<()> {
        if !self.is_owner() {
            return Ok(());
        }
        tracing::debug!(field = field.name(), write_name, is_lfric, "extracting field");

        let adapted = if is_lfric {
            self.write_field(field, write_name, field_metadata.no_first_level)?
        } else {
            None
        };
        let write_field: &Field = adapted.as_ref().unwrap_or(field);

        let index_map = file_data.index_map().to_vec();
        let (metadata, data) = file_data.parts_mut();
        self.populate_metadata_with_field(metadata, write_field, field_metadata, write_name, vert_config_name);
        self.populate_data_with_field(data, write_field, &index_map, write_name)?;

        let convention = if is_lfric { Convention::Lfric } else { Convention::Jedi };
        add_global_attributes(metadata, convention);
        Ok(())
    }

    /// Add `field` to `file_data` in its own point order, for dumping field
    /// sets that have no file convention
    ///
    /// Sizes without a dimension get a new `dim<N>` dimension, and `lon`/`lat`
    /// coordinate variables are taken from the field's grid.
    pub fn populate_file_data_with_field_native(
        &mut self,
        file_data: &mut FileData,
        field: &Field,
        write_name: &str,
    ) -> Result<()> {
        if !self.is_owner() {
            return Ok(());
        }
        tracing::debug!(field = field.name(), write_name, "extracting field in native order");

        let (metadata, data) = file_data.parts_mut();
        let rows = field.owned_rows();
        let levels = field.levels();
        for size in [rows, levels] {
            if metadata.dimension_name(size).is_none() {
                let name = format!("{}{}", consts::DIM_PREFIX, self.dim_count);
                metadata.add_dimension(name, size);
                self.dim_count += 1;
            }
        }

        let mut variable = Variable::new(write_name, field.data_type());
        self.add_variable_dimensions(field, metadata, &mut variable, "");
        metadata.add_variable(variable);

        let lonlat = field.grid().lonlat();
        if lonlat.len() < rows {
            return Err(FieldIoError::DataShapeMismatch {
                expected: rows,
                found: lonlat.len(),
            });
        }
        let horizontal_dim = metadata
            .dimension_name(rows)
            .ok_or_else(|| FieldIoError::DimensionNotFound(format!("size {}", rows)))?
            .to_string();
        let coords = [
            (consts::LONGITUDE, lonlat[..rows].iter().map(|p| p.0).collect::<Vec<f64>>()),
            (consts::LATITUDE, lonlat[..rows].iter().map(|p| p.1).collect::<Vec<f64>>()),
        ];
        for (name, values) in coords {
            let mut coord_var = Variable::new(name, DataType::Double);
            coord_var.add_dimension(horizontal_dim.as_str(), rows);
            metadata.add_variable(coord_var);
            data.add_container(DataContainer::from_values(name, values));
        }

        let mut values = TypedBuffer::zeroed(field.data_type(), rows * levels)?;
        match (field.buffer(), &mut values) {
            (TypedBuffer::Double(src), TypedBuffer::Double(dst)) => fill_native(dst, src, rows, levels),
            (TypedBuffer::Float(src), TypedBuffer::Float(dst)) => fill_native(dst, src, rows, levels),
            (TypedBuffer::Int(src), TypedBuffer::Int(dst)) => fill_native(dst, src, rows, levels),
            (src, dst) => return Err(type_mismatch(dst.data_type(), src.data_type())),
        }
        data.add_container(DataContainer::from_buffer(write_name, values));

        add_global_attributes(metadata, Convention::Jedi);
        Ok(())
    }

    /// Adapt a field to its LFRic file shape
    ///
    /// Returns a new field when the surface level had to be duplicated;
    /// otherwise renames `field` in place and returns `None`.
    fn write_field(&self, field: &mut Field, write_name: &str, no_first_level: bool) -> Result<Option<Field>> {
        let levels = field.levels();
        if no_first_level && levels == self.full_levels {
            return Err(FieldIoError::LevelMisconfiguration {
                field: field.name().to_string(),
                levels,
            });
        }
        if self.missing_variable_names.iter().any(|name| name == write_name) {
            return Err(FieldIoError::Misconfigured(format!(
                "write name \"{}\" is not defined in LFRic files",
                write_name
            )));
        }

        if no_first_level && levels == self.half_levels {
            let copied = match field.buffer() {
                TypedBuffer::Double(_) => copy_surface_level::<f64>(field, write_name)?,
                TypedBuffer::Float(_) => copy_surface_level::<f32>(field, write_name)?,
                TypedBuffer::Int(_) => copy_surface_level::<i32>(field, write_name)?,
            };
            return Ok(Some(copied));
        }
        field.rename(write_name);
        Ok(None)
    }

    fn populate_metadata_with_field(
        &self,
        metadata: &mut Metadata,
        field: &Field,
        field_metadata: &FieldMetadata,
        write_name: &str,
        vert_config_name: &str,
    ) {
        let mut variable = Variable::new(write_name, field.data_type());
        self.add_variable_dimensions(field, metadata, &mut variable, vert_config_name);

        let jedi_name = &field_metadata.jedi_name;
        let attributes = [
            (consts::STANDARD_NAME_ATTR, jedi_name.clone()),
            (consts::LONG_NAME_ATTR, format!("{}{}", jedi_name, consts::INCREMENT_SUFFIX)),
            (consts::UNITS_ATTR, field_metadata.units.clone()),
            (consts::MESH_ATTR, consts::MESH_ATTR_VALUE.to_string()),
            (consts::LOCATION_ATTR, consts::LOCATION_ATTR_VALUE.to_string()),
            (consts::COORDINATES_ATTR, consts::COORDINATES_ATTR_VALUE.to_string()),
        ];
        for (name, value) in attributes {
            variable.add_attribute(Attribute::string(name, value));
        }
        metadata.add_variable(variable);
    }

    /// Name each axis of the written shape; an explicitly configured vertical
    /// dimension wins over lookup by size, and unknown sizes are left out
    fn add_variable_dimensions(
        &self,
        field: &Field,
        metadata: &Metadata,
        variable: &mut Variable,
        vert_config_name: &str,
    ) {
        for size in disk_shape(field) {
            let configured = !vert_config_name.is_empty()
                && metadata.dimension(vert_config_name).ok() == Some(size);
            let name = if configured {
                Some(vert_config_name)
            } else {
                metadata.dimension_name(size)
            };
            match name {
                Some(name) => variable.add_dimension(name, size),
                None => tracing::debug!(variable = %variable.name, size, "no dimension for size"),
            }
        }
    }

    fn populate_data_with_field(
        &self,
        data: &mut Data,
        field: &Field,
        index_map: &[usize],
        write_name: &str,
    ) -> Result<()> {
        let levels = field.levels();
        let len = field.owned_rows() * levels;
        if index_map.len() * levels != len {
            return Err(FieldIoError::DataShapeMismatch {
                expected: len,
                found: index_map.len() * levels,
            });
        }

        let mut values = TypedBuffer::zeroed(field.data_type(), len)?;
        match (field.buffer(), &mut values) {
            (TypedBuffer::Double(src), TypedBuffer::Double(dst)) => {
                fill_mesh(dst, src, index_map, levels, write_name)?
            }
            (TypedBuffer::Float(src), TypedBuffer::Float(dst)) => {
                fill_mesh(dst, src, index_map, levels, write_name)?
            }
            (TypedBuffer::Int(src), TypedBuffer::Int(dst)) => {
                fill_mesh(dst, src, index_map, levels, write_name)?
            }
            (src, dst) => return Err(type_mismatch(dst.data_type(), src.data_type())),
        }
        data.add_container(DataContainer::from_buffer(write_name, values));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Grid;
    use std::sync::Arc;

    fn small_config() -> IoConfig {
        IoConfig {
            full_levels: 4,
            half_levels: 3,
            ..IoConfig::default()
        }
    }

    fn grid() -> Arc<Grid> {
        Arc::new(Grid::new("g", vec![(10.0, 1.0), (20.0, 2.0)]))
    }

    fn mesh_file_data() -> FileData {
        let mut file_data = FileData::for_grid("g");
        file_data.set_index_map(vec![1, 0]);
        let metadata = file_data.metadata_mut();
        metadata.add_dimension("nMesh2d_face", 2);
        metadata.add_dimension("full_levels", 4);
        metadata.add_dimension("half_levels", 3);
        file_data
    }

    #[test]
    fn test_copy_surface_level() {
        let field = Field::from_values("f", vec![1i32, 2, 10, 20], 2, grid()).unwrap();
        let copied = copy_surface_level::<i32>(&field, "g").unwrap();

        assert_eq!(copied.shape(), (2, 3));
        assert_eq!(copied.name(), "g");
        assert_eq!(copied.values::<i32>().unwrap(), &[1, 1, 2, 10, 10, 20]);
    }

    #[test]
    fn test_mesh_write() {
        let writer = FieldWriter::new(0, &small_config());
        let mut file_data = mesh_file_data();
        let mut field = Field::from_values("air_temperature", vec![0.0f64, 1.0, 2.0, 3.0, 10.0, 11.0, 12.0, 13.0], 4, grid()).unwrap();
        let field_metadata = FieldMetadata::new("air_temperature", "theta", "theta_inc").with_units("K");

        writer
            .populate_file_data_with_field(&mut file_data, &mut field, &field_metadata, "theta_inc", "full_levels", true)
            .unwrap();

        assert_eq!(field.name(), "theta_inc");
        let variable = file_data.metadata().variable("theta_inc").unwrap();
        assert_eq!(variable.dimension_names(), vec!["full_levels", "nMesh2d_face"]);
        assert_eq!(variable.str_attr("long_name").unwrap(), "air_temperature_inc");
        assert_eq!(variable.str_attr("units").unwrap(), "K");
        assert_eq!(variable.str_attr("location").unwrap(), "face");

        let values = file_data.data().container("theta_inc").unwrap();
        assert_eq!(values.data::<f64>().unwrap(), &[10.0, 0.0, 11.0, 1.0, 12.0, 2.0, 13.0, 3.0]);
        assert_eq!(file_data.metadata().variable_convention(), Convention::Lfric);
    }

    #[test]
    fn test_half_level_field_gains_surface() {
        let writer = FieldWriter::new(0, &small_config());
        let mut file_data = mesh_file_data();
        let mut field = Field::from_values("t", vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], 3, grid()).unwrap();
        let field_metadata = FieldMetadata::new("t", "theta", "theta_inc").with_no_first_level(true);

        writer
            .populate_file_data_with_field(&mut file_data, &mut field, &field_metadata, "theta_inc", "", true)
            .unwrap();

        assert_eq!(field.name(), "t");
        assert_eq!(
            file_data.metadata().variable("theta_inc").unwrap().dimension_names(),
            vec!["full_levels", "nMesh2d_face"]
        );
        assert_eq!(
            file_data.data().container("theta_inc").unwrap().data::<f32>().unwrap(),
            &[4.0, 1.0, 4.0, 1.0, 5.0, 2.0, 6.0, 3.0]
        );
    }

    #[test]
    fn test_full_level_field_with_no_first_level_rejected() {
        let writer = FieldWriter::new(0, &small_config());
        let mut file_data = mesh_file_data();
        let mut field = Field::new("t", DataType::Double, 2, 4, grid()).unwrap();
        let field_metadata = FieldMetadata::new("t", "theta", "theta_inc").with_no_first_level(true);

        match writer.populate_file_data_with_field(&mut file_data, &mut field, &field_metadata, "theta_inc", "", true) {
            Err(FieldIoError::LevelMisconfiguration { levels, .. }) => assert_eq!(levels, 4),
            other => panic!("Expected LevelMisconfiguration, got {:?}", other),
        }
        assert!(file_data.data().is_empty());
    }

    #[test]
    fn test_missing_variable_write_name_rejected() {
        let writer = FieldWriter::new(0, &small_config());
        let mut file_data = mesh_file_data();
        let mut field = Field::new("h", DataType::Double, 2, 4, grid()).unwrap();
        let field_metadata = FieldMetadata::new("h", "height", "height");

        assert!(matches!(
            writer.populate_file_data_with_field(&mut file_data, &mut field, &field_metadata, "height", "", true),
            Err(FieldIoError::Misconfigured(_))
        ));
    }

    #[test]
    fn test_jedi_write_keeps_field() {
        let writer = FieldWriter::new(0, &small_config());
        let mut file_data = mesh_file_data();
        let mut field = Field::from_values("t", vec![1i32, 2, 3, 4, 5, 6], 3, grid()).unwrap();
        let field_metadata = FieldMetadata::new("t", "theta", "theta_inc").with_no_first_level(true);

        writer
            .populate_file_data_with_field(&mut file_data, &mut field, &field_metadata, "t", "half_levels", false)
            .unwrap();

        assert_eq!(
            file_data.metadata().variable("t").unwrap().dimension_names(),
            vec!["half_levels", "nMesh2d_face"]
        );
        assert_eq!(file_data.data().container("t").unwrap().data::<i32>().unwrap(), &[4, 1, 5, 2, 6, 3]);
        assert_eq!(file_data.metadata().variable_convention(), Convention::Jedi);
    }

    #[test]
    fn test_index_map_size_mismatch() {
        let writer = FieldWriter::new(0, &small_config());
        let mut file_data = mesh_file_data();
        file_data.set_index_map(vec![0]);
        let mut field = Field::new("t", DataType::Double, 2, 4, grid()).unwrap();

        assert!(matches!(
            writer.populate_file_data_with_field(&mut file_data, &mut field, &FieldMetadata::new("t", "t", "t"), "t", "", true),
            Err(FieldIoError::DataShapeMismatch { expected: 8, found: 4 })
        ));
    }

    #[test]
    fn test_native_dump() {
        let mut writer = FieldWriter::new(0, &small_config());
        let mut file_data = FileData::new();
        let a = Field::from_values("a", vec![1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0], 3, grid()).unwrap();
        let b = Field::from_values("b", vec![7i32, 8], 1, grid()).unwrap();

        writer.populate_file_data_with_field_native(&mut file_data, &a, "a").unwrap();
        writer.populate_file_data_with_field_native(&mut file_data, &b, "b").unwrap();

        let metadata = file_data.metadata();
        assert_eq!(metadata.dimension("dim0").unwrap(), 2);
        assert_eq!(metadata.dimension("dim1").unwrap(), 3);
        assert_eq!(metadata.dimension("dim2").unwrap(), 1);
        assert_eq!(metadata.variable("a").unwrap().dimension_names(), vec!["dim1", "dim0"]);
        assert_eq!(metadata.variable("lon").unwrap().dimension_names(), vec!["dim0"]);

        let data = file_data.data();
        assert_eq!(data.container("a").unwrap().data::<f64>().unwrap(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(data.container("lat").unwrap().data::<f64>().unwrap(), &[1.0, 2.0]);
        assert_eq!(metadata.variable_convention(), Convention::Jedi);

        writer.reset_dimension_count();
        let mut fresh = FileData::new();
        writer.populate_file_data_with_field_native(&mut fresh, &b, "b").unwrap();
        assert!(fresh.metadata().is_dim_defined("dim0"));
    }

    #[test]
    fn test_non_owner_extracts_nothing() {
        let writer = FieldWriter::new(1, &small_config());
        let mut file_data = mesh_file_data();
        let mut field = Field::new("t", DataType::Double, 2, 3, grid()).unwrap();

        writer
            .populate_file_data_with_field(&mut file_data, &mut field, &FieldMetadata::new("t", "t", "t_inc"), "t_inc", "", true)
            .unwrap();
        assert_eq!(field.name(), "t");
        assert!(file_data.data().is_empty());
    }
}
