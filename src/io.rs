// src/io.rs
//! Reading and writing whole field sets
//!
//! [`FieldIo`] ties the pieces together: every participant calls the same
//! operation with its local partitions, fields are gathered to the owning
//! rank, mapped to or from file layout there, and scattered back. A read
//! caches the file's metadata and index map per grid so that a later write on
//! the same grid reproduces the file's layout.

use crate::backend::FileBackend;
use crate::config::{FieldMetadata, IoConfig};
use crate::consts;
use crate::data::DataContainer;
use crate::error::{FieldIoError, Result};
use crate::field::{Distributor, FieldSet, Grid};
use crate::file_data::FileData;
use crate::mapping::{FieldReader, FieldWriter};
use crate::mesh;
use crate::metadata::{Convention, Variable};
use crate::reader::Reader;
use crate::types::{Attribute, DataType};
use crate::writer::Writer;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    State,
    Increments,
}

impl FileKind {
    fn label(self) -> &'static str {
        match self {
            FileKind::State => "state",
            FileKind::Increments => "increments",
        }
    }
}

/// Field set reader and writer for one participant
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use std::sync::Arc;
/// use fieldio::backend::MemoryBackend;
/// use fieldio::config::IoConfig;
/// use fieldio::field::{Field, FieldSet, Grid, SerialDistributor};
/// use fieldio::io::FieldIo;
/// use fieldio::types::DataType;
///
/// let backend = MemoryBackend::new();
/// let mut io = FieldIo::new(backend.clone(), SerialDistributor::new(), IoConfig::default()).unwrap();
///
/// // A file-less field set can still be dumped in its own point order
/// let grid = Arc::new(Grid::new("C2", vec![(0.0, 0.0), (90.0, 0.0)]));
/// let mut fields = FieldSet::new();
/// fields.add(Field::new("theta", DataType::Double, 2, 3, grid).unwrap());
///
/// io.write_field_set(&fields, Path::new("dump.nc")).unwrap();
/// assert_eq!(backend.file_count(), 1);
/// ```
pub struct FieldIo<B: FileBackend + Clone, D: Distributor> {
    config: IoConfig,
    distributor: D,
    reader: Reader<B>,
    writer: Writer<B>,
    field_reader: FieldReader,
    field_writer: FieldWriter,
    files_data: HashMap<String, FileData>,
}

impl<B: FileBackend + Clone, D: Distributor> FieldIo<B, D> {
    pub fn new(backend: B, distributor: D, config: IoConfig) -> Result<Self> {
        config.validate()?;
        let rank = distributor.rank();
        Ok(FieldIo {
            reader: Reader::new(backend.clone(), rank, config.owner_rank),
            writer: Writer::new(backend, rank, config.owner_rank),
            field_reader: FieldReader::new(rank, &config),
            field_writer: FieldWriter::new(rank, &config),
            files_data: HashMap::new(),
            distributor,
            config,
        })
    }

    pub fn config(&self) -> &IoConfig {
        &self.config
    }

    pub fn distributor(&self) -> &D {
        &self.distributor
    }

    pub fn is_owner(&self) -> bool {
        self.distributor.rank() == self.config.owner_rank
    }

    /// True while either the reader or the writer holds an open file
    pub fn has_open_files(&self) -> bool {
        self.reader.is_open() || self.writer.is_open()
    }

    /// Read the fields named by `field_metadata` at `date_time`
    pub fn read_state(
        &mut self,
        fields: &mut FieldSet,
        field_metadata: &[FieldMetadata],
        path: &Path,
        date_time: &DateTime<Utc>,
    ) -> Result<()> {
        tracing::trace!(path = %path.display(), %date_time, "FieldIo::read_state");
        self.with_cleanup("read_state", |io| {
            io.read_fields(fields, field_metadata, path, Some(date_time))
        })
    }

    /// Read the fields named by `field_metadata` from a file without a time
    /// axis
    pub fn read_increments(
        &mut self,
        fields: &mut FieldSet,
        field_metadata: &[FieldMetadata],
        path: &Path,
    ) -> Result<()> {
        tracing::trace!(path = %path.display(), "FieldIo::read_increments");
        self.with_cleanup("read_increments", |io| {
            io.read_fields(fields, field_metadata, path, None)
        })
    }

    /// Write a state file laid out like the last file read on the same grid
    ///
    /// With LFRic naming each field is written under its LFRic read name.
    pub fn write_state(
        &mut self,
        fields: &FieldSet,
        field_metadata: &[FieldMetadata],
        path: &Path,
        is_lfric: bool,
    ) -> Result<()> {
        tracing::trace!(path = %path.display(), is_lfric, "FieldIo::write_state");
        self.with_cleanup("write_state", |io| {
            io.write_fields(fields, field_metadata, path, is_lfric, FileKind::State)
        })
    }

    /// Write an increments file laid out like the last file read on the same
    /// grid
    ///
    /// With LFRic naming each field is written under its LFRic write name.
    pub fn write_increments(
        &mut self,
        fields: &FieldSet,
        field_metadata: &[FieldMetadata],
        path: &Path,
        is_lfric: bool,
    ) -> Result<()> {
        tracing::trace!(path = %path.display(), is_lfric, "FieldIo::write_increments");
        self.with_cleanup("write_increments", |io| {
            io.write_fields(fields, field_metadata, path, is_lfric, FileKind::Increments)
        })
    }

    /// Dump every field of `fields` in its own point order
    ///
    /// Automatic `dim<N>` names keep counting across dumps made by the same
    /// `FieldIo`, so a second dump starts after the last number used.
    pub fn write_field_set(&mut self, fields: &FieldSet, path: &Path) -> Result<()> {
        tracing::trace!(path = %path.display(), "FieldIo::write_field_set");
        self.with_cleanup("write_field_set", |io| io.dump_fields(fields, path))
    }

    /// Close the reader and the writer
    ///
    /// Both are attempted; the first failure is returned.
    pub fn close_files(&mut self) -> Result<()> {
        tracing::trace!("FieldIo::close_files");
        let reader = self.reader.close_file();
        let writer = self.writer.close_file();
        reader.and(writer)
    }

    /// Load the layout of the file at `path` for fields on `grid`
    ///
    /// Any cached data for the grid is replaced. The mesh, vertical-level and
    /// coordinate variables are read, the index map from mesh-native points to
    /// file points is built and, with `with_dates`, the time axis is decoded.
    /// The reader stays open on `path`. Returns the file's naming convention.
    pub fn initialise_file(&mut self, grid: &Grid, path: &Path, with_dates: bool) -> Result<Convention> {
        tracing::trace!(grid = grid.name(), path = %path.display(), with_dates, "FieldIo::initialise_file");
        self.with_cleanup("initialise_file", |io| io.load_file_layout(grid, path, with_dates))
    }

    fn load_file_layout(&mut self, grid: &Grid, path: &Path, with_dates: bool) -> Result<Convention> {
        if !self.is_owner() {
            return Ok(Convention::default());
        }
        self.files_data.remove(grid.name());
        let mut file_data = FileData::for_grid(grid.name());

        self.reader.open_file(path)?;
        self.reader.read_metadata(&mut file_data)?;

        let mesh_names = file_data.metadata().find_variable_names(&self.config.mesh_term);
        self.reader.read_full_data(&mut file_data, &mesh_names)?;

        let mut extra_names: Vec<String> = Vec::new();
        for name in [consts::FULL_LEVELS_VAR, consts::HALF_LEVELS_VAR] {
            if file_data.metadata().has_variable(name) {
                extra_names.push(name.to_string());
            }
        }
        for name in &self.config.lfric_coord_var_names {
            if !mesh_names.contains(name) {
                extra_names.push(name.clone());
            }
        }
        self.reader.read_full_data(&mut file_data, &extra_names)?;

        let coords = self
            .reader
            .get_coord_data(&file_data, &self.config.lfric_coord_var_names)?;
        file_data.set_index_map(mesh::create_index_map(grid, &coords)?);

        if with_dates {
            self.reader
                .read_full_datum(&mut file_data, &self.config.time_var_name)?;
            let date_times = {
                let time_var = file_data.metadata().variable(&self.config.time_var_name)?;
                let origin = mesh::parse_time_origin(time_var.str_attr(&self.config.time_origin_name)?)?;
                let seconds = file_data
                    .data()
                    .container(&self.config.time_var_name)?
                    .data::<f64>()?;
                mesh::create_date_times(origin, seconds)?
            };
            file_data.set_date_times(date_times);
        }

        let convention = file_data.metadata().variable_convention();
        file_data.metadata().log_summary();
        tracing::debug!(
            grid = grid.name(),
            %convention,
            points = file_data.index_map().len(),
            "file initialised"
        );
        self.files_data.insert(grid.name().to_string(), file_data);
        Ok(convention)
    }

    /// Copy of the cached file data for `grid_name`, empty if none is cached
    ///
    /// Changes to the copy never reach the cache.
    pub fn file_data(&self, grid_name: &str) -> FileData {
        self.files_data
            .get(grid_name)
            .cloned()
            .unwrap_or_else(|| FileData::for_grid(grid_name))
    }

    pub fn has_file_data(&self, grid_name: &str) -> bool {
        self.files_data.contains_key(grid_name)
    }

    /// Strip what must not be copied from a read file into a written one
    ///
    /// Global attributes go, the time and tile dimensions go along with their
    /// variables' values, and every variable left without values is removed.
    pub fn clean_file_data(&self, file_data: &mut FileData) {
        if !self.is_owner() {
            return;
        }
        let (metadata, data) = file_data.parts_mut();
        metadata.clear_global_attributes();
        metadata.delete_dimension(&self.config.time_dim_name);
        metadata.delete_dimension(&self.config.tile_dim_name);
        data.delete_container(&self.config.time_var_name);
        data.delete_container(&self.config.tile_var_name);

        let kept = data.container_names();
        metadata.remove_all_but_these_variables(&kept);
    }

    /// Add the vertical coordinates JEDI-convention files carry
    ///
    /// `full_levels_no_surface` spans the half levels with values `1, 2, ...`
    /// and `half_levels_with_top` spans the full levels with values
    /// `0.5, 1.5, ...`.
    pub fn add_jedi_data(&self, file_data: &mut FileData) {
        if !self.is_owner() {
            return;
        }
        let coordinates = [
            (consts::JEDI_FULL_LEVELS_NO_SURFACE, self.config.half_levels, consts::FULL_LEVELS_START),
            (consts::JEDI_HALF_LEVELS_WITH_TOP, self.config.full_levels, consts::HALF_LEVELS_START),
        ];
        let (metadata, data) = file_data.parts_mut();
        for (name, size, start) in coordinates {
            metadata.add_dimension(name, size);
            let mut variable = Variable::new(name, DataType::Double);
            variable.add_dimension(name, size);
            variable.add_attribute(Attribute::string(consts::NAME_ATTR, name));
            metadata.add_variable(variable);

            let values: Vec<f64> = (0..size).map(|level| start + level as f64).collect();
            data.add_container(DataContainer::from_values(name, values));
        }
    }

    fn with_cleanup<T>(&mut self, operation: &'static str, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let result = f(self);
        if let Err(error) = &result {
            tracing::warn!(operation, %error, "closing files after error");
            if let Err(close_error) = self.close_files() {
                tracing::warn!(operation, error = %close_error, "failed to close files");
            }
        }
        result
    }

    fn read_fields(
        &mut self,
        fields: &mut FieldSet,
        field_metadata: &[FieldMetadata],
        path: &Path,
        date_time: Option<&DateTime<Utc>>,
    ) -> Result<()> {
        if fields.is_empty() {
            return Err(FieldIoError::EmptyFieldSet);
        }
        if path.as_os_str().is_empty() {
            return Err(FieldIoError::NoFilePath);
        }
        if !self.reader.backend().exists(path) {
            return Err(FieldIoError::FileMissing(path.to_path_buf()));
        }

        let mut conventions: HashMap<String, Convention> = HashMap::new();
        for metadata in field_metadata {
            let local = fields.get_mut(&metadata.jedi_name)?;
            let mut global = self.distributor.gather(local)?;

            if self.is_owner() {
                let grid = global.grid().clone();
                let convention = match conventions.get(grid.name()) {
                    Some(convention) => *convention,
                    None => {
                        let convention = self.load_file_layout(&grid, path, date_time.is_some())?;
                        conventions.insert(grid.name().to_string(), convention);
                        convention
                    }
                };
                let read_name = match convention {
                    Convention::Jedi => metadata.jedi_name.as_str(),
                    Convention::Lfric => metadata.lfric_read_name.as_str(),
                };

                if self.config.is_missing_variable(read_name) {
                    tracing::info!(field = %metadata.jedi_name, read_name, "variable not held in file, skipping");
                } else {
                    let mut file_data = self.file_data(grid.name());
                    match date_time {
                        Some(date_time) => self.reader.read_datum_at_time(
                            &mut file_data,
                            read_name,
                            date_time,
                            &self.config.time_dim_name,
                        )?,
                        None => self.reader.read_full_datum(&mut file_data, read_name)?,
                    }
                    self.field_reader.populate_field_with_file_data(
                        &mut global,
                        &file_data,
                        metadata,
                        read_name,
                        convention == Convention::Lfric,
                    )?;
                }
            }

            self.distributor.scatter(&global, local)?;
            self.distributor.halo_exchange(local)?;
        }

        self.reader.close_file()
    }

    fn write_fields(
        &mut self,
        fields: &FieldSet,
        field_metadata: &[FieldMetadata],
        path: &Path,
        is_lfric: bool,
        kind: FileKind,
    ) -> Result<()> {
        let first = fields.first().ok_or(FieldIoError::EmptyFieldSet)?;
        if path.as_os_str().is_empty() {
            tracing::info!(kind = kind.label(), "no file path supplied, nothing written");
            return Ok(());
        }

        let mut file_data = self.file_data(first.grid().name());
        self.clean_file_data(&mut file_data);
        if !is_lfric {
            self.add_jedi_data(&mut file_data);
        }
        self.writer.open_file(path)?;

        for metadata in field_metadata {
            let local = fields.get(&metadata.jedi_name)?;
            let mut global = self.distributor.gather(local)?;

            if self.is_owner() {
                let (write_name, vert_config_name) = if is_lfric {
                    let write_name = match kind {
                        FileKind::State => &metadata.lfric_read_name,
                        FileKind::Increments => &metadata.lfric_write_name,
                    };
                    (write_name.clone(), metadata.lfric_vert_config.as_str())
                } else if metadata.jedi_name == global.name() {
                    (metadata.jedi_name.clone(), metadata.jedi_vert_config.as_str())
                } else {
                    return Err(FieldIoError::Misconfigured(format!(
                        "JEDI name \"{}\" does not match field \"{}\"",
                        metadata.jedi_name,
                        global.name()
                    )));
                };

                self.field_writer.populate_file_data_with_field(
                    &mut file_data,
                    &mut global,
                    metadata,
                    &write_name,
                    vert_config_name,
                    is_lfric,
                )?;
                self.writer.write_metadata(file_data.metadata())?;
                self.writer.write_data(&file_data)?;
                file_data.clear_data();
            }
        }

        self.writer.close_file()
    }

    fn dump_fields(&mut self, fields: &FieldSet, path: &Path) -> Result<()> {
        if fields.is_empty() {
            return Err(FieldIoError::EmptyFieldSet);
        }
        if path.as_os_str().is_empty() {
            tracing::info!("no file path supplied, field set not written");
            return Ok(());
        }

        let mut file_data = FileData::new();
        self.writer.open_file(path)?;

        for local in fields.iter() {
            let global = self.distributor.gather(local)?;
            if self.is_owner() {
                self.field_writer
                    .populate_file_data_with_field_native(&mut file_data, &global, global.name())?;
                self.writer.write_metadata(file_data.metadata())?;
                self.writer.write_data(&file_data)?;
                file_data.clear_data();
            }
        }

        self.writer.close_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::data::Data;
    use crate::field::{Field, SerialDistributor};
    use crate::metadata::Metadata;
    use chrono::TimeZone;
    use std::path::PathBuf;
    use std::sync::Arc;

    const POINTS: [(f64, f64); 3] = [(0.0, 10.0), (120.0, 0.0), (240.0, -10.0)];

    fn small_config() -> IoConfig {
        IoConfig {
            full_levels: 4,
            half_levels: 3,
            ..IoConfig::default()
        }
    }

    fn grid() -> Arc<Grid> {
        Arc::new(Grid::new("C3", POINTS.to_vec()))
    }

    /// A state file with points stored in reverse order and two time steps
    fn seed_state_file(backend: &MemoryBackend, path: &Path) {
        let mut metadata = Metadata::new();
        metadata.add_dimension("nMesh2d_face", 3);
        metadata.add_dimension("full_levels", 4);
        metadata.add_dimension("time_counter", 2);
        metadata.add_global_attr(Attribute::string(consts::NAMING_CONVENTION_ATTR, consts::LFRIC_CONVENTION));

        for name in [consts::LFRIC_LON_VAR, consts::LFRIC_LAT_VAR] {
            let mut variable = Variable::new(name, DataType::Double);
            variable.add_dimension("nMesh2d_face", 3);
            metadata.add_variable(variable);
        }
        let mut time = Variable::new("time_instant", DataType::Double);
        time.add_dimension("time_counter", 2);
        time.add_attribute(Attribute::string("time_origin", "2024-01-01 00:00:00"));
        metadata.add_variable(time);

        let mut theta = Variable::new("theta", DataType::Double);
        theta.add_dimension("time_counter", 2);
        theta.add_dimension("full_levels", 4);
        theta.add_dimension("nMesh2d_face", 3);
        metadata.add_variable(theta);

        let mut data = Data::new();
        data.add_container(DataContainer::from_values(consts::LFRIC_LON_VAR, vec![240.0f64, 120.0, 0.0]));
        data.add_container(DataContainer::from_values(consts::LFRIC_LAT_VAR, vec![-10.0f64, 0.0, 10.0]));
        data.add_container(DataContainer::from_values("time_instant", vec![0.0f64, 3600.0]));
        // step 0 is all zeros; step 1 holds 100 * level + disk point
        let mut theta_values = vec![0.0f64; 12];
        for level in 0..4 {
            for point in 0..3 {
                theta_values.push((100 * level + point) as f64);
            }
        }
        data.add_container(DataContainer::from_values("theta", theta_values));

        backend.insert_file(path, metadata, &data).unwrap();
    }

    fn theta_fields() -> FieldSet {
        let mut fields = FieldSet::new();
        fields.add(Field::new("air_potential_temperature", DataType::Double, 3, 4, grid()).unwrap());
        fields
    }

    fn theta_metadata() -> Vec<FieldMetadata> {
        vec![FieldMetadata::new("air_potential_temperature", "theta", "theta_inc").with_vert_config("full_levels", "")]
    }

    fn io(backend: &MemoryBackend) -> FieldIo<MemoryBackend, SerialDistributor> {
        FieldIo::new(backend.clone(), SerialDistributor::new(), small_config()).unwrap()
    }

    #[test]
    fn test_read_state_at_time() {
        let backend = MemoryBackend::new();
        let path = PathBuf::from("state.nc");
        seed_state_file(&backend, &path);
        let mut io = io(&backend);
        let mut fields = theta_fields();

        let when = Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap();
        io.read_state(&mut fields, &theta_metadata(), &path, &when).unwrap();

        let field = fields.get("air_potential_temperature").unwrap();
        // mesh point 0 is disk point 2
        assert_eq!(field.get::<f64>(0, 0).unwrap(), 2.0);
        assert_eq!(field.get::<f64>(0, 3).unwrap(), 302.0);
        assert_eq!(field.get::<f64>(2, 1).unwrap(), 100.0);
        assert!(!io.has_open_files());
        assert_eq!(io.file_data("C3").index_map(), &[2, 1, 0]);
    }

    #[test]
    fn test_read_state_unknown_time_closes_reader() {
        let backend = MemoryBackend::new();
        let path = PathBuf::from("state.nc");
        seed_state_file(&backend, &path);
        let mut io = io(&backend);
        let mut fields = theta_fields();

        let when = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        match io.read_state(&mut fields, &theta_metadata(), &path, &when) {
            Err(FieldIoError::TimeNotFound(_)) => (),
            other => panic!("Expected TimeNotFound, got {:?}", other),
        }
        assert!(!io.has_open_files());
    }

    #[test]
    fn test_read_preconditions() {
        let backend = MemoryBackend::new();
        let mut io = io(&backend);
        let when = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let mut empty = FieldSet::new();
        assert!(matches!(
            io.read_state(&mut empty, &theta_metadata(), Path::new("state.nc"), &when),
            Err(FieldIoError::EmptyFieldSet)
        ));

        let mut fields = theta_fields();
        assert!(matches!(
            io.read_increments(&mut fields, &theta_metadata(), Path::new("")),
            Err(FieldIoError::NoFilePath)
        ));
        match io.read_increments(&mut fields, &theta_metadata(), Path::new("absent.nc")) {
            Err(FieldIoError::FileMissing(path)) => assert_eq!(path, PathBuf::from("absent.nc")),
            other => panic!("Expected FileMissing, got {:?}", other),
        }
    }

    #[test]
    fn test_initialise_mismatched_grid_closes_reader() {
        let backend = MemoryBackend::new();
        let path = PathBuf::from("state.nc");
        seed_state_file(&backend, &path);
        let mut io = io(&backend);
        let other = Grid::new("C3", vec![(10.0, 0.0), (20.0, 0.0), (30.0, 0.0)]);

        match io.initialise_file(&other, &path, false) {
            Err(FieldIoError::CoordinateMismatch(_)) => (),
            other => panic!("Expected CoordinateMismatch, got {:?}", other),
        }
        assert!(!io.has_open_files());
        assert!(!io.has_file_data("C3"));
    }

    #[test]
    fn test_initialise_without_time_origin_closes_reader() {
        let backend = MemoryBackend::new();
        let path = PathBuf::from("state.nc");
        seed_state_file(&backend, &path);
        let (mut metadata, data) = backend.snapshot(&path).unwrap();
        metadata
            .variable_mut("time_instant")
            .unwrap()
            .remove_attribute("time_origin");
        backend.insert_file(&path, metadata, &data).unwrap();
        let mut io = io(&backend);

        match io.initialise_file(&grid(), &path, true) {
            Err(FieldIoError::AttributeNotFound { attribute, .. }) => assert_eq!(attribute, "time_origin"),
            other => panic!("Expected AttributeNotFound, got {:?}", other),
        }
        assert!(!io.has_open_files());
    }

    #[test]
    fn test_clean_file_data() {
        let backend = MemoryBackend::new();
        let path = PathBuf::from("state.nc");
        seed_state_file(&backend, &path);
        let mut io = io(&backend);
        io.initialise_file(&grid(), &path, true).unwrap();
        io.close_files().unwrap();

        let mut file_data = io.file_data("C3");
        io.clean_file_data(&mut file_data);

        let metadata = file_data.metadata();
        assert_eq!(metadata.global_attributes().count(), 0);
        assert!(!metadata.is_dim_defined("time_counter"));
        assert!(!metadata.has_variable("time_instant"));
        // never read, so pruned
        assert!(!metadata.has_variable("theta"));
        assert!(metadata.has_variable(consts::LFRIC_LON_VAR));
        // the cache is untouched
        assert!(io.file_data("C3").metadata().has_variable("theta"));
    }

    #[test]
    fn test_add_jedi_data() {
        let backend = MemoryBackend::new();
        let io = io(&backend);
        let mut file_data = FileData::new();
        io.add_jedi_data(&mut file_data);

        let metadata = file_data.metadata();
        assert_eq!(metadata.dimension(consts::JEDI_FULL_LEVELS_NO_SURFACE).unwrap(), 3);
        assert_eq!(metadata.dimension(consts::JEDI_HALF_LEVELS_WITH_TOP).unwrap(), 4);
        let variable = metadata.variable(consts::JEDI_HALF_LEVELS_WITH_TOP).unwrap();
        assert_eq!(variable.str_attr(consts::NAME_ATTR).unwrap(), consts::JEDI_HALF_LEVELS_WITH_TOP);

        let data = file_data.data();
        assert_eq!(
            data.container(consts::JEDI_FULL_LEVELS_NO_SURFACE).unwrap().data::<f64>().unwrap(),
            &[1.0, 2.0, 3.0]
        );
        assert_eq!(
            data.container(consts::JEDI_HALF_LEVELS_WITH_TOP).unwrap().data::<f64>().unwrap(),
            &[0.5, 1.5, 2.5, 3.5]
        );
    }

    #[test]
    fn test_write_increments_round_trip() {
        let backend = MemoryBackend::new();
        let path = PathBuf::from("state.nc");
        seed_state_file(&backend, &path);
        let mut io = io(&backend);
        let mut fields = theta_fields();
        let when = Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap();
        io.read_state(&mut fields, &theta_metadata(), &path, &when).unwrap();

        let out = PathBuf::from("inc.nc");
        io.write_increments(&fields, &theta_metadata(), &out, true).unwrap();

        let (metadata, data) = backend.snapshot(&out).unwrap();
        assert_eq!(
            metadata.variable("theta_inc").unwrap().dimension_names(),
            vec!["full_levels", "nMesh2d_face"]
        );
        assert!(!metadata.has_variable("time_instant"));
        assert_eq!(metadata.variable_convention(), Convention::Lfric);
        let values = data.container("theta_inc").unwrap().data::<f64>().unwrap();
        assert_eq!(values, &[0.0, 1.0, 2.0, 100.0, 101.0, 102.0, 200.0, 201.0, 202.0, 300.0, 301.0, 302.0]);
    }

    #[test]
    fn test_write_with_empty_path_is_skipped() {
        let backend = MemoryBackend::new();
        let mut io = io(&backend);

        io.write_state(&theta_fields(), &theta_metadata(), Path::new(""), true)
            .unwrap();
        assert_eq!(backend.file_count(), 0);
    }

    #[test]
    fn test_write_without_cached_layout_closes_writer() {
        let backend = MemoryBackend::new();
        let mut io = io(&backend);

        match io.write_increments(&theta_fields(), &theta_metadata(), Path::new("inc.nc"), true) {
            Err(FieldIoError::DataShapeMismatch { .. }) => (),
            other => panic!("Expected DataShapeMismatch, got {:?}", other),
        }
        assert!(!io.has_open_files());
    }

    #[test]
    fn test_write_field_set_dump() {
        let backend = MemoryBackend::new();
        let mut io = io(&backend);
        let mut fields = FieldSet::new();
        let values: Vec<f64> = (0..6).map(|v| v as f64).collect();
        fields.add(Field::from_values("a", values, 2, grid()).unwrap());

        io.write_field_set(&fields, Path::new("dump.nc")).unwrap();

        let (metadata, data) = backend.snapshot("dump.nc").unwrap();
        assert_eq!(metadata.dimension("dim0").unwrap(), 3);
        assert_eq!(metadata.dimension("dim1").unwrap(), 2);
        assert_eq!(metadata.variable_convention(), Convention::Jedi);
        assert_eq!(data.container("lon").unwrap().data::<f64>().unwrap(), &[0.0, 120.0, 240.0]);
        assert_eq!(
            data.container("a").unwrap().data::<f64>().unwrap(),
            &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]
        );
    }

    #[test]
    fn test_dump_dimension_names_keep_counting() {
        let backend = MemoryBackend::new();
        let mut io = io(&backend);
        let mut fields = FieldSet::new();
        fields.add(Field::from_values("a", vec![0.0f64; 6], 2, grid()).unwrap());

        io.write_field_set(&fields, Path::new("first.nc")).unwrap();
        io.write_field_set(&fields, Path::new("second.nc")).unwrap();

        let (first, _) = backend.snapshot("first.nc").unwrap();
        let (second, _) = backend.snapshot("second.nc").unwrap();
        assert_eq!(first.variable("a").unwrap().dimension_names(), vec!["dim1", "dim0"]);
        assert_eq!(second.variable("a").unwrap().dimension_names(), vec!["dim3", "dim2"]);
        assert!(!second.is_dim_defined("dim0"));
    }

    #[test]
    fn test_non_owner_touches_no_file() {
        let backend = MemoryBackend::new();
        let path = PathBuf::from("state.nc");
        seed_state_file(&backend, &path);
        let mut io = FieldIo::new(backend.clone(), SerialDistributor::with_rank(1), small_config()).unwrap();
        let mut fields = theta_fields();
        let when = Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap();

        io.read_state(&mut fields, &theta_metadata(), &path, &when).unwrap();
        assert!(!io.has_file_data("C3"));
        assert!(fields
            .get("air_potential_temperature")
            .unwrap()
            .values::<f64>()
            .unwrap()
            .iter()
            .all(|v| *v == 0.0));
    }
}
