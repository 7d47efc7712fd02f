// src/reader/file_reader.rs
use crate::backend::{FileBackend, FileHandle, FileMode, FileState};
use crate::data::DataContainer;
use crate::error::{FieldIoError, Result};
use crate::file_data::FileData;
use crate::mesh;
use crate::types::{DataType, TypedBuffer};
use chrono::{DateTime, Utc};
use std::path::Path;

/// Reads file metadata and variable values into a [`FileData`]
///
/// Only the owning rank touches the file. On every other rank each method
/// returns `Ok` without doing anything, so all ranks can make the same calls.
pub struct Reader<B: FileBackend> {
    backend: B,
    rank: usize,
    owner_rank: usize,
    handle: Option<B::Handle>,
    state: FileState,
}

impl<B: FileBackend> Reader<B> {
    pub fn new(backend: B, rank: usize, owner_rank: usize) -> Self {
        Reader {
            backend,
            rank,
            owner_rank,
            handle: None,
            state: FileState::Idle,
        }
    }

    pub fn is_owner(&self) -> bool {
        self.rank == self.owner_rank
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    pub fn state(&self) -> FileState {
        self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Open `path` for reading, closing any file already open
    pub fn open_file(&mut self, path: &Path) -> Result<()> {
        tracing::trace!(path = %path.display(), "Reader::open_file");
        if !self.is_owner() {
            return Ok(());
        }
        if path.as_os_str().is_empty() {
            return Err(FieldIoError::NoFilePath);
        }
        if !self.backend.exists(path) {
            return Err(FieldIoError::FileMissing(path.to_path_buf()));
        }
        self.close_file()?;

        let handle = self
            .backend
            .open(path, FileMode::Read)
            .map_err(|e| FieldIoError::backend("Reader::open_file", e))?;
        self.handle = Some(handle);
        self.state = FileState::Opened;
        Ok(())
    }

    /// Replace the metadata of `file_data` with the file's
    pub fn read_metadata(&mut self, file_data: &mut FileData) -> Result<()> {
        tracing::trace!("Reader::read_metadata");
        if !self.is_owner() {
            return Ok(());
        }
        let metadata = self
            .handle()?
            .read_metadata()
            .map_err(|e| FieldIoError::backend("Reader::read_metadata", e))?;
        *file_data.metadata_mut() = metadata;
        self.state = FileState::MetadataLoaded;
        Ok(())
    }

    /// Read every value of the named variables into `file_data`
    ///
    /// Containers already present in `file_data` are kept.
    pub fn read_full_data(&mut self, file_data: &mut FileData, names: &[String]) -> Result<()> {
        tracing::trace!(count = names.len(), "Reader::read_full_data");
        if !self.is_owner() || names.is_empty() {
            return Ok(());
        }
        for name in names {
            let variable = file_data.metadata().variable(name)?;
            if variable.data_type == DataType::String {
                return Err(FieldIoError::UnsupportedType(format!(
                    "variable \"{}\" holds strings",
                    name
                )));
            }
        }

        let containers = self
            .handle()?
            .read_raw(names)
            .map_err(|e| FieldIoError::backend("Reader::read_full_data", e))?;
        for container in containers {
            tracing::debug!(name = container.name(), len = container.len(), "variable read");
            file_data.data_mut().add_container(container);
        }
        self.state = FileState::DataPopulated;
        Ok(())
    }

    pub fn read_full_datum(&mut self, file_data: &mut FileData, name: &str) -> Result<()> {
        self.read_full_data(file_data, &[name.to_string()])
    }

    /// Read the values of `name` at the time step matching `date_time`
    ///
    /// `file_data` must already hold the file's date-times.
    pub fn read_datum_at_time(
        &mut self,
        file_data: &mut FileData,
        name: &str,
        date_time: &DateTime<Utc>,
        time_dim_name: &str,
    ) -> Result<()> {
        tracing::trace!(name, %date_time, "Reader::read_datum_at_time");
        if !self.is_owner() {
            return Ok(());
        }
        let step = mesh::find_time_step(file_data.date_times(), date_time)?;
        self.read_datum_at_step(file_data, name, step, time_dim_name)
    }

    /// Read the slab of `name` for one time step
    ///
    /// The time dimension must be the variable's first dimension. A variable
    /// without a time dimension is read whole.
    pub fn read_datum_at_step(
        &mut self,
        file_data: &mut FileData,
        name: &str,
        step: usize,
        time_dim_name: &str,
    ) -> Result<()> {
        tracing::trace!(name, step, "Reader::read_datum_at_step");
        if !self.is_owner() {
            return Ok(());
        }
        let variable = file_data.metadata().variable(name)?;
        let time_position = variable
            .dimensions
            .iter()
            .position(|(dim_name, _)| dim_name == time_dim_name);

        let steps = match time_position {
            None => return self.read_full_datum(file_data, name),
            Some(0) => variable.dimensions[0].1,
            Some(_) => {
                return Err(FieldIoError::Misconfigured(format!(
                    "time dimension \"{}\" is not the first dimension of \"{}\"",
                    time_dim_name, name
                )))
            }
        };
        if step >= steps {
            return Err(FieldIoError::OutOfRange {
                index: step,
                len: steps,
            });
        }

        let mut scratch = FileData::new();
        *scratch.metadata_mut() = file_data.metadata().clone();
        self.read_full_datum(&mut scratch, name)?;

        let full = scratch.data_mut().delete_container(name).ok_or_else(|| {
            FieldIoError::ContainerNotFound(name.to_string())
        })?;
        let slab = full.len() / steps;
        let range = step * slab..(step + 1) * slab;
        let values = match full.buffer() {
            TypedBuffer::Double(v) => TypedBuffer::Double(v[range].to_vec()),
            TypedBuffer::Float(v) => TypedBuffer::Float(v[range].to_vec()),
            TypedBuffer::Int(v) => TypedBuffer::Int(v[range].to_vec()),
        };
        tracing::debug!(name, step, len = values.len(), "time slab read");
        file_data
            .data_mut()
            .add_container(DataContainer::from_buffer(name, values));
        Ok(())
    }

    /// Longitude/latitude pairs held in the named coordinate containers
    pub fn get_coord_data(&self, file_data: &FileData, coord_names: &[String; 2]) -> Result<Vec<(f64, f64)>> {
        if !self.is_owner() {
            return Ok(Vec::new());
        }
        mesh::coords_from_data(file_data.data(), coord_names)
    }

    /// Release the file; safe to call when nothing is open
    pub fn close_file(&mut self) -> Result<()> {
        if let Some(mut handle) = self.handle.take() {
            tracing::trace!(path = %handle.path().display(), "Reader::close_file");
            self.state = FileState::Closed;
            handle
                .close()
                .map_err(|e| FieldIoError::backend("Reader::close_file", e))?;
        }
        Ok(())
    }

    fn handle(&mut self) -> Result<&mut B::Handle> {
        self.handle.as_mut().ok_or(FieldIoError::FileNotOpen)
    }
}
