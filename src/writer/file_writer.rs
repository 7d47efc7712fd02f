// src/writer/file_writer.rs
use crate::backend::{FileBackend, FileHandle, FileMode, FileState};
use crate::data::DataContainer;
use crate::error::{FieldIoError, Result};
use crate::file_data::FileData;
use crate::metadata::Metadata;
use std::path::Path;

/// Writes metadata and variable values from a [`FileData`]
///
/// As with [`crate::reader::Reader`], only the owning rank touches the file.
pub struct Writer<B: FileBackend> {
    backend: B,
    rank: usize,
    owner_rank: usize,
    handle: Option<B::Handle>,
    state: FileState,
}

impl<B: FileBackend> Writer<B> {
    pub fn new(backend: B, rank: usize, owner_rank: usize) -> Self {
        Writer {
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

    /// Create `path`, replacing any existing file
    pub fn open_file(&mut self, path: &Path) -> Result<()> {
        tracing::trace!(path = %path.display(), "Writer::open_file");
        if !self.is_owner() {
            return Ok(());
        }
        if path.as_os_str().is_empty() {
            return Err(FieldIoError::NoFilePath);
        }
        self.close_file()?;

        let handle = self
            .backend
            .open(path, FileMode::Write)
            .map_err(|e| FieldIoError::backend("Writer::open_file", e))?;
        self.handle = Some(handle);
        self.state = FileState::Opened;
        Ok(())
    }

    pub fn write_metadata(&mut self, metadata: &Metadata) -> Result<()> {
        tracing::trace!("Writer::write_metadata");
        if !self.is_owner() {
            return Ok(());
        }
        self.handle()?
            .write_metadata(metadata)
            .map_err(|e| FieldIoError::backend("Writer::write_metadata", e))?;
        self.state = FileState::MetadataLoaded;
        Ok(())
    }

    /// Write every data container of `file_data`
    ///
    /// Each container must have a variable of the same name in the metadata.
    pub fn write_data(&mut self, file_data: &FileData) -> Result<()> {
        tracing::trace!("Writer::write_data");
        if !self.is_owner() {
            return Ok(());
        }
        for container in file_data.data().containers() {
            file_data.metadata().variable(container.name())?;
            self.write_datum(container)?;
        }
        Ok(())
    }

    pub fn write_datum(&mut self, container: &DataContainer) -> Result<()> {
        if !self.is_owner() {
            return Ok(());
        }
        tracing::debug!(name = container.name(), len = container.len(), "variable written");
        self.handle()?
            .write_raw(container.name(), container.buffer())
            .map_err(|e| FieldIoError::backend("Writer::write_datum", e))?;
        self.state = FileState::DataPopulated;
        Ok(())
    }

    /// Release the file; safe to call when nothing is open
    pub fn close_file(&mut self) -> Result<()> {
        if let Some(mut handle) = self.handle.take() {
            tracing::trace!(path = %handle.path().display(), "Writer::close_file");
            self.state = FileState::Closed;
            handle
                .close()
                .map_err(|e| FieldIoError::backend("Writer::close_file", e))?;
        }
        Ok(())
    }

    fn handle(&mut self) -> Result<&mut B::Handle> {
        self.handle.as_mut().ok_or(FieldIoError::FileNotOpen)
    }
}
