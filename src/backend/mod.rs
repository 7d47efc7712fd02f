// src/backend/mod.rs
//! File access behind the reader and writer
//!
//! A [`FileBackend`] opens files; the returned [`FileHandle`] exchanges
//! [`Metadata`] and flat value buffers with the file. How values are laid out
//! on disk is up to the backend.

mod memory;
pub mod payload;

pub use memory::{MemoryBackend, MemoryHandle};

use crate::data::DataContainer;
use crate::error::BackendError;
use crate::metadata::Metadata;
use crate::types::TypedBuffer;
use std::path::Path;

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Progress of a reader or writer through one file
///
/// `Idle -> Opened -> MetadataLoaded -> DataPopulated (repeatable) -> Closed`.
/// A failure at any step moves straight to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileState {
    #[default]
    Idle,
    Opened,
    MetadataLoaded,
    DataPopulated,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    Read,
    /// Create the file, replacing any existing one
    Write,
}

pub trait FileHandle {
    fn path(&self) -> &Path;

    fn mode(&self) -> FileMode;

    /// Release the file; closing twice is not an error
    fn close(&mut self) -> BackendResult<()>;

    fn is_open(&self) -> bool;

    fn read_metadata(&mut self) -> BackendResult<Metadata>;

    /// Read whole variables, returned in the order requested
    fn read_raw(&mut self, names: &[String]) -> BackendResult<Vec<DataContainer>>;

    /// Define dimensions, variables and global attributes not yet in the file
    fn write_metadata(&mut self, metadata: &Metadata) -> BackendResult<()>;

    /// Store every value of a defined variable
    fn write_raw(&mut self, name: &str, values: &TypedBuffer) -> BackendResult<()>;
}

pub trait FileBackend {
    type Handle: FileHandle;

    fn open(&self, path: &Path, mode: FileMode) -> BackendResult<Self::Handle>;

    fn exists(&self, path: &Path) -> bool;
}
