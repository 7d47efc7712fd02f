// src/backend/memory.rs
use super::{payload, BackendResult, FileBackend, FileHandle, FileMode};
use crate::data::{Data, DataContainer};
use crate::error::BackendError;
use crate::metadata::Metadata;
use crate::types::TypedBuffer;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
struct StoredFile {
    metadata: Metadata,
    payloads: HashMap<String, Bytes>,
}

impl StoredFile {
    fn store(&mut self, name: &str, values: &TypedBuffer) -> BackendResult<()> {
        let variable = self
            .metadata
            .variable(name)
            .map_err(|_| BackendError::UndefinedVariable(name.to_string()))?;

        if variable.data_type != values.data_type() {
            return Err(BackendError::TypeMismatch {
                name: name.to_string(),
                expected: variable.data_type.to_string(),
                found: values.data_type().to_string(),
            });
        }
        if variable.total_size() != values.len() {
            return Err(BackendError::SizeMismatch {
                name: name.to_string(),
                expected: variable.total_size(),
                found: values.len(),
            });
        }

        self.payloads.insert(name.to_string(), payload::encode(values));
        Ok(())
    }

    fn load(&self, name: &str) -> BackendResult<DataContainer> {
        let variable = self
            .metadata
            .variable(name)
            .map_err(|_| BackendError::UndefinedVariable(name.to_string()))?;

        // Unwritten variables read back as zeros, like unfilled file storage
        let values = match self.payloads.get(name) {
            Some(bytes) => payload::decode(name, variable.data_type, bytes)?,
            None => TypedBuffer::zeroed(variable.data_type, variable.total_size()).map_err(|_| {
                BackendError::TypeMismatch {
                    name: name.to_string(),
                    expected: "numeric".to_string(),
                    found: variable.data_type.to_string(),
                }
            })?,
        };
        Ok(DataContainer::from_buffer(name, values))
    }
}

type Store = Arc<RwLock<HashMap<PathBuf, StoredFile>>>;

/// In-process file store
///
/// Clones share the same files, so a writer's output is visible to readers
/// opened from any clone.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use fieldio::backend::{FileBackend, FileHandle, FileMode, MemoryBackend};
/// use fieldio::metadata::{Metadata, Variable};
/// use fieldio::types::{DataType, TypedBuffer};
///
/// let backend = MemoryBackend::new();
/// let path = Path::new("increment.nc");
///
/// let mut metadata = Metadata::new();
/// metadata.add_dimension("n", 2);
/// let mut variable = Variable::new("v", DataType::Int);
/// variable.add_dimension("n", 2);
/// metadata.add_variable(variable);
///
/// let mut handle = backend.open(path, FileMode::Write).unwrap();
/// handle.write_metadata(&metadata).unwrap();
/// handle.write_raw("v", &TypedBuffer::from(vec![4, 5])).unwrap();
/// handle.close().unwrap();
///
/// let (_, data) = backend.snapshot(path).unwrap();
/// assert_eq!(data.container("v").unwrap().data::<i32>().unwrap(), &[4, 5]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    files: Store,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file, replacing any file at `path`
    pub fn insert_file(&self, path: impl AsRef<Path>, metadata: Metadata, data: &Data) -> BackendResult<()> {
        let mut file = StoredFile {
            metadata,
            payloads: HashMap::new(),
        };
        for container in data.containers() {
            file.store(container.name(), container.buffer())?;
        }
        self.files.write().insert(path.as_ref().to_path_buf(), file);
        Ok(())
    }

    /// Decoded copy of a stored file
    pub fn snapshot(&self, path: impl AsRef<Path>) -> BackendResult<(Metadata, Data)> {
        let path = path.as_ref();
        let files = self.files.read();
        let file = files
            .get(path)
            .ok_or_else(|| BackendError::FileNotFound(path.to_path_buf()))?;

        let mut data = Data::new();
        for name in file.payloads.keys() {
            data.add_container(file.load(name)?);
        }
        Ok((file.metadata.clone(), data))
    }

    pub fn remove_file(&self, path: impl AsRef<Path>) -> bool {
        self.files.write().remove(path.as_ref()).is_some()
    }

    pub fn file_count(&self) -> usize {
        self.files.read().len()
    }
}

impl FileBackend for MemoryBackend {
    type Handle = MemoryHandle;

    fn open(&self, path: &Path, mode: FileMode) -> BackendResult<MemoryHandle> {
        match mode {
            FileMode::Read => {
                if !self.exists(path) {
                    return Err(BackendError::FileNotFound(path.to_path_buf()));
                }
            }
            FileMode::Write => {
                self.files
                    .write()
                    .insert(path.to_path_buf(), StoredFile::default());
            }
        }
        tracing::trace!(path = %path.display(), ?mode, "memory file opened");

        Ok(MemoryHandle {
            path: path.to_path_buf(),
            mode,
            files: Arc::clone(&self.files),
            open: true,
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.read().contains_key(path)
    }
}

/// Open file in a [`MemoryBackend`]
#[derive(Debug)]
pub struct MemoryHandle {
    path: PathBuf,
    mode: FileMode,
    files: Store,
    open: bool,
}

impl MemoryHandle {
    fn ensure_open(&self) -> BackendResult<()> {
        if self.open {
            Ok(())
        } else {
            Err(BackendError::Io(io::Error::new(
                io::ErrorKind::NotConnected,
                format!("{} is closed", self.path.display()),
            )))
        }
    }

    fn ensure_writable(&self) -> BackendResult<()> {
        self.ensure_open()?;
        match self.mode {
            FileMode::Write => Ok(()),
            FileMode::Read => Err(BackendError::ReadOnly(self.path.clone())),
        }
    }

    fn missing(&self) -> BackendError {
        BackendError::FileNotFound(self.path.clone())
    }
}

impl FileHandle for MemoryHandle {
    fn path(&self) -> &Path {
        &self.path
    }

    fn mode(&self) -> FileMode {
        self.mode
    }

    fn close(&mut self) -> BackendResult<()> {
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn read_metadata(&mut self) -> BackendResult<Metadata> {
        self.ensure_open()?;
        let files = self.files.read();
        let file = files.get(&self.path).ok_or_else(|| self.missing())?;
        Ok(file.metadata.clone())
    }

    fn read_raw(&mut self, names: &[String]) -> BackendResult<Vec<DataContainer>> {
        self.ensure_open()?;
        let files = self.files.read();
        let file = files.get(&self.path).ok_or_else(|| self.missing())?;
        names.iter().map(|name| file.load(name)).collect()
    }

    fn write_metadata(&mut self, metadata: &Metadata) -> BackendResult<()> {
        self.ensure_writable()?;
        let mut files = self.files.write();
        let file = files.get_mut(&self.path).ok_or_else(|| self.missing())?;

        for (name, size) in metadata.dimensions() {
            file.metadata.add_dimension(name, size);
        }
        for variable in metadata.iter_variables() {
            file.metadata.add_variable(variable.clone());
        }
        for attribute in metadata.global_attributes() {
            file.metadata.add_global_attr(attribute.clone());
        }
        Ok(())
    }

    fn write_raw(&mut self, name: &str, values: &TypedBuffer) -> BackendResult<()> {
        self.ensure_writable()?;
        let mut files = self.files.write();
        let file = files.get_mut(&self.path).ok_or_else(|| self.missing())?;
        file.store(name, values)
    }
}
