// src/lib.rs
//! # fieldio
//!
//! Marshal two-dimensional gridded fields between mesh-native in-memory
//! partitions and self-describing NetCDF-style files.
//!
//! ## Features
//!
//! - **Two file conventions**: LFRic files (mesh point order, 71 full / 70
//!   half levels) and JEDI files (internal names, auxiliary vertical axes)
//! - **Index remapping**: mesh-native points are matched to on-disk points by
//!   coordinates and moved through `index_map[i] + level * H`
//! - **Level adaptation**: half-level fields flagged `no_first_level` gain or
//!   lose the duplicated surface level on their way to and from LFRic files
//! - **Owner-rank gating**: every participant makes the same calls, only one
//!   touches files
//! - **Pluggable storage**: file access goes through the [`backend::FileBackend`]
//!   trait; [`backend::MemoryBackend`] ships with the crate
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fieldio::prelude::*;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! fn main() -> Result<()> {
//!     let backend = MemoryBackend::new();
//!     let mut io = FieldIo::new(backend, SerialDistributor::new(), IoConfig::default())?;
//!
//!     let grid = Arc::new(Grid::new("C12", vec![(0.0, 0.0), (90.0, 0.0)]));
//!     let mut fields = FieldSet::new();
//!     fields.add(Field::new("air_potential_temperature", DataType::Double, 2, 71, grid)?);
//!
//!     let field_metadata = vec![
//!         FieldMetadata::new("air_potential_temperature", "theta", "theta_inc")
//!             .with_vert_config("full_levels", "full_levels"),
//!     ];
//!
//!     io.read_increments(&mut fields, &field_metadata, Path::new("increments.nc"))?;
//!     io.write_increments(&fields, &field_metadata, Path::new("out.nc"), true)?;
//!     Ok(())
//! }
//! ```

// Modules
pub mod backend;
pub mod config;
pub mod consts;
pub mod data;
pub mod error;
pub mod field;
pub mod file_data;
pub mod io;
pub mod mapping;
pub mod mesh;
pub mod metadata;
pub mod reader;
pub mod types;
pub mod writer;

pub use error::{BackendError, FieldIoError, Result};

pub use types::{Attribute, AttributeValue, DataType, Element, TypedBuffer};

pub use data::{Data, DataContainer};

pub use metadata::{Convention, Metadata, Variable};

pub use config::{FieldMetadata, IoConfig};

pub use field::{Distributor, Field, FieldSet, Grid, SerialDistributor};

pub use file_data::FileData;

pub use backend::{FileBackend, FileHandle, FileMode, MemoryBackend};

pub use mapping::{FieldReader, FieldWriter};

pub use reader::Reader;
pub use writer::Writer;

pub use io::FieldIo;

pub mod prelude {
    //! Convenient imports for common use cases.
    //!
    //! ```rust
    //! use fieldio::prelude::*;
    //! ```

    pub use crate::backend::MemoryBackend;
    pub use crate::config::{FieldMetadata, IoConfig};
    pub use crate::error::{FieldIoError, Result};
    pub use crate::field::{Field, FieldSet, Grid, SerialDistributor};
    pub use crate::io::FieldIo;
    pub use crate::types::DataType;
}

/// The library version
pub const LIBRARY_VERSION: &str = env!("CARGO_PKG_VERSION");
