// src/file_data.rs
use crate::data::Data;
use crate::metadata::Metadata;
use chrono::{DateTime, Utc};

/// Everything held in memory for one file on one grid
///
/// `index_map[i]` is the on-disk horizontal position of mesh-native point
/// `i`. Cloning copies every part; the copy shares nothing with the original.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileData {
    metadata: Metadata,
    data: Data,
    index_map: Vec<usize>,
    date_times: Vec<DateTime<Utc>>,
    grid_name: String,
}

impl FileData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_grid(grid_name: impl Into<String>) -> Self {
        FileData {
            grid_name: grid_name.into(),
            ..Self::default()
        }
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Data {
        &mut self.data
    }

    /// Mutable access to metadata and data at once
    pub fn parts_mut(&mut self) -> (&mut Metadata, &mut Data) {
        (&mut self.metadata, &mut self.data)
    }

    pub fn index_map(&self) -> &[usize] {
        &self.index_map
    }

    pub fn set_index_map(&mut self, index_map: Vec<usize>) {
        self.index_map = index_map;
    }

    pub fn date_times(&self) -> &[DateTime<Utc>] {
        &self.date_times
    }

    pub fn set_date_times(&mut self, date_times: Vec<DateTime<Utc>>) {
        self.date_times = date_times;
    }

    pub fn grid_name(&self) -> &str {
        &self.grid_name
    }

    /// Drop data containers once they have been written
    pub fn clear_data(&mut self) {
        self.data.clear();
    }

    pub fn clear_metadata(&mut self) {
        self.metadata.clear();
    }
}
