// src/config.rs
//! Runtime configuration and per-field descriptors

use crate::consts;
use crate::error::{FieldIoError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings shared by every read and write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    /// Rank that performs all file access
    pub owner_rank: usize,

    /// Vertical extent of full-level fields
    pub full_levels: usize,

    /// Vertical extent of half-level fields; always `full_levels - 1`
    pub half_levels: usize,

    /// Variables skipped when absent from mesh-convention files
    pub missing_variable_names: Vec<String>,

    pub time_dim_name: String,
    pub time_var_name: String,
    pub time_origin_name: String,
    pub tile_dim_name: String,
    pub tile_var_name: String,

    /// Substring shared by the names of all mesh variables
    pub mesh_term: String,

    /// Longitude then latitude variable of the mesh face centres
    pub lfric_coord_var_names: [String; 2],
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            owner_rank: 0,
            full_levels: consts::FULL_LEVELS,
            half_levels: consts::HALF_LEVELS,
            missing_variable_names: consts::MISSING_VARIABLE_NAMES
                .iter()
                .map(|name| name.to_string())
                .collect(),
            time_dim_name: consts::TIME_DIM_NAME.to_string(),
            time_var_name: consts::TIME_VAR_NAME.to_string(),
            time_origin_name: consts::TIME_ORIGIN_ATTR.to_string(),
            tile_dim_name: consts::TILE_DIM_NAME.to_string(),
            tile_var_name: consts::TILE_VAR_NAME.to_string(),
            mesh_term: consts::MESH_TERM.to_string(),
            lfric_coord_var_names: [
                consts::LFRIC_LON_VAR.to_string(),
                consts::LFRIC_LAT_VAR.to_string(),
            ],
        }
    }
}

impl IoConfig {
    /// Defaults overridden by `FIELDIO_OWNER_RANK`, `FIELDIO_FULL_LEVELS`
    /// and `FIELDIO_HALF_LEVELS`; unparsable values are ignored
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("FIELDIO_OWNER_RANK") {
            if let Ok(rank) = val.parse() {
                config.owner_rank = rank;
            }
        }

        if let Ok(val) = std::env::var("FIELDIO_FULL_LEVELS") {
            if let Ok(levels) = val.parse() {
                config.full_levels = levels;
            }
        }

        if let Ok(val) = std::env::var("FIELDIO_HALF_LEVELS") {
            if let Ok(levels) = val.parse() {
                config.half_levels = levels;
            }
        }

        config
    }

    /// Parse and validate a JSON document; missing keys take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: IoConfig =
            serde_json::from_str(json).map_err(|e| FieldIoError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| FieldIoError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.half_levels + 1 != self.full_levels {
            return Err(FieldIoError::Config(format!(
                "half_levels ({}) must be one less than full_levels ({})",
                self.half_levels, self.full_levels
            )));
        }

        let names = [
            ("time_dim_name", &self.time_dim_name),
            ("time_var_name", &self.time_var_name),
            ("time_origin_name", &self.time_origin_name),
            ("tile_dim_name", &self.tile_dim_name),
            ("tile_var_name", &self.tile_var_name),
            ("mesh_term", &self.mesh_term),
            ("lfric_coord_var_names[0]", &self.lfric_coord_var_names[0]),
            ("lfric_coord_var_names[1]", &self.lfric_coord_var_names[1]),
        ];
        for (key, value) in names {
            if value.is_empty() {
                return Err(FieldIoError::Config(format!("{} must not be empty", key)));
            }
        }

        Ok(())
    }

    pub fn is_missing_variable(&self, name: &str) -> bool {
        self.missing_variable_names.iter().any(|missing| missing == name)
    }
}

/// How one internal field maps onto file variables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMetadata {
    /// Internal name, also the variable name in JEDI-convention files
    pub jedi_name: String,
    pub lfric_read_name: String,
    pub lfric_write_name: String,
    #[serde(default)]
    pub units: String,
    /// Field holds half levels that sit in a full-level file slot
    #[serde(default)]
    pub no_first_level: bool,
    #[serde(default)]
    pub lfric_vert_config: String,
    #[serde(default)]
    pub jedi_vert_config: String,
}

impl FieldMetadata {
    pub fn new(
        jedi_name: impl Into<String>,
        lfric_read_name: impl Into<String>,
        lfric_write_name: impl Into<String>,
    ) -> Self {
        FieldMetadata {
            jedi_name: jedi_name.into(),
            lfric_read_name: lfric_read_name.into(),
            lfric_write_name: lfric_write_name.into(),
            units: String::new(),
            no_first_level: false,
            lfric_vert_config: String::new(),
            jedi_vert_config: String::new(),
        }
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    pub fn with_no_first_level(mut self, no_first_level: bool) -> Self {
        self.no_first_level = no_first_level;
        self
    }

    pub fn with_vert_config(mut self, lfric: impl Into<String>, jedi: impl Into<String>) -> Self {
        self.lfric_vert_config = lfric.into();
        self.jedi_vert_config = jedi.into();
        self
    }

    /// Load a JSON array of descriptors
    pub fn list_from_json(json: &str) -> Result<Vec<FieldMetadata>> {
        serde_json::from_str(json).map_err(|e| FieldIoError::Config(e.to_string()))
    }
}
