// src/consts.rs
//! Fixed names used in files and in the default configuration

pub const LFRIC_CONVENTION: &str = "LFRic";
pub const JEDI_CONVENTION: &str = "JEDI";

/// Global attribute recording the naming convention of a file
pub const NAMING_CONVENTION_ATTR: &str = "variable_convention";
pub const PRODUCED_BY_ATTR: &str = "produced_by";
pub const PRODUCED_BY: &str = concat!("fieldio v", env!("CARGO_PKG_VERSION"));

// Time axis
pub const TIME_DIM_NAME: &str = "time_counter";
pub const TIME_VAR_NAME: &str = "time_instant";
pub const TIME_ORIGIN_ATTR: &str = "time_origin";
pub const TIME_ORIGIN_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const TILE_DIM_NAME: &str = "tile";
pub const TILE_VAR_NAME: &str = "tile";

// Mesh
pub const MESH_TERM: &str = "Mesh2d";
pub const LFRIC_LON_VAR: &str = "Mesh2d_face_x";
pub const LFRIC_LAT_VAR: &str = "Mesh2d_face_y";
pub const FULL_LEVELS_VAR: &str = "full_levels";
pub const HALF_LEVELS_VAR: &str = "half_levels";

/// Variables that mesh-convention files legitimately lack
pub const MISSING_VARIABLE_NAMES: [&str; 2] = ["height", "height_levels"];

pub const FULL_LEVELS: usize = 71;
pub const HALF_LEVELS: usize = 70;

// Increment attributes
pub const STANDARD_NAME_ATTR: &str = "standard_name";
pub const LONG_NAME_ATTR: &str = "long_name";
pub const UNITS_ATTR: &str = "units";
pub const MESH_ATTR: &str = "mesh";
pub const LOCATION_ATTR: &str = "location";
pub const COORDINATES_ATTR: &str = "coordinates";
pub const INCREMENT_SUFFIX: &str = "_inc";
pub const MESH_ATTR_VALUE: &str = "Mesh2d";
pub const LOCATION_ATTR_VALUE: &str = "face";
pub const COORDINATES_ATTR_VALUE: &str = "Mesh2d_face_y Mesh2d_face_x";

// Field-set dumps
pub const LONGITUDE: &str = "lon";
pub const LATITUDE: &str = "lat";
pub const DIM_PREFIX: &str = "dim";

// Auxiliary vertical coordinates for JEDI-convention files
pub const JEDI_FULL_LEVELS_NO_SURFACE: &str = "full_levels_no_surface";
pub const JEDI_HALF_LEVELS_WITH_TOP: &str = "half_levels_with_top";
pub const NAME_ATTR: &str = "name";
pub const FULL_LEVELS_START: f64 = 1.0;
pub const HALF_LEVELS_START: f64 = 0.5;
