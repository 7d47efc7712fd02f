// src/mesh.rs
//! Coordinate matching between mesh-native and on-disk point order, and the
//! file time axis

use crate::consts;
use crate::data::Data;
use crate::error::{FieldIoError, Result};
use crate::field::Grid;
use crate::types::TypedBuffer;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use std::collections::HashMap;

/// Coordinates are matched to a millionth of a degree
const COORD_SCALE: f64 = 1.0e6;
const FULL_CIRCLE: i64 = 360 * 1_000_000;

fn quantise((lon, lat): (f64, f64)) -> (i64, i64) {
    let lon = (lon.rem_euclid(360.0) * COORD_SCALE).round() as i64;
    let lat = (lat * COORD_SCALE).round() as i64;
    (lon.rem_euclid(FULL_CIRCLE), lat)
}

/// Map each mesh-native point of `grid` to its position in `disk_coords`
///
/// Returns `map` with `map[i]` the on-disk index of grid point `i`. Both sides
/// must hold the same set of points.
pub fn create_index_map(grid: &Grid, disk_coords: &[(f64, f64)]) -> Result<Vec<usize>> {
    if grid.len() != disk_coords.len() {
        return Err(FieldIoError::CoordinateMismatch(format!(
            "grid \"{}\" has {} points, file has {}",
            grid.name(),
            grid.len(),
            disk_coords.len()
        )));
    }

    let lookup: HashMap<(i64, i64), usize> = disk_coords
        .iter()
        .enumerate()
        .map(|(index, coord)| (quantise(*coord), index))
        .collect();

    grid.lonlat()
        .iter()
        .enumerate()
        .map(|(i, coord)| {
            lookup.get(&quantise(*coord)).copied().ok_or_else(|| {
                FieldIoError::CoordinateMismatch(format!(
                    "grid \"{}\" point {} at ({}, {}) not found in file",
                    grid.name(),
                    i,
                    coord.0,
                    coord.1
                ))
            })
        })
        .collect()
}

fn as_f64(buffer: &TypedBuffer) -> Vec<f64> {
    match buffer {
        TypedBuffer::Double(v) => v.clone(),
        TypedBuffer::Float(v) => v.iter().map(|x| f64::from(*x)).collect(),
        TypedBuffer::Int(v) => v.iter().map(|x| f64::from(*x)).collect(),
    }
}

/// Zip the longitude and latitude containers named by `coord_names`
pub fn coords_from_data(data: &Data, coord_names: &[String; 2]) -> Result<Vec<(f64, f64)>> {
    let lons = as_f64(data.container(&coord_names[0])?.buffer());
    let lats = as_f64(data.container(&coord_names[1])?.buffer());
    if lons.len() != lats.len() {
        return Err(FieldIoError::DataShapeMismatch {
            expected: lons.len(),
            found: lats.len(),
        });
    }
    Ok(lons.into_iter().zip(lats).collect())
}

/// Parse a `YYYY-MM-DD hh:mm:ss` time origin as UTC
pub fn parse_time_origin(origin: &str) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(origin.trim(), consts::TIME_ORIGIN_FORMAT)
        .map_err(|e| FieldIoError::InvalidTime(format!("\"{}\": {}", origin, e)))?;
    Ok(Utc.from_utc_datetime(&naive))
}

/// Offset `origin` by each value, taken as a count of seconds and rounded
pub fn create_date_times(origin: DateTime<Utc>, seconds: &[f64]) -> Result<Vec<DateTime<Utc>>> {
    seconds
        .iter()
        .map(|value| {
            let rounded = value.round();
            if !rounded.is_finite() || rounded.abs() > i64::from(i32::MAX) as f64 * 1000.0 {
                return Err(FieldIoError::InvalidTime(format!("{} seconds after {}", value, origin)));
            }
            origin
                .checked_add_signed(chrono::Duration::seconds(rounded as i64))
                .ok_or_else(|| FieldIoError::InvalidTime(format!("{} seconds after {}", value, origin)))
        })
        .collect()
}

/// Position of `date_time` on the time axis
pub fn find_time_step(date_times: &[DateTime<Utc>], date_time: &DateTime<Utc>) -> Result<usize> {
    date_times
        .iter()
        .position(|candidate| candidate == date_time)
        .ok_or_else(|| FieldIoError::TimeNotFound(date_time.to_rfc3339()))
}
