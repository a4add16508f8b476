//! Reading gridded analyses (e.g. RTMA served by GrADS-DODS) as 2-D fields.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use firewx_common::{decode_cf_time, GeoWindow, GridCoordinates, IndexWindow};
use tracing::{debug, info};

use crate::error::{NetCdfError, NetCdfResult};
use crate::silence_hdf5_errors;

const LAT_NAMES: [&str; 2] = ["lat", "latitude"];
const LON_NAMES: [&str; 2] = ["lon", "longitude"];

/// One opened analysis: coordinates plus the requested variables.
#[derive(Debug, Clone)]
pub struct AnalysisDataset {
    /// Path or URL the dataset was read from
    pub source: String,
    /// First value of the `time` axis, when present and decodable
    pub valid_time: Option<DateTime<Utc>>,
    /// Regular lat/lon axes of the (possibly windowed) grid
    pub coordinates: GridCoordinates,
    /// Row-major values per variable, missing points as NaN
    pub variables: BTreeMap<String, Vec<f32>>,
}

impl AnalysisDataset {
    /// Grid shape as (ny, nx).
    pub fn shape(&self) -> (usize, usize) {
        self.coordinates.shape()
    }

    pub fn variable(&self, name: &str) -> Option<&[f32]> {
        self.variables.get(name).map(Vec::as_slice)
    }
}

/// Open `location` and read `variables`, restricted to `window` if given.
///
/// Variables absent from the dataset are skipped; a dataset carrying none of
/// them is an error.
pub fn open_analysis(
    location: &str,
    variables: &[String],
    window: Option<&GeoWindow>,
) -> NetCdfResult<AnalysisDataset> {
    silence_hdf5_errors();

    let file = netcdf::open(location).map_err(|e| NetCdfError::Open {
        location: location.to_string(),
        reason: e.to_string(),
    })?;

    let lats = read_axis(&file, &LAT_NAMES)?;
    let lons = read_axis(&file, &LON_NAMES)?;
    let full = GridCoordinates::Regular { lats, lons };
    let (ny, nx) = full.shape();

    let slab = match window {
        Some(window) => full.window_indices(window).ok_or(NetCdfError::EmptyWindow)?,
        None => IndexWindow {
            row_start: 0,
            row_end: ny,
            col_start: 0,
            col_end: nx,
        },
    };
    let coordinates = full.crop(&slab);

    let valid_time = read_time(&file);

    let mut values = BTreeMap::new();
    for name in variables {
        let Some(var) = file.variable(name) else {
            debug!(source = %location, variable = %name, "Variable not in dataset, skipping");
            continue;
        };
        values.insert(name.clone(), read_slab(&var, &slab)?);
    }

    if values.is_empty() {
        return Err(NetCdfError::MissingData(format!(
            "none of the variables {:?} in {}",
            variables, location
        )));
    }

    info!(
        source = %location,
        variables = values.len(),
        rows = slab.rows(),
        cols = slab.cols(),
        "Opened analysis dataset"
    );

    Ok(AnalysisDataset {
        source: location.to_string(),
        valid_time,
        coordinates,
        variables: values,
    })
}

fn read_axis(file: &netcdf::File, names: &[&str]) -> NetCdfResult<Vec<f64>> {
    let var = names
        .iter()
        .find_map(|name| file.variable(name))
        .ok_or_else(|| NetCdfError::MissingData(format!("{} coordinate", names[0])))?;

    if var.dimensions().len() != 1 {
        return Err(NetCdfError::InvalidFormat(format!(
            "{} coordinate is not 1-D",
            var.name()
        )));
    }

    var.get_values::<f64, _>(..)
        .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to read {}: {}", var.name(), e)))
}

/// First time value, decoded from CF units. `None` when absent or undecodable.
fn read_time(file: &netcdf::File) -> Option<DateTime<Utc>> {
    let var = file.variable("time")?;
    let units = string_attr(&var, "units")?;
    let first = var.get_values::<f64, _>(..).ok()?.into_iter().next()?;

    match decode_cf_time(first, &units) {
        Ok(t) => Some(t),
        Err(e) => {
            debug!(units = %units, error = %e, "Undecodable time axis");
            None
        }
    }
}

/// Read the `slab` of a (…, lat, lon) variable at index 0 of any leading axes.
fn read_slab(var: &netcdf::Variable, slab: &IndexWindow) -> NetCdfResult<Vec<f32>> {
    let rows = slab.row_start..slab.row_end;
    let cols = slab.col_start..slab.col_end;

    let raw = match var.dimensions().len() {
        2 => var.get_values::<f32, _>((rows, cols)),
        3 => var.get_values::<f32, _>((0, rows, cols)),
        4 => var.get_values::<f32, _>((0, 0, rows, cols)),
        n => {
            return Err(NetCdfError::InvalidFormat(format!(
                "{} has {} dimensions, expected 2 to 4",
                var.name(),
                n
            )))
        }
    }
    .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to read {}: {}", var.name(), e)))?;

    let scale = f64_attr(var, "scale_factor").unwrap_or(1.0);
    let offset = f64_attr(var, "add_offset").unwrap_or(0.0);
    let fills: Vec<f64> = ["_FillValue", "missing_value"]
        .iter()
        .filter_map(|name| f64_attr(var, name))
        .collect();

    Ok(raw
        .into_iter()
        .map(|v| {
            let v = v as f64;
            if v.is_nan() || fills.iter().any(|fill| is_fill(v, *fill)) {
                f32::NAN
            } else {
                (v * scale + offset) as f32
            }
        })
        .collect())
}

/// Fill values such as GrADS' 9.999e20 survive an f32 round trip only approximately.
fn is_fill(value: f64, fill: f64) -> bool {
    (value - fill).abs() <= fill.abs() * 1e-6
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}

fn string_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_fill_tolerates_f32_rounding() {
        let grads_missing = 9.999e20_f64;
        let through_f32 = 9.999e20_f32 as f64;
        assert!(is_fill(through_f32, grads_missing));
        assert!(!is_fill(273.15, grads_missing));
        assert!(is_fill(-9999.0, -9999.0));
    }
}
