//! Reduce a decoded GRIB2 file to one issuance on an optional sub-window.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use firewx_common::{GeoWindow, GridCoordinates, IndexWindow, Region};
use grib2_parser::{GribDataset, GribField};

use crate::error::{FetchError, FetchResult};

/// Which slice of the file's time dimension a grid holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSelection {
    /// Fields of one reference time, `index` into the file's sorted reference times
    Index {
        index: usize,
        reference_time: DateTime<Utc>,
    },
    /// No decodable reference time; every field kept in file order
    PassThrough,
}

/// Pick the time index to keep from a file's sorted, distinct reference times.
///
/// The second time wins when it is later than the first, otherwise the
/// first is used. `None` when there is nothing to choose from.
pub fn select_time_index(reference_times: &[DateTime<Utc>]) -> Option<usize> {
    match reference_times {
        [] => None,
        [first, second, ..] if second > first => Some(1),
        _ => Some(0),
    }
}

/// One forecast step of a normalized grid.
#[derive(Debug, Clone)]
pub struct GridStep {
    pub name: String,
    pub level: String,
    pub reference_time: Option<DateTime<Utc>>,
    pub valid_time: Option<DateTime<Utc>>,
    /// Row-major values on [`NormalizedGrid::coordinates`], missing as NaN
    pub values: Vec<f32>,
}

/// A decoded NDFD file restricted to one time selection and, for Alaska,
/// to the fixed Alaska sub-window.
#[derive(Debug, Clone)]
pub struct NormalizedGrid {
    pub source: Option<PathBuf>,
    pub selection: TimeSelection,
    pub coordinates: GridCoordinates,
    /// Index window applied to the file's grid, if any
    pub window: Option<IndexWindow>,
    pub steps: Vec<GridStep>,
}

impl NormalizedGrid {
    pub fn from_dataset(dataset: GribDataset, region: Region) -> FetchResult<Self> {
        let location = dataset
            .source
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "GRIB2 payload".to_string());

        let full = dataset
            .coordinates()
            .ok_or_else(|| FetchError::parse(&location, "file holds no fields"))?;
        let (ny, nx) = full.shape();

        let window = if region.is_alaska() {
            let window = full.window_indices(&GeoWindow::ALASKA).ok_or_else(|| {
                FetchError::parse(&location, "no grid points inside the Alaska window")
            })?;
            Some(window)
        } else {
            None
        };
        let coordinates = match &window {
            Some(w) => full.crop(w),
            None => full,
        };

        let reference_times = dataset.reference_times();
        let selection = match select_time_index(&reference_times) {
            Some(index) => TimeSelection::Index {
                index,
                reference_time: reference_times[index],
            },
            None => TimeSelection::PassThrough,
        };

        let fields: Vec<GribField> = match selection {
            TimeSelection::Index { reference_time, .. } => {
                let mut kept: Vec<GribField> = dataset
                    .fields
                    .into_iter()
                    .filter(|f| f.reference_time == Some(reference_time))
                    .collect();
                kept.sort_by_key(|f| f.valid_time);
                kept
            }
            TimeSelection::PassThrough => dataset.fields,
        };

        let steps = fields
            .into_iter()
            .map(|field| {
                if field.grid.dimensions() != (nx, ny) || field.values.len() != nx * ny {
                    return Err(FetchError::parse(
                        &location,
                        format!("{} is not on the file's {}x{} grid", field.name, nx, ny),
                    ));
                }
                let values = match &window {
                    Some(w) => w.crop_values(&field.values, nx),
                    None => field.values,
                };
                Ok(GridStep {
                    name: field.name,
                    level: field.level,
                    reference_time: field.reference_time,
                    valid_time: field.valid_time,
                    values,
                })
            })
            .collect::<FetchResult<Vec<_>>>()?;

        Ok(Self {
            source: dataset.source,
            selection,
            coordinates,
            window,
            steps,
        })
    }

    /// Grid shape as (ny, nx).
    pub fn shape(&self) -> (usize, usize) {
        self.coordinates.shape()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn valid_times(&self) -> Vec<DateTime<Utc>> {
        self.steps.iter().filter_map(|s| s.valid_time).collect()
    }

    /// Minimum and maximum over every step, ignoring missing points.
    pub fn value_range(&self) -> Option<(f32, f32)> {
        self.steps
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}
