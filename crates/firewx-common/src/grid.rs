//! Grid coordinate representations and index-window cropping.

use crate::{BoundingBox, GeoWindow};

/// Geographic coordinates attached to a 2-D grid.
///
/// Values stored alongside these coordinates are row-major: row `j`
/// (latitude / y direction) outer, column `i` (longitude / x) inner.
#[derive(Debug, Clone, PartialEq)]
pub enum GridCoordinates {
    /// Regular lat/lon grid with 1-D axes.
    Regular { lats: Vec<f64>, lons: Vec<f64> },
    /// Projected grid with a latitude and longitude per point (ny * nx).
    Projected {
        nx: usize,
        ny: usize,
        lats: Vec<f64>,
        lons: Vec<f64>,
    },
}

impl GridCoordinates {
    /// Grid shape as (ny, nx).
    pub fn shape(&self) -> (usize, usize) {
        match self {
            GridCoordinates::Regular { lats, lons } => (lats.len(), lons.len()),
            GridCoordinates::Projected { nx, ny, .. } => (*ny, *nx),
        }
    }

    pub fn len(&self) -> usize {
        let (ny, nx) = self.shape();
        ny * nx
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Latitude and longitude of the point at (row, col).
    pub fn point(&self, row: usize, col: usize) -> Option<(f64, f64)> {
        match self {
            GridCoordinates::Regular { lats, lons } => Some((*lats.get(row)?, *lons.get(col)?)),
            GridCoordinates::Projected { nx, ny, lats, lons } => {
                if row >= *ny || col >= *nx {
                    return None;
                }
                let idx = row * nx + col;
                Some((lats[idx], lons[idx]))
            }
        }
    }

    /// Geographic extent of every grid point.
    pub fn extent(&self) -> Option<BoundingBox> {
        match self {
            GridCoordinates::Regular { lats, lons } => {
                let (min_lon, max_lon) = min_max(lons)?;
                let (min_lat, max_lat) = min_max(lats)?;
                Some(BoundingBox::new(min_lon, min_lat, max_lon, max_lat))
            }
            GridCoordinates::Projected { lats, lons, .. } => BoundingBox::enclosing(lons, lats),
        }
    }

    /// Smallest index rectangle containing every point inside `window`.
    ///
    /// Returns `None` when no grid point falls inside the window.
    pub fn window_indices(&self, window: &GeoWindow) -> Option<IndexWindow> {
        match self {
            GridCoordinates::Regular { lats, lons } => {
                let (row_start, row_end) = matching_span(lats, |lat| window.contains_lat(lat))?;
                let (col_start, col_end) = matching_span(lons, |lon| window.contains_lon(lon))?;
                Some(IndexWindow {
                    row_start,
                    row_end,
                    col_start,
                    col_end,
                })
            }
            GridCoordinates::Projected { nx, lats, lons, .. } => {
                let mut found: Option<IndexWindow> = None;
                for (idx, (&lat, &lon)) in lats.iter().zip(lons).enumerate() {
                    if !window.contains(lon, lat) {
                        continue;
                    }
                    let (row, col) = (idx / nx, idx % nx);
                    found = Some(match found {
                        None => IndexWindow {
                            row_start: row,
                            row_end: row + 1,
                            col_start: col,
                            col_end: col + 1,
                        },
                        Some(w) => IndexWindow {
                            row_start: w.row_start.min(row),
                            row_end: w.row_end.max(row + 1),
                            col_start: w.col_start.min(col),
                            col_end: w.col_end.max(col + 1),
                        },
                    });
                }
                found
            }
        }
    }

    /// Coordinates restricted to an index window.
    pub fn crop(&self, window: &IndexWindow) -> GridCoordinates {
        match self {
            GridCoordinates::Regular { lats, lons } => GridCoordinates::Regular {
                lats: lats[window.row_start..window.row_end].to_vec(),
                lons: lons[window.col_start..window.col_end].to_vec(),
            },
            GridCoordinates::Projected { nx, lats, lons, .. } => GridCoordinates::Projected {
                nx: window.cols(),
                ny: window.rows(),
                lats: window.crop_values(lats, *nx),
                lons: window.crop_values(lons, *nx),
            },
        }
    }
}

/// Half-open row/column index ranges into a row-major grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexWindow {
    pub row_start: usize,
    pub row_end: usize,
    pub col_start: usize,
    pub col_end: usize,
}

impl IndexWindow {
    pub fn rows(&self) -> usize {
        self.row_end - self.row_start
    }

    pub fn cols(&self) -> usize {
        self.col_end - self.col_start
    }

    /// Copy the window out of a row-major buffer `nx` values wide.
    pub fn crop_values<T: Copy>(&self, values: &[T], nx: usize) -> Vec<T> {
        let mut out = Vec::with_capacity(self.rows() * self.cols());
        for row in self.row_start..self.row_end {
            let start = row * nx + self.col_start;
            out.extend_from_slice(&values[start..start + self.cols()]);
        }
        out
    }
}

fn matching_span(axis: &[f64], keep: impl Fn(f64) -> bool) -> Option<(usize, usize)> {
    let first = axis.iter().position(|&v| keep(v))?;
    let last = axis.iter().rposition(|&v| keep(v))?;
    Some((first, last + 1))
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
