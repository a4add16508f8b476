//! Bounding box and geographic window types.

use serde::{Deserialize, Serialize};

/// A geographic bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Smallest box enclosing every (lon, lat) pair, or `None` when empty.
    pub fn enclosing(lons: &[f64], lats: &[f64]) -> Option<Self> {
        let mut points = lons
            .iter()
            .zip(lats)
            .filter(|(x, y)| x.is_finite() && y.is_finite());
        let (&x0, &y0) = points.next()?;

        Some(points.fold(
            BoundingBox::new(x0, y0, x0, y0),
            |bbox, (&x, &y)| BoundingBox {
                min_x: bbox.min_x.min(x),
                min_y: bbox.min_y.min(y),
                max_x: bbox.max_x.max(x),
                max_y: bbox.max_y.max(y),
            },
        ))
    }
}

/// A fixed longitude/latitude sub-window used to restrict a grid.
///
/// Longitudes are stored in degrees east in the -180..180 convention.
/// Grid coordinates in the 0..360 convention are normalized before the
/// comparison, so the same window works for both.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoWindow {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

impl GeoWindow {
    /// Alaska sub-window applied to RTMA and NDFD grids.
    pub const ALASKA: GeoWindow = GeoWindow {
        west: -170.0,
        east: -130.0,
        south: 50.0,
        north: 72.0,
    };

    pub const fn new(west: f64, east: f64, south: f64, north: f64) -> Self {
        Self {
            west,
            east,
            south,
            north,
        }
    }

    /// Whether the longitude (either convention) falls inside the window.
    pub fn contains_lon(&self, lon: f64) -> bool {
        let lon = normalize_longitude(lon);
        let west = normalize_longitude(self.west);
        let east = normalize_longitude(self.east);

        if west <= east {
            lon >= west && lon <= east
        } else {
            // Window crosses the antimeridian
            lon >= west || lon <= east
        }
    }

    pub fn contains_lat(&self, lat: f64) -> bool {
        lat >= self.south && lat <= self.north
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.contains_lat(lat) && self.contains_lon(lon)
    }
}

/// Map a longitude in any convention onto -180..180.
pub fn normalize_longitude(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid maps +180 onto -180; keep the eastern edge where it was
    if wrapped == -180.0 && lon > 0.0 {
        180.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_longitude() {
        assert_eq!(normalize_longitude(190.0), -170.0);
        assert_eq!(normalize_longitude(-170.0), -170.0);
        assert_eq!(normalize_longitude(360.0), 0.0);
        assert_eq!(normalize_longitude(180.0), 180.0);
    }

    #[test]
    fn test_alaska_window_accepts_both_conventions() {
        let window = GeoWindow::ALASKA;
        assert!(window.contains(-150.0, 61.2));
        assert!(window.contains(210.0, 61.2));
        assert!(!window.contains(-100.0, 61.2));
        assert!(!window.contains(-150.0, 40.0));
    }

    #[test]
    fn test_antimeridian_window() {
        let window = GeoWindow::new(170.0, -170.0, -10.0, 10.0);
        assert!(window.contains(175.0, 0.0));
        assert!(window.contains(-175.0, 0.0));
        assert!(!window.contains(0.0, 0.0));
    }

    #[test]
    fn test_enclosing_skips_nan() {
        let bbox = BoundingBox::enclosing(&[1.0, f64::NAN, -2.0], &[5.0, 0.0, 7.0]).unwrap();
        assert_eq!(bbox, BoundingBox::new(-2.0, 5.0, 1.0, 7.0));
        assert!(BoundingBox::enclosing(&[], &[]).is_none());
    }
}
