//! Mercator projection (GRIB2 grid template 3.10).
//!
//! NDFD Hawaii and Puerto Rico grids are published on Mercator planes.

use std::f64::consts::PI;

use crate::{wrap_radians, GridProjection, EARTH_RADIUS};

#[derive(Debug, Clone)]
pub struct Mercator {
    /// Latitude where dx/dy are true, in radians
    pub lad: f64,
    /// Latitude of first grid point in radians
    pub lat1: f64,
    /// Longitude of first grid point in radians
    pub lon1: f64,
    pub dx: f64,
    pub dy: f64,
    pub nx: usize,
    pub ny: usize,
}

impl Mercator {
    #[allow(clippy::too_many_arguments)]
    pub fn from_grib2(
        lat1_deg: f64,
        lon1_deg: f64,
        lad_deg: f64,
        dx: f64,
        dy: f64,
        nx: usize,
        ny: usize,
    ) -> Self {
        Self {
            lad: lad_deg.to_radians(),
            lat1: lat1_deg.to_radians(),
            lon1: lon1_deg.to_radians(),
            dx,
            dy,
            nx,
            ny,
        }
    }

    /// NDFD Hawaii 2.5 km grid (321 x 225).
    pub fn ndfd_hawaii() -> Self {
        Self::from_grib2(18.073, -161.525, 20.0, 2500.0, 2500.0, 321, 225)
    }

    fn radius(&self) -> f64 {
        EARTH_RADIUS * self.lad.cos()
    }

    fn northing(&self, lat: f64) -> f64 {
        self.radius() * (PI / 4.0 + lat / 2.0).tan().ln()
    }

    pub fn geo_to_grid(&self, lat_deg: f64, lon_deg: f64) -> (f64, f64) {
        let x = self.radius() * wrap_radians(lon_deg.to_radians() - self.lon1);
        let y = self.northing(lat_deg.to_radians()) - self.northing(self.lat1);
        (x / self.dx, y / self.dy)
    }
}

impl GridProjection for Mercator {
    fn grid_to_geo(&self, i: f64, j: f64) -> (f64, f64) {
        let x = i * self.dx;
        let y = self.northing(self.lat1) + j * self.dy;

        let lat = 2.0 * (y / self.radius()).exp().atan() - PI / 2.0;
        let lon = wrap_radians(self.lon1 + x / self.radius());

        (lat.to_degrees(), lon.to_degrees())
    }

    fn dimensions(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let proj = Mercator::ndfd_hawaii();
        let (lat, lon) = proj.grid_to_geo(160.0, 112.0);
        let (i, j) = proj.geo_to_grid(lat, lon);
        assert!((i - 160.0).abs() < 1e-6);
        assert!((j - 112.0).abs() < 1e-6);
    }

    #[test]
    fn test_honolulu_inside_grid() {
        let proj = Mercator::ndfd_hawaii();
        let (i, j) = proj.geo_to_grid(21.3, -157.85);
        assert!(i > 0.0 && i < proj.nx as f64, "i = {}", i);
        assert!(j > 0.0 && j < proj.ny as f64, "j = {}", j);
    }
}
