//! Polar stereographic projection (GRIB2 grid template 3.20).
//!
//! NDFD Alaska grids use a north-polar stereographic plane true at 60N.

use std::f64::consts::PI;

use crate::{wrap_radians, GridProjection, EARTH_RADIUS};

#[derive(Debug, Clone)]
pub struct PolarStereographic {
    /// Orientation longitude (LoV) in radians
    pub lov: f64,
    /// Latitude where dx/dy are true, in radians
    pub lad: f64,
    pub dx: f64,
    pub dy: f64,
    pub nx: usize,
    pub ny: usize,
    /// True for the south-pole plane
    pub south_pole: bool,
    origin: (f64, f64),
}

impl PolarStereographic {
    #[allow(clippy::too_many_arguments)]
    pub fn from_grib2(
        lat1_deg: f64,
        lon1_deg: f64,
        lad_deg: f64,
        lov_deg: f64,
        dx: f64,
        dy: f64,
        nx: usize,
        ny: usize,
        south_pole: bool,
    ) -> Self {
        let mut proj = Self {
            lov: lov_deg.to_radians(),
            lad: lad_deg.to_radians(),
            dx,
            dy,
            nx,
            ny,
            south_pole,
            origin: (0.0, 0.0),
        };
        proj.origin = proj.project(lat1_deg, lon1_deg);
        proj
    }

    /// NDFD Alaska 3 km grid (1649 x 1105).
    pub fn ndfd_alaska() -> Self {
        Self::from_grib2(
            40.530101,
            -178.571,
            60.0,
            -150.0,
            2976.563,
            2976.563,
            1649,
            1105,
            false,
        )
    }

    fn hemisphere(&self) -> f64 {
        if self.south_pole {
            -1.0
        } else {
            1.0
        }
    }

    fn scale(&self) -> f64 {
        EARTH_RADIUS * (1.0 + (self.hemisphere() * self.lad).sin())
    }

    /// Plane coordinates (meters) of a geographic point.
    fn project(&self, lat_deg: f64, lon_deg: f64) -> (f64, f64) {
        let h = self.hemisphere();
        let lat = h * lat_deg.to_radians();
        let dlon = wrap_radians(lon_deg.to_radians() - self.lov);
        let rho = self.scale() * (PI / 4.0 - lat / 2.0).tan();
        (rho * dlon.sin(), -h * rho * dlon.cos())
    }

    /// Convert geographic coordinates (degrees) to fractional grid indices (i, j).
    pub fn geo_to_grid(&self, lat_deg: f64, lon_deg: f64) -> (f64, f64) {
        let (x, y) = self.project(lat_deg, lon_deg);
        ((x - self.origin.0) / self.dx, (y - self.origin.1) / self.dy)
    }
}

impl GridProjection for PolarStereographic {
    fn grid_to_geo(&self, i: f64, j: f64) -> (f64, f64) {
        let h = self.hemisphere();
        let x = self.origin.0 + i * self.dx;
        let y = self.origin.1 + j * self.dy;

        let rho = x.hypot(y);
        let lat = h * (PI / 2.0 - 2.0 * (rho / self.scale()).atan());
        let lon = wrap_radians(self.lov + x.atan2(-h * y));

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
    fn test_first_point_is_origin() {
        let proj = PolarStereographic::ndfd_alaska();
        let (lat, lon) = proj.grid_to_geo(0.0, 0.0);
        assert!((lat - 40.530101).abs() < 1e-6, "lat {}", lat);
        assert!((lon + 178.571).abs() < 1e-3, "lon {}", lon);
    }

    #[test]
    fn test_roundtrip() {
        let proj = PolarStereographic::ndfd_alaska();
        let (lat, lon) = proj.grid_to_geo(800.0, 600.0);
        let (i, j) = proj.geo_to_grid(lat, lon);
        assert!((i - 800.0).abs() < 1e-6);
        assert!((j - 600.0).abs() < 1e-6);
    }

    #[test]
    fn test_anchorage_inside_grid() {
        let proj = PolarStereographic::ndfd_alaska();
        let (i, j) = proj.geo_to_grid(61.2, -149.9);
        assert!(i > 0.0 && i < proj.nx as f64, "i = {}", i);
        assert!(j > 0.0 && j < proj.ny as f64, "j = {}", j);
    }
}
