//! Lambert Conformal Conic projection (GRIB2 grid template 3.30).
//!
//! NDFD CONUS grids are published on this projection. The cone is defined by
//! the orientation longitude (LoV) and one or two standard parallels; grid
//! indices are offsets in meters from the first grid point.

use std::f64::consts::PI;

use crate::{wrap_radians, GridProjection, EARTH_RADIUS};

/// Lambert Conformal Conic projection parameters.
#[derive(Debug, Clone)]
pub struct LambertConformal {
    /// Central meridian (LoV) in radians
    pub lon0: f64,
    /// First standard parallel in radians
    pub latin1: f64,
    /// Second standard parallel in radians
    pub latin2: f64,
    /// Latitude of first grid point in radians
    pub lat1: f64,
    /// Longitude of first grid point in radians
    pub lon1: f64,
    /// Grid spacing in X direction (meters)
    pub dx: f64,
    /// Grid spacing in Y direction (meters)
    pub dy: f64,
    /// Number of grid points in X (i) direction
    pub nx: usize,
    /// Number of grid points in Y (j) direction
    pub ny: usize,
    /// Cone constant (n)
    n: f64,
    /// F constant
    f: f64,
    /// Rho at first grid point
    rho0: f64,
    /// Projected (x, y) of the first grid point
    origin: (f64, f64),
}

impl LambertConformal {
    /// Create a new Lambert Conformal projection from GRIB2 parameters (degrees, meters).
    #[allow(clippy::too_many_arguments)]
    pub fn from_grib2(
        lat1_deg: f64,
        lon1_deg: f64,
        lov_deg: f64,
        latin1_deg: f64,
        latin2_deg: f64,
        dx: f64,
        dy: f64,
        nx: usize,
        ny: usize,
    ) -> Self {
        let lat1 = lat1_deg.to_radians();
        let lon1 = lon1_deg.to_radians();
        let lon0 = lov_deg.to_radians();
        let latin1 = latin1_deg.to_radians();
        let latin2 = latin2_deg.to_radians();

        let n = if (latin1 - latin2).abs() < 1e-10 {
            // Tangent cone
            latin1.sin()
        } else {
            let ln_ratio = (latin1.cos() / latin2.cos()).ln();
            let tan_ratio =
                ((PI / 4.0 + latin2 / 2.0).tan() / (PI / 4.0 + latin1 / 2.0).tan()).ln();
            ln_ratio / tan_ratio
        };

        let f = (latin1.cos() * (PI / 4.0 + latin1 / 2.0).tan().powf(n)) / n;
        let rho0 = EARTH_RADIUS * f / (PI / 4.0 + lat1 / 2.0).tan().powf(n);

        let theta0 = n * wrap_radians(lon1 - lon0);
        let origin = (rho0 * theta0.sin(), rho0 - rho0 * theta0.cos());

        Self {
            lon0,
            latin1,
            latin2,
            lat1,
            lon1,
            dx,
            dy,
            nx,
            ny,
            n,
            f,
            rho0,
            origin,
        }
    }

    /// NDFD CONUS 2.5 km grid.
    ///
    /// - First point: 20.191999N, 238.445999E
    /// - LoV: 265E, standard parallel 25N
    /// - Grid: 2145 x 1377, 2539.703 m spacing
    pub fn ndfd_conus() -> Self {
        Self::from_grib2(
            20.191999,
            -121.554001,
            -95.0,
            25.0,
            25.0,
            2539.703,
            2539.703,
            2145,
            1377,
        )
    }

    /// Convert geographic coordinates (degrees) to fractional grid indices (i, j).
    pub fn geo_to_grid(&self, lat_deg: f64, lon_deg: f64) -> (f64, f64) {
        let lat = lat_deg.to_radians();
        let dlon = wrap_radians(lon_deg.to_radians() - self.lon0);

        let rho = EARTH_RADIUS * self.f / (PI / 4.0 + lat / 2.0).tan().powf(self.n);
        let theta = self.n * dlon;

        let x = rho * theta.sin();
        let y = self.rho0 - rho * theta.cos();

        ((x - self.origin.0) / self.dx, (y - self.origin.1) / self.dy)
    }

    /// Check if a geographic point is within the grid.
    pub fn contains(&self, lat_deg: f64, lon_deg: f64) -> bool {
        let (i, j) = self.geo_to_grid(lat_deg, lon_deg);
        i >= 0.0 && i < self.nx as f64 && j >= 0.0 && j < self.ny as f64
    }
}

impl GridProjection for LambertConformal {
    fn grid_to_geo(&self, i: f64, j: f64) -> (f64, f64) {
        let x = self.origin.0 + i * self.dx;
        let y = self.origin.1 + j * self.dy;

        let rho = (x * x + (self.rho0 - y) * (self.rho0 - y)).sqrt();
        let rho = if self.n < 0.0 { -rho } else { rho };
        let theta = (x / (self.rho0 - y)).atan();

        let lat = 2.0 * ((EARTH_RADIUS * self.f / rho).powf(1.0 / self.n)).atan() - PI / 2.0;
        let lon = wrap_radians(self.lon0 + theta / self.n);

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
    fn test_ndfd_first_grid_point() {
        let proj = LambertConformal::ndfd_conus();

        let (i, j) = proj.geo_to_grid(20.191999, -121.554001);
        assert!(i.abs() < 0.1, "i should be ~0, got {}", i);
        assert!(j.abs() < 0.1, "j should be ~0, got {}", j);

        let (lat, lon) = proj.grid_to_geo(0.0, 0.0);
        assert!((lat - 20.191999).abs() < 1e-3);
        assert!((lon + 121.554001).abs() < 1e-3);
    }

    #[test]
    fn test_ndfd_roundtrip() {
        let proj = LambertConformal::ndfd_conus();

        let (lat, lon) = proj.grid_to_geo(1100.0, 700.0);
        let (i, j) = proj.geo_to_grid(lat, lon);

        assert!((i - 1100.0).abs() < 0.01, "i roundtrip failed: {}", i);
        assert!((j - 700.0).abs() < 0.01, "j roundtrip failed: {}", j);
    }

    #[test]
    fn test_ndfd_covers_boise() {
        let proj = LambertConformal::ndfd_conus();
        assert!(proj.contains(43.6, -116.2));
        assert!(!proj.contains(61.2, -149.9));
    }
}
