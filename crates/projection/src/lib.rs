//! Map projections used by NDFD and RTMA grids.
//!
//! Implements the forward and inverse transforms for the GRIB2 grid
//! templates the National Digital Forecast Database publishes on, from
//! scratch without external dependencies.

pub mod lambert;
pub mod mercator;
pub mod polar;

pub use lambert::LambertConformal;
pub use mercator::Mercator;
pub use polar::PolarStereographic;

/// Spherical earth radius used by NCEP grids (meters).
pub const EARTH_RADIUS: f64 = 6371229.0;

/// Inverse transform from grid indices to geographic coordinates.
pub trait GridProjection {
    /// Convert grid indices (i, j) to (lat, lon) in degrees.
    fn grid_to_geo(&self, i: f64, j: f64) -> (f64, f64);

    /// Grid dimensions as (nx, ny).
    fn dimensions(&self) -> (usize, usize);

    /// Latitude and longitude of every grid point, row-major (j outer).
    fn coordinates(&self) -> (Vec<f64>, Vec<f64>) {
        let (nx, ny) = self.dimensions();
        let mut lats = Vec::with_capacity(nx * ny);
        let mut lons = Vec::with_capacity(nx * ny);
        for j in 0..ny {
            for i in 0..nx {
                let (lat, lon) = self.grid_to_geo(i as f64, j as f64);
                lats.push(lat);
                lons.push(lon);
            }
        }
        (lats, lons)
    }
}

/// Wrap an angle in radians onto [-PI, PI].
pub(crate) fn wrap_radians(mut angle: f64) -> f64 {
    use std::f64::consts::PI;
    while angle > PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}
