//! Section 3: grid definition templates and per-point coordinates.

use firewx_common::GridCoordinates;
use projection::{GridProjection, LambertConformal, Mercator, PolarStereographic};

use crate::sections::{decode_grib2_signed, find_section};
use crate::Grib2Error;

/// Scanning mode flag bits (code table 3.4)
const SCAN_NEGATIVE_I: u8 = 0x80;
const SCAN_POSITIVE_J: u8 = 0x40;
const SCAN_J_CONSECUTIVE: u8 = 0x20;
const SCAN_BOUSTROPHEDON: u8 = 0x10;

/// Supported grid definition templates.
///
/// Angles are in degrees, projected spacings in meters.
#[derive(Debug, Clone, PartialEq)]
pub enum GridTemplate {
    /// Template 3.0
    LatLon {
        ni: usize,
        nj: usize,
        la1: f64,
        lo1: f64,
        la2: f64,
        lo2: f64,
        di: f64,
        dj: f64,
        scanning_mode: u8,
    },
    /// Template 3.10
    Mercator {
        ni: usize,
        nj: usize,
        la1: f64,
        lo1: f64,
        lad: f64,
        di: f64,
        dj: f64,
        scanning_mode: u8,
    },
    /// Template 3.20
    PolarStereographic {
        nx: usize,
        ny: usize,
        la1: f64,
        lo1: f64,
        lad: f64,
        lov: f64,
        dx: f64,
        dy: f64,
        south_pole: bool,
        scanning_mode: u8,
    },
    /// Template 3.30
    LambertConformal {
        nx: usize,
        ny: usize,
        la1: f64,
        lo1: f64,
        lov: f64,
        latin1: f64,
        latin2: f64,
        dx: f64,
        dy: f64,
        scanning_mode: u8,
    },
}

/// Parse Section 3 (Grid Definition)
pub fn parse_grid_definition(data: &[u8]) -> Result<GridTemplate, Grib2Error> {
    let section = find_section(data, 3)?;

    if section.len() < 14 {
        return Err(Grib2Error::InvalidSection {
            section: 3,
            reason: "Not enough data".to_string(),
        });
    }

    // Octets 13-14: grid definition template number; template data from octet 15
    let template = u16::from_be_bytes([section[12], section[13]]);
    let gd = &section[14..];

    let needed = match template {
        0 | 10 => 58,
        20 => 51,
        30 => 59,
        other => return Err(Grib2Error::UnsupportedGrid(other)),
    };
    if gd.len() < needed {
        return Err(Grib2Error::InvalidSection {
            section: 3,
            reason: format!(
                "Template 3.{} needs at least {} bytes, got {}",
                template,
                needed,
                gd.len()
            ),
        });
    }

    let count = |at: usize| u32::from_be_bytes([gd[at], gd[at + 1], gd[at + 2], gd[at + 3]]) as usize;
    let degrees = |at: usize| decode_grib2_signed(&gd[at..at + 4]) as f64 * 1e-6;
    let meters = |at: usize| count(at) as f64 * 1e-3;

    // Octets 31-46 (Ni/Nx, Nj/Ny, La1, Lo1) are common to all four templates
    let grid = match template {
        0 => GridTemplate::LatLon {
            ni: count(16),
            nj: count(20),
            la1: degrees(32),
            lo1: degrees(36),
            la2: degrees(41),
            lo2: degrees(45),
            di: count(49) as f64 * 1e-6,
            dj: count(53) as f64 * 1e-6,
            scanning_mode: gd[57],
        },
        10 => GridTemplate::Mercator {
            ni: count(16),
            nj: count(20),
            la1: degrees(24),
            lo1: degrees(28),
            lad: degrees(33),
            scanning_mode: gd[45],
            di: meters(50),
            dj: meters(54),
        },
        20 => GridTemplate::PolarStereographic {
            nx: count(16),
            ny: count(20),
            la1: degrees(24),
            lo1: degrees(28),
            lad: degrees(33),
            lov: degrees(37),
            dx: meters(41),
            dy: meters(45),
            south_pole: gd[49] & 0x80 != 0,
            scanning_mode: gd[50],
        },
        _ => GridTemplate::LambertConformal {
            nx: count(16),
            ny: count(20),
            la1: degrees(24),
            lo1: degrees(28),
            lov: degrees(37),
            dx: meters(41),
            dy: meters(45),
            scanning_mode: gd[50],
            latin1: degrees(51),
            latin2: degrees(55),
        },
    };

    Ok(grid)
}

impl GridTemplate {
    pub fn template_number(&self) -> u16 {
        match self {
            GridTemplate::LatLon { .. } => 0,
            GridTemplate::Mercator { .. } => 10,
            GridTemplate::PolarStereographic { .. } => 20,
            GridTemplate::LambertConformal { .. } => 30,
        }
    }

    /// Grid dimensions as (nx, ny).
    pub fn dimensions(&self) -> (usize, usize) {
        match *self {
            GridTemplate::LatLon { ni, nj, .. } | GridTemplate::Mercator { ni, nj, .. } => (ni, nj),
            GridTemplate::PolarStereographic { nx, ny, .. }
            | GridTemplate::LambertConformal { nx, ny, .. } => (nx, ny),
        }
    }

    pub fn num_points(&self) -> usize {
        let (nx, ny) = self.dimensions();
        nx * ny
    }

    pub fn scanning_mode(&self) -> u8 {
        match *self {
            GridTemplate::LatLon { scanning_mode, .. }
            | GridTemplate::Mercator { scanning_mode, .. }
            | GridTemplate::PolarStereographic { scanning_mode, .. }
            | GridTemplate::LambertConformal { scanning_mode, .. } => scanning_mode,
        }
    }

    /// Coordinates of every grid point in scan order (rows of nx points).
    pub fn coordinates(&self) -> GridCoordinates {
        let (nx, ny) = self.dimensions();
        let scan = self.scanning_mode();
        let i_sign = if scan & SCAN_NEGATIVE_I != 0 { -1.0 } else { 1.0 };
        let j_sign = if scan & SCAN_POSITIVE_J != 0 { 1.0 } else { -1.0 };

        match *self {
            GridTemplate::LatLon {
                la1, la2, lo1, di, dj, ..
            } => {
                let dlat = if la2 != la1 { dj.copysign(la2 - la1) } else { dj * j_sign };
                let lats = (0..ny).map(|j| la1 + j as f64 * dlat).collect();
                let lons = (0..nx).map(|i| lo1 + i as f64 * di * i_sign).collect();
                GridCoordinates::Regular { lats, lons }
            }
            GridTemplate::Mercator {
                la1, lo1, lad, di, dj, ..
            } => {
                let proj = Mercator::from_grib2(la1, lo1, lad, di, dj, nx, ny);
                projected(&proj, nx, ny, i_sign, j_sign)
            }
            GridTemplate::PolarStereographic {
                la1,
                lo1,
                lad,
                lov,
                dx,
                dy,
                south_pole,
                ..
            } => {
                let proj = PolarStereographic::from_grib2(la1, lo1, lad, lov, dx, dy, nx, ny, south_pole);
                projected(&proj, nx, ny, i_sign, j_sign)
            }
            GridTemplate::LambertConformal {
                la1,
                lo1,
                lov,
                latin1,
                latin2,
                dx,
                dy,
                ..
            } => {
                let proj = LambertConformal::from_grib2(la1, lo1, lov, latin1, latin2, dx, dy, nx, ny);
                projected(&proj, nx, ny, i_sign, j_sign)
            }
        }
    }

    /// Reorder decoded values into row-major order (rows of nx points).
    pub fn to_row_major(&self, values: Vec<f32>) -> Vec<f32> {
        let (nx, ny) = self.dimensions();
        let scan = self.scanning_mode();
        if values.len() != nx * ny {
            return values;
        }

        let mut values = if scan & SCAN_J_CONSECUTIVE != 0 {
            // Stored as columns of ny points
            let mut transposed = vec![0.0; values.len()];
            for i in 0..nx {
                for j in 0..ny {
                    transposed[j * nx + i] = values[i * ny + j];
                }
            }
            transposed
        } else {
            values
        };

        if scan & SCAN_BOUSTROPHEDON != 0 && scan & SCAN_J_CONSECUTIVE == 0 {
            for row in values.chunks_mut(nx).skip(1).step_by(2) {
                row.reverse();
            }
        }

        values
    }
}

fn projected<P: GridProjection>(
    proj: &P,
    nx: usize,
    ny: usize,
    i_sign: f64,
    j_sign: f64,
) -> GridCoordinates {
    let mut lats = Vec::with_capacity(nx * ny);
    let mut lons = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            let (lat, lon) = proj.grid_to_geo(i as f64 * i_sign, j as f64 * j_sign);
            lats.push(lat);
            lons.push(lon);
        }
    }
    GridCoordinates::Projected { nx, ny, lats, lons }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn latlon(la1: f64, la2: f64, scanning_mode: u8) -> GridTemplate {
        GridTemplate::LatLon {
            ni: 3,
            nj: 3,
            la1,
            lo1: 230.0,
            la2,
            lo2: 232.0,
            di: 1.0,
            dj: 1.0,
            scanning_mode,
        }
    }

    #[test]
    fn test_latlon_north_to_south() {
        match latlon(45.0, 43.0, 0).coordinates() {
            GridCoordinates::Regular { lats, lons } => {
                assert_eq!(lats, vec![45.0, 44.0, 43.0]);
                assert_eq!(lons, vec![230.0, 231.0, 232.0]);
            }
            other => panic!("expected regular grid, got {:?}", other),
        }
    }

    #[test]
    fn test_latlon_south_to_north() {
        match latlon(43.0, 45.0, SCAN_POSITIVE_J).coordinates() {
            GridCoordinates::Regular { lats, .. } => assert_eq!(lats, vec![43.0, 44.0, 45.0]),
            other => panic!("expected regular grid, got {:?}", other),
        }
    }

    #[test]
    fn test_column_major_values_transposed() {
        let grid = GridTemplate::LatLon {
            ni: 2,
            nj: 3,
            la1: 0.0,
            lo1: 0.0,
            la2: 2.0,
            lo2: 1.0,
            di: 1.0,
            dj: 1.0,
            scanning_mode: SCAN_POSITIVE_J | SCAN_J_CONSECUTIVE,
        };
        // columns: [0, 1, 2] then [3, 4, 5]
        let values = grid.to_row_major(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(values, vec![0.0, 3.0, 1.0, 4.0, 2.0, 5.0]);
    }

    #[test]
    fn test_boustrophedon_rows_reversed() {
        let grid = GridTemplate::LatLon {
            ni: 2,
            nj: 2,
            la1: 0.0,
            lo1: 0.0,
            la2: 1.0,
            lo2: 1.0,
            di: 1.0,
            dj: 1.0,
            scanning_mode: SCAN_POSITIVE_J | SCAN_BOUSTROPHEDON,
        };
        assert_eq!(
            grid.to_row_major(vec![1.0, 2.0, 4.0, 3.0]),
            vec![1.0, 2.0, 3.0, 4.0]
        );
    }

    #[test]
    fn test_lambert_first_point_matches_la1_lo1() {
        let grid = GridTemplate::LambertConformal {
            nx: 4,
            ny: 3,
            la1: 20.191999,
            lo1: 238.445999,
            lov: 265.0,
            latin1: 25.0,
            latin2: 25.0,
            dx: 2539.703,
            dy: 2539.703,
            scanning_mode: SCAN_POSITIVE_J,
        };
        let coords = grid.coordinates();
        assert_eq!(coords.shape(), (3, 4));
        let (lat, lon) = coords.point(0, 0).unwrap();
        assert!((lat - 20.191999).abs() < 1e-4);
        assert!((lon + 121.554001).abs() < 1e-4);

        // Rows move north with +j scanning
        let (lat_next_row, _) = coords.point(1, 0).unwrap();
        assert!(lat_next_row > lat);
    }
}
