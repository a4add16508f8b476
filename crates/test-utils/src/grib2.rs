//! Synthetic GRIB2 message builder.
//!
//! Produces structurally valid single-field GRIB2 messages (sections 0-8)
//! with simple packing, on either a regular lat/lon grid (template 3.0) or
//! the NDFD Lambert conformal grid (template 3.30).

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};

/// Grid carried by a synthetic message.
#[derive(Debug, Clone)]
pub enum BuilderGrid {
    /// Regular lat/lon grid; angles in degrees
    LatLon {
        ni: u32,
        nj: u32,
        la1: f64,
        lo1: f64,
        step: f64,
    },
    /// Lambert conformal grid; spacing in meters
    Lambert {
        nx: u32,
        ny: u32,
        la1: f64,
        lo1: f64,
        lov: f64,
        latin: f64,
        spacing: f64,
    },
}

impl BuilderGrid {
    fn dimensions(&self) -> (u32, u32) {
        match *self {
            BuilderGrid::LatLon { ni, nj, .. } => (ni, nj),
            BuilderGrid::Lambert { nx, ny, .. } => (nx, ny),
        }
    }
}

/// Build a minimal GRIB2 message with the specified parameters
#[derive(Debug, Clone)]
pub struct Grib2Builder {
    discipline: u8,
    center: u16,
    reference_time: DateTime<Utc>,
    grid: BuilderGrid,
    // Product definition
    param_category: u8,
    param_number: u8,
    level_type: u8,
    level_value: u32,
    forecast_hour: u32,
    /// (interval length in hours, statistical process) for template 4.8
    interval: Option<(u32, u8)>,
    // Data
    data_values: Vec<f32>,
}

impl Grib2Builder {
    /// 10x10 one-degree lat/lon grid from 45N 230E scanning south, 2 m temperature.
    pub fn new_latlon() -> Self {
        let grid = BuilderGrid::LatLon {
            ni: 10,
            nj: 10,
            la1: 45.0,
            lo1: 230.0,
            step: 1.0,
        };
        Self::with_base_grid(grid)
    }

    /// Small corner of the NDFD CONUS Lambert grid (2.54 km spacing).
    pub fn new_lambert(nx: u32, ny: u32) -> Self {
        let grid = BuilderGrid::Lambert {
            nx,
            ny,
            la1: 20.191999,
            lo1: 238.445999,
            lov: 265.0,
            latin: 25.0,
            spacing: 2539.703,
        };
        Self::with_base_grid(grid)
    }

    fn with_base_grid(grid: BuilderGrid) -> Self {
        let (nx, ny) = grid.dimensions();
        Self {
            discipline: 0,
            center: 8, // NWS Telecommunications Gateway
            reference_time: Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(),
            grid,
            param_category: 0,
            param_number: 0, // TMP
            level_type: 103,
            level_value: 2,
            forecast_hour: 0,
            interval: None,
            data_values: vec![288.15; (nx * ny) as usize],
        }
    }

    /// Regular lat/lon grid with `ni` x `nj` points starting at (la1, lo1).
    ///
    /// Rows run south when `step` is used from a northern first point.
    pub fn with_latlon_grid(mut self, ni: u32, nj: u32, la1: f64, lo1: f64, step: f64) -> Self {
        self.grid = BuilderGrid::LatLon {
            ni,
            nj,
            la1,
            lo1,
            step,
        };
        self.data_values = vec![0.0; (ni * nj) as usize];
        self
    }

    pub fn with_reference_time(mut self, reference_time: DateTime<Utc>) -> Self {
        self.reference_time = reference_time;
        self
    }

    pub fn with_parameter(mut self, category: u8, number: u8) -> Self {
        self.param_category = category;
        self.param_number = number;
        self
    }

    pub fn with_level(mut self, level_type: u8, level_value: u32) -> Self {
        self.level_type = level_type;
        self.level_value = level_value;
        self
    }

    pub fn with_forecast_hour(mut self, hour: u32) -> Self {
        self.forecast_hour = hour;
        self
    }

    /// Encode as a statistically processed product (template 4.8) whose
    /// interval starts at the forecast hour and lasts `hours`.
    pub fn with_interval(mut self, hours: u32, statistical_process: u8) -> Self {
        self.interval = Some((hours, statistical_process));
        self
    }

    pub fn with_constant_value(mut self, value: f32) -> Self {
        let (nx, ny) = self.grid.dimensions();
        self.data_values = vec![value; (nx * ny) as usize];
        self
    }

    pub fn with_gradient(mut self, min_val: f32, max_val: f32) -> Self {
        let (nx, ny) = self.grid.dimensions();
        let n = (nx * ny) as usize;
        self.data_values = (0..n)
            .map(|i| min_val + (max_val - min_val) * (i as f32 / n as f32))
            .collect();
        self
    }

    pub fn with_data(mut self, data: Vec<f32>) -> Self {
        self.data_values = data;
        self
    }

    /// Valid time of the encoded field.
    pub fn valid_time(&self) -> DateTime<Utc> {
        let hours = self.forecast_hour + self.interval.map(|(len, _)| len).unwrap_or(0);
        self.reference_time + Duration::hours(hours as i64)
    }

    /// Build the complete GRIB2 message bytes
    pub fn build(&self) -> Vec<u8> {
        let sections = [
            self.build_section1(),
            self.build_section3(),
            self.build_section4(),
            self.build_section5(),
            self.build_section6(),
            self.build_section7(),
        ];

        let message_length = 16 + sections.iter().map(Vec::len).sum::<usize>() + 4;

        let mut message = Vec::with_capacity(message_length);

        // Section 0: Indicator
        message.extend_from_slice(b"GRIB");
        message.extend_from_slice(&[0, 0]); // Reserved
        message.push(self.discipline);
        message.push(2); // Edition 2
        message.extend_from_slice(&(message_length as u64).to_be_bytes());

        for section in &sections {
            message.extend_from_slice(section);
        }

        // Section 8: End
        message.extend_from_slice(b"7777");

        message
    }

    fn build_section1(&self) -> Vec<u8> {
        let mut section = Vec::new();
        section.extend_from_slice(&21u32.to_be_bytes());
        section.push(1); // Section number

        section.extend_from_slice(&self.center.to_be_bytes());
        section.extend_from_slice(&0u16.to_be_bytes()); // Sub-center
        section.push(2); // Master table version
        section.push(1); // Local table version
        section.push(1); // Significance of reference time (start of forecast)
        push_timestamp(&mut section, self.reference_time);
        section.push(0); // Production status (operational)
        section.push(1); // Type of data (forecast)

        section
    }

    fn build_section3(&self) -> Vec<u8> {
        let (nx, ny) = self.grid.dimensions();
        let mut gd = Vec::new();

        gd.push(6); // Shape of Earth (spherical with radius 6371229m)
        gd.push(0); // Scale factor of radius
        gd.extend_from_slice(&0u32.to_be_bytes());
        gd.push(0); // Scale factor of major axis
        gd.extend_from_slice(&0u32.to_be_bytes());
        gd.push(0); // Scale factor of minor axis
        gd.extend_from_slice(&0u32.to_be_bytes());
        gd.extend_from_slice(&nx.to_be_bytes());
        gd.extend_from_slice(&ny.to_be_bytes());

        let template: u16 = match self.grid {
            BuilderGrid::LatLon {
                ni,
                nj,
                la1,
                lo1,
                step,
            } => {
                gd.extend_from_slice(&0u32.to_be_bytes()); // Basic angle
                gd.extend_from_slice(&0xFFFFFFFFu32.to_be_bytes()); // Subdivisions
                gd.extend_from_slice(&encode_degrees(la1));
                gd.extend_from_slice(&encode_degrees(lo1));
                gd.push(48); // Resolution and component flags
                gd.extend_from_slice(&encode_degrees(la1 - step * (nj - 1) as f64));
                gd.extend_from_slice(&encode_degrees(lo1 + step * (ni - 1) as f64));
                gd.extend_from_slice(&((step * 1e6).round() as u32).to_be_bytes()); // Di
                gd.extend_from_slice(&((step * 1e6).round() as u32).to_be_bytes()); // Dj
                gd.push(0); // Scanning mode: +i, -j, rows consecutive
                0
            }
            BuilderGrid::Lambert {
                la1,
                lo1,
                lov,
                latin,
                spacing,
                ..
            } => {
                let millimeters = ((spacing * 1e3).round() as u32).to_be_bytes();
                gd.extend_from_slice(&encode_degrees(la1));
                gd.extend_from_slice(&encode_degrees(lo1));
                gd.push(8); // Resolution and component flags
                gd.extend_from_slice(&encode_degrees(latin)); // LaD
                gd.extend_from_slice(&encode_degrees(lov));
                gd.extend_from_slice(&millimeters); // Dx
                gd.extend_from_slice(&millimeters); // Dy
                gd.push(0); // Projection centre: north pole
                gd.push(0x40); // Scanning mode: +i, +j
                gd.extend_from_slice(&encode_degrees(latin)); // Latin1
                gd.extend_from_slice(&encode_degrees(latin)); // Latin2
                gd.extend_from_slice(&encode_degrees(-90.0)); // Latitude of southern pole
                gd.extend_from_slice(&0u32.to_be_bytes()); // Longitude of southern pole
                30
            }
        };

        let mut section = Vec::new();
        section.extend_from_slice(&(14 + gd.len() as u32).to_be_bytes());
        section.push(3); // Section number
        section.push(0); // Source of grid definition
        section.extend_from_slice(&(nx * ny).to_be_bytes());
        section.push(0); // Number of octets for optional list
        section.push(0); // Interpretation of optional list
        section.extend_from_slice(&template.to_be_bytes());
        section.extend_from_slice(&gd);

        section
    }

    fn build_section4(&self) -> Vec<u8> {
        let template: u16 = if self.interval.is_some() { 8 } else { 0 };

        let mut section = Vec::new();
        section.extend_from_slice(&0u32.to_be_bytes()); // Length, patched below
        section.push(4); // Section number

        section.extend_from_slice(&0u16.to_be_bytes()); // Number of coordinate values
        section.extend_from_slice(&template.to_be_bytes());

        section.push(self.param_category);
        section.push(self.param_number);
        section.push(2); // Type of generating process (forecast)
        section.push(0); // Background generating process
        section.push(0); // Analysis or forecast process
        section.extend_from_slice(&0u16.to_be_bytes()); // Hours of cutoff
        section.push(0); // Minutes of cutoff
        section.push(1); // Time range unit (hours)
        section.extend_from_slice(&self.forecast_hour.to_be_bytes()); // Forecast time

        section.push(self.level_type); // Type of first fixed surface
        section.push(0); // Scale factor
        section.extend_from_slice(&self.level_value.to_be_bytes());

        section.push(255); // Type of second fixed surface (none)
        section.push(0); // Scale factor
        section.extend_from_slice(&0u32.to_be_bytes());

        if let Some((hours, process)) = self.interval {
            push_timestamp(&mut section, self.valid_time());
            section.push(1); // Number of time range specifications
            section.extend_from_slice(&0u32.to_be_bytes()); // Missing values
            section.push(process); // Statistical process
            section.push(2); // Successive times, forecast time incremented
            section.push(1); // Unit for time range (hours)
            section.extend_from_slice(&hours.to_be_bytes());
            section.push(255); // Unit for increment (missing)
            section.extend_from_slice(&0u32.to_be_bytes());
        }

        let length = (section.len() as u32).to_be_bytes();
        section[0..4].copy_from_slice(&length);
        section
    }

    /// Values that carry data; NaN points go into the bitmap instead.
    fn present_values(&self) -> impl Iterator<Item = f32> + '_ {
        self.data_values.iter().copied().filter(|v| !v.is_nan())
    }

    fn has_missing(&self) -> bool {
        self.data_values.iter().any(|v| v.is_nan())
    }

    fn packing(&self) -> (f32, i16, u8) {
        let (min_val, max_val) = self.present_values().fold(
            (f32::INFINITY, f32::NEG_INFINITY),
            |(min, max), v| (min.min(v), max.max(v)),
        );
        let range = max_val - min_val;

        if !range.is_finite() {
            (0.0, 0, 0)
        } else if range == 0.0 {
            (min_val, 0, 0)
        } else {
            // 16-bit packing: range = 65535 * 2^E
            let binary_scale_factor = (range / 65535.0).log2().ceil() as i16;
            (min_val, binary_scale_factor, 16)
        }
    }

    fn build_section5(&self) -> Vec<u8> {
        let (reference_value, binary_scale_factor, bits_per_value) = self.packing();
        let packed_points = self.present_values().count() as u32;

        let mut section = Vec::new();
        section.extend_from_slice(&21u32.to_be_bytes());
        section.push(5); // Section number

        // Number of points with a value, not the grid size, when a bitmap is present
        section.extend_from_slice(&packed_points.to_be_bytes());
        section.extend_from_slice(&0u16.to_be_bytes()); // Template 5.0

        section.extend_from_slice(&reference_value.to_be_bytes());
        section.extend_from_slice(&encode_signed_i16(binary_scale_factor));
        section.extend_from_slice(&encode_signed_i16(0)); // Decimal scale factor
        section.push(bits_per_value);
        section.push(0); // Original field type (floating point)

        section
    }

    fn build_section6(&self) -> Vec<u8> {
        if !self.has_missing() {
            let mut section = Vec::new();
            section.extend_from_slice(&6u32.to_be_bytes());
            section.push(6); // Section number
            section.push(255); // No bitmap, all data present
            return section;
        }

        // 1 bit per point, MSB first, 1 = value present
        let mut bits = vec![0u8; self.data_values.len().div_ceil(8)];
        for (i, v) in self.data_values.iter().enumerate() {
            if !v.is_nan() {
                bits[i / 8] |= 0x80 >> (i % 8);
            }
        }

        let mut section = Vec::new();
        section.extend_from_slice(&(6 + bits.len() as u32).to_be_bytes());
        section.push(6); // Section number
        section.push(0); // Bitmap follows
        section.extend_from_slice(&bits);
        section
    }

    fn build_section7(&self) -> Vec<u8> {
        let (reference_value, binary_scale_factor, bits_per_value) = self.packing();

        let mut packed = Vec::new();
        if bits_per_value > 0 {
            let binary_scale = 2.0_f32.powi(binary_scale_factor as i32);
            for val in self.present_values() {
                let packed_value = ((val - reference_value) / binary_scale).round() as u16;
                packed.extend_from_slice(&packed_value.to_be_bytes());
            }
        }

        let mut section = Vec::new();
        section.extend_from_slice(&(5 + packed.len() as u32).to_be_bytes());
        section.push(7); // Section number
        section.extend_from_slice(&packed);
        section
    }
}

/// Concatenate messages into one multi-message file.
pub fn concat_messages(messages: &[Vec<u8>]) -> Vec<u8> {
    messages.iter().flatten().copied().collect()
}

fn push_timestamp(section: &mut Vec<u8>, time: DateTime<Utc>) {
    section.extend_from_slice(&(time.year() as u16).to_be_bytes());
    section.push(time.month() as u8);
    section.push(time.day() as u8);
    section.push(time.hour() as u8);
    section.push(time.minute() as u8);
    section.push(time.second() as u8);
}

/// Degrees as a sign-magnitude microdegree integer.
fn encode_degrees(degrees: f64) -> [u8; 4] {
    let micro = (degrees.abs() * 1e6).round() as u32;
    let sign = if degrees < 0.0 { 0x8000_0000 } else { 0 };
    (micro | sign).to_be_bytes()
}

fn encode_signed_i16(value: i16) -> [u8; 2] {
    let magnitude = value.unsigned_abs() & 0x7FFF;
    let sign = if value < 0 { 0x8000 } else { 0 };
    (magnitude | sign).to_be_bytes()
}
