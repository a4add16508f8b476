//! GRIB2 section parsing.
//!
//! Each parse function takes the bytes of a complete message and locates
//! its section by walking the section headers from octet 17 onward.

use crate::Grib2Error;
use bytes::Bytes;
use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Section 0: Indicator Section (16 bytes)
#[derive(Debug, Clone)]
pub struct Indicator {
    pub discipline: u8,
    pub edition: u8,
    pub message_length: u64,
}

/// Section 1: Identification Section
#[derive(Debug, Clone)]
pub struct Identification {
    pub center: u16,
    pub sub_center: u16,
    pub significance_of_reference_time: u8,
    /// `None` when the encoded date is not a real calendar instant.
    pub reference_time: Option<DateTime<Utc>>,
    pub production_status: u8,
    pub data_type: u8,
}

/// Section 4: Product Definition Section
#[derive(Debug, Clone)]
pub struct ProductDefinition {
    pub template: u16,
    pub parameter_category: u8,
    pub parameter_number: u8,
    pub parameter_short_name: String,
    pub level_type: u8,
    pub level_value: f64,
    pub level_description: String,
    /// Code table 4.4 unit of `forecast_time`
    pub time_unit: u8,
    pub forecast_time: u32,
    /// Statistical process (code table 4.10) for interval products
    pub statistical_process: Option<u8>,
    /// End of the overall time interval for templates 4.8 / 4.9
    pub interval_end: Option<DateTime<Utc>>,
}

impl ProductDefinition {
    /// Forecast lead time in seconds, when the time unit is convertible.
    pub fn forecast_seconds(&self) -> Option<i64> {
        let unit = match self.time_unit {
            0 => 60,
            1 => 3_600,
            2 => 86_400,
            10 => 3 * 3_600,
            11 => 6 * 3_600,
            12 => 12 * 3_600,
            13 => 1,
            _ => return None,
        };
        Some(self.forecast_time as i64 * unit)
    }

    /// Valid time of the field given its reference time.
    ///
    /// Interval products are valid at the end of their interval. `None` when
    /// the forecast offset runs past the representable range.
    pub fn valid_time(&self, reference_time: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if let Some(end) = self.interval_end {
            return Some(end);
        }
        reference_time.checked_add_signed(Duration::seconds(self.forecast_seconds().unwrap_or(0)))
    }
}

/// Section 5: Data Representation Section
#[derive(Debug, Clone)]
pub struct DataRepresentation {
    pub num_data_points: u32,
    /// Data representation template number (5.x)
    pub template: u16,
    pub reference_value: f32,
    pub binary_scale_factor: i16,
    pub decimal_scale_factor: i16,
    pub bits_per_value: u8,
}

/// Section 6: Bitmap Section
#[derive(Debug, Clone)]
pub struct Bitmap {
    pub indicator: u8,
    pub data: Bytes,
}

/// Section 7: Data Section
#[derive(Debug, Clone)]
pub struct DataSection {
    pub data: Bytes,
}

// ===== Parsing Functions =====

/// Parse Section 0 (Indicator) from start of message
pub fn parse_indicator(data: &[u8]) -> Result<Indicator, Grib2Error> {
    if data.len() < 16 {
        return Err(Grib2Error::InvalidFormat(
            "Not enough data for indicator section".to_string(),
        ));
    }

    if &data[0..4] != b"GRIB" {
        return Err(Grib2Error::InvalidFormat(
            "Invalid GRIB magic bytes".to_string(),
        ));
    }

    // Octets 5-6 reserved, 7 discipline, 8 edition, 9-16 total length
    let discipline = data[6];
    let edition = data[7];

    if edition != 2 {
        return Err(Grib2Error::InvalidFormat(format!(
            "Expected GRIB edition 2, got {}",
            edition
        )));
    }

    let mut length = [0u8; 8];
    length.copy_from_slice(&data[8..16]);

    Ok(Indicator {
        discipline,
        edition,
        message_length: u64::from_be_bytes(length),
    })
}

/// Parse Section 1 (Identification)
pub fn parse_identification(data: &[u8]) -> Result<Identification, Grib2Error> {
    let section = find_section(data, 1)?;

    if section.len() < 21 {
        return Err(Grib2Error::InvalidSection {
            section: 1,
            reason: "Not enough data".to_string(),
        });
    }

    let year = u16::from_be_bytes([section[12], section[13]]);
    let (month, day, hour, minute, second) =
        (section[14], section[15], section[16], section[17], section[18]);

    let reference_time = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
        .and_then(|date| date.and_hms_opt(hour as u32, minute as u32, second as u32))
        .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));

    if reference_time.is_none() {
        tracing::debug!(
            year,
            month,
            day,
            hour,
            "GRIB2 reference time does not decode to a calendar instant"
        );
    }

    Ok(Identification {
        center: u16::from_be_bytes([section[5], section[6]]),
        sub_center: u16::from_be_bytes([section[7], section[8]]),
        significance_of_reference_time: section[11],
        reference_time,
        production_status: section[19],
        data_type: section[20],
    })
}

/// Parse Section 4 (Product Definition)
pub fn parse_product_definition(
    data: &[u8],
    discipline: u8,
) -> Result<ProductDefinition, Grib2Error> {
    let section = find_section(data, 4)?;

    if section.len() < 34 {
        return Err(Grib2Error::InvalidSection {
            section: 4,
            reason: "Not enough data".to_string(),
        });
    }

    // Octets 8-9 template, 10 category, 11 number, 18 time unit,
    // 19-22 forecast time, 23 first surface type, 24 scale, 25-28 value.
    // Templates 4.0 through 4.15 share this layout.
    let template = u16::from_be_bytes([section[7], section[8]]);
    let parameter_category = section[9];
    let parameter_number = section[10];
    let time_unit = section[17];
    let forecast_time =
        u32::from_be_bytes([section[18], section[19], section[20], section[21]]);

    let level_type = section[22];
    let level_scale = decode_grib2_signed_i8(section[23]);
    let level_scaled = u32::from_be_bytes([section[24], section[25], section[26], section[27]]);
    let level_value = level_scaled as f64 / 10f64.powi(level_scale as i32);

    let interval_offset = match template {
        8 => Some(34),
        9 => Some(47),
        _ => None,
    };

    let (interval_end, statistical_process) = match interval_offset {
        Some(offset) if section.len() > offset + 12 => {
            let end = parse_timestamp(&section[offset..offset + 7]);
            (end, Some(section[offset + 12]))
        }
        Some(_) => {
            return Err(Grib2Error::InvalidSection {
                section: 4,
                reason: format!("Template 4.{} truncated", template),
            })
        }
        None => (None, None),
    };

    Ok(ProductDefinition {
        template,
        parameter_category,
        parameter_number,
        parameter_short_name: parameter_short_name(discipline, parameter_category, parameter_number),
        level_type,
        level_value,
        level_description: level_description(level_type, level_value),
        time_unit,
        forecast_time,
        statistical_process,
        interval_end,
    })
}

/// Parse Section 5 (Data Representation)
pub fn parse_data_representation(data: &[u8]) -> Result<DataRepresentation, Grib2Error> {
    let section = find_section(data, 5)?;

    if section.len() < 20 {
        return Err(Grib2Error::InvalidSection {
            section: 5,
            reason: "Not enough data".to_string(),
        });
    }

    // Octets 6-9 number of points, 10-11 template, then the fields shared by
    // templates 5.0 / 5.2 / 5.3 / 5.40 / 5.41:
    // 12-15 reference value, 16-17 E, 18-19 D, 20 bits per value.
    let num_data_points = u32::from_be_bytes([section[5], section[6], section[7], section[8]]);
    let template = u16::from_be_bytes([section[9], section[10]]);
    let reference_value = f32::from_be_bytes([section[11], section[12], section[13], section[14]]);

    Ok(DataRepresentation {
        num_data_points,
        template,
        reference_value,
        binary_scale_factor: decode_grib2_signed_i16(&section[15..17]),
        decimal_scale_factor: decode_grib2_signed_i16(&section[17..19]),
        bits_per_value: section[19],
    })
}

/// Parse Section 6 (Bitmap). `None` means every point carries a value.
pub fn parse_bitmap(data: &[u8]) -> Result<Option<Bitmap>, Grib2Error> {
    let section = match find_section(data, 6) {
        Ok(section) => section,
        Err(_) => return Ok(None),
    };

    if section.len() < 6 {
        return Err(Grib2Error::InvalidSection {
            section: 6,
            reason: "Not enough data".to_string(),
        });
    }

    match section[5] {
        255 => Ok(None),
        0 => Ok(Some(Bitmap {
            indicator: 0,
            data: Bytes::copy_from_slice(&section[6..]),
        })),
        other => Err(Grib2Error::InvalidSection {
            section: 6,
            reason: format!("Unsupported bitmap indicator {}", other),
        }),
    }
}

/// Parse Section 7 (Data)
pub fn parse_data_section(data: &[u8]) -> Result<DataSection, Grib2Error> {
    let section = find_section(data, 7)?;

    Ok(DataSection {
        data: Bytes::copy_from_slice(&section[5..]),
    })
}

// ===== Helper Functions =====

/// Locate a section by number within a message, returning its full bytes.
pub fn find_section(data: &[u8], section_num: u8) -> Result<&[u8], Grib2Error> {
    let mut offset = 16; // After Section 0

    loop {
        if offset + 4 <= data.len() && &data[offset..offset + 4] == b"7777" {
            return Err(Grib2Error::InvalidSection {
                section: section_num,
                reason: "Reached end of message without finding section".to_string(),
            });
        }

        if offset + 5 > data.len() {
            return Err(Grib2Error::InvalidSection {
                section: section_num,
                reason: "Section not found".to_string(),
            });
        }

        let section_length = u32::from_be_bytes([
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ]) as usize;

        if section_length < 5 || offset + section_length > data.len() {
            return Err(Grib2Error::InvalidSection {
                section: section_num,
                reason: "Invalid section length".to_string(),
            });
        }

        if data[offset + 4] == section_num {
            return Ok(&data[offset..offset + section_length]);
        }

        offset += section_length;
    }
}

/// Decode a 4-byte GRIB2 sign-magnitude integer (MSB is the sign bit).
///
/// Any other slice length decodes to 0.
pub fn decode_grib2_signed(bytes: &[u8]) -> i32 {
    if bytes.len() != 4 {
        return 0;
    }
    let raw = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let magnitude = (raw & 0x7FFF_FFFF) as i32;
    if raw & 0x8000_0000 != 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Decode a 2-byte GRIB2 sign-magnitude integer.
pub fn decode_grib2_signed_i16(bytes: &[u8]) -> i16 {
    if bytes.len() != 2 {
        return 0;
    }
    let raw = u16::from_be_bytes([bytes[0], bytes[1]]);
    let magnitude = (raw & 0x7FFF) as i16;
    if raw & 0x8000 != 0 {
        -magnitude
    } else {
        magnitude
    }
}

fn decode_grib2_signed_i8(byte: u8) -> i8 {
    let magnitude = (byte & 0x7F) as i8;
    if byte & 0x80 != 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Year (2 bytes), month, day, hour, minute, second.
fn parse_timestamp(bytes: &[u8]) -> Option<DateTime<Utc>> {
    let year = u16::from_be_bytes([bytes[0], bytes[1]]);
    NaiveDate::from_ymd_opt(year as i32, bytes[2] as u32, bytes[3] as u32)
        .and_then(|date| date.and_hms_opt(bytes[4] as u32, bytes[5] as u32, bytes[6] as u32))
        .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
}

/// wgrib2-style short name for a parameter
pub fn parameter_short_name(discipline: u8, category: u8, number: u8) -> String {
    let name = match (discipline, category, number) {
        // Temperature
        (0, 0, 0) => "TMP",
        (0, 0, 4) => "TMAX",
        (0, 0, 5) => "TMIN",
        (0, 0, 6) => "DPT",

        // Moisture
        (0, 1, 1) => "RH",
        (0, 1, 8) => "APCP",
        (0, 1, 27) => "MAXRH",
        (0, 1, 28) => "MINRH",

        // Momentum
        (0, 2, 0) => "WDIR",
        (0, 2, 1) => "WIND",
        (0, 2, 2) => "UGRD",
        (0, 2, 3) => "VGRD",
        (0, 2, 22) => "GUST",

        // Mass
        (0, 3, 0) => "PRES",

        // Cloud
        (0, 6, 1) => "TCDC",

        // Physical atmospheric properties (NDFD fire weather outlooks)
        (0, 19, 0) => "VIS",
        (0, 19, 2) => "TSTM",
        (0, 19, 203) => "FIREOLK",
        (0, 19, 204) => "FIREODT",
        (0, 19, 206) => "CONHAZO",

        _ => return format!("var{}_{}_{}", discipline, category, number),
    };
    name.to_string()
}

/// Level description in wgrib2 wording
pub fn level_description(level_type: u8, level_value: f64) -> String {
    match level_type {
        1 => "surface".to_string(),
        10 | 200 => "entire atmosphere".to_string(),
        100 => format!("{} mb", level_value / 100.0),
        101 => "mean sea level".to_string(),
        102 => format!("{} m above mean sea level", level_value),
        103 => format!("{} m above ground", level_value),
        _ => format!("level type {} value {}", level_type, level_value),
    }
}
