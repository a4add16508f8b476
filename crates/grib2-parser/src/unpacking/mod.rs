//! GRIB2 data unpacking.
//!
//! Simple packing (template 5.0) is decoded here. Everything else, notably the
//! complex packing with spatial differencing (5.3) NDFD publishes, goes through
//! the `grib` crate.

use std::io::Cursor;

use crate::sections::{Bitmap, DataRepresentation};
use crate::Grib2Error;

/// Unpack simple packed GRIB2 data
///
/// Simple packing formula: value = (reference_value + (packed_value * 2^binary_scale)) * 10^(-decimal_scale)
///
/// `num_points` is the number of grid points. Only points flagged present in
/// the bitmap consume packed values.
pub fn unpack_simple(
    packed_data: &[u8],
    num_points: usize,
    bits_per_value: u8,
    reference_value: f32,
    binary_scale_factor: i16,
    decimal_scale_factor: i16,
    bitmap: Option<&[u8]>,
) -> Result<Vec<Option<f32>>, Grib2Error> {
    let binary_scale = 2.0_f64.powi(binary_scale_factor as i32);
    let decimal_scale = 10.0_f64.powi(-(decimal_scale_factor as i32));
    let reference = reference_value as f64;

    let mut values = Vec::with_capacity(num_points);
    let mut bit_position = 0;
    let bits_per_value = bits_per_value as usize;

    for i in 0..num_points {
        let has_value = match bitmap {
            // 1 bit per data point, 1 = value present
            Some(bm) => bm
                .get(i / 8)
                .map(|byte| (byte >> (7 - (i % 8))) & 1 == 1)
                .unwrap_or(true),
            None => true,
        };

        if !has_value {
            values.push(None);
            continue;
        }

        let packed_value = if bits_per_value == 0 {
            0
        } else {
            let v = extract_bits(packed_data, bit_position, bits_per_value)
                .map_err(|e| Grib2Error::UnpackingError(format!("Failed to extract bits: {}", e)))?;
            bit_position += bits_per_value;
            v
        };

        let value = (reference + packed_value as f64 * binary_scale) * decimal_scale;
        values.push(Some(value as f32));
    }

    Ok(values)
}

/// Decode a message's field values in scan order, missing points as NaN.
///
/// `grid_points` is the grid's point count; with a bitmap, section 5 only
/// counts the points that carry a value.
pub fn decode_values(
    message: &[u8],
    grid_points: usize,
    representation: &DataRepresentation,
    bitmap: Option<&Bitmap>,
    packed: &[u8],
) -> Result<Vec<f32>, Grib2Error> {
    if representation.template == 0 {
        if bitmap.is_none() && representation.num_data_points as usize != grid_points {
            return Err(Grib2Error::UnpackingError(format!(
                "{} packed values for a grid of {} points",
                representation.num_data_points, grid_points
            )));
        }
        let values = unpack_simple(
            packed,
            grid_points,
            representation.bits_per_value,
            representation.reference_value,
            representation.binary_scale_factor,
            representation.decimal_scale_factor,
            bitmap.map(|b| b.data.as_ref()),
        )?;
        return Ok(values.into_iter().map(|v| v.unwrap_or(f32::NAN)).collect());
    }

    tracing::trace!(
        template = representation.template,
        "Decoding packed field with the grib crate"
    );
    decode_with_grib_crate(message)
}

/// Decode the first field of a single GRIB2 message through the `grib` crate.
pub fn decode_with_grib_crate(message: &[u8]) -> Result<Vec<f32>, Grib2Error> {
    let grib2 = grib::from_reader(Cursor::new(message))
        .map_err(|e| Grib2Error::UnpackingError(format!("grib crate rejected message: {}", e)))?;

    let (_index, submessage) = grib2
        .iter()
        .next()
        .ok_or_else(|| Grib2Error::UnpackingError("Message has no fields".to_string()))?;

    let decoder = grib::Grib2SubmessageDecoder::from(submessage)
        .map_err(|e| Grib2Error::UnpackingError(e.to_string()))?;
    let values = decoder
        .dispatch()
        .map_err(|e| Grib2Error::UnpackingError(e.to_string()))?;

    Ok(values.collect())
}

/// Extract bits from a byte array
/// Returns the bits as a 32-bit unsigned integer
fn extract_bits(data: &[u8], start_bit: usize, num_bits: usize) -> Result<u32, String> {
    if num_bits > 32 || num_bits == 0 {
        return Err(format!("Invalid number of bits: {}", num_bits));
    }

    let mut result = 0u32;

    for i in 0..num_bits {
        let absolute_bit = start_bit + i;
        let byte_idx = absolute_bit / 8;
        let bit_idx = 7 - (absolute_bit % 8); // MSB first

        if byte_idx >= data.len() {
            return Err("Not enough data to extract bits".to_string());
        }

        let bit = (data[byte_idx] >> bit_idx) & 1;
        result = (result << 1) | (bit as u32);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bits() {
        let data = vec![0b10110101];

        assert_eq!(extract_bits(&data, 0, 2).unwrap(), 0b10);
        assert_eq!(extract_bits(&data, 2, 2).unwrap(), 0b11);
        assert_eq!(extract_bits(&data, 0, 8).unwrap(), 0b10110101);
        assert!(extract_bits(&data, 4, 8).is_err());
    }

    #[test]
    fn test_simple_unpacking_with_scales() {
        // 12-bit values 1 and 4095 straddling byte boundaries
        let packed = vec![0x00, 0x1F, 0xFF];
        let values = unpack_simple(&packed, 2, 12, 100.0, -1, 1, None).unwrap();

        // (100 + 1 * 0.5) / 10 and (100 + 4095 * 0.5) / 10
        assert!((values[0].unwrap() - 10.05).abs() < 1e-4);
        assert!((values[1].unwrap() - 214.75).abs() < 1e-3);
    }

    fn representation(num_data_points: u32, bits_per_value: u8) -> DataRepresentation {
        DataRepresentation {
            num_data_points,
            template: 0,
            reference_value: 0.0,
            binary_scale_factor: 0,
            decimal_scale_factor: 0,
            bits_per_value,
        }
    }

    #[test]
    fn test_bitmap_skips_missing_points() {
        // Bitmap 101 over a 3-point grid: section 5 counts the 2 packed values
        let bitmap = Bitmap {
            indicator: 0,
            data: bytes::Bytes::from_static(&[0b1010_0000]),
        };
        let values =
            decode_values(&[], 3, &representation(2, 8), Some(&bitmap), &[10, 20]).unwrap();

        assert_eq!(values.len(), 3);
        assert_eq!(values[0], 10.0);
        assert!(values[1].is_nan());
        assert_eq!(values[2], 20.0);
    }

    #[test]
    fn test_point_count_mismatch_without_bitmap_is_error() {
        let err = decode_values(&[], 3, &representation(2, 8), None, &[10, 20]).unwrap_err();
        assert!(matches!(err, Grib2Error::UnpackingError(_)));
    }

    #[test]
    fn test_constant_field() {
        let values = unpack_simple(&[], 4, 0, 288.15, 0, 0, None).unwrap();
        assert_eq!(values, vec![Some(288.15); 4]);
    }
}
