//! Message-by-message reading of a GRIB2 byte stream.

use bytes::Bytes;

use crate::grid::{parse_grid_definition, GridTemplate};
use crate::sections::{
    parse_bitmap, parse_data_representation, parse_data_section, parse_identification,
    parse_indicator, parse_product_definition, Bitmap, DataRepresentation, DataSection,
    Identification, Indicator, ProductDefinition,
};
use crate::unpacking::decode_values;
use crate::Grib2Error;

/// One GRIB2 message with its sections parsed.
#[derive(Debug, Clone)]
pub struct Grib2Message {
    /// Byte offset of the message within its file
    pub offset: usize,
    pub indicator: Indicator,
    pub identification: Identification,
    pub grid: GridTemplate,
    pub product: ProductDefinition,
    pub data_representation: DataRepresentation,
    pub bitmap: Option<Bitmap>,
    pub data_section: DataSection,
    raw: Bytes,
}

impl Grib2Message {
    /// Parse a complete message (section 0 through "7777").
    pub fn parse(raw: Bytes, offset: usize) -> Result<Self, Grib2Error> {
        let indicator = parse_indicator(&raw)?;
        let identification = parse_identification(&raw)?;
        let grid = parse_grid_definition(&raw)?;
        let product = parse_product_definition(&raw, indicator.discipline)?;
        let data_representation = parse_data_representation(&raw)?;
        let bitmap = parse_bitmap(&raw)?;
        let data_section = parse_data_section(&raw)?;

        Ok(Self {
            offset,
            indicator,
            identification,
            grid,
            product,
            data_representation,
            bitmap,
            data_section,
            raw,
        })
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Decode the field values in row-major order, missing points as NaN.
    pub fn values(&self) -> Result<Vec<f32>, Grib2Error> {
        let values = decode_values(
            &self.raw,
            self.grid.num_points(),
            &self.data_representation,
            self.bitmap.as_ref(),
            &self.data_section.data,
        )?;

        let expected = self.grid.num_points();
        if values.len() != expected {
            return Err(Grib2Error::UnpackingError(format!(
                "Decoded {} values for a grid of {} points",
                values.len(),
                expected
            )));
        }

        Ok(self.grid.to_row_major(values))
    }
}

/// Sequential reader over the messages of a GRIB2 file.
pub struct Grib2Reader {
    data: Bytes,
    position: usize,
}

impl Grib2Reader {
    pub fn new(data: Bytes) -> Self {
        Self { data, position: 0 }
    }

    /// Read the next message, or `None` at end of data.
    ///
    /// Bytes between messages (padding, headers some archives prepend) are
    /// skipped up to the next "GRIB" marker.
    pub fn next_message(&mut self) -> Result<Option<Grib2Message>, Grib2Error> {
        let start = match find_marker(&self.data[self.position..]) {
            Some(rel) => self.position + rel,
            None => {
                self.position = self.data.len();
                return Ok(None);
            }
        };

        let indicator = parse_indicator(&self.data[start..])?;
        let length = usize::try_from(indicator.message_length).map_err(|_| {
            Grib2Error::InvalidFormat(format!(
                "Message length {} does not fit in memory",
                indicator.message_length
            ))
        })?;

        let end = start.checked_add(length).filter(|end| *end <= self.data.len());
        let end = end.ok_or_else(|| {
            Grib2Error::InvalidFormat(format!(
                "Message at offset {} claims {} bytes but only {} remain",
                start,
                length,
                self.data.len() - start
            ))
        })?;

        if length < 20 || &self.data[end - 4..end] != b"7777" {
            return Err(Grib2Error::InvalidFormat(format!(
                "Message at offset {} is missing its end section",
                start
            )));
        }

        self.position = end;
        Grib2Message::parse(self.data.slice(start..end), start).map(Some)
    }
}

impl Iterator for Grib2Reader {
    type Item = Result<Grib2Message, Grib2Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_message() {
            Ok(Some(message)) => Some(Ok(message)),
            Ok(None) => None,
            Err(e) => {
                // Stop after the first malformed message
                self.position = self.data.len();
                Some(Err(e))
            }
        }
    }
}

fn find_marker(data: &[u8]) -> Option<usize> {
    data.windows(4).position(|w| w == b"GRIB")
}
