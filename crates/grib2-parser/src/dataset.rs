//! Decoded GRIB2 files as collections of fields.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use firewx_common::GridCoordinates;
use tracing::{debug, warn};

use crate::inventory::write_inventory;
use crate::{Grib2Error, Grib2Message, Grib2Reader, GridTemplate};

/// One decoded field (a GRIB2 message's data on its grid).
#[derive(Debug, Clone)]
pub struct GribField {
    pub name: String,
    pub level: String,
    pub reference_time: Option<DateTime<Utc>>,
    pub valid_time: Option<DateTime<Utc>>,
    pub grid: GridTemplate,
    /// Row-major values, missing points as NaN
    pub values: Vec<f32>,
}

impl GribField {
    fn from_message(message: &Grib2Message) -> Result<Self, Grib2Error> {
        let reference_time = message.identification.reference_time;
        Ok(Self {
            name: message.product.parameter_short_name.clone(),
            level: message.product.level_description.clone(),
            reference_time,
            valid_time: reference_time.and_then(|t| message.product.valid_time(t)),
            grid: message.grid.clone(),
            values: message.values()?,
        })
    }
}

/// All fields of one GRIB2 file.
#[derive(Debug, Clone)]
pub struct GribDataset {
    pub source: Option<PathBuf>,
    pub fields: Vec<GribField>,
}

impl GribDataset {
    /// Decode every message in `data`.
    pub fn from_bytes(data: Bytes) -> Result<Self, Grib2Error> {
        let messages = read_messages(data)?;
        Self::from_messages(&messages, None)
    }

    /// Open a GRIB2 file, writing its inventory to `<path>.idx`.
    ///
    /// The inventory is a convenience; failing to write it is logged and
    /// does not fail the open.
    pub fn open_file(path: impl AsRef<Path>) -> Result<Self, Grib2Error> {
        let path = path.as_ref();
        let data = Bytes::from(std::fs::read(path)?);
        let messages = read_messages(data)?;

        match write_inventory(path, &messages) {
            Ok(idx) => debug!(index = %idx.display(), messages = messages.len(), "Wrote GRIB2 inventory"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to write GRIB2 inventory"),
        }

        Self::from_messages(&messages, Some(path.to_path_buf()))
    }

    fn from_messages(messages: &[Grib2Message], source: Option<PathBuf>) -> Result<Self, Grib2Error> {
        let fields = messages
            .iter()
            .map(GribField::from_message)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { source, fields })
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Sorted, distinct reference times of the decodable fields.
    pub fn reference_times(&self) -> Vec<DateTime<Utc>> {
        let mut times: Vec<_> = self.fields.iter().filter_map(|f| f.reference_time).collect();
        times.sort();
        times.dedup();
        times
    }

    /// Coordinates of the grid shared by the fields.
    pub fn coordinates(&self) -> Option<GridCoordinates> {
        self.fields.first().map(|f| f.grid.coordinates())
    }
}

fn read_messages(data: Bytes) -> Result<Vec<Grib2Message>, Grib2Error> {
    let messages = Grib2Reader::new(data).collect::<Result<Vec<_>, _>>()?;
    if messages.is_empty() {
        return Err(Grib2Error::InvalidFormat("No GRIB2 messages found".to_string()));
    }
    Ok(messages)
}
