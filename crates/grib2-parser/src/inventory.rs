//! wgrib2-style inventory lines and `.idx` sidecar files.

use std::fs;
use std::path::{Path, PathBuf};

use crate::Grib2Message;

/// Suffix of the inventory file written next to an opened GRIB2 file.
pub const INDEX_SUFFIX: &str = ".idx";

/// Path of the inventory sidecar for `path`.
pub fn index_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(INDEX_SUFFIX);
    PathBuf::from(name)
}

/// One inventory line, e.g. `1:0:d=2024011512:MAXRH:2 m above ground:12-24 hour max fcst:`
pub fn inventory_line(number: usize, message: &Grib2Message) -> String {
    let date = message
        .identification
        .reference_time
        .map(|t| t.format("%Y%m%d%H").to_string())
        .unwrap_or_else(|| "??????????".to_string());

    format!(
        "{}:{}:d={}:{}:{}:{}:",
        number,
        message.offset,
        date,
        message.product.parameter_short_name,
        message.product.level_description,
        forecast_description(message)
    )
}

/// Write the inventory for `messages` to `<path>.idx`.
pub fn write_inventory(path: &Path, messages: &[Grib2Message]) -> std::io::Result<PathBuf> {
    let mut contents = String::new();
    for (n, message) in messages.iter().enumerate() {
        contents.push_str(&inventory_line(n + 1, message));
        contents.push('\n');
    }

    let idx = index_path(path);
    fs::write(&idx, contents)?;
    Ok(idx)
}

fn forecast_description(message: &Grib2Message) -> String {
    let product = &message.product;
    let start = product.forecast_seconds().map(|s| s / 3600);

    match (product.interval_end, message.identification.reference_time, start) {
        (Some(end), Some(reference), Some(start)) => {
            let end_hour = (end - reference).num_hours();
            let stat = match product.statistical_process {
                Some(0) => "ave",
                Some(1) => "acc",
                Some(2) => "max",
                Some(3) => "min",
                _ => "stat",
            };
            format!("{}-{} hour {} fcst", start, end_hour, stat)
        }
        (None, _, Some(0)) => "anl".to_string(),
        (None, _, Some(hours)) => format!("{} hour fcst", hours),
        _ => format!("{} unit-{} fcst", product.forecast_time, product.time_unit),
    }
}
