//! The closed set of NDFD parameters the fetcher knows how to retrieve.

use std::fmt;
use std::str::FromStr;

use crate::error::FetchError;

/// An NDFD parameter file, e.g. `ds.maxrh.bin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NdfdParameter {
    MaxRelativeHumidity,
    MinRelativeHumidity,
    MaxTemperature,
    MinTemperature,
    RelativeHumidity,
    Temperature,
    WindSpeed,
    WindGust,
    WindDirection,
    CriticalFireWeather,
    DryThunderstorm,
    ConvectiveHazard,
}

impl NdfdParameter {
    pub const ALL: [NdfdParameter; 12] = [
        NdfdParameter::MaxRelativeHumidity,
        NdfdParameter::MinRelativeHumidity,
        NdfdParameter::MaxTemperature,
        NdfdParameter::MinTemperature,
        NdfdParameter::RelativeHumidity,
        NdfdParameter::Temperature,
        NdfdParameter::WindSpeed,
        NdfdParameter::WindGust,
        NdfdParameter::WindDirection,
        NdfdParameter::CriticalFireWeather,
        NdfdParameter::DryThunderstorm,
        NdfdParameter::ConvectiveHazard,
    ];

    /// File name on the NDFD server.
    pub fn file_name(self) -> &'static str {
        match self {
            NdfdParameter::MaxRelativeHumidity => "ds.maxrh.bin",
            NdfdParameter::MinRelativeHumidity => "ds.minrh.bin",
            NdfdParameter::MaxTemperature => "ds.maxt.bin",
            NdfdParameter::MinTemperature => "ds.mint.bin",
            NdfdParameter::RelativeHumidity => "ds.rhm.bin",
            NdfdParameter::Temperature => "ds.temp.bin",
            NdfdParameter::WindSpeed => "ds.wspd.bin",
            NdfdParameter::WindGust => "ds.wgust.bin",
            NdfdParameter::WindDirection => "ds.wdir.bin",
            NdfdParameter::CriticalFireWeather => "ds.critfireo.bin",
            NdfdParameter::DryThunderstorm => "ds.dryfireo.bin",
            NdfdParameter::ConvectiveHazard => "ds.conhazo.bin",
        }
    }

    /// GRIB2 short name of the field inside the file.
    pub fn grib_name(self) -> &'static str {
        match self {
            NdfdParameter::MaxRelativeHumidity => "MAXRH",
            NdfdParameter::MinRelativeHumidity => "MINRH",
            NdfdParameter::MaxTemperature => "TMAX",
            NdfdParameter::MinTemperature => "TMIN",
            NdfdParameter::RelativeHumidity => "RH",
            NdfdParameter::Temperature => "TMP",
            NdfdParameter::WindSpeed => "WIND",
            NdfdParameter::WindGust => "GUST",
            NdfdParameter::WindDirection => "WDIR",
            NdfdParameter::CriticalFireWeather => "FIREOLK",
            NdfdParameter::DryThunderstorm => "FIREODT",
            NdfdParameter::ConvectiveHazard => "CONHAZO",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            NdfdParameter::MaxRelativeHumidity => "Maximum relative humidity",
            NdfdParameter::MinRelativeHumidity => "Minimum relative humidity",
            NdfdParameter::MaxTemperature => "Maximum temperature",
            NdfdParameter::MinTemperature => "Minimum temperature",
            NdfdParameter::RelativeHumidity => "Relative humidity",
            NdfdParameter::Temperature => "Temperature",
            NdfdParameter::WindSpeed => "Wind speed",
            NdfdParameter::WindGust => "Wind gust",
            NdfdParameter::WindDirection => "Wind direction",
            NdfdParameter::CriticalFireWeather => "Critical fire weather outlook",
            NdfdParameter::DryThunderstorm => "Dry thunderstorm outlook",
            NdfdParameter::ConvectiveHazard => "Convective hazard outlook",
        }
    }

    /// Server file name without its `.bin` extension.
    pub fn stem(self) -> &'static str {
        let name = self.file_name();
        name.strip_suffix(".bin").unwrap_or(name)
    }

    /// Cache name of the short-range payload, e.g. `ds.maxrh_short.bin`.
    pub fn short_cache_name(self) -> String {
        format!("{}_short.bin", self.stem())
    }

    /// Cache name of the extended-range payload, e.g. `ds.maxrh_extended.bin`.
    pub fn extended_cache_name(self) -> String {
        format!("{}_extended.bin", self.stem())
    }
}

impl FromStr for NdfdParameter {
    type Err = FetchError;

    /// Accepts the server file name (`ds.maxrh.bin`), matched exactly.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NdfdParameter::ALL
            .into_iter()
            .find(|p| p.file_name() == s)
            .ok_or_else(|| FetchError::UnknownParameter(s.to_string()))
    }
}

impl fmt::Display for NdfdParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_table_is_consistent() {
        let files: HashSet<_> = NdfdParameter::ALL.iter().map(|p| p.file_name()).collect();
        let grib_names: HashSet<_> = NdfdParameter::ALL.iter().map(|p| p.grib_name()).collect();
        assert_eq!(files.len(), NdfdParameter::ALL.len());
        assert_eq!(grib_names.len(), NdfdParameter::ALL.len());

        for parameter in NdfdParameter::ALL {
            assert_eq!(parameter.file_name().parse::<NdfdParameter>().unwrap(), parameter);
            assert_ne!(parameter.short_cache_name(), parameter.extended_cache_name());
        }
    }

    #[test]
    fn test_cache_names() {
        let p = NdfdParameter::MaxRelativeHumidity;
        assert_eq!(p.short_cache_name(), "ds.maxrh_short.bin");
        assert_eq!(p.extended_cache_name(), "ds.maxrh_extended.bin");
        assert_eq!(NdfdParameter::ConvectiveHazard.stem(), "ds.conhazo");
    }

    #[test]
    fn test_unknown_parameter() {
        for bad in ["ds.snow.bin", "DS.MAXRH.BIN", "maxrh", ""] {
            match bad.parse::<NdfdParameter>() {
                Err(FetchError::UnknownParameter(name)) => assert_eq!(name, bad),
                other => panic!("expected UnknownParameter for {:?}, got {:?}", bad, other),
            }
        }
    }
}
