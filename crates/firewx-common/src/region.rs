//! Forecast regions served by the retrieval layer.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Geographic region of a request.
///
/// Parsing never fails: unrecognized identifiers fall back to CONUS, and
/// matching is case-insensitive so `"AK"` and `"ak"` are the same region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Region {
    #[default]
    Conus,
    Alaska,
    Hawaii,
}

impl Region {
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "ak" | "alaska" => Region::Alaska,
            "hi" | "hawaii" => Region::Hawaii,
            _ => Region::Conus,
        }
    }

    pub fn is_alaska(self) -> bool {
        self == Region::Alaska
    }

    /// Dataset code used by the RTMA OPeNDAP server.
    pub fn rtma_code(self) -> &'static str {
        match self {
            Region::Conus => "rtma2p5",
            Region::Alaska => "akrtma",
            Region::Hawaii => "hirtma",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Region::Conus => "CONUS",
            Region::Alaska => "AK",
            Region::Hawaii => "HI",
        }
    }
}

impl FromStr for Region {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Region::from_code(s))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive() {
        assert_eq!(Region::from_code("AK"), Region::Alaska);
        assert_eq!(Region::from_code("ak"), Region::Alaska);
        assert_eq!(Region::from_code("Hi"), Region::Hawaii);
    }

    #[test]
    fn test_unknown_falls_back_to_conus() {
        assert_eq!(Region::from_code("CA"), Region::Conus);
        assert_eq!(Region::from_code(""), Region::Conus);
        assert_eq!("xyz".parse::<Region>().unwrap(), Region::Conus);
    }

    #[test]
    fn test_rtma_codes() {
        assert_eq!(Region::Conus.rtma_code(), "rtma2p5");
        assert_eq!(Region::Alaska.rtma_code(), "akrtma");
        assert_eq!(Region::Hawaii.rtma_code(), "hirtma");
    }
}
