//! Retrieval configuration, loadable from YAML.
//!
//! ```yaml
//! cache_dir: "NWS Data"
//! rtma:
//!   base_url: http://nomads.ncep.noaa.gov:80/dods
//!   variables: [tmp2m, dpt2m]
//! ndfd:
//!   base_url: https://tgftp.nws.noaa.gov/SL.us008001/ST.opnl/DF.gr2/DC.ndfd/
//! ```
//!
//! Every field is optional and falls back to its default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FetchError, FetchResult};

pub const DEFAULT_CACHE_DIR: &str = "NWS Data";
pub const DEFAULT_RTMA_URL: &str = "http://nomads.ncep.noaa.gov:80/dods";
pub const DEFAULT_NDFD_URL: &str = "https://tgftp.nws.noaa.gov/SL.us008001/ST.opnl/DF.gr2/DC.ndfd/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Scratch directory for downloaded NDFD payloads
    pub cache_dir: PathBuf,
    pub rtma: RtmaConfig,
    pub ndfd: NdfdConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RtmaConfig {
    /// Root of the GrADS-DODS server
    pub base_url: String,
    /// Analysis variables to read from each dataset
    pub variables: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NdfdConfig {
    /// Root of the NDFD GRIB2 archive, ending in `/`
    pub base_url: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            rtma: RtmaConfig::default(),
            ndfd: NdfdConfig::default(),
        }
    }
}

impl Default for RtmaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_RTMA_URL.to_string(),
            variables: ["tmp2m", "dpt2m", "ugrd10m", "vgrd10m", "wind10m", "gust10m"]
                .iter()
                .map(|v| v.to_string())
                .collect(),
        }
    }
}

impl Default for NdfdConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_NDFD_URL.to_string(),
        }
    }
}

impl RetrievalConfig {
    pub fn from_yaml(yaml: &str) -> FetchResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| FetchError::Config(e.to_string()))
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> FetchResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FetchError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config = Self::from_yaml(&content).map_err(|e| match e {
            FetchError::Config(reason) => {
                FetchError::Config(format!("Failed to parse {}: {}", path.display(), reason))
            }
            other => other,
        })?;

        debug!(path = %path.display(), "Loaded retrieval config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RetrievalConfig::default();
        assert_eq!(config.cache_dir, PathBuf::from("NWS Data"));
        assert_eq!(config.rtma.base_url, "http://nomads.ncep.noaa.gov:80/dods");
        assert_eq!(config.rtma.variables.len(), 6);
        assert!(config.ndfd.base_url.ends_with("/DC.ndfd/"));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = RetrievalConfig::from_yaml(
            "cache_dir: /tmp/firewx\nrtma:\n  variables: [tmp2m]\n",
        )
        .unwrap();

        assert_eq!(config.cache_dir, PathBuf::from("/tmp/firewx"));
        assert_eq!(config.rtma.variables, vec!["tmp2m"]);
        assert_eq!(config.rtma.base_url, DEFAULT_RTMA_URL);
        assert_eq!(config.ndfd, NdfdConfig::default());
    }

    #[test]
    fn test_invalid_yaml() {
        let err = RetrievalConfig::from_yaml("rtma: [not, a, map]").unwrap_err();
        assert!(matches!(err, FetchError::Config(_)));
    }
}
