//! Common test fixtures for firewx tests.

/// Reference times used by the retrieval scenarios.
pub mod time {
    /// A fixed reference time for tests (2024-01-15T12:00:00Z)
    pub const REFERENCE_TIME: &str = "2024-01-15T12:00:00Z";

    /// The only Alaska analysis published in the fallback scenario
    pub const AK_PUBLISHED_CURRENT: &str = "2024-01-15T09:00:00Z";

    /// Its 24-hour-prior counterpart
    pub const AK_PUBLISHED_PRIOR: &str = "2024-01-14T09:00:00Z";
}

/// NDFD request fixtures.
pub mod ndfd {
    pub const CONUS_SCOPE: &str = "AR.conus";
    pub const ALASKA_SCOPE: &str = "AR.alaska";
    pub const MAXRH: &str = "ds.maxrh.bin";
    pub const MAXT: &str = "ds.maxt.bin";

    /// GRIB2 (category, number) for maximum relative humidity
    pub const MAXRH_PARAMETER: (u8, u8) = (1, 27);

    /// Statistical process code for a maximum over the interval
    pub const MAXIMUM: u8 = 2;
}
