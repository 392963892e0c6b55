//! Mapping from friendly variable identifiers to Data Library catalog paths.

use std::collections::BTreeMap;

/// Identifiers shipped with the crate and the catalog path each resolves to.
const BUILTIN_VARIABLES: [(&str, &str); 5] = [
    (
        "air_temperature",
        "NOAA/.NCEP/.CPC/.GHCN_CAMS/.gridded/.deg0p5/.temp",
    ),
    ("precipitation", "NOAA/.NCEP/.CPC/.PRECL/.v1p0/.deg0p5/.rain"),
    ("sea_surface_temperature", "NOAA/.NCDC/.ERSST/.version5/.sst"),
    ("soil_moisture", "NOAA/.NCEP/.CPC/.GMSM/.w"),
    ("ndvi", "USGS/.LandDAAC/.MODIS/.version_006/.SAF/.NDVI"),
];

/// The enumerated set of variables a query may select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableCatalog {
    paths: BTreeMap<String, String>,
}

impl VariableCatalog {
    /// A catalog with no entries.
    pub fn empty() -> Self {
        Self {
            paths: BTreeMap::new(),
        }
    }

    /// Adds or replaces an entry. The path is written without the leading `/.`.
    pub fn with_entry(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.paths.insert(name.into(), path.into());
        self
    }

    pub fn path_for(&self, name: &str) -> Option<&str> {
        self.paths.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.paths.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.paths.keys().map(String::as_str)
    }
}

impl Default for VariableCatalog {
    fn default() -> Self {
        BUILTIN_VARIABLES
            .iter()
            .fold(Self::empty(), |catalog, (name, path)| {
                catalog.with_entry(*name, *path)
            })
    }
}
