//! Pulls named dimensions out of a self-describing array file.

use crate::dataset::dimension::{AttributeMap, DatasetRecord, DimensionData};
use crate::dataset::error::DatasetError;
use log::debug;
use std::collections::BTreeMap;

/// A catalog of named dimensions and variables, each with values and attributes.
pub trait ArraySource {
    /// Names in the file's catalog.
    fn variable_names(&self) -> Result<Vec<String>, DatasetError>;

    /// Reads one entry in full, or `Ok(None)` if the catalog has no such name.
    fn read_variable(&self, name: &str) -> Result<Option<DimensionData>, DatasetError>;
}

impl<T: ArraySource + ?Sized> ArraySource for &T {
    fn variable_names(&self) -> Result<Vec<String>, DatasetError> {
        (**self).variable_names()
    }

    fn read_variable(&self, name: &str) -> Result<Option<DimensionData>, DatasetError> {
        (**self).read_variable(name)
    }
}

impl<T: ArraySource + ?Sized> ArraySource for Box<T> {
    fn variable_names(&self) -> Result<Vec<String>, DatasetError> {
        (**self).variable_names()
    }

    fn read_variable(&self, name: &str) -> Result<Option<DimensionData>, DatasetError> {
        (**self).read_variable(name)
    }
}

/// Reads every requested name from `source` into a [`DatasetRecord`].
///
/// Duplicate names collapse into one entry. Either every name is read or the first
/// missing one is reported as [`DatasetError::DimensionNotFound`].
///
/// ```
/// use iridl::{read, AttributeMap, MemoryArrayFile};
///
/// let file = MemoryArrayFile::new().with_variable(
///     "T",
///     vec![0.0, 1.0],
///     [("units", "months since 1960-01-01")].into_iter().collect::<AttributeMap>(),
/// );
/// let record = read(&file, ["T"])?;
/// assert_eq!(record.get("T").unwrap().len(), 2);
/// # Ok::<(), iridl::DatasetError>(())
/// ```
pub fn read<S, I, N>(source: &S, dims: I) -> Result<DatasetRecord, DatasetError>
where
    S: ArraySource + ?Sized,
    I: IntoIterator<Item = N>,
    N: AsRef<str>,
{
    let mut entries = BTreeMap::new();
    for name in dims {
        let name = name.as_ref();
        if entries.contains_key(name) {
            continue;
        }
        let Some(data) = source.read_variable(name)? else {
            debug!(
                "'{}' not in file, which has {:?}",
                name,
                source.variable_names().unwrap_or_default()
            );
            return Err(DatasetError::DimensionNotFound(name.to_string()));
        };
        debug!(
            "Read '{}' ({} values, {} attributes)",
            name,
            data.len(),
            data.attributes.len()
        );
        entries.insert(name.to_string(), data);
    }
    Ok(DatasetRecord::from_entries(entries))
}

/// An array file held in memory. Handy for fixtures and for sources that are not files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryArrayFile {
    variables: BTreeMap<String, DimensionData>,
}

impl MemoryArrayFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variable(
        mut self,
        name: impl Into<String>,
        values: Vec<f64>,
        attributes: AttributeMap,
    ) -> Self {
        self.variables
            .insert(name.into(), DimensionData::new(values, attributes));
        self
    }
}

impl ArraySource for MemoryArrayFile {
    fn variable_names(&self) -> Result<Vec<String>, DatasetError> {
        Ok(self.variables.keys().cloned().collect())
    }

    fn read_variable(&self, name: &str) -> Result<Option<DimensionData>, DatasetError> {
        Ok(self.variables.get(name).cloned())
    }
}
