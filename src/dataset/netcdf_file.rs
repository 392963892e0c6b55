//! netCDF-backed [`ArraySource`], available with the `netcdf` feature.
//!
//! The `netcdf` crate wraps libnetcdf, so the library must be installed on the system.

use crate::dataset::dimension::{AttributeMap, DimensionData};
use crate::dataset::error::DatasetError;
use crate::dataset::reader::ArraySource;
use crate::query::url::format_decimal;
use log::warn;
use netcdf::AttributeValue;
use std::path::{Path, PathBuf};

pub struct NetcdfArrayFile {
    path: PathBuf,
    file: netcdf::File,
}

impl NetcdfArrayFile {
    pub fn open(path: &Path) -> Result<Self, DatasetError> {
        let file = netcdf::open(path)
            .map_err(|e| DatasetError::Open(path.to_path_buf(), e.to_string()))?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ArraySource for NetcdfArrayFile {
    fn variable_names(&self) -> Result<Vec<String>, DatasetError> {
        Ok(self.file.variables().map(|var| var.name()).collect())
    }

    fn read_variable(&self, name: &str) -> Result<Option<DimensionData>, DatasetError> {
        let Some(var) = self.file.variable(name) else {
            return Ok(None);
        };

        let values: Vec<f64> =
            var.get_values(..)
                .map_err(|e| DatasetError::VariableRead {
                    name: name.to_string(),
                    message: e.to_string(),
                })?;

        let mut attributes = AttributeMap::new();
        for attr in var.attributes() {
            match attr.value() {
                Ok(value) => {
                    attributes.insert(attr.name(), attribute_to_string(value));
                }
                Err(e) => warn!(
                    "Skipping unreadable attribute '{}' on '{}' in {:?}: {}",
                    attr.name(),
                    name,
                    self.path,
                    e
                ),
            }
        }

        Ok(Some(DimensionData::new(values, attributes)))
    }
}

/// Attribute values are kept as plain strings; arrays are comma-joined.
fn attribute_to_string(value: AttributeValue) -> String {
    fn join<T: Copy + Into<f64>>(values: &[T]) -> String {
        values
            .iter()
            .map(|&v| format_decimal(v.into()))
            .collect::<Vec<_>>()
            .join(",")
    }

    match value {
        AttributeValue::Str(s) => s,
        AttributeValue::Strs(items) => items.join(","),
        AttributeValue::Uchar(v) => v.to_string(),
        AttributeValue::Schar(v) => v.to_string(),
        AttributeValue::Ushort(v) => v.to_string(),
        AttributeValue::Short(v) => v.to_string(),
        AttributeValue::Uint(v) => v.to_string(),
        AttributeValue::Int(v) => v.to_string(),
        AttributeValue::Ulonglong(v) => v.to_string(),
        AttributeValue::Longlong(v) => v.to_string(),
        AttributeValue::Float(v) => format_decimal(v.into()),
        AttributeValue::Double(v) => format_decimal(v),
        AttributeValue::Uchars(v) => join(&v),
        AttributeValue::Schars(v) => join(&v),
        AttributeValue::Ushorts(v) => join(&v),
        AttributeValue::Shorts(v) => join(&v),
        AttributeValue::Uints(v) => join(&v),
        AttributeValue::Ints(v) => join(&v),
        AttributeValue::Floats(v) => join(&v),
        AttributeValue::Doubles(v) => join(&v),
        other => format!("{:?}", other),
    }
}

/// Writes a five-month `T`/`temp` file used by tests across the crate.
#[cfg(test)]
pub(crate) fn write_fixture(path: &Path) -> Result<(), netcdf::Error> {
    let mut file = netcdf::create(path)?;
    file.add_dimension("T", 5)?;
    let mut time = file.add_variable::<f64>("T", &["T"])?;
    time.put_attribute("units", "months since 1960-01-01")?;
    time.put_attribute("long_name", "Time")?;
    time.put_values(&[0.0, 1.0, 2.0, 3.0, 4.0], ..)?;

    let mut temp = file.add_variable::<f32>("temp", &["T"])?;
    temp.put_attribute("units", "Celsius_scale")?;
    temp.put_attribute("missing_value", -999.0f32)?;
    temp.put_values(&[1.0f32, 2.5, -999.0, 4.0, 5.0], ..)?;
    Ok(())
}
