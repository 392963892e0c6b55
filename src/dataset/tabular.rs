//! Joins aligned dimensions into rows keyed by calendar date.

use crate::dataset::dimension::{DatasetRecord, DimensionData};
use crate::dataset::error::DatasetError;
use crate::dataset::time::TimeEncoding;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// One row: the date plus every value column at the same index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabularRow {
    pub date: NaiveDate,
    pub values: BTreeMap<String, Option<f64>>,
}

/// Column-aligned time series: one date column and any number of value columns,
/// all of the same length. Missing-value sentinels are stored as `None`.
///
/// Deserializing checks the same length invariant as [`assemble_columns`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTabularRecord")]
pub struct TabularRecord {
    date_column: String,
    dates: Vec<NaiveDate>,
    columns: Vec<(String, Vec<Option<f64>>)>,
}

#[derive(Deserialize)]
struct RawTabularRecord {
    date_column: String,
    dates: Vec<NaiveDate>,
    columns: Vec<(String, Vec<Option<f64>>)>,
}

impl TryFrom<RawTabularRecord> for TabularRecord {
    type Error = DatasetError;

    fn try_from(raw: RawTabularRecord) -> Result<Self, Self::Error> {
        let expected = raw.dates.len();
        if let Some((column, values)) = raw.columns.iter().find(|(_, v)| v.len() != expected) {
            return Err(DatasetError::LengthMismatch {
                column: column.clone(),
                expected,
                found: values.len(),
            });
        }
        Ok(Self {
            date_column: raw.date_column,
            dates: raw.dates,
            columns: raw.columns,
        })
    }
}

impl TabularRecord {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn date_column(&self) -> &str {
        &self.date_column
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Value column names, without the date column.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, values)| values.as_slice())
    }

    pub fn rows(&self) -> impl Iterator<Item = TabularRow> + '_ {
        self.dates.iter().enumerate().map(|(i, &date)| TabularRow {
            date,
            values: self
                .columns
                .iter()
                .map(|(name, values)| (name.clone(), values[i]))
                .collect(),
        })
    }

    /// A polars frame with a `Date` column followed by nullable `f64` value columns.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let mut columns = Vec::with_capacity(self.columns.len() + 1);
        columns.push(Column::new(self.date_column.as_str().into(), &self.dates));
        for (name, values) in &self.columns {
            columns.push(Column::new(name.as_str().into(), values));
        }
        DataFrame::new(columns)
    }

    pub fn lazy(&self) -> PolarsResult<LazyFrame> {
        Ok(self.to_dataframe()?.lazy())
    }

    /// Rows as JSON objects, dates as `YYYY-MM-DD` under the date column's name.
    pub fn to_json(&self) -> Value {
        let rows = self
            .dates
            .iter()
            .enumerate()
            .map(|(i, date)| {
                let mut row = Map::new();
                row.insert(self.date_column.clone(), json!(date.to_string()));
                for (name, values) in &self.columns {
                    row.insert(name.clone(), json!(values[i]));
                }
                Value::Object(row)
            })
            .collect();
        Value::Array(rows)
    }
}

/// Normalizes the `date_column` entry of `record` and aligns every other entry with it.
///
/// # Errors
///
/// [`DatasetError::DimensionNotFound`] if `record` has no `date_column`, any time format
/// error from [`TimeEncoding`], or [`DatasetError::LengthMismatch`] if a value column's
/// length differs from the date column's.
pub fn assemble(record: &DatasetRecord, date_column: &str) -> Result<TabularRecord, DatasetError> {
    let time = record
        .get(date_column)
        .ok_or_else(|| DatasetError::DimensionNotFound(date_column.to_string()))?;
    let dates = TimeEncoding::from_dimension(date_column, time)?
        .resolve_all(&time.values)?
        .into_iter()
        .map(|dt| dt.date())
        .collect();
    let columns = record
        .iter()
        .filter(|(name, _)| name.as_str() != date_column)
        .map(|(name, data)| (name.as_str(), data));
    assemble_columns(date_column, dates, columns)
}

/// Aligns already-normalized dates with value columns, keeping the given order.
pub fn assemble_columns<'a, I>(
    date_column: &str,
    dates: Vec<NaiveDate>,
    columns: I,
) -> Result<TabularRecord, DatasetError>
where
    I: IntoIterator<Item = (&'a str, &'a DimensionData)>,
{
    let expected = dates.len();
    let columns = columns
        .into_iter()
        .map(|(name, data)| {
            if data.len() != expected {
                return Err(DatasetError::LengthMismatch {
                    column: name.to_string(),
                    expected,
                    found: data.len(),
                });
            }
            Ok((name.to_string(), data.masked_values()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TabularRecord {
        date_column: date_column.to_string(),
        dates,
        columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::dimension::AttributeMap;
    use crate::dataset::reader::{read, MemoryArrayFile};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn monthly_file(temp: Vec<f64>) -> MemoryArrayFile {
        MemoryArrayFile::new()
            .with_variable(
                "T",
                vec![0.0, 1.0, 2.0, 3.0, 4.0],
                [("units", "months since 1960-01-01")].into_iter().collect(),
            )
            .with_variable(
                "temp",
                temp,
                [("units", "Celsius_scale"), ("missing_value", "-999")]
                    .into_iter()
                    .collect(),
            )
    }

    #[test]
    fn test_assemble_rows_in_order() -> Result<(), Box<dyn std::error::Error>> {
        let record = read(&monthly_file(vec![-3.0, -999.0, 1.0, 7.5, 13.0]), ["T", "temp"])?;
        let table = assemble(&record, "T")?;

        assert_eq!(table.len(), 5);
        assert_eq!(table.date_column(), "T");
        assert_eq!(table.column_names().collect::<Vec<_>>(), ["temp"]);
        assert_eq!(table.dates()[4], date(1960, 5, 1));
        assert_eq!(
            table.column("temp"),
            Some(&[Some(-3.0), None, Some(1.0), Some(7.5), Some(13.0)][..])
        );

        let rows: Vec<TabularRow> = table.rows().collect();
        assert_eq!(rows[2].date, date(1960, 3, 1));
        assert_eq!(rows[2].values["temp"], Some(1.0));
        Ok(())
    }

    #[test]
    fn test_length_mismatch_is_alignment_error() -> Result<(), DatasetError> {
        let record = read(&monthly_file(vec![1.0, 2.0, 3.0, 4.0]), ["T", "temp"])?;
        let err = assemble(&record, "T").unwrap_err();
        assert!(err.is_alignment());
        assert!(matches!(
            err,
            DatasetError::LengthMismatch { ref column, expected: 5, found: 4 } if column == "temp"
        ));
        Ok(())
    }

    #[test]
    fn test_missing_date_column() -> Result<(), DatasetError> {
        let record = read(&monthly_file(vec![0.0; 5]), ["temp"])?;
        assert!(assemble(&record, "T").unwrap_err().is_not_found());
        Ok(())
    }

    #[test]
    fn test_date_column_without_units_is_named() {
        let record: DatasetRecord = [(
            "time".to_string(),
            DimensionData::new(vec![0.0], AttributeMap::new()),
        )]
        .into_iter()
        .collect();
        assert!(matches!(
            assemble(&record, "time"),
            Err(DatasetError::MissingUnits(Some(name))) if name == "time"
        ));
    }

    #[test]
    fn test_date_only_record() -> Result<(), DatasetError> {
        let record = read(&monthly_file(vec![0.0; 5]), ["T"])?;
        let table = assemble(&record, "T")?;
        assert_eq!(table.len(), 5);
        assert_eq!(table.column_names().count(), 0);
        Ok(())
    }

    #[test]
    fn test_to_dataframe() -> Result<(), Box<dyn std::error::Error>> {
        let record = read(&monthly_file(vec![-3.0, -999.0, 1.0, 7.5, 13.0]), ["T", "temp"])?;
        let df = assemble(&record, "T")?.to_dataframe()?;

        assert_eq!(df.shape(), (5, 2));
        assert_eq!(df.column("T")?.dtype(), &DataType::Date);
        assert_eq!(df.column("temp")?.dtype(), &DataType::Float64);
        assert_eq!(df.column("temp")?.null_count(), 1);

        let warm = assemble(&record, "T")?
            .lazy()?
            .filter(col("temp").gt(lit(5.0)))
            .collect()?;
        assert_eq!(warm.height(), 2);
        Ok(())
    }

    #[test]
    fn test_to_json() -> Result<(), DatasetError> {
        let record = read(&monthly_file(vec![-3.0, -999.0, 1.0, 7.5, 13.0]), ["T", "temp"])?;
        let json = assemble(&record, "T")?.to_json();
        assert_eq!(json[0]["T"], "1960-01-01");
        assert_eq!(json[0]["temp"], -3.0);
        assert!(json[1]["temp"].is_null());
        assert_eq!(json.as_array().map(Vec::len), Some(5));
        Ok(())
    }

    #[test]
    fn test_serde_round_trip() -> Result<(), Box<dyn std::error::Error>> {
        let record = read(&monthly_file(vec![-3.0, -999.0, 1.0, 7.5, 13.0]), ["T", "temp"])?;
        let table = assemble(&record, "T")?;
        let restored: TabularRecord = serde_json::from_str(&serde_json::to_string(&table)?)?;
        assert_eq!(restored, table);
        Ok(())
    }

    #[test]
    fn test_deserialize_rejects_misaligned_columns() {
        let json = r#"{"date_column":"T","dates":["1960-01-01","1960-02-01"],"columns":[["temp",[1.0]]]}"#;
        let err = serde_json::from_str::<TabularRecord>(json).unwrap_err();
        assert!(err
            .to_string()
            .contains("Column 'temp' has 1 values but the date column has 2"));
    }

    #[test]
    fn test_assemble_columns_keeps_given_order() -> Result<(), DatasetError> {
        let b = DimensionData::new(vec![1.0], AttributeMap::new());
        let a = DimensionData::new(vec![2.0], AttributeMap::new());
        let table = assemble_columns("date", vec![date(2000, 1, 1)], [("b", &b), ("a", &a)])?;
        assert_eq!(table.column_names().collect::<Vec<_>>(), ["b", "a"]);
        Ok(())
    }
}
