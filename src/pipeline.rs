//! Query to table: fetch, read, normalize, assemble.

use crate::dataset::dimension::DatasetRecord;
use crate::dataset::reader::read;
use crate::dataset::tabular::{assemble, TabularRecord};
use crate::error::IridlError;
use crate::fetch::fetcher::DataFetcher;
use crate::query::state::QueryState;
use crate::query::tag::TagKind;
use log::{debug, warn};
use tokio::task;

/// Fetches `query` and reads `dims` from the result.
///
/// Reading happens on the blocking pool. The fetched handle is dropped there as soon
/// as the read finishes, whether it succeeded or not.
pub(crate) async fn fetch_record<F: DataFetcher>(
    fetcher: &F,
    query: &QueryState,
    dims: Vec<String>,
) -> Result<DatasetRecord, IridlError> {
    if !query.has_kind(TagKind::VariableSelect) {
        warn!("Query {} selects no variable", query);
    }
    let url = query.to_url();
    let file = fetcher.fetch(&url).await?;
    debug!("Fetched {}, reading {:?}", url, dims);

    let record = task::spawn_blocking(move || {
        let record = read(&file, &dims);
        drop(file);
        record
    })
    .await??;
    Ok(record)
}

/// Fetches `query` and assembles a date-indexed table.
///
/// `value_dimensions` defaults to the file names of the query's selected variables.
pub(crate) async fn materialize<F: DataFetcher>(
    fetcher: &F,
    query: &QueryState,
    time_dimension: &str,
    value_dimensions: Option<Vec<String>>,
) -> Result<TabularRecord, IridlError> {
    let mut dims = value_dimensions
        .unwrap_or_else(|| query.data_variables().map(str::to_string).collect());
    dims.push(time_dimension.to_string());

    let record = fetch_record(fetcher, query, dims).await?;
    let time_dimension = time_dimension.to_string();
    let table = task::spawn_blocking(move || assemble(&record, &time_dimension)).await??;
    debug!("Assembled {} rows for {}", table.len(), query);
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::dimension::AttributeMap;
    use crate::dataset::reader::MemoryArrayFile;
    use crate::error::ErrorKind;
    use crate::fetch::error::FetchError;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    struct FixtureFetcher {
        file: MemoryArrayFile,
        last_query: Mutex<Option<String>>,
    }

    impl FixtureFetcher {
        fn new(file: MemoryArrayFile) -> Self {
            Self {
                file,
                last_query: Mutex::new(None),
            }
        }
    }

    impl DataFetcher for FixtureFetcher {
        type File = MemoryArrayFile;

        async fn fetch(&self, query: &str) -> Result<MemoryArrayFile, FetchError> {
            *self.last_query.lock().unwrap() = Some(query.to_string());
            Ok(self.file.clone())
        }
    }

    fn fixture() -> MemoryArrayFile {
        let time_attrs: AttributeMap = [("units", "days since 2000-01-01")].into_iter().collect();
        let temp_attrs: AttributeMap = [("missing_value", "-999")].into_iter().collect();
        MemoryArrayFile::new()
            .with_variable("T", vec![0.0, 1.0, 2.0], time_attrs)
            .with_variable("temp", vec![12.5, -999.0, 14.0], temp_attrs)
            .with_variable("rain", vec![0.0, 0.2, 1.4], AttributeMap::new())
    }

    #[tokio::test]
    async fn test_materialize_uses_selected_variables() -> Result<(), IridlError> {
        let fetcher = FixtureFetcher::new(fixture());
        let query = QueryState::base()
            .with_variable("air_temperature")?
            .filter_point(10.0, 20.0)?;

        let table = materialize(&fetcher, &query, "T", None).await?;

        assert_eq!(
            fetcher.last_query.lock().unwrap().as_deref(),
            Some(query.to_url().as_str())
        );
        assert_eq!(table.date_column(), "T");
        assert_eq!(table.dates()[2], NaiveDate::from_ymd_opt(2000, 1, 3).unwrap());
        assert_eq!(table.column_names().collect::<Vec<_>>(), ["temp"]);
        assert_eq!(table.column("temp"), Some(&[Some(12.5), None, Some(14.0)][..]));
        Ok(())
    }

    #[tokio::test]
    async fn test_materialize_with_explicit_dimensions() -> Result<(), IridlError> {
        let fetcher = FixtureFetcher::new(fixture());
        let query = QueryState::base().with_variable("air_temperature")?;

        let table = materialize(
            &fetcher,
            &query,
            "T",
            Some(vec!["rain".to_string(), "temp".to_string()]),
        )
        .await?;
        assert_eq!(table.column_names().collect::<Vec<_>>(), ["rain", "temp"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_dimension_is_not_found() -> Result<(), IridlError> {
        let fetcher = FixtureFetcher::new(fixture());
        let query = QueryState::base().with_variable("ndvi")?;

        let err = materialize(&fetcher, &query, "T", None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("NDVI"));
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_record_reads_requested_names() -> Result<(), IridlError> {
        let fetcher = FixtureFetcher::new(fixture());
        let query = QueryState::base().with_variable("precipitation")?;

        let record = fetch_record(&fetcher, &query, vec!["rain".to_string()]).await?;
        assert_eq!(record.names().collect::<Vec<_>>(), ["rain"]);
        Ok(())
    }
}
