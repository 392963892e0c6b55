use crate::config::ClientConfig;
#[cfg(feature = "netcdf")]
use crate::dataset::dimension::DimensionData;
#[cfg(feature = "netcdf")]
use crate::dataset::error::DatasetError;
#[cfg(feature = "netcdf")]
use crate::dataset::netcdf_file::NetcdfArrayFile;
use crate::dataset::reader::ArraySource;
use crate::fetch::error::FetchError;
use crate::query::url::with_data_suffix;
use futures_util::TryStreamExt;
use log::{debug, info, warn};
use reqwest::Client;
use std::future::Future;
use std::path::Path;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tokio_util::io::StreamReader;

/// Turns a generated query into a local, readable array file.
///
/// Implementations append their own data-format suffix. The returned handle owns any
/// temporary resources and must release them when dropped.
pub trait DataFetcher: Send + Sync {
    type File: ArraySource + Send + 'static;

    fn fetch(&self, query: &str) -> impl Future<Output = Result<Self::File, FetchError>> + Send;
}

/// Downloads query results over HTTP into temporary files.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    data_suffix: String,
}

impl HttpFetcher {
    pub fn new(config: &ClientConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(FetchError::ClientBuild)?;
        Ok(Self {
            client,
            data_suffix: config.data_suffix.clone(),
        })
    }

    /// Full URL fetched for `query`.
    pub fn data_url(&self, query: &str) -> String {
        with_data_suffix(query, &self.data_suffix)
    }

    /// Streams the data file for `query` into a temporary file.
    pub async fn download(&self, query: &str) -> Result<DownloadedFile, FetchError> {
        let url = self.data_url(query);
        info!("Downloading data from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::NetworkRequest(url.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(if let Some(status) = e.status() {
                    FetchError::HttpStatus {
                        url,
                        status,
                        source: e,
                    }
                } else {
                    FetchError::NetworkRequest(url, e)
                });
            }
        };

        let temp = tempfile::Builder::new()
            .prefix("iridl-")
            .suffix(".nc")
            .tempfile()
            .map_err(FetchError::TempFile)?;
        let mut file = tokio::fs::File::from_std(temp.reopen().map_err(FetchError::TempFile)?);

        let stream = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
        let reader = StreamReader::new(stream);
        tokio::pin!(reader);
        let size = tokio::io::copy(&mut reader, &mut file)
            .await
            .map_err(|e| FetchError::DownloadIo(url.clone(), e))?;
        file.flush()
            .await
            .map_err(|e| FetchError::DownloadIo(url.clone(), e))?;

        info!("Downloaded {} bytes from {} to {:?}", size, url, temp.path());
        Ok(DownloadedFile { temp, url, size })
    }
}

#[cfg(feature = "netcdf")]
impl DataFetcher for HttpFetcher {
    type File = OpenedDownload;

    async fn fetch(&self, query: &str) -> Result<OpenedDownload, FetchError> {
        let download = self.download(query).await?;
        tokio::task::spawn_blocking(move || OpenedDownload::open(download)).await?
    }
}

/// A downloaded file. The temporary file is deleted when this handle is dropped.
#[derive(Debug)]
pub struct DownloadedFile {
    temp: NamedTempFile,
    url: String,
    size: u64,
}

impl DownloadedFile {
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

impl Drop for DownloadedFile {
    fn drop(&mut self) {
        debug!("Releasing {:?} downloaded from {}", self.temp.path(), self.url);
    }
}

/// A downloaded netCDF file with its handle opened once.
///
/// Fields drop in order, so the handle is closed before the temporary file is removed.
#[cfg(feature = "netcdf")]
pub struct OpenedDownload {
    file: NetcdfArrayFile,
    download: DownloadedFile,
}

#[cfg(feature = "netcdf")]
impl OpenedDownload {
    /// Opens `download` as netCDF. Blocking.
    pub fn open(download: DownloadedFile) -> Result<Self, FetchError> {
        let file = NetcdfArrayFile::open(download.path()).map_err(|source| {
            warn!("Could not open {:?} from {}: {}", download.path(), download.url, source);
            FetchError::Unreadable {
                url: download.url.clone(),
                source,
            }
        })?;
        Ok(Self { file, download })
    }

    pub fn download(&self) -> &DownloadedFile {
        &self.download
    }

    pub fn file(&self) -> &NetcdfArrayFile {
        &self.file
    }
}

#[cfg(feature = "netcdf")]
impl ArraySource for OpenedDownload {
    fn variable_names(&self) -> Result<Vec<String>, DatasetError> {
        self.file.variable_names()
    }

    fn read_variable(&self, name: &str) -> Result<Option<DimensionData>, DatasetError> {
        self.file.read_variable(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_data_url_appends_suffix_once() -> Result<(), FetchError> {
        let config = ClientConfig::builder().data_suffix("data.cdf".to_string()).build();
        let fetcher = HttpFetcher::new(&config)?;
        assert_eq!(fetcher.data_url("http://h/S/.v"), "http://h/S/.v/data.cdf");
        assert_eq!(
            fetcher.data_url("http://h/S/.v/T/12/sum/"),
            "http://h/S/.v/T/12/sum/data.cdf"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() -> Result<(), FetchError> {
        let config = ClientConfig::builder()
            .timeout(Duration::from_millis(500))
            .build();
        let fetcher = HttpFetcher::new(&config)?;
        let err = fetcher
            .download("http://127.0.0.1:9/SOURCES/.x")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::NetworkRequest(url, _) if url.ends_with("/data.nc")));
        Ok(())
    }

    #[cfg(feature = "netcdf")]
    fn downloaded_fixture() -> Result<DownloadedFile, Box<dyn std::error::Error>> {
        let temp = tempfile::Builder::new().suffix(".nc").tempfile()?;
        crate::dataset::netcdf_file::write_fixture(temp.path())?;
        let size = std::fs::metadata(temp.path())?.len();
        Ok(DownloadedFile {
            temp,
            url: "http://h/S/.v/data.nc".to_string(),
            size,
        })
    }

    #[cfg(feature = "netcdf")]
    #[test]
    fn test_opened_download_reads_several_dimensions() -> Result<(), Box<dyn std::error::Error>> {
        let opened = OpenedDownload::open(downloaded_fixture()?)?;
        let path = opened.download().path().to_path_buf();

        let record = crate::dataset::reader::read(&opened, ["T", "temp"])?;
        assert_eq!(record.len(), 2);
        assert_eq!(opened.file().path(), path.as_path());

        drop(opened);
        assert!(!path.exists());
        Ok(())
    }

    #[cfg(feature = "netcdf")]
    #[test]
    fn test_unreadable_download_is_reported() -> Result<(), Box<dyn std::error::Error>> {
        let mut temp = tempfile::Builder::new().suffix(".nc").tempfile()?;
        std::io::Write::write_all(&mut temp, b"<html>Error 500</html>")?;
        let download = DownloadedFile {
            temp,
            url: "http://h/S/.v/data.nc".to_string(),
            size: 22,
        };
        let err = OpenedDownload::open(download).err().ok_or("open should fail")?;
        assert!(matches!(err, FetchError::Unreadable { ref url, .. } if url.ends_with("data.nc")));
        Ok(())
    }
}
