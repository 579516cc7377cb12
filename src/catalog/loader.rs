use crate::catalog::error::CatalogError;
use crate::catalog::records::{GridRecord, GridTable, ParamRecord, ParamTable};
use crate::utils::{cache_file_name, ensure_cache_dir_exists};
use async_compression::tokio::bufread::GzipDecoder;
use futures_util::TryStreamExt;
use log::{info, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, AsyncRead, AsyncReadExt};
use tokio_util::io::StreamReader;

/// Parameter catalog of the OPeNDAP catalog project.
pub const PARAMS_URL: &str = "https://mikejohnson51.github.io/opendap.catalog/cat_params.json";
/// Grid catalog of the OPeNDAP catalog project.
pub const GRIDS_URL: &str = "https://mikejohnson51.github.io/opendap.catalog/cat_grids.json";

/// The two catalog tables, loaded once and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalogs {
    pub params: ParamTable,
    pub grids: GridTable,
}

/// Fetches both catalogs with a fresh loader and no cache.
///
/// One GET per URL, no retry.
pub async fn load_catalogs(param_url: &str, grid_url: &str) -> Result<Catalogs, CatalogError> {
    CatalogLoader::new().load(param_url, grid_url).await
}

/// Downloads and parses catalog payloads, optionally keeping the raw JSON on disk.
#[derive(Debug, Clone)]
pub struct CatalogLoader {
    client: Client,
    cache_dir: Option<PathBuf>,
}

impl Default for CatalogLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogLoader {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            cache_dir: None,
        }
    }

    /// A loader that stores each downloaded catalog in `cache_dir` and reads it
    /// back on later runs instead of fetching it again.
    pub fn with_cache_folder(cache_dir: PathBuf) -> Self {
        Self {
            client: Client::new(),
            cache_dir: Some(cache_dir),
        }
    }

    pub async fn load(&self, param_url: &str, grid_url: &str) -> Result<Catalogs, CatalogError> {
        let params = self.table::<ParamRecord>(param_url).await?;
        let grids = self.table::<GridRecord>(grid_url).await?;
        info!(
            "Loaded {} parameter rows and {} grid rows",
            params.len(),
            grids.len()
        );
        Ok(Catalogs {
            params: ParamTable::new(params),
            grids: GridTable::new(grids),
        })
    }

    /// Parses a parameter catalog payload (a JSON array of records).
    pub fn parse_params(bytes: &[u8], source: &str) -> Result<ParamTable, CatalogError> {
        parse_records(bytes, source).map(ParamTable::new)
    }

    /// Parses a grid catalog payload (a JSON array of records).
    pub fn parse_grids(bytes: &[u8], source: &str) -> Result<GridTable, CatalogError> {
        parse_records(bytes, source).map(GridTable::new)
    }

    async fn table<R>(&self, url: &str) -> Result<Vec<R>, CatalogError>
    where
        R: DeserializeOwned + Send + 'static,
    {
        let Some(cache_dir) = &self.cache_dir else {
            let bytes = self.download(url).await?;
            return parse_blocking::<R>(bytes, url).await.map(|(rows, _)| rows);
        };

        let cache_file = cache_dir.join(cache_file_name(url));
        if tokio::fs::metadata(&cache_file).await.is_ok() {
            info!("Cache hit for catalog {} at {:?}", url, cache_file);
            let bytes = tokio::fs::read(&cache_file)
                .await
                .map_err(|e| CatalogError::CacheRead(cache_file.clone(), e))?;
            match parse_blocking::<R>(bytes, url).await {
                Ok((rows, _)) => return Ok(rows),
                Err(CatalogError::JsonParse(_, e)) => {
                    warn!(
                        "Cached catalog {:?} is unreadable ({}). Downloading again.",
                        cache_file, e
                    );
                }
                Err(e) => return Err(e),
            }
        } else {
            warn!("Cache miss for catalog {}. Downloading.", url);
        }

        let bytes = self.download(url).await?;
        let (rows, bytes) = parse_blocking::<R>(bytes, url).await?;
        ensure_cache_dir_exists(cache_dir).await?;
        write_atomic(&cache_file, &bytes).await?;
        info!("Cached catalog {} to {:?}", url, cache_file);
        Ok(rows)
    }

    /// Downloads a catalog, gunzipping it when the URL ends in `.gz`.
    async fn download(&self, url: &str) -> Result<Vec<u8>, CatalogError> {
        info!("Downloading catalog from {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogError::NetworkRequest(url.to_string(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(if let Some(status) = e.status() {
                    CatalogError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    }
                } else {
                    CatalogError::NetworkRequest(url.to_string(), e)
                });
            }
        };

        let stream = response
            .bytes_stream()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e));
        let stream_reader = StreamReader::new(stream);
        let bytes = if is_gzipped(url) {
            gunzip(stream_reader).await
        } else {
            read_all(stream_reader).await
        }
        .map_err(|e| CatalogError::DownloadIo(url.to_string(), e))?;

        info!("Downloaded {} bytes from {}", bytes.len(), url);
        Ok(bytes)
    }
}

fn parse_records<R: DeserializeOwned>(bytes: &[u8], source: &str) -> Result<Vec<R>, CatalogError> {
    serde_json::from_slice::<Vec<R>>(bytes)
        .map_err(|e| CatalogError::JsonParse(source.to_string(), e))
}

/// Parses on a blocking task, handing the payload back for caching.
async fn parse_blocking<R>(bytes: Vec<u8>, url: &str) -> Result<(Vec<R>, Vec<u8>), CatalogError>
where
    R: DeserializeOwned + Send + 'static,
{
    let source = url.to_string();
    let parse_start = std::time::Instant::now();
    let (rows, bytes) = tokio::task::spawn_blocking(move || {
        parse_records::<R>(&bytes, &source).map(|rows| (rows, bytes))
    })
    .await??;
    info!(
        "Parsed {} catalog rows from {} in {:?}",
        rows.len(),
        url,
        parse_start.elapsed()
    );
    Ok((rows, bytes))
}

/// Writes `path` through a sibling temporary file and a rename, so readers
/// never see a partially written cache file.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CatalogError> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let partial = path.with_file_name(format!(".{}.{}.part", file_name, std::process::id()));

    if let Err(e) = tokio::fs::write(&partial, bytes).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(CatalogError::CacheWrite(path.to_path_buf(), e));
    }
    tokio::fs::rename(&partial, path)
        .await
        .map_err(|e| CatalogError::CacheWrite(path.to_path_buf(), e))
}

fn is_gzipped(url: &str) -> bool {
    url.split(['?', '#'])
        .next()
        .is_some_and(|path| path.ends_with(".gz"))
}

async fn read_all<R: AsyncRead + Unpin>(mut reader: R) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer).await?;
    Ok(buffer)
}

async fn gunzip<R: AsyncBufRead + Unpin>(reader: R) -> io::Result<Vec<u8>> {
    read_all(GzipDecoder::new(reader)).await
}
