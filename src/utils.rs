use crate::catalog::error::CatalogError;
use log::info;
use std::io;
use std::path::{Path, PathBuf};

const CACHE_DIR_NAME: &str = "catalog_agg_cache";

pub fn get_cache_dir() -> Result<PathBuf, CatalogError> {
    dirs::cache_dir()
        .map(|p| p.join(CACHE_DIR_NAME))
        .ok_or(CatalogError::CacheDirResolution)
}

pub async fn ensure_cache_dir_exists(path: &Path) -> Result<(), CatalogError> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => {
            if !metadata.is_dir() {
                return Err(CatalogError::CacheDirNotADirectory(path.to_path_buf()));
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating cache directory: {}", path.display());
            tokio::fs::create_dir_all(path)
                .await
                .map_err(|e| CatalogError::CacheDirCreation(path.to_path_buf(), e))
        }
        Err(e) => Err(CatalogError::CacheDirCreation(path.to_path_buf(), e)),
    }
}

/// File name a catalog URL is cached under.
///
/// Encodes everything after the scheme (host, port, path and query; the
/// fragment is dropped), so distinct URLs never share a cache file. `/` becomes
/// `__`, other bytes outside `[A-Za-z0-9.-]` become `_XX` hex escapes.
pub(crate) fn cache_file_name(url: &str) -> String {
    let without_fragment = url.split('#').next().unwrap_or(url);
    let location = without_fragment
        .split_once("://")
        .map_or(without_fragment, |(_, rest)| rest)
        .trim_end_matches('/');
    if location.is_empty() {
        return "catalog.json".to_string();
    }

    let mut name = String::with_capacity(location.len());
    for byte in location.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'.' | b'-' => name.push(char::from(byte)),
            b'/' => name.push_str("__"),
            other => name.push_str(&format!("_{other:02X}")),
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_file_name() {
        assert_eq!(
            cache_file_name("https://mikejohnson51.github.io/opendap.catalog/cat_params.json"),
            "mikejohnson51.github.io__opendap.catalog__cat_params.json"
        );
        assert_eq!(
            cache_file_name("https://example.org:8080/cat_grids.json.gz?v=2#top"),
            "example.org_3A8080__cat_grids.json.gz_3Fv_3D2"
        );
        assert_eq!(cache_file_name("https://"), "catalog.json");
    }

    #[test]
    fn test_cache_file_name_distinguishes_hosts_and_paths() {
        let names = [
            cache_file_name("https://a.org/x/cat_params.json"),
            cache_file_name("https://b.org/x/cat_params.json"),
            cache_file_name("https://a.org/y/cat_params.json"),
            cache_file_name("https://a.org/x_cat_params.json"),
            cache_file_name("https://a.org/x/cat_params.json?v=2"),
        ];
        for (i, a) in names.iter().enumerate() {
            for b in &names[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[tokio::test]
    async fn test_ensure_cache_dir_exists_creates_nested() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        ensure_cache_dir_exists(&nested).await.unwrap();
        assert!(nested.is_dir());
        // second call is a no-op
        ensure_cache_dir_exists(&nested).await.unwrap();
    }

    #[tokio::test]
    async fn test_ensure_cache_dir_rejects_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let result = ensure_cache_dir_exists(file.path()).await;
        assert!(matches!(result, Err(CatalogError::CacheDirNotADirectory(_))));
    }
}
