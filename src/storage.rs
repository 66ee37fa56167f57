//! # Storage Abstraction Module
//!
//! This module provides a unified interface for reading and writing raw bytes from the
//! places meteorological datasets live: the local filesystem, plain HTTP(S) endpoints and
//! Amazon S3. The backend is chosen from the shape of the path.
//!
//! ## Path Patterns
//!
//! - **S3 paths**: `s3://bucket-name/path/to/file.csv`
//! - **HTTP paths**: `https://host/path/to/file.csv` (read-only)
//! - **Local paths**: `/absolute/path/to/file.csv` or `relative/path/to/file.csv`
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use metsource::storage::{StorageFactory, StorageBackend};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let storage = StorageFactory::from_path("s3://my-bucket/tracks.csv").await?;
//!     let data = storage.read("s3://my-bucket/tracks.csv").await?;
//!     storage.write("s3://my-bucket/tracks-copy.csv", &data).await?;
//!     Ok(())
//! }
//! ```

use aws_config::BehaviorVersion;
use aws_sdk_s3::Client as S3Client;
use log::debug;
use std::path::Path;
use thiserror::Error;
use tokio::fs;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP request to {url} failed with status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("AWS S3 GetObject error: {0}")]
    S3GetObject(#[from] aws_sdk_s3::error::SdkError<aws_sdk_s3::operation::get_object::GetObjectError>),

    #[error("AWS S3 PutObject error: {0}")]
    S3PutObject(#[from] aws_sdk_s3::error::SdkError<aws_sdk_s3::operation::put_object::PutObjectError>),

    #[error("AWS S3 HeadObject error: {0}")]
    S3HeadObject(#[from] aws_sdk_s3::error::SdkError<aws_sdk_s3::operation::head_object::HeadObjectError>),

    #[error("AWS ByteStream error: {0}")]
    ByteStream(String),

    #[error("Invalid S3 path format: {0}")]
    InvalidS3Path(String),

    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Operation not supported: {0}")]
    Unsupported(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait defining the interface for storage backends
///
/// All operations are async so local, HTTP and S3 access share one calling convention.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Reads the entire contents of the object at `path`
    async fn read(&self, path: &str) -> StorageResult<Vec<u8>>;

    /// Writes `data` to `path`, creating or replacing it
    async fn write(&self, path: &str, data: &[u8]) -> StorageResult<()>;

    /// Checks whether an object exists at `path`
    async fn exists(&self, path: &str) -> StorageResult<bool>;
}

/// Local filesystem storage backend
#[derive(Debug, Clone)]
pub struct LocalStorage;

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        match fs::read(path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::PathNotFound(path.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                Err(StorageError::PermissionDenied(path.to_string()))
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn write(&self, path: &str, data: &[u8]) -> StorageResult<()> {
        if let Some(parent) = Path::new(path).parent() {
            fs::create_dir_all(parent).await.map_err(StorageError::Io)?;
        }

        match fs::write(path, data).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                Err(StorageError::PermissionDenied(path.to_string()))
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        match fs::metadata(path).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}

/// Read-only HTTP(S) storage backend
///
/// Objects are fetched with a single GET; no retries are attempted.
#[derive(Debug, Clone)]
pub struct HttpStorage {
    client: reqwest::Client,
}

impl HttpStorage {
    pub fn new() -> StorageResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("metsource/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(HttpStorage { client })
    }
}

#[async_trait::async_trait]
impl StorageBackend for HttpStorage {
    async fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        debug!("GET {}", path);
        let response = self.client.get(path).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StorageError::PathNotFound(path.to_string()));
        }
        if !status.is_success() {
            return Err(StorageError::HttpStatus {
                url: path.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn write(&self, path: &str, _data: &[u8]) -> StorageResult<()> {
        Err(StorageError::Unsupported(format!(
            "cannot write to HTTP location {}",
            path
        )))
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        let response = self.client.head(path).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(true)
        } else if status == reqwest::StatusCode::NOT_FOUND {
            Ok(false)
        } else {
            Err(StorageError::HttpStatus {
                url: path.to_string(),
                status: status.as_u16(),
            })
        }
    }
}

/// Amazon S3 storage backend
///
/// Credentials are loaded from the environment, the AWS credentials file or an IAM role.
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: S3Client,
}

impl S3Storage {
    /// Creates a new S3Storage instance with the default AWS configuration chain
    pub async fn new() -> StorageResult<Self> {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        let client = S3Client::new(&config);

        Ok(S3Storage { client })
    }

    /// Parses an S3 path into bucket and key components
    ///
    /// # Errors
    /// Returns `StorageError::InvalidS3Path` unless the path is `s3://bucket/key`
    /// with a non-empty bucket and key.
    fn parse_s3_path(s3_path: &str) -> StorageResult<(String, String)> {
        let Some(path_without_scheme) = s3_path.strip_prefix("s3://") else {
            return Err(StorageError::InvalidS3Path(format!(
                "S3 path must start with 's3://': {}",
                s3_path
            )));
        };

        match path_without_scheme.split_once('/') {
            Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => {
                Ok((bucket.to_string(), key.to_string()))
            }
            _ => Err(StorageError::InvalidS3Path(format!(
                "Invalid S3 path format. Expected 's3://bucket/key': {}",
                s3_path
            ))),
        }
    }
}

#[async_trait::async_trait]
impl StorageBackend for S3Storage {
    async fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        let (bucket, key) = Self::parse_s3_path(path)?;

        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| match &e {
                aws_sdk_s3::error::SdkError::ServiceError(service_err)
                    if service_err.err().is_no_such_key() =>
                {
                    StorageError::PathNotFound(path.to_string())
                }
                _ => StorageError::S3GetObject(e),
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::ByteStream(e.to_string()))?
            .into_bytes()
            .to_vec();

        Ok(data)
    }

    async fn write(&self, path: &str, data: &[u8]) -> StorageResult<()> {
        let (bucket, key) = Self::parse_s3_path(path)?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(aws_sdk_s3::primitives::ByteStream::from(data.to_vec()))
            .send()
            .await
            .map_err(StorageError::S3PutObject)?;

        Ok(())
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        let (bucket, key) = Self::parse_s3_path(path)?;

        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(aws_sdk_s3::error::SdkError::ServiceError(service_err))
                if service_err.err().is_not_found() =>
            {
                Ok(false)
            }
            Err(e) => Err(StorageError::S3HeadObject(e)),
        }
    }
}

/// Storage backend enumeration
#[derive(Debug)]
pub enum Storage {
    Local(LocalStorage),
    Http(HttpStorage),
    S3(S3Storage),
}

#[async_trait::async_trait]
impl StorageBackend for Storage {
    async fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        match self {
            Storage::Local(storage) => storage.read(path).await,
            Storage::Http(storage) => storage.read(path).await,
            Storage::S3(storage) => storage.read(path).await,
        }
    }

    async fn write(&self, path: &str, data: &[u8]) -> StorageResult<()> {
        match self {
            Storage::Local(storage) => storage.write(path, data).await,
            Storage::Http(storage) => storage.write(path, data).await,
            Storage::S3(storage) => storage.write(path, data).await,
        }
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        match self {
            Storage::Local(storage) => storage.exists(path).await,
            Storage::Http(storage) => storage.exists(path).await,
            Storage::S3(storage) => storage.exists(path).await,
        }
    }
}

/// Factory for creating storage backends based on path patterns
///
/// - Paths starting with `s3://` use [`S3Storage`]
/// - Paths starting with `http://` or `https://` use [`HttpStorage`]
/// - Everything else uses [`LocalStorage`]
pub struct StorageFactory;

impl StorageFactory {
    /// Creates a storage backend based on the path format
    ///
    /// ```rust,no_run
    /// use metsource::storage::StorageFactory;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let remote = StorageFactory::from_path("https://example.org/tracks.csv").await?;
    ///     let local = StorageFactory::from_path("/data/forecast_error.csv").await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn from_path(path: &str) -> StorageResult<Storage> {
        if Self::is_s3_path(path) {
            let s3_storage = S3Storage::new().await?;
            Ok(Storage::S3(s3_storage))
        } else if Self::is_http_path(path) {
            Ok(Storage::Http(HttpStorage::new()?))
        } else {
            Ok(Storage::Local(LocalStorage))
        }
    }

    pub fn is_s3_path(path: &str) -> bool {
        path.starts_with("s3://")
    }

    pub fn is_http_path(path: &str) -> bool {
        path.starts_with("http://") || path.starts_with("https://")
    }

    pub fn is_local_path(path: &str) -> bool {
        !Self::is_s3_path(path) && !Self::is_http_path(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_local_storage_write_read() -> Result<(), Box<dyn std::error::Error>> {
        let storage = LocalStorage;
        let temp_dir = TempDir::new()?;
        let file_path = temp_dir.path().join("nested").join("forecast_error.csv");
        let file_path_str = file_path.to_str().unwrap();

        let test_data = b"step,error\n0,0.5\n";

        storage.write(file_path_str, test_data).await?;

        let read_data = storage.read(file_path_str).await?;
        assert_eq!(read_data, test_data);

        assert!(storage.exists(file_path_str).await?);

        Ok(())
    }

    #[tokio::test]
    async fn test_local_storage_not_found() -> Result<(), Box<dyn std::error::Error>> {
        let storage = LocalStorage;

        let result = storage.read("/nonexistent/path/soil_temperature.csv").await;
        assert!(matches!(result, Err(StorageError::PathNotFound(_))));

        assert!(!storage.exists("/nonexistent/path/soil_temperature.csv").await?);

        Ok(())
    }

    #[test]
    fn test_s3_path_parsing() {
        let (bucket, key) = S3Storage::parse_s3_path("s3://my-bucket/path/to/file.csv").unwrap();
        assert_eq!(bucket, "my-bucket");
        assert_eq!(key, "path/to/file.csv");

        let (bucket, key) = S3Storage::parse_s3_path("s3://bucket/file.csv").unwrap();
        assert_eq!(bucket, "bucket");
        assert_eq!(key, "file.csv");

        assert!(S3Storage::parse_s3_path("http://bucket/file.csv").is_err());
        assert!(S3Storage::parse_s3_path("s3://").is_err());
        assert!(S3Storage::parse_s3_path("s3://bucket").is_err());
        assert!(S3Storage::parse_s3_path("s3://bucket/").is_err());
        assert!(S3Storage::parse_s3_path("s3:///file.csv").is_err());
    }

    #[tokio::test]
    async fn test_storage_factory_path_detection() -> Result<(), Box<dyn std::error::Error>> {
        assert!(StorageFactory::is_s3_path("s3://my-bucket/file.csv"));
        assert!(!StorageFactory::is_s3_path("/local/path/file.csv"));

        assert!(StorageFactory::is_http_path("https://www.ncei.noaa.gov/data/x.csv"));
        assert!(StorageFactory::is_http_path("http://localhost:8080/x.csv"));
        assert!(!StorageFactory::is_http_path("relative/http/file.csv"));

        assert!(StorageFactory::is_local_path("/local/path/file.csv"));
        assert!(StorageFactory::is_local_path("relative/path/file.csv"));
        assert!(!StorageFactory::is_local_path("s3://my-bucket/file.csv"));
        assert!(!StorageFactory::is_local_path("https://example.org/file.csv"));

        let local_storage = StorageFactory::from_path("/local/path/file.csv").await?;
        assert!(matches!(local_storage, Storage::Local(_)));

        let http_storage = StorageFactory::from_path("https://example.org/file.csv").await?;
        assert!(matches!(http_storage, Storage::Http(_)));

        Ok(())
    }

    #[tokio::test]
    async fn test_http_storage_rejects_writes() -> Result<(), Box<dyn std::error::Error>> {
        let storage = Storage::Http(HttpStorage::new()?);
        let result = storage.write("https://example.org/out.csv", b"x").await;
        assert!(matches!(result, Err(StorageError::Unsupported(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_storage_enum_local_operations() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let file_path = temp_dir.path().join("tracks.csv");
        let file_path_str = file_path.to_str().unwrap();

        let storage = Storage::Local(LocalStorage);
        let test_data = b"SID,SEASON\n1989001S12155,1989\n";

        storage.write(file_path_str, test_data).await?;
        let read_data = storage.read(file_path_str).await?;
        assert_eq!(read_data, test_data);

        assert!(storage.exists(file_path_str).await?);

        Ok(())
    }
}
