use common::config::S3Settings;
use common::{Error, Result};
use datafusion::execution::context::SessionContext;
use object_store::ObjectStore;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::path::Path;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// A root location (local directory or S3 prefix) and the store that serves it.
#[derive(Clone)]
pub struct StorageLocation {
    url: Url,
    store: Arc<dyn ObjectStore>,
    root: Path,
}

impl StorageLocation {
    /// Accepts a plain filesystem path, a `file://` URL or an `s3://bucket/prefix` URL.
    pub fn parse(location: &str, s3: Option<&S3Settings>) -> Result<Self> {
        let url = parse_location_url(location)?;

        let store: Arc<dyn ObjectStore> = match url.scheme() {
            "file" => Arc::new(LocalFileSystem::new()),
            "s3" => Arc::new(build_s3_store(&url, s3)?),
            other => {
                return Err(Error::InvalidUri(format!(
                    "Unsupported scheme '{}' in location '{}'",
                    other, location
                )));
            }
        };
        let root = Path::from_url_path(url.path())?;

        Ok(Self { url, store, root })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `scheme://authority` the store is registered under.
    pub fn store_url(&self) -> Result<Url> {
        let url = format!("{}://{}", self.url.scheme(), self.url.host_str().unwrap_or(""));
        Ok(Url::parse(&url)?)
    }

    /// Fully qualified URL of an object in this store, readable by DataFusion.
    pub fn object_url(&self, path: &Path) -> String {
        format!(
            "{}://{}/{}",
            self.url.scheme(),
            self.url.host_str().unwrap_or(""),
            path
        )
    }

    pub fn register(&self, ctx: &SessionContext) -> Result<()> {
        let store_url = self.store_url()?;
        debug!(url = %store_url, "Registering object store");
        ctx.runtime_env()
            .register_object_store(&store_url, self.store.clone());
        Ok(())
    }
}

fn parse_location_url(location: &str) -> Result<Url> {
    match Url::parse(location) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let path = std::path::absolute(location)?;
            Url::from_file_path(&path).map_err(|_| {
                Error::InvalidUri(format!("Cannot convert '{}' to a file URL", location))
            })
        }
        Err(e) => Err(e.into()),
    }
}

fn build_s3_store(url: &Url, s3: Option<&S3Settings>) -> Result<object_store::aws::AmazonS3> {
    let bucket = url
        .host_str()
        .ok_or_else(|| Error::InvalidUri(format!("S3 location '{}' has no bucket", url)))?;

    let builder = match s3 {
        Some(settings) => AmazonS3Builder::new()
            .with_region(&settings.region)
            .with_access_key_id(&settings.access_key)
            .with_secret_access_key(&settings.secret_key)
            .with_endpoint(&settings.endpoint)
            .with_allow_http(true),
        None => AmazonS3Builder::from_env(),
    };

    Ok(builder.with_bucket_name(bucket).build()?)
}
