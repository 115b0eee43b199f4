use crate::models::PartitionKey;
use crate::storage::StorageLocation;
use crate::utils::paths::PathBuilder;
use common::{Error, Result};
use object_store::ObjectMeta;
use object_store::path::Path;
use tracing::{info, warn};

/// A raw partition that was found and listed.
#[derive(Debug, Clone)]
pub struct RawPartition {
    pub key: PartitionKey,
    pub path: Path,
    pub url: String,
    /// Objects directly inside the partition directory.
    pub objects: Vec<ObjectMeta>,
}

pub struct PartitionLocator {
    raw: StorageLocation,
}

impl PartitionLocator {
    pub fn new(raw: StorageLocation) -> Self {
        Self { raw }
    }

    pub fn partition_path(&self, key: &PartitionKey) -> Path {
        PathBuilder::new(self.raw.root())
            .with_raw_partition(key)
            .build()
    }

    /// Lists the partition. A missing, empty or unreadable partition is
    /// `PartitionNotFound`.
    pub async fn locate(&self, key: PartitionKey) -> Result<RawPartition> {
        let path = self.partition_path(&key);
        let url = self.raw.object_url(&path);

        let listing = match self.raw.store().list_with_delimiter(Some(&path)).await {
            Ok(listing) => listing,
            Err(e) => {
                warn!(path = %url, error = %e, "Raw partition is not listable");
                return Err(Error::PartitionNotFound { path: url });
            }
        };

        if listing.objects.is_empty() && listing.common_prefixes.is_empty() {
            return Err(Error::PartitionNotFound { path: url });
        }

        info!(
            partition = %key,
            path = %url,
            objects = listing.objects.len(),
            "Located raw partition"
        );

        Ok(RawPartition {
            key,
            path,
            url,
            objects: listing.objects,
        })
    }
}
