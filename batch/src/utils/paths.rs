use crate::models::PartitionKey;
use object_store::path::Path;

/// Builds object paths under a storage root.
pub struct PathBuilder {
    root: Path,
    segments: Vec<String>,
    file_name: Option<String>,
}

impl PathBuilder {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.clone(),
            segments: Vec::new(),
            file_name: None,
        }
    }

    pub fn with_segment(mut self, segment: &str) -> Self {
        self.segments.push(segment.to_string());
        self
    }

    /// Landing layout: `<YYYY_MM_DD>/<HH>`
    pub fn with_raw_partition(self, key: &PartitionKey) -> Self {
        self.with_segment(&key.day_dir()).with_segment(&key.hour_dir())
    }

    /// Warehouse layout: `ingest_date=<YYYY_MM_DD>/ingest_hour=<HH>`
    pub fn with_table_partition(self, key: &PartitionKey) -> Self {
        self.with_segment(&format!("ingest_date={}", key.day_dir()))
            .with_segment(&format!("ingest_hour={}", key.hour_dir()))
    }

    pub fn with_file_name(mut self, file_name: &str) -> Self {
        self.file_name = Some(file_name.to_string());
        self
    }

    pub fn build(&self) -> Path {
        let dir = self
            .segments
            .iter()
            .fold(self.root.clone(), |path, segment| path.child(segment.as_str()));
        match &self.file_name {
            Some(file_name) => dir.child(file_name.as_str()),
            None => dir,
        }
    }
}
