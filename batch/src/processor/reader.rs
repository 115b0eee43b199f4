use crate::models::schema::{SalesSchemaVersion, get_sales_schema};
use crate::processor::locator::RawPartition;
use crate::storage::StorageLocation;
use arrow::array::{ArrayRef, StringBuilder};
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use common::{Error, Result};
use datafusion::datasource::MemTable;
use datafusion::logical_expr::try_cast;
use datafusion::prelude::*;
use glob::Pattern;
use object_store::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shell-style file name pattern (`*`, `?` and `[...]`).
#[derive(Debug, Clone)]
pub struct FilePattern {
    pattern: Pattern,
}

impl FilePattern {
    pub fn new(glob: &str) -> Result<Self> {
        let pattern = Pattern::new(glob)
            .map_err(|e| Error::InvalidInput(format!("invalid file pattern '{}': {}", glob, e)))?;
        Ok(Self { pattern })
    }

    pub fn glob(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.pattern.matches(file_name)
    }
}

pub struct SalesReader {
    ctx: Arc<SessionContext>,
    raw: StorageLocation,
    pattern: FilePattern,
}

impl SalesReader {
    pub fn new(ctx: Arc<SessionContext>, raw: StorageLocation, pattern: FilePattern) -> Result<Self> {
        raw.register(&ctx)?;
        Ok(Self { ctx, raw, pattern })
    }

    /// The partition's files that match the pattern, sorted.
    pub fn matching_files(&self, partition: &RawPartition) -> Result<Vec<Path>> {
        let mut files: Vec<Path> = partition
            .objects
            .iter()
            .filter(|meta| {
                meta.location
                    .filename()
                    .map(|name| self.pattern.matches(name))
                    .unwrap_or(false)
            })
            .map(|meta| meta.location.clone())
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(Error::NoRawFiles {
                path: partition.url.clone(),
                pattern: self.pattern.glob().to_string(),
            });
        }
        Ok(files)
    }

    pub fn file_url(&self, file: &Path) -> String {
        self.raw.object_url(file)
    }

    /// Parses the files positionally as text, one frame partition per file,
    /// then coerces each column to its declared type.
    pub async fn read(&self, files: &[Path]) -> Result<DataFrame> {
        info!(files = files.len(), pattern = %self.pattern.glob(), "Reading raw sales files");

        let schema: SchemaRef = Arc::new(get_sales_schema(SalesSchemaVersion::RawText).clone());
        let mut partitions = Vec::with_capacity(files.len());
        for file in files {
            let url = self.file_url(file);
            let bytes = self.raw.store().get(file).await?.bytes().await?;
            let parsed = parse_text_batch(&schema, &bytes)?;

            debug!(file = %url, rows = parsed.batch.num_rows(), "Raw input");
            if parsed.ragged_rows > 0 {
                warn!(
                    file = %url,
                    ragged_rows = parsed.ragged_rows,
                    "Rows with a wrong field count were kept, missing fields set to NULL"
                );
            }
            partitions.push(vec![parsed.batch]);
        }

        let table = MemTable::try_new(schema, partitions)?;
        let df = self.ctx.read_table(Arc::new(table))?;
        coerce_to_schema(df)
    }
}

pub struct ParsedText {
    pub batch: RecordBatch,
    /// Records whose field count differed from the schema.
    pub ragged_rows: usize,
}

/// Reads CSV with a header row into text columns by position. Empty fields
/// and fields missing from short records are NULL, fields past the last
/// column are ignored.
pub fn parse_text_batch(schema: &SchemaRef, data: &[u8]) -> Result<ParsedText> {
    let width = schema.fields().len();
    let mut builders: Vec<StringBuilder> = (0..width).map(|_| StringBuilder::new()).collect();
    let mut ragged_rows = 0;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    for record in reader.byte_records() {
        let record =
            record.map_err(|e| Error::InvalidInput(format!("unreadable CSV record: {}", e)))?;
        if record.len() != width {
            ragged_rows += 1;
        }
        for (i, builder) in builders.iter_mut().enumerate() {
            match record.get(i) {
                Some(field) if !field.is_empty() => {
                    builder.append_value(String::from_utf8_lossy(field))
                }
                _ => builder.append_null(),
            }
        }
    }

    let columns: Vec<ArrayRef> = builders
        .iter_mut()
        .map(|builder| Arc::new(builder.finish()) as ArrayRef)
        .collect();
    Ok(ParsedText {
        batch: RecordBatch::try_new(schema.clone(), columns)?,
        ragged_rows,
    })
}

/// `TRY_CAST` every column to the raw sales schema; values that do not
/// convert become NULL and the row is kept.
pub fn coerce_to_schema(df: DataFrame) -> Result<DataFrame> {
    let select_exprs: Vec<Expr> = get_sales_schema(SalesSchemaVersion::Raw)
        .fields()
        .iter()
        .map(|field| try_cast(col(field.name()), field.data_type().clone()).alias(field.name()))
        .collect();

    Ok(df.select(select_exprs)?)
}
