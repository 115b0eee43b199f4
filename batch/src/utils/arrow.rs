use arrow::array::{Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, SchemaRef};
use arrow::record_batch::RecordBatch;
use common::{Error, Result};

/// Reads a column as optional strings, whatever its string encoding.
pub fn string_values(batch: &RecordBatch, column: &str) -> Result<Vec<Option<String>>> {
    let index = batch.schema().index_of(column)?;
    let array = cast(batch.column(index), &DataType::Utf8)?;
    let strings = array
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| Error::SchemaMismatch(format!("column '{}' is not a string", column)))?;

    Ok(strings
        .iter()
        .map(|value| value.map(|s| s.to_string()))
        .collect())
}

/// Re-labels batches with `schema`. Column types must already match.
pub fn conform_batches(schema: &SchemaRef, batches: Vec<RecordBatch>) -> Result<Vec<RecordBatch>> {
    batches
        .into_iter()
        .map(|batch| {
            RecordBatch::try_new(schema.clone(), batch.columns().to_vec()).map_err(|e| {
                Error::SchemaMismatch(format!("batch does not fit target schema: {}", e))
            })
        })
        .collect()
}

pub fn row_count(batches: &[RecordBatch]) -> usize {
    batches.iter().map(|b| b.num_rows()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int32Array, StringViewArray};
    use arrow::datatypes::{Field, Schema};
    use std::sync::Arc;

    #[test]
    fn test_string_values_handles_views_and_nulls() {
        let schema = Arc::new(Schema::new(vec![Field::new("s", DataType::Utf8View, true)]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(StringViewArray::from(vec![Some("a"), None]))],
        )
        .unwrap();

        let values = string_values(&batch, "s").unwrap();
        assert_eq!(values, vec![Some("a".to_string()), None]);
        assert!(string_values(&batch, "missing").is_err());
    }

    #[test]
    fn test_conform_batches() {
        let source = Arc::new(Schema::new(vec![Field::new("n", DataType::Int32, false)]));
        let target: SchemaRef = Arc::new(Schema::new(vec![Field::new("n", DataType::Int32, true)]));
        let batch =
            RecordBatch::try_new(source, vec![Arc::new(Int32Array::from(vec![1, 2, 3]))]).unwrap();

        let conformed = conform_batches(&target, vec![batch.clone(), batch]).unwrap();
        assert_eq!(conformed[0].schema(), target);
        assert_eq!(row_count(&conformed), 6);

        let wrong: SchemaRef = Arc::new(Schema::new(vec![Field::new("n", DataType::Utf8, true)]));
        assert!(conform_batches(&wrong, conformed).is_err());
    }
}
