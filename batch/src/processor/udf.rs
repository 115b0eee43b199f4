use crate::processor::rules::{self, AddressPart, OFFER_TIERS};
use common::{Error, Result};
use datafusion::arrow::array::{Array, ArrayRef, BooleanArray, Int32Array, StringArray};
use datafusion::arrow::compute::cast;
use datafusion::arrow::datatypes::DataType;
use datafusion::common::DataFusionError;
use datafusion::execution::context::SessionContext;
use datafusion::logical_expr::{ColumnarValue, ScalarUDF, Volatility, create_udf};
use std::sync::Arc;

pub const DISCOUNT_TIER: &str = "discount_tier";

/// Registers the derived-column UDFs with the SessionContext
pub fn register_udfs(ctx: &SessionContext) -> Result<()> {
    ctx.register_udf(discount_tier_udf());
    for part in AddressPart::ALL {
        ctx.register_udf(address_component_udf(part));
    }
    Ok(())
}

/// `discount_tier(offer_1, ..., offer_5) -> Int32`
pub fn discount_tier_udf() -> ScalarUDF {
    create_udf(
        DISCOUNT_TIER,
        vec![DataType::Boolean; OFFER_TIERS.len()],
        DataType::Int32,
        Volatility::Immutable,
        Arc::new(|args: &[ColumnarValue]| {
            compute_discount(args).map_err(|e| DataFusionError::Internal(e.to_string()))
        }),
    )
}

/// `address_<part>(shipping_address) -> Utf8`, NULL unless the address has
/// exactly four segments.
pub fn address_component_udf(part: AddressPart) -> ScalarUDF {
    create_udf(
        part.udf_name(),
        vec![DataType::Utf8],
        DataType::Utf8,
        Volatility::Immutable,
        Arc::new(move |args: &[ColumnarValue]| {
            extract_address_part(args, part).map_err(|e| DataFusionError::Internal(e.to_string()))
        }),
    )
}

fn compute_discount(args: &[ColumnarValue]) -> Result<ColumnarValue> {
    if args.len() != OFFER_TIERS.len() {
        return Err(Error::InvalidInput(format!(
            "{} expects {} offer flags, got {}",
            DISCOUNT_TIER,
            OFFER_TIERS.len(),
            args.len()
        )));
    }

    let arrays = ColumnarValue::values_to_arrays(args)?;
    let flags = arrays
        .iter()
        .map(|array| {
            array
                .as_any()
                .downcast_ref::<BooleanArray>()
                .ok_or_else(|| Error::InvalidInput("Expected boolean array".to_string()))
        })
        .collect::<Result<Vec<_>>>()?;

    let num_rows = arrays.first().map(|a| a.len()).unwrap_or(0);
    let result: Int32Array = (0..num_rows)
        .map(|row| {
            let offers: Vec<Option<bool>> = flags
                .iter()
                .map(|flag| flag.is_valid(row).then(|| flag.value(row)))
                .collect();
            Some(rules::discount_for(&offers))
        })
        .collect();

    Ok(ColumnarValue::Array(Arc::new(result)))
}

fn extract_address_part(args: &[ColumnarValue], part: AddressPart) -> Result<ColumnarValue> {
    let arrays = ColumnarValue::values_to_arrays(args)?;
    let addresses: ArrayRef = match arrays.first() {
        Some(array) => cast(array, &DataType::Utf8)?,
        None => return Err(Error::InvalidInput("Expected address argument".to_string())),
    };
    let str_array = addresses
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| Error::InvalidInput("Expected string array".to_string()))?;

    let result: StringArray = str_array
        .iter()
        .map(|opt_str| {
            opt_str
                .and_then(|s| rules::decompose_address(s).ok())
                .map(|address| address.part(part).to_string())
        })
        .collect();

    Ok(ColumnarValue::Array(Arc::new(result)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bools(values: Vec<Option<bool>>) -> ColumnarValue {
        ColumnarValue::Array(Arc::new(BooleanArray::from(values)))
    }

    #[test]
    fn test_compute_discount() {
        let args = vec![
            bools(vec![Some(true), Some(false), None, Some(true)]),
            bools(vec![Some(false), Some(false), None, Some(true)]),
            bools(vec![Some(true), Some(false), None, Some(false)]),
            bools(vec![Some(false), Some(false), None, Some(false)]),
            bools(vec![Some(false), Some(false), None, Some(true)]),
        ];

        let result = compute_discount(&args).unwrap();

        if let ColumnarValue::Array(array) = result {
            let discounts = array.as_any().downcast_ref::<Int32Array>().unwrap();
            assert_eq!(discounts.len(), 4);
            assert_eq!(discounts.value(0), 15);
            assert_eq!(discounts.value(1), 0);
            assert_eq!(discounts.value(2), 0);
            assert_eq!(discounts.value(3), 25);
            assert_eq!(discounts.null_count(), 0);
        } else {
            panic!("Expected Array result");
        }
    }

    #[test]
    fn test_compute_discount_rejects_wrong_arity() {
        let args = vec![bools(vec![Some(true)])];
        assert!(compute_discount(&args).is_err());
    }

    #[test]
    fn test_extract_address_part() {
        let input = StringArray::from(vec![
            Some("123 Main St/Springfield/IL/62704"),
            Some("only/three/parts"),
            None,
        ]);
        let args = [ColumnarValue::Array(Arc::new(input))];

        let city = extract_address_part(&args, AddressPart::City).unwrap();
        let postal = extract_address_part(&args, AddressPart::PostalCode).unwrap();

        match (city, postal) {
            (ColumnarValue::Array(city), ColumnarValue::Array(postal)) => {
                let city = city.as_any().downcast_ref::<StringArray>().unwrap();
                let postal = postal.as_any().downcast_ref::<StringArray>().unwrap();
                assert_eq!(city.value(0), "Springfield");
                assert_eq!(postal.value(0), "62704");
                assert!(city.is_null(1));
                assert!(postal.is_null(1));
                assert!(city.is_null(2));
            }
            _ => panic!("Expected Array result"),
        }
    }

    #[tokio::test]
    async fn test_udfs_are_callable_from_sql() {
        let ctx = SessionContext::new();
        register_udfs(&ctx).unwrap();

        let batches = ctx
            .sql(
                "SELECT discount_tier(true, false, true, false, false) AS d, \
                 address_state('1 Elm/Austin/TX/73301') AS s",
            )
            .await
            .unwrap()
            .collect()
            .await
            .unwrap();

        let batch = &batches[0];
        let d = batch.column(0).as_any().downcast_ref::<Int32Array>().unwrap();
        let s = cast(batch.column(1), &DataType::Utf8).unwrap();
        let s = s.as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(d.value(0), 15);
        assert_eq!(s.value(0), "TX");
    }
}
