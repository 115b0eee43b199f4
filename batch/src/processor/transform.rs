use crate::models::schema::{
    DISCOUNT_COLUMN, SHIPPING_ADDRESS_COLUMN, SalesSchemaVersion, TOTAL_PRICE_COLUMN,
    get_sales_schema,
};
use crate::processor::rules::{AddressPart, OFFER_TIERS};
use crate::processor::udf::{self, DISCOUNT_TIER};
use arrow::datatypes::DataType;
use common::Result;
use datafusion::logical_expr::cast;
use datafusion::prelude::*;

/// Adds the derived fact columns to a raw sales frame.
///
/// Every step is a column expression, so DataFusion evaluates it per record
/// across all input partitions.
pub struct SalesTransformer;

impl SalesTransformer {
    /// Registers the rule UDFs the expressions below resolve by name.
    pub fn new(ctx: &SessionContext) -> Result<Self> {
        udf::register_udfs(ctx)?;
        Ok(Self)
    }

    pub fn transform(&self, df: DataFrame) -> Result<DataFrame> {
        let df = with_discount(df)?;
        let df = with_total_price(df)?;
        let df = with_address_parts(df)?;
        project_fact_columns(df)
    }
}

pub fn with_discount(df: DataFrame) -> Result<DataFrame> {
    let discount_tier = df.registry().udf(DISCOUNT_TIER)?;
    let offers: Vec<Expr> = OFFER_TIERS.iter().map(|(offer, _)| col(*offer)).collect();
    Ok(df.with_column(DISCOUNT_COLUMN, discount_tier.call(offers))?)
}

/// `units * unit_price * (1 - discount / 100)`, requires `discount`.
pub fn with_total_price(df: DataFrame) -> Result<DataFrame> {
    let total_price = cast(col("units"), DataType::Float64)
        * col("unit_price")
        * (lit(1.0_f64) - cast(col(DISCOUNT_COLUMN), DataType::Float64) / lit(100.0_f64));
    Ok(df.with_column(TOTAL_PRICE_COLUMN, total_price)?)
}

pub fn with_address_parts(df: DataFrame) -> Result<DataFrame> {
    let mut df = df;
    for part in AddressPart::ALL {
        let extract = df.registry().udf(part.udf_name())?;
        df = df.with_column(part.column(), extract.call(vec![col(SHIPPING_ADDRESS_COLUMN)]))?;
    }
    Ok(df)
}

pub fn project_fact_columns(df: DataFrame) -> Result<DataFrame> {
    let columns: Vec<&str> = get_sales_schema(SalesSchemaVersion::Fact)
        .fields()
        .iter()
        .map(|f| f.name().as_str())
        .collect();
    Ok(df.select_columns(&columns)?)
}
