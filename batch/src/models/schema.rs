use crate::processor::rules::{AddressPart, OFFER_TIERS};
use arrow::datatypes::{DataType, Field, Schema};
use lazy_static::lazy_static;

pub const DISCOUNT_COLUMN: &str = "discount";
pub const TOTAL_PRICE_COLUMN: &str = "total_price";
pub const SHIPPING_ADDRESS_COLUMN: &str = "shipping_address";
pub const TRANSACTION_ID_COLUMN: &str = "transaction_id";

// Raw source schema, in file column order
pub fn raw_sales_schema() -> Schema {
    let mut fields = vec![
        Field::new("transaction_date", DataType::Date32, true),
        Field::new(TRANSACTION_ID_COLUMN, DataType::Utf8, true),
        Field::new("customer_id", DataType::Int32, true),
        Field::new("customer_fname", DataType::Utf8, true),
        Field::new("customer_lname", DataType::Utf8, true),
        Field::new("customer_email", DataType::Utf8, true),
        Field::new("sales_agent_id", DataType::Int32, true),
        Field::new("branch_id", DataType::Int32, true),
        Field::new("product_id", DataType::Int32, true),
        Field::new("product_name", DataType::Utf8, true),
        Field::new("product_category", DataType::Utf8, true),
    ];
    fields.extend(
        OFFER_TIERS
            .iter()
            .map(|(offer, _)| Field::new(*offer, DataType::Boolean, true)),
    );
    fields.extend([
        Field::new("units", DataType::Int32, true),
        Field::new("unit_price", DataType::Float64, true),
        Field::new("is_online", DataType::Utf8, true),
        Field::new("payment_method", DataType::Utf8, true),
        Field::new(SHIPPING_ADDRESS_COLUMN, DataType::Utf8, true),
    ]);
    Schema::new(fields)
}

// Same columns as text, the shape the CSV is parsed with before coercion
pub fn raw_text_schema() -> Schema {
    let fields: Vec<Field> = raw_sales_schema()
        .fields()
        .iter()
        .map(|f| Field::new(f.name(), DataType::Utf8, true))
        .collect();
    Schema::new(fields)
}

// Fact schema: raw columns followed by the derived ones
pub fn sales_fact_schema() -> Schema {
    let raw_schema = raw_sales_schema();
    let mut field_vec: Vec<Field> = raw_schema
        .fields()
        .iter()
        .map(|f| f.as_ref().clone())
        .collect();
    field_vec.push(Field::new(DISCOUNT_COLUMN, DataType::Int32, true));
    field_vec.push(Field::new(TOTAL_PRICE_COLUMN, DataType::Float64, true));
    field_vec.extend(
        AddressPart::ALL
            .iter()
            .map(|part| Field::new(part.column(), DataType::Utf8, true)),
    );
    Schema::new(field_vec)
}

pub enum SalesSchemaVersion {
    RawText,
    Raw,
    Fact,
}

pub fn get_sales_schema(version: SalesSchemaVersion) -> &'static Schema {
    match version {
        SalesSchemaVersion::RawText => &RAW_TEXT_SCHEMA,
        SalesSchemaVersion::Raw => &RAW_SALES_SCHEMA,
        SalesSchemaVersion::Fact => &SALES_FACT_SCHEMA,
    }
}

// Lazy-loaded static schemas
lazy_static! {
    static ref RAW_TEXT_SCHEMA: Schema = raw_text_schema();
    static ref RAW_SALES_SCHEMA: Schema = raw_sales_schema();
    static ref SALES_FACT_SCHEMA: Schema = sales_fact_schema();
}
