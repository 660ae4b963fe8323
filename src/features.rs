//! Feature assembly: raw submission in, schema-ordered model row out.

use serde::{Deserialize, Deserializer, Serialize};

use crate::catalog;
use crate::error::PredictorError;

pub const BRAND: &str = "Brand";
pub const CONDITION: &str = "Condition";
pub const FUEL: &str = "Fuel";
pub const KMS_DRIVEN: &str = "KMs Driven";
pub const MODEL: &str = "Model";
pub const PRICE: &str = "Price";
pub const REGISTERED_CITY: &str = "Registered City";
pub const TRANSACTION_TYPE: &str = "Transaction Type";
pub const YEAR: &str = "Year";
pub const PRICE_PER_KM: &str = "Price Per KM";
pub const AGE: &str = "Age";

/// Element type of a model input column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Int,
    Float,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeatureColumn {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn column(name: &'static str, kind: ColumnKind) -> FeatureColumn {
    FeatureColumn { name, kind }
}

// Order matches the frame the trained pipelines were fitted on.
const FULL_COLUMNS: &[FeatureColumn] = &[
    column(BRAND, ColumnKind::Text),
    column(CONDITION, ColumnKind::Text),
    column(FUEL, ColumnKind::Text),
    column(KMS_DRIVEN, ColumnKind::Int),
    column(MODEL, ColumnKind::Text),
    column(PRICE, ColumnKind::Float),
    column(REGISTERED_CITY, ColumnKind::Text),
    column(TRANSACTION_TYPE, ColumnKind::Text),
    column(YEAR, ColumnKind::Int),
    column(PRICE_PER_KM, ColumnKind::Float),
    column(AGE, ColumnKind::Int),
];

const PRICED_COLUMNS: &[FeatureColumn] = &[
    column(BRAND, ColumnKind::Text),
    column(CONDITION, ColumnKind::Text),
    column(FUEL, ColumnKind::Text),
    column(KMS_DRIVEN, ColumnKind::Int),
    column(MODEL, ColumnKind::Text),
    column(PRICE, ColumnKind::Float),
    column(REGISTERED_CITY, ColumnKind::Text),
    column(YEAR, ColumnKind::Int),
    column(PRICE_PER_KM, ColumnKind::Float),
    column(AGE, ColumnKind::Int),
];

const COMPACT_COLUMNS: &[FeatureColumn] = &[
    column(BRAND, ColumnKind::Text),
    column(CONDITION, ColumnKind::Text),
    column(FUEL, ColumnKind::Text),
    column(KMS_DRIVEN, ColumnKind::Int),
    column(MODEL, ColumnKind::Text),
    column(REGISTERED_CITY, ColumnKind::Text),
    column(YEAR, ColumnKind::Int),
    column(AGE, ColumnKind::Int),
];

/// The feature layouts that model artifacts have been trained on.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    /// Every field, including asking price and transaction type.
    #[default]
    Full,
    /// Asking price but no transaction type.
    Priced,
    /// Neither asking price nor transaction type.
    Compact,
}

/// Versioned description of the exact columns a model expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeatureSchema {
    version: SchemaVersion,
    columns: &'static [FeatureColumn],
}

impl FeatureSchema {
    pub fn for_version(version: SchemaVersion) -> Self {
        let columns = match version {
            SchemaVersion::Full => FULL_COLUMNS,
            SchemaVersion::Priced => PRICED_COLUMNS,
            SchemaVersion::Compact => COMPACT_COLUMNS,
        };
        Self { version, columns }
    }

    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    /// Identifier stored in a model artifact's `feature_schema` metadata.
    pub fn tag(&self) -> &'static str {
        match self.version {
            SchemaVersion::Full => "car-price/full-v1",
            SchemaVersion::Priced => "car-price/priced-v1",
            SchemaVersion::Compact => "car-price/compact-v1",
        }
    }

    pub fn columns(&self) -> &'static [FeatureColumn] {
        self.columns
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn requires_transaction_type(&self) -> bool {
        self.contains(TRANSACTION_TYPE)
    }
}

/// Raw values as submitted by the form.
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct CarInput {
    pub brand: String,
    pub condition: String,
    pub fuel: String,
    /// Free-text model name, e.g. "Corolla Altis"
    #[serde(default, deserialize_with = "null_as_empty")]
    pub model: String,
    pub registered_city: String,
    pub year: i32,
    pub kms_driven: i64,
    /// Optional asking price; treated as 0 when absent
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub transaction_type: Option<String>,
}

// An absent or null model name reaches the blank-name check instead of failing decoding.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Text(String),
    Int(i64),
    Float(f64),
}

impl FeatureValue {
    pub fn kind(&self) -> ColumnKind {
        match self {
            FeatureValue::Text(_) => ColumnKind::Text,
            FeatureValue::Int(_) => ColumnKind::Int,
            FeatureValue::Float(_) => ColumnKind::Float,
        }
    }
}

/// One model input row, in schema column order.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureRow {
    values: Vec<(&'static str, FeatureValue)>,
}

impl FeatureRow {
    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.values.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.iter().map(|(n, _)| *n)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(&'static str, FeatureValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A validated car description plus its derived fields.
///
/// Built fresh for every submission and never stored.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeatureRecord {
    pub brand: String,
    pub condition: String,
    pub fuel: String,
    pub model: String,
    pub registered_city: String,
    pub year: i32,
    pub kms_driven: i64,
    pub price: f64,
    pub transaction_type: Option<String>,
    pub age: i32,
    pub price_per_km: f64,
}

pub fn vehicle_age(reference_year: i32, year: i32) -> i32 {
    reference_year - year
}

pub fn price_per_km(price: f64, kms_driven: i64) -> f64 {
    if kms_driven > 0 {
        price / kms_driven as f64
    } else {
        0.0
    }
}

impl FeatureRecord {
    /// Validates `input` and computes the derived fields against `reference_year`.
    pub fn assemble(input: &CarInput, reference_year: i32) -> Result<Self, PredictorError> {
        let model = input.model.trim();
        if model.is_empty() {
            return Err(PredictorError::Validation(
                "Please enter the model name.".to_string(),
            ));
        }

        let brand = catalog::choose("brand", &input.brand, catalog::BRANDS)?;
        let condition = catalog::choose("condition", &input.condition, catalog::CONDITIONS)?;
        let fuel = catalog::choose("fuel", &input.fuel, catalog::FUEL_TYPES)?;
        let registered_city = catalog::choose(
            "registered city",
            &input.registered_city,
            catalog::REGISTERED_CITIES,
        )?;
        let transaction_type = input
            .transaction_type
            .as_deref()
            .map(|t| catalog::choose("transaction type", t, catalog::TRANSACTION_TYPES))
            .transpose()?;
        let year = catalog::check_year(input.year)?;

        if input.kms_driven < 0 {
            return Err(PredictorError::Validation(format!(
                "KMs driven must not be negative, got {}",
                input.kms_driven
            )));
        }

        let price = input.price.unwrap_or(0.0);
        if !price.is_finite() || price < 0.0 {
            return Err(PredictorError::Validation(format!(
                "Price must be a non-negative number, got {}",
                price
            )));
        }

        Ok(Self {
            brand: brand.to_string(),
            condition: condition.to_string(),
            fuel: fuel.to_string(),
            model: model.to_string(),
            registered_city: registered_city.to_string(),
            year,
            kms_driven: input.kms_driven,
            price,
            transaction_type: transaction_type.map(str::to_string),
            age: vehicle_age(reference_year, year),
            price_per_km: price_per_km(price, input.kms_driven),
        })
    }

    /// Value for a named column, if the record carries it.
    pub fn value(&self, column: &str) -> Option<FeatureValue> {
        let value = match column {
            BRAND => FeatureValue::Text(self.brand.clone()),
            CONDITION => FeatureValue::Text(self.condition.clone()),
            FUEL => FeatureValue::Text(self.fuel.clone()),
            KMS_DRIVEN => FeatureValue::Int(self.kms_driven),
            MODEL => FeatureValue::Text(self.model.clone()),
            PRICE => FeatureValue::Float(self.price),
            REGISTERED_CITY => FeatureValue::Text(self.registered_city.clone()),
            TRANSACTION_TYPE => FeatureValue::Text(self.transaction_type.clone()?),
            YEAR => FeatureValue::Int(i64::from(self.year)),
            PRICE_PER_KM => FeatureValue::Float(self.price_per_km),
            AGE => FeatureValue::Int(i64::from(self.age)),
            _ => return None,
        };
        Some(value)
    }

    /// Lays the record out as exactly the columns of `schema`.
    pub fn to_row(&self, schema: &FeatureSchema) -> Result<FeatureRow, PredictorError> {
        let mut values = Vec::with_capacity(schema.columns().len());
        for column in schema.columns() {
            let value = match self.value(column.name) {
                Some(value) => value,
                None if column.name == TRANSACTION_TYPE => {
                    return Err(PredictorError::Validation(
                        "Please select a transaction type.".to_string(),
                    ))
                }
                None => {
                    return Err(PredictorError::SchemaMismatch {
                        expected: schema.tag().to_string(),
                        found: format!("no value for column '{}'", column.name),
                    })
                }
            };
            values.push((column.name, value));
        }
        Ok(FeatureRow { values })
    }
}
