use crate::error::PredictorError;
use crate::features::{ColumnKind, FeatureColumn, FeatureRow, FeatureSchema, FeatureValue};
use crate::model::predictor::PricePredictor;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::tensor::TensorElementType;
use ort::value::{DynValue, Tensor};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Custom metadata key carrying the schema tag an artifact was exported for.
pub const SCHEMA_METADATA_KEY: &str = "feature_schema";

#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// Reject artifacts without a schema tag instead of only warning
    pub strict_metadata: bool,
    pub intra_threads: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            strict_metadata: true,
            intra_threads: 1,
        }
    }
}

// Initialize the global environment for ORT (only needed once)
pub fn init_ort() -> Result<(), PredictorError> {
    ort::init().with_name("carprice").commit()?;
    Ok(())
}

/// Loads an exported price model and checks it against `schema`.
///
/// # Arguments
/// * `model_path` - Path to the .onnx file
/// * `schema` - Feature layout the artifact must have been exported with
pub fn load_model(
    model_path: impl AsRef<Path>,
    schema: FeatureSchema,
    options: LoadOptions,
) -> Result<OnnxPricePredictor, PredictorError> {
    let path = model_path.as_ref();
    if !path.exists() {
        return Err(PredictorError::ModelNotFound(path.display().to_string()));
    }

    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(options.intra_threads)?
        .commit_from_file(path)?;

    check_schema_tag(&session, &schema, options.strict_metadata)?;

    let declared: Vec<(String, Option<TensorElementType>)> = session
        .inputs
        .iter()
        .map(|input| (input.name.clone(), input.input_type.tensor_type()))
        .collect();
    check_inputs(&schema, &declared)?;

    info!(
        path = %path.display(),
        schema = schema.tag(),
        inputs = declared.len(),
        "Loaded price model"
    );

    Ok(OnnxPricePredictor {
        session: Mutex::new(session),
        schema,
    })
}

fn check_schema_tag(
    session: &Session,
    schema: &FeatureSchema,
    strict: bool,
) -> Result<(), PredictorError> {
    let metadata = session.metadata()?;
    let tag = metadata.custom(SCHEMA_METADATA_KEY)?;
    match_schema_tag(tag, schema, strict)
}

/// Decides whether an artifact's `feature_schema` tag fits `schema`.
///
/// An untagged artifact is refused when `strict`, accepted with a warning otherwise.
pub fn match_schema_tag(
    tag: Option<String>,
    schema: &FeatureSchema,
    strict: bool,
) -> Result<(), PredictorError> {
    match tag {
        Some(tag) if tag == schema.tag() => Ok(()),
        Some(tag) => Err(PredictorError::SchemaMismatch {
            expected: schema.tag().to_string(),
            found: tag,
        }),
        None if strict => Err(PredictorError::SchemaMismatch {
            expected: schema.tag().to_string(),
            found: format!("model without '{}' metadata", SCHEMA_METADATA_KEY),
        }),
        None => {
            warn!(
                schema = schema.tag(),
                "Model carries no schema tag; relying on input names only"
            );
            Ok(())
        }
    }
}

fn element_type(kind: ColumnKind) -> TensorElementType {
    match kind {
        ColumnKind::Text => TensorElementType::String,
        ColumnKind::Int => TensorElementType::Int64,
        // Asking prices pass 2^24, so f32 would drop rupees.
        ColumnKind::Float => TensorElementType::Float64,
    }
}

/// Compares the inputs a model declares with the columns of `schema`.
///
/// Names must match exactly in both directions; order is irrelevant because
/// inputs are bound by name.
pub fn check_inputs(
    schema: &FeatureSchema,
    declared: &[(String, Option<TensorElementType>)],
) -> Result<(), PredictorError> {
    let mut problems = Vec::new();

    for column in schema.columns() {
        match declared.iter().find(|(name, _)| name == column.name) {
            None => problems.push(format!("missing input '{}'", column.name)),
            Some((_, ty)) if *ty != Some(element_type(column.kind)) => problems.push(format!(
                "input '{}' is {:?}, expected {:?}",
                column.name,
                ty,
                element_type(column.kind)
            )),
            Some(_) => {}
        }
    }
    for (name, _) in declared {
        if !schema.contains(name) {
            problems.push(format!("unexpected input '{}'", name));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(PredictorError::SchemaMismatch {
            expected: schema.tag().to_string(),
            found: problems.join("; "),
        })
    }
}

/// The values of one column across a batch of rows.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Text(Vec<String>),
    Int(Vec<i64>),
    Float(Vec<f64>),
}

fn wrong_value(column: &str, value: Option<&FeatureValue>) -> PredictorError {
    PredictorError::SchemaMismatch {
        expected: format!("a value for column '{}'", column),
        found: format!("{:?}", value),
    }
}

/// Gathers `column` from every row, checking each cell has the column's kind.
pub fn collect_column(
    rows: &[FeatureRow],
    column: &FeatureColumn,
) -> Result<ColumnData, PredictorError> {
    let cells = rows.iter().map(|row| row.get(column.name));
    let data = match column.kind {
        ColumnKind::Text => ColumnData::Text(
            cells
                .map(|cell| match cell {
                    Some(FeatureValue::Text(s)) => Ok(s.clone()),
                    other => Err(wrong_value(column.name, other)),
                })
                .collect::<Result<_, _>>()?,
        ),
        ColumnKind::Int => ColumnData::Int(
            cells
                .map(|cell| match cell {
                    Some(FeatureValue::Int(v)) => Ok(*v),
                    other => Err(wrong_value(column.name, other)),
                })
                .collect::<Result<_, _>>()?,
        ),
        ColumnKind::Float => ColumnData::Float(
            cells
                .map(|cell| match cell {
                    Some(FeatureValue::Float(v)) => Ok(*v),
                    other => Err(wrong_value(column.name, other)),
                })
                .collect::<Result<_, _>>()?,
        ),
    };
    Ok(data)
}

/// One `[rows, 1]` tensor per schema column, named after the column.
pub fn build_inputs(
    schema: &FeatureSchema,
    rows: &[FeatureRow],
) -> Result<Vec<(String, DynValue)>, PredictorError> {
    let shape = vec![rows.len() as i64, 1];
    let mut inputs = Vec::with_capacity(schema.columns().len());

    for column in schema.columns() {
        let value: DynValue = match collect_column(rows, column)? {
            ColumnData::Text(data) => {
                Tensor::from_string_array((shape.clone(), data.as_slice()))?.into_dyn()
            }
            ColumnData::Int(data) => Tensor::from_array((shape.clone(), data))?.into_dyn(),
            ColumnData::Float(data) => Tensor::from_array((shape.clone(), data))?.into_dyn(),
        };
        inputs.push((column.name.to_string(), value));
    }

    Ok(inputs)
}

/// ONNX Runtime backed [`PricePredictor`].
pub struct OnnxPricePredictor {
    session: Mutex<Session>,
    schema: FeatureSchema,
}

impl PricePredictor for OnnxPricePredictor {
    fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<f64>, PredictorError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let inputs = build_inputs(&self.schema, rows)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| PredictorError::Inference("model session lock poisoned".to_string()))?;
        let outputs = session.run(inputs)?;

        // Regressors exported from float pipelines emit f32; double pipelines emit f64.
        let output = &outputs[0];
        let prices: Vec<f64> = match output.try_extract_tensor::<f32>() {
            Ok((_, data)) => data.iter().map(|&v| f64::from(v)).collect(),
            Err(_) => {
                let (_, data) = output.try_extract_tensor::<f64>()?;
                data.to_vec()
            }
        };
        debug!(rows = rows.len(), outputs = prices.len(), "Model inference complete");

        Ok(prices)
    }
}
