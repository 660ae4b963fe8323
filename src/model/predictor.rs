use crate::error::PredictorError;
use crate::features::{FeatureRow, FeatureSchema};

/// A loaded regression model that prices cars.
///
/// Implementations are opaque; the only contract is that `predict` returns one
/// price per input row and that every row follows `schema()`.
pub trait PricePredictor: Send + Sync {
    fn schema(&self) -> &FeatureSchema;

    fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<f64>, PredictorError>;
}
